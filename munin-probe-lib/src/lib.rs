#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod limiter;
pub mod probe;
pub mod result;
pub mod tls;

pub use config::{load_from_path, ProbeConfig};
pub use error::{is_connection_error, ProbeError, Result};
pub use input::{expand, parse_input, parse_port_list, validate_input, ParsedInput, TargetSet};
pub use probe::{ProbeEngine, TargetItem, TechDetector};
pub use result::{HashInfo, ProbeResult, TlsInfo};
pub use tls::{strategy_ladder, Protocol, TlsStrategy, TlsVersion};

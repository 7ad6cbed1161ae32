mod expander;
mod ports;
mod url;
mod validator;

pub use expander::{expand, TargetSet};
pub use ports::{parse_port_list, PortParseError};
pub use url::{parse_input, ParsedInput, Scheme};
pub use validator::validate_input;

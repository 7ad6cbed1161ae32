pub mod cipher_suites;
pub mod connector;
pub mod strategy;

pub use cipher_suites::resolve_cipher_suites;
pub use connector::{build_client_config, tls_error_string};
pub use strategy::{strategy_ladder, Protocol, TlsStrategy, TlsVersion};

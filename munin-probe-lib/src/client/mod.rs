mod dns;
mod exchange;
mod factory;

pub use dns::DnsCache;
pub use exchange::{Exchange, TlsSession};
pub use factory::{ClientFactory, ProbeClient};

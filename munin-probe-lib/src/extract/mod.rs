pub mod cdn;
pub mod cert;
pub mod cname;
pub mod content;
pub mod csp;
pub mod domains;
pub mod hash;

pub use cdn::detect_cdn;
pub use cert::{parse_certificate, parse_chain, CertificateInfo};
pub use cname::CnameResolver;
pub use content::{count_lines, count_words, extract_title};
pub use csp::extract_csp_domains;
pub use domains::{discover_domains, DiscoveredDomains};
pub use hash::{body_hash, canonical_headers, header_hash};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Leaf or chain certificate reduced to a plain record; no TLS library
/// types cross this boundary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject_cn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject_org: String,
    pub issuer_cn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer_org: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subject_alternative_names: Vec<String>,
    pub not_before: String,
    pub not_after: String,
    pub serial_number: String,
    pub fingerprint_sha256: String,
    pub expired: bool,
    pub self_signed: bool,
    pub key_algorithm: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub key_size: usize,
    pub signature_algorithm: String,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Parse one DER certificate into its record form.
pub fn parse_certificate(der: &[u8]) -> Option<CertificateInfo> {
    let (_, cert) = X509Certificate::from_der(der).ok()?;

    let subject_cn = first_cn(cert.subject());
    let subject_org = orgs(cert.subject());
    let issuer_cn = first_cn(cert.issuer());
    let issuer_org = orgs(cert.issuer());

    let sans = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|gn| match gn {
                    GeneralName::DNSName(name) => Some(name.to_string()),
                    GeneralName::IPAddress(bytes) => format_ip(bytes),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let not_after_ts = cert.validity().not_after.timestamp();
    let self_signed = cert.tbs_certificate.subject.as_raw() == cert.tbs_certificate.issuer.as_raw()
        && cert.verify_signature(None).is_ok();

    let (key_algorithm, key_size) = key_info(&cert);

    Some(CertificateInfo {
        subject_cn,
        subject_org,
        issuer_cn,
        issuer_org,
        subject_alternative_names: sans,
        not_before: rfc3339(cert.validity().not_before.timestamp()),
        not_after: rfc3339(not_after_ts),
        serial_number: colon_hex(cert.raw_serial()),
        fingerprint_sha256: colon_hex(&Sha256::digest(der)),
        expired: Utc::now().timestamp() > not_after_ts,
        self_signed,
        key_algorithm,
        key_size,
        signature_algorithm: signature_algorithm_name(&cert),
    })
}

/// Split a peer chain (leaf first) into the leaf record and every non-leaf
/// certificate behind it.
pub fn parse_chain(ders: &[Vec<u8>]) -> (Option<CertificateInfo>, Vec<CertificateInfo>) {
    let mut iter = ders.iter();
    let leaf = iter.next().and_then(|der| parse_certificate(der));
    let chain = iter.filter_map(|der| parse_certificate(der)).collect();
    (leaf, chain)
}

fn first_cn(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn orgs(name: &X509Name<'_>) -> String {
    name.iter_organization()
        .filter_map(|attr| attr.as_str().ok())
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_info(cert: &X509Certificate<'_>) -> (String, usize) {
    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => ("RSA".to_string(), rsa.key_size()),
        Ok(PublicKey::EC(ec)) => ("ECDSA".to_string(), ec.key_size()),
        Ok(PublicKey::DSA(_)) => ("DSA".to_string(), 0),
        _ => ("Unknown".to_string(), 0),
    }
}

fn signature_algorithm_name(cert: &X509Certificate<'_>) -> String {
    let oid = &cert.signature_algorithm.algorithm;
    match oid.to_id_string().as_str() {
        "1.2.840.113549.1.1.5" => "SHA1-RSA".to_string(),
        "1.2.840.113549.1.1.11" => "SHA256-RSA".to_string(),
        "1.2.840.113549.1.1.12" => "SHA384-RSA".to_string(),
        "1.2.840.113549.1.1.13" => "SHA512-RSA".to_string(),
        "1.2.840.10045.4.3.2" => "ECDSA-SHA256".to_string(),
        "1.2.840.10045.4.3.3" => "ECDSA-SHA384".to_string(),
        "1.2.840.10045.4.3.4" => "ECDSA-SHA512".to_string(),
        "1.3.101.112" => "Ed25519".to_string(),
        other => other.to_string(),
    }
}

fn rfc3339(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_ip(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(std::net::Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(std::net::Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

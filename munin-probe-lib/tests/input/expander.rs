use munin_probe_lib::{expand, ProbeConfig};

fn config() -> ProbeConfig {
    ProbeConfig::default()
}

#[test]
fn bare_hostname_expands_to_both_schemes() {
    let set = expand("example.com", &config()).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["http://example.com/", "https://example.com/"]);
}

#[test]
fn explicit_scheme_with_custom_ports() {
    let cfg = ProbeConfig { custom_ports: Some("8443,9443".into()), ..config() };
    let set = expand("https://example.com", &cfg).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["https://example.com:8443/", "https://example.com:9443/"]);
}

#[test]
fn ignore_ports_with_unspecified_scheme_yields_eight_urls() {
    let cfg = ProbeConfig { ignore_ports: true, ..config() };
    let set = expand("example.com", &cfg).unwrap();
    assert_eq!(set.len(), 8);

    let urls: Vec<&str> = set.iter().collect();
    assert!(urls.contains(&"http://example.com:80/"));
    assert!(urls.contains(&"http://example.com:8888/"));
    assert!(urls.contains(&"https://example.com:443/"));
    assert!(urls.contains(&"https://example.com:10443/"));
}

#[test]
fn port_443_implies_https() {
    let set = expand("example.com:443", &config()).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["https://example.com:443/"]);
}

#[test]
fn port_80_implies_http() {
    let set = expand("example.com:80", &config()).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["http://example.com:80/"]);
}

#[test]
fn nonstandard_port_keeps_both_schemes_and_spells_the_port() {
    let set = expand("example.com:8080", &config()).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["http://example.com:8080/", "https://example.com:8080/"]);
}

#[test]
fn all_schemes_overrides_the_parsed_scheme() {
    let cfg = ProbeConfig { all_schemes: true, ..config() };
    let set = expand("https://example.com", &cfg).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn duplicate_normalized_forms_collapse_keeping_the_first_variant() {
    // :80 is explicit, so the first variant spells it; the bare form is a
    // duplicate under normalization and must not add an entry.
    let cfg = ProbeConfig { custom_ports: Some("80,8080".into()), ..config() };
    let set = expand("http://example.com:80", &cfg).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["http://example.com:80/", "http://example.com:8080/"]);
}

#[test]
fn expansion_is_idempotent_over_its_own_output() {
    let set = expand("example.com", &config()).unwrap();
    for url in set.clone().into_vec() {
        let again = expand(&url, &config()).unwrap();
        let urls: Vec<String> = again.into_vec();
        assert_eq!(urls, vec![url]);
    }
}

#[test]
fn path_and_query_survive_expansion() {
    let set = expand("example.com/login?next=/admin", &config()).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(
        urls,
        vec![
            "http://example.com/login?next=/admin",
            "https://example.com/login?next=/admin"
        ]
    );
}

#[test]
fn invalid_custom_ports_fall_through_to_parsed_port() {
    let cfg = ProbeConfig { custom_ports: Some("99999".into()), ..config() };
    let set = expand("http://example.com:8080", &cfg).unwrap();
    let urls: Vec<&str> = set.iter().collect();
    assert_eq!(urls, vec!["http://example.com:8080/"]);
}

#[test]
fn private_hosts_rejected_without_flag() {
    assert!(expand("127.0.0.1", &config()).is_err());
    assert!(expand("10.0.0.5:8080", &config()).is_err());

    let cfg = ProbeConfig { allow_private_ips: true, ..config() };
    assert!(expand("127.0.0.1", &cfg).is_ok());
}

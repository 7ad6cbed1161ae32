use munin_probe_lib::tls::{
    build_client_config, resolve_cipher_suites, strategy_ladder, Protocol, TlsVersion,
};

#[test]
fn ladder_has_five_rungs_in_fixed_order() {
    let ladder = strategy_ladder(false);
    let names: Vec<&str> = ladder.iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec!["TLS 1.2 Compatible", "TLS 1.2 Secure", "TLS 1.3", "TLS 1.1 Legacy", "TLS 1.0 Legacy"]
    );

    let protocols: Vec<Protocol> = ladder.iter().map(|s| s.protocol).collect();
    assert_eq!(
        protocols,
        vec![Protocol::Http11, Protocol::Http2, Protocol::Http3, Protocol::Http11, Protocol::Http11]
    );
}

#[test]
fn disabling_http3_swaps_the_third_rung_to_http2() {
    let ladder = strategy_ladder(true);
    assert_eq!(ladder[2].name, "TLS 1.3");
    assert_eq!(ladder[2].protocol, Protocol::Http2);
}

#[test]
fn version_spans_match_the_rung_names() {
    let ladder = strategy_ladder(false);
    assert_eq!(ladder[0].min_version, TlsVersion::V1_2);
    assert_eq!(ladder[0].max_version, TlsVersion::V1_2);
    assert_eq!(ladder[2].min_version, TlsVersion::V1_3);
    assert_eq!(ladder[3].max_version, TlsVersion::V1_1);
    assert_eq!(ladder[4].max_version, TlsVersion::V1_0);
}

#[test]
fn cipher_sets_nest_from_secure_to_legacy() {
    let ladder = strategy_ladder(false);
    let compatible = ladder[0].cipher_suites.unwrap();
    let secure = ladder[1].cipher_suites.unwrap();
    let legacy = ladder[4].cipher_suites.unwrap();

    for suite in secure {
        assert!(compatible.contains(suite), "{suite} missing from compatible set");
    }
    for suite in compatible {
        assert!(legacy.contains(suite), "{suite} missing from legacy set");
    }
    assert!(legacy.iter().any(|s| s.contains("3DES")));
    assert!(!secure.iter().any(|s| s.contains("3DES") || s.contains("CBC")));

    // TLS 1.3 negotiates its suites automatically.
    assert!(ladder[2].cipher_suites.is_none());
}

#[test]
fn resolution_drops_unimplemented_suites_but_keeps_the_modern_ones() {
    let resolved = resolve_cipher_suites(&[
        "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
        "TLS_RSA_WITH_3DES_EDE_CBC_SHA",
        "NOT_A_SUITE",
    ]);
    // One TLS 1.2 match plus the always-appended TLS 1.3 suites.
    assert!(!resolved.is_empty());
    let names: Vec<String> = resolved.iter().map(|s| format!("{:?}", s.suite())).collect();
    assert!(names.contains(&"TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256".to_string()));
    assert!(!names.iter().any(|n| n.contains("3DES")));
}

#[test]
fn every_secure_strategy_suite_resolves_or_is_a_known_gap() {
    // The GCM/ChaCha20 names in the secure set all exist in rustls; only
    // CBC and 3DES entries of the wider sets are expected to drop out.
    let ladder = strategy_ladder(false);
    let secure = ladder[1].cipher_suites.unwrap();
    let resolved = resolve_cipher_suites(secure);
    let names: Vec<String> = resolved.iter().map(|s| format!("{:?}", s.suite())).collect();
    for suite in secure {
        assert!(names.contains(&suite.to_string()), "{suite} must resolve");
    }
}

#[test]
fn client_configs_build_for_every_rung() {
    for disable_http3 in [false, true] {
        for strategy in &strategy_ladder(disable_http3) {
            for insecure in [false, true] {
                let config = build_client_config(strategy, insecure);
                assert!(config.is_ok(), "rung {} failed to build", strategy.name);
            }
        }
    }
}

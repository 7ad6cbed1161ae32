use munin_probe_lib::{parse_input, parse_port_list};

#[test]
fn parser_is_total_on_garbage() {
    let inputs = [
        "",
        " ",
        ":",
        "::",
        "http://",
        "https://:8443",
        "host:port:extra",
        "?query-only",
        "#fragment-only",
        "\u{fffd}\u{fffd}",
        "a b c",
    ];
    for input in inputs {
        let parsed = parse_input(input);
        assert_eq!(parsed.original, input);
        assert!(!parsed.path.is_empty(), "path must never be empty for {input:?}");
    }
}

#[test]
fn scheme_detection() {
    assert_eq!(parse_input("https://example.com").scheme.map(|s| s.as_str()), Some("https"));
    assert_eq!(parse_input("http://example.com").scheme.map(|s| s.as_str()), Some("http"));
    assert_eq!(parse_input("ftp://example.com").scheme, None);
    // No scheme prefix: the token becomes part of the host expression.
    assert_eq!(parse_input("ftp://example.com").host, "ftp:");
}

#[test]
fn path_query_fragment_are_preserved() {
    let parsed = parse_input("http://example.com/a/b?c=d#e");
    assert_eq!(parsed.path, "/a/b?c=d#e");

    let parsed = parse_input("example.com/a/b?c=d#e");
    assert_eq!(parsed.path, "/a/b?c=d#e");
}

#[test]
fn port_list_round_trips_are_idempotent() {
    let once = parse_port_list("9000-9003,80, 443").unwrap();
    let again = parse_port_list(&once.join(",")).unwrap();
    assert_eq!(once, again);
}

/// First `<title>` anywhere in the document, attributes tolerated,
/// whitespace collapsed. Empty when the document has none.
pub fn extract_title(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let lower = text.to_ascii_lowercase();

    let mut search_from = 0;
    while let Some(rel) = lower[search_from..].find("<title") {
        let open = search_from + rel;
        let after = open + "<title".len();
        // Reject elements like <titlebar>; only whitespace or attributes
        // may follow the tag name.
        match lower.as_bytes().get(after) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') => {}
            _ => {
                search_from = after;
                continue;
            }
        }
        let Some(gt) = lower[after..].find('>') else {
            return String::new();
        };
        let content_start = after + gt + 1;
        let Some(close) = lower[content_start..].find("</title") else {
            return String::new();
        };
        let raw = &text[content_start..content_start + close];
        return raw.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    String::new()
}

pub fn count_words(body: &[u8]) -> usize {
    String::from_utf8_lossy(body).split_whitespace().count()
}

pub fn count_lines(body: &[u8]) -> usize {
    String::from_utf8_lossy(body).lines().count()
}

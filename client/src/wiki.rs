//! `[[Wiki Link]]` parsing
//!
//! Backlinks are derived from the titles referenced this way in a note's
//! content.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WikiToken {
    Text(String),
    Link(String),
}

/// Split text into plain runs and `[[...]]` links.
///
/// - No nesting; the first `]]` closes the link.
/// - Unclosed `[[` is treated as plain text.
pub fn parse_wiki_tokens(input: &str) -> Vec<WikiToken> {
    let mut out = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let Some(start) = rest.find("[[") else {
            out.push(WikiToken::Text(rest.to_string()));
            break;
        };

        if start > 0 {
            out.push(WikiToken::Text(rest[..start].to_string()));
        }

        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("]]") else {
            out.push(WikiToken::Text(rest[start..].to_string()));
            break;
        };

        out.push(WikiToken::Link(after_open[..end].to_string()));
        rest = &after_open[end + 2..];
    }

    out
}

/// Distinct, non-empty link titles in order of first appearance.
pub fn extract_wiki_links(input: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for token in parse_wiki_tokens(input) {
        if let WikiToken::Link(title) = token {
            if !title.is_empty() && !links.contains(&title) {
                links.push(title);
            }
        }
    }
    links
}

use unicode_normalization::UnicodeNormalization;

/// Markup the generator tends to emit that the document renderer would print verbatim.
const MARKDOWN_TOKENS: [&str; 3] = ["**", "##", "---"];

/// Remove markdown emphasis, headings and rules from generated text.
pub fn strip_markdown(text: &str) -> String {
    let mut cleaned = text.to_string();
    for token in MARKDOWN_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned
}

/// NFKC-normalise: full-width ASCII and the ideographic space become
/// half-width, half-width katakana becomes full-width.
pub fn fold_width(text: &str) -> String {
    text.nfkc().collect()
}

/// Fold katakana to hiragana so either script matches the same pattern.
pub fn fold_kana(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate_string(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

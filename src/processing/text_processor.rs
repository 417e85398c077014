//! Text helpers shared by prompt assembly and response parsing

/// Keep at most `max_chars` characters, counted as Unicode scalar values.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Strip a surrounding ```json ... ``` or ``` ... ``` fence from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let tag_len = rest.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(rest.len());
    let rest = if rest[..tag_len].eq_ignore_ascii_case("json") {
        &rest[tag_len..]
    } else {
        rest
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Split tag source on whitespace while respecting single- and double-quoted
/// regions (`\` inside a quoted region escapes the next character, so `\"`
/// does not close the quote). Quotes stay attached to their token.
#[must_use]
pub fn split_contents(source: &str) -> Vec<String> {
    let mut pieces = Vec::with_capacity((source.len() / 8).clamp(2, 8));
    let mut start = None;
    let mut quote: Option<char> = None;
    let mut escape = false;

    for (idx, ch) in source.char_indices() {
        if escape {
            escape = false;
            if start.is_none() {
                start = Some(idx.saturating_sub(1));
            }
            continue;
        }
        match ch {
            '\\' if quote.is_some() => {
                escape = true;
                if start.is_none() {
                    start = Some(idx);
                }
            }
            '"' | '\'' if quote == Some(ch) => {
                quote = None;
                if start.is_none() {
                    start = Some(idx);
                }
            }
            '"' | '\'' if quote.is_none() => {
                quote = Some(ch);
                if start.is_none() {
                    start = Some(idx);
                }
            }
            _ if quote.is_some() => {
                if start.is_none() {
                    start = Some(idx);
                }
            }
            _ if ch.is_whitespace() => {
                if let Some(piece_start) = start.take() {
                    pieces.push(source[piece_start..idx].to_owned());
                }
            }
            _ => {
                if start.is_none() {
                    start = Some(idx);
                }
            }
        }
    }
    if let Some(piece_start) = start {
        pieces.push(source[piece_start..].to_owned());
    }
    pieces
}

/// The inner text of a properly quoted token (`"x"` or `'x'`), or `None` if
/// the token is not quoted.
pub(crate) fn unquote(token: &str) -> Option<&str> {
    let mut chars = token.chars();
    let first = chars.next()?;
    if first != '"' && first != '\'' {
        return None;
    }
    chars.as_str().strip_suffix(first)
}

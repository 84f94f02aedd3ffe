//! Display-width text wrapping

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display columns `text` occupies
#[inline]
#[must_use]
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Wrap one line of text
///
/// The first output line holds at most `first_width` columns, the rest at
/// most `rest_width`. CJK text breaks anywhere; a run of ASCII letters or
/// digits is moved whole to the next line when an earlier space allows it.
/// Always returns at least one line.
#[must_use]
pub fn wrap(text: &str, first_width: usize, rest_width: usize) -> Vec<String> {
    let rest_width = rest_width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    let mut limit = first_width.max(1);

    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > limit && !current.is_empty() {
            let carry = ascii_word_tail(&mut current, ch, rest_width.saturating_sub(width));
            lines.push(current.trim_end().to_string());
            current = carry;
            used = display_width(&current);
            limit = rest_width;
            if ch == ' ' && current.is_empty() {
                continue;
            }
        }
        current.push(ch);
        used += width;
    }
    lines.push(current.trim_end().to_string());
    lines
}

/// Split off the partial ASCII word at the end of `line` if it would fit in `room`
fn ascii_word_tail(line: &mut String, next: char, room: usize) -> String {
    if !next.is_ascii_alphanumeric() || !line.ends_with(|c: char| c.is_ascii_alphanumeric()) {
        return String::new();
    }
    let Some(space) = line.rfind(' ') else {
        return String::new();
    };
    let tail = &line[space + 1..];
    if tail.is_empty() || display_width(tail) > room || line[..space].trim().is_empty() {
        return String::new();
    }
    let tail = tail.to_string();
    line.truncate(space);
    tail
}

/// Pad `text` with spaces to `width` display columns
#[must_use]
pub fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{text}{}", " ".repeat(fill))
}

/// Center `text` within `width` display columns, no trailing fill
#[must_use]
pub fn center(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text)) / 2;
    format!("{}{text}", " ".repeat(fill))
}

//! Text formatting in both directions: Telegram HTML for outgoing messages,
//! GitHub markdown for replies forwarded from Telegram.

use crate::messaging::types::{TextEntity, TextEntityKind};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// First line of `text`, cut to `max_chars` with an ellipsis.
pub fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

fn markers(kind: &TextEntityKind) -> Option<(String, String)> {
    let pair = match kind {
        TextEntityKind::Bold => ("**".to_string(), "**".to_string()),
        TextEntityKind::Italic => ("_".to_string(), "_".to_string()),
        TextEntityKind::Underline => ("<ins>".to_string(), "</ins>".to_string()),
        TextEntityKind::Strikethrough => ("~~".to_string(), "~~".to_string()),
        TextEntityKind::Code => ("`".to_string(), "`".to_string()),
        TextEntityKind::Pre { language } => (
            format!("```{}\n", language.as_deref().unwrap_or("")),
            "\n```".to_string(),
        ),
        TextEntityKind::TextLink { url } => ("[".to_string(), format!("]({url})")),
        TextEntityKind::Other => return None,
    };
    Some(pair)
}

/// Backslash-escape characters GitHub would read as markdown syntax.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '[' | ']' | '`' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render a Telegram message (text + entities) as GitHub-flavoured markdown.
///
/// Only formatting with a markdown counterpart is kept; mentions, hashtags and
/// bare URLs are already plain text. Text outside code spans is escaped so
/// literal `*` or `_` typed by the user stays literal.
pub fn entities_to_markdown(text: &str, entities: &[TextEntity]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    // (position, order, marker). Closing markers sort before opening ones at
    // the same position; inner spans close first and open last. Spans over the
    // same range nest by entity order.
    let mut events: Vec<(usize, (u8, usize, usize, usize), String)> = Vec::new();
    let mut verbatim: Vec<(usize, usize)> = Vec::new();
    for (idx, e) in entities.iter().enumerate() {
        let Some((open, close)) = markers(&e.kind) else {
            continue;
        };
        let start = e.offset.min(len);
        let end = (e.offset + e.length).min(len);
        if start >= end {
            continue;
        }
        if matches!(e.kind, TextEntityKind::Code | TextEntityKind::Pre { .. }) {
            verbatim.push((start, end));
        }
        events.push((end, (0, usize::MAX - start, usize::MAX - idx, 0), close));
        events.push((start, (1, start, usize::MAX - end, idx), open));
    }
    events.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    // Segments never straddle a marker, so checking the first unit is enough.
    let push_run = |out: &mut String, from: usize, to: usize| {
        let run = String::from_utf16_lossy(&units[from..to]);
        if verbatim.iter().any(|&(s, e)| s <= from && from < e) {
            out.push_str(&run);
        } else {
            out.push_str(&escape_markdown(&run));
        }
    };

    let mut out = String::with_capacity(text.len() + events.len() * 2);
    let mut pos = 0usize;
    for (at, _, marker) in events {
        if at > pos {
            push_run(&mut out, pos, at);
            pos = at;
        }
        out.push_str(&marker);
    }
    if pos < len {
        push_run(&mut out, pos, len);
    }
    out
}

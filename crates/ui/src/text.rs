use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Greedy word wrap by display width. Words wider than the line (including
/// unspaced CJK runs) are split at character boundaries.
pub(crate) fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        for ch in word.chars() {
            let mut buf = [0u8; 4];
            let w = UnicodeWidthStr::width(&*ch.encode_utf8(&mut buf));
            if current_width + w > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Splits `line` into spans, styling every case-insensitive occurrence of `term`.
pub(crate) fn highlight_line(
    line: &str,
    term: Option<&str>,
    base: Style,
    marked: Style,
) -> Line<'static> {
    let Some(term) = term.filter(|t| !t.is_empty()) else {
        return Line::from(Span::styled(line.to_string(), base));
    };

    let haystack = line.to_ascii_lowercase();
    let needle = term.to_ascii_lowercase();
    let mut spans = Vec::new();
    let mut rest = 0usize;
    while let Some(found) = haystack[rest..].find(&needle) {
        let start = rest + found;
        let end = start + needle.len();
        if start > rest {
            spans.push(Span::styled(line[rest..start].to_string(), base));
        }
        spans.push(Span::styled(line[start..end].to_string(), marked));
        rest = end;
    }
    if rest < line.len() {
        spans.push(Span::styled(line[rest..].to_string(), base));
    }
    Line::from(spans)
}

pub(crate) fn format_saved_at(timestamp_ms: i64, now_ms: i64) -> String {
    if timestamp_ms <= 0 {
        return "unknown".to_string();
    }

    let delta = now_ms.saturating_sub(timestamp_ms) / 1000;
    if delta < 10 {
        return "just now".to_string();
    }
    if delta < 60 {
        return format!("{delta}s ago");
    }
    if delta < 60 * 60 {
        return format!("{}m ago", delta / 60);
    }
    if delta < 60 * 60 * 24 {
        return format!("{}h ago", delta / (60 * 60));
    }
    format!("{}d ago", delta / (60 * 60 * 24))
}

//! Normalization of the page-context snippet sent alongside a chat message.

/// Clean up visible page text before it is attached to a request.
///
/// Non-breaking spaces become spaces. Any whitespace run that ends in a
/// newline collapses to that single newline, which also folds blank-line runs
/// into one line break. The result is trimmed, and text longer than
/// `max_chars` characters is cut and suffixed with `" …"`.
pub fn normalize_page_content(raw: &str, max_chars: usize) -> String {
    let replaced = raw.replace('\u{00A0}', " ");
    let collapsed = collapse_space_before_newlines(&replaced);

    let trimmed = collapsed.trim();
    if trimmed.chars().count() > max_chars {
        let mut cut: String = trimmed.chars().take(max_chars).collect();
        cut.push_str(" …");
        cut
    } else {
        trimmed.to_string()
    }
}

fn collapse_space_before_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_whitespace_run(&mut out, &run);
        run.clear();
        out.push(c);
    }
    flush_whitespace_run(&mut out, &run);
    out
}

/// Everything up to the run's last newline becomes one `\n`; a lone newline
/// and whatever follows the last newline are kept.
fn flush_whitespace_run(out: &mut String, run: &str) {
    match run.rfind('\n') {
        Some(idx) if idx > 0 => {
            out.push('\n');
            out.push_str(&run[idx + 1..]);
        }
        _ => out.push_str(run),
    }
}

// Sanitize extracted report text before pattern matching.
// Strips everything outside a conservative whitelist and collapses
// whitespace runs, preserving line structure for the per-line matcher.

/// Punctuation allowed through sanitization, alongside alphanumerics.
/// Covers numbers, units (mg/dL, 10^9/L, %), ranges, and comparisons.
const ALLOWED_PUNCT: &[char] = &[
    '.', ',', ':', ';', '%', '/', '(', ')', '+', '-', '<', '>', '=', '^', '_',
];

/// Whitelist-filter a line and collapse internal whitespace runs.
fn sanitize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;
    for c in line.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if c.is_alphanumeric() || ALLOWED_PUNCT.contains(&c) {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Sanitize extracted text: per line, drop characters outside the
/// whitelist and collapse whitespace; drop lines left empty.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let lines: Vec<String> = raw
        .lines()
        .map(sanitize_line)
        .filter(|l| !l.is_empty())
        .collect();
    lines.join("\n")
}

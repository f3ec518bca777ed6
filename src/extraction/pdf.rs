use std::path::Path;

use super::sanitize::sanitize_extracted_text;

/// Extract best-effort plaintext from raw PDF bytes. Never fails: any
/// input that yields nothing recognizable produces an empty string.
///
/// The scan takes the byte region between the first `stream` and the last
/// `endstream` marker as a crude proxy for the document's content objects,
/// then collects the parenthesized operands of uncompressed text-show
/// operators. Filtered (compressed/encrypted) streams contain no literal
/// parentheses worth keeping, so valid documents can still come back empty.
pub fn extract_text(bytes: &[u8]) -> String {
    let Some(region) = content_region(bytes) else {
        return String::new();
    };

    let text = String::from_utf8_lossy(region);
    let pieces = parenthesized_segments(&text);
    if pieces.is_empty() {
        return String::new();
    }

    sanitize_extracted_text(&pieces.join(" "))
}

/// Read a file and extract text from it. Unreadable or missing files are
/// logged and treated as empty, not as errors.
pub fn extract_text_from_path(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => extract_text(&bytes),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Lab report file unreadable; treating as empty"
            );
            String::new()
        }
    }
}

/// Bytes between the first `stream` and the last `endstream` marker.
fn content_region(bytes: &[u8]) -> Option<&[u8]> {
    let start = find(bytes, b"stream")? + b"stream".len();
    let end = rfind(bytes, b"endstream")?;
    if end <= start {
        return None;
    }
    Some(&bytes[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Collect the contents of literal parenthesized strings.
///
/// Tracks nesting depth (balanced parens inside a PDF string are literal)
/// and honors backslash escapes for `\(`, `\)` and `\\`.
fn parenthesized_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            if depth > 0 {
                current.push(c);
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => {
                if depth > 0 {
                    current.push(c);
                }
                depth += 1;
            }
            ')' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if !current.trim().is_empty() {
                            segments.push(std::mem::take(&mut current));
                        } else {
                            current.clear();
                        }
                    } else {
                        current.push(c);
                    }
                }
            }
            _ => {
                if depth > 0 {
                    current.push(c);
                }
            }
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal uncompressed PDF-shaped bytes with one content stream.
    fn make_report(content: &str) -> Vec<u8> {
        format!(
            "%PDF-1.4\n1 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\ntrailer\n",
            content.len(),
            content
        )
        .into_bytes()
    }

    #[test]
    fn extracts_text_show_operands() {
        let bytes = make_report("BT /F1 12 Tf (Glucose) Tj (95 mg/dL) Tj ET");
        assert_eq!(extract_text(&bytes), "Glucose 95 mg/dL");
    }

    #[test]
    fn parens_outside_stream_region_ignored() {
        let bytes = b"(not content) stream\n(Ferritin 40 ng/mL)\nendstream (also not)".to_vec();
        assert_eq!(extract_text(&bytes), "Ferritin 40 ng/mL");
    }

    #[test]
    fn escaped_parens_kept_literal() {
        let bytes = make_report(r"(HDL \(good\) 55 mg/dL) Tj");
        assert_eq!(extract_text(&bytes), "HDL (good) 55 mg/dL");
    }

    #[test]
    fn nested_parens_kept_literal() {
        let bytes = make_report("(TSH (sensitive) 2.1 mIU/L) Tj");
        assert_eq!(extract_text(&bytes), "TSH (sensitive) 2.1 mIU/L");
    }

    #[test]
    fn binary_stream_yields_empty() {
        let mut bytes = b"stream\n".to_vec();
        bytes.extend((0u8..=255).cycle().take(512));
        bytes.extend_from_slice(b"\nendstream");
        // Flate-compressed payloads have no meaningful literal parens; a
        // best-effort empty result is the contract, not a failure.
        let text = extract_text(&bytes);
        assert!(text.is_empty() || !text.contains("mg/dL"));
    }

    #[test]
    fn no_stream_markers_yields_empty() {
        assert_eq!(extract_text(b"just some bytes (with parens)"), "");
        assert_eq!(extract_text(b""), "");
    }

    #[test]
    fn missing_file_yields_empty() {
        let text = extract_text_from_path(Path::new("/nonexistent/report.pdf"));
        assert_eq!(text, "");
    }

    #[test]
    fn readable_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, make_report("(Vitamin D 28 ng/mL) Tj")).unwrap();
        assert_eq!(extract_text_from_path(&path), "Vitamin D 28 ng/mL");
    }
}

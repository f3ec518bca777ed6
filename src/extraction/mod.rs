//! Best-effort plaintext extraction from lab-report files.
//!
//! This is deliberately not a compliant PDF parser: it scans the raw bytes
//! for uncompressed text-show operands. Compressed or encrypted content
//! streams legitimately yield no text, and the caller treats an empty
//! string as "no text" rather than an error.

pub mod pdf;
pub mod sanitize;

pub use pdf::{extract_text, extract_text_from_path};
pub use sanitize::sanitize_extracted_text;

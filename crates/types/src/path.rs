//! Path normalization shared by the gateway and the metadata node.
//!
//! Both services must agree byte-for-byte on the normalized form of a
//! `file_id`, otherwise routing and storage would disagree on the key.

/// Normalize a file path into its canonical `file_id` form.
///
/// Rules: trim surrounding whitespace, prepend `/` if missing, collapse
/// runs of consecutive `/` into one, and strip a trailing `/` unless the
/// path is exactly `/`. The function is idempotent.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();

    let mut out = String::with_capacity(trimmed.len() + 1);
    if !trimmed.starts_with('/') {
        out.push('/');
    }

    let mut prev_slash = out.ends_with('/');
    for ch in trimmed.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }

    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }

    out
}

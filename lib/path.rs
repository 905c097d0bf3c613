//! Path normalization for cache keys.
//!
//! Cache keys are compared case-insensitively, but they must first agree
//! textually: repeated separators, `.` segments and trailing separators
//! are collapsed here, and `..` segments are resolved against their
//! prefix. A path that climbs above its root has no canonical form and
//! yields `None`; the cache surfaces that as "not found".

/// Normalizes `raw` into canonical cache-key form.
///
/// The root directory normalizes to `"/"`; a relative path that resolves
/// to the current directory normalizes to `""`.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let absolute = raw.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            _ => parts.push(segment),
        }
    }
    let joined = parts.join("/");
    if absolute {
        Some(format!("/{joined}"))
    } else {
        Some(joined)
    }
}

/// Splits a normalized path into (parent directory, leaf name).
///
/// Children of the root keep `"/"` as their parent; a bare name has the
/// current directory (`""`) as its parent. The leaf is empty only for the
/// root itself and for `""`.
#[must_use]
pub fn split(normalized: &str) -> (&str, &str) {
    match normalized.rfind('/') {
        Some(0) => ("/", &normalized[1..]),
        Some(i) => (&normalized[..i], &normalized[i + 1..]),
        None => ("", normalized),
    }
}

//! String helpers for console reports
//!
//! Qualified names and method ids can be long and are not guaranteed to be
//! ASCII, so every cut happens on a char boundary.

/// Longest prefix of `s` that fits in `max_bytes` and ends on a char boundary
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate to `max_bytes` and append `...` when anything was cut
pub fn truncate_with_ellipsis(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        s.to_string()
    } else {
        format!("{}...", truncate_to_char_boundary(s, max_bytes))
    }
}

/// Shorten the package part of a qualified name to initials until it fits:
/// `com.acme.billing.Invoice` -> `c.a.b.Invoice`
///
/// Falls back to [`truncate_with_ellipsis`] when even the abbreviated form is
/// too long.
pub fn abbreviate_qualified_name(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let segments: Vec<&str> = name.split('.').collect();
    let Some((last, packages)) = segments.split_last() else {
        return truncate_with_ellipsis(name, max_bytes);
    };

    let mut parts: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
    for (i, segment) in packages.iter().enumerate() {
        if let Some(first) = segment.chars().next() {
            parts[i] = first.to_string();
        }
        let candidate = parts.join(".");
        if candidate.len() <= max_bytes {
            return candidate;
        }
    }

    let shortened = parts.join(".");
    if shortened.len() <= max_bytes {
        shortened
    } else {
        truncate_with_ellipsis(last, max_bytes)
    }
}

//! Canonicalization of logical HDFS paths.
//!
//! Targets may be declared as `scheme://authority/path`, `scheme:///path` or
//! as a bare `/path`. All queue bookkeeping, ignore-list membership tests and
//! REST URLs operate on the canonical scheme- and authority-free form, so
//! comparisons never depend on how a caller spelled the filesystem URI.

/// Strips scheme and authority, collapses repeated slashes and drops any
/// trailing slash. The result is always absolute; the root stays `/`.
pub fn normalize(path: &str) -> String {
    let rest = match path.find("://") {
        Some(scheme_end) => {
            let after_scheme = &path[scheme_end + 3..];
            match after_scheme.find('/') {
                Some(authority_end) => &after_scheme[authority_end..],
                // Just `scheme://authority`, no path component.
                None => "/",
            }
        }
        None => path,
    };

    let segments = rest.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Every proper ancestor directory of `path`, ordered from the root down.
/// The root itself and `path` are not included.
pub fn ancestors(path: &str) -> Vec<String> {
    let normalized = normalize(path);
    let segments = normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    let mut result = Vec::new();
    let mut current = String::new();
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        current.push('/');
        current.push_str(segment);
        result.push(current.clone());
    }
    result
}

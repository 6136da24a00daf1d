//! Path normalization and the ancestor-candidate sequence shared by
//! resolution and conflict scanning.

/// Normalize an inbound request path
///
/// Drops a single trailing `/` and rewrites a leading `/~` to `/`, so
/// `/~docs/` and `/docs` address the same item.
pub fn normalize_request_path(raw: &str) -> String {
    let trimmed = raw.strip_suffix('/').unwrap_or(raw);
    match trimmed.strip_prefix("/~") {
        Some(rest) => format!("/{}", rest),
        None => trimmed.to_string(),
    }
}

/// Normalize a configured API prefix to `/segment[/segment...]`
pub fn normalize_api_prefix(raw: &str) -> String {
    let mut prefix = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{}", raw)
    };
    while prefix.contains("//") {
        prefix = prefix.replace("//", "/");
    }
    prefix.trim_end_matches('/').to_string()
}

/// Sub-path below the API prefix, `Some("")` for the prefix itself
pub fn api_sub_path<'a>(path: &'a str, api_prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(api_prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Number of `/`-delimited segments below the root
pub fn path_depth(path: &str) -> usize {
    path.split('/').count().saturating_sub(1)
}

/// A writable path is rooted at `/` and has no empty segments
pub fn is_well_formed(path: &str) -> bool {
    match path.strip_prefix('/') {
        Some(rest) => rest.split('/').all(|segment| !segment.is_empty()),
        None => false,
    }
}

/// Candidate paths for `path`, deepest first
///
/// Starts at `max_level` segments below the root (or the full path when it is
/// shallower) and walks up to the first segment, never reaching the bare root.
pub fn candidate_paths(path: &str, max_level: usize) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').collect();
    let deepest = max_level.saturating_add(1).min(segments.len());

    let mut candidates = Vec::with_capacity(deepest);
    for end in (2..=deepest).rev() {
        candidates.push(segments[..end].join("/"));
    }
    candidates
}

/// Whether `path` equals `prefix` or sits below it
pub fn is_under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

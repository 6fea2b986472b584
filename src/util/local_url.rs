/// Whether `url` points back into this application: a rooted path (`/x`) or an
/// app-relative path (`~/x`), never a scheme, a host or a protocol-relative
/// `//` / `/\` prefix.
#[must_use]
pub fn is_local_url(url: &str) -> bool {
    if let Some(rest) = url.strip_prefix('/') {
        is_local_remainder(rest)
    } else if let Some(rest) = url.strip_prefix("~/") {
        is_local_remainder(rest)
    } else {
        false
    }
}

fn is_local_remainder(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some('/' | '\\') => false,
        Some(_) => !rest.chars().any(char::is_control),
    }
}

/// Resolves a local URL to the path the browser should land on. `~/` is
/// relative to `path_base`.
#[must_use]
pub fn resolve_local_url(url: &str, path_base: Option<&str>) -> String {
    url.strip_prefix('~').map_or_else(
        || url.to_string(),
        |rest| format!("{}{rest}", path_base.unwrap_or_default()),
    )
}

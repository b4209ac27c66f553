//! Avatar source resolution.

/// Shown when a user has no picture or could not be looked up.
pub const DEFAULT_AVATAR_URL: &str = "/assets/default-avatar.png";

/// Turn a stored picture value into a displayable source.
///
/// Absolute URLs, root-relative paths and `data:` URIs pass through; bare
/// file names get `prefix` prepended.
pub fn resolve_avatar_src(raw: Option<&str>, prefix: &str) -> String {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return DEFAULT_AVATAR_URL.to_string();
    }

    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("data:") || value.starts_with('/') {
        return value.to_string();
    }

    format!("{}{}", prefix, value)
}

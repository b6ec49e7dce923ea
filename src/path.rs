//! Path Resolution
//!
//! Pure functions mapping logical secret paths to KV v2 wire paths and cache
//! keys. Nothing here performs I/O or keeps state.
//!
//! Logical paths use `/` as separator. The canonical form used by the client
//! has a single leading `/` and no trailing one; the root is the empty string.

/// Path segment separator
pub const SEPARATOR: char = '/';

/// Namespace label used in cache keys when no namespace is set
pub const ROOT_NAMESPACE: &str = "root";

// == Cache Kind ==
/// Operation family a cache key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Directory listings
    List,
    /// Secret values
    Secret,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::List => "list",
            CacheKind::Secret => "secret",
        }
    }
}

// == Normalize ==
/// Collapses repeated separators and strips a trailing separator.
///
/// `"//a//b/"` becomes `"/a/b"`; `"/"` becomes `""`.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_separator = false;
    for c in path.chars() {
        let is_separator = c == SEPARATOR;
        if is_separator && prev_separator {
            continue;
        }
        prev_separator = is_separator;
        out.push(c);
    }
    if out.ends_with(SEPARATOR) {
        out.pop();
    }
    out
}

// == Canonicalize ==
/// Normalizes and forces exactly one leading separator; the root is `""`.
pub fn canonicalize(path: &str) -> String {
    let normalized = normalize(path);
    let trimmed = normalized.trim_start_matches(SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}{}", SEPARATOR, trimmed)
    }
}

// == Join ==
/// Joins segments with the separator, skipping empty ones, and normalizes.
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = segments
        .into_iter()
        .filter(|s| !s.as_ref().is_empty())
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

// == Strip Mount Prefix ==
/// Removes leading segments equal to `mount`.
///
/// Every leading occurrence is stripped so that applying the function twice
/// gives the same result as applying it once. The result is normalized and
/// keeps a leading separator if the input had one.
pub fn strip_mount_prefix(path: &str, mount: &str) -> String {
    let normalized = normalize(path);
    let mount = mount.trim_matches(SEPARATOR);
    if mount.is_empty() {
        return normalized;
    }

    let leading = normalized.starts_with(SEPARATOR);
    let mut rest = normalized.trim_start_matches(SEPARATOR);
    loop {
        if rest == mount {
            rest = "";
            break;
        }
        match rest
            .strip_prefix(mount)
            .and_then(|r| r.strip_prefix(SEPARATOR))
        {
            Some(remaining) => rest = remaining,
            None => break,
        }
    }

    if leading && !rest.is_empty() {
        format!("{}{}", SEPARATOR, rest)
    } else {
        rest.to_string()
    }
}

/// Secret path relative to the mount, without leading separator.
fn relative(path: &str, mount: &str) -> String {
    strip_mount_prefix(path, mount)
        .trim_start_matches(SEPARATOR)
        .to_string()
}

fn build_url(path: &str, mount: &str, family: &str) -> String {
    let mount = mount.trim_matches(SEPARATOR);
    let relative = relative(path, mount);
    if relative.is_empty() {
        format!("/{}/{}", mount, family)
    } else {
        format!("/{}/{}/{}", mount, family, relative)
    }
}

// == Wire URLs ==
/// `/<mount>/data/<path>`: read and write.
pub fn build_data_url(path: &str, mount: &str) -> String {
    build_url(path, mount, "data")
}

/// `/<mount>/metadata/<path>`: delete of all versions.
pub fn build_metadata_url(path: &str, mount: &str) -> String {
    build_url(path, mount, "metadata")
}

/// `/<mount>/metadata/<path>/`: listing, issued with the LIST verb.
pub fn build_list_url(path: &str, mount: &str) -> String {
    format!("{}/", build_metadata_url(path, mount))
}

// == Parent Of ==
/// Drops the last segment. The parent of a top-level path, or of the root,
/// is the empty path.
pub fn parent_of(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind(SEPARATOR) {
        Some(0) | None => String::new(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Last segment of a path, or `""` for the root.
pub fn base_name(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind(SEPARATOR) {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

// == Cache Key ==
/// Builds `kind:path:namespace`, with `root` standing in for no namespace.
pub fn cache_key(kind: CacheKind, path: &str, namespace: Option<&str>) -> String {
    let namespace = namespace
        .filter(|ns| !ns.is_empty())
        .unwrap_or(ROOT_NAMESPACE);
    format!("{}:{}:{}", kind.as_str(), path, namespace)
}

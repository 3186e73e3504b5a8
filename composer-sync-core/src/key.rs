use std::path::{Component, Path};

/// Builds the remote object key for a staged file: `prefix` followed by the
/// file's path relative to the staging root, always `/`-separated.
///
/// A missing trailing `/` on the prefix is supplied; an empty prefix yields
/// the bare relative path.
pub fn object_key(prefix: &str, relative: &Path) -> String {
    let rel = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        rel
    } else {
        format!("{prefix}/{rel}")
    }
}

/// `gs://` URI of an object, as printed in the per-file success line.
pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("gs://{bucket}/{key}")
}

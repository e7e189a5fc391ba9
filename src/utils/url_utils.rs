//! URL and path manipulation utilities.
//!
//! Storage paths are `/`-separated strings relative to the archive root.
//! The helpers here turn them into URL references that work from a
//! document's own location inside the archive.

use url::Url;

/// Percent-encode every `/`-separated segment of a path independently.
///
/// Separators survive, so `../rc/a b/c?d` becomes `../rc/a%20b/c%3Fd`:
/// a `?` or `#` that is part of a file name can never be mistaken for a
/// query or fragment delimiter by whoever resolves the reference later.
#[must_use]
pub fn encode_file_path_uri(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative prefix leading from the directory of `storage_path` back to the
/// archive root, e.g. `rc/external/host/a.css` gives `../../../`.
///
/// A file at the root itself gives the empty string.
#[must_use]
pub fn to_root_dir(storage_path: &str) -> String {
    match storage_path.rsplit_once('/') {
        Some((dir, _)) => dir
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|_| "../")
            .collect(),
        None => String::new(),
    }
}

/// Resolve a reference against a base URL, keeping it only if the result is
/// an `https:` URL. Everything else is not a fetch candidate.
#[must_use]
pub fn resolve_https(reference: &str, base: &Url) -> Option<Url> {
    let resolved = base.join(reference.trim()).ok()?;
    (resolved.scheme() == "https").then_some(resolved)
}

/// Join an archive-relative storage path onto a relative prefix and encode
/// it for use as a URL reference.
#[must_use]
pub fn relative_reference(to_root: &str, storage_path: &str) -> String {
    encode_file_path_uri(&format!("{to_root}{storage_path}"))
}

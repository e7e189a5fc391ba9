//! Content-type to file extension table
//!
//! The same table answers two questions: does a storage path already carry
//! a known extension (so no inference is needed), and which extension does
//! a given content type map to. Both must agree, otherwise a resource stored
//! under an inferred extension would not be found again on the next run.

/// Known extensions with the content types that map onto them, in priority
/// order. The first entry whose types contain a content type wins.
pub const KNOWN_FILE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("apng", &["image/apng"]),
    ("avif", &["image/avif"]),
    ("bmp", &["image/bmp"]),
    ("gif", &["image/gif"]),
    ("heic", &["image/heic"]),
    ("heif", &["image/heif"]),
    ("ico", &["image/x-icon"]),
    ("jpeg", &["image/jpeg"]),
    ("jpg", &["image/jpeg"]),
    ("jfif", &["image/jpeg"]),
    ("jxl", &["image/jxl"]),
    ("png", &["image/png"]),
    ("svg", &["image/svg+xml", "image/svg"]),
    ("tif", &["image/tiff"]),
    ("tiff", &["image/tiff"]),
    ("webp", &["image/webp"]),
    ("flac", &["audio/flac"]),
    ("ogg", &["audio/ogg", "video/ogg", "application/ogg"]),
    ("opus", &["audio/opus"]),
    ("mp3", &["audio/mpeg"]),
    ("mp4", &["audio/mp4", "video/mp4"]),
    ("m4a", &["audio/mp4", "video/mp4"]),
    ("wav", &["audio/wav", "audio/vnd.wave", "audio/wave", "audio/x-wav"]),
    ("css", &["text/css"]),
    ("js", &["application/javascript", "text/javascript"]),
    ("mjs", &["application/javascript", "text/javascript"]),
    ("json", &["application/json", "text/json"]),
    ("map", &[]),
    ("woff", &["font/woff"]),
    ("woff2", &["font/woff2"]),
];

/// Length in bytes of the longest extension in the table
#[must_use]
pub fn longest_known_extension() -> usize {
    KNOWN_FILE_EXTENSIONS
        .iter()
        .map(|(ext, _)| ext.len())
        .max()
        .unwrap_or_default()
}

/// Strip parameters (`; charset=...`) and normalize case
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Extension for a content type, if the table knows it
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = essence(content_type);
    if essence.is_empty() {
        return None;
    }
    KNOWN_FILE_EXTENSIONS
        .iter()
        .find(|(_, types)| types.contains(&essence.as_str()))
        .map(|(ext, _)| *ext)
}

/// Whether the last segment of a storage path ends in a known extension
#[must_use]
pub fn has_known_extension(storage_path: &str) -> bool {
    let file_name = storage_path.rsplit('/').next().unwrap_or(storage_path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            KNOWN_FILE_EXTENSIONS.iter().any(|(known, _)| *known == ext)
        }
        _ => false,
    }
}

/// Whether a content type denotes a stylesheet that must be rewritten
#[must_use]
pub fn is_css(content_type: &str) -> bool {
    essence(content_type) == "text/css"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_entry_wins() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for_content_type("video/mp4"), Some("mp4"));
        assert_eq!(extension_for_content_type("application/ogg"), Some("ogg"));
        assert_eq!(extension_for_content_type("image/svg"), Some("svg"));
    }

    #[test]
    fn parameters_and_case_are_ignored() {
        assert_eq!(extension_for_content_type("Text/CSS; charset=utf-8"), Some("css"));
        assert!(is_css("text/css;charset=UTF-8"));
        assert!(!is_css("text/plain"));
    }

    #[test]
    fn unknown_or_missing_types_have_no_extension() {
        assert_eq!(extension_for_content_type(""), None);
        assert_eq!(extension_for_content_type("application/octet-stream"), None);
    }

    #[test]
    fn known_extension_detection() {
        assert!(has_known_extension("rc/attachment/abc/cat.PNG"));
        assert!(has_known_extension("rc/external/example.com/app.js.map"));
        assert!(!has_known_extension("rc/avatar/123/abc"));
        assert!(!has_known_extension("rc/external/example.com/archive.tar"));
        assert!(!has_known_extension("rc/external/example.com/.png"));
    }
}

//! Shared constants for cohost_archive
//!
//! Host names, on-disk layout and request defaults used throughout the
//! crate. Keeping them in one place lets the path policy, the fetch
//! coordinator and the rewriters agree on the same layout.

/// User agent sent with every outbound request
pub const USER_AGENT: &str = "cohost-dl/1.0";

/// The platform's primary host. The session cookie is only ever sent here.
pub const PRIMARY_HOST: &str = "cohost.org";

/// Origin of the primary host, used as a base for host-relative URLs
pub const PRIMARY_ORIGIN: &str = "https://cohost.org";

/// Staging CDN host. Production CDN URLs are rewritten onto this host.
pub const CDN_HOST: &str = "staging.cohostcdn.org";

/// Origin of the staging CDN
pub const CDN_ORIGIN: &str = "https://staging.cohostcdn.org";

/// Directory (relative to the archive root) holding every fetched resource
pub const RESOURCE_CACHE_DIR: &str = "rc";

/// Directory (relative to the archive root) holding resources from hosts
/// other than the platform's own
pub const EXTERNAL_CACHE_DIR: &str = "rc/external";

/// Sidecar file storing the content-type cache
///
/// The leading `~` keeps it out of the namespace of archived paths, which
/// never start with that character.
pub const CONTENT_TYPE_CACHE_FILE: &str = "~headers.json";

/// Maximum length of a single path segment, in UTF-8 bytes
///
/// Extensions inferred from a content type come on top of this, see
/// [`MAX_FILE_NAME_LENGTH_ON_DISK`].
pub const MAX_FILE_NAME_LENGTH_UTF8: usize = 250;

/// File name limit of common filesystems (`NAME_MAX`), in bytes
///
/// A file name waiting for an inferred extension is split short enough
/// that the longest known extension still fits under it.
pub const MAX_FILE_NAME_LENGTH_ON_DISK: usize = 255;

/// Delay between the first unsaved content-type cache change and the
/// scheduled flush to disk
pub const CONTENT_TYPE_FLUSH_DELAY_MS: u64 = 5000;

/// Synthetic base for markdown bodies, which carry no document URL of their own
pub const MARKDOWN_BASE_URL: &str = "https://cohost.org/x";

/// Path prefix of same-origin static assets (custom emoji and friends)
pub const STATIC_ASSET_PREFIX: &str = "https://cohost.org/static/";

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Maximum number of response body bytes quoted in an HTTP error
pub const ERROR_BODY_EXCERPT_LEN: usize = 512;

/// Characters that cannot appear in a Windows file name
pub const WINDOWS_FORBIDDEN_CHARS: &[char] = &['?', '%', '*', ':', '|', '"', '<', '>'];

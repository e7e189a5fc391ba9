//! Resource fetching and storage
//!
//! [`PathPolicy`] decides what a URL is stored as, [`ContentTypeCache`]
//! remembers inferred extensions across runs, and [`FetchCoordinator`]
//! ties them together behind a single `resolve` entry point.

pub mod content_type_cache;
pub mod coordinator;
pub mod error;
pub mod extensions;
pub mod http;
pub mod path_policy;
pub mod storage;

pub use content_type_cache::ContentTypeCache;
pub use coordinator::{FetchCoordinator, ResolveFuture};
pub use error::{ResourceError, ResourceResult};
pub use extensions::{KNOWN_FILE_EXTENSIONS, extension_for_content_type, has_known_extension};
pub use http::{FetchFuture, FetchedResponse, HttpFetch, ReqwestFetcher, RequestHeaders, request_headers};
pub use path_policy::{PathPolicy, ResourceRequest, split_too_long_segments};

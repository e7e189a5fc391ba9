pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{encode_file_path_uri, relative_reference, resolve_https, to_root_dir};

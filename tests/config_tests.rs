//! Tests for the type-safe configuration builder and config files

use std::time::Duration;

use cohost_archive::config::{ArchiveConfig, ConfigError};
use tempfile::TempDir;

#[test]
fn test_builder_requires_cookie_and_output_dir() {
    // This should not compile if uncommented - missing both required fields
    // let config = ArchiveConfig::builder().build();

    // This should also not compile - output_dir before cookie
    // let config = ArchiveConfig::builder().output_dir("out").cookie("c").build();

    let temp_dir = TempDir::new().expect("temp dir");
    let config = ArchiveConfig::builder()
        .cookie("connect.sid=abc")
        .output_dir(temp_dir.path())
        .build()
        .expect("valid config");

    assert_eq!(config.cookie(), "connect.sid=abc");
    assert_eq!(config.output_dir(), temp_dir.path());
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = ArchiveConfig::builder()
        .cookie("")
        .output_dir("out")
        .build()
        .expect("valid config");

    assert!(config.projects().is_empty());
    assert!(config.posts().is_empty());
    assert!(config.skip_posts().is_empty());
    assert!(config.load_liked_posts());
    assert_eq!(config.request_delay(), Duration::ZERO);
    assert_eq!(config.request_timeout(), Duration::from_secs(120));
    assert_eq!(config.windows_paths(), cfg!(windows));
}

#[test]
fn test_builder_with_all_optional_fields() {
    let config = ArchiveConfig::builder()
        .projects(["a", "b"])
        .cookie("c")
        .post("https://cohost.org/a/post/1-x")
        .skip_post(9639936)
        .do_not_fetch_hostname(" R0T.is ")
        .request_delay_secs(0.5)
        .output_dir("out")
        .request_timeout_secs(30)
        .windows_paths(true)
        .load_liked_posts(false)
        .build()
        .expect("valid config");

    assert_eq!(config.projects(), ["a", "b"]);
    assert!(config.is_skipped(9639936));
    assert!(!config.is_skipped(1));
    assert_eq!(config.do_not_fetch_hostnames(), ["r0t.is"]);
    assert_eq!(config.request_delay(), Duration::from_millis(500));
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
    assert!(config.windows_paths());
    assert!(!config.load_liked_posts());
}

#[test]
fn test_builder_rejects_invalid_values() {
    let negative_delay = ArchiveConfig::builder()
        .cookie("c")
        .output_dir("out")
        .request_delay_secs(-1.0)
        .build();
    assert!(matches!(
        negative_delay,
        Err(ConfigError::Invalid { field: "request_delay_secs", .. })
    ));

    let bad_handle = ArchiveConfig::builder()
        .cookie("c")
        .output_dir("out")
        .project("a/b")
        .build();
    assert!(matches!(bad_handle, Err(ConfigError::Invalid { field: "projects", .. })));

    let zero_timeout = ArchiveConfig::builder()
        .cookie("c")
        .output_dir("out")
        .request_timeout_secs(0)
        .build();
    assert!(matches!(
        zero_timeout,
        Err(ConfigError::Invalid { field: "request_timeout_secs", .. })
    ));
}

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cohost-archive.toml");
    std::fs::write(
        &path,
        r#"
cookie = "connect.sid=abc"
output_dir = "out"
projects = ["your-handle"]
posts = ["https://cohost.org/example/123456-example-post"]
do_not_fetch_hostnames = ["eggbugpocket.queertra.sh", "r0t.is"]
skip_posts = [9639936]
request_delay_secs = 1.5
"#,
    )
    .expect("write config");

    let config = ArchiveConfig::from_toml_file(&path)
        .expect("valid config")
        .with_output_dir(temp_dir.path().join("archive"));
    assert_eq!(config.projects(), ["your-handle"]);
    assert_eq!(config.request_delay(), Duration::from_millis(1500));
    assert_eq!(config.output_dir(), temp_dir.path().join("archive"));
}

#[test]
fn test_missing_config_file_is_a_read_error() {
    let temp_dir = TempDir::new().expect("temp dir");
    let err = ArchiveConfig::from_toml_file(temp_dir.path().join("nope.toml"))
        .expect_err("missing file");
    assert!(matches!(err, ConfigError::Read { .. }));
}

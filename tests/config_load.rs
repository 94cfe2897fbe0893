// tests/config_load.rs
//
// Config resolution: $HEADLINES_CONFIG_PATH, then ./config/headlines.toml, then defaults,
// with the HEADLINES_* env overrides on top. Env and cwd are process-global, so serial.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;

use headline_relay::config::app::{
    AppConfig, ENV_BIND, ENV_CONFIG_PATH, ENV_DATABASE_URL, ENV_DEFAULT_SITE, ENV_MODEL_PATH,
};
use headline_relay::notify::NotifyFormat;

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        ENV_BIND,
        ENV_DEFAULT_SITE,
        ENV_MODEL_PATH,
        ENV_DATABASE_URL,
    ] {
        std::env::remove_var(k);
    }
}

/// Run `f` with the cwd switched to `dir`, restoring it afterwards.
fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
    let prev = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir).unwrap();
    let out = f();
    std::env::set_current_dir(prev).unwrap();
    out
}

fn write(path: &Path, body: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
    path.to_path_buf()
}

#[test]
#[serial]
fn defaults_when_no_file_and_no_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let cfg = in_dir(dir.path(), AppConfig::load_default).unwrap();
    assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    assert_eq!(cfg.server.default_site, "bbc.com");
    assert_eq!(cfg.queue.workers, 4);
    assert_eq!(cfg.fetch.max_retries, 2);
    assert!(cfg.classifier.enabled);
    assert!(cfg.store.database_url.is_none());
}

#[test]
#[serial]
fn env_path_wins_over_cwd_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("config/headlines.toml"),
        "[server]\ndefault_site = \"wsj.com\"\n",
    );
    let explicit = write(
        &dir.path().join("custom.toml"),
        "[server]\ndefault_site = \"foxnews.com\"\n[notify]\nformat = \"plain\"\n",
    );

    std::env::set_var(ENV_CONFIG_PATH, &explicit);
    let cfg = in_dir(dir.path(), AppConfig::load_default).unwrap();
    clear_env();

    assert_eq!(cfg.server.default_site, "foxnews.com");
    assert_eq!(cfg.notify.format, NotifyFormat::Plain);
}

#[test]
#[serial]
fn cwd_file_used_when_env_unset() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("config/headlines.toml"),
        "[server]\ndefault_site = \"wsj.com\"\n[queue]\nworkers = 2\n",
    );
    let cfg = in_dir(dir.path(), AppConfig::load_default).unwrap();
    assert_eq!(cfg.server.default_site, "wsj.com");
    assert_eq!(cfg.queue.workers, 2);
    assert_eq!(cfg.queue.capacity, 64);
}

#[test]
#[serial]
fn missing_env_path_is_an_error() {
    clear_env();
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let res = AppConfig::load_default();
    clear_env();
    assert!(res.is_err());
}

#[test]
#[serial]
fn env_overrides_apply_on_top_of_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir.path().join("h.toml"),
        "[server]\nbind = \"127.0.0.1:1\"\n",
    );
    std::env::set_var(ENV_BIND, "127.0.0.1:9999");
    std::env::set_var(ENV_DEFAULT_SITE, "theguardian.com");
    std::env::set_var(ENV_MODEL_PATH, "/models/alt.json");
    std::env::set_var(ENV_DATABASE_URL, "sqlite::memory:");
    let cfg = AppConfig::load_from(&path);
    clear_env();

    let cfg = cfg.unwrap();
    assert_eq!(cfg.server.bind, "127.0.0.1:9999");
    assert_eq!(cfg.server.default_site, "theguardian.com");
    assert_eq!(cfg.classifier.model_path, PathBuf::from("/models/alt.json"));
    assert_eq!(cfg.store.database_url.as_deref(), Some("sqlite::memory:"));
}

#[test]
#[serial]
fn invalid_files_are_rejected() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("bad_site.toml", "[server]\ndefault_site = \"xyz.com\"\n"),
        ("zero_workers.toml", "[queue]\nworkers = 0\n"),
        ("bad_origin.toml", "[fetch.origins]\n\"bbc.com\" = \"not a url\"\n"),
        ("unknown_origin.toml", "[fetch.origins]\n\"cnn.com\" = \"http://x/\"\n"),
        ("bad_format.toml", "[notify]\nformat = \"html\"\n"),
        ("not_toml.toml", "this is = = not toml"),
    ];
    for (name, body) in cases {
        let path = write(&dir.path().join(name), body);
        assert!(AppConfig::load_from(&path).is_err(), "{name} should be rejected");
    }
}

#[test]
#[serial]
fn shipped_sample_config_is_valid() {
    clear_env();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/headlines.toml");
    let cfg = AppConfig::load_from(&path).expect("sample config loads");
    assert_eq!(cfg.server.default_site, "bbc.com");
    assert_eq!(cfg.notify.format, NotifyFormat::Blocks);
}

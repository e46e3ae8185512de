#![allow(dead_code)]

pub mod mock_service;

use mock_service::MockService;
use sendonce::transfer::TransferClient;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

/// Spin up a mock service and a client pointed at it.
pub async fn start_service() -> (MockService, TransferClient) {
    let service = MockService::default();
    let base_url = service.spawn().await;
    let client = TransferClient::new(&base_url, 0).expect("client");
    (service, client)
}

pub fn write_temp_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write temp file");
    path
}

/// Allocate a sparse file of `len` bytes without writing them.
pub fn sparse_temp_file(dir: &TempDir, name: &str, len: u64) -> PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).expect("create sparse file");
    file.set_len(len).expect("set sparse length");
    path
}

/// Deterministic non-trivial payload for content round-trips.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvRestore {
    xdg_config_home: Option<std::ffi::OsString>,
    base_url: Option<std::ffi::OsString>,
    timeout_secs: Option<std::ffi::OsString>,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        restore_var("XDG_CONFIG_HOME", self.xdg_config_home.take());
        restore_var("SENDONCE_SERVICE__BASE_URL", self.base_url.take());
        restore_var("SENDONCE_SERVICE__TIMEOUT_SECS", self.timeout_secs.take());
    }
}

fn restore_var(key: &str, value: Option<std::ffi::OsString>) {
    match value {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}

fn write_config(temp_dir: &TempDir, contents: &str) {
    let app_config_dir = temp_dir.path().join("sendonce");
    std::fs::create_dir_all(&app_config_dir).expect("create config dir");
    std::fs::write(app_config_dir.join("config.toml"), contents).expect("write config");
}

/// Run `f` against an isolated config dir with all sendonce env vars
/// cleared, restoring the environment afterwards.
pub fn with_config_env<T>(config_toml: &str, f: impl FnOnce() -> T) -> T {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().expect("temp dir");

    write_config(&temp_dir, config_toml);

    let restore = EnvRestore {
        xdg_config_home: std::env::var_os("XDG_CONFIG_HOME"),
        base_url: std::env::var_os("SENDONCE_SERVICE__BASE_URL"),
        timeout_secs: std::env::var_os("SENDONCE_SERVICE__TIMEOUT_SECS"),
    };

    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    std::env::remove_var("SENDONCE_SERVICE__BASE_URL");
    std::env::remove_var("SENDONCE_SERVICE__TIMEOUT_SECS");

    let result = f();
    drop(restore);
    result
}

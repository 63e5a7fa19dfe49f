//! 反馈日志路径解析
//!
//! 默认路径 `~/.openclaw/feedback/log.jsonl` 在进程内只计算一次；
//! 显式传入的自定义路径每次单独解析，不会写入缓存。

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const DEFAULT_STORE_DIR: &str = ".openclaw/feedback";
const DEFAULT_STORE_FILE: &str = "log.jsonl";

static DEFAULT_STORE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// 解析反馈日志文件的绝对路径
pub fn resolve_store_path(custom: Option<&Path>) -> PathBuf {
    match custom {
        Some(path) => absolutize(&expand_tilde(path, &home_dir())),
        None => default_store_path().to_path_buf(),
    }
}

/// 进程级缓存的默认路径
pub fn default_store_path() -> &'static Path {
    DEFAULT_STORE_PATH.get_or_init(|| {
        absolutize(&home_dir().join(DEFAULT_STORE_DIR).join(DEFAULT_STORE_FILE))
    })
}

fn home_dir() -> PathBuf {
    home_dir_with(|key| std::env::var_os(key))
}

/// `HOME` → `USERPROFILE` → 当前目录；空值视为未设置
fn home_dir_with(get: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .find_map(|key| get(key).filter(|h| !h.is_empty()))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        return home.join(rest);
    }
    path.to_path_buf()
}

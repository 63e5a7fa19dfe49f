//! 追加写入的 JSONL 反馈日志
//!
//! 每行一个 JSON 对象。所有写请求在调用时同步进入同一个队列，
//! 由唯一的后台写线程按顺序落盘，因此同一进程内的并发反馈不会交错、也不会乱序。
//!
//! 写入是"即发即忘"的：任何失败只记录日志，`append` 返回的 future 永远正常完成，
//! 反馈采集不能打断调用方的主流程。
//!
//! ```rust,no_run
//! use claw_feedback::feedback::{AppendOptions, FeedbackEntry, FeedbackStore, Sentiment};
//!
//! # async fn example() {
//! let store = FeedbackStore::new();
//! let entry = FeedbackEntry::reaction("👍", Sentiment::Positive)
//!     .with_model("deepseek", "deepseek-chat")
//!     .with_source("discord-reaction");
//! store.append(entry, AppendOptions::default()).await;
//! # }
//! ```

use super::path::resolve_store_path;
use super::types::FeedbackEntry;
use crate::error::{FeedbackError, Result};
use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// 默认的日志大小阈值（5 MB），仅用于告警
pub const DEFAULT_MAX_BYTES: u64 = 5_000_000;

/// 单次写入的选项
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// 自定义日志路径，`None` 使用默认路径
    pub store_path: Option<PathBuf>,
    /// 写入后文件超过该大小时输出告警（不会轮转或截断）
    pub max_bytes: Option<u64>,
}

impl AppendOptions {
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

struct WriteJob {
    entry: FeedbackEntry,
    options: AppendOptions,
    done: oneshot::Sender<()>,
}

/// 单写者的反馈日志句柄
///
/// 进程内所有句柄共用同一个无界队列和同一个写线程，
/// 因此不论从哪个句柄发起，写入顺序都与调用顺序一致。
/// 写线程在第一次创建句柄时启动，不依赖任何 tokio runtime。
#[derive(Clone)]
pub struct FeedbackStore {
    tx: mpsc::UnboundedSender<WriteJob>,
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self {
            tx: writer().clone(),
        }
    }

    /// 追加一条反馈
    ///
    /// 请求在调用时立即入队（不需要先 poll），写入顺序与调用顺序一致；
    /// 返回的 future 在这条记录处理完（无论成功或失败）后完成。
    pub fn append(
        &self,
        entry: FeedbackEntry,
        options: AppendOptions,
    ) -> impl Future<Output = ()> + Send + 'static {
        let (done, finished) = oneshot::channel();
        if self.tx.send(WriteJob { entry, options, done }).is_err() {
            error!("❌ 写入反馈失败: {}", FeedbackError::WriterClosed);
        }
        async move {
            // 发送端在写完或被丢弃时都会让这里返回
            let _ = finished.await;
        }
    }
}

/// 进程唯一的写队列
fn writer() -> &'static mpsc::UnboundedSender<WriteJob> {
    static WRITER: OnceLock<mpsc::UnboundedSender<WriteJob>> = OnceLock::new();
    WRITER.get_or_init(|| {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = std::thread::Builder::new()
            .name("feedback-writer".to_string())
            .spawn(move || run_writer(rx))
        {
            // rx 随闭包一起被丢弃，后续 append 会立即完成并记录 WriterClosed
            error!(error = %e, "❌ 无法启动反馈写线程");
        }
        tx
    })
}

/// 进程级默认 Store（懒初始化）
pub fn global_store() -> Arc<FeedbackStore> {
    static STORE: OnceLock<Arc<FeedbackStore>> = OnceLock::new();
    STORE.get_or_init(|| Arc::new(FeedbackStore::new())).clone()
}

/// 通过进程级默认 Store 追加一条反馈，失败只记日志
pub async fn append_feedback(entry: FeedbackEntry, options: AppendOptions) {
    global_store().append(entry, options).await
}

// ── 写线程 ────────────────────────────────────────────────────────────────────

fn run_writer(mut rx: mpsc::UnboundedReceiver<WriteJob>) {
    while let Some(job) = rx.blocking_recv() {
        match write_entry(&job.entry, &job.options) {
            Ok((path, len)) => {
                debug!(path = %path.display(), bytes = len, "💾 反馈已写入");
                if let Some(max) = job.options.max_bytes
                    && len > max
                {
                    warn!(
                        path = %path.display(),
                        bytes = len,
                        max_bytes = max,
                        "⚠️ 反馈日志超过大小阈值，建议轮转"
                    );
                }
            }
            Err(e) => {
                error!("❌ 写入反馈失败: {e}");
            }
        }
        let _ = job.done.send(());
    }
    debug!("反馈写线程退出");
}

/// 序列化并追加一行，返回目标路径和写入后的文件大小
fn write_entry(entry: &FeedbackEntry, options: &AppendOptions) -> Result<(PathBuf, u64)> {
    let path = resolve_store_path(options.store_path.as_deref());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| FeedbackError::IoError(format!("创建目录失败: {e}")))?;
    }
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| FeedbackError::IoError(format!("打开反馈日志失败: {e}")))?;
    // 整行一次写入，避免半行
    file.write_all(line.as_bytes())
        .map_err(|e| FeedbackError::IoError(format!("写入反馈日志失败: {e}")))?;
    let len = file.metadata().map(|m| m.len()).unwrap_or_default();
    Ok((path, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::query::{FeedbackQuery, query_feedback};
    use crate::feedback::types::Sentiment;

    fn opts(path: &std::path::Path) -> AppendOptions {
        AppendOptions::default().with_store_path(path)
    }

    #[tokio::test]
    async fn test_append_then_query_reverse_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let store = FeedbackStore::new();

        let entries: Vec<FeedbackEntry> = (0..5)
            .map(|i| {
                FeedbackEntry::comment(format!("note {i}"), Sentiment::Neutral)
                    .with_timestamp(1000 + i)
            })
            .collect();
        for e in &entries {
            store.append(e.clone(), opts(&path)).await;
        }

        let got = query_feedback(&FeedbackQuery::new().with_store_path(&path).with_limit(10))
            .await
            .unwrap();
        let expected: Vec<FeedbackEntry> = entries.into_iter().rev().collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_each_line_parses_back_to_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/log.jsonl");
        let store = FeedbackStore::new();

        let a = FeedbackEntry::reaction("👍", Sentiment::Positive)
            .with_model("deepseek", "deepseek-chat")
            .with_channel("discord", Some("c-1".to_string()))
            .with_guild("g-1")
            .with_account("acc")
            .with_user("u-1", Some("peter#1234".to_string()))
            .with_session("agent:main")
            .with_message("m-1")
            .with_source("discord-reaction");
        let b = FeedbackEntry::grade("work", "B+", Sentiment::Negative).with_note("slow");
        store.append(a.clone(), opts(&path)).await;
        store.append(b.clone(), opts(&path)).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
        let parsed: Vec<FeedbackEntry> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed, vec![a, b]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_issue_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let store = FeedbackStore::new();

        // 先全部发起，再一起等待
        let pending: Vec<_> = (0..50)
            .map(|i| {
                let entry = FeedbackEntry::comment("x".repeat(200), Sentiment::Neutral)
                    .with_timestamp(i);
                store.append(entry, opts(&path))
            })
            .collect();
        futures::future::join_all(pending).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        let ts: Vec<u64> = raw
            .lines()
            .map(|l| serde_json::from_str::<FeedbackEntry>(l).unwrap().ts)
            .collect();
        assert_eq!(ts, (0..50).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_concurrent_appends_from_tasks_are_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let store = std::sync::Arc::new(FeedbackStore::new());

        let mut handles = Vec::new();
        for i in 0..20u64 {
            let store = store.clone();
            let options = opts(&path);
            handles.push(tokio::spawn(async move {
                let entry =
                    FeedbackEntry::comment("y".repeat(64), Sentiment::Positive).with_timestamp(i);
                store.append(entry, options).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 20);
        for line in raw.lines() {
            serde_json::from_str::<FeedbackEntry>(line).unwrap();
        }
    }

    #[tokio::test]
    async fn test_separate_handles_share_issue_order() {
        let dir = tempfile::tempdir().unwrap();
        let busy = dir.path().join("busy.jsonl");
        let path = dir.path().join("log.jsonl");
        let a = FeedbackStore::new();
        let b = FeedbackStore::new();

        // 先让 a 积压大量写入，再分别从 a、b 各写一条到同一文件
        let mut pending: Vec<_> = (0..2000)
            .map(|i| {
                let entry = FeedbackEntry::comment("busy", Sentiment::Neutral).with_timestamp(i);
                a.append(entry, opts(&busy))
            })
            .collect();
        pending.push(a.append(
            FeedbackEntry::comment("first", Sentiment::Neutral).with_timestamp(1),
            opts(&path),
        ));
        pending.push(b.append(
            FeedbackEntry::comment("second", Sentiment::Neutral).with_timestamp(2),
            opts(&path),
        ));
        futures::future::join_all(pending).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        let ts: Vec<u64> = raw
            .lines()
            .map(|l| serde_json::from_str::<FeedbackEntry>(l).unwrap().ts)
            .collect();
        assert_eq!(ts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_global_store_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");

        append_feedback(FeedbackEntry::comment("a", Sentiment::Positive), opts(&path)).await;
        append_feedback(FeedbackEntry::comment("b", Sentiment::Negative), opts(&path)).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(Arc::ptr_eq(&global_store(), &global_store()));
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let bad = blocker.join("sub/log.jsonl");
        let good = dir.path().join("log.jsonl");
        let store = FeedbackStore::new();

        // 父目录是个文件，创建失败，但调用方照常完成
        store
            .append(FeedbackEntry::comment("lost", Sentiment::Neutral), opts(&bad))
            .await;
        // 失败不影响后续写入
        store
            .append(FeedbackEntry::comment("kept", Sentiment::Neutral), opts(&good))
            .await;

        assert!(!bad.exists());
        let raw = std::fs::read_to_string(&good).unwrap();
        assert_eq!(raw.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_max_bytes_is_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let store = FeedbackStore::new();

        for _ in 0..3 {
            store
                .append(
                    FeedbackEntry::comment("z".repeat(100), Sentiment::Neutral),
                    opts(&path).with_max_bytes(10),
                )
                .await;
        }
        // 超过阈值也不轮转、不截断
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 3);
    }
}

//! 反馈追踪
//!
//! 记录用户对机器人回复的情感信号（emoji 反应、结构化评分、自由评论），
//! 追加写入 JSONL 日志，并提供简单的过滤与按模型聚合，用于周报和质量对比。
//!
//! | 组件 | 作用 |
//! |------|------|
//! | [`resolve_reaction_sentiment`] | 反应 → 情感分值 |
//! | [`resolve_store_path`] | 日志路径解析（默认路径进程内缓存） |
//! | [`FeedbackStore`] | 单队列顺序追加写入，失败不外抛 |
//! | [`query_feedback`] / [`aggregate_feedback_by_model`] | 全量扫描查询与聚合 |
//! | [`FeedbackRecorder`] | 套用 [`FeedbackConfig`] 的采集入口 |
//!
//! ```rust,no_run
//! use claw_feedback::feedback::{FeedbackConfig, FeedbackRecorder};
//!
//! # async fn example() -> claw_feedback::error::Result<()> {
//! let recorder = FeedbackRecorder::with_global_store(FeedbackConfig::default());
//! let entry = recorder
//!     .reaction("👍")
//!     .with_channel("discord", Some("1234".to_string()))
//!     .with_model("deepseek", "deepseek-chat")
//!     .with_source("discord-reaction");
//! recorder.record(entry).await;
//!
//! let by_model = recorder.aggregate(None, None).await?;
//! for (label, tally) in &by_model {
//!     println!("{label}: +{} / -{}", tally.positive, tally.negative);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod path;
pub mod query;
pub mod reaction;
pub mod recorder;
pub mod store;
pub mod types;

pub use config::FeedbackConfig;
pub use path::resolve_store_path;
pub use query::{
    AggregateQuery, FeedbackQuery, ModelTally, aggregate_feedback_by_model, query_feedback,
    tally_by_model,
};
pub use reaction::resolve_reaction_sentiment;
pub use recorder::FeedbackRecorder;
pub use store::{AppendOptions, FeedbackStore, append_feedback, global_store};
pub use types::{FeedbackEntry, FeedbackKind, Sentiment};

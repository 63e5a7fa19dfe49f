//! 反馈查询与聚合
//!
//! 每次查询都全量扫描 JSONL 文件，没有索引。解析与过滤是两个独立步骤：
//! 解析失败的行（例如写到一半的尾行）直接丢弃，不影响其它记录。

use super::path::resolve_store_path;
use super::types::{FeedbackEntry, FeedbackKind, Sentiment};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// 默认最多返回的条数
pub const DEFAULT_QUERY_LIMIT: usize = 500;
/// 聚合时扫描的最大条数
pub const DEFAULT_AGGREGATE_WINDOW: usize = 10_000;
/// 既没有 modelLabel 也没有 model 的记录归入此桶
pub const UNKNOWN_MODEL: &str = "unknown";

// ── FeedbackQuery ─────────────────────────────────────────────────────────────

/// 查询条件，所有已设置的条件需同时满足
#[derive(Debug, Clone)]
pub struct FeedbackQuery {
    /// 时间下界（Unix 毫秒，含）
    pub since: Option<u64>,
    /// 时间上界（Unix 毫秒，含）
    pub until: Option<u64>,
    pub kind: Option<FeedbackKind>,
    pub sentiment: Option<Sentiment>,
    /// 如 "deepseek/deepseek-chat"
    pub model_label: Option<String>,
    pub provider: Option<String>,
    /// "discord"、"telegram" 等
    pub channel: Option<String>,
    /// "discord-reaction"、"standup"、"weekly-report" 等
    pub source: Option<String>,
    /// 最多返回条数（新的在前）
    pub limit: usize,
    pub store_path: Option<PathBuf>,
}

impl Default for FeedbackQuery {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            kind: None,
            sentiment: None,
            model_label: None,
            provider: None,
            channel: None,
            source: None,
            limit: DEFAULT_QUERY_LIMIT,
            store_path: None,
        }
    }
}

impl FeedbackQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, ts: u64) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn until(mut self, ts: u64) -> Self {
        self.until = Some(ts);
        self
    }

    pub fn with_kind(mut self, kind: FeedbackKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_model_label(mut self, label: impl Into<String>) -> Self {
        self.model_label = Some(label.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// 记录是否满足全部条件
    pub fn matches(&self, entry: &FeedbackEntry) -> bool {
        if self.since.is_some_and(|since| entry.ts < since) {
            return false;
        }
        if self.until.is_some_and(|until| entry.ts > until) {
            return false;
        }
        if self.kind.is_some_and(|kind| entry.kind != kind) {
            return false;
        }
        if self.sentiment.is_some_and(|s| entry.sentiment != s) {
            return false;
        }
        field_matches(&self.model_label, &entry.model_label)
            && field_matches(&self.provider, &entry.provider)
            && field_matches(&self.channel, &entry.channel)
            && field_matches(&self.source, &entry.source)
    }
}

fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        Some(w) => actual.as_deref() == Some(w.as_str()),
        None => true,
    }
}

/// 解析一行；空行或非法 JSON 返回 `None`
fn parse_line(line: &str) -> Option<FeedbackEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

/// 按条件读取反馈，新的在前（以文件中的位置为准，而不是时间戳）
///
/// 文件不存在返回空列表；其它 IO 错误向上返回。
pub async fn query_feedback(query: &FeedbackQuery) -> Result<Vec<FeedbackEntry>> {
    let path = resolve_store_path(query.store_path.as_deref());
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "反馈日志不存在，返回空结果");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    // 损坏的字节只会让所在行解析失败
    let raw = String::from_utf8_lossy(&bytes);

    let results: Vec<FeedbackEntry> = raw
        .lines()
        .rev()
        .filter_map(parse_line)
        .filter(|entry| query.matches(entry))
        .take(query.limit)
        .collect();
    debug!(path = %path.display(), hits = results.len(), "🔍 反馈查询");
    Ok(results)
}

// ── 聚合 ──────────────────────────────────────────────────────────────────────

/// 单个模型的情感计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelTally {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub total: u64,
}

impl ModelTally {
    pub fn record(&mut self, sentiment: Sentiment) {
        self.total += 1;
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    /// 正面数减负面数
    pub fn net(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }
}

/// 聚合条件
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    pub since: Option<u64>,
    pub until: Option<u64>,
    /// 最多纳入统计的最新记录数
    pub window: usize,
    pub store_path: Option<PathBuf>,
}

impl Default for AggregateQuery {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            window: DEFAULT_AGGREGATE_WINDOW,
            store_path: None,
        }
    }
}

impl AggregateQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, ts: u64) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn until(mut self, ts: u64) -> Self {
        self.until = Some(ts);
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }
}

/// 按 modelLabel 分桶（缺失时退回 model，再退回 "unknown"）
pub fn tally_by_model<'a>(
    entries: impl IntoIterator<Item = &'a FeedbackEntry>,
) -> BTreeMap<String, ModelTally> {
    let mut buckets: BTreeMap<String, ModelTally> = BTreeMap::new();
    for entry in entries {
        let key = entry
            .model_label
            .as_deref()
            .or(entry.model.as_deref())
            .unwrap_or(UNKNOWN_MODEL);
        buckets
            .entry(key.to_string())
            .or_default()
            .record(entry.sentiment);
    }
    buckets
}

/// 统计时间范围内每个模型的正面 / 中性 / 负面数量
pub async fn aggregate_feedback_by_model(
    query: &AggregateQuery,
) -> Result<BTreeMap<String, ModelTally>> {
    let mut q = FeedbackQuery::new().with_limit(query.window);
    q.since = query.since;
    q.until = query.until;
    q.store_path = query.store_path.clone();
    let entries = query_feedback(&q).await?;
    Ok(tally_by_model(&entries))
}

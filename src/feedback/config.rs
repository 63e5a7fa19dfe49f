//! 反馈采集配置（全局或按 Agent）

use super::query::{DEFAULT_AGGREGATE_WINDOW, DEFAULT_QUERY_LIMIT};
use super::store::DEFAULT_MAX_BYTES;
use super::types::Sentiment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 反馈采集配置
///
/// ```yaml
/// feedback:
///   enabled: true
///   storePath: ~/.openclaw/feedback/log.jsonl
///   maxBytes: 5000000
///   reactionMap:
///     "🤔": -1
///     shipit: 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackConfig {
    /// 是否记录反馈，默认开启
    pub enabled: bool,
    /// 自定义日志路径，默认 `~/.openclaw/feedback/log.jsonl`
    pub store_path: Option<PathBuf>,
    /// 日志大小告警阈值（字节），只告警不轮转
    pub max_bytes: u64,
    /// 反应 → 情感的覆盖表，叠加在默认映射之上
    pub reaction_map: HashMap<String, Sentiment>,
    /// 查询默认条数上限
    pub query_limit: usize,
    /// 聚合时扫描的最大条数
    pub aggregate_window: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_path: None,
            max_bytes: DEFAULT_MAX_BYTES,
            reaction_map: HashMap::new(),
            query_limit: DEFAULT_QUERY_LIMIT,
            aggregate_window: DEFAULT_AGGREGATE_WINDOW,
        }
    }
}

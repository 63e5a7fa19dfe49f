//! 面向采集方的封装
//!
//! 反应处理器、评分流程等生产者只需要持有一个 [`FeedbackRecorder`]：
//! 它负责套用 [`FeedbackConfig`]（开关、路径、覆盖映射、大小阈值），
//! 再把记录交给 [`FeedbackStore`]。

use super::config::FeedbackConfig;
use super::query::{
    AggregateQuery, FeedbackQuery, ModelTally, aggregate_feedback_by_model, query_feedback,
};
use super::reaction::resolve_reaction_sentiment;
use super::store::{AppendOptions, FeedbackStore, global_store};
use super::types::{FeedbackEntry, Sentiment};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct FeedbackRecorder {
    config: FeedbackConfig,
    store: Arc<FeedbackStore>,
}

impl FeedbackRecorder {
    pub fn new(config: FeedbackConfig, store: Arc<FeedbackStore>) -> Self {
        Self { config, store }
    }

    /// 使用进程级默认 Store
    pub fn with_global_store(config: FeedbackConfig) -> Self {
        Self::new(config, global_store())
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 按配置里的覆盖表解析反应
    pub fn resolve(&self, emoji: &str) -> Sentiment {
        resolve_reaction_sentiment(emoji, Some(&self.config.reaction_map))
    }

    /// 生成一条 reaction 记录（尚未写入），调用方可继续补充上下文
    pub fn reaction(&self, emoji: &str) -> FeedbackEntry {
        FeedbackEntry::reaction(emoji, self.resolve(emoji))
    }

    /// 写入一条记录；关闭采集时直接忽略
    pub async fn record(&self, entry: FeedbackEntry) {
        if !self.config.enabled {
            debug!(kind = %entry.kind, "反馈采集已关闭，忽略");
            return;
        }
        let options = AppendOptions {
            store_path: self.config.store_path.clone(),
            max_bytes: Some(self.config.max_bytes),
        };
        self.store.append(entry, options).await
    }

    /// 以配置的路径和条数上限为基础的查询条件
    pub fn new_query(&self) -> FeedbackQuery {
        FeedbackQuery {
            limit: self.config.query_limit,
            store_path: self.config.store_path.clone(),
            ..FeedbackQuery::default()
        }
    }

    pub async fn query(&self, mut query: FeedbackQuery) -> Result<Vec<FeedbackEntry>> {
        if query.store_path.is_none() {
            query.store_path = self.config.store_path.clone();
        }
        query_feedback(&query).await
    }

    pub async fn aggregate(
        &self,
        since: Option<u64>,
        until: Option<u64>,
    ) -> Result<BTreeMap<String, ModelTally>> {
        let query = AggregateQuery {
            since,
            until,
            window: self.config.aggregate_window,
            store_path: self.config.store_path.clone(),
        };
        aggregate_feedback_by_model(&query).await
    }
}

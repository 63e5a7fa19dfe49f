//! 反馈数据模型
//!
//! 每条 [`FeedbackEntry`] 在写入时就捕获了分桶、过滤、趋势分析所需的全部字段
//! （模型、Provider、渠道……），查询时不需要再去关联会话或对话记录。

use crate::error::FeedbackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

// ── Sentiment ─────────────────────────────────────────────────────────────────

/// 情感分值：-1 = 负面，0 = 中性，+1 = 正面
///
/// 线上格式为整数，超出 {-1, 0, 1} 的值反序列化失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Sentiment {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_i64(self) -> i64 {
        match self {
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
            Sentiment::Positive => 1,
        }
    }
}

impl TryFrom<i64> for Sentiment {
    type Error = FeedbackError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Sentiment::Negative),
            0 => Ok(Sentiment::Neutral),
            1 => Ok(Sentiment::Positive),
            other => Err(FeedbackError::InvalidSentiment(other)),
        }
    }
}

impl From<Sentiment> for i64 {
    fn from(s: Sentiment) -> Self {
        s.as_i64()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "+1"),
            other => write!(f, "{}", other.as_i64()),
        }
    }
}

/// 接受 `-1` / `0` / `1` / `+1` 以及 `negative` / `neutral` / `positive`
impl FromStr for Sentiment {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "negative" | "neg" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" | "pos" => Ok(Sentiment::Positive),
            other => {
                let n: i64 = other.parse().map_err(|_| {
                    FeedbackError::InvalidValue(format!("无法解析 sentiment: {s}"))
                })?;
                Sentiment::try_from(n)
            }
        }
    }
}

// ── FeedbackKind ──────────────────────────────────────────────────────────────

/// 反馈来源分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    /// 机器人消息上的 emoji 反应（Discord / Slack 等）
    Reaction,
    /// 站会或周报回复中的结构化评分
    Grade,
    /// 运营者的自由文本反馈
    Comment,
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackKind::Reaction => "reaction",
            FeedbackKind::Grade => "grade",
            FeedbackKind::Comment => "comment",
        };
        f.write_str(s)
    }
}

impl FromStr for FeedbackKind {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reaction" => Ok(FeedbackKind::Reaction),
            "grade" => Ok(FeedbackKind::Grade),
            "comment" => Ok(FeedbackKind::Comment),
            _ => Err(FeedbackError::InvalidValue(format!("未知的反馈类型: {s}"))),
        }
    }
}

// ── FeedbackEntry ─────────────────────────────────────────────────────────────

/// JSONL 日志中的一条反馈记录，写入后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    /// 记录时间（Unix 毫秒）
    pub ts: u64,
    pub kind: FeedbackKind,
    pub sentiment: Sentiment,

    // -- 来源上下文 --
    /// 原始 emoji（reaction 类反馈）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// 被反应 / 被评分的消息 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// 渠道类型（"discord"、"telegram"、"slack"……）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// 渠道内的具体会话面（频道 ID、群组 ID）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    // -- 反馈人 --
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 展示名（如 "peter#1234"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_tag: Option<String>,

    // -- 模型上下文（写入时快照） --
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// 模型 ID（如 "deepseek-chat"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider ID（如 "deepseek"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// "provider/model" 组合标签（如 "deepseek/deepseek-chat"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_label: Option<String>,

    // -- 结构化评分 --
    /// 评分维度（"work"、"attitude"、"communication"……）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 等级或分数（"A"、"B+"、"3/5"……）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    // -- 采集方式 --
    /// 如 "discord-reaction"、"standup"、"weekly-report"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FeedbackEntry {
    /// 以当前时间创建一条只有必填字段的记录
    pub fn new(kind: FeedbackKind, sentiment: Sentiment) -> Self {
        Self {
            ts: now_millis(),
            kind,
            sentiment,
            emoji: None,
            message_id: None,
            channel: None,
            channel_id: None,
            account_id: None,
            guild_id: None,
            user_id: None,
            user_tag: None,
            session_key: None,
            model: None,
            provider: None,
            model_label: None,
            category: None,
            grade: None,
            note: None,
            source: None,
        }
    }

    /// emoji 反应；sentiment 由调用方（通常是 [`resolve_reaction_sentiment`](super::resolve_reaction_sentiment)）给出
    pub fn reaction(emoji: impl Into<String>, sentiment: Sentiment) -> Self {
        let mut entry = Self::new(FeedbackKind::Reaction, sentiment);
        entry.emoji = Some(emoji.into());
        entry
    }

    pub fn grade(
        category: impl Into<String>,
        grade: impl Into<String>,
        sentiment: Sentiment,
    ) -> Self {
        Self::new(FeedbackKind::Grade, sentiment).with_grade(category, grade)
    }

    pub fn comment(note: impl Into<String>, sentiment: Sentiment) -> Self {
        Self::new(FeedbackKind::Comment, sentiment).with_note(note)
    }

    pub fn with_timestamp(mut self, ts: u64) -> Self {
        self.ts = ts;
        self
    }

    pub fn with_message(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>, channel_id: Option<String>) -> Self {
        self.channel = Some(channel.into());
        self.channel_id = channel_id;
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>, user_tag: Option<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.user_tag = user_tag;
        self
    }

    pub fn with_session(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    /// 同时写入 `provider`、`model` 以及 `"provider/model"` 标签
    pub fn with_model(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        let provider = provider.into();
        let model = model.into();
        self.model_label = Some(format!("{provider}/{model}"));
        self.provider = Some(provider);
        self.model = Some(model);
        self
    }

    /// 只有标签、没有拆分的 provider / model 时使用
    pub fn with_model_label(mut self, label: impl Into<String>) -> Self {
        self.model_label = Some(label.into());
        self
    }

    pub fn with_grade(mut self, category: impl Into<String>, grade: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self.grade = Some(grade.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_wire_format() {
        let entry = FeedbackEntry::reaction("👍", Sentiment::Positive).with_timestamp(42);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["sentiment"], 1);
        assert_eq!(json["kind"], "reaction");
        assert_eq!(json["ts"], 42);
        // 未设置的可选字段不落盘
        assert!(json.get("modelLabel").is_none());
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_out_of_range_sentiment_rejected() {
        let raw = r#"{"ts":1,"kind":"grade","sentiment":2}"#;
        assert!(serde_json::from_str::<FeedbackEntry>(raw).is_err());

        let raw = r#"{"ts":1,"kind":"grade","sentiment":-1}"#;
        let entry: FeedbackEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_camel_case_keys() {
        let entry = FeedbackEntry::grade("work", "B+", Sentiment::Neutral)
            .with_model("deepseek", "deepseek-chat")
            .with_user("u1", Some("peter#1234".to_string()))
            .with_message("m-9");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["modelLabel"], "deepseek/deepseek-chat");
        assert_eq!(json["userTag"], "peter#1234");
        assert_eq!(json["messageId"], "m-9");
        assert_eq!(json["category"], "work");
    }

    #[test]
    fn test_sentiment_from_str() {
        assert_eq!("+1".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!("-1".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert_eq!("neutral".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
        assert!("5".parse::<Sentiment>().is_err());
        assert!(matches!(
            "meh".parse::<Sentiment>(),
            Err(FeedbackError::InvalidValue(_))
        ));
        // 数字合法但超出范围时仍是 InvalidSentiment
        assert!(matches!(
            "5".parse::<Sentiment>(),
            Err(FeedbackError::InvalidSentiment(5))
        ));
        assert!(matches!(
            "vote".parse::<FeedbackKind>(),
            Err(FeedbackError::InvalidValue(_))
        ));
        assert_eq!("Grade".parse::<FeedbackKind>().unwrap(), FeedbackKind::Grade);
    }
}

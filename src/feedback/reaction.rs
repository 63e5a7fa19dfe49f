//! emoji 反应 → 情感分值映射
//!
//! 默认映射：
//!
//! | 反应 | 分值 |
//! |------|------|
//! | 👎 / thumbsdown / ❌ / 😕 … | -1 |
//! | 其它 / 无反应 | 0 |
//! | 👍 / thumbsup / 🔥 / ❤️ / ⭐ / 🎉 / 💯 … | +1 |
//!
//! 不在表中的反应按中性（0）记录，作为参考信号。

use super::types::Sentiment;
use std::collections::HashMap;
use std::sync::LazyLock;

/// 变体选择符（VS15 / VS16），同一 emoji 在不同平台上可能带或不带
const VARIATION_SELECTORS: [char; 2] = ['\u{FE0E}', '\u{FE0F}'];

/// 内置映射表，key 已是清洗后的形式（不含变体选择符）
static DEFAULT_REACTION_MAP: LazyLock<HashMap<&'static str, Sentiment>> = LazyLock::new(|| {
    use Sentiment::{Negative, Positive};
    HashMap::from([
        // 正面
        ("👍", Positive),
        ("👍🏻", Positive),
        ("👍🏼", Positive),
        ("👍🏽", Positive),
        ("👍🏾", Positive),
        ("👍🏿", Positive),
        ("thumbsup", Positive),
        ("+1", Positive),
        ("🔥", Positive),
        ("fire", Positive),
        ("\u{2764}", Positive), // ❤️ 去掉 VS16 之后
        ("heart", Positive),
        ("⭐", Positive),
        ("star", Positive),
        ("🎉", Positive),
        ("tada", Positive),
        ("💯", Positive),
        ("100", Positive),
        // 负面
        ("👎", Negative),
        ("👎🏻", Negative),
        ("👎🏼", Negative),
        ("👎🏽", Negative),
        ("👎🏾", Negative),
        ("👎🏿", Negative),
        ("thumbsdown", Negative),
        ("-1", Negative),
        ("❌", Negative),
        ("x", Negative),
        ("😕", Negative),
        ("confused", Negative),
    ])
});

/// 解析某个反应的情感分值
///
/// `emoji` 可以是 unicode emoji，也可以是 Discord 等平台的文本别名（如 `thumbsup`）。
/// 查找顺序：覆盖表 → 默认表，先按原样匹配，再按小写匹配；都未命中返回中性。
pub fn resolve_reaction_sentiment(
    emoji: &str,
    overrides: Option<&HashMap<String, Sentiment>>,
) -> Sentiment {
    let cleaned = clean_token(emoji);
    if let Some(s) = lookup(&cleaned, overrides) {
        return s;
    }
    // 自定义 emoji 名大小写不统一
    let lower = cleaned.to_lowercase();
    lookup(&lower, overrides).unwrap_or(Sentiment::Neutral)
}

fn lookup(token: &str, overrides: Option<&HashMap<String, Sentiment>>) -> Option<Sentiment> {
    overrides
        .and_then(|o| o.get(token).copied())
        .or_else(|| DEFAULT_REACTION_MAP.get(token).copied())
}

fn clean_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| !VARIATION_SELECTORS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_positive_tokens() {
        for token in [
            "👍", "👍🏻", "👍🏼", "👍🏽", "👍🏾", "👍🏿", "thumbsup", "+1", "🔥", "fire", "❤️", "heart",
            "⭐", "star", "🎉", "tada", "💯", "100",
        ] {
            assert_eq!(
                resolve_reaction_sentiment(token, None),
                Sentiment::Positive,
                "{token} 应为正面"
            );
        }
    }

    #[test]
    fn test_default_negative_tokens() {
        for token in [
            "👎", "👎🏻", "👎🏼", "👎🏽", "👎🏾", "👎🏿", "thumbsdown", "-1", "❌", "x", "😕", "confused",
        ] {
            assert_eq!(
                resolve_reaction_sentiment(token, None),
                Sentiment::Negative,
                "{token} 应为负面"
            );
        }
    }

    #[test]
    fn test_unknown_token_is_neutral() {
        assert_eq!(resolve_reaction_sentiment("🤔", None), Sentiment::Neutral);
        assert_eq!(resolve_reaction_sentiment("eyes", None), Sentiment::Neutral);
        assert_eq!(resolve_reaction_sentiment("", None), Sentiment::Neutral);
    }

    #[test]
    fn test_override_wins_over_default() {
        let overrides = HashMap::from([
            ("🤔".to_string(), Sentiment::Negative),
            ("🔥".to_string(), Sentiment::Negative),
        ]);
        assert_eq!(
            resolve_reaction_sentiment("🤔", Some(&overrides)),
            Sentiment::Negative
        );
        assert_eq!(
            resolve_reaction_sentiment("🔥", Some(&overrides)),
            Sentiment::Negative
        );
        // 覆盖表里没有的仍然走默认表
        assert_eq!(
            resolve_reaction_sentiment("👍", Some(&overrides)),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_case_insensitive_fallback() {
        assert_eq!(resolve_reaction_sentiment("ThumbsUp", None), Sentiment::Positive);
        assert_eq!(resolve_reaction_sentiment("CONFUSED", None), Sentiment::Negative);

        let overrides = HashMap::from([("shipit".to_string(), Sentiment::Positive)]);
        assert_eq!(
            resolve_reaction_sentiment("ShipIt", Some(&overrides)),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_variation_selector_and_whitespace_stripped() {
        assert_eq!(resolve_reaction_sentiment("  👍\u{FE0F} ", None), Sentiment::Positive);
        assert_eq!(resolve_reaction_sentiment("\u{2764}\u{FE0E}", None), Sentiment::Positive);
        assert_eq!(resolve_reaction_sentiment(" x ", None), Sentiment::Negative);
    }
}

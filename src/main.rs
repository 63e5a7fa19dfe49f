use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use claw_feedback::config::AppConfig;
use claw_feedback::error::Result;
use claw_feedback::feedback::{
    FeedbackEntry, FeedbackKind, FeedbackRecorder, ModelTally, Sentiment,
};
use claw_feedback::provider::deepseek::DeepSeekPlugin;
use claw_feedback::provider::{ConsolePrompter, PluginRegistry, ProviderAuthMethod};
use std::path::PathBuf;

/// 反馈记录、查询与 Provider 接入工具
#[derive(Parser)]
#[command(name = "claw-feedback", version)]
struct Cli {
    /// YAML 配置文件
    #[arg(long, global = true, env = "CLAW_FEEDBACK_CONFIG")]
    config: Option<PathBuf>,

    /// 覆盖配置里的反馈日志路径
    #[arg(long, global = true, env = "CLAW_FEEDBACK_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 写入一条反馈
    #[command(subcommand)]
    Record(RecordKind),
    /// 按条件查询反馈（新的在前）
    Query(QueryArgs),
    /// 按模型统计正面 / 中性 / 负面数量
    Aggregate {
        /// 起始时间（RFC 3339、YYYY-MM-DD 或 Unix 毫秒）
        #[arg(long, value_parser = parse_time)]
        since: Option<u64>,
        /// 结束时间
        #[arg(long, value_parser = parse_time)]
        until: Option<u64>,
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 解析某个反应对应的情感分值
    Resolve { emoji: String },
    /// 列出已注册的 Provider 和模型
    Providers,
    /// 交互式配置 Provider 凭据
    Onboard {
        #[arg(long, default_value = "deepseek")]
        provider: String,
        #[arg(long, default_value = "api-key")]
        method: String,
    },
}

#[derive(Subcommand)]
enum RecordKind {
    /// emoji 反应
    Reaction {
        emoji: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// 结构化评分
    Grade {
        category: String,
        grade: String,
        #[arg(long, allow_hyphen_values = true)]
        sentiment: Sentiment,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// 自由评论
    Comment {
        note: String,
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        sentiment: Sentiment,
        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(Args)]
struct ContextArgs {
    #[arg(long)]
    channel: Option<String>,
    #[arg(long)]
    channel_id: Option<String>,
    #[arg(long)]
    account: Option<String>,
    #[arg(long)]
    guild: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    user_tag: Option<String>,
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    message: Option<String>,
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// 附加说明（写入 note 字段；评论类反馈追加在正文之后）
    #[arg(long)]
    remark: Option<String>,
    /// 采集方式，如 discord-reaction、weekly-report
    #[arg(long)]
    source: Option<String>,
}

impl ContextArgs {
    fn apply(self, mut entry: FeedbackEntry) -> FeedbackEntry {
        if let Some(channel) = self.channel {
            entry = entry.with_channel(channel, self.channel_id);
        } else {
            entry.channel_id = self.channel_id;
        }
        if let Some(user) = self.user {
            entry = entry.with_user(user, self.user_tag);
        }
        match (self.provider, self.model) {
            (Some(p), Some(m)) => entry = entry.with_model(p, m),
            (p, m) => {
                entry.provider = p;
                entry.model = m;
            }
        }
        entry.account_id = self.account;
        entry.guild_id = self.guild;
        entry.session_key = self.session;
        entry.message_id = self.message;
        if let Some(remark) = self.remark {
            let note = match entry.note.take() {
                Some(body) => format!("{body}\n{remark}"),
                None => remark,
            };
            entry = entry.with_note(note);
        }
        if let Some(source) = self.source {
            entry = entry.with_source(source);
        }
        entry
    }
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long, value_parser = parse_time)]
    since: Option<u64>,
    #[arg(long, value_parser = parse_time)]
    until: Option<u64>,
    #[arg(long)]
    kind: Option<FeedbackKind>,
    #[arg(long, allow_hyphen_values = true)]
    sentiment: Option<Sentiment>,
    /// 如 deepseek/deepseek-chat
    #[arg(long)]
    model_label: Option<String>,
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    channel: Option<String>,
    #[arg(long)]
    source: Option<String>,
    /// 默认取配置里的 queryLimit
    #[arg(long)]
    limit: Option<usize>,
    /// 以 JSON Lines 输出
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "claw_feedback=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if cli.store.is_some() {
        config.feedback.store_path = cli.store;
    }
    let recorder = FeedbackRecorder::with_global_store(config.feedback);

    match cli.command {
        Command::Record(kind) => record(&recorder, kind).await,
        Command::Query(args) => query(&recorder, args).await?,
        Command::Aggregate { since, until, json } => {
            let tallies = recorder.aggregate(since, until).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tallies)?);
            } else {
                print_tallies(&tallies);
            }
        }
        Command::Resolve { emoji } => println!("{}", recorder.resolve(&emoji)),
        Command::Providers => {
            let registry = registry();
            for provider in registry.providers() {
                println!("{} ({}): {}", provider.label, provider.id, provider.models.base_url);
                for m in &provider.models.models {
                    println!(
                        "  {:<20} {:<14} ctx={:<6} max={:<5} ${}/${} per 1M{}",
                        m.id,
                        m.name,
                        m.context_window,
                        m.max_tokens,
                        m.cost.input,
                        m.cost.output,
                        if m.reasoning { "  [reasoning]" } else { "" }
                    );
                }
                for method in &provider.auth {
                    println!("  auth: {}", describe_auth(method.as_ref()));
                }
            }
        }
        Command::Onboard { provider, method } => {
            let registry = registry();
            let result = registry
                .authenticate(&provider, &method, &ConsolePrompter)
                .await?;
            println!();
            for profile in &result.profiles {
                println!("✅ {} → {}", profile.profile_id, profile.credential.masked());
            }
            if let Some(model) = &result.default_model {
                println!("默认模型: {model}");
            }
            println!("配置补丁:\n{}", serde_json::to_string_pretty(&result.config_patch)?);
        }
    }
    Ok(())
}

/// `api-key  DeepSeek API Key (V3 + R1) [api_key]`
fn describe_auth(method: &dyn ProviderAuthMethod) -> String {
    let mut line = format!("{:<10} {}", method.id(), method.label());
    if let Some(hint) = method.hint() {
        line.push_str(&format!(" ({hint})"));
    }
    line.push_str(&format!(" [{}]", method.kind()));
    line
}

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.install(&DeepSeekPlugin);
    registry
}

async fn record(recorder: &FeedbackRecorder, kind: RecordKind) {
    let entry = match kind {
        RecordKind::Reaction { emoji, context } => context.apply(recorder.reaction(&emoji)),
        RecordKind::Grade {
            category,
            grade,
            sentiment,
            context,
        } => context.apply(FeedbackEntry::grade(category, grade, sentiment)),
        RecordKind::Comment {
            note,
            sentiment,
            context,
        } => context.apply(FeedbackEntry::comment(note, sentiment)),
    };
    if !recorder.is_enabled() {
        println!("反馈采集已关闭（feedback.enabled = false），未写入");
        return;
    }
    let summary = format!("{} {}", entry.kind, entry.sentiment);
    recorder.record(entry).await;
    println!("📝 {summary}");
}

async fn query(recorder: &FeedbackRecorder, args: QueryArgs) -> Result<()> {
    let mut q = recorder.new_query();
    q.since = args.since;
    q.until = args.until;
    q.kind = args.kind;
    q.sentiment = args.sentiment;
    q.model_label = args.model_label;
    q.provider = args.provider;
    q.channel = args.channel;
    q.source = args.source;
    if let Some(limit) = args.limit {
        q.limit = limit;
    }

    let entries = recorder.query(q).await?;
    if args.json {
        for e in &entries {
            println!("{}", serde_json::to_string(e)?);
        }
        return Ok(());
    }
    if entries.is_empty() {
        println!("(no data)");
        return Ok(());
    }
    for e in &entries {
        let detail = e
            .emoji
            .clone()
            .or_else(|| {
                e.grade
                    .as_ref()
                    .map(|g| format!("{}={g}", e.category.as_deref().unwrap_or("-")))
            })
            .or_else(|| e.note.clone())
            .unwrap_or_default();
        println!(
            "{}  {:<8} {:>2}  {:<28} {:<10} {:<18} {}",
            format_ts(e.ts),
            e.kind.to_string(),
            e.sentiment.as_i64(),
            e.model_label.as_deref().or(e.model.as_deref()).unwrap_or("-"),
            e.channel.as_deref().unwrap_or("-"),
            e.source.as_deref().unwrap_or("-"),
            detail
        );
    }
    Ok(())
}

fn print_tallies(tallies: &std::collections::BTreeMap<String, ModelTally>) {
    if tallies.is_empty() {
        println!("(no data)");
        return;
    }
    let mut rows: Vec<(&String, &ModelTally)> = tallies.iter().collect();
    rows.sort_by(|a, b| b.1.total.cmp(&a.1.total).then(b.1.net().cmp(&a.1.net())));
    println!("{:<32} {:>6} {:>6} {:>6} {:>6} {:>5}", "model", "+", "0", "-", "total", "net");
    for (label, t) in rows {
        println!(
            "{:<32} {:>6} {:>6} {:>6} {:>6} {:>5}",
            label,
            t.positive,
            t.neutral,
            t.negative,
            t.total,
            t.net()
        );
    }
}

fn format_ts(ts: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts as i64)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// RFC 3339、YYYY-MM-DD（UTC 零点）或 Unix 毫秒
fn parse_time(s: &str) -> std::result::Result<u64, String> {
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return u64::try_from(dt.timestamp_millis()).map_err(|_| format!("时间早于 1970: {s}"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ms = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .ok_or_else(|| format!("无效日期: {s}"))?;
        return u64::try_from(ms).map_err(|_| format!("时间早于 1970: {s}"));
    }
    Err(format!("无法解析时间: {s}（支持 RFC 3339、YYYY-MM-DD 或 Unix 毫秒）"))
}

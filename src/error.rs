use std::fmt;

/// claw-feedback 的统一错误类型
#[derive(Debug)]
pub enum ClawError {
    /// 反馈存储相关错误
    Feedback(FeedbackError),
    /// Provider 插件 / 认证流程错误
    Provider(ProviderError),
    /// 配置错误
    Config(ConfigError),
    /// IO 错误
    Io(std::io::Error),
}

/// 反馈存储相关错误
#[derive(Debug)]
pub enum FeedbackError {
    /// 序列化/反序列化错误
    SerializationError(String),
    /// 创建目录或写文件失败
    IoError(String),
    /// sentiment 取值不在 {-1, 0, 1} 内
    InvalidSentiment(i64),
    /// 无法从文本解析的取值（命令行参数等）
    InvalidValue(String),
    /// 写入队列已关闭
    WriterClosed,
}

/// Provider 插件错误
#[derive(Debug)]
pub enum ProviderError {
    /// 未提供 API Key
    MissingApiKey,
    /// Provider 未注册
    NotFound(String),
    /// 认证方式不存在
    AuthMethodNotFound { provider: String, method: String },
    /// 交互提示失败
    PromptFailed(String),
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
    /// 配置值无效
    InvalidValue { field: String, message: String },
}

impl fmt::Display for ClawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClawError::Feedback(e) => write!(f, "Feedback Error: {}", e),
            ClawError::Provider(e) => write!(f, "Provider Error: {}", e),
            ClawError::Config(e) => write!(f, "Config Error: {}", e),
            ClawError::Io(e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            FeedbackError::IoError(msg) => write!(f, "IO error: {}", msg),
            FeedbackError::InvalidSentiment(v) => {
                write!(f, "Invalid sentiment {} (expected -1, 0 or 1)", v)
            }
            FeedbackError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
            FeedbackError::WriterClosed => write!(f, "Feedback writer is closed"),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::MissingApiKey => write!(f, "No API key provided"),
            ProviderError::NotFound(id) => write!(f, "Provider '{}' not registered", id),
            ProviderError::AuthMethodNotFound { provider, method } => {
                write!(f, "Provider '{}' has no auth method '{}'", provider, method)
            }
            ProviderError::PromptFailed(msg) => write!(f, "Prompt failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid config value for '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ClawError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClawError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for FeedbackError {}
impl std::error::Error for ProviderError {}
impl std::error::Error for ConfigError {}

// From 转换实现
impl From<std::io::Error> for ClawError {
    fn from(err: std::io::Error) -> Self {
        ClawError::Io(err)
    }
}

impl From<serde_json::Error> for ClawError {
    fn from(err: serde_json::Error) -> Self {
        ClawError::Feedback(FeedbackError::SerializationError(err.to_string()))
    }
}

impl From<serde_yaml::Error> for ClawError {
    fn from(err: serde_yaml::Error) -> Self {
        ClawError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<FeedbackError> for ClawError {
    fn from(err: FeedbackError) -> Self {
        ClawError::Feedback(err)
    }
}

impl From<ProviderError> for ClawError {
    fn from(err: ProviderError) -> Self {
        ClawError::Provider(err)
    }
}

impl From<ConfigError> for ClawError {
    fn from(err: ConfigError) -> Self {
        ClawError::Config(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, ClawError>;

use crate::error::{ConfigError, Result};
use crate::feedback::FeedbackConfig;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// 应用配置（YAML）
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: AppConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// 有配置文件就加载，否则使用默认值
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.feedback.aggregate_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feedback.aggregateWindow".to_string(),
                message: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

use std::io::Write as _;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{ProviderError, Result};

/// 校验函数：通过返回 `None`，否则返回提示给用户的错误信息
pub type Validator = fn(&str) -> Option<String>;

/// 一次文本输入请求
#[derive(Debug, Clone)]
pub struct TextPrompt {
    pub message: String,
    pub placeholder: Option<String>,
    pub validate: Option<Validator>,
}

impl TextPrompt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            placeholder: None,
            validate: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_validator(mut self, validate: Validator) -> Self {
        self.validate = Some(validate);
        self
    }

    /// 对输入运行校验
    pub fn check(&self, value: &str) -> Option<String> {
        self.validate.and_then(|v| v(value))
    }
}

/// 认证流程中与用户交互的接口（宿主提供具体 UI）
#[async_trait]
pub trait Prompter: Send + Sync {
    /// 请求一段文本；用户取消或输入流结束时返回 `None`
    async fn text(&self, prompt: TextPrompt) -> Result<Option<String>>;

    /// 展示一段说明
    async fn note(&self, message: &str, title: Option<&str>) -> Result<()>;
}

/// 基于命令行 stdin 的 Prompter（异步，不阻塞 tokio 工作线程）。
pub struct ConsolePrompter;

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn text(&self, prompt: TextPrompt) -> Result<Option<String>> {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        loop {
            println!("\n{}", prompt.message);
            match &prompt.placeholder {
                Some(p) => print!("({p}) > "),
                None => print!("> "),
            }
            let _ = std::io::stdout().flush();

            let mut buf = String::new();
            let read = reader
                .read_line(&mut buf)
                .await
                .map_err(|e| ProviderError::PromptFailed(e.to_string()))?;
            if read == 0 {
                return Ok(None);
            }
            let input = buf.trim().to_string();
            match prompt.check(&input) {
                Some(err) => println!("⚠️  {err}"),
                None => return Ok(Some(input)),
            }
        }
    }

    async fn note(&self, message: &str, title: Option<&str>) -> Result<()> {
        if let Some(title) = title {
            println!("\n── {title} ──");
        }
        println!("{message}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_spaces(v: &str) -> Option<String> {
        v.contains(' ').then(|| "must not contain spaces".to_string())
    }

    #[test]
    fn test_text_prompt_validator() {
        let prompt = TextPrompt::new("Enter key")
            .with_placeholder("sk-...")
            .with_validator(no_spaces);
        assert_eq!(prompt.placeholder.as_deref(), Some("sk-..."));
        assert!(prompt.check("sk-1").is_none());
        assert_eq!(prompt.check("a b").as_deref(), Some("must not contain spaces"));

        // 未设置校验时一律通过
        assert!(TextPrompt::new("anything").check("").is_none());
    }
}

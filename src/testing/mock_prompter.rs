//! Mock Prompter，用于在没有终端交互的情况下测试认证流程。
//!
//! # 示例
//!
//! ```rust
//! use claw_feedback::testing::MockPrompter;
//! use claw_feedback::provider::{Prompter, TextPrompt};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let prompter = MockPrompter::new().with_answer("sk-123");
//!
//! let key = prompter.text(TextPrompt::new("Enter key")).await.unwrap();
//! assert_eq!(key.as_deref(), Some("sk-123"));
//! assert_eq!(prompter.prompts(), vec!["Enter key".to_string()]);
//! # }
//! ```

use crate::error::Result;
use crate::provider::{Prompter, TextPrompt};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 可脚本化的 Prompter。
///
/// 按顺序返回预设答案；`None` 表示用户取消。队列耗尽后同样返回 `None`。
/// 与真实终端不同，这里不会因为校验失败而重复提问，答案原样返回。
pub struct MockPrompter {
    answers: Arc<Mutex<VecDeque<Option<String>>>>,
    /// 每次 `text` 调用的提示语
    prompts: Arc<Mutex<Vec<String>>>,
    /// 每次 `note` 调用的 (title, message)
    notes: Arc<Mutex<Vec<(Option<String>, String)>>>,
}

impl Default for MockPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPrompter {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            notes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 追加一条用户输入
    pub fn with_answer(self, text: impl Into<String>) -> Self {
        self.answers.lock().unwrap().push_back(Some(text.into()));
        self
    }

    /// 追加一次取消（Ctrl-D / 关闭输入）
    pub fn with_cancel(self) -> Self {
        self.answers.lock().unwrap().push_back(None);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn notes(&self) -> Vec<(Option<String>, String)> {
        self.notes.lock().unwrap().clone()
    }

    /// 剩余未消费的答案数量
    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

#[async_trait]
impl Prompter for MockPrompter {
    async fn text(&self, prompt: TextPrompt) -> Result<Option<String>> {
        self.prompts.lock().unwrap().push(prompt.message);
        Ok(self.answers.lock().unwrap().pop_front().flatten())
    }

    async fn note(&self, message: &str, title: Option<&str>) -> Result<()> {
        self.notes
            .lock()
            .unwrap()
            .push((title.map(String::from), message.to_string()));
        Ok(())
    }
}

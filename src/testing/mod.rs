//! 测试基础设施
//!
//! 提供在不依赖终端交互 / 宿主平台的情况下测试各组件的工具。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`MockPrompter`] | 替代真实终端，用于测试 Provider 的认证流程 |
//!
//! - **可脚本化**：通过 `with_answer()` / `with_cancel()` 控制用户输入
//! - **可观测**：通过 `prompts()` / `notes()` 检查交互过程
//! - **线程安全**：内部使用 `Arc<Mutex<_>>`

mod mock_prompter;

pub use mock_prompter::MockPrompter;

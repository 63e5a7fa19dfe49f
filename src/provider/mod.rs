//! Provider 插件
//!
//! 插件通过 [`PluginApi::register_provider`] 向宿主登记一个 LLM 服务：
//! 模型目录（价格、上下文窗口、能力）以及交互式的认证流程。
//! 宿主合并认证结果里的 `config_patch`，本 crate 不负责合并。
//!
//! | 类型 | 作用 |
//! |------|------|
//! | [`Plugin`] | 插件入口，`register` 时登记 Provider |
//! | [`PluginApi`] | 宿主侧的登记接口 |
//! | [`PluginRegistry`] | `PluginApi` 的进程内实现，供 CLI 和测试使用 |
//! | [`ProviderAuthMethod`] | 认证流程，返回凭据与配置补丁 |
//! | [`Prompter`] | 认证时的用户交互 |

pub mod deepseek;
pub mod prompter;

pub use prompter::{ConsolePrompter, Prompter, TextPrompt, Validator};

use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

// ── 模型目录 ──────────────────────────────────────────────────────────────────

/// 模型支持的输入模态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelInput {
    Text,
    Image,
}

/// 每百万 token 的美元价格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCost {
    pub input: f64,
    pub output: f64,
    pub cache_read: f64,
    pub cache_write: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    /// API 中使用的模型 ID
    pub id: String,
    /// 展示名
    pub name: String,
    /// 是否为推理模型
    pub reasoning: bool,
    pub input: Vec<ModelInput>,
    pub cost: ModelCost,
    pub context_window: u32,
    pub max_tokens: u32,
}

/// Provider 的接口地址、API 协议族和模型列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderModels {
    pub base_url: String,
    /// 如 "openai-completions"
    pub api: String,
    pub models: Vec<ModelDefinition>,
}

// ── 认证 ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    ApiKey,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthKind::ApiKey => f.write_str("api_key"),
        }
    }
}

/// 认证得到的凭据
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    ApiKey {
        provider: String,
        #[serde(rename = "apiKey")]
        api_key: String,
    },
}

impl Credential {
    /// 用于日志/展示的脱敏形式
    pub fn masked(&self) -> String {
        match self {
            Credential::ApiKey { provider, api_key } => {
                format!("{provider}: {}", mask_secret(api_key))
            }
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

/// 只保留末 4 位
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProfile {
    /// 如 "deepseek:default"
    pub profile_id: String,
    pub credential: Credential,
}

/// 认证流程的产出：凭据 + 交给宿主合并的配置补丁
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAuthResult {
    pub profiles: Vec<AuthProfile>,
    pub config_patch: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// 认证流程运行时的上下文
pub struct ProviderAuthContext<'a> {
    pub prompter: &'a dyn Prompter,
}

/// 一种认证方式（API Key、OAuth……）
#[async_trait]
pub trait ProviderAuthMethod: Send + Sync {
    fn id(&self) -> &str;

    fn label(&self) -> &str;

    /// 选择认证方式时显示的简短提示
    fn hint(&self) -> Option<&str> {
        None
    }

    fn kind(&self) -> AuthKind;

    /// 执行认证；失败时不返回任何部分凭据
    async fn run(&self, ctx: &ProviderAuthContext<'_>) -> Result<ProviderAuthResult>;
}

// ── Provider 描述 ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ProviderDescriptor {
    pub id: String,
    pub label: String,
    pub docs_path: Option<String>,
    pub aliases: Vec<String>,
    /// 声明读取 API Key 的环境变量名（由宿主读取）
    pub env_vars: Vec<String>,
    pub models: ProviderModels,
    pub auth: Vec<Arc<dyn ProviderAuthMethod>>,
}

impl ProviderDescriptor {
    pub fn auth_method(&self, id: &str) -> Option<Arc<dyn ProviderAuthMethod>> {
        self.auth.iter().find(|m| m.id() == id).cloned()
    }

    pub fn model(&self, id: &str) -> Option<&ModelDefinition> {
        self.models.models.iter().find(|m| m.id == id)
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("models", &self.models.models.len())
            .field(
                "auth",
                &self.auth.iter().map(|m| m.id().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ── 插件 ──────────────────────────────────────────────────────────────────────

/// 宿主暴露给插件的登记接口
pub trait PluginApi {
    fn register_provider(&mut self, provider: ProviderDescriptor);
}

/// 插件入口
pub trait Plugin: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 插件配置的 JSON Schema，默认不接受任何配置项
    fn config_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {}
        })
    }

    fn register(&self, api: &mut dyn PluginApi);
}

/// 已安装插件的元数据快照
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// 该插件登记的 Provider ID
    pub providers: Vec<String>,
}

/// 进程内的插件注册表
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginInfo>,
    providers: HashMap<String, ProviderDescriptor>,
    /// 本轮 `install` 期间登记的 Provider
    pending: Vec<String>,
}

impl PluginApi for PluginRegistry {
    fn register_provider(&mut self, provider: ProviderDescriptor) {
        info!(
            provider = %provider.id,
            models = provider.models.models.len(),
            "🔌 注册 Provider"
        );
        self.pending.push(provider.id.clone());
        self.providers.insert(provider.id.clone(), provider);
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 安装插件并记录它登记的 Provider
    pub fn install(&mut self, plugin: &dyn Plugin) {
        self.pending.clear();
        plugin.register(self);
        let providers = std::mem::take(&mut self.pending);
        self.plugins.push(PluginInfo {
            id: plugin.id().to_string(),
            name: plugin.name().to_string(),
            description: plugin.description().to_string(),
            providers,
        });
    }

    pub fn plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }

    /// 按 ID 或别名查找
    pub fn provider(&self, id_or_alias: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(id_or_alias).or_else(|| {
            self.providers
                .values()
                .find(|p| p.aliases.iter().any(|a| a == id_or_alias))
        })
    }

    pub fn providers(&self) -> Vec<&ProviderDescriptor> {
        let mut list: Vec<&ProviderDescriptor> = self.providers.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn auth_method(&self, provider: &str, method: &str) -> Result<Arc<dyn ProviderAuthMethod>> {
        let descriptor = self
            .provider(provider)
            .ok_or_else(|| ProviderError::NotFound(provider.to_string()))?;
        descriptor.auth_method(method).ok_or_else(|| {
            ProviderError::AuthMethodNotFound {
                provider: descriptor.id.clone(),
                method: method.to_string(),
            }
            .into()
        })
    }

    /// 运行某个 Provider 的认证流程
    pub async fn authenticate(
        &self,
        provider: &str,
        method: &str,
        prompter: &dyn Prompter,
    ) -> Result<ProviderAuthResult> {
        let auth = self.auth_method(provider, method)?;
        let ctx = ProviderAuthContext { prompter };
        let result = auth.run(&ctx).await?;
        info!(
            provider = %provider,
            method = %method,
            profiles = result.profiles.len(),
            "🔑 认证完成"
        );
        Ok(result)
    }
}

//! DeepSeek Provider 插件（DeepSeek V3 / R1，API Key 认证）

use super::{
    AuthKind, AuthProfile, Credential, ModelCost, ModelDefinition, ModelInput, Plugin, PluginApi,
    ProviderAuthContext, ProviderAuthMethod, ProviderAuthResult, ProviderDescriptor,
    ProviderModels, TextPrompt,
};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const PROVIDER_ID: &str = "deepseek";
pub const PROVIDER_LABEL: &str = "DeepSeek";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";
pub const BASE_URL: &str = "https://api.deepseek.com/v1";
pub const API_FAMILY: &str = "openai-completions";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

const NOTES: [&str; 2] = [
    "DeepSeek provides DeepSeek V3 and DeepSeek R1 models.",
    "Get your API key at: https://platform.deepseek.com/api_keys",
];

/// DeepSeek 模型目录
pub fn models() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition {
            id: "deepseek-chat".to_string(),
            name: "DeepSeek V3".to_string(),
            reasoning: false,
            input: vec![ModelInput::Text],
            cost: ModelCost {
                input: 0.27,
                output: 1.1,
                cache_read: 0.07,
                cache_write: 0.27,
            },
            context_window: 65_536,
            max_tokens: 8_192,
        },
        ModelDefinition {
            id: "deepseek-reasoner".to_string(),
            name: "DeepSeek R1".to_string(),
            reasoning: true,
            input: vec![ModelInput::Text],
            cost: ModelCost {
                input: 0.55,
                output: 2.19,
                cache_read: 0.14,
                cache_write: 0.55,
            },
            context_window: 65_536,
            max_tokens: 8_192,
        },
    ]
}

fn provider_models() -> ProviderModels {
    ProviderModels {
        base_url: BASE_URL.to_string(),
        api: API_FAMILY.to_string(),
        models: models(),
    }
}

pub struct DeepSeekPlugin;

impl Plugin for DeepSeekPlugin {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn name(&self) -> &str {
        PROVIDER_LABEL
    }

    fn description(&self) -> &str {
        "DeepSeek V3 and R1 models via API key"
    }

    fn register(&self, api: &mut dyn PluginApi) {
        api.register_provider(ProviderDescriptor {
            id: PROVIDER_ID.to_string(),
            label: PROVIDER_LABEL.to_string(),
            docs_path: Some("/providers/deepseek".to_string()),
            aliases: vec!["deepseek".to_string()],
            env_vars: vec![API_KEY_ENV.to_string()],
            models: provider_models(),
            auth: vec![Arc::new(DeepSeekApiKeyAuth)],
        });
    }
}

/// 交互式输入 API Key
pub struct DeepSeekApiKeyAuth;

fn require_non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some("API key is required".to_string())
    } else {
        None
    }
}

#[async_trait]
impl ProviderAuthMethod for DeepSeekApiKeyAuth {
    fn id(&self) -> &str {
        "api-key"
    }

    fn label(&self) -> &str {
        "DeepSeek API Key"
    }

    fn hint(&self) -> Option<&str> {
        Some("V3 + R1")
    }

    fn kind(&self) -> AuthKind {
        AuthKind::ApiKey
    }

    async fn run(&self, ctx: &ProviderAuthContext<'_>) -> Result<ProviderAuthResult> {
        let key = ctx
            .prompter
            .text(TextPrompt::new("Enter DeepSeek API key").with_validator(require_non_empty))
            .await?
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        ctx.prompter
            .note(&NOTES.join("\n"), Some(PROVIDER_LABEL))
            .await?;

        let provider_models = provider_models();
        let config_patch = json!({
            "agents": {
                "defaults": {
                    "models": {
                        (DEFAULT_MODEL): { "alias": PROVIDER_LABEL }
                    }
                }
            },
            "models": {
                "providers": {
                    (PROVIDER_ID): provider_models
                }
            }
        });

        Ok(ProviderAuthResult {
            profiles: vec![AuthProfile {
                profile_id: format!("{PROVIDER_ID}:default"),
                credential: Credential::ApiKey {
                    provider: PROVIDER_ID.to_string(),
                    api_key: key,
                },
            }],
            config_patch,
            default_model: Some(DEFAULT_MODEL.to_string()),
            notes: NOTES.iter().map(|n| n.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClawError;
    use crate::provider::PluginRegistry;
    use crate::testing::MockPrompter;

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.install(&DeepSeekPlugin);
        registry
    }

    #[test]
    fn test_register_descriptor() {
        let registry = registry();
        let provider = registry.provider("deepseek").expect("deepseek 应已注册");

        assert_eq!(provider.label, "DeepSeek");
        assert_eq!(provider.models.base_url, "https://api.deepseek.com/v1");
        assert_eq!(provider.models.api, "openai-completions");
        assert_eq!(provider.env_vars, vec!["DEEPSEEK_API_KEY".to_string()]);
        assert_eq!(provider.models.models.len(), 2);

        let chat = provider.model("deepseek-chat").unwrap();
        assert!(!chat.reasoning);
        assert_eq!(chat.cost.output, 1.1);
        let r1 = provider.model("deepseek-reasoner").unwrap();
        assert!(r1.reasoning);
        assert_eq!(r1.context_window, 65_536);
        assert_eq!(r1.max_tokens, 8_192);
        assert_eq!(r1.input, vec![ModelInput::Text]);

        let info = &registry.plugins()[0];
        assert_eq!(info.id, "deepseek");
        assert_eq!(info.providers, vec!["deepseek".to_string()]);
    }

    #[tokio::test]
    async fn test_api_key_flow() {
        let registry = registry();
        let prompter = MockPrompter::new().with_answer("  sk-test-123  ");

        let result = registry
            .authenticate("deepseek", "api-key", &prompter)
            .await
            .unwrap();

        assert_eq!(result.profiles.len(), 1);
        assert_eq!(result.profiles[0].profile_id, "deepseek:default");
        assert_eq!(
            result.profiles[0].credential,
            Credential::ApiKey {
                provider: "deepseek".to_string(),
                api_key: "sk-test-123".to_string(),
            }
        );
        assert_eq!(result.default_model.as_deref(), Some("deepseek/deepseek-chat"));
        assert_eq!(
            result.config_patch["agents"]["defaults"]["models"]["deepseek/deepseek-chat"]["alias"],
            "DeepSeek"
        );
        let block = &result.config_patch["models"]["providers"]["deepseek"];
        assert_eq!(block["baseUrl"], "https://api.deepseek.com/v1");
        assert_eq!(block["api"], "openai-completions");
        assert_eq!(block["models"][1]["id"], "deepseek-reasoner");
        assert_eq!(block["models"][0]["contextWindow"], 65_536);

        // 提示与说明都经过了 prompter
        assert_eq!(prompter.prompts(), vec!["Enter DeepSeek API key".to_string()]);
        assert_eq!(prompter.notes().len(), 1);
        assert_eq!(result.notes.len(), 2);
        assert_eq!(prompter.remaining(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let registry = registry();

        let prompters = [
            MockPrompter::new().with_cancel(),
            MockPrompter::new().with_answer("   "),
        ];
        for prompter in prompters {
            match registry.authenticate("deepseek", "api-key", &prompter).await {
                Err(ClawError::Provider(ProviderError::MissingApiKey)) => {}
                other => panic!("缺少 API Key 应直接失败: {other:?}"),
            }
            // 失败时不应展示后续说明
            assert!(prompter.notes().is_empty());
        }
    }

    #[test]
    fn test_validator() {
        assert!(require_non_empty("").is_some());
        assert!(require_non_empty("  ").is_some());
        assert!(require_non_empty("sk-1").is_none());
    }
}

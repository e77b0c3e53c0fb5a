use serde::{Deserialize, Serialize};

use crate::error::{Result, VidnexusError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Groq,
    Openai,
    Grok,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Groq => ProviderConfig {
                api_url: "https://api.groq.com/openai/v1/chat/completions",
                model: "openai/gpt-oss-120b",
                env_var: "GROQ_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-3-pro",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let env_var = self.config().env_var;
        match std::env::var(env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(VidnexusError::MissingApiKey {
                env_var: env_var.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groq_is_the_default_provider() {
        let provider = Provider::default();
        assert_eq!(provider, Provider::Groq);
        assert_eq!(provider.config().model, "openai/gpt-oss-120b");
    }

    #[test]
    fn provider_names_parse_from_lowercase() {
        let provider: Provider = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(provider, Provider::Gemini);
    }
}

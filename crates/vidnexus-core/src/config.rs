//! Optional TOML settings file.
//!
//! Every field is optional. Command-line values are merged on top with
//! [`Settings::merge`], and anything still unset falls back to the defaults
//! of [`AgentConfig`] and [`PipelineConfig`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::{
    error::Result,
    model::AgentConfig,
    pipeline::PipelineConfig,
    provider::Provider,
    retry::RetryPolicy,
    source::DEFAULT_CAPTION_LANG,
};

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub instructions: Option<String>,
    pub temperature: Option<f32>,
    pub markdown: Option<bool>,
    pub max_words: Option<usize>,
    pub batch_size: Option<usize>,
    pub delay_secs: Option<f64>,
    pub max_retries: Option<u32>,
    pub caption_lang: Option<String>,
}

impl Settings {
    /// `<config dir>/vidnexus/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vidnexus").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path`, or the default location if it exists. A missing default file is not an error.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        debug!(path = %path.display(), "loading settings");
        let content = fs::read_to_string(&path).await?;
        Self::from_toml(&content)
    }

    /// Values set in `overrides` win.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            provider: overrides.provider.or(self.provider),
            model: overrides.model.or(self.model),
            instructions: overrides.instructions.or(self.instructions),
            temperature: overrides.temperature.or(self.temperature),
            markdown: overrides.markdown.or(self.markdown),
            max_words: overrides.max_words.or(self.max_words),
            batch_size: overrides.batch_size.or(self.batch_size),
            delay_secs: overrides.delay_secs.or(self.delay_secs),
            max_retries: overrides.max_retries.or(self.max_retries),
            caption_lang: overrides.caption_lang.or(self.caption_lang),
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::for_provider(self.provider.unwrap_or_default());
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(instructions) = &self.instructions {
            config.instructions = instructions.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(markdown) = self.markdown {
            config.markdown = markdown;
        }
        config
    }

    /// Builds and validates the pipeline parameters.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();
        let mut config = defaults
            .with_max_words(self.max_words.unwrap_or(defaults.max_words))
            .with_batch_size(self.batch_size.unwrap_or(defaults.batch_size))
            .with_retry(RetryPolicy::default().with_max_retries(self.max_retries.unwrap_or(0)));
        if let Some(secs) = self.delay_secs {
            config = config.with_delay_secs(secs)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn caption_lang(&self) -> &str {
        self.caption_lang.as_deref().unwrap_or(DEFAULT_CAPTION_LANG)
    }
}

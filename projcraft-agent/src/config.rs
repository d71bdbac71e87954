//! Pipeline configuration
//!
//! Every field has a default, so an empty TOML file is a valid config.
//!
//! ```toml
//! max_iterations = 3
//! quality_threshold = 80.0
//! min_call_interval_secs = 6
//!
//! [developer]
//! temperature = 0.6
//! max_output_tokens = 4000
//! ```

use projcraft_error::{Error, Result};
use projcraft_runtime::GenerationParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound on how many conversation messages are fed back into prompts
pub const MAX_CONVERSATION_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Iteration budget for the develop/review/test/score loop
    pub max_iterations: u32,
    /// Score at which the loop stops early
    pub quality_threshold: f64,
    pub min_call_interval_secs: u64,
    pub rate_limit_cooldown_secs: u64,
    /// How many file generations the developer keeps in flight
    pub developer_concurrency: usize,
    /// Generated content whose trimmed length is at most this counts as failed
    pub min_content_len: usize,
    /// Recent messages included in prompts, capped at `MAX_CONVERSATION_WINDOW`
    pub conversation_window: usize,
    /// Ask the model for review notes before normalizing
    pub review_with_model: bool,
    pub planner: GenerationParams,
    pub architect: GenerationParams,
    pub developer: GenerationParams,
    pub reviewer: GenerationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            quality_threshold: 75.0,
            min_call_interval_secs: 6,
            rate_limit_cooldown_secs: 60,
            developer_concurrency: 4,
            min_content_len: 10,
            conversation_window: MAX_CONVERSATION_WINDOW,
            review_with_model: true,
            planner: GenerationParams::new(0.3, 3000),
            architect: GenerationParams::new(0.4, 5000),
            developer: GenerationParams::new(0.7, 4000),
            reviewer: GenerationParams::new(0.5, 4000),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| {
            Error::config_invalid(format!("malformed pipeline config: {}", e))
                .with_operation("config::parse")
                .set_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config_invalid(format!("unreadable pipeline config: {}", e))
                .with_operation("config::load")
                .set_source(e)
                .with_context("path", path.display().to_string())
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::config_invalid("max_iterations must be at least 1")
                .with_operation("config::validate"));
        }
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(Error::config_invalid("quality_threshold must be within 0..=100")
                .with_operation("config::validate")
                .with_context("quality_threshold", self.quality_threshold.to_string()));
        }
        Ok(())
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_secs(self.min_call_interval_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    /// Prompt context window after applying the hard cap
    pub fn window(&self) -> usize {
        self.conversation_window.min(MAX_CONVERSATION_WINDOW)
    }

    pub fn concurrency(&self) -> usize {
        self.developer_concurrency.max(1)
    }
}

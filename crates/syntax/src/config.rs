//! Scheduler tuning.
//!
//! All time values are whole milliseconds so a config file reads naturally:
//!
//! ```toml
//! slice_ms = 50
//! max_parse_ahead = 20000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Budgets and distances that drive background parsing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntaxConfig {
	/// Synchronous parse budget while applying a transaction.
	pub apply_budget_ms: u64,
	/// Longest single background slice.
	pub slice_ms: u64,
	/// Pause before a scheduled slice runs.
	pub min_pause_ms: u64,
	/// Parse time allowed per chunk window.
	pub chunk_budget_ms: u64,
	/// Length of a chunk window.
	pub chunk_time_ms: u64,
	/// Budget added for each edit or selection change while focused.
	pub change_bonus_ms: u64,
	/// Characters parsed synchronously when a language state is created.
	pub init_viewport: usize,
	/// How far past the viewport end background parsing continues.
	pub max_parse_ahead: usize,
	/// Documents extending at least this far past the viewport parse the
	/// viewport first, then the lookahead.
	pub viewport_first_margin: usize,
	/// Unchanged text between two edits shorter than this is reparsed rather
	/// than reused. Zero keeps everything an edit did not touch.
	pub min_fragment_gap: usize,
}

impl Default for SyntaxConfig {
	fn default() -> Self {
		Self {
			apply_budget_ms: 20,
			slice_ms: 100,
			min_pause_ms: 100,
			chunk_budget_ms: 3000,
			chunk_time_ms: 30000,
			change_bonus_ms: 50,
			init_viewport: 3000,
			max_parse_ahead: 100_000,
			viewport_first_margin: 1000,
			min_fragment_gap: 0,
		}
	}
}

impl SyntaxConfig {
	/// Parses a TOML document. Missing keys keep their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(target: "weft_syntax::config", path = %path.display(), "config.loaded");
		Ok(config)
	}

	/// Rejects values that would stall the scheduler.
	pub fn validate(&self) -> Result<()> {
		if self.slice_ms == 0 {
			return Err(ConfigError::Invalid("slice_ms must be greater than zero".into()));
		}
		if self.chunk_time_ms == 0 {
			return Err(ConfigError::Invalid("chunk_time_ms must be greater than zero".into()));
		}
		if self.chunk_budget_ms > self.chunk_time_ms {
			tracing::warn!(
				target: "weft_syntax::config",
				chunk_budget_ms = self.chunk_budget_ms,
				chunk_time_ms = self.chunk_time_ms,
				"config.chunk_budget_exceeds_window"
			);
		}
		Ok(())
	}

	pub fn apply_budget(&self) -> Duration {
		Duration::from_millis(self.apply_budget_ms)
	}

	pub fn slice(&self) -> Duration {
		Duration::from_millis(self.slice_ms)
	}

	pub fn min_pause(&self) -> Duration {
		Duration::from_millis(self.min_pause_ms)
	}

	pub fn chunk_budget(&self) -> Duration {
		Duration::from_millis(self.chunk_budget_ms)
	}

	pub fn chunk_time(&self) -> Duration {
		Duration::from_millis(self.chunk_time_ms)
	}

	pub fn change_bonus(&self) -> Duration {
		Duration::from_millis(self.change_bonus_ms)
	}
}

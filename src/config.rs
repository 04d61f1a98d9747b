//! Session configuration.
//!
//! Built in code with the `with_*` setters, or read from a JSON file:
//!
//! ```json
//! {
//!   "rootFrame": "main",
//!   "maxInstructionsPerStep": 100000,
//!   "maxStepsPerRun": 10000,
//!   "maxResolutionRounds": null
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use stepvm_compiler::PipelineOptions;

use crate::error::{Result, SessionError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the frame that holds every binding.
    pub root_frame: String,
    /// Instructions a single step may execute before it faults.
    pub max_instructions_per_step: Option<usize>,
    /// Statements [`Session::run`](crate::Session::run) may complete before
    /// it gives up.
    pub max_steps_per_run: Option<usize>,
    /// Cap on superclass resolution rounds.
    pub max_resolution_rounds: Option<usize>,
}

impl SessionConfig {
    pub const DEFAULT_INSTRUCTION_BUDGET: usize = 1_000_000;
    pub const DEFAULT_RUN_STEPS: usize = 1_000_000;

    pub fn new() -> Self {
        Self {
            root_frame: "main".to_string(),
            max_instructions_per_step: Some(Self::DEFAULT_INSTRUCTION_BUDGET),
            max_steps_per_run: Some(Self::DEFAULT_RUN_STEPS),
            max_resolution_rounds: None,
        }
    }

    pub fn with_root_frame<S: Into<String>>(mut self, name: S) -> Self {
        self.root_frame = name.into();
        self
    }

    pub fn with_max_instructions_per_step(mut self, limit: Option<usize>) -> Self {
        self.max_instructions_per_step = limit;
        self
    }

    pub fn with_max_steps_per_run(mut self, limit: Option<usize>) -> Self {
        self.max_steps_per_run = limit;
        self
    }

    pub fn with_max_resolution_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_resolution_rounds = rounds;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig =
            serde_json::from_str(json).map_err(|err| SessionError::Config {
                message: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_frame.is_empty() {
            return Err(SessionError::Config {
                message: "rootFrame must not be empty".to_string(),
            });
        }
        if self.max_instructions_per_step == Some(0) {
            return Err(SessionError::Config {
                message: "maxInstructionsPerStep must be positive".to_string(),
            });
        }
        if self.max_steps_per_run == Some(0) {
            return Err(SessionError::Config {
                message: "maxStepsPerRun must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_resolution_rounds: self.max_resolution_rounds,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = SessionConfig::from_json(r#"{ "rootFrame": "globals" }"#).unwrap();
        assert_eq!(config.root_frame, "globals");
        assert_eq!(
            config.max_instructions_per_step,
            Some(SessionConfig::DEFAULT_INSTRUCTION_BUDGET)
        );
        assert_eq!(config.max_steps_per_run, Some(SessionConfig::DEFAULT_RUN_STEPS));
        assert_eq!(config.max_resolution_rounds, None);
    }

    #[test]
    fn null_budget_disables_the_limit() {
        let config = SessionConfig::from_json(
            r#"{ "maxInstructionsPerStep": null, "maxResolutionRounds": 8 }"#,
        )
        .unwrap();
        assert_eq!(config.max_instructions_per_step, None);
        assert_eq!(config.pipeline_options().max_resolution_rounds, Some(8));
    }

    #[test]
    fn rejects_unknown_and_invalid_settings() {
        assert!(matches!(
            SessionConfig::from_json(r#"{ "frame": "x" }"#),
            Err(SessionError::Config { .. })
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{ "maxInstructionsPerStep": 0 }"#),
            Err(SessionError::Config { .. })
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{ "maxStepsPerRun": 0 }"#),
            Err(SessionError::Config { .. })
        ));
    }

    #[test]
    fn load_reports_missing_files() {
        let err = SessionConfig::load("/nonexistent/stepvm.json").unwrap_err();
        assert!(matches!(err, SessionError::Io { .. }));
    }
}

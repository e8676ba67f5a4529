//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also handles the transfer spinner and colored output.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

use ufs_core::config::Defaults;

/// Output configuration derived from CLI flags and the `[defaults]` section
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinner
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Merge config-file defaults into the flags; a flag always wins
    pub fn with_defaults(mut self, defaults: &Defaults) -> Self {
        self.json |= defaults.output == "json";
        self.no_color |= defaults.color == "never";
        self.no_progress |= !defaults.progress;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_unset_flags() {
        let defaults = Defaults {
            output: "json".into(),
            color: "never".into(),
            progress: false,
        };
        let config = OutputConfig::default().with_defaults(&defaults);
        assert!(config.json);
        assert!(config.no_color);
        assert!(config.no_progress);
        assert!(!config.quiet);
    }

    #[test]
    fn test_flags_survive_default_config() {
        let config = OutputConfig {
            no_progress: true,
            ..Default::default()
        }
        .with_defaults(&Defaults::default());
        assert!(!config.json);
        assert!(config.no_progress);
    }
}

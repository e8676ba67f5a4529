//! Human-readable and JSON rendering of command results
//!
//! In JSON mode stdout carries exactly one JSON document per command and
//! errors go to stderr as `{"error": ...}`.

use serde::Serialize;

use super::OutputConfig;

const GREEN: &str = "32";
const RED: &str = "31";

/// Renders command output according to [`OutputConfig`]
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Print `value` as JSON, or through its `Display` impl
    pub fn output<T: Serialize + std::fmt::Display>(&self, value: &T) {
        if self.config.quiet {
            return;
        }
        if self.config.json {
            self.json(value);
        } else {
            println!("{value}");
        }
    }

    /// Confirmation line; the exit code carries success in JSON mode
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{}", decorate("✓", GREEN, message, self.colors_enabled()));
    }

    /// Error line on stderr, printed even when quiet
    pub fn error(&self, message: &str) {
        if self.config.json {
            let body = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{}", decorate("✗", RED, message, self.colors_enabled()));
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Plain line, suppressed by `--quiet`
    pub fn println(&self, message: &str) {
        if !self.config.quiet {
            println!("{message}");
        }
    }
}

fn decorate(mark: &str, color: &str, message: &str, colors: bool) -> String {
    if colors {
        format!("\x1b[{color}m{mark}\x1b[0m {message}")
    } else {
        format!("{mark} {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_follow_flags() {
        assert!(Formatter::new(OutputConfig::default()).colors_enabled());

        let json = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        assert!(json.is_json());
        assert!(!json.colors_enabled());

        let plain = Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        });
        assert!(!plain.colors_enabled());
    }

    #[test]
    fn test_decorate() {
        assert_eq!(decorate("✓", GREEN, "Copied", false), "✓ Copied");
        assert_eq!(
            decorate("✗", RED, "Failed", true),
            "\x1b[31m✗\x1b[0m Failed"
        );
    }
}

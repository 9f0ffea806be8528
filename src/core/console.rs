//! Forwarding of administrative commands to the director console.
//!
//! Commands are built here from validated resource names and piped to the
//! console binary's stdin; nothing a caller sends is passed through verbatim.

use regex::Regex;
use serde::Serialize;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ConsoleConfig;
use crate::error::{ReportError, Result};

/// Resource names the director accepts: no quotes, no command separators.
static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._:-]{0,127}$").expect("valid resource name pattern")
});

/// Captured result of one console session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleOutput {
    pub output: Vec<String>,
    pub exitcode: i32,
}

pub struct Console {
    config: ConsoleConfig,
}

impl Console {
    pub fn new(config: ConsoleConfig) -> Self {
        Self { config }
    }

    /// Run `show client="<name>"` on the director.
    pub async fn show_client(&self, name: &str) -> Result<ConsoleOutput> {
        if !is_valid_resource_name(name) {
            return Err(ReportError::invalid("client", name));
        }
        self.run(&[format!("show client=\"{name}\"")]).await
    }

    async fn run(&self, commands: &[String]) -> Result<ConsoleOutput> {
        tracing::debug!(binary = %self.config.binary.display(), ?commands, "Running console commands");

        let mut child = Command::new(&self.config.binary)
            .arg("-c")
            .arg(&self.config.config_file)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ReportError::Console(format!(
                    "failed to start {}: {e}",
                    self.config.binary.display()
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut script = commands.join("\n");
            script.push_str("\nquit\n");
            stdin
                .write_all(script.as_bytes())
                .await
                .map_err(|e| ReportError::Console(format!("failed to write commands: {e}")))?;
        }

        let output = tokio::time::timeout(self.config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| {
                ReportError::Console(format!(
                    "no response within {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| ReportError::Console(e.to_string()))?;

        let exitcode = output.status.code().unwrap_or(-1);
        if exitcode != 0 {
            tracing::warn!(
                exitcode,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Console exited with error"
            );
        }

        Ok(ConsoleOutput {
            output: String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect(),
            exitcode,
        })
    }
}

pub fn is_valid_resource_name(name: &str) -> bool {
    RESOURCE_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn resource_name_allow_list() {
        assert!(is_valid_resource_name("backup-fd"));
        assert!(is_valid_resource_name("web01.example.com-fd"));
        assert!(is_valid_resource_name("Client 1"));
        assert!(!is_valid_resource_name(""));
        assert!(!is_valid_resource_name("fd\"; delete volume"));
        assert!(!is_valid_resource_name("fd\nquit"));
        assert!(!is_valid_resource_name("-fd"));
    }

    #[tokio::test]
    async fn rejects_invalid_name_before_spawning() {
        let console = Console::new(ConsoleConfig {
            binary: PathBuf::from("/nonexistent/bconsole"),
            ..Default::default()
        });
        let err = console.show_client("a\"b").await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidParameter { name: "client", .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_console_error() {
        let console = Console::new(ConsoleConfig {
            binary: PathBuf::from("/nonexistent/bconsole"),
            ..Default::default()
        });
        let err = console.show_client("backup-fd").await.unwrap_err();
        assert!(matches!(err, ReportError::Console(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pipes_commands_to_console() {
        // `sh -c cat` echoes the piped script back.
        let console = Console::new(ConsoleConfig {
            binary: PathBuf::from("sh"),
            config_file: PathBuf::from("cat"),
            timeout_secs: 5,
        });
        let out = console.show_client("backup-fd").await.unwrap();
        assert_eq!(out.exitcode, 0);
        assert_eq!(out.output, vec!["show client=\"backup-fd\"", "quit"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unresponsive_console_times_out() {
        let console = Console::new(ConsoleConfig {
            binary: PathBuf::from("sh"),
            config_file: PathBuf::from("sleep 10"),
            timeout_secs: 1,
        });
        let started = std::time::Instant::now();
        let err = console.show_client("backup-fd").await.unwrap_err();

        match err {
            ReportError::Console(message) => assert_eq!(message, "no response within 1s"),
            other => panic!("expected console error, got {other:?}"),
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}

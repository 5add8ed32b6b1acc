use serde::Serialize;
use std::path::Path;

/// How the post-write command ended. Failures here never fail a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecOutcome {
    pub command: String,
    pub success: bool,
    pub code: Option<i32>,
    /// Set when the command could not be parsed or started.
    pub error: Option<String>,
}

impl ExecOutcome {
    fn failed(command: &str, error: String) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            code: None,
            error: Some(error),
        }
    }
}

/// Run `command` once in `base_dir`. The command is split with shell quoting
/// rules but is not run through a shell.
pub async fn run_post_write(command: &str, base_dir: &Path) -> ExecOutcome {
    let Some(argv) = shlex::split(command) else {
        return ExecOutcome::failed(command, "unbalanced quotes".to_string());
    };
    let Some((program, args)) = argv.split_first() else {
        return ExecOutcome::failed(command, "empty command".to_string());
    };

    log::info!("running '{command}' in {}", base_dir.display());

    match tokio::process::Command::new(program)
        .args(args)
        .current_dir(base_dir)
        .status()
        .await
    {
        Ok(status) => ExecOutcome {
            command: command.to_string(),
            success: status.success(),
            code: status.code(),
            error: None,
        },
        Err(e) => ExecOutcome::failed(command, e.to_string()),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_successful_command() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = run_post_write("true", temp_dir.path()).await;
        assert!(outcome.success);
        assert_eq!(outcome.code, Some(0));
    }

    #[tokio::test]
    async fn test_failing_command_reports_code() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = run_post_write("sh -c 'exit 3'", temp_dir.path()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(3));
        assert_eq!(outcome.error, None);
    }

    #[tokio::test]
    async fn test_runs_in_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = run_post_write("sh -c 'echo ran > marker.txt'", temp_dir.path()).await;
        assert!(outcome.success);
        assert!(temp_dir.path().join("marker.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = run_post_write("weave-no-such-program --flag", temp_dir.path()).await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_command() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = run_post_write("echo 'unterminated", temp_dir.path()).await;
        assert_eq!(outcome.error.as_deref(), Some("unbalanced quotes"));
    }
}

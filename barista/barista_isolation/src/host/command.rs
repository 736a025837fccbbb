//! Isolated command execution.
//!
//! Every test, hook, condition and generator body of a spec file is a shell
//! command. Each one runs in its own child process with a cleared
//! environment, so commands share nothing but the file system. The child
//! is killed if its deadline expires while it is still running.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use barista_core::{TestError, TestResult};
use barista_engine::expect;
use serde_json::Value;
use tokio::process::Command;
use tracing::trace;

use crate::script::CommandExpectation;

/// Exit status of a shell that could not find a command
const STATUS_NOT_FOUND: i32 = 127;

/// Exit status of a shell that found a command it could not execute
const STATUS_NOT_EXECUTABLE: i32 = 126;

/// Variables inherited from the runner's own environment
const INHERITED: [&str; 2] = ["PATH", "HOME"];

/// Working directory and environment of the commands of one spec file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnv {
    dir: PathBuf,
    vars: Vec<(String, String)>,
}

impl CommandEnv {
    /// Commands of `spec` run in the spec's directory with `BARISTA_SPEC` set.
    pub fn for_spec(spec: &Path) -> Self {
        let dir = spec
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        CommandEnv {
            dir,
            vars: vec![("BARISTA_SPEC".to_string(), spec.display().to_string())],
        }
    }

    /// A copy with one more variable; later values win.
    pub fn with_var(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut env = self.clone();
        env.vars.push((key.into(), value.into()));
        env
    }

    /// A copy with every pair of `vars` added.
    pub fn extended<'a, I>(&self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut env = self.clone();
        env.vars
            .extend(vars.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// A copy exposing a generator value and its index.
    pub fn with_value(&self, value: &Value, index: usize) -> Self {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        self.with_var("BARISTA_VALUE", text)
            .with_var("BARISTA_INDEX", index.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Run `script` with `sh -c` in a fresh child process.
pub async fn run_command(script: &str, env: &CommandEnv) -> Result<CommandOutput, TestError> {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(script)
        .current_dir(&env.dir)
        .env_clear()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for name in INHERITED {
        if let Some(value) = std::env::var_os(name) {
            command.env(name, value);
        }
    }
    for (key, value) in &env.vars {
        command.env(key, value);
    }

    trace!(script, dir = %env.dir.display(), "spawning command");
    let output = command.output().await?;

    Ok(CommandOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

impl CommandExpectation {
    /// Check a finished command against this expectation.
    pub fn check(&self, output: &CommandOutput) -> TestResult {
        let expected = self.status.unwrap_or(0);
        let status = match output.status {
            Some(status) => status,
            None => {
                return Err(TestError::runtime(format!(
                    "command terminated by a signal: {}",
                    output.stderr.trim()
                )))
            }
        };

        if status != expected {
            let detail = output.stderr.trim();
            return Err(match status {
                STATUS_NOT_FOUND => TestError::reference(detail.to_string()),
                STATUS_NOT_EXECUTABLE => TestError::type_error(detail.to_string()),
                _ => TestError::assertion(format!(
                    "expected exit status {} but got {}: {}",
                    expected, status, detail
                )),
            });
        }

        if let Some(needle) = &self.stdout_contains {
            expect(&output.stdout).to_contain(needle)?;
        }
        if let Some(exact) = &self.stdout_equals {
            expect(output.stdout.trim_end()).to_equal(exact.trim_end())?;
        }
        if let Some(needle) = &self.stderr_contains {
            expect(&output.stderr).to_contain(needle)?;
        }
        Ok(())
    }
}

/// Run `script` and check it against `expectation`.
pub async fn run_checked(
    script: &str,
    expectation: &CommandExpectation,
    env: &CommandEnv,
) -> TestResult {
    let output = run_command(script, env).await?;
    expectation.check(&output)
}

/// Parse generator output: a JSON array, or one string per non-empty line.
pub fn parse_values(stdout: &str) -> Vec<Value> {
    if let Ok(values) = serde_json::from_str::<Vec<Value>>(stdout.trim()) {
        return values;
    }
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env() -> CommandEnv {
        CommandEnv::for_spec(Path::new("/tmp/spec.test.toml"))
    }

    #[tokio::test]
    async fn test_environment_is_cleared() {
        std::env::set_var("BARISTA_LEAK_CHECK", "leaked");
        let output = run_command("echo \"[$BARISTA_LEAK_CHECK][$BARISTA_SPEC]\"", &env())
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "[][/tmp/spec.test.toml]");
    }

    #[tokio::test]
    async fn test_exit_statuses_map_to_categories() {
        let expectation = CommandExpectation::default();

        let missing = run_checked("definitely-not-a-command-xyz", &expectation, &env()).await;
        assert!(missing.unwrap_err().is("ReferenceError"));

        let wrong = run_checked("exit 3", &expectation, &env()).await;
        let error = wrong.unwrap_err();
        assert!(error.is("AssertionError"));
        assert!(error.message.contains("expected exit status 0 but got 3"));

        let expected_failure = CommandExpectation {
            status: Some(3),
            ..Default::default()
        };
        assert!(run_checked("exit 3", &expected_failure, &env()).await.is_ok());
    }

    #[tokio::test]
    async fn test_output_expectations() {
        let expectation = CommandExpectation {
            stdout_contains: Some("world".to_string()),
            stdout_equals: Some("hello world".to_string()),
            stderr_contains: Some("warn".to_string()),
            ..Default::default()
        };
        let script = "echo 'hello world'; echo 'warn: careful' >&2";
        assert!(run_checked(script, &expectation, &env()).await.is_ok());

        let mismatch = CommandExpectation {
            stdout_contains: Some("mars".to_string()),
            ..Default::default()
        };
        assert!(run_checked(script, &mismatch, &env()).await.is_err());
    }

    #[test]
    fn test_value_variables() {
        let env = env().with_value(&json!("plain"), 2);
        assert_eq!(env.get("BARISTA_VALUE"), Some("plain"));
        assert_eq!(env.get("BARISTA_INDEX"), Some("2"));

        let env = env.with_value(&json!({"a": 1}), 0);
        assert_eq!(env.get("BARISTA_VALUE"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_values("[1, \"two\"]\n"), vec![json!(1), json!("two")]);
        assert_eq!(
            parse_values("alpha\n\n beta \n"),
            vec![json!("alpha"), json!("beta")]
        );
    }
}

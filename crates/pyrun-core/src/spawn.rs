use std::env;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;

use tokio::process::Command;
use tracing::debug;
use which::which;

use pyrun_domain::EnvMap;

/// Overrides interpreter discovery with an explicit binary path.
pub const PYTHON_ENV_VAR: &str = "PYRUN_PYTHON";

/// How the child's stdout/stderr are exposed to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interop {
    /// Wire the child's streams straight through to the parent's.
    #[default]
    Stream,
    /// Capture both streams in memory and hand them back with the
    /// exit code.
    Buffer,
}

impl FromStr for Interop {
    type Err = SpawnError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "buffer" => Ok(Self::Buffer),
            other => Err(SpawnError::InvalidInterop(other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpawnOptions {
    /// Environment for the child. `None` inherits the caller's
    /// environment; `Some` replaces it entirely.
    pub env: Option<EnvMap>,
    pub interop: Interop,
    /// When true (the default), a non-zero exit status fails the call
    /// instead of resolving with the code.
    pub throw_non_zero_status: bool,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            env: None,
            interop: Interop::default(),
            throw_non_zero_status: true,
        }
    }
}

/// Outcome of one interpreter run. The streams are populated only
/// under [`Interop::Buffer`].
#[derive(Clone, Debug)]
pub struct ProcessResult {
    pub code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("unexpected interop mode \"{0}\"")]
    InvalidInterop(String),
    #[error("unable to locate a python interpreter; set {PYTHON_ENV_VAR} or install python3")]
    InterpreterNotFound,
    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Exited with code {code}{}", .stderr.as_deref().map(|text| format!("\n{text}")).unwrap_or_default())]
    NonZeroExit { code: i32, stderr: Option<String> },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Locate the interpreter binary: an explicit [`PYTHON_ENV_VAR`]
/// override wins, then the conventional names on PATH.
pub fn resolve_interpreter() -> Result<PathBuf, SpawnError> {
    if let Some(path) = env::var_os(PYTHON_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    for candidate in ["python3", "python"] {
        if let Ok(path) = which(candidate) {
            return Ok(path);
        }
    }
    Err(SpawnError::InterpreterNotFound)
}

/// Spawn the Python interpreter with `args` and wait for it to exit.
///
/// # Errors
///
/// Fails when the interpreter cannot be located or started, and, unless
/// `throw_non_zero_status` is disabled, when it exits with a non-zero
/// status (the error message embeds the code, plus captured stderr
/// under [`Interop::Buffer`]).
pub async fn spawn_python(
    args: &[String],
    options: SpawnOptions,
) -> Result<ProcessResult, SpawnError> {
    let program = resolve_interpreter()?;
    let mut command = Command::new(&program);
    command.args(args);
    if let Some(env) = &options.env {
        command.env_clear();
        command.envs(env);
    }
    debug!(program = %program.display(), interop = ?options.interop, "spawning python");
    match options.interop {
        Interop::Stream => run_streaming(command, &options).await,
        Interop::Buffer => run_buffered(command, &options).await,
    }
}

async fn run_streaming(
    mut command: Command,
    options: &SpawnOptions,
) -> Result<ProcessResult, SpawnError> {
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(source) => return Err(start_failure(&command, source)),
    };
    let status = child.wait().await?;
    let code = status.code().unwrap_or(-1);
    if options.throw_non_zero_status && code != 0 {
        return Err(SpawnError::NonZeroExit { code, stderr: None });
    }
    Ok(ProcessResult {
        code,
        stdout: None,
        stderr: None,
    })
}

async fn run_buffered(
    mut command: Command,
    options: &SpawnOptions,
) -> Result<ProcessResult, SpawnError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let child = match command.spawn() {
        Ok(child) => child,
        Err(source) => return Err(start_failure(&command, source)),
    };
    // Reads both pipes to completion before reaping the child, so
    // neither stream can deadlock the other.
    let output = child.wait_with_output().await?;
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if options.throw_non_zero_status && code != 0 {
        return Err(SpawnError::NonZeroExit {
            code,
            stderr: Some(stderr),
        });
    }
    Ok(ProcessResult {
        code,
        stdout: Some(stdout),
        stderr: Some(stderr),
    })
}

fn start_failure(command: &Command, source: io::Error) -> SpawnError {
    SpawnError::Spawn {
        program: command
            .as_std()
            .get_program()
            .to_string_lossy()
            .into_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const SCRIPT: &str = "\
import json
import sys

print(\"hello from stderr\", file=sys.stderr)
print(json.dumps({\"args\": sys.argv[2:]}))
sys.exit(int(sys.argv[1]))
";

    fn find_python() -> Option<PathBuf> {
        which("python3").or_else(|_| which("python")).ok()
    }

    fn write_script(dir: &Path) -> anyhow::Result<String> {
        let script = dir.join("test.py");
        fs::write(&script, SCRIPT)?;
        Ok(script.display().to_string())
    }

    fn script_args(script: &str, tail: &[&str]) -> Vec<String> {
        std::iter::once(script.to_string())
            .chain(tail.iter().map(std::string::ToString::to_string))
            .collect()
    }

    #[test]
    fn rejects_unexpected_interop_mode() {
        let err = "bad".parse::<Interop>().expect_err("invalid mode");
        assert!(err.to_string().contains("bad"));
    }

    #[tokio::test]
    async fn retrieves_status_code_when_throw_disabled() -> anyhow::Result<()> {
        let Some(_python) = find_python() else {
            eprintln!("skipping spawn test (python not found)");
            return Ok(());
        };
        let dir = tempdir()?;
        let script = write_script(dir.path())?;
        let options = SpawnOptions {
            throw_non_zero_status: false,
            ..SpawnOptions::default()
        };
        let result = spawn_python(&script_args(&script, &["7"]), options).await?;
        assert_eq!(result.code, 7);
        assert_eq!(result.stdout, None);
        assert_eq!(result.stderr, None);
        Ok(())
    }

    #[tokio::test]
    async fn throws_on_non_zero_status_by_default() -> anyhow::Result<()> {
        let Some(_python) = find_python() else {
            eprintln!("skipping spawn test (python not found)");
            return Ok(());
        };
        let dir = tempdir()?;
        let script = write_script(dir.path())?;
        let options = SpawnOptions {
            interop: Interop::Buffer,
            ..SpawnOptions::default()
        };
        let err = spawn_python(&script_args(&script, &["7", "a", "b"]), options)
            .await
            .expect_err("non-zero exit");
        let message = err.to_string();
        assert!(message.contains("Exited with code 7"), "message: {message}");
        assert!(message.contains("hello from stderr"), "message: {message}");
        Ok(())
    }

    #[tokio::test]
    async fn buffers_stdout_and_stderr_on_success() -> anyhow::Result<()> {
        let Some(_python) = find_python() else {
            eprintln!("skipping spawn test (python not found)");
            return Ok(());
        };
        let dir = tempdir()?;
        let script = write_script(dir.path())?;
        let options = SpawnOptions {
            interop: Interop::Buffer,
            ..SpawnOptions::default()
        };
        let result = spawn_python(&script_args(&script, &["0", "a", "b"]), options).await?;
        assert_eq!(result.code, 0);
        let stderr = result.stderr.expect("captured stderr");
        assert!(stderr.contains("hello from stderr"), "stderr: {stderr}");
        let stdout = result.stdout.expect("captured stdout");
        let parsed: serde_json::Value = serde_json::from_str(&stdout)?;
        assert_eq!(parsed["args"], serde_json::json!(["a", "b"]));
        Ok(())
    }

    #[tokio::test]
    async fn replaces_child_environment_when_env_is_set() -> anyhow::Result<()> {
        let Some(_python) = find_python() else {
            eprintln!("skipping spawn test (python not found)");
            return Ok(());
        };
        let dir = tempdir()?;
        let script = dir.path().join("env.py");
        fs::write(
            &script,
            "import os\nprint(os.environ.get(\"PYRUN_PROBE\", \"unset\"))\n",
        )?;
        let env = EnvMap::from([("PYRUN_PROBE".to_string(), "probe-value".to_string())]);
        let options = SpawnOptions {
            env: Some(env),
            interop: Interop::Buffer,
            throw_non_zero_status: true,
        };
        let result = spawn_python(&[script.display().to_string()], options).await?;
        assert_eq!(result.code, 0);
        let stdout = result.stdout.expect("captured stdout");
        assert_eq!(stdout.trim(), "probe-value");
        Ok(())
    }

    #[tokio::test]
    async fn streaming_mode_reports_non_zero_exit_without_stderr() -> anyhow::Result<()> {
        let Some(_python) = find_python() else {
            eprintln!("skipping spawn test (python not found)");
            return Ok(());
        };
        let dir = tempdir()?;
        let script = dir.path().join("quiet.py");
        fs::write(&script, "import sys\nsys.exit(7)\n")?;
        let err = spawn_python(&[script.display().to_string()], SpawnOptions::default())
            .await
            .expect_err("non-zero exit");
        assert_eq!(err.to_string(), "Exited with code 7");
        Ok(())
    }
}

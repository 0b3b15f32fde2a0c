use crate::error::{InstallerError, Result};
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Whether a tool run should echo the child's stdout to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout silently (listings, probes)
    Capture,
    /// Print stdout line by line while collecting it (installs, upgrades)
    Stream,
}

/// Everything a finished tool run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// The external package manager, seen as a black box driven by argument vectors.
pub trait PackageTool: Send + Sync {
    /// Run the tool; a nonzero exit becomes `InstallerError::ToolFailed`.
    fn run(&self, args: &[&str], mode: OutputMode) -> Result<ToolOutput>;

    /// Install the tool itself.
    fn bootstrap(&self) -> Result<()>;

    /// Executable name used in messages.
    fn program(&self) -> &str;
}

/// PipAgent drives a real `pip` executable
pub struct PipAgent {
    program: String,
    python: String,
}

impl PipAgent {
    pub fn new(program: impl Into<String>, python: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            python: python.into(),
        }
    }
}

impl PackageTool for PipAgent {
    fn run(&self, args: &[&str], mode: OutputMode) -> Result<ToolOutput> {
        let output = invoke(&self.program, args, mode)?;
        ensure_success(&self.program, args, output)
    }

    fn bootstrap(&self) -> Result<()> {
        let args = ["-m", "ensurepip", "--upgrade"];
        let output = invoke(&self.python, &args, OutputMode::Stream)
            .map_err(|e| InstallerError::Bootstrap(e.to_string()))?;
        ensure_success(&self.python, &args, output)
            .map(|_| ())
            .map_err(|e| InstallerError::Bootstrap(e.to_string()))
    }

    fn program(&self) -> &str {
        &self.program
    }
}

/// Turn a nonzero exit into an error carrying the command line and stderr.
pub fn ensure_success(program: &str, args: &[&str], output: ToolOutput) -> Result<ToolOutput> {
    if output.code == 0 {
        return Ok(output);
    }

    Err(InstallerError::ToolFailed {
        command: command_line(program, args),
        code: output.code,
        stderr: output.stderr,
    })
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Spawn `program`, wait for it and collect its output.
///
/// Stdin is inherited so the child can still prompt. Stderr is drained on
/// a separate thread so a full pipe never stalls the child while stdout is
/// being read.
pub fn invoke(program: &str, args: &[&str], mode: OutputMode) -> Result<ToolOutput> {
    debug!(program, ?args, ?mode, "Executing package tool");

    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                InstallerError::ToolUnavailable(format!("Failed to execute '{}': {}", program, e))
            }
            _ => InstallerError::Io(e),
        })?;

    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = stderr.read_to_string(&mut buffer);
            buffer
        })
    });

    let mut stdout = String::new();
    if let Some(pipe) = child.stdout.take() {
        let reader = BufReader::new(pipe);
        for line in reader.lines().map_while(|line| line.ok()) {
            if mode == OutputMode::Stream {
                println!("{}", line);
            }
            stdout.push_str(&line);
            stdout.push('\n');
        }
    }

    let status = child.wait()?;
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let code = status.code().unwrap_or(-1);
    debug!(program, code, "Package tool finished");

    Ok(ToolOutput {
        code,
        stdout,
        stderr,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_exit_becomes_tool_failure() {
        let output = ToolOutput {
            code: 2,
            stdout: String::new(),
            stderr: "boom".into(),
        };
        let err = ensure_success("pip", &["install", "x"], output).unwrap_err();
        match err {
            InstallerError::ToolFailed {
                command,
                code,
                stderr,
            } => {
                assert_eq!(command, "pip install x");
                assert_eq!(code, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_exit_passes_output_through() {
        let output = ensure_success("pip", &["list"], mock::ok("a\n")).unwrap();
        assert_eq!(output.stdout, "a\n");
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let err = invoke(
            "pip-installer-definitely-missing-binary",
            &["--version"],
            OutputMode::Capture,
        )
        .unwrap_err();
        assert!(matches!(err, InstallerError::ToolUnavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_stderr_and_exit_code() {
        let output = invoke(
            "sh",
            &["-c", "echo out; echo err 1>&2; exit 3"],
            OutputMode::Capture,
        )
        .unwrap();
        assert_eq!(output.code, 3);
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn command_line_joins_args() {
        assert_eq!(command_line("pip", &[]), "pip");
        assert_eq!(command_line("pip", &["show", "x"]), "pip show x");
    }
}

//! Solver subprocess management
//!
//! The incremental back end holds a solver child process open for the whole
//! session and talks SMT-LIB over its pipes, one command per line. The
//! process is a scoped resource: dropping the handle tears the child down
//! even when the session unwinds early.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command as ProcessCommand, Stdio};

use tracing::{debug, trace};

use crate::error::{SmtError, SmtResult};
use crate::smtlib::Command;

/// A running solver child process with line-oriented SMT-LIB pipes.
#[derive(Debug)]
pub struct SolverProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl SolverProcess {
    /// Spawn the solver from an argv, e.g. `["z3", "-smt2", "-in"]`.
    pub fn spawn(argv: &[String]) -> SmtResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SmtError::SolverProcess("empty solver command line".to_string()))?;
        debug!(solver = %program, "spawning solver process");
        let mut child = ProcessCommand::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SmtError::SolverProcess(format!("failed to spawn `{program}`: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SmtError::SolverProcess("solver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SmtError::SolverProcess("solver stdout unavailable".to_string()))?;
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn send_line(&mut self, line: &str) -> SmtResult<()> {
        trace!(command = %line, "-> solver");
        writeln!(self.stdin, "{line}")
            .and_then(|()| self.stdin.flush())
            .map_err(|e| SmtError::SolverProcess(format!("write to solver failed: {e}")))
    }

    fn receive_line(&mut self) -> SmtResult<String> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .map_err(|e| SmtError::SolverProcess(format!("read from solver failed: {e}")))?;
        if read == 0 {
            return Err(SmtError::SolverProcess(
                "solver closed its output unexpectedly".to_string(),
            ));
        }
        trace!(response = %line.trim_end(), "<- solver");
        Ok(line)
    }

    /// Read lines until the parentheses balance, for multi-line responses.
    fn receive_balanced(&mut self) -> SmtResult<String> {
        let mut response = String::new();
        let mut depth: i64 = 0;
        loop {
            let line = self.receive_line()?;
            depth += paren_balance(&line);
            response.push_str(&line);
            if depth <= 0 && !response.trim().is_empty() {
                return Ok(response);
            }
        }
    }
}

impl Drop for SolverProcess {
    fn drop(&mut self) {
        let _ = self.send_line(&Command::Exit.to_string());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Net parenthesis depth change over `line`, ignoring `|`-quoted symbols.
fn paren_balance(line: &str) -> i64 {
    let mut depth = 0;
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '|' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Transport for SMT-LIB commands. Production sessions talk to a live child
/// process; tests observe the command stream and script the responses.
pub enum SolverDriver {
    /// Live solver subprocess
    Process(SolverProcess),
    /// Write commands to a sink without a solver; responses are unavailable
    Dump(Box<dyn Write + Send>),
    /// Record sent commands and replay scripted responses
    Recording {
        /// Commands sent so far, in serialized form
        sent: Vec<String>,
        /// Responses to hand back, front first
        responses: VecDeque<String>,
    },
}

impl SolverDriver {
    /// A recording driver with scripted responses, for tests.
    pub fn recording(responses: impl IntoIterator<Item = String>) -> Self {
        SolverDriver::Recording {
            sent: Vec::new(),
            responses: responses.into_iter().collect(),
        }
    }

    /// Serialize and send one command.
    pub fn send(&mut self, command: &Command) -> SmtResult<()> {
        let line = command.to_string();
        match self {
            SolverDriver::Process(process) => process.send_line(&line),
            SolverDriver::Dump(sink) => {
                writeln!(sink, "{line}")?;
                Ok(())
            }
            SolverDriver::Recording { sent, .. } => {
                sent.push(line);
                Ok(())
            }
        }
    }

    /// Receive one response line, for `check-sat`.
    pub fn receive_line(&mut self) -> SmtResult<String> {
        match self {
            SolverDriver::Process(process) => process.receive_line(),
            SolverDriver::Dump(_) => Err(SmtError::SolverProcess(
                "no responses available when dumping commands".to_string(),
            )),
            SolverDriver::Recording { responses, .. } => responses.pop_front().ok_or_else(|| {
                SmtError::SolverProcess("recording driver ran out of responses".to_string())
            }),
        }
    }

    /// Receive one parenthesis-balanced response, for `get-value`.
    pub fn receive_balanced(&mut self) -> SmtResult<String> {
        match self {
            SolverDriver::Process(process) => process.receive_balanced(),
            _ => self.receive_line(),
        }
    }

    /// Commands sent so far. Only the recording driver retains them.
    pub fn sent_commands(&self) -> &[String] {
        match self {
            SolverDriver::Recording { sent, .. } => sent,
            _ => &[],
        }
    }
}

impl std::fmt::Debug for SolverDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverDriver::Process(process) => f.debug_tuple("Process").field(process).finish(),
            SolverDriver::Dump(_) => f.debug_tuple("Dump").finish(),
            SolverDriver::Recording { sent, responses } => f
                .debug_struct("Recording")
                .field("sent", sent)
                .field("responses", responses)
                .finish(),
        }
    }
}

/// Locate an executable by name on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtlib::Command;

    // ==================== Driver Tests ====================

    #[test]
    fn test_recording_driver_captures_commands() {
        let mut driver = SolverDriver::recording([]);
        driver.send(&Command::Push).unwrap();
        driver.send(&Command::CheckSat).unwrap();
        assert_eq!(driver.sent_commands(), ["(push 1)", "(check-sat)"]);
    }

    #[test]
    fn test_recording_driver_replays_responses() {
        let mut driver = SolverDriver::recording(["sat".to_string(), "unsat".to_string()]);
        assert_eq!(driver.receive_line().unwrap(), "sat");
        assert_eq!(driver.receive_line().unwrap(), "unsat");
        assert!(driver.receive_line().is_err());
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dump_driver_writes_commands() {
        let buffer = SharedBuffer::default();
        let mut driver = SolverDriver::Dump(Box::new(buffer.clone()));
        driver.send(&Command::CheckSat).unwrap();
        assert!(driver.receive_line().is_err());
        let written = buffer.0.lock().unwrap().clone();
        assert_eq!(String::from_utf8(written).unwrap(), "(check-sat)\n");
    }

    #[test]
    fn test_paren_balance() {
        assert_eq!(paren_balance("((x"), 2);
        assert_eq!(paren_balance("#x0a))"), -2);
        assert_eq!(paren_balance("(|weird ) name|)"), 0);
    }

    // ==================== Process Tests ====================

    #[test]
    fn test_spawn_missing_solver_is_error() {
        let result = SolverProcess::spawn(&["definitely-not-a-solver-binary".to_string()]);
        assert!(matches!(result, Err(SmtError::SolverProcess(_))));
    }

    #[test]
    fn test_spawn_empty_argv_is_error() {
        assert!(matches!(
            SolverProcess::spawn(&[]),
            Err(SmtError::SolverProcess(_))
        ));
    }
}

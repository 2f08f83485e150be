//! git::command
//!
//! Plumbing executor: runs the `git` binary as a subprocess.
//!
//! Reads go through [`Git`](super::Git) (git2). Everything that writes objects,
//! builds an index, merges or pushes goes through [`GitCommand`], because the
//! native binary is what implements alternates-aware clones, sparse checkout,
//! and leased pushes.
//!
//! # Cancellation
//!
//! Both [`GitCommand::run`] and [`GitCommand::stream`] take a
//! [`RequestContext`]. A cancelled or expired context kills the child process
//! and surfaces [`CommandError::Interrupted`].
//!
//! # Example
//!
//! ```ignore
//! use gitweave::git::GitCommand;
//!
//! let out = GitCommand::new("rev-parse")
//!     .arg("HEAD")
//!     .dir(repo_path)
//!     .run(&ctx)?;
//! println!("{}", out.stdout_trimmed());
//! ```

use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::core::context::{ContextError, RequestContext};

/// How often a running child is checked against its context.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Errors from running a git subprocess.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The binary could not be started.
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("'{command}' failed with exit code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The request context ended while the process was running.
    #[error("'{command}' interrupted: {reason}")]
    Interrupted {
        command: String,
        reason: ContextError,
    },

    /// Reading or writing a process pipe failed.
    #[error("i/o error talking to '{command}': {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}

impl CommandError {
    /// Captured stderr, if the process ran and failed.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Exit code, if the process ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether stderr contains `needle`.
    pub fn stderr_contains(&self, needle: &str) -> bool {
        self.stderr().is_some_and(|s| s.contains(needle))
    }
}

/// Output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Stdout as UTF-8 (lossy) with surrounding whitespace removed.
    pub fn stdout_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Stdout split on NUL, dropping empty records.
    pub fn stdout_nul_separated(&self) -> Vec<String> {
        self.stdout
            .split(|b| *b == 0)
            .filter(|part| !part.is_empty())
            .map(|part| String::from_utf8_lossy(part).into_owned())
            .collect()
    }
}

/// Builder for one `git` invocation.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: OsString,
    args: Vec<OsString>,
    dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    stdin: Option<Vec<u8>>,
}

impl GitCommand {
    /// Start a command for the given git subcommand, using `git` from `PATH`.
    pub fn new(subcommand: &str) -> Self {
        Self {
            program: OsString::from("git"),
            args: vec![OsString::from(subcommand)],
            dir: None,
            envs: Vec::new(),
            stdin: None,
        }
    }

    /// Use a specific git binary.
    pub fn binary(mut self, program: impl AsRef<OsStr>) -> Self {
        self.program = program.as_ref().to_os_string();
        self
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run inside `dir`.
    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (k, v) in vars {
            self = self.env(k, v);
        }
        self
    }

    /// Bytes written to the child's stdin.
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Human-readable form for errors and logs.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        // Stable English messages; stderr is matched on in a few places.
        cmd.env("LC_ALL", "C");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        cmd.stdin(if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    fn spawn(&self) -> Result<Child, CommandError> {
        tracing::trace!(command = %self.display(), "spawning git");
        self.build().spawn().map_err(|source| CommandError::Spawn {
            command: self.display(),
            source,
        })
    }

    /// Run to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Failed`] on a non-zero exit
    /// - [`CommandError::Interrupted`] if `ctx` is cancelled or expires first
    pub fn run(&self, ctx: &RequestContext) -> Result<CommandOutput, CommandError> {
        ctx.check().map_err(|reason| CommandError::Interrupted {
            command: self.display(),
            reason,
        })?;

        let mut child = self.spawn()?;
        let writer = feed_stdin(&mut child, self.stdin.clone());
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_with_context(&mut child, ctx)?;

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let output = CommandOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };

        if !status.success() {
            return Err(CommandError::Failed {
                command: self.display(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    fn wait_with_context(
        &self,
        child: &mut Child,
        ctx: &RequestContext,
    ) -> Result<ExitStatus, CommandError> {
        loop {
            if let Err(reason) = ctx.check() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Interrupted {
                    command: self.display(),
                    reason,
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(CommandError::Io {
                        command: self.display(),
                        source,
                    })
                }
            }
        }
    }

    /// Start the command and read its stdout line by line.
    ///
    /// The context is checked before every line. Dropping the stream kills a
    /// child that is still running.
    pub fn stream(&self, ctx: &RequestContext) -> Result<LineStream, CommandError> {
        ctx.check().map_err(|reason| CommandError::Interrupted {
            command: self.display(),
            reason,
        })?;

        let mut child = self.spawn()?;
        let writer = feed_stdin(&mut child, self.stdin.clone());
        let stderr = drain(child.stderr.take());
        let stdout = child.stdout.take().ok_or_else(|| CommandError::Io {
            command: self.display(),
            source: std::io::Error::other("stdout not captured"),
        })?;

        Ok(LineStream {
            command: self.display(),
            ctx: ctx.clone(),
            child: Some(child),
            reader: BufReader::new(stdout),
            writer,
            stderr: Some(stderr),
            buf: Vec::new(),
        })
    }
}

fn feed_stdin(child: &mut Child, input: Option<Vec<u8>>) -> Option<JoinHandle<()>> {
    let mut pipe = child.stdin.take()?;
    let data = input.unwrap_or_default();
    Some(thread::spawn(move || {
        let _ = pipe.write_all(&data);
    }))
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Pull iterator over the stdout lines of a running git process.
///
/// Yields lines without their trailing newline. When stdout ends, the exit
/// status is checked; a failure is yielded as the final item.
pub struct LineStream {
    command: String,
    ctx: RequestContext,
    child: Option<Child>,
    reader: BufReader<ChildStdout>,
    writer: Option<JoinHandle<()>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    buf: Vec<u8>,
}

impl std::fmt::Debug for LineStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineStream")
            .field("command", &self.command)
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl LineStream {
    /// Read the next raw line, or `None` once the process has exited cleanly.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>, CommandError> {
        if self.child.is_none() {
            return Ok(None);
        }
        if let Err(reason) = self.ctx.check() {
            self.kill();
            return Err(CommandError::Interrupted {
                command: self.command.clone(),
                reason,
            });
        }

        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|source| CommandError::Io {
                command: self.command.clone(),
                source,
            })?;

        if read == 0 {
            self.finish()?;
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        Ok(Some(std::mem::take(&mut self.buf)))
    }

    fn finish(&mut self) -> Result<(), CommandError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(|source| CommandError::Io {
            command: self.command.clone(),
            source,
        })?;
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
        let stderr = self
            .stderr
            .take()
            .map(|h| h.join().unwrap_or_default())
            .unwrap_or_default();
        if !status.success() {
            return Err(CommandError::Failed {
                command: self.command.clone(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Iterator for LineStream {
    type Item = Result<String, CommandError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(String::from_utf8_lossy(&line).into_owned())),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        self.kill();
    }
}

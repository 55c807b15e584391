//! Running external executables with a bounded wait.
//!
//! Everything funnels into [`ProcessInvocation::run`]. The free functions are
//! shorthands for the common combinations of its settings.

use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::traits::{OutputSink, Stream, TracingSink};

/// Timeout meaning "wait for as long as it takes".
pub const INFINITE_TIMEOUT_MS: u64 = u64::MAX;

/// Exit code reported when the executable could not be launched at all.
pub const FAILED_TO_START_EXIT_CODE: i32 = i32::MAX;

/// Exit code reported for a child that was killed without one (Windows and
/// unknown signals).
const KILLED_EXIT_CODE: i32 = -1;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long the reader threads may outlast the child's exit when that exit
/// comes close to the deadline. A grandchild may still hold the pipes open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// ProcessResult
// ---------------------------------------------------------------------------

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The process exited on its own.
    Completed,

    /// The process outlived its timeout and was killed.
    TimedOut,

    /// The process never started; `exit_code` is [`FAILED_TO_START_EXIT_CODE`].
    FailedToStart,
}

/// Exit code and captured output of one invocation.
///
/// Two results compare equal when their exit codes do, whatever they
/// printed and however they ended. Callers that must tell a timeout from a
/// crash use [`outcome()`](Self::outcome).
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub exit_code: i32,

    /// Full stdout, when output was captured.
    pub stdout: Option<String>,

    /// Full stderr, when output was captured.
    pub stderr: Option<String>,

    outcome: ExitOutcome,
}

impl ProcessResult {
    pub fn failed_to_start() -> Self {
        Self {
            exit_code: FAILED_TO_START_EXIT_CODE,
            stdout:    None,
            stderr:    None,
            outcome:   ExitOutcome::FailedToStart,
        }
    }

    pub fn outcome(&self) -> ExitOutcome {
        self.outcome
    }

    /// Exited on its own with code 0.
    pub fn is_success(&self) -> bool {
        self.outcome == ExitOutcome::Completed && self.exit_code == 0
    }

    pub fn stdout(&self) -> &str {
        self.stdout.as_deref().unwrap_or_default()
    }

    pub fn stderr(&self) -> &str {
        self.stderr.as_deref().unwrap_or_default()
    }
}

impl PartialEq for ProcessResult {
    fn eq(&self, other: &Self) -> bool {
        self.exit_code == other.exit_code
    }
}

impl Eq for ProcessResult {}

impl Hash for ProcessResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.exit_code.hash(state);
    }
}

// ---------------------------------------------------------------------------
// ProcessInvocation
// ---------------------------------------------------------------------------

/// One call to an external executable.
///
/// The argument string is passed through as built: verbatim on Windows,
/// split into words with the Windows C runtime rules elsewhere (see
/// `split_command_line`). No shell is involved on either platform.
///
/// # Example
///
/// ```rust,no_run
/// use buildshim::{ArgsBuilder, ArgumentSyntax, ProcessInvocation};
///
/// let args = ArgsBuilder::new(ArgumentSyntax::dash_space())
///     .add_value("pack")
///     .add_key_path("OutputDirectory", "target/nuget")
///     .build();
///
/// let result = ProcessInvocation::new("nuget")
///     .args(args)
///     .capture_output(true)
///     .timeout_ms(60_000)
///     .run()?;
///
/// if !result.is_success() {
///     eprintln!("{}", result.stderr());
/// }
/// # Ok::<(), buildshim::Error>(())
/// ```
pub struct ProcessInvocation {
    executable:     PathBuf,
    arguments:      String,
    working_dir:    Option<PathBuf>,
    capture_output: bool,
    timeout_ms:     u64,
    sink:           Arc<dyn OutputSink>,
}

impl ProcessInvocation {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable:     executable.into(),
            arguments:      String::new(),
            working_dir:    None,
            capture_output: false,
            timeout_ms:     INFINITE_TIMEOUT_MS,
            sink:           Arc::new(TracingSink),
        }
    }

    pub fn args(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Pipe stdout and stderr back into the result instead of inheriting
    /// the parent's streams. Off by default.
    pub fn capture_output(mut self, yes: bool) -> Self {
        self.capture_output = yes;
        self
    }

    /// Run in `dir` instead of the current directory. An empty path keeps
    /// the current directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into()).filter(|d| !d.as_os_str().is_empty());
        self
    }

    /// Kill the process if it is still running after `ms` milliseconds.
    /// [`INFINITE_TIMEOUT_MS`] by default.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Where captured lines go while the process runs. [`TracingSink`] by default.
    pub fn sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Launch, wait and collect.
    ///
    /// A launch failure is not an error: it comes back as
    /// [`ProcessResult::failed_to_start`]. Neither is a non-zero exit or a
    /// timeout; both are reported through `exit_code`.
    ///
    /// With a finite timeout, control comes back by the deadline (plus
    /// [`DRAIN_GRACE`] at most) even when a background grandchild keeps the
    /// output pipes open. Whatever was read by then is returned.
    ///
    /// # Errors
    ///
    /// [`Error::Pipe`] when waiting on the child or draining its output fails.
    pub fn run(self) -> Result<ProcessResult> {
        let mut cmd = self.command();

        tracing::info!(
            executable = %self.executable.display(),
            arguments = %self.arguments,
            "launching process"
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    executable = %self.executable.display(),
                    error = %e,
                    "process failed to start"
                );
                return Ok(ProcessResult::failed_to_start());
            }
        };

        let deadline = deadline(self.timeout_ms);

        let drains = if self.capture_output {
            Some(Drains::start(&mut child, &self.sink))
        } else {
            None
        };

        let (status, timed_out) = wait(&mut child, deadline)?;

        let (stdout, stderr) = match drains {
            Some(drains) => {
                let drain_deadline = deadline.map(|d| d.max(Instant::now() + DRAIN_GRACE));
                let (out, err) = drains.collect(drain_deadline)?;
                (Some(out), Some(err))
            }
            None => (None, None),
        };

        let exit_code = exit_code(status);
        if timed_out {
            tracing::warn!(
                executable = %self.executable.display(),
                timeout_ms = self.timeout_ms,
                exit_code,
                "process timed out and was killed"
            );
        } else {
            tracing::info!(
                executable = %self.executable.display(),
                exit_code,
                "process exited"
            );
        }

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
            outcome: if timed_out {
                ExitOutcome::TimedOut
            } else {
                ExitOutcome::Completed
            },
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        apply_arguments(&mut cmd, &self.arguments);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        if self.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        cmd
    }
}

// ---------------------------------------------------------------------------
// Shorthands
// ---------------------------------------------------------------------------

/// Run without capturing output, in the current directory, waiting forever.
pub fn execute(executable: impl Into<PathBuf>, arguments: impl Into<String>) -> Result<ProcessResult> {
    ProcessInvocation::new(executable).args(arguments).run()
}

/// Like [`execute`], with stdout and stderr captured.
pub fn execute_captured(
    executable: impl Into<PathBuf>,
    arguments: impl Into<String>,
) -> Result<ProcessResult> {
    ProcessInvocation::new(executable)
        .args(arguments)
        .capture_output(true)
        .run()
}

/// Run in `working_dir`, waiting forever.
pub fn execute_in(
    executable: impl Into<PathBuf>,
    arguments: impl Into<String>,
    capture_output: bool,
    working_dir: impl AsRef<Path>,
) -> Result<ProcessResult> {
    execute_with(executable, arguments, capture_output, working_dir, INFINITE_TIMEOUT_MS)
}

/// The full form: every setting explicit.
pub fn execute_with(
    executable: impl Into<PathBuf>,
    arguments: impl Into<String>,
    capture_output: bool,
    working_dir: impl AsRef<Path>,
    timeout_ms: u64,
) -> Result<ProcessResult> {
    ProcessInvocation::new(executable)
        .args(arguments)
        .capture_output(capture_output)
        .working_dir(working_dir.as_ref())
        .timeout_ms(timeout_ms)
        .run()
}

// ---------------------------------------------------------------------------
// Platform argument passing
// ---------------------------------------------------------------------------

#[cfg(windows)]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    if !arguments.is_empty() {
        cmd.raw_arg(arguments);
    }
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    cmd.args(split_command_line(arguments));
}

/// Split a command line the way the Windows C runtime does, so a string
/// built for `raw_arg` means the same thing on every platform.
///
/// - spaces and tabs outside double quotes separate words
/// - double quotes group and are removed; `""` inside quotes is a literal `"`
/// - `2n` backslashes before a quote become `n` and the quote still groups;
///   `2n + 1` become `n` followed by a literal quote
/// - a backslash anywhere else is literal, and so is `'`
///
/// An unterminated quote runs to the end of the string.
#[cfg_attr(windows, allow(dead_code))]
pub(crate) fn split_command_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' if !in_quotes => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\\' => {
                let mut backslashes = 1;
                while chars.peek() == Some(&'\\') {
                    chars.next();
                    backslashes += 1;
                }
                in_word = true;
                if chars.peek() == Some(&'"') {
                    word.extend(std::iter::repeat('\\').take(backslashes / 2));
                    if backslashes % 2 == 1 {
                        chars.next();
                        word.push('"');
                    }
                } else {
                    word.extend(std::iter::repeat('\\').take(backslashes));
                }
            }
            '"' => {
                in_word = true;
                if in_quotes && chars.peek() == Some(&'"') {
                    chars.next();
                    word.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            other => {
                in_word = true;
                word.push(other);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    words
}

// ---------------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------------

fn deadline(timeout_ms: u64) -> Option<Instant> {
    if timeout_ms == INFINITE_TIMEOUT_MS {
        return None;
    }
    Instant::now().checked_add(Duration::from_millis(timeout_ms))
}

/// Wait for exit, killing the child once the deadline passes.
/// Returns the final status and whether the child was killed.
fn wait(child: &mut Child, deadline: Option<Instant>) -> Result<(ExitStatus, bool)> {
    let Some(deadline) = deadline else {
        let status = child.wait().map_err(Error::Pipe)?;
        return Ok((status, false));
    };

    loop {
        if let Some(status) = child.try_wait().map_err(Error::Pipe)? {
            return Ok((status, false));
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }

    // Already exited between the last poll and here is fine; wait() reaps either way.
    if let Err(e) = child.kill() {
        if e.kind() != std::io::ErrorKind::InvalidInput {
            return Err(Error::Pipe(e));
        }
    }
    let status = child.wait().map_err(Error::Pipe)?;
    Ok((status, true))
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(KILLED_EXIT_CODE)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(KILLED_EXIT_CODE)
}

// ---------------------------------------------------------------------------
// Output draining
// ---------------------------------------------------------------------------

type Captured = Arc<Mutex<String>>;

/// Reader threads for stdout and stderr.
///
/// They start right after spawn so a chatty child never blocks on a full
/// pipe while we wait on it. Text is appended to the shared buffers line by
/// line, so a drain cut short still hands back what arrived.
struct Drains {
    stdout:  Captured,
    stderr:  Captured,
    done:    Receiver<std::io::Result<()>>,
    pending: usize,
}

impl Drains {
    fn start(child: &mut Child, sink: &Arc<dyn OutputSink>) -> Self {
        let (tx, done) = mpsc::channel();
        let stdout = Captured::default();
        let stderr = Captured::default();
        let mut pending = 0;

        if let Some(out) = child.stdout.take() {
            spawn_reader(out, Stream::Stdout, Arc::clone(&stdout), Arc::clone(sink), tx.clone());
            pending += 1;
        }
        if let Some(err) = child.stderr.take() {
            spawn_reader(err, Stream::Stderr, Arc::clone(&stderr), Arc::clone(sink), tx.clone());
            pending += 1;
        }

        Self { stdout, stderr, done, pending }
    }

    /// Wait for both readers to hit end of stream, or until `deadline`.
    fn collect(self, deadline: Option<Instant>) -> Result<(String, String)> {
        for _ in 0..self.pending {
            let finished = match deadline {
                None => self.done.recv().ok(),
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    self.done.recv_timeout(left).ok()
                }
            };

            match finished {
                Some(result) => result.map_err(Error::Pipe)?,
                None => {
                    tracing::debug!("output still open after the child exited, returning what was read");
                    break;
                }
            }
        }

        Ok((take(&self.stdout), take(&self.stderr)))
    }
}

fn take(buffer: &Captured) -> String {
    match buffer.lock() {
        Ok(mut text) => std::mem::take(&mut *text),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    }
}

fn spawn_reader<R>(
    reader: R,
    stream: Stream,
    buffer: Captured,
    sink: Arc<dyn OutputSink>,
    tx: Sender<std::io::Result<()>>,
) where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let result = read_all(reader, stream, &buffer, sink.as_ref());
        // The receiver is gone only if the caller stopped waiting at its deadline.
        let _ = tx.send(result);
    });
}

fn read_all(
    reader: impl Read,
    stream: Stream,
    buffer: &Captured,
    sink: &dyn OutputSink,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        sink.line(stream, line.trim_end_matches(['\r', '\n']));
        if let Ok(mut text) = buffer.lock() {
            text.push_str(&line);
        }
    }
}

//! # Command Execution Module / 命令执行模块
//!
//! The process runner: spawns exactly one child per call, waits for it, and
//! hands back a [`CommandResult`]. A non-zero exit is data, not an error;
//! only failures to launch, to open the output sink, deadlines and Ctrl-C
//! surface as [`ProcessError`].
//!
//! 进程运行器：每次调用只派生一个子进程并等待其结束，返回 `CommandResult`。
//! 非零退出码是数据而不是错误；只有启动失败、输出目标无法打开、超时和
//! Ctrl-C 才会作为 `ProcessError` 返回。

use futures::future::Either;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::error::ProcessError;
use crate::core::models::CommandResult;

/// A fully specified child process: program, arguments, working directory,
/// environment overrides and an optional deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shell-quoted command line for display.
    pub fn display(&self) -> String {
        let parts = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(parts).unwrap_or_else(|_| {
            std::iter::once(self.program.clone())
                .chain(self.args.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

/// Where a child's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Keep stdout and stderr in memory.
    Capture,
    /// Keep stdout and stderr in memory and echo each line as it arrives.
    Tee,
    /// Send stdout and stderr, interleaved, to a file. Nothing is kept in memory.
    File(PathBuf),
}

/// Runs external commands. The seam between the pipeline and the OS.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    async fn run(&self, invocation: &Invocation, sink: OutputSink) -> Result<CommandResult, ProcessError>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
///
/// Cancelling the token kills whichever child is running at the time.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cancel: CancellationToken,
}

impl SystemRunner {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation, sink: OutputSink) -> Result<CommandResult, ProcessError> {
        if invocation.program.is_empty() {
            return Err(ProcessError::EmptyCommand);
        }
        debug!(command = %invocation.display(), cwd = %invocation.working_dir.display(), "spawning");

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match sink {
            OutputSink::File(path) => {
                let (stdout, stderr) = open_sink(&path)?;
                cmd.stdout(stdout).stderr(stderr);
                let child = spawn(&mut cmd, invocation)?;
                let status = self.wait(child, invocation).await?;
                Ok(CommandResult {
                    exit_code: exit_code(status),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
            OutputSink::Capture | OutputSink::Tee => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
                let child = spawn(&mut cmd, invocation)?;
                self.capture(child, invocation, matches!(sink, OutputSink::Tee))
                    .await
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Stdout,
    Stderr,
}

/// What ended the race between a child and its deadline/cancellation.
enum Finish<T> {
    Done(T),
    TimedOut(Duration),
    Cancelled,
}

impl SystemRunner {
    /// Races `work` against the invocation deadline and the cancel token.
    async fn race<T>(
        &self,
        work: impl std::future::Future<Output = T>,
        invocation: &Invocation,
    ) -> Finish<T> {
        let deadline = match invocation.timeout {
            Some(after) => Either::Left(async move {
                tokio::time::sleep(after).await;
                after
            }),
            None => Either::Right(futures::future::pending::<Duration>()),
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Finish::Cancelled,
            after = deadline => Finish::TimedOut(after),
            value = work => Finish::Done(value),
        }
    }

    async fn wait(&self, mut child: Child, invocation: &Invocation) -> Result<ExitStatus, ProcessError> {
        let finish = self.race(child.wait(), invocation).await;
        match finish {
            Finish::Done(status) => status.map_err(|source| launch_error(invocation, source)),
            Finish::TimedOut(after) => {
                terminate(&mut child, invocation).await;
                Err(ProcessError::TimedOut {
                    program: invocation.program.clone(),
                    after,
                })
            }
            Finish::Cancelled => {
                terminate(&mut child, invocation).await;
                Err(ProcessError::Cancelled {
                    program: invocation.program.clone(),
                })
            }
        }
    }

    async fn capture(
        &self,
        mut child: Child,
        invocation: &Invocation,
        echo: bool,
    ) -> Result<CommandResult, ProcessError> {
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(launch_error(
                invocation,
                std::io::Error::other("child output pipes were not available"),
            ));
        };

        let collect = async {
            let out = LinesStream::new(BufReader::new(stdout).lines()).map(|l| (Channel::Stdout, l));
            let err = LinesStream::new(BufReader::new(stderr).lines()).map(|l| (Channel::Stderr, l));
            let mut merged = out.merge(err);

            let mut result = CommandResult::default();
            while let Some((channel, line)) = merged.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "stopped reading child output");
                        break;
                    }
                };
                let buffer = match channel {
                    Channel::Stdout => {
                        if echo {
                            println!("{line}");
                        }
                        &mut result.stdout
                    }
                    Channel::Stderr => {
                        if echo {
                            eprintln!("{line}");
                        }
                        &mut result.stderr
                    }
                };
                buffer.push_str(&line);
                buffer.push('\n');
            }
            let status = child.wait().await;
            (result, status)
        };

        match self.race(collect, invocation).await {
            Finish::Done((mut result, status)) => {
                let status = status.map_err(|source| launch_error(invocation, source))?;
                result.exit_code = exit_code(status);
                Ok(result)
            }
            Finish::TimedOut(after) => {
                terminate(&mut child, invocation).await;
                Err(ProcessError::TimedOut {
                    program: invocation.program.clone(),
                    after,
                })
            }
            Finish::Cancelled => {
                terminate(&mut child, invocation).await;
                Err(ProcessError::Cancelled {
                    program: invocation.program.clone(),
                })
            }
        }
    }
}

fn spawn(cmd: &mut tokio::process::Command, invocation: &Invocation) -> Result<Child, ProcessError> {
    cmd.spawn().map_err(|source| launch_error(invocation, source))
}

fn launch_error(invocation: &Invocation, source: std::io::Error) -> ProcessError {
    ProcessError::Launch {
        program: invocation.program.clone(),
        source,
    }
}

/// Opens `path` for writing and returns two handles to it, one for stdout
/// and one for stderr, so both streams land in the same file.
fn open_sink(path: &Path) -> Result<(Stdio, Stdio), ProcessError> {
    let sink_error = |source| ProcessError::Sink {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(sink_error)?;
    let stderr = file.try_clone().map_err(sink_error)?;
    Ok((Stdio::from(file), Stdio::from(stderr)))
}

async fn terminate(child: &mut Child, invocation: &Invocation) {
    if let Err(e) = child.kill().await {
        warn!(program = %invocation.program, error = %e, "failed to kill child process");
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

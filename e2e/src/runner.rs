//! Streamed execution of external `make`/`docker` commands.

use std::{path::PathBuf, process::Stdio};

use futures::{StreamExt, stream};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::mpsc,
};

use crate::error::{Error, Result};

/// Upper bound on concurrently running external commands.
const POOL_SIZE: usize = 4;

/// A shell command with an explicit working directory and environment
/// override map. The overrides are merged over the inherited parent
/// environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Legend prefixed to every streamed output line.
    pub legend: String,
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(legend: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            legend: legend.into(),
            command: command.into(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Run one command through `sh -c`, forwarding stdout and stderr to our
/// stdout line-by-line as the command runs. A non-zero exit status is an
/// error carrying the status.
pub async fn run(spec: &CommandSpec) -> Result<()> {
    println!(
        "Running command: {} in {} with environment: {:?}",
        spec.command,
        spec.cwd
            .as_deref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| ".".to_string()),
        spec.env,
    );
    let mut cmd = Command::new("sh");
    cmd.arg("-c");
    cmd.arg(&spec.command);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    let mut child = cmd.spawn()?;

    let (tx, mut rx) = mpsc::channel::<String>(32);
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx.send(line).await;
            }
        }));
    }
    if let Some(stderr) = child.stderr.take() {
        let tx = tx.clone();
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx.send(line).await;
            }
        }));
    }
    drop(tx);

    let legend = spec.legend.clone();
    let printer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("{legend}: {line}");
        }
    });

    let status = child.wait().await?;
    futures::future::join_all(readers).await;
    let _ = printer.await;

    if !status.success() {
        return Err(Error::CommandFailed {
            command: spec.command.clone(),
            status,
        });
    }
    Ok(())
}

/// Run a batch of independent commands through a fixed-size pool and return
/// every result. Callers decide whether individual failures matter.
pub async fn run_all(specs: Vec<CommandSpec>) -> Vec<Result<()>> {
    stream::iter(specs)
        .map(|spec| async move { run(&spec).await })
        .buffer_unordered(POOL_SIZE)
        .collect()
        .await
}

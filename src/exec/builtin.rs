// src/exec/builtin.rs

//! Handlers available to plan files: `shell`, `echo` and `sleep`.
//!
//! All three take the task payload as a string and produce a string result.

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::registry::HandlerRegistry;

/// Registry with every built-in handler registered.
pub fn builtin_registry() -> HandlerRegistry<String, String, String> {
    let mut registry = HandlerRegistry::new();
    register_builtins(&mut registry);
    registry
}

pub fn register_builtins(registry: &mut HandlerRegistry<String, String, String>) {
    registry
        .register("shell", shell)
        .register("echo", echo)
        .register("sleep", sleep);
}

/// Run the payload as a shell command.
///
/// Completes with trimmed stdout on exit status 0; otherwise fails with the
/// exit code and trimmed stderr.
pub async fn shell(cmd: String) -> Result<String, String> {
    run_shell(&cmd).await.map_err(|e| format!("{e:#}"))
}

async fn run_shell(cmd: &str) -> anyhow::Result<String> {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = command
        .output()
        .await
        .with_context(|| format!("spawning process for '{cmd}'"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    for line in stderr.lines() {
        debug!(cmd = %cmd, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    info!(cmd = %cmd, exit_code = code, "shell command exited");

    if output.status.success() {
        Ok(stdout)
    } else if stderr.is_empty() {
        anyhow::bail!("command exited with code {code}")
    } else {
        anyhow::bail!("command exited with code {code}: {stderr}")
    }
}

/// Complete immediately with the payload.
pub async fn echo(message: String) -> Result<String, String> {
    info!(message = %message, "echo");
    Ok(message)
}

/// Sleep for the number of milliseconds given in the payload.
pub async fn sleep(millis: String) -> Result<String, String> {
    let ms: u64 = millis
        .trim()
        .parse()
        .map_err(|e| format!("invalid sleep duration '{millis}': {e}"))?;
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Ok(format!("slept {ms}ms"))
}

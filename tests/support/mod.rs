use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled `mapreg` binary for this test run.
pub fn mapreg_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mapreg"))
}

/// Scratch data directory; removed when the guard drops.
pub fn data_dir() -> TempDir {
    TempDir::new().expect("failed to allocate temp data dir")
}

/// `mapreg` command with a clean environment pointing at `data_dir`.
pub fn mapreg_cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::new(mapreg_binary());
    cmd.env_remove("MAPREG_LOG")
        .env_remove("MAPREG_DATA_DIR")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run a command that is expected to fail; returns its stderr.
pub fn run_failing(mut cmd: Command) -> Result<String> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        bail!(
            "command {:?} unexpectedly succeeded\nstdout: {}",
            cmd,
            String::from_utf8_lossy(&output.stdout)
        );
    }
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).context("stdout was not valid JSON")
}

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::instrument;

use super::DriverError;

/// Runs the `qbe` backend over an SSA file, producing target assembly.
#[instrument(level = "debug")]
pub fn assemble(input: &Path, output: &Path) -> Result<(), DriverError> {
    let mut qbe = Command::new("qbe");
    qbe.arg("-o").arg(output).arg(input);
    run("qbe", &mut qbe)
}

/// Links assembly or object files into an executable with the system C
/// compiler, which also brings in libc for `printf`.
#[instrument(level = "debug")]
pub fn link_binary(objects: &[PathBuf], output_filename: &Path) -> Result<(), DriverError> {
    let mut cc = Command::new("cc");
    cc.arg("-o").arg(output_filename).args(objects);
    run("cc", &mut cc)
}

/// Whether `tool` can be spawned from the current `PATH`.
pub fn is_available(tool: &str) -> bool {
    Command::new(tool).arg("-h").output().is_ok()
}

fn run(tool: &'static str, command: &mut Command) -> Result<(), DriverError> {
    let output = command
        .output()
        .map_err(|source| DriverError::ToolNotFound { tool, source })?;
    tracing::debug!("{} result ok: {}", tool, output.status.success());

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::error!("{} error:\n{}", tool, stderr);
        return Err(DriverError::Toolchain { tool, stderr });
    }
    Ok(())
}

use std::{
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use stackc::compile_unit_info::CompileUnitInfo;
use stackc::driver::{build, linker, program::parse_program};
use stackc::ir::FunctionDef;
use tempfile::TempDir;

#[derive(Debug)]
pub struct CompileResult {
    #[allow(unused)]
    pub folder: TempDir,
    pub binary_file: PathBuf,
}

/// Whether the external backend and linker are installed.
///
/// With `STACKC_E2E` set a missing tool fails the test instead of skipping it.
#[track_caller]
pub fn toolchain_available() -> bool {
    let available = linker::is_available("qbe") && linker::is_available("cc");
    if !available {
        if std::env::var_os("STACKC_E2E").is_some() {
            panic!("STACKC_E2E is set but qbe or cc is not installed");
        }
        eprintln!(
            "SKIPPED {}: qbe or cc not found, nothing was run",
            std::panic::Location::caller()
        );
    }
    available
}

/// Builds the functions into an executable, with `output_file` set to a
/// fresh temporary directory.
pub fn compile_functions(
    functions: &[FunctionDef],
    name: &str,
    session: CompileUnitInfo,
) -> Result<CompileResult, Box<dyn std::error::Error>> {
    let test_dir = tempfile::tempdir()?;
    let session = CompileUnitInfo {
        output_file: test_dir.path().join(name),
        ..session
    };

    let binary_file = build(&session, functions, false)?;

    Ok(CompileResult {
        folder: test_dir,
        binary_file,
    })
}

pub fn compile_program(source: &str, name: &str) -> Result<CompileResult, Box<dyn std::error::Error>> {
    let functions = parse_program(source)?;
    compile_functions(&functions, name, CompileUnitInfo::default())
}

pub fn run_program(program: &Path) -> Result<Output, std::io::Error> {
    std::process::Command::new(program)
        .stdout(Stdio::piped())
        .spawn()?
        .wait_with_output()
}

/// Compiles and runs the program, returning its exit code, or `None` when the
/// toolchain is missing.
#[track_caller]
pub fn compile_and_run(source: &str, name: &str) -> Option<i32> {
    if !toolchain_available() {
        return None;
    }
    let result = compile_program(source, name).expect("failed to compile");
    let output = run_program(&result.binary_file).expect("failed to run");

    output.status.code()
}

#[allow(unused)] // false positive
#[track_caller]
pub fn compile_and_run_output(source: &str, name: &str) -> Option<String> {
    if !toolchain_available() {
        return None;
    }
    let result = compile_program(source, name).expect("failed to compile");
    let output = run_program(&result.binary_file).expect("failed to run");

    Some(String::from_utf8_lossy(&output.stdout).to_string())
}

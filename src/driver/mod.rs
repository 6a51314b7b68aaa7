use std::{io, path::PathBuf, process::ExitCode, time::Instant};

use anyhow::Context;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::{
    check::{CheckError, Listing, check_error_to_report},
    codegen::errors::CodegenError,
    compile_unit_info::CompileUnitInfo,
    ir::FunctionDef,
};
use config::Config;

pub mod config;
pub mod linker;
pub mod program;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error("invalid program file: {0}")]
    Program(#[from] toml::de::Error),
    #[error("invalid config file: {0}")]
    Config(toml::de::Error),
    #[error("failed to run {tool}: {source}")]
    ToolNotFound {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} failed:\n{stderr}")]
    Toolchain { tool: &'static str, stderr: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// The verification failure behind this error, if it is one.
    pub fn as_check_error(&self) -> Option<&CheckError> {
        match self {
            DriverError::Check(error) | DriverError::Codegen(CodegenError::Check(error)) => {
                Some(error)
            }
            _ => None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CompilerArgs {
    /// The program file.
    input: PathBuf,

    /// The output executable, defaults to the input file name without extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The project config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only write the SSA text, don't run the backend.
    #[arg(long, default_value_t = false)]
    emit_ssa: bool,

    /// Keep the assembly produced by the backend.
    #[arg(long, default_value_t = false)]
    emit_asm: bool,

    /// Build as a library: no entry point needed and nothing is linked.
    #[arg(short, long, default_value_t = false)]
    library: bool,

    /// Size of the runtime stack in bytes.
    #[arg(long)]
    stack_capacity: Option<usize>,

    /// Abort on runtime stack overflow.
    #[arg(long, default_value_t = false)]
    bounds_check: bool,
}

pub fn main() -> anyhow::Result<ExitCode> {
    let start_time = Instant::now();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = CompilerArgs::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    tracing::debug!("program file:\n{}", source);

    let output_file = match (&args.output, &config.package.name) {
        (Some(output), _) => output.clone(),
        (None, Some(name)) => args.input.with_file_name(name),
        (None, None) => args.input.with_extension(""),
    };
    tracing::debug!("Output file: {:?}", output_file);

    let session = CompileUnitInfo {
        stack_capacity: args
            .stack_capacity
            .unwrap_or(config.runtime.stack_capacity),
        bounds_check: args.bounds_check || config.runtime.bounds_check,
        library: args.library,
        output_file,
        output_asm: args.emit_asm,
        ..CompileUnitInfo::default()
    };
    tracing::debug!("Compiling with session: {:#?}", session);

    let functions = match program::parse_program(&source) {
        Ok(functions) => functions,
        Err(error) => return report(error, &[]),
    };

    if let Err(error) = build(&session, &functions, args.emit_ssa) {
        return report(error, &functions);
    }

    tracing::debug!("Done in {:?}", start_time.elapsed());
    Ok(ExitCode::SUCCESS)
}

/// Translates the program and, unless only SSA is wanted, runs it through the
/// backend and the linker.
///
/// The SSA file is always written, since the backend reads it.
pub fn build(
    session: &CompileUnitInfo,
    functions: &[FunctionDef],
    emit_ssa_only: bool,
) -> Result<PathBuf, DriverError> {
    let ssa_file = session.output_file.with_extension("ssa");
    let session = CompileUnitInfo {
        output_ssa: true,
        ..session.clone()
    };
    crate::codegen::compile(&session, functions)?;
    if emit_ssa_only {
        return Ok(ssa_file);
    }

    let asm_file = session.output_file.with_extension("s");
    linker::assemble(&ssa_file, &asm_file)?;
    if session.library {
        return Ok(asm_file);
    }

    let binary_file = session.output_file.clone();
    linker::link_binary(&[asm_file.clone()], &binary_file)?;
    if !session.output_asm {
        std::fs::remove_file(&asm_file)?;
    }

    Ok(binary_file)
}

/// Prints the error, as a source report when it is a check error.
fn report(error: DriverError, functions: &[FunctionDef]) -> anyhow::Result<ExitCode> {
    let Some(check_error) = error.as_check_error() else {
        return Err(error.into());
    };

    let mut candidates = functions
        .iter()
        .filter(|def| Some(def.name.as_str()) == check_error.function());
    let first = candidates.next();
    let def = match check_error {
        // The second definition is the offending one.
        CheckError::DuplicateDefinition { .. } => candidates.next().or(first),
        _ => first,
    };

    match def {
        Some(def) => {
            let listing = Listing::new(def);
            check_error_to_report(check_error, &listing)
                .eprint((def.name.clone(), listing.source()))?;
        }
        None => eprintln!("error: {check_error}"),
    }

    Ok(ExitCode::FAILURE)
}

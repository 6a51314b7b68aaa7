use std::time::Instant;

use crate::{check::CheckError, compile_unit_info::CompileUnitInfo, ir::FunctionDef};
use errors::CodegenError;
use tracing::{debug, info};

pub mod builtins;
pub mod errors;
mod function;
pub mod registry;
pub mod runtime;

pub use registry::Registry;

/// Verifies the functions in order and returns the program text: the runtime
/// prelude followed by one routine per function.
///
/// Stops at the first function that fails verification; nothing is returned
/// or written in that case.
pub fn compile(info: &CompileUnitInfo, functions: &[FunctionDef]) -> Result<String, CodegenError> {
    let start_time = Instant::now();
    info!("compiling {} functions", functions.len());

    if !CompileUnitInfo::is_valid_stack_capacity(info.stack_capacity) {
        return Err(CodegenError::InvalidStackCapacity(info.stack_capacity));
    }

    let mut registry = Registry::new(info);
    for def in functions {
        registry.define_function(def)?;
    }

    if !info.library && !registry.has_entry_point() {
        Err(CheckError::MissingEntryPoint)?;
    }

    let asm = registry.finish();

    if info.output_ssa {
        let path = info.output_file.with_extension("ssa");
        debug!("writing {}", path.display());
        std::fs::write(path, &asm)?;
    }

    debug!("Codegen time {:?}", start_time.elapsed());
    Ok(asm)
}

use std::path::PathBuf;

use crate::codegen::runtime::WORD_SIZE;

/// Default size in bytes of the runtime value stack buffer.
pub const DEFAULT_STACK_CAPACITY: usize = 4096;

/// This struct holds the information needed to translate one program,
/// like the runtime stack layout and which artifacts to write.
#[derive(Debug, Clone)]
pub struct CompileUnitInfo {
    /// Size in bytes of the runtime stack buffer.
    pub stack_capacity: usize,
    /// Whether pushes past the end of the runtime stack abort the program.
    /// When false, overflowing the buffer is undefined behaviour.
    pub bounds_check: bool,
    /// True if no entry point is required.
    pub library: bool,
    /// The file where to put the compilation result.
    /// The file name is reused for the intermediate artifacts.
    pub output_file: PathBuf,
    /// Whether to write the generated SSA text next to the output file.
    pub output_ssa: bool,
    /// Whether to keep the assembly produced by the backend.
    pub output_asm: bool,
}

impl Default for CompileUnitInfo {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            bounds_check: false,
            library: false,
            output_file: PathBuf::from("a.out"),
            output_ssa: false,
            output_asm: false,
        }
    }
}

impl CompileUnitInfo {
    /// Capacities must hold a whole number of stack words.
    pub fn is_valid_stack_capacity(capacity: usize) -> bool {
        capacity > 0 && capacity % WORD_SIZE == 0
    }
}

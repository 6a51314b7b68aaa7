use std::collections::HashMap;

use itertools::Itertools;
use tracing::{debug, instrument};

use super::{builtins::Builtin, function::FunctionAssembler, runtime};
use crate::{
    check::CheckError,
    compile_unit_info::CompileUnitInfo,
    ir::{FunctionDef, Op, StackEffect, TypeDescriptor},
};

/// The callable names of one translation and the routines emitted so far.
///
/// Starts out holding the builtins. Every defined function adds its effect,
/// so only functions defined earlier (or the function itself) can be called.
#[derive(Debug, Clone)]
pub struct Registry {
    stack_capacity: usize,
    bounds_check: bool,
    effects: HashMap<String, StackEffect>,
    /// Emitted user routines, in definition order.
    functions: Vec<String>,
    has_entry_point: bool,
}

impl Registry {
    pub fn new(info: &CompileUnitInfo) -> Self {
        let effects = Builtin::ALL
            .into_iter()
            .map(|builtin| (builtin.name().to_string(), builtin.effect()))
            .collect();

        Self {
            stack_capacity: info.stack_capacity,
            bounds_check: info.bounds_check,
            effects,
            functions: Vec::new(),
            has_entry_point: false,
        }
    }

    pub fn effect_of(&self, name: &str) -> Option<&StackEffect> {
        self.effects.get(name)
    }

    /// Builds a call to a registered name with its registered effect.
    pub fn call(&self, name: &str) -> Option<Op> {
        let effect = self.effect_of(name)?.clone();
        Some(Op::call(name, effect))
    }

    pub fn has_entry_point(&self) -> bool {
        self.has_entry_point
    }

    /// Registers the function, verifies its body and emits its routine.
    ///
    /// On error nothing is registered or emitted.
    #[instrument(level = "debug", skip_all, fields(name = ?def.name))]
    pub fn define_function(&mut self, def: &FunctionDef) -> Result<(), CheckError> {
        check_name(&def.name)?;

        if self.effects.contains_key(&def.name) {
            return Err(CheckError::DuplicateDefinition {
                name: def.name.clone(),
            });
        }

        if def.is_entry_point() && (!def.entry.is_empty() || def.exit != [TypeDescriptor::int()]) {
            return Err(CheckError::SignatureError {
                function: def.name.clone(),
                found: def.effect(),
            });
        }

        // Registered before assembling so the function can call itself.
        self.effects.insert(def.name.clone(), def.effect());

        let assembled = FunctionAssembler::new(def, &self.effects).assemble();
        match assembled {
            Ok(asm) => {
                debug!("defined {} {}", def.name, def.effect());
                self.has_entry_point |= def.is_entry_point();
                self.functions.push(asm);
                Ok(())
            }
            Err(error) => {
                self.effects.remove(&def.name);
                Err(error)
            }
        }
    }

    /// The runtime prelude followed by every emitted routine.
    pub fn finish(self) -> String {
        std::iter::once(runtime::prelude(self.stack_capacity, self.bounds_check))
            .chain(self.functions)
            .join("\n")
    }
}

fn check_name(name: &str) -> Result<(), CheckError> {
    let reason = if name.is_empty() {
        "function names can't be empty"
    } else if name.starts_with("__") {
        "names starting with `__` are reserved for the runtime"
    } else if runtime::LIBC_SYMBOLS.contains(&name) {
        "the runtime links against this C library function"
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        "only ASCII letters, digits, '_' and '.' are allowed"
    } else {
        return Ok(());
    };

    Err(CheckError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

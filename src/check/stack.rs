use std::collections::{HashMap, hash_map::Entry};

use thiserror::Error;
use tracing::trace;

use crate::ir::{GenericId, StackEffect, StackSlot, TypeDescriptor};

/// A verification failure of one effect against one stack, without knowing
/// which function or operation it came from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("effect needs {needs} values but the stack holds {available}")]
    Underflow { needs: usize, available: usize },
    #[error("expected '{expected}', found '{found}'")]
    Mismatch {
        slot: usize,
        expected: TypeDescriptor,
        found: TypeDescriptor,
    },
    #[error("different types for same generic T{generic}: bound to '{bound}', found '{found}'")]
    GenericConflict {
        slot: usize,
        generic: GenericId,
        bound: TypeDescriptor,
        found: TypeDescriptor,
    },
    #[error("generic T{generic} is produced but never bound by an input")]
    Unbound { generic: GenericId },
}

/// Compile time mirror of the runtime stack: the types of the values it holds,
/// deepest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbstractStack {
    slots: Vec<TypeDescriptor>,
}

impl AbstractStack {
    /// A stack that already holds the given values.
    pub fn new(entry: &[TypeDescriptor]) -> Self {
        Self {
            slots: entry.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn as_slice(&self) -> &[TypeDescriptor] {
        &self.slots
    }

    /// Checks the effect inputs against the top of the stack and replaces them
    /// with the effect outputs.
    ///
    /// Generics are bound to the concrete type found at their first input slot;
    /// the bindings only live for this call. On error the stack is left as it was.
    pub fn apply(&mut self, effect: &StackEffect) -> Result<(), EffectError> {
        if let Some(generic) = effect.unbound_generic() {
            return Err(EffectError::Unbound { generic });
        }

        let needs = effect.inputs.len();
        let available = self.slots.len();
        if needs > available {
            return Err(EffectError::Underflow { needs, available });
        }

        let base = available - needs;
        let bindings = bind_inputs(&effect.inputs, &self.slots[base..])?;
        self.slots.truncate(base);

        for slot in &effect.outputs {
            let ty = match slot {
                StackSlot::Concrete(ty) => *ty,
                StackSlot::Generic(generic) => *bindings
                    .get(generic)
                    .ok_or(EffectError::Unbound { generic: *generic })?,
            };
            self.slots.push(ty);
        }

        trace!("stack after {effect}: {:?}", self.slots);
        Ok(())
    }
}

fn bind_inputs(
    inputs: &[StackSlot],
    args: &[TypeDescriptor],
) -> Result<HashMap<GenericId, TypeDescriptor>, EffectError> {
    let mut bindings = HashMap::new();

    for (slot, (input, found)) in inputs.iter().zip(args).enumerate() {
        match input {
            StackSlot::Concrete(expected) => {
                if expected != found {
                    return Err(EffectError::Mismatch {
                        slot,
                        expected: *expected,
                        found: *found,
                    });
                }
            }
            StackSlot::Generic(generic) => match bindings.entry(*generic) {
                Entry::Vacant(entry) => {
                    entry.insert(*found);
                }
                Entry::Occupied(entry) => {
                    if entry.get() != found {
                        return Err(EffectError::GenericConflict {
                            slot,
                            generic: *generic,
                            bound: *entry.get(),
                            found: *found,
                        });
                    }
                }
            },
        }
    }

    Ok(bindings)
}

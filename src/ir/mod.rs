use std::{borrow::Cow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::check::Listing;

/// Name of the function whose routine returns the program result.
pub const ENTRY_POINT: &str = "main";

/// Placeholder for a type inside a single stack effect declaration.
pub type GenericId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaseType {
    Byte,
    Bool,
    Int,
}

impl BaseType {
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Bool => "bool",
            BaseType::Int => "int",
        }
    }
}

/// A primitive value type, optionally behind some levels of pointer indirection.
///
/// Two descriptors are the same type only if both the base and the depth match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeDescriptor {
    pub base: BaseType,
    pub pointer_depth: u32,
}

impl TypeDescriptor {
    pub const fn new(base: BaseType) -> Self {
        Self {
            base,
            pointer_depth: 0,
        }
    }

    pub const fn int() -> Self {
        Self::new(BaseType::Int)
    }

    pub const fn bool() -> Self {
        Self::new(BaseType::Bool)
    }

    pub const fn byte() -> Self {
        Self::new(BaseType::Byte)
    }

    /// A pointer to this type.
    pub const fn pointer(self) -> Self {
        Self {
            base: self.base,
            pointer_depth: self.pointer_depth + 1,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.pointer_depth {
            f.write_str("*")?;
        }
        f.write_str(self.base.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized type {input:?}")]
pub struct ParseTypeError {
    pub input: String,
}

impl FromStr for TypeDescriptor {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let base_name = trimmed.trim_start_matches('*');
        let pointer_depth = (trimmed.len() - base_name.len()) as u32;

        let base = match base_name {
            "byte" => BaseType::Byte,
            "bool" => BaseType::Bool,
            "int" => BaseType::Int,
            _ => {
                return Err(ParseTypeError {
                    input: s.to_string(),
                });
            }
        };

        Ok(Self {
            base,
            pointer_depth,
        })
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = ParseTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}

/// One position of a stack effect: a concrete type or a generic placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackSlot {
    Concrete(TypeDescriptor),
    Generic(GenericId),
}

impl From<TypeDescriptor> for StackSlot {
    fn from(value: TypeDescriptor) -> Self {
        StackSlot::Concrete(value)
    }
}

impl fmt::Display for StackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackSlot::Concrete(ty) => write!(f, "{ty}"),
            StackSlot::Generic(id) => write!(f, "T{id}"),
        }
    }
}

/// How an operation or function transforms the top of the stack.
///
/// Both lists are ordered deepest first, so the last input is the current top
/// of the stack and the last output becomes the new top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StackEffect {
    pub inputs: Vec<StackSlot>,
    pub outputs: Vec<StackSlot>,
}

impl StackEffect {
    pub fn new(inputs: Vec<StackSlot>, outputs: Vec<StackSlot>) -> Self {
        Self { inputs, outputs }
    }

    /// The effect of a function declared with the given entry and exit stacks.
    pub fn from_types(inputs: &[TypeDescriptor], outputs: &[TypeDescriptor]) -> Self {
        Self {
            inputs: inputs.iter().copied().map(StackSlot::from).collect(),
            outputs: outputs.iter().copied().map(StackSlot::from).collect(),
        }
    }

    /// Returns the first generic used by the outputs that no input binds.
    pub fn unbound_generic(&self) -> Option<GenericId> {
        self.outputs.iter().find_map(|slot| match slot {
            StackSlot::Generic(id) if !self.inputs.contains(slot) => Some(*id),
            _ => None,
        })
    }
}

impl fmt::Display for StackEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for slot in &self.inputs {
            write!(f, " {slot}")?;
        }
        f.write_str(" --")?;
        for slot in &self.outputs {
            write!(f, " {slot}")?;
        }
        f.write_str(" )")
    }
}

/// A single operation in a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Pushes an immediate value of the given type.
    Push { value: i64, ty: TypeDescriptor },
    /// Calls a builtin or a previously defined function.
    Call { name: String, effect: StackEffect },
}

impl Op {
    /// Pushes an `int` immediate.
    pub fn push(value: i64) -> Self {
        Op::Push {
            value,
            ty: TypeDescriptor::int(),
        }
    }

    pub fn push_typed(value: i64, ty: TypeDescriptor) -> Self {
        Op::Push { value, ty }
    }

    pub fn call(name: impl Into<String>, effect: StackEffect) -> Self {
        Op::Call {
            name: name.into(),
            effect,
        }
    }

    pub fn effect(&self) -> Cow<'_, StackEffect> {
        match self {
            Op::Push { ty, .. } => Cow::Owned(StackEffect::new(Vec::new(), vec![(*ty).into()])),
            Op::Call { effect, .. } => Cow::Borrowed(effect),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push { value, ty } if *ty == TypeDescriptor::int() => write!(f, "{value}"),
            Op::Push { value, ty } => write!(f, "{value}:{ty}"),
            Op::Call { name, .. } => f.write_str(name),
        }
    }
}

/// A user function: its declared stack shape on entry and exit, and its body.
///
/// The entry and exit stacks describe what the function expects to find on and
/// leave on the shared runtime stack; emitted routines take no parameters and
/// return nothing (except the entry point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub entry: Vec<TypeDescriptor>,
    pub exit: Vec<TypeDescriptor>,
    pub body: Vec<Op>,
}

impl FunctionDef {
    pub fn new(
        name: impl Into<String>,
        entry: Vec<TypeDescriptor>,
        exit: Vec<TypeDescriptor>,
        body: Vec<Op>,
    ) -> Self {
        Self {
            name: name.into(),
            entry,
            exit,
            body,
        }
    }

    pub fn effect(&self) -> StackEffect {
        StackEffect::from_types(&self.entry, &self.exit)
    }

    pub fn is_entry_point(&self) -> bool {
        self.name == ENTRY_POINT
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Listing::new(self).text)
    }
}

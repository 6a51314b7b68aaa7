use std::fmt;

use thiserror::Error;

use super::stack::EffectError;
use crate::ir::{GenericId, StackEffect, TypeDescriptor};

/// Where in a function definition a check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// The declared entry/exit stacks.
    Signature,
    /// The operation at this index of the body.
    Op(usize),
    /// The declared exit stack, checked after the last operation.
    Exit,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Signature => f.write_str("signature"),
            Location::Op(index) => write!(f, "operation #{index}"),
            Location::Exit => f.write_str("function exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Imbalance {
    /// Fewer values on the stack than the effect consumes.
    Underflow,
    /// Values left over once the declared exit stack is consumed.
    Leftover,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("function {name:?} defined twice")]
    DuplicateDefinition { name: String },
    #[error("invalid function name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("undefined function {name:?} called in {function:?} at {location}")]
    UndefinedReference {
        function: String,
        location: Location,
        name: String,
    },
    #[error("call to {name:?} in {function:?} at {location} declares {declared}, but it is defined as {registered}")]
    EffectMismatch {
        function: String,
        location: Location,
        name: String,
        declared: StackEffect,
        registered: StackEffect,
    },
    #[error("type mismatch in {function:?} at {location}: expected '{expected}', found '{found}'")]
    TypeMismatch {
        function: String,
        location: Location,
        expected: TypeDescriptor,
        found: TypeDescriptor,
        /// Set when `expected` comes from an earlier binding of this generic.
        generic: Option<GenericId>,
    },
    #[error("generic T{generic} in {function:?} at {location} is never bound by an input")]
    UnboundGeneric {
        function: String,
        location: Location,
        generic: GenericId,
    },
    #[error("stack imbalance in {function:?} at {location}: expected {expected} values, found {found}")]
    StackImbalance {
        function: String,
        location: Location,
        kind: Imbalance,
        expected: usize,
        found: usize,
    },
    #[error("entry point {function:?} must have effect ( -- int ), found {found}")]
    SignatureError { function: String, found: StackEffect },
    #[error("no entry point function defined")]
    MissingEntryPoint,
}

impl CheckError {
    /// The function the error was found in, if any.
    pub fn function(&self) -> Option<&str> {
        match self {
            CheckError::DuplicateDefinition { name } | CheckError::InvalidName { name, .. } => {
                Some(name)
            }
            CheckError::UndefinedReference { function, .. }
            | CheckError::EffectMismatch { function, .. }
            | CheckError::TypeMismatch { function, .. }
            | CheckError::UnboundGeneric { function, .. }
            | CheckError::StackImbalance { function, .. }
            | CheckError::SignatureError { function, .. } => Some(function),
            CheckError::MissingEntryPoint => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            CheckError::UndefinedReference { location, .. }
            | CheckError::EffectMismatch { location, .. }
            | CheckError::TypeMismatch { location, .. }
            | CheckError::UnboundGeneric { location, .. }
            | CheckError::StackImbalance { location, .. } => Some(*location),
            CheckError::SignatureError { .. } => Some(Location::Signature),
            CheckError::DuplicateDefinition { .. }
            | CheckError::InvalidName { .. }
            | CheckError::MissingEntryPoint => None,
        }
    }
}

impl EffectError {
    /// Attaches the function and location the effect was applied at.
    pub fn in_function(self, function: &str, location: Location) -> CheckError {
        let function = function.to_string();
        match self {
            EffectError::Underflow { needs, available } => CheckError::StackImbalance {
                function,
                location,
                kind: Imbalance::Underflow,
                expected: needs,
                found: available,
            },
            EffectError::Mismatch {
                expected, found, ..
            } => CheckError::TypeMismatch {
                function,
                location,
                expected,
                found,
                generic: None,
            },
            EffectError::GenericConflict {
                generic,
                bound,
                found,
                ..
            } => CheckError::TypeMismatch {
                function,
                location,
                expected: bound,
                found,
                generic: Some(generic),
            },
            EffectError::Unbound { generic } => CheckError::UnboundGeneric {
                function,
                location,
                generic,
            },
        }
    }
}

//! TOML serialization of a program's functions, for the command line driver.
//!
//! ```toml
//! [[function]]
//! name = "main"
//! exit = ["int"]
//! body = [69, 60, "sub"]
//! ```
//!
//! Body items are an integer (push an `int`), a name (call it), or the tables
//! `{ push = 1, type = "bool" }` and `{ call = "name" }`.

use std::collections::HashMap;

use serde::Deserialize;

use super::DriverError;
use crate::{
    check::{CheckError, Location},
    codegen::builtins::Builtin,
    ir::{FunctionDef, Op, StackEffect, TypeDescriptor},
};

#[derive(Debug, Deserialize)]
pub struct ProgramFile {
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionEntry {
    pub name: String,
    #[serde(default)]
    pub entry: Vec<TypeDescriptor>,
    #[serde(default)]
    pub exit: Vec<TypeDescriptor>,
    #[serde(default)]
    pub body: Vec<OpEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OpEntry {
    Int(i64),
    Word(String),
    Push {
        push: i64,
        #[serde(rename = "type", default = "TypeDescriptor::int")]
        ty: TypeDescriptor,
    },
    Call {
        call: String,
    },
}

/// Reads the functions of a program file, in order.
///
/// Calls take the effect declared by the builtin or function of that name
/// anywhere in the file; whether the callee is defined early enough is left to
/// verification.
pub fn parse_program(source: &str) -> Result<Vec<FunctionDef>, DriverError> {
    let file: ProgramFile = toml::from_str(source)?;

    let mut effects: HashMap<&str, StackEffect> = Builtin::ALL
        .into_iter()
        .map(|builtin| (builtin.name(), builtin.effect()))
        .collect();
    for function in &file.functions {
        effects
            .entry(function.name.as_str())
            .or_insert_with(|| StackEffect::from_types(&function.entry, &function.exit));
    }

    let mut functions = Vec::with_capacity(file.functions.len());
    for function in &file.functions {
        let mut body = Vec::with_capacity(function.body.len());

        for (index, entry) in function.body.iter().enumerate() {
            let op = match entry {
                OpEntry::Int(value) => Op::push(*value),
                OpEntry::Push { push, ty } => Op::push_typed(*push, *ty),
                OpEntry::Word(name) | OpEntry::Call { call: name } => {
                    let effect = effects.get(name.as_str()).ok_or_else(|| {
                        CheckError::UndefinedReference {
                            function: function.name.clone(),
                            location: Location::Op(index),
                            name: name.clone(),
                        }
                    })?;
                    Op::call(name.as_str(), effect.clone())
                }
            };
            body.push(op);
        }

        functions.push(FunctionDef::new(
            function.name.as_str(),
            function.entry.clone(),
            function.exit.clone(),
            body,
        ));
    }

    Ok(functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: TypeDescriptor = TypeDescriptor::int();

    #[test]
    fn parse_subtract() {
        let functions = parse_program(
            r#"
[[function]]
name = "main"
exit = ["int"]
body = [69, 60, "sub"]
"#,
        )
        .unwrap();

        assert_eq!(
            functions,
            vec![FunctionDef::new(
                "main",
                vec![],
                vec![INT],
                vec![
                    Op::push(69),
                    Op::push(60),
                    Op::call("sub", Builtin::Sub.effect())
                ],
            )]
        );
    }

    #[test]
    fn typed_pushes_and_user_calls() {
        let functions = parse_program(
            r#"
[[function]]
name = "keep"
entry = ["int", "*bool"]
exit = ["int"]
body = ["drop"]

[[function]]
name = "main"
exit = ["int"]
body = [3, { push = 0, type = "*bool" }, { call = "keep" }]
"#,
        )
        .unwrap();

        assert_eq!(functions[0].entry, vec![INT, TypeDescriptor::bool().pointer()]);
        assert_eq!(
            functions[1].body,
            vec![
                Op::push(3),
                Op::push_typed(0, TypeDescriptor::bool().pointer()),
                Op::call(
                    "keep",
                    StackEffect::from_types(&[INT, TypeDescriptor::bool().pointer()], &[INT])
                ),
            ]
        );
    }

    #[test]
    fn unknown_name() {
        let error = parse_program(
            r#"
[[function]]
name = "main"
exit = ["int"]
body = [1, "nope"]
"#,
        )
        .unwrap_err();

        assert!(matches!(
            error,
            DriverError::Check(CheckError::UndefinedReference { location: Location::Op(1), ref name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn unknown_type() {
        let error = parse_program(
            r#"
[[function]]
name = "main"
exit = ["float"]
"#,
        )
        .unwrap_err();
        assert!(matches!(error, DriverError::Program(_)));
    }
}

use std::collections::HashMap;

use tracing::debug;

use crate::{
    check::{AbstractStack, CheckError, Imbalance, Location},
    ir::{FunctionDef, Op, StackEffect},
};

/// Verifies and emits a single function.
///
/// The abstract stack starts out holding the declared entry stack. Each
/// operation is checked against it and then emitted; at the end the declared
/// exit stack must be exactly what is left.
pub(crate) struct FunctionAssembler<'a> {
    def: &'a FunctionDef,
    effects: &'a HashMap<String, StackEffect>,
    stack: AbstractStack,
    asm: String,
    next_temp: usize,
}

impl<'a> FunctionAssembler<'a> {
    pub fn new(def: &'a FunctionDef, effects: &'a HashMap<String, StackEffect>) -> Self {
        let ret = if def.is_entry_point() { "l " } else { "" };
        Self {
            def,
            effects,
            stack: AbstractStack::new(&def.entry),
            asm: format!("export function {ret}${}() {{\n@start\n", def.name),
            next_temp: 0,
        }
    }

    /// Consumes the assembler, returning the emitted routine.
    pub fn assemble(mut self) -> Result<String, CheckError> {
        let def = self.def;
        for (index, op) in def.body.iter().enumerate() {
            self.compile_op(Location::Op(index), op)?;
        }
        self.finish()
    }

    fn compile_op(&mut self, location: Location, op: &Op) -> Result<(), CheckError> {
        let effects = self.effects;
        let registered = match op {
            Op::Call { name, .. } => {
                Some(
                    effects
                        .get(name)
                        .ok_or_else(|| CheckError::UndefinedReference {
                            function: self.def.name.clone(),
                            location,
                            name: name.clone(),
                        })?,
                )
            }
            Op::Push { .. } => None,
        };

        self.stack
            .apply(&op.effect())
            .map_err(|e| e.in_function(&self.def.name, location))?;
        debug!("{location}: {op} -> {:?}", self.stack.as_slice());

        if let (Some(registered), Op::Call { name, effect }) = (registered, op) {
            if registered != effect {
                return Err(CheckError::EffectMismatch {
                    function: self.def.name.clone(),
                    location,
                    name: name.clone(),
                    declared: effect.clone(),
                    registered: registered.clone(),
                });
            }
        }

        match op {
            Op::Push { value, .. } => self.emit(&format!("call $__stack_push(l {value})")),
            Op::Call { name, .. } => self.emit(&format!("call ${name}()")),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<String, CheckError> {
        let expected = self.def.exit.len();
        let found = self.stack.len();
        let exit = StackEffect::from_types(&self.def.exit, &[]);

        self.stack
            .apply(&exit)
            .map_err(|e| e.in_function(&self.def.name, Location::Exit))?;
        if !self.stack.is_empty() {
            return Err(CheckError::StackImbalance {
                function: self.def.name.clone(),
                location: Location::Exit,
                kind: Imbalance::Leftover,
                expected,
                found,
            });
        }

        if self.def.is_entry_point() {
            self.emit("@ret");
            let result = self.temp();
            self.emit(&format!("{result} =l call $__stack_pop()"));
            self.emit(&format!("ret {result}"));
        } else {
            self.emit("ret");
        }

        self.asm.push_str("}\n");
        Ok(self.asm)
    }

    fn emit(&mut self, inst: &str) {
        if !inst.starts_with('@') {
            self.asm.push_str("    ");
        }
        self.asm.push_str(inst);
        self.asm.push('\n');
    }

    fn temp(&mut self) -> String {
        let temp = format!("%i{}", self.next_temp);
        self.next_temp += 1;
        temp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codegen::builtins::Builtin, ir::TypeDescriptor};

    const INT: TypeDescriptor = TypeDescriptor::int();

    fn builtin_effects() -> HashMap<String, StackEffect> {
        Builtin::ALL
            .into_iter()
            .map(|builtin| (builtin.name().to_string(), builtin.effect()))
            .collect()
    }

    fn call(name: &str) -> Op {
        let builtin = Builtin::from_name(name).unwrap();
        Op::call(name, builtin.effect())
    }

    #[test]
    fn entry_point_returns_popped_value() {
        let effects = builtin_effects();
        let def = FunctionDef::new(
            "main",
            vec![],
            vec![INT],
            vec![Op::push(69), Op::push(60), call("sub")],
        );

        let asm = FunctionAssembler::new(&def, &effects).assemble().unwrap();
        assert_eq!(
            asm,
            "export function l $main() {
@start
    call $__stack_push(l 69)
    call $__stack_push(l 60)
    call $sub()
@ret
    %i0 =l call $__stack_pop()
    ret %i0
}
"
        );
    }

    #[test]
    fn other_functions_return_nothing() {
        let effects = builtin_effects();
        let def = FunctionDef::new("square", vec![INT], vec![INT], vec![call("dup"), call("mul")]);

        let asm = FunctionAssembler::new(&def, &effects).assemble().unwrap();
        assert_eq!(
            asm,
            "export function $square() {\n@start\n    call $dup()\n    call $mul()\n    ret\n}\n"
        );
    }

    #[test]
    fn leftover_values() {
        let effects = builtin_effects();
        let def = FunctionDef::new("main", vec![], vec![INT], vec![Op::push(1), Op::push(2)]);

        let error = FunctionAssembler::new(&def, &effects)
            .assemble()
            .unwrap_err();
        assert_eq!(
            error,
            CheckError::StackImbalance {
                function: "main".to_string(),
                location: Location::Exit,
                kind: Imbalance::Leftover,
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn missing_exit_values() {
        let effects = builtin_effects();
        let def = FunctionDef::new("pair", vec![], vec![INT, INT], vec![Op::push(1)]);

        let error = FunctionAssembler::new(&def, &effects)
            .assemble()
            .unwrap_err();
        assert!(matches!(
            error,
            CheckError::StackImbalance {
                location: Location::Exit,
                kind: Imbalance::Underflow,
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn call_with_stale_effect() {
        let effects = builtin_effects();
        let def = FunctionDef::new(
            "f",
            vec![INT],
            vec![],
            vec![Op::call("drop", StackEffect::from_types(&[INT], &[]))],
        );

        let error = FunctionAssembler::new(&def, &effects)
            .assemble()
            .unwrap_err();
        assert!(matches!(
            error,
            CheckError::EffectMismatch { location: Location::Op(0), .. }
        ));
    }
}

use stackc::check::{CheckError, Imbalance, Location};
use stackc::codegen::{builtins::Builtin, compile, errors::CodegenError};
use stackc::compile_unit_info::CompileUnitInfo;
use stackc::driver::program::parse_program;
use stackc::ir::{FunctionDef, Op, StackEffect, StackSlot, TypeDescriptor};

const INT: TypeDescriptor = TypeDescriptor::int();

#[track_caller]
fn check_invalid_program(source: &str) -> CheckError {
    let functions = match parse_program(source) {
        Ok(functions) => functions,
        Err(error) => {
            return error
                .as_check_error()
                .cloned()
                .expect("program file should parse");
        }
    };
    check_invalid_functions(&functions)
}

#[track_caller]
fn check_invalid_functions(functions: &[FunctionDef]) -> CheckError {
    match compile(&CompileUnitInfo::default(), functions) {
        Ok(_) => panic!("program should fail verification"),
        Err(CodegenError::Check(error)) => error,
        Err(error) => panic!("unexpected error: {error}"),
    }
}

fn main_returning(body: Vec<Op>) -> FunctionDef {
    FunctionDef::new("main", vec![], vec![INT], body)
}

#[test]
fn duplicate_definition() {
    let error = check_invalid_program(include_str!("invalid_programs/duplicate.toml"));
    assert_eq!(
        error,
        CheckError::DuplicateDefinition {
            name: "helper".to_string()
        }
    );
}

#[test]
fn call_before_definition() {
    let error = check_invalid_program(include_str!(
        "invalid_programs/call_before_definition.toml"
    ));
    assert_eq!(
        error,
        CheckError::UndefinedReference {
            function: "main".to_string(),
            location: Location::Op(0),
            name: "answer".to_string(),
        }
    );
}

#[test]
fn type_mismatch() {
    let error = check_invalid_program(include_str!("invalid_programs/type_mismatch.toml"));
    assert_eq!(
        error,
        CheckError::TypeMismatch {
            function: "main".to_string(),
            location: Location::Op(2),
            expected: INT,
            found: TypeDescriptor::byte(),
            generic: None,
        }
    );
}

#[test]
fn leftover_values() {
    let error = check_invalid_program(include_str!("invalid_programs/leftover.toml"));
    assert!(matches!(
        error,
        CheckError::StackImbalance {
            location: Location::Exit,
            kind: Imbalance::Leftover,
            ..
        }
    ));
}

#[test]
fn underflow() {
    let error = check_invalid_program(include_str!("invalid_programs/underflow.toml"));
    assert!(matches!(
        error,
        CheckError::StackImbalance {
            location: Location::Op(1),
            kind: Imbalance::Underflow,
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn main_signature() {
    let error = check_invalid_program(include_str!("invalid_programs/main_signature.toml"));
    assert!(matches!(error, CheckError::SignatureError { .. }));
}

#[test]
fn wrong_exit_type() {
    let error = check_invalid_program(include_str!("invalid_programs/wrong_exit_type.toml"));
    assert!(matches!(
        error,
        CheckError::TypeMismatch {
            location: Location::Exit,
            ..
        }
    ));
}

#[test]
fn unbound_generic_output() {
    // Asks for a value of a type no input determines.
    let conjure = StackEffect::new(vec![StackSlot::Generic(0)], vec![StackSlot::Generic(1)]);
    let main = main_returning(vec![Op::push(1), Op::call("drop", conjure)]);

    let error = check_invalid_functions(&[main]);
    assert_eq!(
        error,
        CheckError::UnboundGeneric {
            function: "main".to_string(),
            location: Location::Op(1),
            generic: 1,
        }
    );
}

#[test]
fn generic_bound_twice() {
    let same_twice = StackEffect::new(
        vec![StackSlot::Generic(0), StackSlot::Generic(0)],
        vec![StackSlot::Generic(0)],
    );
    let pick = FunctionDef::new(
        "pick",
        vec![INT, INT],
        vec![INT],
        vec![Op::call("drop", Builtin::Drop.effect())],
    );
    let main = main_returning(vec![
        Op::push(1),
        Op::push_typed(1, TypeDescriptor::bool()),
        Op::call("pick", same_twice),
    ]);

    let error = check_invalid_functions(&[pick, main]);
    assert_eq!(
        error,
        CheckError::TypeMismatch {
            function: "main".to_string(),
            location: Location::Op(2),
            expected: INT,
            found: TypeDescriptor::bool(),
            generic: Some(0),
        }
    );
}

#[test]
fn stale_call_effect() {
    let answer = FunctionDef::new("answer", vec![], vec![INT], vec![Op::push(42)]);
    let main = main_returning(vec![Op::call(
        "answer",
        StackEffect::from_types(&[], &[TypeDescriptor::bool()]),
    )]);

    let error = check_invalid_functions(&[answer, main]);
    assert!(matches!(
        error,
        CheckError::EffectMismatch { ref name, .. } if name == "answer"
    ));
}

#[test]
fn reserved_name() {
    let error = check_invalid_functions(&[FunctionDef::new("__stack_pop", vec![], vec![], vec![])]);
    assert!(matches!(error, CheckError::InvalidName { .. }));
}

#[test]
fn runtime_libc_names_are_reserved() {
    for name in ["printf", "abort"] {
        let error = check_invalid_functions(&[FunctionDef::new(name, vec![], vec![], vec![])]);
        assert!(
            matches!(error, CheckError::InvalidName { name: ref found, .. } if found == name),
            "{name}"
        );
    }
}

#[test]
fn stack_capacity_checked_before_translation() {
    let info = CompileUnitInfo {
        stack_capacity: 12,
        bounds_check: true,
        ..CompileUnitInfo::default()
    };
    let main = main_returning(vec![Op::push(1)]);

    assert!(matches!(
        compile(&info, &[main]),
        Err(CodegenError::InvalidStackCapacity(12))
    ));
}

#[test]
fn builtin_cannot_be_redefined() {
    let error = check_invalid_functions(&[FunctionDef::new("swap", vec![], vec![], vec![])]);
    assert_eq!(
        error,
        CheckError::DuplicateDefinition {
            name: "swap".to_string()
        }
    );
}

#[test]
fn missing_entry_point() {
    let error = check_invalid_functions(&[FunctionDef::new("noop", vec![], vec![], vec![])]);
    assert_eq!(error, CheckError::MissingEntryPoint);
}

#[test]
fn library_needs_no_entry_point() {
    let info = CompileUnitInfo {
        library: true,
        ..CompileUnitInfo::default()
    };
    let helper = FunctionDef::new("noop", vec![], vec![], vec![]);

    let asm = compile(&info, &[helper]).unwrap();
    assert!(asm.contains("export function $noop() {"));
}

#[test]
fn failed_check_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let info = CompileUnitInfo {
        output_file: dir.path().join("broken"),
        output_ssa: true,
        ..CompileUnitInfo::default()
    };
    let main = main_returning(vec![Op::push(1), Op::push(2)]);

    assert!(compile(&info, &[main]).is_err());
    assert!(!dir.path().join("broken.ssa").exists());
}

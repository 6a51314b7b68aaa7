use crate::ir::{StackEffect, StackSlot, TypeDescriptor};

/// Primitive routines that are always emitted and registered before any user
/// function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Drop,
    Dup,
    Swap,
    Rot,
    Add,
    Sub,
    Mul,
    IDiv,
    UDiv,
    IRem,
    URem,
    PutD,
}

impl Builtin {
    pub const ALL: [Builtin; 12] = [
        Builtin::Drop,
        Builtin::Dup,
        Builtin::Swap,
        Builtin::Rot,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::IDiv,
        Builtin::UDiv,
        Builtin::IRem,
        Builtin::URem,
        Builtin::PutD,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Drop => "drop",
            Builtin::Dup => "dup",
            Builtin::Swap => "swap",
            Builtin::Rot => "rot",
            Builtin::Add => "add",
            Builtin::Sub => "sub",
            Builtin::Mul => "mul",
            Builtin::IDiv => "idiv",
            Builtin::UDiv => "udiv",
            Builtin::IRem => "irem",
            Builtin::URem => "urem",
            Builtin::PutD => "putd",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn effect(self) -> StackEffect {
        let a = StackSlot::Generic(0);
        let b = StackSlot::Generic(1);
        let c = StackSlot::Generic(2);
        let int = StackSlot::Concrete(TypeDescriptor::int());

        match self {
            Builtin::Drop => StackEffect::new(vec![a], vec![]),
            Builtin::Dup => StackEffect::new(vec![a], vec![a, a]),
            Builtin::Swap => StackEffect::new(vec![a, b], vec![b, a]),
            Builtin::Rot => StackEffect::new(vec![a, b, c], vec![b, c, a]),
            Builtin::Add
            | Builtin::Sub
            | Builtin::Mul
            | Builtin::IDiv
            | Builtin::UDiv
            | Builtin::IRem
            | Builtin::URem => StackEffect::new(vec![int, int], vec![int]),
            Builtin::PutD => StackEffect::new(vec![int], vec![]),
        }
    }

    /// The routine implementing this builtin on the runtime stack.
    pub fn routine(self) -> String {
        match self {
            Builtin::Drop => routine(self, &["call $__stack_pop()"]),
            // Peek and push once: ( a -- a a ).
            Builtin::Dup => routine(
                self,
                &[
                    "%i0 =l call $__stack_top()",
                    "call $__stack_push(l %i0)",
                ],
            ),
            Builtin::Swap => routine(
                self,
                &[
                    "%i0 =l call $__stack_pop()",
                    "%i1 =l call $__stack_pop()",
                    "call $__stack_push(l %i0)",
                    "call $__stack_push(l %i1)",
                ],
            ),
            // a b c -> b c a
            Builtin::Rot => routine(
                self,
                &[
                    "%i0 =l call $__stack_pop()",
                    "%i1 =l call $__stack_pop()",
                    "%i2 =l call $__stack_pop()",
                    "call $__stack_push(l %i1)",
                    "call $__stack_push(l %i0)",
                    "call $__stack_push(l %i2)",
                ],
            ),
            Builtin::Add => binary(self, "add"),
            Builtin::Sub => binary(self, "sub"),
            Builtin::Mul => binary(self, "mul"),
            Builtin::IDiv => binary(self, "div"),
            Builtin::UDiv => binary(self, "udiv"),
            Builtin::IRem => binary(self, "rem"),
            Builtin::URem => binary(self, "urem"),
            Builtin::PutD => {
                let mut text = String::from("data $__putd_fmt = { b \"%ld\", b 0 }\n");
                text.push_str(&routine(
                    self,
                    &[
                        "%i0 =l call $__stack_pop()",
                        "call $printf(l $__putd_fmt, ..., l %i0)",
                    ],
                ));
                text
            }
        }
    }
}

/// `second OP first`, where `first` is the value on top of the stack.
fn binary(builtin: Builtin, instruction: &str) -> String {
    routine(
        builtin,
        &[
            "%i0 =l call $__stack_pop()",
            "%i1 =l call $__stack_pop()",
            &format!("%i2 =l {instruction} %i1, %i0"),
            "call $__stack_push(l %i2)",
        ],
    )
}

fn routine(builtin: Builtin, body: &[&str]) -> String {
    let mut text = format!("function ${}() {{\n@start\n", builtin.name());
    for line in body {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("    ret\n}\n");
    text
}

//! The fixed runtime every translated program starts with: the value stack
//! buffer, its top pointer, the helpers that move 8 byte words on and off it,
//! and one routine per builtin.
//!
//! The stack grows upwards from the base of `$__stack`. Pops are never checked:
//! verified programs cannot pop more than they pushed. Pushes are only checked
//! against the buffer end when `bounds_check` is enabled; otherwise pushing
//! past the capacity overwrites whatever follows the buffer.

use super::builtins::Builtin;

/// Size in bytes of one runtime stack slot.
pub const WORD_SIZE: usize = 8;

/// C library functions the runtime calls, linked in by `cc`.
pub const LIBC_SYMBOLS: [&str; 2] = ["printf", "abort"];

const STACK_DATA: &str = "\
data $__stack = { z #STACK_LEN# }
data $__stack_ptr = { l $__stack }
";

const PUSH_UNCHECKED: &str = "\
function $__stack_push(l %v) {
@start
    %i0 =l loadl $__stack_ptr
    storel %v, %i0
    %i1 =l add %i0, 8
    storel %i1, $__stack_ptr
    ret
}
";

const PUSH_CHECKED: &str = "\
function $__stack_push(l %v) {
@start
    %i0 =l loadl $__stack_ptr
    %i1 =l add %i0, 8
    %i2 =l add $__stack, #STACK_LEN#
    %i3 =w cugtl %i1, %i2
    jnz %i3, @overflow, @push
@overflow
    call $abort()
    ret
@push
    storel %v, %i0
    storel %i1, $__stack_ptr
    ret
}
";

const TOP_AND_POP: &str = "
function l $__stack_top() {
@start
    %i0 =l loadl $__stack_ptr
    %i1 =l sub %i0, 8
    %i2 =l loadl %i1
    ret %i2
}

function l $__stack_pop() {
@start
    %i0 =l loadl $__stack_ptr
    %i1 =l sub %i0, 8
    %i2 =l loadl %i1
    storel %i1, $__stack_ptr
    ret %i2
}
";

/// Renders the runtime prelude for a stack of `stack_capacity` bytes.
pub fn prelude(stack_capacity: usize, bounds_check: bool) -> String {
    let capacity = stack_capacity.to_string();
    let push = if bounds_check {
        PUSH_CHECKED
    } else {
        PUSH_UNCHECKED
    };

    let mut text = String::new();
    text.push_str(&STACK_DATA.replace("#STACK_LEN#", &capacity));
    text.push('\n');
    text.push_str(&push.replace("#STACK_LEN#", &capacity));
    text.push_str(TOP_AND_POP);

    for builtin in Builtin::ALL {
        text.push('\n');
        text.push_str(&builtin.routine());
    }

    text
}

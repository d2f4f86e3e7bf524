use crate::ast::Args;
use crate::fixed::Value;
use crate::functions::{CallContext, Function, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_function("nop", nop);
    registry.register_function("count", Counter);
}

/// `nop(...)`: ignores its arguments and keeps no state. Answers with the
/// all-ones raw pattern, the legacy reply of a function without context.
pub fn nop(_args: &mut Args<'_>) -> Value {
    Value::from_bits(u64::MAX)
}

/// `count()`: how many times this call site has been evaluated, itself
/// included. The tally lives in the call's context.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counter;

impl Function for Counter {
    fn new_context(&self) -> CallContext {
        CallContext::new(0i32)
    }

    fn call(&self, args: &mut Args<'_>, context: &mut CallContext) -> Value {
        if !args.is_empty() {
            return Value::Undefined;
        }
        let Some(count) = context.get_mut::<i32>() else {
            return Value::Undefined;
        };
        match count.checked_add(1) {
            Some(next) => {
                *count = next;
                Value::from_int(next)
            }
            None => Value::Overflow,
        }
    }
}

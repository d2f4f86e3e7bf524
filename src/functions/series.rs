use crate::ast::Args;
use crate::fixed::{Fixed, Value, FRACTION_BITS};
use crate::functions::{CallContext, Function, Registry};
use log::{debug, trace};

/// Most iterations a single `sum` call may run.
pub const SUM_ITERATION_CAP: u64 = (1 << 32) - 1;

pub fn register(registry: &mut Registry) {
    registry.register_function("sum", Sum::default());
}

/// `sum(summand, counter, start, stop)`: binds `counter` to `start`,
/// `start + 1`, ... while it does not exceed `stop` and adds up `summand`.
///
/// `counter` must be a plain variable. `start` and `stop` are evaluated once,
/// `summand` once per step. A sentinel summand ends the loop and is returned.
/// An overflowing `stop` means no upper bound and yields `Undefined`, as does
/// a range of more than `cap` steps. The cap also bounds loops whose summand
/// keeps moving the counter back.
#[derive(Debug, Clone, Copy)]
pub struct Sum {
    cap: u64,
}

impl Default for Sum {
    fn default() -> Self {
        Self::with_cap(SUM_ITERATION_CAP)
    }
}

impl Sum {
    pub fn with_cap(cap: u64) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Number of whole steps from `start` up to `stop`, both included.
    fn steps(start: Fixed, stop: Fixed) -> u128 {
        if start > stop {
            return 0;
        }
        let span = i128::from(stop.raw()) - i128::from(start.raw());
        (span >> FRACTION_BITS) as u128 + 1
    }
}

impl Function for Sum {
    fn call(&self, args: &mut Args<'_>, _context: &mut CallContext) -> Value {
        if args.len() != 4 {
            return Value::Undefined;
        }
        let Some(counter) = args.slot(1) else {
            return Value::Undefined;
        };
        let start = match args.eval(2) {
            Value::Number(start) => start,
            sentinel => return sentinel,
        };
        let stop = match args.eval(3) {
            Value::Number(stop) => stop,
            // unbounded ranges always exceed the cap
            Value::Overflow => {
                debug!("sum from {} has no upper bound", start);
                return Value::Undefined;
            }
            Value::Undefined => return Value::Undefined,
        };
        let steps = Sum::steps(start, stop);
        if steps > u128::from(self.cap) {
            debug!("sum of {} steps exceeds the cap of {}", steps, self.cap);
            return Value::Undefined;
        }
        trace!("sum from {} to {}", start, stop);

        let mut total = Value::ZERO;
        let mut index = start;
        let mut iterations = 0u64;
        while index <= stop {
            if iterations >= self.cap {
                debug!("sum gave up after {} iterations", iterations);
                return Value::Undefined;
            }
            iterations += 1;

            args.set(counter, Value::Number(index));
            let term = args.eval(0);
            if term.is_sentinel() {
                return term;
            }
            total = total + term;
            if total.is_sentinel() {
                return total;
            }

            // the summand may have reassigned the counter
            let Value::Number(current) = args.get(counter) else {
                return Value::Undefined;
            };
            index = match current.checked_add(Fixed::ONE) {
                Some(next) => next,
                None => break,
            };
        }

        trace!("sum finished after {} iterations: {}", iterations, total);
        total
    }
}

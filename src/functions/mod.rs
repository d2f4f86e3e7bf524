pub mod math;
pub mod other;
pub mod series;

use crate::ast::Args;
use crate::fixed::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An extension function callable from expressions.
///
/// Arguments arrive unevaluated: the function decides which of them to
/// evaluate, how often and in which order. Arity is the function's own
/// business; by convention a wrong argument count yields
/// [`Value::Undefined`].
pub trait Function: Send + Sync {
    /// Creates the scratch state for one call site. Called once per call
    /// node while parsing; the state is dropped together with the node.
    fn new_context(&self) -> CallContext {
        CallContext::empty()
    }

    fn call(&self, args: &mut Args<'_>, context: &mut CallContext) -> Value;
}

/// Plain functions and closures are stateless functions.
impl<F> Function for F
where
    F: Fn(&mut Args<'_>) -> Value + Send + Sync,
{
    fn call(&self, args: &mut Args<'_>, _context: &mut CallContext) -> Value {
        self(args)
    }
}

/// Per-call-site state owned by a call node.
#[derive(Default)]
pub struct CallContext(Option<Box<dyn Any>>);

impl CallContext {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn new<T: Any>(state: T) -> Self {
        Self(Some(Box::new(state)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_mut().and_then(|state| state.downcast_mut())
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "CallContext(empty)")
        } else {
            write!(f, "CallContext(..)")
        }
    }
}

/// Ordered, read-only table of functions known to the parser.
///
/// Lookup returns the first entry registered under a name.
#[derive(Clone, Default)]
pub struct Registry {
    functions: Vec<(String, Arc<dyn Function>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_functions(&mut registry);
        registry
    }

    pub fn register_function<F>(&mut self, name: &str, function: F) -> &mut Self
    where
        F: Function + 'static,
    {
        self.functions.push((name.to_string(), Arc::new(function)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, function)| function)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub fn register_functions(registry: &mut Registry) {
    other::register(registry);
    math::register(registry);
    series::register(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seven(_args: &mut Args<'_>) -> Value {
        Value::from_int(7)
    }

    fn undefined(_args: &mut Args<'_>) -> Value {
        Value::Undefined
    }

    #[test]
    fn test_builtins_are_registered_in_order() {
        let registry = Registry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["nop", "count", "sqrt", "sum"]);
    }

    #[test]
    fn test_register_function_chains() {
        let mut registry = Registry::new();
        registry
            .register_function("f", seven)
            .register_function("f", undefined);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("f"));
        assert!(!registry.contains("g"));
    }

    #[test]
    fn test_call_context_downcast() {
        let mut context = CallContext::new(5u32);
        assert!(!context.is_empty());
        assert_eq!(context.get_mut::<u32>(), Some(&mut 5));
        assert_eq!(context.get_mut::<u64>(), None);
        assert!(CallContext::empty().get_mut::<u32>().is_none());
    }
}

use crate::fixed::Value;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a variable's storage: an index into the table that issued it.
///
/// Slots never own anything. A slot from one table used with another is
/// detected and refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    table: u64,
    index: usize,
}

impl Slot {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Named, mutable variable storage shared by the parser and the evaluator.
///
/// Names are bound in creation order and a bound name keeps the same slot for
/// the lifetime of the table.
#[derive(Debug)]
pub struct Variables {
    id: u64,
    names: HashMap<String, usize>,
    entries: Vec<(String, Value)>,
}

impl Default for Variables {
    fn default() -> Self {
        Self::new()
    }
}

impl Variables {
    pub fn new() -> Self {
        Self {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            names: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Returns the slot bound to `name`, creating a zero-valued one if needed.
    pub fn resolve(&mut self, name: &str) -> Slot {
        let index = match self.names.get(name) {
            Some(&index) => index,
            None => {
                let index = self.entries.len();
                debug!("Binding variable '{}' to slot {}", name, index);
                self.names.insert(name.to_string(), index);
                self.entries.push((name.to_string(), Value::ZERO));
                index
            }
        };
        Slot {
            table: self.id,
            index,
        }
    }

    /// Looks a name up without creating it.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.names.get(name).map(|&index| Slot {
            table: self.id,
            index,
        })
    }

    pub fn get(&self, slot: Slot) -> Value {
        match self.entry(slot) {
            Some((_, value)) => *value,
            None => Value::Undefined,
        }
    }

    pub fn set(&mut self, slot: Slot, value: Value) {
        if let Some(entry) = self.entry_mut(slot) {
            entry.1 = value;
        }
    }

    /// Current value of a variable by name, if it has been bound.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|slot| self.get(slot))
    }

    /// Bindings in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn owns(&self, slot: Slot) -> bool {
        slot.table == self.id && slot.index < self.entries.len()
    }

    /// Releases all storage. Slots issued by this table become meaningless.
    pub fn destroy(self) {
        debug!(
            "Releasing variable table {} ({} slots)",
            self.id,
            self.entries.len()
        );
    }

    fn entry(&self, slot: Slot) -> Option<&(String, Value)> {
        if !self.owns(slot) {
            warn!("Slot {:?} does not belong to variable table {}", slot, self.id);
            return None;
        }
        self.entries.get(slot.index)
    }

    fn entry_mut(&mut self, slot: Slot) -> Option<&mut (String, Value)> {
        if !self.owns(slot) {
            warn!("Slot {:?} does not belong to variable table {}", slot, self.id);
            return None;
        }
        self.entries.get_mut(slot.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_stable() {
        let mut variables = Variables::new();
        let x = variables.resolve("x");
        let y = variables.resolve("y");
        assert_ne!(x, y);
        assert_eq!(variables.resolve("x"), x);
        assert_eq!(variables.len(), 2);
        assert_eq!(x.index(), 0);
        assert_eq!(y.index(), 1);
    }

    #[test]
    fn test_new_slot_is_zero() {
        let mut variables = Variables::new();
        let slot = variables.resolve("fresh");
        assert_eq!(variables.get(slot), Value::ZERO);
    }

    #[test]
    fn test_set_and_get() {
        let mut variables = Variables::new();
        let slot = variables.resolve("i");
        variables.set(slot, Value::from_int(7));
        assert_eq!(variables.get(slot), Value::from_int(7));
        assert_eq!(variables.value("i"), Some(Value::from_int(7)));
        assert_eq!(variables.value("j"), None);
        variables.set(slot, Value::Overflow);
        assert_eq!(variables.get(slot), Value::Overflow);
    }

    #[test]
    fn test_iter_in_creation_order() {
        let mut variables = Variables::new();
        for name in ["b", "a", "c", "a"] {
            variables.resolve(name);
        }
        let names: Vec<_> = variables.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_foreign_slot_is_refused() {
        let mut first = Variables::new();
        let mut second = Variables::new();
        let foreign = first.resolve("x");
        second.resolve("x");
        first.set(foreign, Value::from_int(3));

        assert!(!second.owns(foreign));
        assert_eq!(second.get(foreign), Value::Undefined);
        second.set(foreign, Value::from_int(9));
        assert_eq!(second.value("x"), Some(Value::ZERO));
        assert_eq!(first.get(foreign), Value::from_int(3));
    }
}

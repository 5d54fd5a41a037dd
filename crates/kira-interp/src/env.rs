//! The runtime environment: a chain of scopes holding `name -> value`
//! bindings, grounded on `H1ghBre4k3r-y-lang`'s `Scope { scope_stack:
//! Vec<HashMap<...>> }` push/pop/find pattern, generalized from a single
//! stack to a parent-linked chain so a [`Value::Function`] can capture
//! its defining scope by cloning a handle to it rather than flattening it
//! into a snapshot — the closure keeps seeing updates a `var` in an
//! enclosing scope receives after the closure was created.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

struct Scope {
    parent: Option<Environment>,
    bindings: FxHashMap<String, Value>,
}

/// A handle to one scope in the chain. Cloning an `Environment` clones the
/// `Rc`, not the bindings — two clones see each other's writes.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    pub fn root() -> Self {
        Environment(Rc::new(RefCell::new(Scope { parent: None, bindings: FxHashMap::default() })))
    }

    /// A new child scope whose lookups fall back to this one.
    pub fn child(&self) -> Self {
        Environment(Rc::new(RefCell::new(Scope { parent: Some(self.clone()), bindings: FxHashMap::default() })))
    }

    /// Binds `name` in the *current* scope, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().bindings.insert(name.to_string(), value);
    }

    /// Looks up `name`, walking outward through enclosing scopes.
    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => scope.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    /// Updates the nearest existing binding for `name`, without creating a
    /// new one. Returns `false` if `name` isn't bound anywhere in the
    /// chain (the checker already rejects assigning to an undeclared
    /// name, so callers can treat `false` as unreachable in practice).
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = self.0.borrow_mut();
        if scope.bindings.contains_key(name) {
            scope.bindings.insert(name.to_string(), value);
            return true;
        }
        match &scope.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scope_sees_parent_bindings() {
        let root = Environment::root();
        root.define("x", Value::Int(1));
        let child = root.child();
        assert_eq!(child.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn child_binding_shadows_without_mutating_parent() {
        let root = Environment::root();
        root.define("x", Value::Int(1));
        let child = root.child();
        child.define("x", Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(root.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_updates_the_enclosing_binding_in_place() {
        let root = Environment::root();
        root.define("x", Value::Int(1));
        let child = root.child();
        assert!(child.assign("x", Value::Int(99)));
        assert_eq!(root.get("x"), Some(Value::Int(99)));
    }

    #[test]
    fn assign_to_undefined_name_fails() {
        let root = Environment::root();
        assert!(!root.assign("missing", Value::Int(1)));
    }

    #[test]
    fn cloned_environment_shares_state() {
        let root = Environment::root();
        let alias = root.clone();
        alias.define("x", Value::Int(7));
        assert_eq!(root.get("x"), Some(Value::Int(7)));
    }
}

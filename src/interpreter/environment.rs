use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A chain of name→value frames. The root frame of a session is its
/// persistent namespace; every function call adds one frame on top of the
/// function's defining environment. Clones share the underlying frame, so a
/// `Session` and the interpreter it drives see the same bindings.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: Rc<RefCell<HashMap<String, Value>>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            vars: Rc::new(RefCell::new(HashMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<Environment>) -> Self {
        Self {
            vars: Rc::new(RefCell::new(HashMap::new())),
            parent: Some(parent),
        }
    }

    /// Bind a name in this frame.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    /// Look a name up through the chain, innermost first.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Bind a name in the root frame (the session namespace), for `global`
    /// declarations.
    pub fn set_root(&self, name: impl Into<String>, value: Value) {
        match &self.parent {
            Some(parent) => parent.set_root(name, value),
            None => self.set(name, value),
        }
    }

    /// Rebind an existing name in an enclosing frame (not this one), for
    /// `nonlocal` declarations. Returns false when no enclosing frame binds
    /// the name.
    pub fn update_enclosing(&self, name: &str, value: Value) -> bool {
        match &self.parent {
            Some(parent) => parent.update_existing(name, value),
            None => false,
        }
    }

    fn update_existing(&self, name: &str, value: Value) -> bool {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.update_existing(name, value),
            None => false,
        }
    }

    /// This frame's own bindings, in no particular order. Used to harvest a
    /// class body into class attributes.
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        self.vars
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

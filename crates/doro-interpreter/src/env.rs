use std::ops::Deref;

use gc::{Finalize, Gc, GcCell, Trace};
use rustc_hash::FxHashMap;

use crate::object::Object;

/// A lexical scope. Cloning an `Env` yields another handle to the same scope.
#[derive(Clone, Debug, Default, Finalize, Trace)]
pub struct Env(Gc<GcCell<EnvImpl>>);

impl Deref for Env {
    type Target = Gc<GcCell<EnvImpl>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Env {
    pub fn with_parent(parent: &Env) -> Self {
        let env = EnvImpl { map: FxHashMap::default(), parent: Some(parent.clone()) };
        Self(Gc::new(GcCell::new(env)))
    }

    /// Binds `name` in this scope, shadowing any binding in an enclosing one.
    pub fn define(&mut self, name: &str, value: Object) {
        self.borrow_mut().map.insert(name.to_string(), value);
    }

    /// Looks `name` up in this scope, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Object> {
        let env = self.borrow();
        match env.map.get(name) {
            Some(value) => Some(value.clone()),
            None => env.parent.as_ref()?.get(name),
        }
    }

    /// Overwrites the nearest existing binding of `name`. Returns `false` if
    /// no scope in the chain defines it.
    pub fn assign(&mut self, name: &str, value: Object) -> bool {
        let mut env = self.borrow_mut();
        if let Some(entry) = env.map.get_mut(name) {
            *entry = value;
            return true;
        }
        match &mut env.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    /// Bindings of this scope only, sorted by name.
    pub fn bindings(&self) -> Vec<(String, Object)> {
        let mut bindings = self
            .borrow()
            .map
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Vec<_>>();
        bindings.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        bindings
    }
}

#[derive(Debug, Default, Finalize, Trace)]
pub struct EnvImpl {
    map: FxHashMap<String, Object>,
    parent: Option<Env>,
}

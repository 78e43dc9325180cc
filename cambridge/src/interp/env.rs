//! Environment for variable bindings

use super::error::{InterpResult, RuntimeError};
use super::value::{Instance, Value};
use crate::ast::TypeDefinition;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Shared reference to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope
#[derive(Debug, Default)]
pub struct Environment {
    /// Variable bindings in this scope
    bindings: HashMap<String, Value>,
    /// Names bound by CONSTANT in this scope
    constants: HashSet<String>,
    /// TYPE declarations, a namespace separate from values
    types: HashMap<String, TypeDefinition>,
    /// Receiver of the method running in this scope
    instance: Option<Rc<Instance>>,
    /// Parent environment for lexical scoping
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new global environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new environment with a parent
    pub fn with_parent(parent: EnvRef) -> Self {
        Environment {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind in the current scope, replacing any earlier binding
    pub fn declare(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Bind in the current scope and mark write-once
    pub fn declare_constant(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.constants.insert(name.clone());
        self.bindings.insert(name, value);
    }

    /// Current scope, then the active instance, then the parent chain
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        if let Some(field) = self.instance.as_ref().and_then(|i| i.get_field(name)) {
            return Some(field);
        }
        self.parent.as_ref().and_then(|p| p.borrow().get(name))
    }

    /// Strict set: bind in this scope unless the name is constant anywhere up the chain
    pub fn set(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if self.is_constant(name) {
            return Err(RuntimeError::constant_violation(name));
        }
        self.bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Mutate the binding where it lives; bind here when it lives nowhere
    pub fn set_in_place(&mut self, name: &str, value: Value) -> InterpResult<()> {
        if let Some(value) = self.assign_existing(name, value)? {
            self.bindings.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Hands `value` back when no scope or instance owns `name`
    fn assign_existing(&mut self, name: &str, value: Value) -> InterpResult<Option<Value>> {
        if self.bindings.contains_key(name) {
            if self.constants.contains(name) {
                return Err(RuntimeError::constant_violation(name));
            }
            self.bindings.insert(name.to_string(), value);
            return Ok(None);
        }
        if let Some(instance) = &self.instance {
            if instance.has_field(name) {
                instance.set_field(name, value);
                return Ok(None);
            }
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign_existing(name, value),
            None => Ok(Some(value)),
        }
    }

    /// True when the binding `name` resolves to is a CONSTANT
    pub fn is_constant(&self, name: &str) -> bool {
        if self.bindings.contains_key(name) {
            return self.constants.contains(name);
        }
        if self.instance.as_ref().is_some_and(|i| i.has_field(name)) {
            return false;
        }
        self.parent
            .as_ref()
            .is_some_and(|p| p.borrow().is_constant(name))
    }

    /// True when this scope itself binds `name`
    pub fn declares(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn define_type(&mut self, name: impl Into<String>, definition: TypeDefinition) {
        self.types.insert(name.into(), definition);
    }

    pub fn get_type(&self, name: &str) -> Option<TypeDefinition> {
        match self.types.get(name) {
            Some(def) => Some(def.clone()),
            None => self.parent.as_ref().and_then(|p| p.borrow().get_type(name)),
        }
    }

    /// Route unbound field names to `instance` for method bodies
    pub fn set_instance(&mut self, instance: Rc<Instance>) {
        self.instance = Some(instance);
    }

    /// Get all bindings of this scope
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.bindings
    }
}

/// Create a child environment from a parent reference
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;
    use crate::interp::value::Class;

    fn int(env: &EnvRef, name: &str) -> Option<i64> {
        env.borrow().get(name).and_then(|v| v.as_int())
    }

    #[test]
    fn test_declare_and_get() {
        let mut env = Environment::new();
        env.declare("x", Value::Integer(42));
        assert_eq!(env.get("x").and_then(|v| v.as_int()), Some(42));
        assert!(env.get("y").is_none());
    }

    #[test]
    fn test_scope_chain() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().declare("x", Value::Integer(1));

        let child = child_env(&parent);
        child.borrow_mut().declare("y", Value::Integer(2));

        assert_eq!(int(&child, "x"), Some(1));
        assert_eq!(int(&child, "y"), Some(2));
        assert!(parent.borrow().get("y").is_none());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().declare("x", Value::Integer(1));

        let child = child_env(&parent);
        child.borrow_mut().declare("x", Value::Integer(2));

        assert_eq!(int(&child, "x"), Some(2));
        assert_eq!(int(&parent, "x"), Some(1));
    }

    #[test]
    fn test_set_in_place_mutates_owner() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().declare("total", Value::Integer(0));
        let child = child_env(&parent);

        child
            .borrow_mut()
            .set_in_place("total", Value::Integer(10))
            .expect("assignable");

        assert_eq!(int(&parent, "total"), Some(10));
        assert!(!child.borrow().declares("total"));
    }

    #[test]
    fn test_set_in_place_creates_in_current_scope() {
        let parent = Environment::new().into_ref();
        let child = child_env(&parent);

        child
            .borrow_mut()
            .set_in_place("fresh", Value::Integer(3))
            .expect("assignable");

        assert_eq!(int(&child, "fresh"), Some(3));
        assert!(parent.borrow().get("fresh").is_none());
    }

    #[test]
    fn test_constant_violation_in_nested_scope() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().declare_constant("Max", Value::Integer(10));
        let child = child_env(&parent);

        let err = child
            .borrow_mut()
            .set_in_place("Max", Value::Integer(11))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConstantViolation);

        let err = child.borrow_mut().set("Max", Value::Integer(11)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConstantViolation);
        assert_eq!(int(&parent, "Max"), Some(10));
    }

    #[test]
    fn test_local_shadow_of_constant_is_not_constant() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().declare_constant("Max", Value::Integer(10));
        let child = child_env(&parent);
        assert!(child.borrow().is_constant("Max"));

        child.borrow_mut().declare("Max", Value::Integer(1));
        assert!(!child.borrow().is_constant("Max"));
        child
            .borrow_mut()
            .set_in_place("Max", Value::Integer(2))
            .expect("local binding");
        assert_eq!(int(&child, "Max"), Some(2));
        assert_eq!(int(&parent, "Max"), Some(10));
    }

    #[test]
    fn test_strict_set_binds_locally() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().declare("i", Value::Integer(99));
        let child = child_env(&parent);

        child.borrow_mut().set("i", Value::Integer(1)).expect("not constant");

        assert_eq!(int(&child, "i"), Some(1));
        assert_eq!(int(&parent, "i"), Some(99));
    }

    #[test]
    fn test_instance_fields_are_aliased() {
        let class = Rc::new(Class {
            name: "Counter".to_string(),
            parent: None,
            methods: HashMap::new(),
            fields: Vec::new(),
        });
        let instance = Rc::new(Instance::new(class));
        instance.set_field("Count", Value::Integer(0));

        let env = Environment::new().into_ref();
        env.borrow_mut().set_instance(Rc::clone(&instance));
        assert_eq!(int(&env, "Count"), Some(0));

        env.borrow_mut()
            .set_in_place("Count", Value::Integer(5))
            .expect("assignable");
        assert_eq!(instance.get_field("Count").and_then(|v| v.as_int()), Some(5));
        assert!(!env.borrow().declares("Count"));
    }

    #[test]
    fn test_types_are_a_separate_namespace() {
        let parent = Environment::new().into_ref();
        parent
            .borrow_mut()
            .define_type("Colour", TypeDefinition::Enum(vec!["Red".into()]));
        let child = child_env(&parent);

        assert!(child.borrow().get_type("Colour").is_some());
        assert!(child.borrow().get("Colour").is_none());
        assert!(child.borrow().get_type("Missing").is_none());
    }
}

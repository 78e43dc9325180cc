//! Runtime values for the interpreter

use super::builtins::HostContext;
use super::env::EnvRef;
use super::error::{InterpResult, RuntimeError};
use crate::ast::{ArrayDimension, DataType, RoutineDecl};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Native builtin signature
pub type BuiltinFn = fn(&mut HostContext, &[Value]) -> InterpResult<Value>;

/// Upper limit on the number of slots a single DECLARE may allocate
pub const MAX_ARRAY_ELEMENTS: usize = 1 << 24;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    String(String),
    Char(char),
    Boolean(bool),
    Date(NaiveDate),
    Null,
    /// Shared between every holder; element writes are visible to all
    Array(Rc<RefCell<ArrayValue>>),
    /// Copied on assignment
    Record(RecordValue),
    Class(Rc<Class>),
    /// Shared between every holder; field writes are visible to all
    Instance(Rc<Instance>),
    BoundMethod(BoundMethod),
    /// `SUPER` inside a method: searches methods from `class` upwards
    SuperRef {
        instance: Rc<Instance>,
        class: Rc<Class>,
    },
    /// User PROCEDURE or FUNCTION
    Routine(Rc<Routine>),
    Builtin(Builtin),
}

impl Value {
    /// Truthiness used by IF, WHILE and UNTIL
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            _ => true,
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::String(_) => "STRING",
            Value::Char(_) => "CHAR",
            Value::Boolean(_) => "BOOLEAN",
            Value::Date(_) => "DATE",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Record(_) => "RECORD",
            Value::Class(_) => "CLASS",
            Value::Instance(_) => "INSTANCE",
            Value::BoundMethod(_) => "BOUND_METHOD",
            Value::SuperRef { .. } => "SUPER",
            Value::Routine(r) if r.is_function() => "FUNCTION",
            Value::Routine(_) => "PROCEDURE",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer or Real widened to f64
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality between scalars of the same concrete type
    ///
    /// Integer never equals Real here; arithmetic comparison handles
    /// promotion separately.
    pub fn structurally_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Record(a), Value::Record(b)) => {
                a.type_name == b.type_name
                    && a.fields.len() == b.fields.len()
                    && a.fields
                        .iter()
                        .zip(&b.fields)
                        .all(|((n1, v1), (n2, v2))| n1 == n2 && v1.structurally_equal(v2))
            }
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Render a real the way OUTPUT and `&` show it (`10.0` prints as `10`)
pub fn format_real(value: f64) -> String {
    format!("{value}")
}

/// Render a date as DD/MM/YYYY
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(x) => f.write_str(&format_real(*x)),
            Value::String(s) => f.write_str(s),
            Value::Char(c) => write!(f, "{c}"),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Date(d) => f.write_str(&format_date(d)),
            Value::Null => f.write_str("NULL"),
            Value::Array(a) => write!(f, "ARRAY[{} elements]", a.borrow().elements.len()),
            Value::Record(r) => write!(f, "RECORD {}", r.type_name),
            Value::Class(c) => write!(f, "CLASS {}", c.name),
            Value::Instance(i) => write!(f, "<{} instance>", i.class.name),
            Value::BoundMethod(m) => write!(f, "<bound method of {}>", m.instance.class.name),
            Value::SuperRef { .. } => f.write_str("SUPER"),
            Value::Routine(r) => f.write_str(&r.decl.signature()),
            Value::Builtin(b) => write!(f, "builtin function: {}", b.name),
        }
    }
}

// ============ Arrays ============

/// Array with declared bounds backed by a flat row-major buffer
#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub dimensions: Vec<ArrayDimension>,
    pub elements: Vec<Value>,
}

impl ArrayValue {
    /// Allocate every slot up front, each holding a copy of `fill`
    pub fn new(dimensions: Vec<ArrayDimension>, fill: Value) -> InterpResult<Self> {
        let len = dimensions
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(d.len()))
            .filter(|len| *len <= MAX_ARRAY_ELEMENTS)
            .ok_or_else(|| RuntimeError::index_error("array too large"))?;
        Ok(ArrayValue {
            dimensions,
            elements: vec![fill; len],
        })
    }

    pub fn into_value(self) -> Value {
        Value::Array(Rc::new(RefCell::new(self)))
    }

    fn offset(&self, indices: &[i64]) -> InterpResult<usize> {
        if indices.len() != self.dimensions.len() {
            return Err(RuntimeError::index_error(format!(
                "array has {} dimension(s), got {} index(es)",
                self.dimensions.len(),
                indices.len()
            )));
        }
        let mut offset = 0usize;
        for (dim, &index) in self.dimensions.iter().zip(indices) {
            if !dim.contains(index) {
                return Err(RuntimeError::index_error(format!(
                    "array index {index} out of bounds {}:{}",
                    dim.lower, dim.upper
                )));
            }
            offset = offset * dim.len() + (index - dim.lower) as usize;
        }
        Ok(offset)
    }

    pub fn get(&self, indices: &[i64]) -> InterpResult<Value> {
        let offset = self.offset(indices)?;
        Ok(self.elements[offset].clone())
    }

    pub fn set(&mut self, indices: &[i64], value: Value) -> InterpResult<()> {
        let offset = self.offset(indices)?;
        self.elements[offset] = value;
        Ok(())
    }
}

// ============ Records ============

/// Instance of a record TYPE, fields kept in declaration order
#[derive(Debug, Clone)]
pub struct RecordValue {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl RecordValue {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }

    /// Overwrite an existing field; false when the record has no such field
    pub fn set(&mut self, field: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|(n, _)| n == field) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }
}

// ============ Routines ============

/// Declared PROCEDURE or FUNCTION with the scope it closes over
pub struct Routine {
    pub decl: RoutineDecl,
    pub closure: EnvRef,
}

impl Routine {
    pub fn new(decl: RoutineDecl, closure: EnvRef) -> Self {
        Routine { decl, closure }
    }

    pub fn is_function(&self) -> bool {
        self.decl.returns.is_some()
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routine").field("name", &self.decl.name).finish()
    }
}

/// Native function registered under an upper-case name
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

// ============ Classes ============

/// Class definition
pub struct Class {
    pub name: String,
    pub parent: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Routine>>,
    /// Declared fields in source order
    pub fields: Vec<(String, DataType)>,
}

impl Class {
    /// First class from `class` upwards that defines `name`, with the method
    pub fn resolve(class: &Rc<Class>, name: &str) -> Option<(Rc<Class>, Rc<Routine>)> {
        let mut current = Some(Rc::clone(class));
        while let Some(c) = current {
            if let Some(method) = c.methods.get(name) {
                return Some((Rc::clone(&c), Rc::clone(method)));
            }
            current = c.parent.clone();
        }
        None
    }

    /// Ancestor chain starting at `class` itself
    pub fn lineage(class: &Rc<Class>) -> Vec<Rc<Class>> {
        let mut chain = Vec::new();
        let mut current = Some(Rc::clone(class));
        while let Some(c) = current {
            current = c.parent.clone();
            chain.push(c);
        }
        chain
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .finish()
    }
}

/// Object created by NEW
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}

/// Method looked up through an instance
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub instance: Rc<Instance>,
    pub method: Rc<Routine>,
    /// Class that declares `method`; SUPER inside it searches from its parent
    pub owner: Rc<Class>,
}

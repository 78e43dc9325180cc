//! Type descriptor AST nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    Integer,
    Real,
    String,
    Char,
    Boolean,
    Date,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
            PrimitiveType::String => "STRING",
            PrimitiveType::Char => "CHAR",
            PrimitiveType::Boolean => "BOOLEAN",
            PrimitiveType::Date => "DATE",
        };
        f.write_str(name)
    }
}

/// One `lower:upper` dimension of an array type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayDimension {
    pub lower: i64,
    pub upper: i64,
}

impl ArrayDimension {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Number of slots in this dimension (zero when upper < lower)
    pub fn len(&self) -> usize {
        if self.upper < self.lower {
            0
        } else {
            (self.upper - self.lower + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= self.lower && index <= self.upper
    }
}

/// Type annotation as written in DECLARE, parameters and RETURNS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    Primitive(PrimitiveType),
    Array {
        dimensions: Vec<ArrayDimension>,
        element: Box<DataType>,
    },
    Pointer(Box<DataType>),
    /// Reference to a user TYPE or CLASS, resolved when declared
    Custom(String),
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primitive(p) => write!(f, "{p}"),
            DataType::Array { dimensions, element } => {
                let dims: Vec<String> = dimensions
                    .iter()
                    .map(|d| format!("{}:{}", d.lower, d.upper))
                    .collect();
                write!(f, "ARRAY[{}] OF {element}", dims.join(","))
            }
            DataType::Pointer(target) => write!(f, "^{target}"),
            DataType::Custom(name) => f.write_str(name),
        }
    }
}

/// Field of a record TYPE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub data_type: DataType,
}

/// Right-hand side of a TYPE declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDefinition {
    Record(Vec<RecordField>),
    Enum(Vec<String>),
    Pointer(DataType),
}

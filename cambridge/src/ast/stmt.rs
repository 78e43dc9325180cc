//! Statement AST nodes

use super::{DataType, Expr, Spanned, TypeDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sequence of statements forming a block body
pub type Block = Vec<Spanned<Stmt>>;

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `DECLARE name : type`
    Declare { name: String, data_type: DataType },

    /// `CONSTANT name = value`
    Constant { name: String, value: Expr },

    /// `target <- value`
    Assignment { target: Expr, value: Expr },

    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },

    /// `CASE OF subject ... [OTHERWISE : ...] ENDCASE`
    Case {
        subject: Expr,
        clauses: Vec<CaseClause>,
        otherwise: Option<Block>,
    },

    For {
        variable: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Block,
    },

    While { condition: Expr, body: Block },

    Repeat { body: Block, condition: Expr },

    Procedure(RoutineDecl),

    Function(RoutineDecl),

    /// `CALL callee(args)`
    Call { callee: Expr, args: Vec<Expr> },

    Return(Option<Expr>),

    Input(Expr),

    Output(Vec<Expr>),

    OpenFile { file: Expr, mode: FileMode },

    CloseFile(Expr),

    ReadFile { file: Expr, target: Expr },

    WriteFile { file: Expr, data: Expr },

    TypeDecl { name: String, definition: TypeDefinition },

    Class(ClassDecl),

    Expression(Expr),
}

/// One `selectors : body` arm of a CASE statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    /// Scalar expressions or `Expr::Range`
    pub selectors: Vec<Expr>,
    pub body: Block,
}

/// PROCEDURE or FUNCTION declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineDecl {
    pub name: String,
    pub params: Vec<Param>,
    /// Present for FUNCTION, absent for PROCEDURE
    pub returns: Option<DataType>,
    pub body: Block,
    pub access: Option<Access>,
}

/// Routine parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
    pub mode: ParamMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamMode {
    #[default]
    ByVal,
    ByRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Public,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "PUBLIC"),
            Access::Private => write!(f, "PRIVATE"),
        }
    }
}

/// `CLASS name [INHERITS parent] ... ENDCLASS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    /// DECLARE fields and PROCEDURE/FUNCTION methods in source order
    pub members: Block,
}

/// Mode given to OPENFILE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileMode::Read => write!(f, "READ"),
            FileMode::Write => write!(f, "WRITE"),
            FileMode::Append => write!(f, "APPEND"),
        }
    }
}

const INDENT: &str = "    ";

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block) -> fmt::Result {
    for stmt in block {
        for line in stmt.node.to_string().lines() {
            writeln!(f, "{INDENT}{line}")?;
        }
    }
    Ok(())
}

fn join(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.name, self.data_type)
    }
}

impl RoutineDecl {
    /// Parameter list with mode keywords where the mode changes
    fn params_source(&self) -> String {
        let mut previous = ParamMode::ByVal;
        let mut parts = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let prefix = match (previous, param.mode) {
                (ParamMode::ByVal, ParamMode::ByRef) => "BYREF ",
                (ParamMode::ByRef, ParamMode::ByVal) => "BYVAL ",
                _ => "",
            };
            previous = param.mode;
            parts.push(format!("{prefix}{param}"));
        }
        parts.join(", ")
    }

    /// One-line signature, e.g. `FUNCTION Add(a : INTEGER) RETURNS INTEGER`
    pub fn signature(&self) -> String {
        match &self.returns {
            Some(ty) => format!("FUNCTION {}({}) RETURNS {ty}", self.name, self.params_source()),
            None => format!("PROCEDURE {}({})", self.name, self.params_source()),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Declare { name, data_type } => write!(f, "DECLARE {name} : {data_type}"),
            Stmt::Constant { name, value } => write!(f, "CONSTANT {name} = {value}"),
            Stmt::Assignment { target, value } => write!(f, "{target} <- {value}"),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                writeln!(f, "IF {condition} THEN")?;
                write_block(f, then_branch)?;
                if let Some(alt) = else_branch {
                    writeln!(f, "ELSE")?;
                    write_block(f, alt)?;
                }
                write!(f, "ENDIF")
            }
            Stmt::Case {
                subject,
                clauses,
                otherwise,
            } => {
                writeln!(f, "CASE OF {subject}")?;
                for clause in clauses {
                    writeln!(f, "{INDENT}{} :", join(&clause.selectors))?;
                    for stmt in &clause.body {
                        for line in stmt.node.to_string().lines() {
                            writeln!(f, "{INDENT}{INDENT}{line}")?;
                        }
                    }
                }
                if let Some(body) = otherwise {
                    writeln!(f, "{INDENT}OTHERWISE :")?;
                    for stmt in body {
                        for line in stmt.node.to_string().lines() {
                            writeln!(f, "{INDENT}{INDENT}{line}")?;
                        }
                    }
                }
                write!(f, "ENDCASE")
            }
            Stmt::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                write!(f, "FOR {variable} <- {start} TO {end}")?;
                if let Some(step) = step {
                    write!(f, " STEP {step}")?;
                }
                writeln!(f)?;
                write_block(f, body)?;
                write!(f, "NEXT {variable}")
            }
            Stmt::While { condition, body } => {
                writeln!(f, "WHILE {condition}")?;
                write_block(f, body)?;
                write!(f, "ENDWHILE")
            }
            Stmt::Repeat { body, condition } => {
                writeln!(f, "REPEAT")?;
                write_block(f, body)?;
                write!(f, "UNTIL {condition}")
            }
            Stmt::Procedure(decl) | Stmt::Function(decl) => {
                if let Some(access) = decl.access {
                    write!(f, "{access} ")?;
                }
                writeln!(f, "{}", decl.signature())?;
                write_block(f, &decl.body)?;
                if decl.returns.is_some() {
                    write!(f, "ENDFUNCTION")
                } else {
                    write!(f, "ENDPROCEDURE")
                }
            }
            Stmt::Call { callee, args } => write!(f, "CALL {callee}({})", join(args)),
            Stmt::Return(Some(value)) => write!(f, "RETURN {value}"),
            Stmt::Return(None) => write!(f, "RETURN"),
            Stmt::Input(target) => write!(f, "INPUT {target}"),
            Stmt::Output(values) => write!(f, "OUTPUT {}", join(values)),
            Stmt::OpenFile { file, mode } => write!(f, "OPENFILE {file} FOR {mode}"),
            Stmt::CloseFile(file) => write!(f, "CLOSEFILE {file}"),
            Stmt::ReadFile { file, target } => write!(f, "READFILE {file}, {target}"),
            Stmt::WriteFile { file, data } => write!(f, "WRITEFILE {file}, {data}"),
            Stmt::TypeDecl { name, definition } => match definition {
                TypeDefinition::Record(fields) => {
                    writeln!(f, "TYPE {name}")?;
                    for field in fields {
                        writeln!(f, "{INDENT}DECLARE {} : {}", field.name, field.data_type)?;
                    }
                    write!(f, "ENDTYPE")
                }
                TypeDefinition::Enum(values) => write!(f, "TYPE {name} = ({})", values.join(", ")),
                TypeDefinition::Pointer(target) => write!(f, "TYPE {name} = ^{target}"),
            },
            Stmt::Class(class) => {
                write!(f, "CLASS {}", class.name)?;
                if let Some(parent) = &class.parent {
                    write!(f, " INHERITS {parent}")?;
                }
                writeln!(f)?;
                write_block(f, &class.members)?;
                write!(f, "ENDCLASS")
            }
            Stmt::Expression(expr) => write!(f, "{expr}"),
        }
    }
}

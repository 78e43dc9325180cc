//! Expression AST nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Variable, routine, class or builtin name
    Ident(String),
    IntegerLit(i64),
    RealLit(f64),
    StringLit(String),
    CharLit(char),
    BoolLit(bool),

    /// Unary operation: `-x`, `NOT x`
    Prefix { op: PrefixOp, operand: Box<Expr> },

    /// Binary operation
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Element access: `a[i]`, `grid[r, c]`
    ArrayAccess { base: Box<Expr>, indices: Vec<Expr> },

    /// Field or method access: `rec.field`, `obj.Method`
    MemberAccess { base: Box<Expr>, member: String },

    /// Call: `f(a, b)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Instantiation: `NEW Class(args)`
    New { class: String, args: Vec<Expr> },

    /// `SUPER`, only meaningful inside a method
    Super,

    /// `start TO end`, only produced inside CASE selectors
    Range { start: Box<Expr>, end: Box<Expr> },
}

impl Expr {
    /// True when the expression can appear on the left of `<-`
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_) | Expr::ArrayAccess { .. } | Expr::MemberAccess { .. }
        )
    }
}

/// Render a real so that it lexes back as a real literal
pub fn format_real_literal(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::IntegerLit(n) => write!(f, "{n}"),
            Expr::RealLit(r) => f.write_str(&format_real_literal(*r)),
            Expr::StringLit(s) => write!(f, "\"{s}\""),
            Expr::CharLit(c) => write!(f, "'{c}'"),
            Expr::BoolLit(true) => f.write_str("TRUE"),
            Expr::BoolLit(false) => f.write_str("FALSE"),
            Expr::Prefix { op: PrefixOp::Neg, operand } => write!(f, "(-{operand})"),
            Expr::Prefix { op: PrefixOp::Not, operand } => write!(f, "(NOT {operand})"),
            Expr::Infix { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::ArrayAccess { base, indices } => write!(f, "{base}[{}]", join(indices)),
            Expr::MemberAccess { base, member } => write!(f, "{base}.{member}"),
            Expr::Call { callee, args } => write!(f, "{callee}({})", join(args)),
            Expr::New { class, args } => write!(f, "NEW {class}({})", join(args)),
            Expr::Super => f.write_str("SUPER"),
            Expr::Range { start, end } => write!(f, "{start} TO {end}"),
        }
    }
}

/// Prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Neg => write!(f, "-"),
            PrefixOp::Not => write!(f, "NOT"),
        }
    }
}

/// Infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfixOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,

    // String
    Concat,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    // Logical
    And,
    Or,
}

impl InfixOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            InfixOp::Eq | InfixOp::Ne | InfixOp::Lt | InfixOp::Gt | InfixOp::Le | InfixOp::Ge
        )
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfixOp::Add => write!(f, "+"),
            InfixOp::Sub => write!(f, "-"),
            InfixOp::Mul => write!(f, "*"),
            InfixOp::Div => write!(f, "/"),
            InfixOp::IntDiv => write!(f, "DIV"),
            InfixOp::Mod => write!(f, "MOD"),
            InfixOp::Concat => write!(f, "&"),
            InfixOp::Eq => write!(f, "="),
            InfixOp::Ne => write!(f, "<>"),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Gt => write!(f, ">"),
            InfixOp::Le => write!(f, "<="),
            InfixOp::Ge => write!(f, ">="),
            InfixOp::And => write!(f, "AND"),
            InfixOp::Or => write!(f, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Box<Expr> {
        Box::new(Expr::IntegerLit(n))
    }

    #[test]
    fn test_display_infix_is_parenthesised() {
        let e = Expr::Infix {
            op: InfixOp::Add,
            left: int(1),
            right: Box::new(Expr::Infix {
                op: InfixOp::Mul,
                left: int(2),
                right: int(3),
            }),
        };
        assert_eq!(e.to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn test_display_prefix() {
        let neg = Expr::Prefix { op: PrefixOp::Neg, operand: int(5) };
        let not = Expr::Prefix { op: PrefixOp::Not, operand: Box::new(Expr::BoolLit(true)) };
        assert_eq!(neg.to_string(), "(-5)");
        assert_eq!(not.to_string(), "(NOT TRUE)");
    }

    #[test]
    fn test_display_access_and_calls() {
        let access = Expr::ArrayAccess {
            base: Box::new(Expr::Ident("grid".into())),
            indices: vec![Expr::IntegerLit(1), Expr::Ident("j".into())],
        };
        assert_eq!(access.to_string(), "grid[1, j]");

        let call = Expr::Call {
            callee: Box::new(Expr::MemberAccess {
                base: Box::new(Expr::Super),
                member: "Speak".into(),
            }),
            args: vec![],
        };
        assert_eq!(call.to_string(), "SUPER.Speak()");

        let new = Expr::New {
            class: "Dog".into(),
            args: vec![Expr::StringLit("Rex".into())],
        };
        assert_eq!(new.to_string(), "NEW Dog(\"Rex\")");
    }

    #[test]
    fn test_real_literal_keeps_decimal_point() {
        assert_eq!(format_real_literal(2.5), "2.5");
        assert_eq!(format_real_literal(3.0), "3.0");
        assert_eq!(format_real_literal(1e20), "100000000000000000000.0");
    }

    #[test]
    fn test_char_and_bool_display() {
        assert_eq!(Expr::CharLit('x').to_string(), "'x'");
        assert_eq!(Expr::BoolLit(false).to_string(), "FALSE");
    }

    #[test]
    fn test_is_assignable() {
        assert!(Expr::Ident("x".into()).is_assignable());
        assert!(!Expr::IntegerLit(1).is_assignable());
        assert!(!Expr::Super.is_assignable());
    }
}

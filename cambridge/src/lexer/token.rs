//! Token definitions

use crate::ast::{Position, Span};
use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudocode token kind
///
/// Keywords match in any letter case; identifiers keep the case they were
/// written in.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Special
    #[token("\n")]
    Newline,
    /// Unrecognised input
    Illegal,
    /// End of input, always the last token
    Eof,

    // Literals
    #[regex(r"[0-9]+")]
    IntegerLit,
    #[regex(r"[0-9]+\.[0-9]+")]
    RealLit,
    #[regex(r#""[^"\n]*""#)]
    StringLit,
    #[regex(r"'[^'\n]'")]
    CharLit,
    #[token("TRUE", ignore(ascii_case))]
    True,
    #[token("FALSE", ignore(ascii_case))]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // Data types
    #[token("INTEGER", ignore(ascii_case))]
    Integer,
    #[token("REAL", ignore(ascii_case))]
    Real,
    #[token("STRING", ignore(ascii_case))]
    String,
    #[token("CHAR", ignore(ascii_case))]
    Char,
    #[token("BOOLEAN", ignore(ascii_case))]
    Boolean,
    #[token("DATE", ignore(ascii_case))]
    Date,
    #[token("ARRAY", ignore(ascii_case))]
    Array,
    #[token("OF", ignore(ascii_case))]
    Of,
    #[token("SET", ignore(ascii_case))]
    Set,

    // Declarations
    #[token("DECLARE", ignore(ascii_case))]
    Declare,
    #[token("CONSTANT", ignore(ascii_case))]
    Constant,
    #[token("TYPE", ignore(ascii_case))]
    Type,
    #[token("ENDTYPE", ignore(ascii_case))]
    EndType,
    #[token("DEFINE", ignore(ascii_case))]
    Define,

    // Assignment
    #[token("<-")]
    #[token("←")]
    Assign,

    // Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("MOD", ignore(ascii_case))]
    Mod,
    #[token("DIV", ignore(ascii_case))]
    Div,

    // Comparison
    #[token("=")]
    Eq,
    #[token("<>")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    // Logical
    #[token("AND", ignore(ascii_case))]
    And,
    #[token("OR", ignore(ascii_case))]
    Or,
    #[token("NOT", ignore(ascii_case))]
    Not,

    #[token("&")]
    Ampersand,

    // Selection
    #[token("IF", ignore(ascii_case))]
    If,
    #[token("THEN", ignore(ascii_case))]
    Then,
    #[token("ELSE", ignore(ascii_case))]
    Else,
    #[token("ENDIF", ignore(ascii_case))]
    EndIf,
    #[token("CASE", ignore(ascii_case))]
    Case,
    #[token("OTHERWISE", ignore(ascii_case))]
    Otherwise,
    #[token("ENDCASE", ignore(ascii_case))]
    EndCase,

    // Iteration
    #[token("FOR", ignore(ascii_case))]
    For,
    #[token("TO", ignore(ascii_case))]
    To,
    #[token("STEP", ignore(ascii_case))]
    Step,
    #[token("NEXT", ignore(ascii_case))]
    Next,
    #[token("WHILE", ignore(ascii_case))]
    While,
    #[token("ENDWHILE", ignore(ascii_case))]
    EndWhile,
    #[token("REPEAT", ignore(ascii_case))]
    Repeat,
    #[token("UNTIL", ignore(ascii_case))]
    Until,

    // Routines
    #[token("PROCEDURE", ignore(ascii_case))]
    Procedure,
    #[token("ENDPROCEDURE", ignore(ascii_case))]
    EndProcedure,
    #[token("FUNCTION", ignore(ascii_case))]
    Function,
    #[token("ENDFUNCTION", ignore(ascii_case))]
    EndFunction,
    #[token("CALL", ignore(ascii_case))]
    Call,
    #[token("RETURN", ignore(ascii_case))]
    Return,
    #[token("RETURNS", ignore(ascii_case))]
    Returns,
    #[token("BYVAL", ignore(ascii_case))]
    ByVal,
    #[token("BYREF", ignore(ascii_case))]
    ByRef,

    // Console I/O
    #[token("INPUT", ignore(ascii_case))]
    Input,
    #[token("OUTPUT", ignore(ascii_case))]
    Output,

    // Files
    #[token("OPENFILE", ignore(ascii_case))]
    OpenFile,
    #[token("CLOSEFILE", ignore(ascii_case))]
    CloseFile,
    #[token("READFILE", ignore(ascii_case))]
    ReadFile,
    #[token("WRITEFILE", ignore(ascii_case))]
    WriteFile,
    #[token("READ", ignore(ascii_case))]
    Read,
    #[token("WRITE", ignore(ascii_case))]
    Write,
    #[token("APPEND", ignore(ascii_case))]
    Append,

    // Classes
    #[token("CLASS", ignore(ascii_case))]
    Class,
    #[token("ENDCLASS", ignore(ascii_case))]
    EndClass,
    #[token("INHERITS", ignore(ascii_case))]
    Inherits,
    #[token("PUBLIC", ignore(ascii_case))]
    Public,
    #[token("PRIVATE", ignore(ascii_case))]
    Private,
    #[token("NEW", ignore(ascii_case))]
    New,
    #[token("SUPER", ignore(ascii_case))]
    Super,

    // Punctuation
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("^")]
    Caret,
}

impl TokenKind {
    /// Upper-case name used in diagnostics
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Newline => "NEWLINE",
            Illegal => "ILLEGAL",
            Eof => "EOF",
            IntegerLit => "INTEGER_LIT",
            RealLit => "REAL_LIT",
            StringLit => "STRING_LIT",
            CharLit => "CHAR_LIT",
            True => "TRUE",
            False => "FALSE",
            Ident => "IDENT",
            Integer => "INTEGER",
            Real => "REAL",
            String => "STRING",
            Char => "CHAR",
            Boolean => "BOOLEAN",
            Date => "DATE",
            Array => "ARRAY",
            Of => "OF",
            Set => "SET",
            Declare => "DECLARE",
            Constant => "CONSTANT",
            Type => "TYPE",
            EndType => "ENDTYPE",
            Define => "DEFINE",
            Assign => "ASSIGN",
            Plus => "PLUS",
            Minus => "MINUS",
            Asterisk => "ASTERISK",
            Slash => "SLASH",
            Mod => "MOD",
            Div => "DIV",
            Eq => "EQ",
            NotEq => "NOT_EQ",
            Lt => "LT",
            Gt => "GT",
            LtEq => "LT_EQ",
            GtEq => "GT_EQ",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            Ampersand => "AMPERSAND",
            If => "IF",
            Then => "THEN",
            Else => "ELSE",
            EndIf => "ENDIF",
            Case => "CASE",
            Otherwise => "OTHERWISE",
            EndCase => "ENDCASE",
            For => "FOR",
            To => "TO",
            Step => "STEP",
            Next => "NEXT",
            While => "WHILE",
            EndWhile => "ENDWHILE",
            Repeat => "REPEAT",
            Until => "UNTIL",
            Procedure => "PROCEDURE",
            EndProcedure => "ENDPROCEDURE",
            Function => "FUNCTION",
            EndFunction => "ENDFUNCTION",
            Call => "CALL",
            Return => "RETURN",
            Returns => "RETURNS",
            ByVal => "BYVAL",
            ByRef => "BYREF",
            Input => "INPUT",
            Output => "OUTPUT",
            OpenFile => "OPENFILE",
            CloseFile => "CLOSEFILE",
            ReadFile => "READFILE",
            WriteFile => "WRITEFILE",
            Read => "READ",
            Write => "WRITE",
            Append => "APPEND",
            Class => "CLASS",
            EndClass => "ENDCLASS",
            Inherits => "INHERITS",
            Public => "PUBLIC",
            Private => "PRIVATE",
            New => "NEW",
            Super => "SUPER",
            Colon => "COLON",
            Comma => "COMMA",
            Dot => "DOT",
            LParen => "LPAREN",
            RParen => "RPAREN",
            LBracket => "LBRACKET",
            RBracket => "RBRACKET",
            Caret => "CARET",
        }
    }

    /// Reserved words, as opposed to literals, operators and punctuation
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        !matches!(
            self,
            Newline
                | Illegal
                | Eof
                | IntegerLit
                | RealLit
                | StringLit
                | CharLit
                | Ident
                | Assign
                | Plus
                | Minus
                | Asterisk
                | Slash
                | Eq
                | NotEq
                | Lt
                | Gt
                | LtEq
                | GtEq
                | Ampersand
                | Colon
                | Comma
                | Dot
                | LParen
                | RParen
                | LBracket
                | RBracket
                | Caret
        )
    }

    /// Word operators that the LSP highlights as operators, not keywords
    pub fn is_word_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Mod | TokenKind::Div | TokenKind::And | TokenKind::Or | TokenKind::Not
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every keyword spelling, used for completion and REPL help
pub const KEYWORDS: &[&str] = &[
    "INTEGER", "REAL", "STRING", "CHAR", "BOOLEAN", "DATE", "ARRAY", "OF", "SET", "TRUE", "FALSE",
    "DECLARE", "CONSTANT", "TYPE", "ENDTYPE", "DEFINE", "MOD", "DIV", "AND", "OR", "NOT", "IF",
    "THEN", "ELSE", "ENDIF", "CASE", "OTHERWISE", "ENDCASE", "FOR", "TO", "STEP", "NEXT", "WHILE",
    "ENDWHILE", "REPEAT", "UNTIL", "PROCEDURE", "ENDPROCEDURE", "FUNCTION", "ENDFUNCTION", "CALL",
    "RETURN", "RETURNS", "BYVAL", "BYREF", "INPUT", "OUTPUT", "OPENFILE", "CLOSEFILE", "READFILE",
    "WRITEFILE", "READ", "WRITE", "APPEND", "CLASS", "ENDCLASS", "INHERITS", "PUBLIC", "PRIVATE",
    "NEW", "SUPER",
];

/// A scanned token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text; quotes are stripped from string and char literals
    pub literal: String,
    pub line: usize,
    pub column: usize,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        literal: impl Into<String>,
        line: usize,
        column: usize,
        span: Span,
    ) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
            span,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Newline => write!(f, "{}:{} NEWLINE", self.line, self.column),
            TokenKind::Eof => write!(f, "{}:{} EOF", self.line, self.column),
            kind => write!(f, "{}:{} {kind} {:?}", self.line, self.column, self.literal),
        }
    }
}

//! Recursive-descent statement parser with Pratt expression parsing
//!
//! The parser keeps a two-token window (`cur`, `peek`). Every statement
//! parser is entered with `cur` on the statement's first token and leaves
//! `cur` on its last token; block loops advance past it.
//!
//! Errors never abort the parse. A failed statement is recorded and the
//! parser resumes at the next NEWLINE.

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind, tokenize};

#[cfg(test)]
mod tests;

type ParseResult<T> = Result<T, SyntaxError>;

/// Binding power of an operator appearing in infix position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
    Member,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
                Precedence::LessGreater
            }
            TokenKind::Plus | TokenKind::Minus | TokenKind::Ampersand => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Div | TokenKind::Mod => {
                Precedence::Product
            }
            TokenKind::LParen => Precedence::Call,
            TokenKind::LBracket => Precedence::Index,
            TokenKind::Dot => Precedence::Member,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Asterisk => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::Div => InfixOp::IntDiv,
        TokenKind::Mod => InfixOp::Mod,
        TokenKind::Ampersand => InfixOp::Concat,
        TokenKind::Eq => InfixOp::Eq,
        TokenKind::NotEq => InfixOp::Ne,
        TokenKind::Lt => InfixOp::Lt,
        TokenKind::Gt => InfixOp::Gt,
        TokenKind::LtEq => InfixOp::Le,
        TokenKind::GtEq => InfixOp::Ge,
        TokenKind::And => InfixOp::And,
        TokenKind::Or => InfixOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Parse a token stream into a program plus every syntax error found
pub fn parse_program(tokens: Vec<Token>) -> (Program, Vec<SyntaxError>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.errors)
}

/// Tokenize and parse in one step
pub fn parse_source(source: &str) -> (Program, Vec<SyntaxError>) {
    parse_program(tokenize(source))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column + 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column, Span::new(end, end)));
        }
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // ============ TOKEN WINDOW ============

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while self.cur_is(TokenKind::Newline) {
            self.advance();
        }
    }

    /// First token after `cur` that is not a NEWLINE
    fn peek_past_newlines(&self) -> TokenKind {
        self.tokens[self.pos + 1..]
            .iter()
            .find(|t| t.kind != TokenKind::Newline)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let tok = self.cur();
        SyntaxError::new(message, tok.line, tok.column, tok.span)
    }

    fn peek_error(&self, expected: TokenKind) -> SyntaxError {
        self.error(format!(
            "expected next token to be {expected}, got {} instead",
            self.peek().kind
        ))
    }

    fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_is(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.peek_error(kind))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        self.expect_peek(TokenKind::Ident)?;
        Ok(self.cur().literal.clone())
    }

    /// Record a missing block terminator when the block ran into EOF
    fn check_terminated(&mut self, terminator: TokenKind) -> bool {
        if self.cur_is(TokenKind::Eof) {
            let err = self.error(format!("missing {terminator} before end of input"));
            self.errors.push(err);
            false
        } else {
            true
        }
    }

    /// Skip to the NEWLINE ending the current line
    fn synchronize(&mut self) {
        while !self.cur_is(TokenKind::Newline) && !self.cur_is(TokenKind::Eof) {
            self.advance();
        }
    }

    // ============ STATEMENTS ============

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.cur_is(TokenKind::Eof) {
                break;
            }
            if let Some(stmt) = self.parse_statement_recovering() {
                statements.push(stmt);
            }
            self.advance();
        }
        Program::new(statements)
    }

    fn parse_statement_recovering(&mut self) -> Option<Spanned<Stmt>> {
        let pos = self.cur().position();
        match self.parse_statement() {
            Ok(stmt) => Some(Spanned::new(stmt, pos)),
            Err(err) => {
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    /// Parse statements until `cur` is one of `terminators` or EOF
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Block {
        let mut body = Vec::new();
        while !terminators.contains(&self.cur().kind) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement_recovering() {
                body.push(stmt);
            }
            self.advance();
            self.skip_newlines();
        }
        body
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.cur().kind {
            TokenKind::Declare => self.parse_declare(),
            TokenKind::Constant => self.parse_constant(),
            TokenKind::If => self.parse_if(),
            TokenKind::Case => self.parse_case(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Procedure => self.parse_procedure(None).map(Stmt::Procedure),
            TokenKind::Function => self.parse_function(None).map(Stmt::Function),
            TokenKind::Call => self.parse_call(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Input => {
                self.advance();
                Ok(Stmt::Input(self.parse_expression(Precedence::Lowest)?))
            }
            TokenKind::Output => self.parse_output(),
            TokenKind::OpenFile => self.parse_open_file(),
            TokenKind::CloseFile => {
                self.advance();
                Ok(Stmt::CloseFile(self.parse_expression(Precedence::Lowest)?))
            }
            TokenKind::ReadFile => {
                let (file, target) = self.parse_file_pair()?;
                Ok(Stmt::ReadFile { file, target })
            }
            TokenKind::WriteFile => {
                let (file, data) = self.parse_file_pair()?;
                Ok(Stmt::WriteFile { file, data })
            }
            TokenKind::Type => self.parse_type(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Public | TokenKind::Private => self.parse_access_modified(),
            _ => self.parse_assignment_or_expression(),
        }
    }

    fn parse_declare(&mut self) -> ParseResult<Stmt> {
        let name = self.expect_ident()?;
        self.expect_peek(TokenKind::Colon)?;
        self.advance();
        let data_type = self.parse_data_type()?;
        Ok(Stmt::Declare { name, data_type })
    }

    fn parse_constant(&mut self) -> ParseResult<Stmt> {
        let name = self.expect_ident()?;
        // `CONSTANT Pi ← 3.14` is accepted alongside `CONSTANT Pi = 3.14`
        if self.peek_is(TokenKind::Assign) {
            self.advance();
        } else {
            self.expect_peek(TokenKind::Eq)?;
        }
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok(Stmt::Constant { name, value })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::Newline) && self.peek_past_newlines() == TokenKind::Then {
            self.advance();
            self.skip_newlines();
        } else {
            self.expect_peek(TokenKind::Then)?;
        }
        self.advance();
        self.skip_newlines();

        let then_branch = self.parse_block(&[TokenKind::Else, TokenKind::EndIf]);
        let mut else_branch = None;
        if self.cur_is(TokenKind::Else) {
            self.advance();
            self.skip_newlines();
            else_branch = Some(self.parse_block(&[TokenKind::EndIf]));
        }
        self.check_terminated(TokenKind::EndIf);

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_case(&mut self) -> ParseResult<Stmt> {
        self.expect_peek(TokenKind::Of)?;
        self.advance();
        let subject = self.parse_expression(Precedence::Lowest)?;
        self.advance();
        self.skip_newlines();

        let mut clauses = Vec::new();
        while !matches!(
            self.cur().kind,
            TokenKind::Otherwise | TokenKind::EndCase | TokenKind::Eof
        ) {
            match self.parse_case_clause() {
                Ok(clause) => clauses.push(clause),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                    self.advance();
                }
            }
            self.skip_newlines();
        }

        let mut otherwise = None;
        if self.cur_is(TokenKind::Otherwise) {
            if self.peek_is(TokenKind::Colon) {
                self.advance();
            }
            self.advance();
            self.skip_newlines();
            otherwise = Some(self.parse_block(&[TokenKind::EndCase]));
        }
        self.check_terminated(TokenKind::EndCase);

        Ok(Stmt::Case {
            subject,
            clauses,
            otherwise,
        })
    }

    fn parse_case_clause(&mut self) -> ParseResult<CaseClause> {
        let mut selectors = Vec::new();
        loop {
            let value = self.parse_expression(Precedence::Lowest)?;
            if self.peek_is(TokenKind::To) {
                self.advance();
                self.advance();
                let end = self.parse_expression(Precedence::Lowest)?;
                selectors.push(Expr::Range {
                    start: Box::new(value),
                    end: Box::new(end),
                });
            } else {
                selectors.push(value);
            }

            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.advance();
            self.advance();
        }

        self.expect_peek(TokenKind::Colon)?;
        self.advance();
        self.skip_newlines();

        let mut body = Vec::new();
        while !matches!(
            self.cur().kind,
            TokenKind::Otherwise | TokenKind::EndCase | TokenKind::Eof
        ) {
            if self.is_start_of_case_value() {
                break;
            }
            if let Some(stmt) = self.parse_statement_recovering() {
                body.push(stmt);
            }
            self.advance();
            self.skip_newlines();
        }

        Ok(CaseClause { selectors, body })
    }

    /// A literal or identifier followed by `:`, `TO` or `,` opens a new clause
    fn is_start_of_case_value(&self) -> bool {
        matches!(
            self.cur().kind,
            TokenKind::IntegerLit
                | TokenKind::RealLit
                | TokenKind::StringLit
                | TokenKind::CharLit
                | TokenKind::Ident
        ) && matches!(
            self.peek().kind,
            TokenKind::Colon | TokenKind::To | TokenKind::Comma
        )
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let variable = self.expect_ident()?;
        self.expect_peek(TokenKind::Assign)?;
        self.advance();
        let start = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::To)?;
        self.advance();
        let end = self.parse_expression(Precedence::Lowest)?;

        let mut step = None;
        if self.peek_is(TokenKind::Step) {
            self.advance();
            self.advance();
            step = Some(self.parse_expression(Precedence::Lowest)?);
        }

        self.advance();
        self.skip_newlines();
        let body = self.parse_block(&[TokenKind::Next]);

        if self.check_terminated(TokenKind::Next) && self.peek_is(TokenKind::Ident) {
            self.advance();
        }

        Ok(Stmt::For {
            variable,
            start,
            end,
            step,
            body,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.advance();
        self.skip_newlines();
        let body = self.parse_block(&[TokenKind::EndWhile]);
        self.check_terminated(TokenKind::EndWhile);
        Ok(Stmt::While { condition, body })
    }

    fn parse_repeat(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.skip_newlines();
        let body = self.parse_block(&[TokenKind::Until]);
        if !self.check_terminated(TokenKind::Until) {
            return Ok(Stmt::Repeat {
                body,
                condition: Expr::BoolLit(true),
            });
        }
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        Ok(Stmt::Repeat { body, condition })
    }

    /// Routine name; `NEW` is accepted so classes can declare constructors
    fn expect_routine_name(&mut self) -> ParseResult<String> {
        if self.peek_is(TokenKind::New) {
            self.advance();
            return Ok("NEW".to_string());
        }
        self.expect_ident()
    }

    fn parse_procedure(&mut self, access: Option<Access>) -> ParseResult<RoutineDecl> {
        let name = self.expect_routine_name()?;
        let params = self.parse_optional_parameters()?;
        self.advance();
        self.skip_newlines();
        let body = self.parse_block(&[TokenKind::EndProcedure]);
        self.check_terminated(TokenKind::EndProcedure);
        Ok(RoutineDecl {
            name,
            params,
            returns: None,
            body,
            access,
        })
    }

    fn parse_function(&mut self, access: Option<Access>) -> ParseResult<RoutineDecl> {
        let name = self.expect_ident()?;
        let params = self.parse_optional_parameters()?;
        self.expect_peek(TokenKind::Returns)?;
        self.advance();
        let returns = self.parse_data_type()?;
        self.advance();
        self.skip_newlines();
        let body = self.parse_block(&[TokenKind::EndFunction]);
        self.check_terminated(TokenKind::EndFunction);
        Ok(RoutineDecl {
            name,
            params,
            returns: Some(returns),
            body,
            access,
        })
    }

    /// `(params)` after a routine name; the list may be omitted entirely
    fn parse_optional_parameters(&mut self) -> ParseResult<Vec<Param>> {
        if !self.peek_is(TokenKind::LParen) {
            return Ok(Vec::new());
        }
        self.advance();
        let params = self.parse_parameters()?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            return Ok(params);
        }
        self.advance();

        let mut mode = ParamMode::ByVal;
        loop {
            match self.cur().kind {
                TokenKind::ByRef => {
                    mode = ParamMode::ByRef;
                    self.advance();
                }
                TokenKind::ByVal => {
                    mode = ParamMode::ByVal;
                    self.advance();
                }
                _ => {}
            }

            if !self.cur_is(TokenKind::Ident) {
                return Err(self.error("expected parameter name"));
            }
            let name = self.cur().literal.clone();
            self.expect_peek(TokenKind::Colon)?;
            self.advance();
            let data_type = self.parse_data_type()?;
            params.push(Param {
                name,
                data_type,
                mode,
            });

            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.advance();
            self.advance();
        }
        Ok(params)
    }

    fn parse_call(&mut self) -> ParseResult<Stmt> {
        self.advance();
        match self.parse_expression(Precedence::Lowest)? {
            Expr::Call { callee, args } => Ok(Stmt::Call {
                callee: *callee,
                args,
            }),
            callee => Ok(Stmt::Call {
                callee,
                args: Vec::new(),
            }),
        }
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        if self.peek_is(TokenKind::Newline) || self.peek_is(TokenKind::Eof) {
            return Ok(Stmt::Return(None));
        }
        self.advance();
        Ok(Stmt::Return(Some(self.parse_expression(Precedence::Lowest)?)))
    }

    fn parse_output(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let mut values = vec![self.parse_expression(Precedence::Lowest)?];
        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.advance();
            values.push(self.parse_expression(Precedence::Lowest)?);
        }
        Ok(Stmt::Output(values))
    }

    fn parse_open_file(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let file = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::For)?;
        self.advance();
        let mode = match self.cur().kind {
            TokenKind::Read => FileMode::Read,
            TokenKind::Write => FileMode::Write,
            TokenKind::Append => FileMode::Append,
            _ => return Err(self.error("expected READ, WRITE, or APPEND after FOR")),
        };
        Ok(Stmt::OpenFile { file, mode })
    }

    /// `<file>, <expr>` operands shared by READFILE and WRITEFILE
    fn parse_file_pair(&mut self) -> ParseResult<(Expr, Expr)> {
        self.advance();
        let file = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Comma)?;
        self.advance();
        let operand = self.parse_expression(Precedence::Lowest)?;
        Ok((file, operand))
    }

    fn parse_type(&mut self) -> ParseResult<Stmt> {
        let name = self.expect_ident()?;

        let definition = if self.peek_is(TokenKind::Eq) {
            self.advance();
            self.advance();
            match self.cur().kind {
                TokenKind::Caret => {
                    self.advance();
                    TypeDefinition::Pointer(self.parse_data_type()?)
                }
                TokenKind::LParen => self.parse_enum_type()?,
                _ => {
                    return Err(self.error(format!(
                        "expected ^ or ( after =, got {}",
                        self.cur().kind
                    )));
                }
            }
        } else {
            self.advance();
            self.skip_newlines();
            self.parse_record_type()
        };

        Ok(Stmt::TypeDecl { name, definition })
    }

    fn parse_record_type(&mut self) -> TypeDefinition {
        let mut fields = Vec::new();
        while !self.cur_is(TokenKind::EndType) && !self.cur_is(TokenKind::Eof) {
            match self.parse_record_field() {
                Ok(field) => fields.push(field),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
            self.advance();
            self.skip_newlines();
        }
        self.check_terminated(TokenKind::EndType);
        TypeDefinition::Record(fields)
    }

    fn parse_record_field(&mut self) -> ParseResult<RecordField> {
        if !self.cur_is(TokenKind::Declare) {
            return Err(self.error(format!(
                "expected DECLARE or ENDTYPE, got {}",
                self.cur().kind
            )));
        }
        self.advance();
        if !self.cur_is(TokenKind::Ident) {
            return Err(self.error("expected field name"));
        }
        let name = self.cur().literal.clone();
        self.expect_peek(TokenKind::Colon)?;
        self.advance();
        let data_type = self.parse_data_type()?;
        Ok(RecordField { name, data_type })
    }

    fn parse_enum_type(&mut self) -> ParseResult<TypeDefinition> {
        let mut values = Vec::new();
        self.advance();
        while !self.cur_is(TokenKind::RParen) {
            match self.cur().kind {
                TokenKind::Ident => values.push(self.cur().literal.clone()),
                TokenKind::Comma => {}
                TokenKind::Eof | TokenKind::Newline => {
                    return Err(self.error("missing RPAREN in enumeration"));
                }
                other => return Err(self.error(format!("unexpected {other} in enumeration"))),
            }
            self.advance();
        }
        Ok(TypeDefinition::Enum(values))
    }

    fn parse_class(&mut self) -> ParseResult<Stmt> {
        let name = self.expect_ident()?;
        let mut parent = None;
        if self.peek_is(TokenKind::Inherits) {
            self.advance();
            parent = Some(self.expect_ident()?);
        }
        self.advance();
        self.skip_newlines();
        let members = self.parse_block(&[TokenKind::EndClass]);
        self.check_terminated(TokenKind::EndClass);
        Ok(Stmt::Class(ClassDecl {
            name,
            parent,
            members,
        }))
    }

    fn parse_access_modified(&mut self) -> ParseResult<Stmt> {
        let access = if self.cur_is(TokenKind::Public) {
            Access::Public
        } else {
            Access::Private
        };
        self.advance();
        match self.cur().kind {
            TokenKind::Procedure => self.parse_procedure(Some(access)).map(Stmt::Procedure),
            TokenKind::Function => self.parse_function(Some(access)).map(Stmt::Function),
            TokenKind::Declare => self.parse_declare(),
            _ => Err(self.error("expected PROCEDURE, FUNCTION, or DECLARE after access modifier")),
        }
    }

    fn parse_assignment_or_expression(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Assign) {
            self.advance();
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            return Ok(Stmt::Assignment {
                target: expr,
                value,
            });
        }
        Ok(Stmt::Expression(expr))
    }

    // ============ DATA TYPES ============

    fn parse_data_type(&mut self) -> ParseResult<DataType> {
        let primitive = match self.cur().kind {
            TokenKind::Integer => PrimitiveType::Integer,
            TokenKind::Real => PrimitiveType::Real,
            TokenKind::String => PrimitiveType::String,
            TokenKind::Char => PrimitiveType::Char,
            TokenKind::Boolean => PrimitiveType::Boolean,
            TokenKind::Date => PrimitiveType::Date,
            TokenKind::Array => return self.parse_array_type(),
            TokenKind::Caret => {
                self.advance();
                return Ok(DataType::Pointer(Box::new(self.parse_data_type()?)));
            }
            TokenKind::Ident => return Ok(DataType::Custom(self.cur().literal.clone())),
            _ => {
                let found = match self.cur().kind {
                    TokenKind::Newline | TokenKind::Eof => self.cur().kind.to_string(),
                    _ => self.cur().literal.clone(),
                };
                return Err(self.error(format!("unexpected data type: {found}")));
            }
        };
        Ok(DataType::Primitive(primitive))
    }

    fn parse_array_type(&mut self) -> ParseResult<DataType> {
        self.expect_peek(TokenKind::LBracket)?;

        let mut dimensions = Vec::new();
        loop {
            self.advance();
            let lower = self.parse_bound("lower")?;
            self.expect_peek(TokenKind::Colon)?;
            self.advance();
            let upper = self.parse_bound("upper")?;
            dimensions.push(ArrayDimension::new(lower, upper));

            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect_peek(TokenKind::RBracket)?;
        self.expect_peek(TokenKind::Of)?;
        self.advance();
        let element = self.parse_data_type()?;

        Ok(DataType::Array {
            dimensions,
            element: Box::new(element),
        })
    }

    /// Integer literal array bound, optionally negated
    fn parse_bound(&mut self, which: &str) -> ParseResult<i64> {
        let negative = self.cur_is(TokenKind::Minus);
        if negative {
            self.advance();
        }
        if !self.cur_is(TokenKind::IntegerLit) {
            return Err(self.error(format!("expected integer for array {which} bound")));
        }
        let value: i64 = self
            .cur()
            .literal
            .parse()
            .map_err(|_| self.error(format!("expected integer for array {which} bound")))?;
        Ok(if negative { -value } else { value })
    }

    // ============ EXPRESSIONS ============

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Newline) && precedence < Precedence::of(self.peek().kind) {
            self.advance();
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let tok = self.cur();
        match tok.kind {
            TokenKind::Ident => Ok(Expr::Ident(tok.literal.clone())),
            TokenKind::IntegerLit => tok.literal.parse().map(Expr::IntegerLit).map_err(|_| {
                self.error(format!("could not parse {:?} as integer", tok.literal))
            }),
            TokenKind::RealLit => tok
                .literal
                .parse()
                .map(Expr::RealLit)
                .map_err(|_| self.error(format!("could not parse {:?} as real", tok.literal))),
            TokenKind::StringLit => Ok(Expr::StringLit(tok.literal.clone())),
            TokenKind::CharLit => Ok(Expr::CharLit(tok.literal.chars().next().unwrap_or(' '))),
            TokenKind::True => Ok(Expr::BoolLit(true)),
            TokenKind::False => Ok(Expr::BoolLit(false)),
            TokenKind::Super => Ok(Expr::Super),
            TokenKind::Minus | TokenKind::Not => {
                let op = if tok.kind == TokenKind::Minus {
                    PrefixOp::Neg
                } else {
                    PrefixOp::Not
                };
                self.advance();
                let operand = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Prefix {
                    op,
                    operand: Box::new(operand),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::New => {
                let class = self.expect_ident()?;
                self.expect_peek(TokenKind::LParen)?;
                let args = self.parse_expression_list(TokenKind::RParen)?;
                Ok(Expr::New { class, args })
            }
            TokenKind::Illegal => {
                Err(self.error(format!("unexpected character: {:?}", tok.literal)))
            }
            kind => Err(self.error(format!("no prefix parse function for {kind}"))),
        }
    }

    fn parse_infix(&mut self, left: Expr) -> ParseResult<Expr> {
        let kind = self.cur().kind;
        match kind {
            TokenKind::LParen => {
                let args = self.parse_expression_list(TokenKind::RParen)?;
                Ok(Expr::Call {
                    callee: Box::new(left),
                    args,
                })
            }
            TokenKind::LBracket => {
                let indices = self.parse_expression_list(TokenKind::RBracket)?;
                Ok(Expr::ArrayAccess {
                    base: Box::new(left),
                    indices,
                })
            }
            TokenKind::Dot => {
                let member = if self.peek_is(TokenKind::New) {
                    self.advance();
                    "NEW".to_string()
                } else {
                    self.expect_ident()?
                };
                Ok(Expr::MemberAccess {
                    base: Box::new(left),
                    member,
                })
            }
            _ => match infix_op(kind) {
                Some(op) => {
                    let precedence = Precedence::of(kind);
                    self.advance();
                    let right = self.parse_expression(precedence)?;
                    Ok(Expr::Infix {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                }
                None => Err(self.error(format!("no infix parse function for {kind}"))),
            },
        }
    }

    /// Comma-separated expressions; `cur` is the opening delimiter
    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.advance();
            return Ok(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }
}

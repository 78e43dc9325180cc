//! Pseudocode Language Server Protocol implementation
//!
//! Provides IDE features:
//! - Diagnostics (syntax errors, all of them, on every change)
//! - Hover (keywords, built-ins, user routines and declarations)
//! - Completion (keywords, built-ins, user symbols)
//! - Document symbols (routines, classes, types, declarations)
//! - Semantic tokens (lexer-driven highlighting)

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use crate::ast::{Spanned, Stmt, TypeDefinition};
use crate::error::SyntaxError;
use crate::interp::BUILTIN_DOCS;
use crate::lexer::{KEYWORDS, TokenKind, tokenize};
use crate::parser::parse_source;

/// Short descriptions shown when hovering a keyword
const KEYWORD_DOCS: &[(&str, &str)] = &[
    ("DECLARE", "`DECLARE name : type`\n\nDeclare a variable initialised to the type's default"),
    ("CONSTANT", "`CONSTANT name = value`\n\nBind a value that cannot be reassigned"),
    ("TYPE", "`TYPE Name ... ENDTYPE` or `TYPE Name = (A, B)`\n\nDeclare a record or enumerated type"),
    ("IF", "`IF condition THEN ... [ELSE ...] ENDIF`"),
    ("CASE", "`CASE OF value ... [OTHERWISE : ...] ENDCASE`\n\nSelectors may be values or `low TO high` ranges"),
    ("FOR", "`FOR i <- start TO end [STEP s] ... NEXT i`\n\nThe loop variable is local to the loop"),
    ("WHILE", "`WHILE condition ... ENDWHILE`"),
    ("REPEAT", "`REPEAT ... UNTIL condition`\n\nThe body runs at least once"),
    ("PROCEDURE", "`PROCEDURE Name(params) ... ENDPROCEDURE`"),
    ("FUNCTION", "`FUNCTION Name(params) RETURNS type ... ENDFUNCTION`"),
    ("CALL", "`CALL Name(args)`\n\nInvoke a procedure"),
    ("RETURN", "`RETURN [value]`\n\nLeave the current routine"),
    ("BYREF", "Parameter mode: the caller's variable receives the final value"),
    ("BYVAL", "Parameter mode: the routine works on a copy (default)"),
    ("INPUT", "`INPUT variable`\n\nRead a line from the console"),
    ("OUTPUT", "`OUTPUT a, b, ...`\n\nPrint values followed by a newline"),
    ("OPENFILE", "`OPENFILE \"name\" FOR READ | WRITE | APPEND`"),
    ("READFILE", "`READFILE \"name\", variable`\n\nRead the next line"),
    ("WRITEFILE", "`WRITEFILE \"name\", value`\n\nWrite a line"),
    ("CLOSEFILE", "`CLOSEFILE \"name\"`"),
    ("CLASS", "`CLASS Name [INHERITS Parent] ... ENDCLASS`"),
    ("NEW", "`NEW Class(args)`\n\nCreate an instance, running the NEW constructor if declared"),
    ("SUPER", "`SUPER.Method(args)`\n\nCall the parent class implementation"),
    ("DIV", "Integer division, truncating toward zero"),
    ("MOD", "Remainder of integer division"),
];

/// Semantic token legend, indexed by the `token_type` values we emit
const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::KEYWORD,
    SemanticTokenType::STRING,
    SemanticTokenType::NUMBER,
    SemanticTokenType::OPERATOR,
    SemanticTokenType::VARIABLE,
];

const TOKEN_KEYWORD: u32 = 0;
const TOKEN_STRING: u32 = 1;
const TOKEN_NUMBER: u32 = 2;
const TOKEN_OPERATOR: u32 = 3;
const TOKEN_VARIABLE: u32 = 4;

/// Symbol declared in a document
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDef {
    pub name: String,
    pub kind: SymbolKind,
    /// Type, signature or value shown by hover and completion
    pub detail: String,
    /// 0-based line of the declaring statement
    pub line: u32,
    pub children: Vec<SymbolDef>,
}

impl SymbolDef {
    fn new(name: &str, kind: SymbolKind, detail: impl Into<String>, line: u32) -> Self {
        SymbolDef {
            name: name.to_string(),
            kind,
            detail: detail.into(),
            line,
            children: Vec::new(),
        }
    }

    fn with_children(mut self, children: Vec<SymbolDef>) -> Self {
        self.children = children;
        self
    }
}

/// Document state
struct DocumentState {
    content: String,
    symbols: Vec<SymbolDef>,
}

/// Pseudocode Language Server Backend
pub struct Backend {
    client: Client,
    documents: RwLock<HashMap<Url, DocumentState>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Parse, cache symbols and publish diagnostics
    async fn analyze_document(&self, uri: Url, content: String, version: i32) {
        let (program, errors) = parse_source(&content);
        let diagnostics: Vec<Diagnostic> = errors
            .iter()
            .map(|e| error_to_diagnostic(e, &content))
            .collect();
        let symbols = collect_symbols(&program.statements);
        tracing::debug!(%uri, version, errors = errors.len(), symbols = symbols.len(), "analyzed");

        self.documents
            .write()
            .await
            .insert(uri.clone(), DocumentState { content, symbols });

        self.client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }
}

/// Convert a syntax error to an LSP diagnostic spanning the offending token
pub fn error_to_diagnostic(error: &SyntaxError, content: &str) -> Diagnostic {
    let line = error.line.saturating_sub(1) as u32;
    let character = error.column.saturating_sub(1) as u32;
    let width = content
        .get(error.span.start..error.span.end)
        .map_or(1, |text| text.chars().count().max(1)) as u32;

    Diagnostic {
        range: Range::new(
            Position::new(line, character),
            Position::new(line, character + width),
        ),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some("cambridge".to_string()),
        message: error.message.clone(),
        ..Default::default()
    }
}

/// Symbols declared by `block`, nested the way the source nests them
pub fn collect_symbols(block: &[Spanned<Stmt>]) -> Vec<SymbolDef> {
    let mut out = Vec::new();
    for stmt in block {
        collect_stmt(stmt, &mut out);
    }
    out
}

fn collect_stmt(stmt: &Spanned<Stmt>, out: &mut Vec<SymbolDef>) {
    let line = stmt.pos.line.saturating_sub(1) as u32;
    match &stmt.node {
        Stmt::Declare { name, data_type } => {
            out.push(SymbolDef::new(name, SymbolKind::VARIABLE, data_type.to_string(), line));
        }
        Stmt::Constant { name, value } => {
            out.push(SymbolDef::new(name, SymbolKind::CONSTANT, format!("= {value}"), line));
        }
        Stmt::Procedure(decl) | Stmt::Function(decl) => {
            let mut children: Vec<SymbolDef> = decl
                .params
                .iter()
                .map(|p| SymbolDef::new(&p.name, SymbolKind::VARIABLE, p.data_type.to_string(), line))
                .collect();
            children.extend(collect_symbols(&decl.body));
            out.push(
                SymbolDef::new(&decl.name, SymbolKind::FUNCTION, decl.signature(), line)
                    .with_children(children),
            );
        }
        Stmt::TypeDecl { name, definition } => {
            let symbol = match definition {
                TypeDefinition::Record(fields) => SymbolDef::new(name, SymbolKind::STRUCT, "record", line)
                    .with_children(
                        fields
                            .iter()
                            .map(|f| SymbolDef::new(&f.name, SymbolKind::FIELD, f.data_type.to_string(), line))
                            .collect(),
                    ),
                TypeDefinition::Enum(values) => SymbolDef::new(name, SymbolKind::ENUM, values.join(", "), line)
                    .with_children(
                        values
                            .iter()
                            .map(|v| SymbolDef::new(v, SymbolKind::ENUM_MEMBER, name.as_str(), line))
                            .collect(),
                    ),
                TypeDefinition::Pointer(target) => {
                    SymbolDef::new(name, SymbolKind::TYPE_PARAMETER, format!("^{target}"), line)
                }
            };
            out.push(symbol);
        }
        Stmt::Class(class) => {
            let mut members = Vec::new();
            for member in &class.members {
                let member_line = member.pos.line.saturating_sub(1) as u32;
                match &member.node {
                    Stmt::Declare { name, data_type } => members.push(SymbolDef::new(
                        name,
                        SymbolKind::FIELD,
                        data_type.to_string(),
                        member_line,
                    )),
                    Stmt::Procedure(decl) | Stmt::Function(decl) => {
                        let kind = if decl.name == "NEW" {
                            SymbolKind::CONSTRUCTOR
                        } else {
                            SymbolKind::METHOD
                        };
                        members.push(SymbolDef::new(&decl.name, kind, decl.signature(), member_line));
                    }
                    _ => {}
                }
            }
            let detail = match &class.parent {
                Some(parent) => format!("CLASS {} INHERITS {parent}", class.name),
                None => format!("CLASS {}", class.name),
            };
            out.push(SymbolDef::new(&class.name, SymbolKind::CLASS, detail, line).with_children(members));
        }
        // declarations inside control flow still belong to the enclosing scope
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            out.extend(collect_symbols(then_branch));
            if let Some(alt) = else_branch {
                out.extend(collect_symbols(alt));
            }
        }
        Stmt::Case {
            clauses, otherwise, ..
        } => {
            for clause in clauses {
                out.extend(collect_symbols(&clause.body));
            }
            if let Some(body) = otherwise {
                out.extend(collect_symbols(body));
            }
        }
        Stmt::For { body, .. } | Stmt::While { body, .. } | Stmt::Repeat { body, .. } => {
            out.extend(collect_symbols(body));
        }
        _ => {}
    }
}

/// Depth-first search by exact name
fn find_symbol<'a>(symbols: &'a [SymbolDef], name: &str) -> Option<&'a SymbolDef> {
    symbols.iter().find_map(|s| {
        if s.name == name {
            Some(s)
        } else {
            find_symbol(&s.children, name)
        }
    })
}

/// Markdown hover text for `word`
pub fn hover_text(word: &str, symbols: &[SymbolDef]) -> Option<String> {
    let upper = word.to_ascii_uppercase();
    if let Some((_, doc)) = KEYWORD_DOCS.iter().find(|(k, _)| *k == upper) {
        return Some(doc.to_string());
    }
    if let Some(symbol) = find_symbol(symbols, word) {
        return Some(format!("```\n{}\n```", symbol_signature(symbol)));
    }
    BUILTIN_DOCS
        .iter()
        .find(|(name, _, _)| *name == upper)
        .map(|(_, signature, description)| format!("```\n{signature}\n```\n\n{description}"))
}

fn symbol_signature(symbol: &SymbolDef) -> String {
    match symbol.kind {
        SymbolKind::VARIABLE | SymbolKind::FIELD => format!("DECLARE {} : {}", symbol.name, symbol.detail),
        SymbolKind::CONSTANT => format!("CONSTANT {} {}", symbol.name, symbol.detail),
        SymbolKind::STRUCT => format!("TYPE {}", symbol.name),
        SymbolKind::ENUM => format!("TYPE {} = ({})", symbol.name, symbol.detail),
        SymbolKind::TYPE_PARAMETER => format!("TYPE {} = {}", symbol.name, symbol.detail),
        SymbolKind::ENUM_MEMBER => format!("{} : {}", symbol.name, symbol.detail),
        _ => symbol.detail.clone(),
    }
}

/// Keywords, built-ins and every user symbol, each name once
pub fn completion_items(symbols: &[SymbolDef]) -> Vec<CompletionItem> {
    let mut items = Vec::new();

    for keyword in KEYWORDS {
        items.push(CompletionItem {
            label: keyword.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some("keyword".to_string()),
            ..Default::default()
        });
    }

    for (name, signature, _) in BUILTIN_DOCS {
        items.push(CompletionItem {
            label: name.to_string(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(signature.to_string()),
            insert_text: Some(format!("{name}($0)")),
            insert_text_format: Some(InsertTextFormat::SNIPPET),
            ..Default::default()
        });
    }

    let mut seen = HashSet::new();
    let mut stack: Vec<&SymbolDef> = symbols.iter().collect();
    while let Some(symbol) = stack.pop() {
        stack.extend(symbol.children.iter());
        if !seen.insert(symbol.name.clone()) {
            continue;
        }
        let kind = match symbol.kind {
            SymbolKind::FUNCTION => CompletionItemKind::FUNCTION,
            SymbolKind::METHOD => CompletionItemKind::METHOD,
            SymbolKind::CONSTRUCTOR => CompletionItemKind::CONSTRUCTOR,
            SymbolKind::CLASS => CompletionItemKind::CLASS,
            SymbolKind::STRUCT => CompletionItemKind::STRUCT,
            SymbolKind::ENUM => CompletionItemKind::ENUM,
            SymbolKind::ENUM_MEMBER => CompletionItemKind::ENUM_MEMBER,
            SymbolKind::CONSTANT => CompletionItemKind::CONSTANT,
            SymbolKind::FIELD => CompletionItemKind::FIELD,
            _ => CompletionItemKind::VARIABLE,
        };
        items.push(CompletionItem {
            label: symbol.name.clone(),
            kind: Some(kind),
            detail: Some(symbol_signature(symbol)),
            // user symbols sort ahead of the fixed vocabulary
            sort_text: Some(format!("!{}", symbol.name)),
            ..Default::default()
        });
    }

    items
}

/// Delta-encoded semantic tokens from the lexer
pub fn semantic_tokens(content: &str) -> Vec<SemanticToken> {
    let mut data = Vec::new();
    let mut last_line = 0u32;
    let mut last_start = 0u32;

    for token in tokenize(content) {
        let token_type = match token.kind {
            TokenKind::Newline | TokenKind::Eof | TokenKind::Illegal => continue,
            TokenKind::IntegerLit | TokenKind::RealLit => TOKEN_NUMBER,
            TokenKind::StringLit | TokenKind::CharLit => TOKEN_STRING,
            TokenKind::Ident => TOKEN_VARIABLE,
            kind if kind.is_word_operator() => TOKEN_OPERATOR,
            kind if kind.is_keyword() => TOKEN_KEYWORD,
            TokenKind::Assign
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Ampersand
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq => TOKEN_OPERATOR,
            _ => continue,
        };

        let line = token.line.saturating_sub(1) as u32;
        let start = token.column.saturating_sub(1) as u32;
        let length = content
            .get(token.span.start..token.span.end)
            .map_or(token.literal.chars().count(), |text| text.chars().count()) as u32;

        let delta_line = line - last_line;
        let delta_start = if delta_line == 0 { start - last_start } else { start };
        data.push(SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type,
            token_modifiers_bitset: 0,
        });
        last_line = line;
        last_start = start;
    }

    data
}

/// Identifier under the cursor
pub fn word_at(content: &str, position: Position) -> Option<String> {
    let line = content.lines().nth(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();
    let cursor = (position.character as usize).min(chars.len());

    let is_ident = |c: &char| c.is_alphanumeric() || *c == '_';
    let start = chars[..cursor]
        .iter()
        .rposition(|c| !is_ident(c))
        .map_or(0, |i| i + 1);
    let end = chars[cursor..]
        .iter()
        .position(|c| !is_ident(c))
        .map_or(chars.len(), |i| cursor + i);

    (start < end).then(|| chars[start..end].iter().collect())
}

/// Whole-line range of `symbol` plus the range of its name on that line
fn symbol_ranges(symbol: &SymbolDef, content: &str) -> (Range, Range) {
    let text = content.lines().nth(symbol.line as usize).unwrap_or("");
    let line_len = text.chars().count() as u32;
    let full = Range::new(Position::new(symbol.line, 0), Position::new(symbol.line, line_len));
    let selection = match text.find(symbol.name.as_str()) {
        Some(byte) => {
            let start = text[..byte].chars().count() as u32;
            let end = start + symbol.name.chars().count() as u32;
            Range::new(Position::new(symbol.line, start), Position::new(symbol.line, end))
        }
        None => full,
    };
    (full, selection)
}

#[allow(deprecated)]
fn to_document_symbol(symbol: &SymbolDef, content: &str) -> DocumentSymbol {
    let (range, selection_range) = symbol_ranges(symbol, content);
    let children: Vec<DocumentSymbol> = symbol
        .children
        .iter()
        .map(|child| to_document_symbol(child, content))
        .collect();
    DocumentSymbol {
        name: symbol.name.clone(),
        detail: Some(symbol.detail.clone()),
        kind: symbol.kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: (!children.is_empty()).then_some(children),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                document_symbol_provider: Some(OneOf::Left(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                        legend: SemanticTokensLegend {
                            token_types: TOKEN_TYPES.to_vec(),
                            token_modifiers: Vec::new(),
                        },
                        full: Some(SemanticTokensFullOptions::Bool(true)),
                        range: None,
                        ..Default::default()
                    }),
                ),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "cambridge-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Cambridge Pseudocode Language Server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.analyze_document(doc.uri, doc.text, doc.version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync - take the whole content
        if let Some(change) = params.content_changes.into_iter().next() {
            self.analyze_document(uri, change.text, version).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.write().await.remove(&params.text_document.uri);
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let docs = self.documents.read().await;
        let Some(doc) = docs.get(uri) else {
            return Ok(None);
        };
        let Some(word) = word_at(&doc.content, position) else {
            return Ok(None);
        };
        Ok(hover_text(&word, &doc.symbols).map(|value| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: None,
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let docs = self.documents.read().await;
        let symbols = docs.get(uri).map_or(&[][..], |doc| doc.symbols.as_slice());
        Ok(Some(CompletionResponse::Array(completion_items(symbols))))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let docs = self.documents.read().await;
        let Some(doc) = docs.get(&params.text_document.uri) else {
            return Ok(None);
        };
        let symbols = doc
            .symbols
            .iter()
            .map(|s| to_document_symbol(s, &doc.content))
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let docs = self.documents.read().await;
        let Some(doc) = docs.get(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data: semantic_tokens(&doc.content),
        })))
    }
}

/// Start the LSP server
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "CONSTANT Max = 10\nDECLARE Total : INTEGER\nFUNCTION Square(n : INTEGER) RETURNS INTEGER\n  RETURN n * n\nENDFUNCTION\nCLASS Pet\n  PRIVATE DECLARE Name : STRING\n  PUBLIC PROCEDURE NEW(n : STRING)\n    Name <- n\n  ENDPROCEDURE\nENDCLASS\nTYPE Season = (Spring, Summer)\n";

    fn symbols() -> Vec<SymbolDef> {
        let (program, errors) = parse_source(PROGRAM);
        assert!(errors.is_empty(), "{errors:?}");
        collect_symbols(&program.statements)
    }

    #[test]
    fn test_diagnostics_cover_offending_token() {
        let source = "DECLARE : INTEGER";
        let (_, errors) = parse_source(source);
        assert!(!errors.is_empty());
        let diagnostic = error_to_diagnostic(&errors[0], source);
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostic.range.start.line, 0);
        assert!(diagnostic.range.end.character > diagnostic.range.start.character);
    }

    #[test]
    fn test_collect_symbols_top_level() {
        let symbols = symbols();
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Max", "Total", "Square", "Pet", "Season"]);
        assert_eq!(symbols[2].kind, SymbolKind::FUNCTION);
        assert_eq!(symbols[2].line, 2);
        assert_eq!(symbols[2].children[0].name, "n");
    }

    #[test]
    fn test_class_members_are_children() {
        let symbols = symbols();
        let pet = &symbols[3];
        assert_eq!(pet.kind, SymbolKind::CLASS);
        let kinds: Vec<SymbolKind> = pet.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![SymbolKind::FIELD, SymbolKind::CONSTRUCTOR]);
        assert_eq!(pet.children[1].line, 7);
    }

    #[test]
    fn test_hover_sources() {
        let symbols = symbols();
        assert!(hover_text("declare", &symbols).is_some_and(|t| t.contains("DECLARE name")));
        assert!(hover_text("Square", &symbols).is_some_and(|t| t.contains("RETURNS INTEGER")));
        assert!(hover_text("LENGTH", &symbols).is_some_and(|t| t.contains("Number of characters")));
        assert!(hover_text("Total", &symbols).is_some_and(|t| t.contains("DECLARE Total : INTEGER")));
        assert!(hover_text("nothing", &symbols).is_none());
    }

    #[test]
    fn test_completion_includes_user_symbols_once() {
        let items = completion_items(&symbols());
        let count = |label: &str| items.iter().filter(|i| i.label == label).count();
        assert_eq!(count("Square"), 1);
        assert_eq!(count("Spring"), 1);
        assert_eq!(count("MID"), 1);
        assert_eq!(count("ENDWHILE"), 1);
    }

    #[test]
    fn test_semantic_tokens_delta_encoding() {
        let tokens = semantic_tokens("x <- 1\nOUTPUT \"hi\"");
        let raw: Vec<(u32, u32, u32, u32)> = tokens
            .iter()
            .map(|t| (t.delta_line, t.delta_start, t.length, t.token_type))
            .collect();
        assert_eq!(
            raw,
            vec![
                (0, 0, 1, TOKEN_VARIABLE),
                (0, 2, 2, TOKEN_OPERATOR),
                (0, 3, 1, TOKEN_NUMBER),
                (1, 0, 6, TOKEN_KEYWORD),
                (0, 7, 4, TOKEN_STRING),
            ]
        );
    }

    #[test]
    fn test_word_operators_highlight_as_operators() {
        let tokens = semantic_tokens("a MOD b");
        assert_eq!(tokens[1].token_type, TOKEN_OPERATOR);
    }

    #[test]
    fn test_word_at_cursor() {
        let content = "OUTPUT Square(Total)";
        assert_eq!(word_at(content, Position::new(0, 9)).as_deref(), Some("Square"));
        assert_eq!(word_at(content, Position::new(0, 16)).as_deref(), Some("Total"));
        assert_eq!(word_at(content, Position::new(0, 6)).as_deref(), Some("OUTPUT"));
        assert_eq!(word_at(content, Position::new(3, 0)), None);
    }

    #[test]
    fn test_document_symbol_selection_range() {
        let symbols = symbols();
        let square = to_document_symbol(&symbols[2], PROGRAM);
        assert_eq!(square.selection_range.start, Position::new(2, 9));
        assert_eq!(square.selection_range.end, Position::new(2, 15));
        assert!(square.children.is_some());
    }
}

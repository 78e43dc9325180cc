//! Parser tests for pseudocode statements and expressions

use crate::ast::*;
use crate::error::SyntaxError;
use crate::parser::parse_source;

/// Helper to parse a program and return the AST plus errors
fn parse_program(source: &str) -> (Program, Vec<SyntaxError>) {
    parse_source(source)
}

/// Helper to parse and expect no syntax errors
fn parse_ok(source: &str) -> Program {
    let (program, errors) = parse_program(source);
    assert!(errors.is_empty(), "unexpected syntax errors: {errors:?}");
    program
}

/// Helper to collect error messages
fn parse_errors(source: &str) -> Vec<String> {
    parse_program(source)
        .1
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn first_stmt(source: &str) -> Stmt {
    parse_ok(source)
        .statements
        .into_iter()
        .next()
        .expect("at least one statement")
        .node
}

fn expr_of(source: &str) -> String {
    match first_stmt(source) {
        Stmt::Expression(expr) => expr.to_string(),
        other => panic!("expected expression statement, got {other:?}"),
    }
}

// ============================================
// Expressions
// ============================================

#[test]
fn test_precedence_product_over_sum() {
    assert_eq!(expr_of("1 + 2 * 3"), "(1 + (2 * 3))");
}

#[test]
fn test_not_binds_tighter_than_and() {
    assert_eq!(expr_of("NOT TRUE AND FALSE"), "((NOT TRUE) AND FALSE)");
}

#[test]
fn test_or_is_lowest() {
    assert_eq!(expr_of("a AND b OR c AND d"), "((a AND b) OR (c AND d))");
}

#[test]
fn test_comparison_levels() {
    assert_eq!(expr_of("a + 1 < b = TRUE"), "(((a + 1) < b) = TRUE)");
}

#[test]
fn test_left_associativity() {
    assert_eq!(expr_of("10 - 4 - 3"), "((10 - 4) - 3)");
    assert_eq!(expr_of("a & b & c"), "((a & b) & c)");
}

#[test]
fn test_div_mod_are_products() {
    assert_eq!(expr_of("7 DIV 2 + 7 MOD 2"), "((7 DIV 2) + (7 MOD 2))");
}

#[test]
fn test_grouping_overrides_precedence() {
    assert_eq!(expr_of("(1 + 2) * 3"), "((1 + 2) * 3)");
}

#[test]
fn test_unary_minus() {
    assert_eq!(expr_of("-x * 2"), "((-x) * 2)");
}

#[test]
fn test_postfix_chain() {
    assert_eq!(expr_of("shapes[i].Area()"), "shapes[i].Area()");
    let expr = match first_stmt("shapes[i].Area()") {
        Stmt::Expression(e) => e,
        other => panic!("unexpected {other:?}"),
    };
    assert!(matches!(expr, Expr::Call { ref callee, .. } if matches!(**callee, Expr::MemberAccess { .. })));
}

#[test]
fn test_two_dimensional_index() {
    assert_eq!(expr_of("grid[r, c + 1]"), "grid[r, (c + 1)]");
}

#[test]
fn test_new_and_super() {
    assert_eq!(expr_of("NEW Dog(\"Rex\", 3)"), "NEW Dog(\"Rex\", 3)");
    assert_eq!(expr_of("SUPER.NEW(n)"), "SUPER.NEW(n)");
}

#[test]
fn test_literals() {
    assert_eq!(first_stmt("2.50"), Stmt::Expression(Expr::RealLit(2.5)));
    assert_eq!(first_stmt("'z'"), Stmt::Expression(Expr::CharLit('z')));
    assert_eq!(first_stmt("false"), Stmt::Expression(Expr::BoolLit(false)));
}

#[test]
fn test_expression_stops_at_newline() {
    let program = parse_ok("x <- 1\n- 2");
    assert_eq!(program.statements.len(), 2);
    assert_eq!(program.statements[0].node.to_string(), "x <- 1");
    assert_eq!(program.statements[1].node.to_string(), "(-2)");
}

// ============================================
// Statements
// ============================================

#[test]
fn test_declare_array() {
    let stmt = first_stmt("DECLARE Grid : ARRAY[1:3, 0:4] OF CHAR");
    assert_eq!(stmt.to_string(), "DECLARE Grid : ARRAY[1:3,0:4] OF CHAR");
}

#[test]
fn test_declare_negative_bound() {
    let stmt = first_stmt("DECLARE T : ARRAY[-5:5] OF REAL");
    match stmt {
        Stmt::Declare {
            data_type: DataType::Array { dimensions, .. },
            ..
        } => assert_eq!(dimensions, vec![ArrayDimension::new(-5, 5)]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_constant_and_assignment_arrow_forms() {
    let program = parse_ok("CONSTANT Max = 10\nx ← Max\ny <- x");
    assert_eq!(program.statements.len(), 3);
    assert!(matches!(program.statements[1].node, Stmt::Assignment { .. }));
}

#[test]
fn test_statement_positions() {
    let program = parse_ok("x <- 1\n\n   OUTPUT x");
    assert_eq!(program.statements[0].pos, Position::new(1, 1));
    assert_eq!(program.statements[1].pos, Position::new(3, 4));
}

#[test]
fn test_if_else() {
    let stmt = first_stmt("IF x > 1 THEN\n  OUTPUT \"big\"\nELSE\n  OUTPUT \"small\"\nENDIF");
    insta::assert_snapshot!(stmt.to_string(), @r#"
IF (x > 1) THEN
    OUTPUT "big"
ELSE
    OUTPUT "small"
ENDIF
"#);
}

#[test]
fn test_then_on_following_line() {
    let stmt = first_stmt("IF x > 1\n  THEN\n    OUTPUT x\nENDIF");
    match stmt {
        Stmt::If { then_branch, .. } => assert_eq!(then_branch.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_for_with_step_and_next_name() {
    let stmt = first_stmt("FOR i <- 10 TO 1 STEP -2\n  OUTPUT i\nNEXT i");
    match stmt {
        Stmt::For { variable, step, body, .. } => {
            assert_eq!(variable, "i");
            assert!(step.is_some());
            assert_eq!(body.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_next_without_name_keeps_following_statement() {
    let program = parse_ok("FOR i <- 1 TO 2\nNEXT\nOUTPUT 9");
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn test_while_and_repeat() {
    let program = parse_ok("WHILE n > 0\n  n <- n - 1\nENDWHILE\nREPEAT\n  n <- n + 1\nUNTIL n = 5");
    assert!(matches!(program.statements[0].node, Stmt::While { .. }));
    match &program.statements[1].node {
        Stmt::Repeat { condition, .. } => assert_eq!(condition.to_string(), "(n = 5)"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_case_with_ranges_and_otherwise() {
    let src = "CASE OF score\n  0 TO 49 : OUTPUT \"Fail\"\n  50, 60 : OUTPUT \"Pass\"\n         OUTPUT \"again\"\n  OTHERWISE : OUTPUT \"?\"\nENDCASE";
    match first_stmt(src) {
        Stmt::Case { subject, clauses, otherwise } => {
            assert_eq!(subject, Expr::Ident("score".into()));
            assert_eq!(clauses.len(), 2);
            assert!(matches!(clauses[0].selectors[0], Expr::Range { .. }));
            assert_eq!(clauses[1].selectors.len(), 2);
            assert_eq!(clauses[1].body.len(), 2);
            assert_eq!(otherwise.map(|b| b.len()), Some(1));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_case_char_selectors() {
    match first_stmt("CASE OF c\n  'A' TO 'Z' : OUTPUT 1\n  'a' : OUTPUT 2\nENDCASE") {
        Stmt::Case { clauses, otherwise, .. } => {
            assert_eq!(clauses.len(), 2);
            assert!(otherwise.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_case_body_ident_colon_starts_new_clause() {
    // an identifier followed by `:` always opens a clause
    match first_stmt("CASE OF x\n  1 : y <- 2\n  Limit : OUTPUT y\nENDCASE") {
        Stmt::Case { clauses, .. } => {
            assert_eq!(clauses.len(), 2);
            assert_eq!(clauses[1].selectors[0], Expr::Ident("Limit".into()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_procedure_with_modes() {
    let stmt = first_stmt(
        "PROCEDURE Swap(BYREF a : INTEGER, b : INTEGER, BYVAL c : INTEGER)\n  t <- a\nENDPROCEDURE",
    );
    match stmt {
        Stmt::Procedure(decl) => {
            let modes: Vec<_> = decl.params.iter().map(|p| p.mode).collect();
            assert_eq!(modes, vec![ParamMode::ByRef, ParamMode::ByRef, ParamMode::ByVal]);
            assert!(decl.returns.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_procedure_without_parentheses() {
    match first_stmt("PROCEDURE Greet\n  OUTPUT \"hi\"\nENDPROCEDURE") {
        Stmt::Procedure(decl) => {
            assert_eq!(decl.name, "Greet");
            assert!(decl.params.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_function_returns() {
    let stmt = first_stmt("FUNCTION Square(n : INTEGER) RETURNS INTEGER\n  RETURN n * n\nENDFUNCTION");
    insta::assert_snapshot!(stmt.to_string(), @r"
FUNCTION Square(n : INTEGER) RETURNS INTEGER
    RETURN (n * n)
ENDFUNCTION
");
}

#[test]
fn test_call_splits_arguments() {
    match first_stmt("CALL Show(1, \"a\")") {
        Stmt::Call { callee, args } => {
            assert_eq!(callee, Expr::Ident("Show".into()));
            assert_eq!(args.len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    match first_stmt("CALL Ping") {
        Stmt::Call { args, .. } => assert!(args.is_empty()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_return_without_value() {
    assert_eq!(first_stmt("RETURN"), Stmt::Return(None));
}

#[test]
fn test_output_list() {
    match first_stmt("OUTPUT \"Total: \", total, 3") {
        Stmt::Output(values) => assert_eq!(values.len(), 3),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_file_statements() {
    let program = parse_ok(
        "OPENFILE \"data.txt\" FOR APPEND\nWRITEFILE \"data.txt\", line\nREADFILE \"data.txt\", line\nCLOSEFILE \"data.txt\"",
    );
    assert!(matches!(
        program.statements[0].node,
        Stmt::OpenFile { mode: FileMode::Append, .. }
    ));
    assert!(matches!(program.statements[1].node, Stmt::WriteFile { .. }));
    assert!(matches!(program.statements[2].node, Stmt::ReadFile { .. }));
    assert!(matches!(program.statements[3].node, Stmt::CloseFile(_)));
}

#[test]
fn test_type_forms() {
    let program = parse_ok(
        "TYPE Student\n  DECLARE Name : STRING\n  DECLARE Age : INTEGER\nENDTYPE\nTYPE Colour = (Red, Green)\nTYPE IntPtr = ^INTEGER",
    );
    match &program.statements[0].node {
        Stmt::TypeDecl { definition: TypeDefinition::Record(fields), .. } => {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[1].name, "Age");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(program.statements[1].node.to_string(), "TYPE Colour = (Red, Green)");
    assert_eq!(program.statements[2].node.to_string(), "TYPE IntPtr = ^INTEGER");
}

#[test]
fn test_class_with_constructor_and_access() {
    let src = "CLASS Dog INHERITS Animal\n  PRIVATE DECLARE Tricks : INTEGER\n  PUBLIC PROCEDURE NEW(n : STRING)\n    SUPER.NEW(n)\n  ENDPROCEDURE\n  PUBLIC FUNCTION Speak() RETURNS STRING\n    RETURN \"Woof\"\n  ENDFUNCTION\nENDCLASS";
    match first_stmt(src) {
        Stmt::Class(class) => {
            assert_eq!(class.name, "Dog");
            assert_eq!(class.parent.as_deref(), Some("Animal"));
            assert_eq!(class.members.len(), 3);
            match &class.members[1].node {
                Stmt::Procedure(decl) => {
                    assert_eq!(decl.name, "NEW");
                    assert_eq!(decl.access, Some(Access::Public));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_keywords_case_insensitive() {
    let program = parse_ok("declare x : integer\nif x = 0 then\n  output \"zero\"\nendif");
    assert_eq!(program.statements.len(), 2);
}

// ============================================
// Errors and recovery
// ============================================

#[test]
fn test_peek_error_message() {
    let errors = parse_errors("DECLARE x INTEGER");
    assert_eq!(
        errors,
        vec!["line 1, column 9: expected next token to be COLON, got INTEGER instead"]
    );
}

#[test]
fn test_no_prefix_parse_function() {
    let errors = parse_errors("x <- )");
    assert_eq!(errors, vec!["line 1, column 6: no prefix parse function for RPAREN"]);
}

#[test]
fn test_recovers_at_next_line() {
    let (program, errors) = parse_program("DECLARE : INTEGER\nOUTPUT 1\nx <- * 2\nOUTPUT 2");
    assert_eq!(errors.len(), 2);
    assert_eq!(program.statements.len(), 2);
    assert_eq!(errors[1].line, 3);
}

#[test]
fn test_missing_terminator_reported() {
    let (program, errors) = parse_program("WHILE TRUE\n  OUTPUT 1\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("missing ENDWHILE before end of input"));
    match &program.statements[0].node {
        Stmt::While { body, .. } => assert_eq!(body.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_nested_missing_terminators() {
    let errors = parse_errors("IF a THEN\n  FOR i <- 1 TO 3\n    OUTPUT i\n");
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("missing NEXT"));
    assert!(errors[1].contains("missing ENDIF"));
}

#[test]
fn test_array_bound_must_be_literal() {
    let errors = parse_errors("DECLARE a : ARRAY[1:n] OF INTEGER");
    assert_eq!(errors, vec!["line 1, column 21: expected integer for array upper bound"]);
}

#[test]
fn test_unknown_data_type() {
    let errors = parse_errors("DECLARE a : 5");
    assert_eq!(errors, vec!["line 1, column 13: unexpected data type: 5"]);
}

#[test]
fn test_bad_open_mode() {
    let errors = parse_errors("OPENFILE \"f\" FOR READING");
    assert_eq!(errors, vec!["line 1, column 18: expected READ, WRITE, or APPEND after FOR"]);
}

#[test]
fn test_access_modifier_requires_routine_or_declare() {
    let errors = parse_errors("PUBLIC x <- 1");
    assert_eq!(
        errors,
        vec!["line 1, column 8: expected PROCEDURE, FUNCTION, or DECLARE after access modifier"]
    );
}

#[test]
fn test_parameter_name_required() {
    let errors = parse_errors("PROCEDURE P(BYREF : INTEGER)\nENDPROCEDURE");
    assert_eq!(errors[0], "line 1, column 19: expected parameter name");
}

#[test]
fn test_illegal_character_reported() {
    let errors = parse_errors("x <- 3 ? 4\nOUTPUT x");
    assert!(errors.iter().any(|e| e.contains("unexpected character")), "{errors:?}");
}

// ============================================
// Rendering round trip
// ============================================

#[test]
fn test_rendering_reparses_to_same_ast() {
    let sources = [
        "x <- (a + b) * -c",
        "OUTPUT \"n = \" & NUM_TO_STR(n), 'c', 2.5, TRUE",
        "IF NOT done AND count < 10 THEN\n  count <- count + 1\nELSE\n  done <- FALSE\nENDIF",
        "FOR i <- 1 TO 10 STEP 2\n  total <- total + arr[i, 1]\nNEXT i",
        "CASE OF grade\n  'A' : OUTPUT 1\n  'B' TO 'D', 'F' : OUTPUT 2\n  OTHERWISE : OUTPUT 3\nENDCASE",
        "PROCEDURE Swap(BYREF a : INTEGER, b : INTEGER)\n  t <- a\n  a <- b\n  b <- t\nENDPROCEDURE",
        "FUNCTION F(x : REAL) RETURNS REAL\n  RETURN x / 2\nENDFUNCTION",
        "CLASS Cat INHERITS Pet\n  DECLARE Lives : INTEGER\n  PUBLIC PROCEDURE NEW()\n    Lives <- 9\n  ENDPROCEDURE\nENDCLASS",
        "TYPE Point\n  DECLARE X : INTEGER\n  DECLARE Y : INTEGER\nENDTYPE",
        "REPEAT\n  READFILE \"in.txt\", line\nUNTIL EOF(\"in.txt\")",
        "p.Pos.X <- NEW Point(1, 2).X",
    ];
    for source in sources {
        let first = parse_ok(source);
        let rendered = first.to_string();
        let second = parse_ok(&rendered);
        let strip = |p: &Program| -> Vec<Stmt> { p.statements.iter().map(|s| s.node.clone()).collect() };
        assert_eq!(strip(&first), strip(&second), "rendering was:\n{rendered}");
    }
}

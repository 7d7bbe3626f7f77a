// Parser robustness tests
//
// Table-driven suites: each case is parsed in isolation, panics are caught
// and reported as crashes, and the test fails if any case misbehaves.

use polyc::ast::{BinaryOp, Node};
use polyc::parser::Parser;
use polyc::error::PolyError;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
    pub expected_error_count: Option<usize>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(errors), false) => check_errors(test, &errors),
            (Err(errors), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                errors.first().map_or("no program", |e| e.message.as_str())
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn check_errors(test: &TestCase, errors: &[PolyError]) -> TestResult {
    if let Some(expected) = test.expected_error_count {
        if errors.len() != expected {
            return TestResult::Fail(format!(
                "Expected {} diagnostic(s), got {}: {:?}",
                expected,
                errors.len(),
                errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>()
            ));
        }
    }

    let Some(expected) = &test.expected_error_contains else {
        return TestResult::Pass; // Any error is acceptable
    };
    match errors.first() {
        Some(error) if error.message.contains(expected) => TestResult::Pass,
        Some(error) => TestResult::Fail(format!(
            "Error message '{}' doesn't contain expected text '{}'",
            error.message, expected
        )),
        None => TestResult::Fail(format!(
            "No program and no diagnostic, expected '{}'",
            expected
        )),
    }
}

/// Parse input; any diagnostic, or no program at all, is a failure.
fn parse_input(input: &str) -> Result<Node, Vec<PolyError>> {
    let mut parser = Parser::new(input);
    let program = parser.parse();
    let errors = parser.take_diagnostics();
    match program {
        Some(program) if errors.is_empty() => Ok(program),
        _ => Err(errors),
    }
}

/// Test case builder for convenience
impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
            expected_error_count: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
            expected_error_count: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
            expected_error_count: Some(1),
        }
    }

    pub fn should_fail_times(name: &str, input: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
            expected_error_count: Some(count),
        }
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    // === PARENTHESES TESTS ===

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "print (1 + 2;",
        "')' required after expression",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "print 1 + 2);",
        "semicolon required, found ')'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "print ();",
        "primary expression expected, found ')'",
    ));

    // === OPERATOR TESTS ===

    suite.add_test(TestCase::should_fail_with_message(
        "missing_right_operand",
        "print 1 + ;",
        "expression required after '+'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_right_factor",
        "print 2 * ;",
        "expression required after '*'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "double_plus",
        "print 1 ++ 2;",
        "expression required after '+'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "operand_at_end_of_input",
        "print 1 +",
        "expression required after '+', found end of input",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "standalone_minus_is_not_a_sign",
        "print - 3;",
        "primary expression expected, found '-'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "minus_glued_to_digit_is_a_sign",
        "print 5-3;",
        "semicolon required, found '-3'",
    ));

    // === POLYNOMIAL TESTS ===

    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_coefficients",
        "print {1, 2;",
        "'}' required after coefficients",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "empty_coefficients",
        "print {};",
        "coefficients required between braces",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_coefficient_after_comma",
        "print {1, };",
        "coefficient required after ','",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "string_coefficient",
        "print {\"a\"};",
        "coefficients required between braces",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_evaluation_point",
        "print {1, 2}[3;",
        "']' required after evaluation point",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "empty_evaluation_point",
        "print p[];",
        "primary expression expected, found ']'",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Tests");

    suite.add_test(TestCase::should_fail_with_message(
        "set_requires_identifier",
        "set 5 3;",
        "identifier required after 'set'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "set_requires_expression",
        "set x;",
        "primary expression expected, found ';'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_semicolon_before_next_statement",
        "print 1 print 2;",
        "semicolon required, found 'print'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "invalid_statement",
        "5;",
        "invalid statement",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "bare_identifier_statement",
        "x;",
        "invalid statement, found 'x'",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "keyword_as_identifier",
        "set print 1;",
        "identifier required after 'set', found 'print'",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    suite.add_test(TestCase::should_succeed("integer_literal", "print 42;"));
    suite.add_test(TestCase::should_succeed("negative_literal", "print -42;"));
    suite.add_test(TestCase::should_succeed("float_literal", "print 3.14;"));
    suite.add_test(TestCase::should_succeed("string_literal", "print \"hello\";"));
    suite.add_test(TestCase::should_succeed("empty_string_literal", "print \"\";"));
    suite.add_test(TestCase::should_succeed(
        "largest_integer",
        "print 9223372036854775807;",
    ));
    suite.add_test(TestCase::should_succeed(
        "smallest_integer",
        "print -9223372036854775808;",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "integer_out_of_range",
        "print 99999999999999999999;",
        "integer literal 99999999999999999999 out of range",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "trailing_dot",
        "print 42.;",
        "a digit must follow the decimal point",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "print \"hello\nworld\";",
        "string literal runs past the end of the line",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unexpected_character",
        "print 1 @ 2;",
        "unexpected character '@'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unexpected_character_in_expression",
        "print @;",
        "unexpected character '@'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "literal_cut_by_end_of_input",
        "print 1",
        "input ended in the middle of a token",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    // No statements means no program, and no diagnostic either
    suite.add_test(TestCase::should_fail_times("empty_input", "", 0));
    suite.add_test(TestCase::should_fail_times("only_whitespace", "   \n\t  ", 0));
    suite.add_test(TestCase::should_fail_times("only_comment", "# nothing here\n", 0));

    let deep_parens = format!("print {}1{};", "(".repeat(100), ")".repeat(100));
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    let too_deep = format!("print {}1{};", "(".repeat(150), ")".repeat(150));
    suite.add_test(TestCase::should_fail_with_message(
        "parentheses_nested_too_deeply",
        &too_deep,
        "expression nested too deeply",
    ));

    let deep_brackets = format!("print {}0{};", "p[".repeat(150), "]".repeat(150));
    suite.add_test(TestCase::should_fail_with_message(
        "evaluation_points_nested_too_deeply",
        &deep_brackets,
        "expression nested too deeply",
    ));

    let long_sum = format!("print {}1;", "1 + ".repeat(10_000));
    suite.add_test(TestCase::should_succeed("ten_thousand_operands", &long_sum));

    let long_product = format!("print {}1;", "x * ".repeat(10_000));
    suite.add_test(TestCase::should_succeed("ten_thousand_factors", &long_product));

    suite.add_test(TestCase::should_succeed(
        "comment_without_trailing_newline",
        "print 1; # done",
    ));

    suite
}

fn create_recovery_tests() -> TestSuite {
    let mut suite = TestSuite::new("Recovery Tests");

    suite.add_test(TestCase::should_fail_times(
        "one_diagnostic_per_bad_statement",
        "print ; print ; print 1;",
        2,
    ));
    suite.add_test(TestCase::should_fail_times(
        "good_statements_between_bad_ones",
        "set x 1; set 5 3; print x; print (x; print x;",
        2,
    ));
    suite.add_test(TestCase::should_fail_times(
        "stray_semicolons",
        ";;",
        2,
    ));
    suite.add_test(TestCase::should_fail_times(
        "lexical_error_inside_skipped_tokens",
        "print 1 2 $; print 3;",
        2,
    ));
    suite.add_test(TestCase::should_fail_times(
        "lexical_error_then_valid_statement",
        "print 3.x; print 4;",
        1,
    ));

    suite
}

fn create_positive_tests() -> TestSuite {
    let mut suite = TestSuite::new("Positive Tests");

    suite.add_test(TestCase::should_succeed("set_and_print", "set x 5; print x;"));
    suite.add_test(TestCase::should_succeed("simple_arithmetic", "print 1 + 2 * 3;"));
    suite.add_test(TestCase::should_succeed("parentheses", "print (1 + 2) * 3;"));
    suite.add_test(TestCase::should_succeed("subtract_negative", "print 5 - -3;"));
    suite.add_test(TestCase::should_succeed(
        "string_concatenation",
        "print \"hello\" + \" world\";",
    ));
    suite.add_test(TestCase::should_succeed("coefficients", "print {1, 0, -2};"));
    suite.add_test(TestCase::should_succeed("evaluate_literal", "print {1, 0, -2}[3];"));
    suite.add_test(TestCase::should_succeed(
        "evaluate_named",
        "set p {1.5, 2}; set x 2; print p[x + 1];",
    ));
    suite.add_test(TestCase::should_succeed(
        "polynomial_sum",
        "print {1, 2} + {3};",
    ));
    suite.add_test(TestCase::should_succeed(
        "multiline_with_comments",
        "# header\nset a 1;   # trailing\n\nprint a * 2;\n",
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    println!("polyc Parser Robustness Test Suite");
    println!("==================================\n");

    let suites = vec![
        create_malformed_expressions_tests(),
        create_statement_tests(),
        create_literal_tests(),
        create_edge_case_tests(),
        create_recovery_tests(),
        create_positive_tests(),
    ];

    let mut failed_suites = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failed_suites.push(results.suite_name);
        }
    }

    assert!(
        failed_suites.is_empty(),
        "Some parser suites failed: {:?}. See output above for details.",
        failed_suites
    );
}

// ============================================================================
// Tree Shape
// ============================================================================

fn parse_single(input: &str) -> Node {
    let program = parse_input(input).expect("program should parse");
    let mut statements = program.statements();
    let statement = statements.next().expect("one statement").clone();
    assert!(statements.next().is_none(), "expected a single statement");
    statement
}

fn printed_expr(statement: &Node) -> &Node {
    match statement {
        Node::Print { expr, .. } => expr,
        other => panic!("expected print statement, got {:?}", other),
    }
}

#[test]
fn additive_operators_associate_right() {
    let statement = parse_single("print 1 - 2 + 3;");
    let Node::Binary { left, operator, right, .. } = printed_expr(&statement) else {
        panic!("expected binary expression");
    };
    assert_eq!(*operator, BinaryOp::Minus);
    assert!(matches!(**left, Node::IntLiteral { value: 1, .. }));
    assert!(matches!(
        **right,
        Node::Binary { operator: BinaryOp::Plus, .. }
    ));
}

#[test]
fn times_binds_tighter_than_plus() {
    let statement = parse_single("print 1 + 2 * 3;");
    let Node::Binary { left, operator, right, .. } = printed_expr(&statement) else {
        panic!("expected binary expression");
    };
    assert_eq!(*operator, BinaryOp::Plus);
    assert!(matches!(**left, Node::IntLiteral { value: 1, .. }));
    assert!(matches!(
        **right,
        Node::Binary { operator: BinaryOp::Times, .. }
    ));
}

#[test]
fn bracket_after_identifier_is_evaluation() {
    let statement = parse_single("print p[2];");
    let Node::EvaluateAt { poly, point, .. } = printed_expr(&statement) else {
        panic!("expected evaluation");
    };
    assert!(matches!(&**poly, Node::Identifier { name, .. } if name == "p"));
    assert!(matches!(**point, Node::IntLiteral { value: 2, .. }));
}

#[test]
fn identifier_without_bracket_is_a_plain_reference() {
    let statement = parse_single("print p;");
    assert!(matches!(printed_expr(&statement), Node::Identifier { name, .. } if name == "p"));
}

#[test]
fn coefficients_keep_source_order_and_line() {
    let statement = parse_single("\n\nprint {1, 2.5, -3};");
    assert_eq!(statement.line(), 3);
    let Node::Coefficients { coefficients, .. } = printed_expr(&statement) else {
        panic!("expected coefficients");
    };
    assert_eq!(coefficients.len(), 3);
    assert!(matches!(coefficients[0], Node::IntLiteral { value: 1, .. }));
    assert!(matches!(coefficients[1], Node::FloatLiteral { value, .. } if value == 2.5));
    assert!(matches!(coefficients[2], Node::IntLiteral { value: -3, .. }));
}

#[test]
fn long_operator_chain_nests_to_the_right() {
    let program = parse_input(&format!("print {}1;", "1 - ".repeat(10_000)))
        .expect("program should parse");
    let statement = program.statements().next().expect("one statement");
    let mut depth = 0;
    let mut node = printed_expr(statement);
    while let Node::Binary { left, operator, right, .. } = node {
        assert_eq!(*operator, BinaryOp::Minus);
        assert!(matches!(**left, Node::IntLiteral { value: 1, .. }));
        depth += 1;
        node = &**right;
    }
    assert_eq!(depth, 10_000);
    assert!(matches!(node, Node::IntLiteral { value: 1, .. }));
}

#[test]
fn lexical_error_skipped_during_recovery_is_still_reported() {
    let mut parser = Parser::new("print 1 2 $; print 3;");
    let program = parser.parse().expect("second statement parses");
    assert_eq!(program.statements().count(), 1);
    let messages: Vec<String> = parser
        .take_diagnostics()
        .iter()
        .map(|e| e.message.clone())
        .collect();
    assert_eq!(
        messages,
        vec![
            "semicolon required, found '2'".to_string(),
            "unexpected character '$'".to_string(),
        ]
    );
}

#[test]
fn set_statement_keeps_name() {
    let statement = parse_single("set total 1 + 2;");
    let Node::Set { name, expr, .. } = &statement else {
        panic!("expected set statement");
    };
    assert_eq!(name, "total");
    assert!(matches!(**expr, Node::Binary { operator: BinaryOp::Plus, .. }));
}

#[test]
fn set_with_bad_identifier_reports_once_and_parses_nothing() {
    let mut parser = Parser::new("set 5 3;");
    assert!(parser.parse().is_none());
    assert_eq!(parser.diagnostics().len(), 1);
    let error = parser.diagnostics().iter().next().unwrap();
    assert_eq!(
        error.to_string(),
        "PARSE ERROR: 1 identifier required after 'set', found '5'"
    );
}

#[test]
fn parse_error_reports_line_of_offending_token() {
    let mut parser = Parser::new("print 1;\n\nprint (2;\nprint 3;");
    let program = parser.parse().expect("good statements still parse");
    assert_eq!(program.statements().count(), 2);
    let errors = parser.take_diagnostics();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line(), 3);
}

#[test]
fn missing_semicolon_before_negative_literal_explains_sign_rule() {
    let mut parser = Parser::new("print 5-3;");
    parser.parse();
    let errors = parser.take_diagnostics();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].help.as_deref().unwrap_or("").contains("space after '-'"));
}

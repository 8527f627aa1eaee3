//! End-to-end translation tests through the library API
//!
//! Each source kind is driven from a document value, the way the CLI does
//! after parsing, and the full output text is compared.

use calcbridge::core::{
    CellFormulaTranslator, CellMap, Converter, IdentifierSanitizer, MatrixLayoutConverter,
    MatrixLiteral, SourceKind, StackExpressionEvaluator,
};
use calcbridge::parser::{parse_str, DocumentFormat};
use calcbridge::types::{
    CellInput, CellReference, SheetDocument, SheetInput, Token, TokenDocument, TokenRegion,
};
use calcbridge::{ConvertOptions, Warnings};
use pretty_assertions::assert_eq;

fn quiet() -> Converter {
    Converter::new(ConvertOptions {
        header_comment: false,
        ..ConvertOptions::default()
    })
}

fn cell(address: &str, value: Option<&str>, formula: Option<&str>) -> CellInput {
    CellInput {
        address: address.to_string(),
        value: value.map(str::to_string),
        formula: formula.map(str::to_string),
    }
}

fn sheet(name: &str, cells: Vec<CellInput>) -> SheetDocument {
    SheetDocument {
        sheets: vec![SheetInput {
            name: name.to_string(),
            cells,
        }],
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSTFIX TOKEN STREAMS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_postfix_reconstruction() {
    let tokens = vec![
        Token::operand("2"),
        Token::operand("3"),
        Token::operator("+", 2),
        Token::operand("4"),
        Token::operator("*", 2),
    ];
    let (expr, warnings) = StackExpressionEvaluator::default().evaluate(&tokens);
    assert_eq!(expr, "(2 + 3)*4");
    assert!(warnings.is_empty());
}

#[test]
fn test_precedence_omits_parentheses() {
    let tokens = vec![
        Token::operand("2"),
        Token::operand("3"),
        Token::operand("4"),
        Token::operator("*", 2),
        Token::operator("+", 2),
    ];
    let (expr, _) = StackExpressionEvaluator::default().evaluate(&tokens);
    assert_eq!(expr, "2 + 3*4");
}

#[test]
fn test_insufficient_operands_never_fails() {
    let document = TokenDocument {
        regions: vec![
            TokenRegion {
                tokens: vec![Token::operator("+", 2)],
                text: None,
            },
            TokenRegion {
                tokens: vec![Token::operand("x"), Token::operand("1"), Token::operator("=", 2)],
                text: None,
            },
        ],
    };
    let out = quiet().convert_tokens(&document);
    assert_eq!(out.text, "x = 1\n");
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_token_document_from_yaml() {
    let yaml = r#"
regions:
  - tokens:
      - { kind: operand, text: A_s }
      - { kind: operand, text: 4 }
      - { kind: operand, text: phi }
      - { kind: operator, text: "²", arity: 1 }
      - { kind: operator, text: "·", arity: 2 }
      - { kind: operator, text: "≔", arity: 2 }
  - tokens:
      - { kind: operand, text: x }
      - { kind: operand, text: y }
      - { kind: function, text: ceil, arity: 2 }
"#;
    let document = parse_str(yaml, DocumentFormat::Yaml, SourceKind::Tokens).unwrap();
    let out = quiet().convert(&document);
    assert_eq!(out.text, "A_s = 4*φ^2\nceiling(x; y)\n");
    assert!(out.warnings.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSION TREES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_matrix_reorientation() {
    let matrix = MatrixLiteral {
        rows: 2,
        cols: 2,
        elements: ["1", "2", "3", "4"].iter().map(|s| s.to_string()).collect(),
    };
    let mut warnings = Warnings::new();
    assert_eq!(
        MatrixLayoutConverter::convert(&matrix, &mut warnings),
        "[1; 3 | 2; 4]"
    );
    assert!(warnings.is_empty());
}

#[test]
fn test_tree_document_from_json() {
    let json = r#"{
      "regions": [
        { "kind": "math", "children": [
          { "kind": "define", "children": [
            { "kind": "id", "text": "v" },
            { "kind": "matrix", "attributes": { "rows": "3", "cols": "1" }, "children": [
              { "kind": "real", "text": 1 },
              { "kind": "real", "text": 2 },
              { "kind": "real", "text": 3 }
            ]}
          ]}
        ]},
        { "kind": "math", "children": [
          { "kind": "eval", "children": [
            { "kind": "apply", "children": [
              { "kind": "minus" },
              { "kind": "id", "text": "a" },
              { "kind": "apply", "children": [
                { "kind": "plus" },
                { "kind": "id", "text": "b" },
                { "kind": "id", "text": "c" }
              ]}
            ]}
          ]}
        ]}
      ]
    }"#;
    let document = parse_str(json, DocumentFormat::Json, SourceKind::Tree).unwrap();
    let out = quiet().convert(&document);
    assert_eq!(out.text, "v = [1; 2; 3]\na - (b + c)\n");
    assert!(out.warnings.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPREADSHEET FORMULAS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_sum_range_expansion() {
    let mut values = CellMap::new();
    values.insert(CellReference::new("A", 1), "5".to_string());
    values.insert(CellReference::new("A", 2), "7".to_string());
    let mut labels = CellMap::new();
    labels.insert(CellReference::new("A", 1), "x".to_string());
    labels.insert(CellReference::new("A", 2), "y".to_string());

    let (text, _) = CellFormulaTranslator::default().translate("SUM(A1:A3)", &values, &labels);
    assert_eq!(text, "(x+y)");
}

#[test]
fn test_dependency_precedes_dependent() {
    // Input order puts the dependent formula first
    let document = sheet(
        "Area",
        vec![
            cell("A2", Some("Area"), None),
            cell("B2", None, Some("=B1^2")),
            cell("A1", Some("Width"), None),
            cell("B1", Some("3"), None),
        ],
    );
    let out = quiet().convert_sheets(&document);
    assert_eq!(
        out.text,
        "\"Area\n\"Input data\nWidth = 3\n\n\"Calculations\nArea = Width^2\n"
    );
}

#[test]
fn test_formula_dependencies_ordered() {
    let document = sheet(
        "Chain",
        vec![
            cell("A1", Some("Total"), None),
            cell("B1", None, Some("=B2+B3")),
            cell("A2", Some("Half"), None),
            cell("B2", None, Some("=B3/2")),
            cell("A3", Some("Base"), None),
            cell("B3", Some("10"), None),
        ],
    );
    let out = quiet().convert_sheets(&document);
    assert_eq!(
        out.text,
        "\"Chain\n\"Input data\nBase = 10\n\n\"Calculations\nHalf = Base/2\nTotal = Half+Base\n"
    );
}

#[test]
fn test_cycle_tolerance() {
    let document = sheet(
        "Loop",
        vec![
            cell("A1", None, Some("=B1+1")),
            cell("B1", None, Some("=A1+1")),
        ],
    );
    let out = quiet().convert_sheets(&document);
    assert!(out.text.contains("A1 = B1+1"));
    assert!(out.text.contains("B1 = A1+1"));
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("Circular reference")));
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_sanitization_idempotent() {
    let sanitizer = IdentifierSanitizer::default();
    for label in ["Design moment", "f'c (kg/cm²)", "ΔT", "2nd load", "__", ""] {
        let once = sanitizer.variable_name(label);
        assert_eq!(sanitizer.variable_name(&once), once, "label {label:?}");
    }
}

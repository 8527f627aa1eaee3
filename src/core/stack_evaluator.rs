//! Postfix token stream → infix expression
//!
//! Math-editor worksheets store each region as a postfix stream: operands
//! are pushed, operators and functions pop as many entries as their arity.
//! The evaluator replays the stream over a stack of partial infix strings.

use super::identifier::IdentifierSanitizer;
use super::infix::{self, BinaryOp};
use super::units::UnitMapper;
use crate::types::{Token, TokenKind, Warnings};
use tracing::debug;

/// What an operator or function token does to the stack
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Binary(BinaryOp),
    /// Unary minus
    Negate,
    /// Unary plus, passes the operand through
    Identity,
    /// Postfix symbol kept after its operand (`n!`)
    Postfix(&'static str),
    /// Postfix power written as a superscript (`x²`)
    Superscript(&'static str),
    /// `name(arg; ...)`
    Call(String),
    /// Symbolic operator with no canonical spelling
    Unknown(String),
}

/// Function spellings that differ between the source and the canonical syntax
const FUNCTION_NAMES: &[(&str, &str)] = &[
    ("√", "sqrt"),
    ("sqrt", "sqrt"),
    ("ceil", "ceiling"),
    ("transpose", "transp"),
    ("inverse", "inv"),
    ("∑", "sum"),
    ("∏", "product"),
    ("∫", "integral"),
];

fn function_name(sanitizer: &IdentifierSanitizer, name: &str) -> String {
    let lower = name.trim().to_lowercase();
    FUNCTION_NAMES
        .iter()
        .find(|(from, _)| *from == lower)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| sanitizer.subscripted_symbol(name))
}

fn classify(token: &Token, sanitizer: &IdentifierSanitizer) -> Operation {
    let text = token.text.trim();

    if token.kind == TokenKind::Function {
        return Operation::Call(function_name(sanitizer, text));
    }

    if let Some(cmp) = BinaryOp::comparison(text) {
        return Operation::Binary(cmp);
    }

    match (text, token.arity) {
        ("=" | ":=" | "≔" | "→", _) => Operation::Binary(BinaryOp::Assign),
        ("-" | "−", 1) => Operation::Negate,
        ("+", 1) => Operation::Identity,
        ("+", _) => Operation::Binary(BinaryOp::Add),
        ("-" | "−", _) => Operation::Binary(BinaryOp::Sub),
        ("*" | "·" | "×", _) => Operation::Binary(BinaryOp::Mul),
        ("/" | "÷", _) => Operation::Binary(BinaryOp::Div),
        ("^", _) => Operation::Binary(BinaryOp::Pow),
        ("!", _) => Operation::Postfix("!"),
        ("²", _) => Operation::Superscript("2"),
        ("³", _) => Operation::Superscript("3"),
        _ if text.chars().any(char::is_alphabetic) || text == "√" => {
            Operation::Call(function_name(sanitizer, text))
        }
        _ => Operation::Unknown(text.to_string()),
    }
}

/// Rebuilds infix expressions from postfix token streams
#[derive(Debug, Clone, Default)]
pub struct StackExpressionEvaluator {
    sanitizer: IdentifierSanitizer,
}

impl StackExpressionEvaluator {
    pub fn new(sanitizer: IdentifierSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Evaluate a token stream into a single infix expression.
    ///
    /// Never fails: operators lacking operands are skipped, and leftover
    /// stack entries are joined with spaces. Both cases add a warning.
    pub fn evaluate(&self, tokens: &[Token]) -> (String, Warnings) {
        let mut warnings = Warnings::new();
        let mut stack: Vec<String> = Vec::new();

        for (position, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Operand => stack.push(self.operand(&token.text)),
                TokenKind::Bracket => {
                    debug!(position, bracket = %token.text, "bracket token ignored");
                }
                TokenKind::Operator | TokenKind::Function => {
                    let operation = classify(token, &self.sanitizer);
                    let needed = self.arity(&operation, token.arity);
                    if stack.len() < needed {
                        warnings.push(format!(
                            "Token '{}' at position {} needs {} operand(s) but only {} available; skipped",
                            token.text,
                            position,
                            needed,
                            stack.len()
                        ));
                        continue;
                    }
                    // Rightmost argument sits on top of the stack
                    let args = stack.split_off(stack.len() - needed);
                    let combined = self.apply(operation, args);
                    debug!(position, result = %combined, "combined");
                    stack.push(combined);
                }
            }
        }

        let expression = match stack.len() {
            0 => String::new(),
            1 => stack.pop().unwrap_or_default(),
            n => {
                warnings.push(format!(
                    "Expression left {} unconsumed operands; joined as-is",
                    n
                ));
                stack.join(" ")
            }
        };

        (expression, warnings)
    }

    /// Operands to pop; unary forms always take exactly one
    fn arity(&self, operation: &Operation, declared: usize) -> usize {
        match operation {
            Operation::Negate
            | Operation::Identity
            | Operation::Postfix(_)
            | Operation::Superscript(_) => 1,
            Operation::Binary(_) => declared.max(2),
            Operation::Call(_) | Operation::Unknown(_) => declared,
        }
    }

    fn apply(&self, operation: Operation, mut args: Vec<String>) -> String {
        match operation {
            Operation::Binary(op) => {
                // n-ary forms fold left: a + b + c
                let mut iter = args.into_iter();
                let first = iter.next().unwrap_or_default();
                iter.fold(first, |acc, next| infix::combine_binary(op, acc, next))
            }
            Operation::Negate => infix::negate(args.pop().unwrap_or_default()),
            Operation::Identity => args.pop().unwrap_or_default(),
            Operation::Postfix(symbol) => infix::postfix(args.pop().unwrap_or_default(), symbol),
            Operation::Superscript(exponent) => infix::combine_binary(
                BinaryOp::Pow,
                args.pop().unwrap_or_default(),
                exponent.to_string(),
            ),
            Operation::Call(name) => infix::call(&name, &args),
            Operation::Unknown(symbol) => args.join(&format!(" {} ", symbol)),
        }
    }

    /// Canonical text for a leaf operand
    fn operand(&self, text: &str) -> String {
        let text = text.trim();
        if text.starts_with('"') || text.parse::<f64>().is_ok() {
            return text.to_string();
        }
        if let Some((value, unit)) = UnitMapper::split_quantity(text) {
            return format!("{value}{unit}");
        }
        self.sanitizer.subscripted_symbol(text)
    }
}

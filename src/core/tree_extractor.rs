//! Expression tree → infix expression
//!
//! CAS worksheets store math as an element tree (`apply`, `id`, `real`,
//! `matrix`, ...). The tree fixes evaluation order but carries no
//! parentheses except explicit `parens` nodes, so operands are joined with
//! the same minimal-parenthesis rules the postfix evaluator uses.

use super::identifier::IdentifierSanitizer;
use super::infix::{self, BinaryOp, Binding};
use super::matrix::{MatrixLayoutConverter, MatrixLiteral};
use super::units::UnitMapper;
use crate::types::{ExpressionNode, Warnings};
use tracing::debug;

/// Element kinds the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Id,
    Real,
    Str,
    Matrix,
    Vector,
    Apply,
    Eval,
    Parens,
    Sequence,
    Define,
    Other,
}

impl NodeKind {
    fn of(node: &ExpressionNode) -> Self {
        match node.kind.as_str() {
            "id" => NodeKind::Id,
            "real" => NodeKind::Real,
            "str" => NodeKind::Str,
            "matrix" => NodeKind::Matrix,
            "vector" => NodeKind::Vector,
            "apply" => NodeKind::Apply,
            "eval" => NodeKind::Eval,
            "parens" => NodeKind::Parens,
            "sequence" => NodeKind::Sequence,
            "define" => NodeKind::Define,
            _ => NodeKind::Other,
        }
    }
}

/// Operation named by the first child of an `apply` element
#[derive(Debug, Clone, PartialEq, Eq)]
enum ApplyOp {
    Arithmetic(BinaryOp),
    Minus,
    Neg,
    Scale,
    Sqrt,
    /// Single-argument functions emitted under their own name
    Named(&'static str),
    FunctionDerivative,
    Indexer,
    /// `<apply><id>f</id>args...</apply>`
    Call,
    /// `<apply><apply>...</apply>args...</apply>`
    Nested,
    Unknown(String),
}

const NAMED_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "ln", "log", "exp", "abs",
];

impl ApplyOp {
    fn of(head: &ExpressionNode) -> Self {
        match head.kind.as_str() {
            "plus" => ApplyOp::Arithmetic(BinaryOp::Add),
            "minus" => ApplyOp::Minus,
            "mult" => ApplyOp::Arithmetic(BinaryOp::Mul),
            "div" => ApplyOp::Arithmetic(BinaryOp::Div),
            "pow" => ApplyOp::Arithmetic(BinaryOp::Pow),
            "neg" => ApplyOp::Neg,
            "scale" => ApplyOp::Scale,
            "sqrt" => ApplyOp::Sqrt,
            "functionDerivative" => ApplyOp::FunctionDerivative,
            "indexer" => ApplyOp::Indexer,
            "id" => ApplyOp::Call,
            "apply" => ApplyOp::Nested,
            other => match NAMED_FUNCTIONS.iter().find(|f| **f == other) {
                Some(name) => ApplyOp::Named(name),
                None => ApplyOp::Unknown(other.to_string()),
            },
        }
    }

    fn label(&self) -> String {
        match self {
            ApplyOp::Arithmetic(op) => op.symbol().to_string(),
            ApplyOp::Minus => "minus".to_string(),
            ApplyOp::Neg => "neg".to_string(),
            ApplyOp::Scale => "scale".to_string(),
            ApplyOp::Sqrt => "sqrt".to_string(),
            ApplyOp::Named(name) => name.to_string(),
            ApplyOp::FunctionDerivative => "functionDerivative".to_string(),
            ApplyOp::Indexer => "indexer".to_string(),
            ApplyOp::Call => "call".to_string(),
            ApplyOp::Nested => "apply".to_string(),
            ApplyOp::Unknown(name) => name.clone(),
        }
    }
}

/// Element kinds collected as matrix cells
fn is_matrix_cell(node: &ExpressionNode) -> bool {
    matches!(node.kind.as_str(), "real" | "id" | "apply")
}

fn is_vector_cell(node: &ExpressionNode) -> bool {
    matches!(node.kind.as_str(), "real" | "id" | "apply" | "matrix")
}

/// Recursive-descent extractor over [`ExpressionNode`] trees
#[derive(Debug, Clone)]
pub struct TreeExpressionExtractor {
    sanitizer: IdentifierSanitizer,
    max_depth: usize,
}

impl Default for TreeExpressionExtractor {
    fn default() -> Self {
        Self::new(IdentifierSanitizer::default(), 256)
    }
}

impl TreeExpressionExtractor {
    pub fn new(sanitizer: IdentifierSanitizer, max_depth: usize) -> Self {
        Self {
            sanitizer,
            max_depth: max_depth.max(1),
        }
    }

    /// Infix text for one expression node
    pub fn extract(&self, node: &ExpressionNode, warnings: &mut Warnings) -> String {
        self.expr(node, 0, warnings)
    }

    /// Output lines for one top-level region.
    ///
    /// Regions are recognised by what they contain, most specific first:
    /// - a `spec-table` yields one statement per `define` it holds
    /// - a `text` or `comment` node yields `' line` comments
    /// - a `define` anywhere becomes `name = value`
    /// - otherwise the first `eval`, or the region itself, becomes a bare
    ///   expression
    ///
    /// Empty statements are dropped.
    pub fn extract_region(&self, region: &ExpressionNode, warnings: &mut Warnings) -> Vec<String> {
        if let Some(table) = find_descendant(region, "spec-table") {
            return self.spec_table(table, warnings);
        }
        if let Some(text) =
            find_descendant(region, "text").or_else(|| find_descendant(region, "comment"))
        {
            return infix::comment_lines(&text.value());
        }

        let statement = if let Some(define) = find_descendant(region, "define") {
            self.define(define, 0, warnings)
        } else if let Some(eval) = find_descendant(region, "eval") {
            self.expr(eval, 0, warnings)
        } else {
            self.expr(region, 0, warnings)
        };

        let statement = statement.trim().to_string();
        if statement.is_empty() {
            Vec::new()
        } else {
            vec![statement]
        }
    }

    /// One statement per `math` row of a definition table
    fn spec_table(&self, table: &ExpressionNode, warnings: &mut Warnings) -> Vec<String> {
        let mut rows: Vec<&ExpressionNode> =
            table.children.iter().filter(|c| c.kind == "math").collect();
        if rows.is_empty() {
            collect_descendants(table, "math", &mut rows);
        }
        debug!(rows = rows.len(), "definition table");

        rows.into_iter()
            .filter_map(|row| find_descendant(row, "define"))
            .map(|define| self.define(define, 0, warnings).trim().to_string())
            .filter(|statement| !statement.is_empty())
            .collect()
    }

    fn expr(&self, node: &ExpressionNode, depth: usize, warnings: &mut Warnings) -> String {
        if depth >= self.max_depth {
            warnings.push(format!(
                "Expression nesting exceeds {} levels; '{}' kept as raw text",
                self.max_depth, node.kind
            ));
            return node.value().trim().to_string();
        }

        let children = &node.children;
        match NodeKind::of(node) {
            NodeKind::Id => self.sanitizer.symbol(&node.value()),
            NodeKind::Real => node.value().trim().to_string(),
            NodeKind::Str => format!("\"{}\"", node.value()),
            NodeKind::Matrix => self.matrix(node, depth, warnings),
            NodeKind::Vector => {
                let values: Vec<String> = children
                    .iter()
                    .filter(|c| is_vector_cell(c))
                    .map(|c| self.expr(c, depth + 1, warnings))
                    .collect();
                MatrixLayoutConverter::vector(&values)
            }
            NodeKind::Apply => self.apply(node, depth, warnings),
            NodeKind::Eval => children
                .first()
                .map(|c| self.expr(c, depth + 1, warnings))
                .unwrap_or_default(),
            NodeKind::Parens => {
                let inner = children
                    .first()
                    .map(|c| self.expr(c, depth + 1, warnings))
                    .unwrap_or_default();
                infix::parenthesize(&inner)
            }
            NodeKind::Sequence => self.sequence(node, depth, warnings).join("; "),
            NodeKind::Define => self.define(node, depth, warnings),
            NodeKind::Other => {
                debug!(kind = %node.kind, "unrecognised node kind, descending into first child");
                match children.first() {
                    Some(first) => self.expr(first, depth + 1, warnings),
                    None => node.value(),
                }
            }
        }
    }

    fn sequence(&self, node: &ExpressionNode, depth: usize, warnings: &mut Warnings) -> Vec<String> {
        node.children
            .iter()
            .map(|c| self.expr(c, depth + 1, warnings))
            .collect()
    }

    /// `name = value`; the target is read as a plain value
    fn define(&self, node: &ExpressionNode, depth: usize, warnings: &mut Warnings) -> String {
        let [target, value, ..] = node.children.as_slice() else {
            return String::new();
        };
        let name = self.expr(target, depth + 1, warnings);
        let value = self.expr(value, depth + 1, warnings);
        if name.trim().is_empty() || value.trim().is_empty() {
            return String::new();
        }
        infix::combine_binary(BinaryOp::Assign, name, value)
    }

    fn matrix(&self, node: &ExpressionNode, depth: usize, warnings: &mut Warnings) -> String {
        let dimension = |name: &str| node.attribute(name).and_then(|v| v.trim().parse::<usize>().ok());
        let (Some(rows), Some(cols)) = (dimension("rows"), dimension("cols")) else {
            warnings.push("Matrix without rows/cols dimensions; emitted as []");
            return "[]".to_string();
        };

        let elements = node
            .children
            .iter()
            .filter(|c| is_matrix_cell(c))
            .map(|c| self.expr(c, depth + 1, warnings))
            .collect();

        MatrixLayoutConverter::convert(&MatrixLiteral { rows, cols, elements }, warnings)
    }

    fn apply(&self, node: &ExpressionNode, depth: usize, warnings: &mut Warnings) -> String {
        let Some((head, args)) = node.children.split_first() else {
            return String::new();
        };
        let op = ApplyOp::of(head);
        let next = depth + 1;

        let result = match &op {
            ApplyOp::Arithmetic(binary) if args.len() >= 2 => {
                let mut operands = args.iter().map(|a| self.expr(a, next, warnings));
                let first = operands.next().unwrap_or_default();
                Some(operands.fold(first, |acc, rhs| infix::combine_binary(*binary, acc, rhs)))
            }
            ApplyOp::Minus if args.len() >= 2 => {
                let left = self.expr(&args[0], next, warnings);
                let right = self.expr(&args[1], next, warnings);
                Some(infix::combine_binary(BinaryOp::Sub, left, right))
            }
            ApplyOp::Minus | ApplyOp::Neg if !args.is_empty() => {
                Some(infix::negate(self.expr(&args[0], next, warnings)))
            }
            ApplyOp::Scale if args.len() >= 2 => Some(self.scale(&args[0], &args[1], next, warnings)),
            ApplyOp::Sqrt if !args.is_empty() => {
                Some(infix::call("sqrt", &[self.expr(&args[0], next, warnings)]))
            }
            ApplyOp::Named(name) if !args.is_empty() => {
                Some(infix::call(name, &[self.expr(&args[0], next, warnings)]))
            }
            ApplyOp::FunctionDerivative if !args.is_empty() => Some(self.derivative(&args[0], next, warnings)),
            ApplyOp::Indexer if args.len() >= 2 => {
                let array = self.expr(&args[0], next, warnings);
                let index = self.expr(&args[1], next, warnings);
                Some(format!("{array}[{index}]"))
            }
            ApplyOp::Call => {
                let name = self.sanitizer.symbol(&head.value());
                let call_args = self.call_arguments(args, next, warnings);
                Some(if call_args.is_empty() {
                    name
                } else {
                    infix::call(&name, &call_args)
                })
            }
            ApplyOp::Nested if !args.is_empty() => self.nested(head, args, next, warnings),
            _ => None,
        };

        match result {
            Some(text) => text,
            None => self.fallback(&op, args, next, warnings),
        }
    }

    /// Arguments of a function call; a `sequence` argument is spread
    fn call_arguments(&self, args: &[ExpressionNode], depth: usize, warnings: &mut Warnings) -> Vec<String> {
        let mut out = Vec::new();
        for arg in args {
            if NodeKind::of(arg) == NodeKind::Sequence {
                out.extend(self.sequence(arg, depth, warnings));
            } else {
                let text = self.expr(arg, depth, warnings);
                if !text.trim().is_empty() {
                    out.push(text);
                }
            }
        }
        out
    }

    /// `<apply><apply>inner</apply>args</apply>`: applying a derivative or a
    /// named function to arguments
    fn nested(
        &self,
        inner: &ExpressionNode,
        args: &[ExpressionNode],
        depth: usize,
        warnings: &mut Warnings,
    ) -> Option<String> {
        let inner_head = inner.children.first()?;
        match ApplyOp::of(inner_head) {
            ApplyOp::FunctionDerivative => {
                let derivative = self.expr(inner, depth, warnings);
                let arg = self.expr(&args[0], depth, warnings);
                Some(format!("{derivative}({arg})"))
            }
            ApplyOp::Call => {
                let name = self.sanitizer.symbol(&inner_head.value());
                let call_args: Vec<String> = args.iter().map(|a| self.expr(a, depth, warnings)).collect();
                Some(infix::call(&name, &call_args))
            }
            _ => None,
        }
    }

    /// `f'`, `f''`, ...: one prime per nested `functionDerivative`
    fn derivative(&self, target: &ExpressionNode, depth: usize, warnings: &mut Warnings) -> String {
        let mut order = 1;
        let mut current = target;
        while NodeKind::of(current) == NodeKind::Apply {
            match current.children.as_slice() {
                [head, inner, ..] if ApplyOp::of(head) == ApplyOp::FunctionDerivative => {
                    order += 1;
                    current = inner;
                }
                _ => break,
            }
        }

        let base = if NodeKind::of(current) == NodeKind::Id {
            self.sanitizer.symbol(&current.value())
        } else {
            self.expr(current, depth, warnings)
        };
        format!("{}{}", base, "'".repeat(order))
    }

    /// Quantity with a unit: `25cm` for literals, `value'unit` otherwise
    fn scale(
        &self,
        value: &ExpressionNode,
        unit: &ExpressionNode,
        depth: usize,
        warnings: &mut Warnings,
    ) -> String {
        let value_text = self.expr(value, depth, warnings);
        let is_unit = NodeKind::of(unit) == NodeKind::Id
            || unit.attribute("labels").is_some_and(|l| l.contains("UNIT"));

        if !is_unit {
            let factor = self.expr(unit, depth, warnings);
            return infix::combine_binary(BinaryOp::Mul, value_text, factor);
        }

        let raw_unit = unit.value().trim().to_string();
        let literal = value_text.parse::<f64>().is_ok() || value_text.starts_with('[');
        match UnitMapper::map(&raw_unit) {
            Some(mapped) if literal => format!("{value_text}{mapped}"),
            mapped => {
                let unit_text = mapped.map(str::to_string).unwrap_or(raw_unit);
                let value_text = if infix::outer_binding(&value_text) == Binding::Atom {
                    value_text
                } else {
                    infix::parenthesize(&value_text)
                };
                format!("{value_text}'{unit_text}")
            }
        }
    }

    /// Unknown operation or wrong operand count: keep the operands, space-joined
    fn fallback(&self, op: &ApplyOp, args: &[ExpressionNode], depth: usize, warnings: &mut Warnings) -> String {
        if let ApplyOp::Unknown(name) = op {
            warnings.push(format!("Unknown operation '{}'; operands kept as-is", name));
        } else {
            warnings.push(format!(
                "Operation '{}' has {} operand(s); operands kept as-is",
                op.label(),
                args.len()
            ));
        }
        args.iter()
            .map(|a| self.expr(a, depth, warnings))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// First node of `kind` in pre-order, including `root` itself
fn find_descendant<'a>(root: &'a ExpressionNode, kind: &str) -> Option<&'a ExpressionNode> {
    if root.kind == kind {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_descendant(c, kind))
}

fn collect_descendants<'a>(root: &'a ExpressionNode, kind: &str, out: &mut Vec<&'a ExpressionNode>) {
    for child in &root.children {
        if child.kind == kind {
            out.push(child);
        } else {
            collect_descendants(child, kind, out);
        }
    }
}

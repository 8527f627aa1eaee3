//! Spreadsheet cell formula → named-variable expression
//!
//! A formula is rewritten by a fixed sequence of pure text passes
//! ([`PIPELINE`]). Order matters: scientific literals are expanded before
//! anything looks for `COLROW` patterns, and ranges are consumed by `SUM`
//! and `MIN`/`MAX` before the remaining single references are renamed.

use super::identifier::IdentifierSanitizer;
use crate::types::{CellReference, Warnings};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::debug;

/// Cell address → raw text (values or labels)
pub type CellMap = HashMap<CellReference, String>;

/// Exponent literal not glued to a name, digit or decimal point on its
/// left; the separator before it is captured and kept
static SCIENTIFIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w.])((?:\d+(?:\.\d*)?|\.\d+)[eE][+-]?\d+)\b").expect("static regex")
});

static CELL_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\b([A-Z]{1,3})\$?(\d+)\b").expect("static regex"));

static SUM_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bSUM\(([^()]*)\)").expect("static regex"));

/// Innermost parenthesized group, optionally named `min`/`max`
static INNER_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\b(?:min|max))?\(([^()]*)\)").expect("static regex"));

static IF_WITH_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bIF\(([^,]+),\s*"[^"]*"\s*,\s*"[^"]*"\s*\)"#).expect("static regex")
});

/// Spreadsheet functions and their canonical spelling, applied in order.
///
/// `LOG(` must be rewritten before `LOG10(`: the case-insensitive `LOG(`
/// pattern would otherwise turn the freshly written `log(` into `ln(`.
static FUNCTION_TABLE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\bSQRT\(", "sqrt("),
        (r"(?i)\bABS\(", "abs("),
        (r"(?i)\bASIN\(", "asin("),
        (r"(?i)\bACOS\(", "acos("),
        (r"(?i)\bATAN\(", "atan("),
        (r"(?i)\bSIN\(", "sin("),
        (r"(?i)\bCOS\(", "cos("),
        (r"(?i)\bTAN\(", "tan("),
        (r"(?i)\bPI\(\s*\)", "π"),
        (r"(?i)\bPOWER\(([^,]+),([^)]+)\)", "${1}^(${2})"),
        (r"(?i)\bLOG\(", "ln("),
        (r"(?i)\bLN\(", "ln("),
        (r"(?i)\bLOG10\(", "log("),
        (r"(?i)\bEXP\(", "e^("),
        (r"(?i)\bMIN\(", "min("),
        (r"(?i)\bMAX\(", "max("),
        (r"(?i)\bROUND\(([^,]+),([^)]+)\)", "round(${1};${2})"),
        (r"(?i)\bINT\(", "floor("),
        (r"(?i)\bCEILING\(", "ceiling("),
        (r"(?i)\bFLOOR\(", "floor("),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("static regex"), replacement))
    .collect()
});

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Format a number the way fixed-point literals are written in the output:
/// at most ten decimals, no trailing zeros
fn fixed_point(value: f64) -> String {
    let text = format!("{:.10}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Rewrite `1.5E-2` style literals as `0.015`
pub fn normalize_scientific(input: &str) -> String {
    SCIENTIFIC
        .replace_all(input, |caps: &Captures| match caps[2].parse::<f64>() {
            Ok(v) if v.is_finite() => format!("{}{}", &caps[1], fixed_point(v)),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Every `COLROW` reference in `formula`, in order of appearance, `$`
/// anchors removed
pub fn referenced_cells(formula: &str) -> Vec<CellReference> {
    CELL_REF
        .captures_iter(formula)
        .filter_map(|caps| CellReference::parse(&format!("{}{}", &caps[1], &caps[2])))
        .collect()
}

fn is_number(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok()
}

/// Read-only lookups shared by every step of one translation
pub struct TranslationContext<'a> {
    pub values: &'a CellMap,
    pub labels: &'a CellMap,
    pub sanitizer: IdentifierSanitizer,
    pub minmax_iterations: usize,
}

impl TranslationContext<'_> {
    /// Label-derived name, or the sanitized address
    fn cell_name(&self, cell: &CellReference) -> String {
        match self.labels.get(cell) {
            Some(label) => self.sanitizer.variable_name(label),
            None => self.sanitizer.variable_name(&cell.key()),
        }
    }

    fn numeric_value(&self, cell: &CellReference) -> Option<&str> {
        self.values
            .get(cell)
            .map(|v| v.trim())
            .filter(|v| is_number(v))
    }
}

/// One text pass of the formula pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStep {
    StripLeadingSign,
    ScientificNotation,
    Functions,
    SumRanges,
    MinMax,
    Comparisons,
    CellReferences,
    Whitespace,
}

/// The passes in the order they run
pub const PIPELINE: [RewriteStep; 8] = [
    RewriteStep::StripLeadingSign,
    RewriteStep::ScientificNotation,
    RewriteStep::Functions,
    RewriteStep::SumRanges,
    RewriteStep::MinMax,
    RewriteStep::Comparisons,
    RewriteStep::CellReferences,
    RewriteStep::Whitespace,
];

impl RewriteStep {
    pub fn apply(self, input: &str, ctx: &TranslationContext, warnings: &mut Warnings) -> String {
        match self {
            RewriteStep::StripLeadingSign => strip_leading_sign(input),
            RewriteStep::ScientificNotation => normalize_scientific(input),
            RewriteStep::Functions => rewrite_functions(input),
            RewriteStep::SumRanges => expand_sums(input, ctx),
            RewriteStep::MinMax => flatten_min_max(input, ctx.minmax_iterations),
            RewriteStep::Comparisons => input.replace(">=", "≥").replace("<=", "≤").replace("<>", "≠"),
            RewriteStep::CellReferences => substitute_cells(input, ctx, warnings),
            RewriteStep::Whitespace => input.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

/// Drops the `=` some exporters keep and the leading `+` of `=+A1*2`
fn strip_leading_sign(input: &str) -> String {
    let trimmed = input.trim_start();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed);
    trimmed.strip_prefix('+').unwrap_or(trimmed).to_string()
}

fn rewrite_functions(input: &str) -> String {
    let mut text = IF_WITH_TEXT.replace_all(input, "(${1})").into_owned();
    for (pattern, replacement) in FUNCTION_TABLE.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    // Conditionals without text branches map directly
    static IF_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bIF\(").expect("static regex"));
    IF_CALL.replace_all(&text, "if(").into_owned()
}

/// `SUM(A1:A3, B5)` → `(x+y+B5)`; range cells without a numeric value drop out
fn expand_sums(input: &str, ctx: &TranslationContext) -> String {
    SUM_CALL
        .replace_all(input, |caps: &Captures| {
            let mut terms = Vec::new();
            for arg in caps[1].split([',', ';']).map(str::trim).filter(|a| !a.is_empty()) {
                match arg.split_once(':') {
                    Some((start, end)) => match (CellReference::parse(start), CellReference::parse(end)) {
                        (Some(start), Some(end)) => terms.extend(range_terms(&start, &end, ctx)),
                        _ => terms.push(arg.to_string()),
                    },
                    None => match CellReference::parse(arg) {
                        Some(cell) => terms.push(ctx.cell_name(&cell)),
                        None => terms.push(arg.to_string()),
                    },
                }
            }
            debug!(call = &caps[0], terms = terms.len(), "expanded SUM");
            match terms.len() {
                0 => "0".to_string(),
                1 => terms.remove(0),
                _ => format!("({})", terms.join("+")),
            }
        })
        .into_owned()
}

/// Names of the numeric cells in a rectangular range, row by row.
///
/// Walks the cells that hold values rather than every address, so a
/// whole-sheet range costs no more than the sheet itself.
fn range_terms(start: &CellReference, end: &CellReference, ctx: &TranslationContext) -> Vec<String> {
    let (c0, c1) = min_max(start.column_index(), end.column_index());
    let (r0, r1) = min_max(start.row, end.row);
    let mut cells: Vec<&CellReference> = ctx
        .values
        .keys()
        .filter(|cell| (r0..=r1).contains(&cell.row) && (c0..=c1).contains(&cell.column_index()))
        .filter(|cell| ctx.numeric_value(cell).is_some())
        .collect();
    cells.sort_by_key(|cell| (cell.row, cell.column_index()));
    cells.into_iter().map(|cell| ctx.cell_name(cell)).collect()
}

fn min_max<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Rewrite the argument separators of every `min`/`max` call, innermost
/// first.
///
/// Each round hides the innermost parenthesized groups behind placeholders
/// so the enclosing call becomes innermost on the next round. Stops when no
/// group is left or after `cap` rounds; anything unreached keeps its text.
fn flatten_min_max(input: &str, cap: usize) -> String {
    let mut hidden: Vec<String> = Vec::new();
    let mut text = input.to_string();

    for round in 0..cap {
        if !INNER_GROUP.is_match(&text) {
            break;
        }
        text = INNER_GROUP
            .replace_all(&text, |caps: &Captures| {
                let group = match caps.get(1) {
                    Some(name) => format!(
                        "{}({})",
                        name.as_str().to_lowercase(),
                        caps[2].replace([':', ','], ";")
                    ),
                    None => caps[0].to_string(),
                };
                hidden.push(group);
                format!("{}{}{}", PLACEHOLDER_OPEN, hidden.len() - 1, PLACEHOLDER_CLOSE)
            })
            .into_owned();
        debug!(round, groups = hidden.len(), "min/max flattening round");
    }

    // Later placeholders enclose earlier ones, so unwrap from the outside in
    for (index, group) in hidden.iter().enumerate().rev() {
        let token = format!("{}{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE);
        text = text.replace(&token, group);
    }
    text
}

fn substitute_cells(input: &str, ctx: &TranslationContext, warnings: &mut Warnings) -> String {
    CELL_REF
        .replace_all(input, |caps: &Captures| {
            let Some(cell) = CellReference::parse(&format!("{}{}", &caps[1], &caps[2])) else {
                return caps[0].to_string();
            };
            if let Some(label) = ctx.labels.get(&cell) {
                return ctx.sanitizer.variable_name(label);
            }
            if let Some(value) = ctx.numeric_value(&cell) {
                let literal = normalize_scientific(value);
                return if literal.starts_with('-') {
                    format!("({literal})")
                } else {
                    literal
                };
            }
            warnings.push(format!(
                "Cell {} has no label and no numeric value; referenced by address",
                cell
            ));
            ctx.sanitizer.variable_name(&cell.key())
        })
        .into_owned()
}

/// Rewrites spreadsheet formulas into canonical expressions over named
/// variables
#[derive(Debug, Clone)]
pub struct CellFormulaTranslator {
    sanitizer: IdentifierSanitizer,
    minmax_iterations: usize,
}

impl Default for CellFormulaTranslator {
    fn default() -> Self {
        Self::new(IdentifierSanitizer::default(), 10)
    }
}

impl CellFormulaTranslator {
    pub fn new(sanitizer: IdentifierSanitizer, minmax_iterations: usize) -> Self {
        Self {
            sanitizer,
            minmax_iterations,
        }
    }

    /// Run `formula` through every pass of [`PIPELINE`].
    ///
    /// An empty formula translates to `0`. Unrecognised functions and
    /// fragments no pass understands are left as written.
    pub fn translate(&self, formula: &str, values: &CellMap, labels: &CellMap) -> (String, Warnings) {
        let mut warnings = Warnings::new();
        if formula.trim().is_empty() {
            return ("0".to_string(), warnings);
        }

        let ctx = TranslationContext {
            values,
            labels,
            sanitizer: self.sanitizer,
            minmax_iterations: self.minmax_iterations,
        };

        let mut text = formula.to_string();
        for step in PIPELINE {
            let next = step.apply(&text, &ctx, &mut warnings);
            if next != text {
                debug!(?step, from = %text, to = %next, "formula rewrite");
            }
            text = next;
        }
        (text, warnings)
    }
}

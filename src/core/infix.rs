//! Infix assembly with minimal parentheses
//!
//! Partial expressions are plain strings. Their binding strength is
//! recovered by scanning for the loosest operator at nesting depth 0, so no
//! tag has to travel with the text.

/// Binding strength of an expression's outermost operator, loosest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Binding {
    Assignment,
    Comparison,
    Additive,
    Multiplicative,
    Power,
    /// Leading sign: `-x`
    Unary,
    /// Literal, name, call, bracketed literal or parenthesized group
    Atom,
}

/// Binary operators of the canonical syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    Compare(&'static str),
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::Compare(s) => s,
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }

    pub fn binding(self) -> Binding {
        match self {
            BinaryOp::Assign => Binding::Assignment,
            BinaryOp::Compare(_) => Binding::Comparison,
            BinaryOp::Add | BinaryOp::Sub => Binding::Additive,
            BinaryOp::Mul | BinaryOp::Div => Binding::Multiplicative,
            BinaryOp::Pow => Binding::Power,
        }
    }

    /// Map a comparison spelling (`>=`, `<>`, `==`, ...) to its canonical symbol
    pub fn comparison(text: &str) -> Option<Self> {
        let symbol = match text {
            "<" => "<",
            ">" => ">",
            "<=" | "≤" => "≤",
            ">=" | "≥" => "≥",
            "<>" | "!=" | "≠" => "≠",
            "==" | "≡" => "≡",
            _ => return None,
        };
        Some(BinaryOp::Compare(symbol))
    }
}

const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '^', '=', '<', '>', '≤', '≥', '≠', '≡', '(', '[', '{', ';', ',', '|',
];

/// Loosest operator found at nesting depth 0
pub fn outer_binding(expr: &str) -> Binding {
    let chars: Vec<char> = expr.trim().chars().collect();
    if chars.is_empty() {
        return Binding::Atom;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut loosest = Binding::Atom;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '=' => loosest = loosest.min(Binding::Assignment),
            '<' | '>' | '≤' | '≥' | '≠' | '≡' => loosest = loosest.min(Binding::Comparison),
            '+' | '-' if is_binary_sign(&chars, i) => loosest = loosest.min(Binding::Additive),
            '*' | '/' => loosest = loosest.min(Binding::Multiplicative),
            '^' => loosest = loosest.min(Binding::Power),
            _ => {}
        }
    }

    if loosest == Binding::Atom && matches!(chars[0], '-' | '+') {
        Binding::Unary
    } else {
        loosest
    }
}

/// A sign is binary when something other than an operator precedes it and
/// it is not the exponent sign of a numeric literal such as `1.5e-3`
fn is_binary_sign(chars: &[char], i: usize) -> bool {
    let Some(prev_idx) = (0..i).rev().find(|&j| !chars[j].is_whitespace()) else {
        return false;
    };
    let prev = chars[prev_idx];
    if OPERATOR_CHARS.contains(&prev) {
        return false;
    }
    if matches!(prev, 'e' | 'E') && prev_idx == i - 1 {
        let mut j = prev_idx;
        let mut saw_digit = false;
        while j > 0 && (chars[j - 1].is_ascii_digit() || chars[j - 1] == '.') {
            saw_digit |= chars[j - 1].is_ascii_digit();
            j -= 1;
        }
        let starts_literal = j == 0 || !(chars[j - 1].is_alphanumeric() || chars[j - 1] == '_');
        if saw_digit && starts_literal {
            return false;
        }
    }
    true
}

fn leads_with_sign(expr: &str) -> bool {
    expr.trim_start().starts_with(['-', '+'])
}

pub fn parenthesize(expr: &str) -> String {
    format!("({expr})")
}

fn wrap_if(expr: String, wrap: bool) -> String {
    if wrap {
        parenthesize(&expr)
    } else {
        expr
    }
}

/// Join two operands with `op`, adding parentheses only where the operand
/// would otherwise bind differently.
///
/// `+`, `-` and comparisons are written with surrounding spaces; `*`, `/`
/// and `^` are written tight, so `(2 + 3)*4` and `2 + 3*4`.
pub fn combine_binary(op: BinaryOp, left: String, right: String) -> String {
    let lb = outer_binding(&left);
    let rb = outer_binding(&right);
    let left_signed = leads_with_sign(&left);
    let right_signed = leads_with_sign(&right);

    let (wrap_left, wrap_right) = match op {
        BinaryOp::Assign => (false, false),
        BinaryOp::Compare(_) => (lb <= Binding::Comparison, rb <= Binding::Comparison),
        BinaryOp::Add => (lb < Binding::Additive, rb < Binding::Additive || right_signed),
        BinaryOp::Sub => (
            lb < Binding::Additive,
            rb <= Binding::Additive || right_signed,
        ),
        BinaryOp::Mul => (
            lb <= Binding::Additive,
            rb <= Binding::Additive || right_signed,
        ),
        BinaryOp::Div => (
            lb <= Binding::Additive,
            rb <= Binding::Multiplicative || right_signed,
        ),
        BinaryOp::Pow => (
            lb <= Binding::Power || left_signed,
            rb <= Binding::Power || right_signed,
        ),
    };

    let left = wrap_if(left, wrap_left);
    let right = wrap_if(right, wrap_right);

    match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            format!("{}{}{}", left, op.symbol(), right)
        }
        _ => format!("{} {} {}", left, op.symbol(), right),
    }
}

/// `-x`, parenthesizing anything looser than a power
pub fn negate(operand: String) -> String {
    let wrap = outer_binding(&operand) < Binding::Power || operand.trim_start().starts_with('-');
    format!("-{}", wrap_if(operand, wrap))
}

/// Postfix operator such as `!`, applied to atoms only
pub fn postfix(operand: String, symbol: &str) -> String {
    let wrap = outer_binding(&operand) != Binding::Atom;
    format!("{}{}", wrap_if(operand, wrap), symbol)
}

/// `name(a; b; c)`
pub fn call(name: &str, args: &[String]) -> String {
    format!("{}({})", name, args.join("; "))
}

/// Free text as `' line` comments, one per source line. Blank text yields
/// nothing.
pub fn comment_lines(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(|line| format!("' {}", line.trim())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> String {
        x.to_string()
    }

    #[test]
    fn test_comment_lines() {
        assert_eq!(
            comment_lines("  Beam design\n  notes  \n"),
            vec!["' Beam design", "' notes"]
        );
        assert!(comment_lines(" \n ").is_empty());
    }

    #[test]
    fn test_outer_binding() {
        assert_eq!(outer_binding("2 + 3"), Binding::Additive);
        assert_eq!(outer_binding("(2 + 3)*4"), Binding::Multiplicative);
        assert_eq!(outer_binding("a^2"), Binding::Power);
        assert_eq!(outer_binding("-x"), Binding::Unary);
        assert_eq!(outer_binding("sqrt(a + b)"), Binding::Atom);
        assert_eq!(outer_binding("a = b + c"), Binding::Assignment);
        assert_eq!(outer_binding("a ≥ b"), Binding::Comparison);
        assert_eq!(outer_binding("[1; 2 | 3; 4]"), Binding::Atom);
        assert_eq!(outer_binding("\"a+b\""), Binding::Atom);
    }

    #[test]
    fn test_scientific_literal_is_atom() {
        assert_eq!(outer_binding("1.5e-3"), Binding::Atom);
        assert_eq!(outer_binding("2E+10"), Binding::Atom);
        assert_eq!(outer_binding("x2e-3"), Binding::Additive);
    }

    #[test]
    fn test_multiplication_wraps_sums() {
        assert_eq!(combine_binary(BinaryOp::Mul, s("2 + 3"), s("4")), "(2 + 3)*4");
        assert_eq!(combine_binary(BinaryOp::Mul, s("a*b"), s("c/d")), "a*b*c/d");
    }

    #[test]
    fn test_addition_never_wraps_products() {
        assert_eq!(combine_binary(BinaryOp::Add, s("2"), s("3*4")), "2 + 3*4");
        assert_eq!(combine_binary(BinaryOp::Add, s("a - b"), s("c")), "a - b + c");
    }

    #[test]
    fn test_subtraction_keeps_right_grouping() {
        assert_eq!(combine_binary(BinaryOp::Sub, s("a"), s("b - c")), "a - (b - c)");
        assert_eq!(combine_binary(BinaryOp::Sub, s("a - b"), s("c")), "a - b - c");
        assert_eq!(combine_binary(BinaryOp::Sub, s("a"), s("-b")), "a - (-b)");
        assert_eq!(combine_binary(BinaryOp::Add, s("a"), s("-x^2")), "a + (-x^2)");
    }

    #[test]
    fn test_division_wraps_right_products() {
        assert_eq!(combine_binary(BinaryOp::Div, s("a"), s("b*c")), "a/(b*c)");
        assert_eq!(combine_binary(BinaryOp::Div, s("a*b"), s("c")), "a*b/c");
    }

    #[test]
    fn test_power_wraps_everything_looser() {
        assert_eq!(combine_binary(BinaryOp::Pow, s("a*b"), s("2")), "(a*b)^2");
        assert_eq!(combine_binary(BinaryOp::Pow, s("x"), s("n + 1")), "x^(n + 1)");
        assert_eq!(combine_binary(BinaryOp::Pow, s("-x"), s("2")), "(-x)^2");
        assert_eq!(combine_binary(BinaryOp::Pow, s("a^b"), s("c")), "(a^b)^c");
        assert_eq!(combine_binary(BinaryOp::Pow, s("-x^2"), s("3")), "(-x^2)^3");
    }

    #[test]
    fn test_assignment_never_wraps() {
        assert_eq!(
            combine_binary(BinaryOp::Assign, s("F"), s("m*a + b")),
            "F = m*a + b"
        );
    }

    #[test]
    fn test_comparison() {
        let op = BinaryOp::comparison(">=").unwrap();
        assert_eq!(combine_binary(op, s("a + b"), s("c")), "a + b ≥ c");
        assert_eq!(BinaryOp::comparison("<>"), Some(BinaryOp::Compare("≠")));
        assert_eq!(BinaryOp::comparison("+"), None);
    }

    #[test]
    fn test_unary_helpers() {
        assert_eq!(negate(s("x")), "-x");
        assert_eq!(negate(s("a + b")), "-(a + b)");
        assert_eq!(negate(s("-x")), "-(-x)");
        assert_eq!(negate(s("a^2")), "-a^2");
        assert_eq!(postfix(s("n"), "!"), "n!");
        assert_eq!(postfix(s("n + 1"), "!"), "(n + 1)!");
        assert_eq!(call("max", &[s("a"), s("b")]), "max(a; b)");
    }
}

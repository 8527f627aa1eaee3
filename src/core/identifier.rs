//! Identifier canonicalization
//!
//! Two flavours of cleanup are needed:
//! - labels and cell addresses become plain ASCII variable names
//!   (`Area (m²)` → `Area_m2`, `7B` → `v7B`)
//! - identifiers already written as math symbols keep their shape but have
//!   spelled-out Greek letters replaced by the letter itself (`alpha` → `α`)

use once_cell::sync::Lazy;
use regex::Regex;

/// Spelled-out Greek letters and their symbols
const GREEK: &[(&str, &str)] = &[
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("eta", "η"),
    ("theta", "θ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("pi", "π"),
    ("rho", "ρ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("phi", "φ"),
    ("omega", "ω"),
    ("Gamma", "Γ"),
    ("Delta", "Δ"),
    ("Theta", "Θ"),
    ("Lambda", "Λ"),
    ("Pi", "Π"),
    ("Sigma", "Σ"),
    ("Phi", "Φ"),
    ("Omega", "Ω"),
];

/// Characters rewritten before the final ASCII filter
const LABEL_REPLACEMENTS: &[(char, &str)] = &[
    (' ', "_"),
    ('/', "_"),
    ('\\', "_"),
    ('-', "_"),
    ('+', "_"),
    ('*', "_"),
    ('=', "_"),
    ('.', "_"),
    (',', "_"),
    (':', "_"),
    (';', "_"),
    ('²', "2"),
    ('³', "3"),
    ('∑', "Sum"),
];

static SUBSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\d+)").expect("static regex"));

/// Turns labels, cell addresses and source identifiers into canonical names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierSanitizer {
    max_len: usize,
}

impl Default for IdentifierSanitizer {
    fn default() -> Self {
        Self { max_len: 30 }
    }
}

impl IdentifierSanitizer {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    /// Canonical ASCII variable name for a label or cell address.
    ///
    /// Result matches `[A-Za-z][A-Za-z0-9_]*`, never starts with `_`, and is
    /// at most `max_len` characters. Already-canonical names come back
    /// unchanged.
    pub fn variable_name(&self, input: &str) -> String {
        if input.is_empty() {
            return "x".to_string();
        }

        let mut spelled = String::with_capacity(input.len());
        for c in input.chars() {
            if let Some((_, to)) = LABEL_REPLACEMENTS.iter().find(|(from, _)| *from == c) {
                spelled.push_str(to);
            } else if let Some(name) = greek_name(c) {
                spelled.push_str(name);
            } else {
                spelled.push(c);
            }
        }

        let mut result: String = spelled
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        // Leading underscores are not valid; a name made only of them becomes "v"
        if result.starts_with('_') {
            let trimmed = result.trim_start_matches('_');
            result = if trimmed.is_empty() {
                "v".to_string()
            } else {
                trimmed.to_string()
            };
        }

        if result.starts_with(|c: char| c.is_ascii_digit()) {
            result.insert(0, 'v');
        }

        if result.len() > self.max_len {
            result.truncate(self.max_len);
        }

        if result.is_empty() {
            result.push('x');
        }

        result
    }

    /// Identifier as written in a math region, with Greek names turned into
    /// symbols (`alpha_1` → `α_1`). Only whole alphabetic runs are replaced,
    /// so `mult` or `theta2x` keep their inner letters.
    pub fn symbol(&self, id: &str) -> String {
        let id = id.trim();
        let mut out = String::with_capacity(id.len());
        let mut run = String::new();

        for c in id.chars() {
            if c.is_alphabetic() {
                run.push(c);
            } else {
                flush_greek(&mut run, &mut out);
                out.push(c);
            }
        }
        flush_greek(&mut run, &mut out);
        out
    }

    /// Like [`symbol`](Self::symbol), but numeric subscripts written with an
    /// underscore are collapsed first (`x_1` → `x1`)
    pub fn subscripted_symbol(&self, id: &str) -> String {
        let collapsed = SUBSCRIPT.replace_all(id.trim(), "$1");
        self.symbol(&collapsed)
    }
}

fn flush_greek(run: &mut String, out: &mut String) {
    if run.is_empty() {
        return;
    }
    match GREEK.iter().find(|(name, _)| *name == run.as_str()) {
        Some((_, symbol)) => out.push_str(symbol),
        None => out.push_str(run),
    }
    run.clear();
}

fn greek_name(c: char) -> Option<&'static str> {
    let mut buf = [0u8; 4];
    let symbol: &str = c.encode_utf8(&mut buf);
    GREEK
        .iter()
        .find(|(_, s)| *s == symbol)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name_from_label() {
        let s = IdentifierSanitizer::default();
        assert_eq!(s.variable_name("Area (m²)"), "Area_m2");
        assert_eq!(s.variable_name("f'c"), "fc");
        assert_eq!(s.variable_name("Total load"), "Total_load");
        assert_eq!(s.variable_name("σ adm"), "sigma_adm");
    }

    #[test]
    fn test_variable_name_edge_cases() {
        let s = IdentifierSanitizer::default();
        assert_eq!(s.variable_name(""), "x");
        assert_eq!(s.variable_name("°"), "x");
        assert_eq!(s.variable_name("_"), "v");
        assert_eq!(s.variable_name("__a"), "a");
        assert_eq!(s.variable_name("7B"), "v7B");
        assert_eq!(s.variable_name("B7"), "B7");
    }

    #[test]
    fn test_variable_name_truncates() {
        let s = IdentifierSanitizer::new(5);
        assert_eq!(s.variable_name("abcdefgh"), "abcde");
    }

    #[test]
    fn test_variable_name_idempotent() {
        let s = IdentifierSanitizer::default();
        for label in ["Area (m²)", "_x", "12 kN", "Momento último", "A1", "α"] {
            let once = s.variable_name(label);
            assert_eq!(s.variable_name(&once), once, "label {label:?}");
        }
    }

    #[test]
    fn test_symbol_greek() {
        let s = IdentifierSanitizer::default();
        assert_eq!(s.symbol("alpha"), "α");
        assert_eq!(s.symbol(" sigma_c "), "σ_c");
        assert_eq!(s.symbol("Delta"), "Δ");
        assert_eq!(s.symbol("mult"), "mult");
        assert_eq!(s.symbol("pi2"), "π2");
    }

    #[test]
    fn test_symbol_idempotent() {
        let s = IdentifierSanitizer::default();
        let once = s.symbol("theta_max");
        assert_eq!(s.symbol(&once), once);
    }

    #[test]
    fn test_subscripted_symbol() {
        let s = IdentifierSanitizer::default();
        assert_eq!(s.subscripted_symbol("x_1"), "x1");
        assert_eq!(s.subscripted_symbol("beta_12"), "β12");
        assert_eq!(s.subscripted_symbol("f_ck"), "f_ck");
    }
}

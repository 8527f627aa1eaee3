use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Any YAML/JSON scalar, read back as text so `value: 6` and `value: "6"`
/// mean the same thing
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn optional_scalar_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

//==============================================================================
// Token stream (postfix source)
//==============================================================================

/// Role of a token in a postfix stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Operand,
    Operator,
    Function,
    Bracket,
}

/// One entry of a postfix token stream.
///
/// `arity` is 0 for leaf operands, 1 for unary operators and single-argument
/// functions, 2 or more for n-ary operators and functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    #[serde(deserialize_with = "scalar_text")]
    pub text: String,
    #[serde(default)]
    pub arity: usize,
}

impl Token {
    pub fn operand(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Operand,
            text: text.into(),
            arity: 0,
        }
    }

    pub fn operator(text: impl Into<String>, arity: usize) -> Self {
        Self {
            kind: TokenKind::Operator,
            text: text.into(),
            arity,
        }
    }

    pub fn function(text: impl Into<String>, arity: usize) -> Self {
        Self {
            kind: TokenKind::Function,
            text: text.into(),
            arity,
        }
    }

    pub fn bracket(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Bracket,
            text: text.into(),
            arity: 0,
        }
    }
}

/// A single worksheet region: a postfix stream, free text, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRegion {
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Text region content, emitted as comment lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Token-stream document: one region per statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenDocument {
    #[serde(default)]
    pub regions: Vec<TokenRegion>,
}

//==============================================================================
// Expression tree (XML-tree source)
//==============================================================================

/// One element of an already-parsed expression tree.
///
/// `kind` is the element's local name (`id`, `real`, `apply`, ...). Leaf
/// elements carry their character data in `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionNode {
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExpressionNode>,
    #[serde(
        default,
        deserialize_with = "optional_scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
}

impl ExpressionNode {
    /// Element with no children
    pub fn leaf(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Element with children and no text
    pub fn branch(kind: impl Into<String>, children: Vec<ExpressionNode>) -> Self {
        Self {
            kind: kind.into(),
            children,
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Concatenated character data of this node and all descendants,
    /// matching what an XML reader reports as the element's value.
    pub fn value(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// Expression-tree document: one top-level node per math region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub regions: Vec<ExpressionNode>,
}

//==============================================================================
// Spreadsheet (cell formula source)
//==============================================================================

/// A cell address such as `B7` or `AA12`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellReference {
    pub column: String,
    pub row: u32,
}

impl CellReference {
    pub fn new(column: impl Into<String>, row: u32) -> Self {
        Self {
            column: column.into(),
            row,
        }
    }

    /// Parse `COLROW` (optionally with `$` anchors) into a reference
    pub fn parse(address: &str) -> Option<Self> {
        let cleaned: String = address.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned.find(|c: char| c.is_ascii_digit())?;
        let (column, row) = cleaned.split_at(split);
        if column.is_empty() || !column.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }
        let row: u32 = row.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(column, row))
    }

    /// Zero-based column index (A → 0, Z → 25, AA → 26)
    pub fn column_index(&self) -> usize {
        column_letter_to_index(&self.column)
    }

    /// Same row, neighbouring column; `None` past column A
    pub fn left(&self) -> Option<Self> {
        let idx = self.column_index();
        (idx > 0).then(|| Self::new(column_index_to_letter(idx - 1), self.row))
    }

    pub fn right(&self) -> Self {
        Self::new(column_index_to_letter(self.column_index() + 1), self.row)
    }

    /// Canonical `COLROW` key
    pub fn key(&self) -> String {
        format!("{}{}", self.column, self.row)
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

/// Convert a column index to its letter form
///
/// Examples:
/// - 0 → A
/// - 25 → Z
/// - 26 → AA
pub fn column_index_to_letter(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Inverse of [`column_index_to_letter`]
pub fn column_letter_to_index(letters: &str) -> usize {
    letters
        .bytes()
        .filter(u8::is_ascii_uppercase)
        .fold(0usize, |acc, b| acc * 26 + (b - b'A') as usize + 1)
        .saturating_sub(1)
}

/// A formula cell queued for dependency ordering
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCell {
    pub reference: CellReference,
    /// Canonical variable name the translated formula is bound to
    pub name: String,
    pub raw_formula: String,
}

/// A named value produced by a translation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub canonical_name: String,
    pub source_label: Option<String>,
    pub unit: Option<String>,
}

/// A raw cell as handed over by the spreadsheet reader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellInput {
    pub address: String,
    #[serde(
        default,
        deserialize_with = "optional_scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cells: Vec<CellInput>,
}

/// Spreadsheet document: already-extracted cell values and formulas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    #[serde(default)]
    pub sheets: Vec<SheetInput>,
}

//==============================================================================
// Conversion output
//==============================================================================

/// Ordered list of best-effort recoveries taken during one conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings {
    entries: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.entries.push(message);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

/// Translated text plus the warnings gathered while producing it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub warnings: Vec<String>,
}

impl Conversion {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

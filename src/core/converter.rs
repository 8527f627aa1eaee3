//! Document-level conversion
//!
//! Each call builds its own output buffer and warnings list; a `Converter`
//! only holds configuration and can be shared between threads.

use super::cell_translator::CellFormulaTranslator;
use super::identifier::IdentifierSanitizer;
use super::infix;
use super::sheet::SheetConverter;
use super::stack_evaluator::StackExpressionEvaluator;
use super::tree_extractor::TreeExpressionExtractor;
use crate::config::ConvertOptions;
use crate::parser::SourceDocument;
use crate::types::{Conversion, SheetDocument, TokenDocument, TreeDocument, Warnings};
use std::fmt;
use tracing::{debug, info};

/// The three supported source representations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Tokens,
    Tree,
    Sheet,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Tokens => "postfix token stream",
            SourceKind::Tree => "expression tree",
            SourceKind::Sheet => "spreadsheet",
        };
        f.write_str(name)
    }
}

/// Entry point tying the translators to one set of options
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
    evaluator: StackExpressionEvaluator,
    extractor: TreeExpressionExtractor,
    sheets: SheetConverter,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        let sanitizer = IdentifierSanitizer::new(options.max_identifier_len);
        let translator = CellFormulaTranslator::new(sanitizer, options.minmax_iterations);
        Self {
            evaluator: StackExpressionEvaluator::new(sanitizer),
            extractor: TreeExpressionExtractor::new(sanitizer, options.max_depth),
            sheets: SheetConverter::new(sanitizer, translator, options.headings),
            options,
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Dispatch on the document kind
    pub fn convert(&self, document: &SourceDocument) -> Conversion {
        match document {
            SourceDocument::Tokens(tokens) => self.convert_tokens(tokens),
            SourceDocument::Tree(tree) => self.convert_tree(tree),
            SourceDocument::Sheet(sheets) => self.convert_sheets(sheets),
        }
    }

    /// One statement per region whose stream yields a non-empty expression.
    /// Text regions become `' line` comments.
    pub fn convert_tokens(&self, document: &TokenDocument) -> Conversion {
        let mut warnings = Warnings::new();
        let mut lines = self.header(SourceKind::Tokens);

        for (index, region) in document.regions.iter().enumerate() {
            if let Some(text) = &region.text {
                lines.extend(infix::comment_lines(text));
            }
            let (expression, region_warnings) = self.evaluator.evaluate(&region.tokens);
            warnings.extend(region_warnings);
            if expression.trim().is_empty() {
                debug!(region = index, "token region produced no expression");
                continue;
            }
            lines.push(expression);
        }

        self.finish(SourceKind::Tokens, lines, warnings)
    }

    /// Statements and comments for every tree region, in order
    pub fn convert_tree(&self, document: &TreeDocument) -> Conversion {
        let mut warnings = Warnings::new();
        let mut lines = self.header(SourceKind::Tree);

        for (index, region) in document.regions.iter().enumerate() {
            let statements = self.extractor.extract_region(region, &mut warnings);
            if statements.is_empty() {
                debug!(region = index, kind = %region.kind, "tree region produced no statement");
            }
            lines.extend(statements);
        }

        self.finish(SourceKind::Tree, lines, warnings)
    }

    /// Every sheet in document order, separated by a blank line
    pub fn convert_sheets(&self, document: &SheetDocument) -> Conversion {
        let mut warnings = Warnings::new();
        let mut lines = self.header(SourceKind::Sheet);

        for sheet in &document.sheets {
            let sheet_lines = self.sheets.convert(sheet, &mut warnings);
            if sheet_lines.is_empty() {
                debug!(sheet = %sheet.name, "sheet produced no statements");
                continue;
            }
            if lines.last().is_some_and(|l| !l.is_empty()) {
                lines.push(String::new());
            }
            lines.extend(sheet_lines);
        }

        self.finish(SourceKind::Sheet, lines, warnings)
    }

    fn header(&self, kind: SourceKind) -> Vec<String> {
        if self.options.header_comment {
            vec![format!("'Converted from {}", kind)]
        } else {
            Vec::new()
        }
    }

    fn finish(&self, kind: SourceKind, lines: Vec<String>, warnings: Warnings) -> Conversion {
        info!(
            source = %kind,
            lines = lines.len(),
            warnings = warnings.len(),
            "conversion finished"
        );
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        Conversion {
            text,
            warnings: warnings.into_vec(),
        }
    }
}

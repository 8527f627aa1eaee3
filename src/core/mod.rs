//! Translation engine: three source-specific translators over shared
//! identifier, unit, matrix and infix utilities

pub mod cell_translator;
pub mod converter;
pub mod dependency;
pub mod identifier;
pub mod infix;
pub mod matrix;
pub mod sheet;
pub mod stack_evaluator;
pub mod tree_extractor;
pub mod units;

pub use cell_translator::{CellFormulaTranslator, CellMap, RewriteStep, PIPELINE};
pub use converter::{Converter, SourceKind};
pub use dependency::DependencyOrderer;
pub use identifier::IdentifierSanitizer;
pub use matrix::{MatrixLayoutConverter, MatrixLiteral, RowMajorMatrix};
pub use sheet::SheetConverter;
pub use stack_evaluator::StackExpressionEvaluator;
pub use tree_extractor::TreeExpressionExtractor;
pub use units::UnitMapper;

//! calcbridge - worksheet math to canonical calculation text
//!
//! This library converts math content from three foreign representations
//! into one canonical infix calculation language:
//!
//! - postfix token streams (math-editor worksheets)
//! - expression trees (CAS worksheets)
//! - spreadsheet cells with values and formulas
//!
//! # Features
//!
//! - Minimal parentheses: precedence is reconstructed, not copied
//! - Column-major matrices reoriented into `[a; b | c; d]` literals
//! - Unit suffixes mapped to canonical tokens (`25cm`, `3kN*m`)
//! - Spreadsheet formulas renamed through neighbouring labels and ordered
//!   by dependency, tolerating circular references
//! - Never fails on a malformed fragment: best-effort text plus warnings
//!
//! # Example
//!
//! ```no_run
//! use calcbridge::core::{Converter, SourceKind};
//! use calcbridge::parser::parse_document;
//! use std::path::Path;
//!
//! let document = parse_document(Path::new("beam.yaml"), SourceKind::Sheet)?;
//! let conversion = Converter::default().convert(&document);
//!
//! print!("{}", conversion.text);
//! for warning in &conversion.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok::<(), calcbridge::error::BridgeError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use config::ConvertOptions;
pub use error::{BridgeError, BridgeResult};
pub use types::{Conversion, ExpressionNode, Token, TokenKind, Warnings};

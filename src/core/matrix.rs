//! Column-major → row-major matrix literals
//!
//! Source matrices list their elements column by column. The canonical
//! literal is written row by row: `;` separates columns inside a row and
//! `|` separates rows, so the 2×2 matrix stored as `1, 2, 3, 4` becomes
//! `[1; 3 | 2; 4]`.

use crate::types::Warnings;

/// A matrix exactly as the source stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixLiteral {
    pub rows: usize,
    pub cols: usize,
    /// Elements in column-major order
    pub elements: Vec<String>,
}

/// The same matrix reoriented for emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMajorMatrix {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<String>>,
}

impl RowMajorMatrix {
    /// Render as a canonical literal.
    ///
    /// A single column is written as a flat `[a; b; c]` list.
    pub fn render(&self) -> String {
        if self.cols == 1 {
            let column: Vec<&str> = self.cells.iter().map(|row| row[0].as_str()).collect();
            return format!("[{}]", column.join("; "));
        }

        let rows: Vec<String> = self.cells.iter().map(|row| row.join("; ")).collect();
        format!("[{}]", rows.join(" | "))
    }
}

/// Zero cells padded beyond the stored elements before a declared shape is
/// treated as corrupt
const MAX_PADDING: usize = 64;

pub struct MatrixLayoutConverter;

impl MatrixLayoutConverter {
    /// Reorient `matrix` into rows.
    ///
    /// When `elements.len() != rows * cols` the missing cells are filled with
    /// `0`, surplus elements are ignored, and a warning is recorded. A
    /// declared shape that overflows or needs more than [`MAX_PADDING`] zero
    /// cells is not trusted: the elements come back as a single column.
    pub fn to_row_major(matrix: &MatrixLiteral, warnings: &mut Warnings) -> RowMajorMatrix {
        let found = matrix.elements.len();
        let Some(expected) = matrix
            .rows
            .checked_mul(matrix.cols)
            .filter(|&size| size <= found.saturating_add(MAX_PADDING))
        else {
            warnings.push(format!(
                "Matrix declared {}x{} does not fit its {} values; emitted as a flat list",
                matrix.rows, matrix.cols, found
            ));
            return RowMajorMatrix {
                rows: found,
                cols: 1,
                cells: matrix.elements.iter().map(|e| vec![e.clone()]).collect(),
            };
        };

        if found != expected {
            warnings.push(format!(
                "Matrix {}x{} has incomplete values: expected {}, found {}",
                matrix.rows,
                matrix.cols,
                expected,
                found
            ));
        }

        let cells = (0..matrix.rows)
            .map(|r| {
                (0..matrix.cols)
                    .map(|c| {
                        // column-major index: column * rows + row
                        matrix
                            .elements
                            .get(c * matrix.rows + r)
                            .cloned()
                            .unwrap_or_else(|| "0".to_string())
                    })
                    .collect()
            })
            .collect();

        RowMajorMatrix {
            rows: matrix.rows,
            cols: matrix.cols,
            cells,
        }
    }

    /// Reorient and render in one step
    pub fn convert(matrix: &MatrixLiteral, warnings: &mut Warnings) -> String {
        if matrix.rows == 0 || matrix.cols == 0 {
            if !matrix.elements.is_empty() {
                warnings.push(format!(
                    "Matrix declared {}x{} but holds {} values; emitted as empty",
                    matrix.rows,
                    matrix.cols,
                    matrix.elements.len()
                ));
            }
            return "[]".to_string();
        }
        Self::to_row_major(matrix, warnings).render()
    }

    /// Vector literal: elements joined with `;`, no row/column distinction
    pub fn vector(elements: &[String]) -> String {
        format!("[{}]", elements.join("; "))
    }
}

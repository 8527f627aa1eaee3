//! Whole-sheet conversion
//!
//! Spreadsheets written for hand calculation follow a loose layout: a text
//! label in one cell, the value or formula to its right, and optionally a
//! unit in the next cell. That layout is what turns anonymous addresses
//! into readable variable names.

use super::cell_translator::{normalize_scientific, CellFormulaTranslator, CellMap};
use super::dependency::DependencyOrderer;
use super::identifier::IdentifierSanitizer;
use super::units::UnitMapper;
use crate::types::{CellReference, FormulaCell, SheetInput, VariableBinding, Warnings};
use std::collections::HashSet;
use tracing::debug;

fn is_number(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok()
}

fn is_text(text: &str) -> bool {
    !text.trim().is_empty() && !is_number(text)
}

/// Cells of one sheet, indexed the ways the conversion needs them
#[derive(Debug, Default)]
struct SheetCells {
    /// Every addressable cell in row-major order
    order: Vec<CellReference>,
    values: CellMap,
    formulas: CellMap,
    labels: CellMap,
    units: CellMap,
}

impl SheetCells {
    fn collect(sheet: &SheetInput, warnings: &mut Warnings) -> Self {
        let mut cells = SheetCells::default();

        for input in &sheet.cells {
            let Some(reference) = CellReference::parse(&input.address) else {
                warnings.push(format!(
                    "Sheet '{}': skipping cell with invalid address '{}'",
                    sheet.name, input.address
                ));
                continue;
            };
            if let Some(value) = input.value.as_ref().filter(|v| !v.trim().is_empty()) {
                cells.values.insert(reference.clone(), value.trim().to_string());
            }
            if let Some(formula) = input.formula.as_ref().filter(|f| !f.trim().is_empty()) {
                cells.formulas.insert(reference.clone(), formula.trim().to_string());
            }
            cells.order.push(reference);
        }

        cells.order.sort_by_key(|r| (r.row, r.column_index()));
        cells.order.dedup();
        cells.discover_labels_and_units();
        cells
    }

    /// Text to the left names a value; a unit token to the right qualifies it
    fn discover_labels_and_units(&mut self) {
        for reference in &self.order {
            let numeric = self.values.get(reference).is_some_and(|v| is_number(v));
            if !numeric && !self.formulas.contains_key(reference) {
                continue;
            }

            if let Some(label) = reference
                .left()
                .and_then(|left| self.values.get(&left))
                .filter(|text| is_text(text))
            {
                self.labels.insert(reference.clone(), label.clone());
            }

            if let Some(unit) = self
                .values
                .get(&reference.right())
                .filter(|text| UnitMapper::is_unit(text))
            {
                self.units.insert(reference.clone(), unit.clone());
            }
        }
    }
}

/// A labelled or unlabelled numeric input
#[derive(Debug, Clone)]
struct Constant {
    binding: VariableBinding,
    value: String,
}

/// A formula cell queued for ordering
#[derive(Debug, Clone)]
struct Calculation {
    cell: FormulaCell,
    labelled: bool,
}

/// Converts one sheet into canonical statements
#[derive(Debug, Clone)]
pub struct SheetConverter {
    sanitizer: IdentifierSanitizer,
    translator: CellFormulaTranslator,
    orderer: DependencyOrderer,
    headings: bool,
}

impl Default for SheetConverter {
    fn default() -> Self {
        Self::new(IdentifierSanitizer::default(), CellFormulaTranslator::default(), true)
    }
}

impl SheetConverter {
    pub fn new(sanitizer: IdentifierSanitizer, translator: CellFormulaTranslator, headings: bool) -> Self {
        Self {
            sanitizer,
            translator,
            orderer: DependencyOrderer::new(),
            headings,
        }
    }

    /// Output lines for `sheet`: labelled constants, then formulas in
    /// dependency order.
    ///
    /// Every value or formula cell gets a name from its label (or its
    /// address); when two cells produce the same name the first one in
    /// row-major order keeps it and the other is skipped.
    pub fn convert(&self, sheet: &SheetInput, warnings: &mut Warnings) -> Vec<String> {
        let cells = SheetCells::collect(sheet, warnings);
        let (constants, calculations) = self.bind(&cells);
        debug!(
            sheet = %sheet.name,
            constants = constants.len(),
            formulas = calculations.len(),
            "bound sheet cells"
        );

        let mut lines = Vec::new();
        if self.headings && !sheet.name.trim().is_empty() {
            lines.push(format!("\"{}", sheet.name.trim()));
        }

        let labelled: Vec<&Constant> = constants
            .iter()
            .filter(|c| c.binding.source_label.is_some())
            .collect();
        if !labelled.is_empty() {
            if self.headings {
                lines.push("\"Input data".to_string());
            }
            for constant in labelled {
                let value = normalize_scientific(&constant.value);
                let unit = constant.binding.unit.as_deref().unwrap_or_default();
                lines.push(format!("{} = {}{}", constant.binding.canonical_name, value, unit));
            }
            lines.push(String::new());
        }

        // Only labelled formulas carry meaning once any exist
        let any_labelled = calculations.iter().any(|c| c.labelled);
        let selected: Vec<FormulaCell> = calculations
            .into_iter()
            .filter(|c| c.labelled || !any_labelled)
            .map(|c| c.cell)
            .collect();

        if !selected.is_empty() {
            if self.headings {
                lines.push("\"Calculations".to_string());
            }
            let (ordered, cycle_warnings) = self.orderer.order(selected);
            warnings.extend(cycle_warnings);
            for formula in ordered {
                let (expression, formula_warnings) = self
                    .translator
                    .translate(&formula.raw_formula, &cells.values, &cells.labels);
                warnings.extend(formula_warnings);
                lines.push(format!("{} = {}", formula.name, expression));
            }
            lines.push(String::new());
        }

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    /// Name every value and formula cell, first occurrence wins
    fn bind(&self, cells: &SheetCells) -> (Vec<Constant>, Vec<Calculation>) {
        let mut seen: HashSet<String> = HashSet::new();
        let mut constants = Vec::new();
        let mut calculations = Vec::new();

        for reference in &cells.order {
            let formula = cells.formulas.get(reference);
            let value = cells.values.get(reference).filter(|v| is_number(v));
            if formula.is_none() && value.is_none() {
                continue;
            }

            let label = cells.labels.get(reference);
            let name = match label {
                Some(label) => self.sanitizer.variable_name(label),
                None => self.sanitizer.variable_name(&reference.key()),
            };
            if !seen.insert(name.clone()) {
                debug!(cell = %reference, name = %name, "duplicate variable name skipped");
                continue;
            }

            match (formula, value) {
                (Some(raw), _) => calculations.push(Calculation {
                    cell: FormulaCell {
                        reference: reference.clone(),
                        name,
                        raw_formula: raw.clone(),
                    },
                    labelled: label.is_some(),
                }),
                (None, Some(value)) => constants.push(Constant {
                    binding: VariableBinding {
                        canonical_name: name,
                        source_label: label.cloned(),
                        unit: cells
                            .units
                            .get(reference)
                            .and_then(|u| UnitMapper::map(u))
                            .map(str::to_string),
                    },
                    value: value.clone(),
                }),
                (None, None) => {}
            }
        }

        (constants, calculations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellInput;
    use pretty_assertions::assert_eq;

    fn value(address: &str, v: &str) -> CellInput {
        CellInput {
            address: address.to_string(),
            value: Some(v.to_string()),
            formula: None,
        }
    }

    fn formula(address: &str, f: &str) -> CellInput {
        CellInput {
            address: address.to_string(),
            value: None,
            formula: Some(f.to_string()),
        }
    }

    fn sheet(cells: Vec<CellInput>) -> SheetInput {
        SheetInput {
            name: "Beam".to_string(),
            cells,
        }
    }

    #[test]
    fn test_constants_then_formulas() {
        let input = sheet(vec![
            value("A1", "Span"),
            value("B1", "6"),
            value("C1", "m"),
            value("A2", "Load"),
            value("B2", "12.5"),
            value("C2", "kN/m"),
            value("A3", "Moment"),
            formula("B3", "B2*B1^2/8"),
        ]);
        let mut warnings = Warnings::new();
        let lines = SheetConverter::default().convert(&input, &mut warnings);
        assert_eq!(
            lines,
            vec![
                "\"Beam",
                "\"Input data",
                "Span = 6m",
                "Load = 12.5",
                "",
                "\"Calculations",
                "Moment = Load*Span^2/8",
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_formula_order_follows_dependencies() {
        let input = sheet(vec![
            value("A1", "Total"),
            formula("B1", "B2+B3"),
            value("A2", "Dead"),
            formula("B2", "2*3"),
            value("A3", "Live"),
            formula("B3", "4"),
        ]);
        let mut warnings = Warnings::new();
        let lines = SheetConverter::new(
            IdentifierSanitizer::default(),
            CellFormulaTranslator::default(),
            false,
        )
        .convert(&input, &mut warnings);
        assert_eq!(lines, vec!["Dead = 2*3", "Live = 4", "Total = Dead+Live"]);
    }

    #[test]
    fn test_unlabelled_formulas_emitted_when_no_labels() {
        let input = sheet(vec![formula("A1", "B1+1"), formula("B1", "A1+1")]);
        let mut warnings = Warnings::new();
        let lines = SheetConverter::default().convert(&input, &mut warnings);
        assert_eq!(lines, vec!["\"Beam", "\"Calculations", "B1 = A1+1", "A1 = B1+1"]);
        // one cycle warning plus the two unresolved references
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_unlabelled_formula_hidden_when_labels_exist() {
        let input = sheet(vec![
            value("A1", "Area"),
            formula("B1", "C5*2"),
            formula("D4", "C5*3"),
            value("C5", "10"),
        ]);
        let mut warnings = Warnings::new();
        let lines = SheetConverter::default().convert(&input, &mut warnings);
        assert_eq!(lines, vec!["\"Beam", "\"Calculations", "Area = 10*2"]);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let input = sheet(vec![
            value("A1", "h"),
            value("B1", "0.5"),
            value("A2", "h"),
            value("B2", "0.7"),
        ]);
        let mut warnings = Warnings::new();
        let lines = SheetConverter::default().convert(&input, &mut warnings);
        assert_eq!(lines, vec!["\"Beam", "\"Input data", "h = 0.5"]);
    }

    #[test]
    fn test_scientific_constant_and_invalid_address() {
        let input = sheet(vec![
            value("A1", "Modulus"),
            value("B1", "2.1E5"),
            value("C1", "MPa"),
            value("1A", "junk"),
        ]);
        let mut warnings = Warnings::new();
        let lines = SheetConverter::default().convert(&input, &mut warnings);
        assert_eq!(lines, vec!["\"Beam", "\"Input data", "Modulus = 210000MPa"]);
        assert_eq!(warnings.len(), 1);
    }
}

//! Unit token mapping
//!
//! Source documents spell units the way their authors typed them (`kg/cm²`,
//! `t-m`, `tonf`). The canonical syntax needs a fixed spelling it can attach
//! directly to a number (`25cm`, `3.5kN*m`).

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Source spelling → canonical unit token. Lookups ignore case.
const UNIT_TABLE: &[(&str, &str)] = &[
    // Length
    ("m", "m"),
    ("cm", "cm"),
    ("mm", "mm"),
    ("km", "km"),
    ("in", "in"),
    ("ft", "ft"),
    ("yd", "yd"),
    // Area
    ("m2", "m^2"),
    ("m²", "m^2"),
    ("cm2", "cm^2"),
    ("cm²", "cm^2"),
    ("mm2", "mm^2"),
    ("mm²", "mm^2"),
    // Volume / section modulus
    ("m3", "m^3"),
    ("m³", "m^3"),
    ("cm3", "cm^3"),
    ("cm³", "cm^3"),
    ("mm3", "mm^3"),
    ("mm³", "mm^3"),
    // Second moment of area
    ("m4", "m^4"),
    ("cm4", "cm^4"),
    ("mm4", "mm^4"),
    // Mass
    ("kg", "kg"),
    ("g", "g"),
    ("t", "t"),
    ("ton", "t"),
    // Force
    ("N", "N"),
    ("kN", "kN"),
    ("MN", "MN"),
    ("kgf", "kgf"),
    ("tonf", "tf"),
    ("tf", "tf"),
    // Pressure
    ("Pa", "Pa"),
    ("kPa", "kPa"),
    ("MPa", "MPa"),
    ("GPa", "GPa"),
    ("kg/cm2", "kgf/cm^2"),
    ("kg/cm²", "kgf/cm^2"),
    ("t/m2", "tf/m^2"),
    ("t/m²", "tf/m^2"),
    // Moment
    ("N·m", "N*m"),
    ("kN·m", "kN*m"),
    ("kN-m", "kN*m"),
    ("kg·m", "kgf*m"),
    ("t·m", "tf*m"),
    ("t-m", "tf*m"),
    // Time
    ("s", "s"),
    ("min", "min"),
    ("h", "h"),
    // Angle
    ("rad", "rad"),
    ("deg", "°"),
    ("°", "°"),
];

/// Tokens recognised as "a unit cell" when scanning spreadsheet rows, even
/// when the canonical syntax has no mapping for them
const RECOGNISED_ONLY: &[&str] = &[
    "N/m", "kN/m", "N/m2", "kN/m2", "kg-cm", "tonf-m", "seg", "ksi", "psi", "u", "OK", "SISM",
    "COMP",
];

static UNIT_MAP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    UNIT_TABLE
        .iter()
        .map(|(from, to)| (from.to_lowercase(), *to))
        .collect()
});

/// Case-insensitive unit lookup over a fixed table
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitMapper;

impl UnitMapper {
    /// Canonical token for `unit`, or `None` when the table has no entry
    pub fn map(unit: &str) -> Option<&'static str> {
        let key = unit.trim();
        if key.is_empty() {
            return None;
        }
        UNIT_MAP.get(&key.to_lowercase()).copied()
    }

    /// Canonical token for `unit`, or the trimmed input unchanged
    pub fn map_or_passthrough(unit: &str) -> String {
        Self::map(unit)
            .map(str::to_string)
            .unwrap_or_else(|| unit.trim().to_string())
    }

    /// Whether a cell holding exactly `text` should be read as a unit label
    pub fn is_unit(text: &str) -> bool {
        let key = text.trim();
        !key.is_empty()
            && (Self::map(key).is_some()
                || RECOGNISED_ONLY.iter().any(|u| u.eq_ignore_ascii_case(key)))
    }

    /// Split an operand such as `25 cm` or `3.5kN` into value and mapped
    /// unit. Returns `None` unless the numeric prefix is followed by a known
    /// unit.
    pub fn split_quantity(text: &str) -> Option<(String, &'static str)> {
        let text = text.trim();
        let end = text
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map(|(i, _)| i)?;
        if end == 0 {
            return None;
        }
        let (number, unit) = text.split_at(end);
        let unit = Self::map(unit)?;
        Some((number.to_string(), unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_known_units() {
        assert_eq!(UnitMapper::map("cm"), Some("cm"));
        assert_eq!(UnitMapper::map("m²"), Some("m^2"));
        assert_eq!(UnitMapper::map("tonf"), Some("tf"));
        assert_eq!(UnitMapper::map("kg/cm2"), Some("kgf/cm^2"));
        assert_eq!(UnitMapper::map("deg"), Some("°"));
    }

    #[test]
    fn test_map_ignores_case_and_whitespace() {
        assert_eq!(UnitMapper::map("KN"), Some("kN"));
        assert_eq!(UnitMapper::map(" mpa "), Some("MPa"));
        assert_eq!(UnitMapper::map("T-M"), Some("tf*m"));
    }

    #[test]
    fn test_unknown_units() {
        assert_eq!(UnitMapper::map("furlong"), None);
        assert_eq!(UnitMapper::map(""), None);
        assert_eq!(UnitMapper::map_or_passthrough("furlong"), "furlong");
        assert_eq!(UnitMapper::map_or_passthrough("mm2"), "mm^2");
    }

    #[test]
    fn test_is_unit() {
        assert!(UnitMapper::is_unit("kN"));
        assert!(UnitMapper::is_unit("psi"));
        assert!(UnitMapper::is_unit("ok"));
        assert!(!UnitMapper::is_unit("Beam width"));
        assert!(!UnitMapper::is_unit(" "));
    }

    #[test]
    fn test_split_quantity() {
        assert_eq!(
            UnitMapper::split_quantity("25 cm"),
            Some(("25".to_string(), "cm"))
        );
        assert_eq!(
            UnitMapper::split_quantity("3.5kN"),
            Some(("3.5".to_string(), "kN"))
        );
        assert_eq!(UnitMapper::split_quantity("25"), None);
        assert_eq!(UnitMapper::split_quantity("x2"), None);
        assert_eq!(UnitMapper::split_quantity("4 apples"), None);
    }
}

//! Serializes evaluator output to the output text format: one cell per
//! line, `name = value`, sorted by column letter then row number.
//!
//! Sort-then-print, using `CellName::sort_key` as the `Ord` key rather
//! than comparing rendered strings.

use std::fmt::Write as _;

use cellengine_common::CellName;

/// Renders `values` (as returned by an evaluator's `get_current_values`)
/// into the canonical sorted text form, one `name = value` line per cell,
/// newline-terminated.
pub fn write(mut values: Vec<(CellName, i32)>) -> String {
    values.sort_by_key(|(name, _)| name.sort_key());
    let mut out = String::with_capacity(values.len() * 8);
    for (name, value) in values {
        let _ = writeln!(out, "{name} = {value}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> CellName {
        s.parse().unwrap()
    }

    #[test]
    fn sorts_by_column_then_row() {
        let rendered = write(vec![(name("B1"), 2), (name("A10"), 10), (name("A2"), 3)]);
        assert_eq!(rendered, "A2 = 3\nA10 = 10\nB1 = 2\n");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(write(vec![]), "");
    }

    #[test]
    fn negative_values_render_with_sign() {
        let rendered = write(vec![(name("A0"), -5)]);
        assert_eq!(rendered, "A0 = -5\n");
    }
}

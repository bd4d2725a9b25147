//! Parses an edit stream: one formula change per line, same grammar as a
//! cell definition line. Nothing upstream of this crate drives more than
//! a single bulk evaluation, but the domain's own framing ("given a
//! stream of formula edits, keep values consistent") needs some textual
//! shape for that stream, so this gives the CLI one.
//!
//! Unlike [`crate::parser::parse`], names here resolve against an
//! already-built [`IdentTable`] rather than interning new ones: an edit
//! naming a cell, or referencing one, that the initial input never
//! defined is a caller error, not a new cell.

use cellengine_common::{Addend, CellId, CellName, EngineError, Formula};
use cellengine_core::IdentTable;

pub fn parse_edits(text: &str, table: &IdentTable) -> Result<Vec<(CellId, Formula)>, EngineError> {
    let mut edits = Vec::new();

    for (line_no, raw_line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('=').collect();
        if parts.len() != 2 {
            return Err(EngineError::MissingEquals { line: line_no });
        }

        let name: CellName = parts[0]
            .trim()
            .parse()
            .map_err(|_| EngineError::MalformedName(parts[0].trim().to_string()))?;
        let id = table.get(&name).ok_or_else(|| EngineError::UnknownCell(name.to_string()))?;

        let mut addends = Vec::with_capacity(2);
        for token in parts[1].split('+') {
            addends.push(parse_addend(token, line_no, table)?);
        }
        edits.push((id, Formula::new(addends)));
    }

    Ok(edits)
}

fn parse_addend(token: &str, line_no: usize, table: &IdentTable) -> Result<Addend, EngineError> {
    let token = token.trim();
    if let Ok(name) = token.parse::<CellName>() {
        let id = table.get(&name).ok_or_else(|| EngineError::UnknownCell(name.to_string()))?;
        return Ok(Addend::Ref(id));
    }
    if let Ok(value) = token.parse::<i32>() {
        return Ok(Addend::Literal(value));
    }
    Err(EngineError::InvalidAddend { line: line_no, addend: token.to_string() })
}

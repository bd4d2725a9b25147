//! Parses the input text format: one cell per line, `name = addend (+ addend)*`.
//!
//! Split-then-validate per line (split on a delimiter, trim each token,
//! validate) with each token resolved straight to a `CellId`, during
//! parsing, via an `IdentTable` shared across the whole file so a name's
//! id is fixed the first time it is seen, whether that's as a definition
//! or as a reference inside an earlier cell's formula.

use cellengine_common::{Addend, CellId, CellName, EngineError, Formula};
use cellengine_core::IdentTable;

/// Parses `text` into `(name, formula)` records ordered by `CellId`
/// (first-seen order), ready to hand to an evaluator's `initial_calculate`,
/// plus the name table built along the way so a later edit stream can
/// resolve names against the same ids.
pub fn parse(text: &str) -> Result<(Vec<(CellName, Formula)>, IdentTable), EngineError> {
    let mut table = IdentTable::new();
    let mut formulas: Vec<Option<Formula>> = Vec::new();

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
        let id = table.intern(name);

        if formulas.len() > id.index() && formulas[id.index()].is_some() {
            return Err(EngineError::DuplicateCell(table.name(id).to_string()));
        }

        let mut addends = Vec::with_capacity(2);
        for token in parts[1].split('+') {
            addends.push(parse_addend(token, line_no, &mut table)?);
        }

        while formulas.len() <= id.index() {
            formulas.push(None);
        }
        formulas[id.index()] = Some(Formula::new(addends));
    }

    let mut result = Vec::with_capacity(table.len());
    for idx in 0..table.len() {
        let id = CellId(idx as u32);
        let name = table.name(id).clone();
        let formula = formulas
            .get(idx)
            .cloned()
            .flatten()
            .ok_or_else(|| EngineError::UnknownCell(name.to_string()))?;
        result.push((name, formula));
    }
    Ok((result, table))
}

fn parse_addend(token: &str, line_no: usize, table: &mut IdentTable) -> Result<Addend, EngineError> {
    let token = token.trim();
    if let Ok(name) = token.parse::<CellName>() {
        return Ok(Addend::Ref(table.intern(name)));
    }
    if let Ok(value) = token.parse::<i32>() {
        return Ok(Addend::Literal(value));
    }
    Err(EngineError::InvalidAddend { line: line_no, addend: token.to_string() })
}

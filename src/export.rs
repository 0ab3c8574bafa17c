//src/export.rs
use crate::sync::{AppState, SheetId};
use anyhow::{Context, Result};
use std::io::Write;

/// Writes every row of both sheets as CSV, sheet A first.
pub fn write_csv<W: Write>(state: &AppState, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["sheet", "group", "order", "exercise", "kg", "sets", "reps", "obs"])?;

    for which in [SheetId::A, SheetId::B] {
        let sheet = state.sheet(which);
        for (_, block, rows) in sheet.blocks() {
            for row in rows {
                wtr.write_record([
                    which.to_string().as_str(),
                    block.name,
                    row.order.as_str(),
                    row.exercise.as_str(),
                    row.kg.as_str(),
                    row.sets.as_str(),
                    row.reps.as_str(),
                    row.obs.as_str(),
                ])
                .with_context(|| format!("Failed to write row {} of sheet {}", row.order, which))?;
            }
        }
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

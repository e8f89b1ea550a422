use anyhow::{Context, Result};
use pulse::v1::session::{self, RestoreReport, UiSessionState};
use std::path::PathBuf;

pub fn run(input: PathBuf) -> Result<()> {
    let content =
        std::fs::read_to_string(&input).with_context(|| format!("Failed to read {:?}", input))?;
    validate_content(&content)
}

fn validate_content(content: &str) -> Result<()> {
    match session::deserialize_with_report(content) {
        Ok((state, report)) => {
            for line in describe(&state, &report) {
                println!("{}", line);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Invalid: {}", e)),
    }
}

fn describe(state: &UiSessionState, report: &RestoreReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Valid: {} items (version {})",
        state.items.len(),
        report.version
    )];

    if report.dropped_items > 0 {
        lines.push(format!("  dropped {} invalid item(s)", report.dropped_items));
    }
    for id in &report.duplicate_ids {
        lines.push(format!("  dropped duplicate id {}", id));
    }
    if report.selection_repaired {
        lines.push(format!("  selection repaired to {}", state.selected_item_id));
    }
    if report.address_repaired {
        lines.push(format!("  address repaired to {}", state.address));
    }
    lines
}

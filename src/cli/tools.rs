use anyhow::Result;

use crate::tools::{Surface, calendar, drive, gmail, tasks};

/// Print the tool declarations for a surface as pretty JSON. Handy for
/// orchestrator bootstrap and debugging schema changes.
pub fn run(surface: Surface) -> Result<()> {
    let specs = match surface {
        Surface::Gmail => gmail::declarations(),
        Surface::Calendar => calendar::declarations(),
        Surface::Drive => drive::declarations(),
        Surface::Tasks => tasks::declarations(),
    };
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

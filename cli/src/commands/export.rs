use std::path::PathBuf;

use anyhow::{Context, Result};

use glucolog_core::service::TrackerService;

/// Write the clinician CSV report to a file, or to stdout when no
/// output path is given.
pub(crate) fn cmd_export(
    svc: &TrackerService,
    owner: i64,
    output: Option<PathBuf>,
) -> Result<()> {
    let report = svc.build_clinician_report(owner)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            let rows = report.lines().count().saturating_sub(1);
            eprintln!("Wrote {rows} entries to {}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

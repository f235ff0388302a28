//! Removal of sidecars left over from earlier exports.

use std::collections::HashSet;

use scenepack_store::{SidecarStore, name};

use crate::encode::SIDECAR_EXTENSION;
use crate::error::PackError;
use crate::report::ExportReport;

/// Delete every geometry sidecar in `store` that `report` did not write.
///
/// Files without the sidecar extension are never touched. Returns the
/// removed names, sorted.
pub async fn clean_stale_sidecars<S>(store: &S, report: &ExportReport) -> Result<Vec<String>, PackError>
where
    S: SidecarStore + ?Sized,
{
    let written: HashSet<&str> = report.written_files().collect();
    let mut removed = Vec::new();

    for file_name in store.list().await? {
        if !name::has_extension(&file_name, SIDECAR_EXTENSION) || written.contains(file_name.as_str()) {
            continue;
        }
        store.remove(&file_name).await?;
        log::debug!("Removed stale sidecar {}", store.location(&file_name));
        removed.push(file_name);
    }

    if !removed.is_empty() {
        log::info!("Removed {} stale sidecar(s)", removed.len());
    }
    Ok(removed)
}

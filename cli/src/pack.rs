//! `scenepack pack`

use std::process::ExitCode;

use scenepack_core::{GeometryPacker, NoRuntimeScene, SceneDocument, clean_stale_sidecars};
use scenepack_store::DirectoryStore;

use crate::args::PackArgs;
use crate::config;

pub async fn run(args: PackArgs) -> Result<ExitCode, String> {
    let config = config::load_or_default(&args.config)?;
    let export = config.export;

    let output_dir = args.output_dir.unwrap_or(export.output_dir.clone());
    let mut options = export.pack_options();
    if let Some(prefix) = args.path_prefix {
        options.path_prefix = prefix;
    }
    if let Some(jobs) = args.jobs {
        options.max_concurrent_writes = jobs;
    }
    options.is_final_export |= args.final_export;
    options.compute_missing_bounds |= args.compute_bounds;
    let clean = args.clean || export.clean_stale;

    let text = tokio::fs::read_to_string(&args.scene)
        .await
        .map_err(|e| format!("failed to read {}: {e}", args.scene.display()))?;
    let mut document = SceneDocument::from_json(&text)
        .map_err(|e| format!("failed to parse {}: {e}", args.scene.display()))?;

    log::info!(
        "Packing {} into {}",
        args.scene.display(),
        output_dir.display()
    );
    let packer = GeometryPacker::new(DirectoryStore::new(&output_dir), options);
    let report = packer
        .pack(&mut document, &NoRuntimeScene)
        .await
        .map_err(|e| format!("{}: {e}", args.scene.display()))?;

    let scene_out = args.scene_out.unwrap_or(args.scene);
    let json = document.to_json_pretty().map_err(|e| e.to_string())?;
    tokio::fs::write(&scene_out, json)
        .await
        .map_err(|e| format!("failed to write {}: {e}", scene_out.display()))?;

    for written in &report.written {
        println!("wrote   {} ({} bytes)", written.location, written.byte_len);
    }
    for failure in &report.failed {
        log::error!(
            "Geometry '{}' (meshes: {}) not packed: {}",
            failure.geometry_id,
            failure.mesh_ids.join(", "),
            failure.error
        );
        println!("failed  {}", failure.geometry_id);
    }
    for skipped in &report.skipped {
        log::debug!("Skipped mesh '{}': {}", skipped.mesh, skipped.reason);
    }

    if clean {
        let removed = clean_stale_sidecars(packer.store(), &report)
            .await
            .map_err(|e| format!("failed to clean {}: {e}", output_dir.display()))?;
        for file_name in removed {
            println!("removed {}", output_dir.join(file_name).display());
        }
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

//! `scenepack inspect`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use scenepack_core::{BinaryInfo, DecodedGeometry, SceneDocument, decode_geometry, mesh_label};
use scenepack_store::{DirectoryStore, SidecarStore};
use serde::Deserialize;
use serde_json::Value;

use crate::args::InspectArgs;
use crate::config::{self, Config};

pub async fn run(args: InspectArgs) -> Result<ExitCode, String> {
    let text = tokio::fs::read_to_string(&args.scene)
        .await
        .map_err(|e| format!("failed to read {}: {e}", args.scene.display()))?;
    let document = SceneDocument::from_json(&text)
        .map_err(|e| format!("failed to parse {}: {e}", args.scene.display()))?;

    let config = config::load_or_default(&args.config)?;
    let dir = sidecar_dir(args.dir, &config);
    log::debug!("Reading sidecars from {}", dir.display());
    let store = DirectoryStore::new(dir);

    let meshes = document.meshes().map_err(|e| e.to_string())?;
    let mut failures = 0usize;
    let mut packed = 0usize;

    for (index, mesh) in meshes.iter().enumerate() {
        let Some(delay_loading_file) = mesh.get("delayLoadingFile").and_then(Value::as_str) else {
            continue;
        };
        packed += 1;
        let label = mesh_label(mesh, index);
        match inspect_mesh(&store, mesh, delay_loading_file).await {
            Ok((file_name, decoded)) => println!("{label}: {file_name} {}", summary(&decoded)),
            Err(e) => {
                failures += 1;
                log::error!("Mesh '{label}': {e}");
                println!("{label}: error");
            }
        }
    }

    log::info!("Inspected {packed} packed mesh(es), {failures} failed");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

async fn inspect_mesh(
    store: &DirectoryStore,
    mesh: &Value,
    delay_loading_file: &str,
) -> Result<(String, DecodedGeometry), String> {
    // The reference may carry a path prefix; sidecars are stored flat.
    let file_name = Path::new(delay_loading_file)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("bad delayLoadingFile '{delay_loading_file}'"))?
        .to_owned();

    let info: BinaryInfo = mesh
        .get("_binaryInfo")
        .map(|value| BinaryInfo::deserialize(value))
        .transpose()
        .map_err(|e| format!("bad _binaryInfo: {e}"))?
        .ok_or("missing _binaryInfo")?;

    let bytes = store
        .read(&file_name)
        .await
        .map_err(|e| format!("{}: {e}", store.location(&file_name)))?;
    let decoded = decode_geometry(&bytes, &info).map_err(|e| format!("{file_name}: {e}"))?;
    Ok((file_name, decoded))
}

/// `--dir` if given, else the directory `pack` writes to.
fn sidecar_dir(dir: Option<PathBuf>, config: &Config) -> PathBuf {
    dir.unwrap_or_else(|| config.export.output_dir.clone())
}

fn summary(decoded: &DecodedGeometry) -> String {
    let vertices = decoded.positions.as_ref().map_or(0, |p| p.len() / 3);
    let indices = decoded.indices.as_ref().map_or(0, Vec::len);
    let sub_meshes = decoded.sub_meshes.as_ref().map_or(0, Vec::len);
    let mut parts = vec![
        format!("{vertices} vertices"),
        format!("{indices} indices"),
        format!("{sub_meshes} submeshes"),
    ];
    if decoded.matrices_indices.is_some() {
        parts.push("skinned".to_owned());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sidecar_dir_follows_pack_output() {
        let config = Config::default();
        assert_eq!(sidecar_dir(None, &config), PathBuf::from("geometries"));
        assert_eq!(
            sidecar_dir(Some(PathBuf::from("out")), &config),
            PathBuf::from("out")
        );

        let mut config = Config::default();
        config.export.output_dir = PathBuf::from("public/geo");
        assert_eq!(sidecar_dir(None, &config), PathBuf::from("public/geo"));
    }

    #[test]
    fn summary_counts() {
        let decoded = DecodedGeometry {
            positions: Some(vec![0.0; 9]),
            indices: Some(vec![0, 1, 2]),
            ..Default::default()
        };
        assert_eq!(summary(&decoded), "3 vertices, 3 indices, 0 submeshes");
    }

    #[tokio::test]
    async fn missing_sidecar_is_reported() {
        let store = DirectoryStore::new(std::env::temp_dir().join("scenepack_cli_test_inspect"));
        let mesh = json!({ "_binaryInfo": {} });
        let err = inspect_mesh(&store, &mesh, "scene/g0.babylonbinarymeshdata")
            .await
            .unwrap_err();
        assert!(err.contains("g0.babylonbinarymeshdata"));
    }
}

//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Incremental geometry packer for serialized scene documents.
#[derive(Parser, Debug)]
#[command(
    name = "scenepack",
    version,
    about = "Move scene geometry into lazily loaded binary sidecars",
    long_about = "Packs the geometry of every mesh in a serialized scene into one \
                  <geometryId>.babylonbinarymeshdata file per geometry and rewrites \
                  the scene to load it on demand.\n\n\
                  Set RUST_LOG to control log output (default: info)."
)]
pub struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack mesh geometry into sidecar files.
    Pack(PackArgs),
    /// Decode the sidecars referenced by a packed scene and print their contents.
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
pub struct PackArgs {
    /// Scene document (JSON).
    pub scene: PathBuf,

    /// Directory that receives the sidecars.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Where to write the rewritten scene. Defaults to overwriting SCENE.
    #[arg(long)]
    pub scene_out: Option<PathBuf>,

    /// Prefix for `delayLoadingFile` references.
    #[arg(long)]
    pub path_prefix: Option<String>,

    /// Final export: meshes flagged `keepGeometryInline` are left untouched.
    #[arg(long = "final")]
    pub final_export: bool,

    /// Maximum number of sidecar writes in flight.
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Compute bounding boxes from positions.
    #[arg(long)]
    pub compute_bounds: bool,

    /// Remove sidecars in the output directory that this export did not write.
    #[arg(long)]
    pub clean: bool,

    /// Configuration file.
    #[arg(short, long, default_value = "scenepack.toml")]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Packed scene document (JSON).
    pub scene: PathBuf,

    /// Directory holding the sidecars. Defaults to `output_dir` from the
    /// config, the same directory `pack` writes to.
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Configuration file.
    #[arg(short, long, default_value = "scenepack.toml")]
    pub config: PathBuf,
}

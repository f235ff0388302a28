//! # scenepack
//!
//! Command line front end for the incremental geometry packer.
//!
//! ```text
//! scenepack pack scene.babylon -o public/scene/geometries --path-prefix scene/ --final
//! scenepack inspect scene.babylon -d public/scene/geometries
//! ```

mod args;
mod config;
mod inspect;
mod pack;

use std::process::ExitCode;

use clap::Parser;

use crate::args::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Pack(args) => pack::run(args).await,
            Command::Inspect(args) => inspect::run(args).await,
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

//! atom-export - Atom engine model export tool
//!
//! Converts scene object snapshots (mesh + optional armature) to .m3d models

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

// Use modules from library
use atom_export::{convert_object, export_object, read_m3d, ExportManifest, SceneFile, SceneSource};

#[derive(Parser)]
#[command(name = "atom-export")]
#[command(about = "Atom engine model export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one scene object to <output>/<object>.m3d
    Export {
        /// Scene snapshot (JSON)
        scene: PathBuf,

        /// Name of the object to export
        #[arg(short = 'n', long)]
        object: String,

        /// Destination directory (default: <base_dir>/<mesh_dir> from settings)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Settings file (default: ./atom.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run the export pipeline without writing anything
    Check {
        /// Scene snapshot (JSON)
        scene: PathBuf,

        /// Object to check (default: every object in the scene)
        #[arg(short = 'n', long)]
        object: Option<String>,

        /// Settings file (default: ./atom.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a summary of an exported .m3d model
    Inspect {
        /// Input .m3d file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            scene,
            object,
            output,
            config,
        } => {
            let manifest = ExportManifest::load_or_default(config.as_deref())?;
            let scene = SceneFile::load(&scene)?;
            let dest_dir = output.unwrap_or_else(|| manifest.mesh_dir());
            tracing::info!("Exporting '{}' -> {:?}", object, dest_dir);

            match export_object(&scene, &object, &dest_dir, &manifest.export) {
                Ok(summary) => {
                    let (_, message) = summary.status();
                    tracing::info!("{}: {:?}", message, summary.path);
                }
                Err(err) => {
                    let (_, message) = err.status();
                    tracing::error!("{}", message);
                    return Err(err).with_context(|| format!("Failed to export '{}'", object));
                }
            }
        }

        Commands::Check {
            scene,
            object,
            config,
        } => {
            let manifest = ExportManifest::load_or_default(config.as_deref())?;
            let scene = SceneFile::load(&scene)?;
            let names: Vec<String> = match object {
                Some(name) => vec![name],
                None => scene.object_names().map(str::to_string).collect(),
            };

            for name in &names {
                let snapshot = scene.snapshot(name)?;
                let document = convert_object(&snapshot, &manifest.export)
                    .with_context(|| format!("Object '{}' would not export", name))?;
                tracing::info!(
                    "'{}' is valid: {} vertices, {} triangles, {} bones",
                    name,
                    snapshot.mesh.vertex_count(),
                    snapshot.mesh.face_count(),
                    document.skeleton().map_or(0, |s| s.bones.len())
                );
            }
            tracing::info!("{} object(s) checked", names.len());
        }

        Commands::Inspect { input } => {
            let file =
                File::open(&input).with_context(|| format!("Failed to open model: {:?}", input))?;
            let document = read_m3d(BufReader::new(file))
                .with_context(|| format!("Invalid model: {:?}", input))?;

            tracing::info!("Model {:?}:", input);
            for (name, array) in document.arrays().iter() {
                tracing::info!("  {}: {} x {}", name, array.len(), array.type_name());
            }
            if let Some(skeleton) = document.skeleton() {
                let mut bones: Vec<_> = skeleton.bones.iter().collect();
                bones.sort_by_key(|(_, b)| b.index);
                for (name, bone) in bones {
                    tracing::info!("  bone [{}] '{}' parent={:?}", bone.index, name, bone.parent);
                }
            }
        }
    }

    Ok(())
}

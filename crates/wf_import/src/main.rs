use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use wf_import::{load_scene, utils, DirectorySink, ImportMeta};

// Cli arguments
#[derive(StructOpt, Debug)]
#[structopt(name = "wf_import")]
struct CliArgs {
    /// The `.obj` file to import
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// Output directory; meshes are placed in a sub folder named after the input file
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: PathBuf,
    /// Material library to use instead of the one referenced by the `.obj` file
    #[structopt(long = "mtl", parse(from_os_str))]
    mtl: Option<PathBuf>,
    /// Output debug info
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

/// Happens during setup
#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Input file does not exist: {0}")]
    InputFileNonExistant(String),
    #[error("Material library does not exist: {0}")]
    MaterialLibraryNonExistant(String),
}

fn main() -> Result<()> {
    let args = CliArgs::from_args();

    if !args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    } else {
        env_logger::Builder::new()
            .filter(None, log::LevelFilter::Debug)
            .init();
    }

    prepare(args)
}

fn prepare(args: CliArgs) -> Result<()> {
    let input_path = args.input.as_path();
    if !input_path.is_file() {
        return Err(CliError::InputFileNonExistant(input_path.display().to_string()).into());
    }

    if let Some(mtl) = &args.mtl {
        if !mtl.is_file() {
            return Err(CliError::MaterialLibraryNonExistant(mtl.display().to_string()).into());
        }
    }

    let meta = ImportMeta::locate(input_path)?;
    let scene = load_scene(input_path, args.mtl.as_deref(), &meta)?;

    let output: &Path = &args.output;
    let mut sink = DirectorySink::new(output.join(utils::file_name(input_path)?))?;
    scene.export(&mut sink)?;

    info!(
        "Imported {} into {} meshes ({} warnings)",
        input_path.display(),
        scene.entries.len(),
        scene.warnings.len()
    );
    Ok(())
}

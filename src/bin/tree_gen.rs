//! Headless tree generation and OBJ export.
//!
//! Usage:
//!     tree-gen [OPTIONS] <OUTPUT_DIR>
//!
//! Options:
//!     -c, --config <FILE>     JSON tree config (default: built-in binary tree)
//!     -n, --name <STEM>       Output file stem (default: tree)
//!     --seed <SEED>           Seed the RNG for a reproducible tree
//!     -t, --texture <FILE>    Copy this image beside the .mtl as its diffuse map
//!     --print-codes           Print the expanded instruction string
//!     --print-config          Print the effective config as JSON and exit
//!     -h, --help              Show this help message

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use symbios_tree::{MaterialDocument, PcgRandom, TreeConfig, TreeGenerator, copy_texture};

fn print_help() {
    eprintln!("tree-gen - L-System tree generator");
    eprintln!();
    eprintln!("Usage: tree-gen [OPTIONS] <OUTPUT_DIR>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <FILE>     JSON tree config (default: built-in binary tree)");
    eprintln!("    -n, --name <STEM>       Output file stem (default: tree)");
    eprintln!("    --seed <SEED>           Seed the RNG for a reproducible tree");
    eprintln!("    -t, --texture <FILE>    Copy this image beside the .mtl as its diffuse map");
    eprintln!("    --print-codes           Print the expanded instruction string");
    eprintln!("    --print-config          Print the effective config as JSON and exit");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    tree-gen -c oak.json --seed 42 ./out");
}

#[derive(Debug)]
struct Args {
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    name: String,
    seed: Option<u64>,
    texture: Option<PathBuf>,
    print_codes: bool,
    print_config: bool,
}

fn parse_args() -> Result<Option<Args>, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut parsed = Args {
        output_dir: None,
        config: None,
        name: "tree".to_string(),
        seed: None,
        texture: None,
        print_codes: false,
        print_config: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "-c" | "--config" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --config")?;
                parsed.config = Some(PathBuf::from(value));
            }
            "-n" | "--name" => {
                i += 1;
                parsed.name = args.get(i).ok_or("Missing value for --name")?.clone();
            }
            "--seed" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --seed")?;
                parsed.seed = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid seed: {value}"))?,
                );
            }
            "-t" | "--texture" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --texture")?;
                parsed.texture = Some(PathBuf::from(value));
            }
            "--print-codes" => parsed.print_codes = true,
            "--print-config" => parsed.print_config = true,
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {other}"));
            }
            other => {
                if parsed.output_dir.is_some() {
                    return Err(format!("Unexpected argument: {other}"));
                }
                parsed.output_dir = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    if parsed.output_dir.is_none() && !parsed.print_config {
        return Err("Missing output directory".to_string());
    }
    Ok(Some(parsed))
}

fn run(args: Args) -> Result<(), symbios_tree::TreeError> {
    let config = match &args.config {
        Some(path) => TreeConfig::load(path)?,
        None => TreeConfig::default(),
    };

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut rng = match args.seed {
        Some(seed) => PcgRandom::seeded(seed),
        None => PcgRandom::from_entropy(),
    };
    let generator = TreeGenerator::new(config, &mut rng)?;

    if args.print_codes {
        println!("{}", generator.codes());
    }
    if generator.is_empty() {
        log::warn!("empty instruction string; writing an empty model");
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
        let paths = generator.export_to_dir(dir, &args.name)?;
        if let Some(texture) = &args.texture {
            copy_texture(texture, dir, &MaterialDocument::default())?;
        }
        println!("{}", paths.obj.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

use std::path::PathBuf;

use anyhow::{bail, Context};
use mapkit::{init_logging, replay, EditorConfig, Gesture, Scene};

const USAGE: &str = "usage: mapkit <scene.json> <gestures.json> [--config <editor.toml>]";

struct Args {
    scene: PathBuf,
    gestures: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().context(USAGE)?)),
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let [scene, gestures]: [PathBuf; 2] = match positional.try_into() {
        Ok(paths) => paths,
        Err(_) => bail!(USAGE),
    };
    Ok(Args {
        scene,
        gestures,
        config,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let scene: Scene = serde_json::from_str(
        &std::fs::read_to_string(&args.scene)
            .with_context(|| format!("reading {}", args.scene.display()))?,
    )?;
    let gestures: Vec<Gesture> = serde_json::from_str(
        &std::fs::read_to_string(&args.gestures)
            .with_context(|| format!("reading {}", args.gestures.display()))?,
    )?;

    tracing::info!(
        version = mapkit::VERSION,
        build_date = mapkit::BUILD_DATE,
        gestures = gestures.len(),
        "Replaying gestures"
    );
    let outcome = replay(scene, &gestures, &config).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

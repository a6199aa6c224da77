mod cli;
mod logger;

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use prisme_json::{serde_json, serialize_segments, JsonDes};
use prisme_shapes::SceneFile;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logger::init_logger(args.log_level.into());

    let json: serde_json::Value = serde_json::from_reader(BufReader::new(
        File::open(&args.scene)
            .with_context(|| format!("failed to open {}", args.scene.display()))?,
    ))
    .context("invalid JSON")?;

    let mut file = SceneFile::from_json(&json).context("invalid scene file")?;

    if let Some(budget) = args.ray_budget {
        file.config.ray_budget = budget;
    }
    if let Some(seed) = args.seed {
        file.settings.seed = seed;
    }
    if let Some(distance) = args.extension_distance {
        file.config.extension_distance = distance;
    }

    info!(
        "loaded {} objects and {} rays from {}",
        file.objects.len(),
        file.rays.len(),
        args.scene.display()
    );

    let (mut scene, mut simulator) = file.into_simulation()?;
    let segments = serialize_segments(simulator.run(&mut scene));

    if let Some(error) = &scene.error {
        anyhow::bail!("simulation failed: {error}");
    }
    if scene.warning.is_some() {
        warn!("the traced segments are incomplete");
    }

    let stats = simulator.stats();
    info!(
        "{} rays processed, {} absorbed, {} undefined incidences, {} dropped",
        stats.processed,
        stats.absorbed,
        stats.undefined_behavior,
        stats.malformed_dropped + stats.dimmed_dropped,
    );

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if args.pretty {
        serde_json::to_writer_pretty(&mut out, &segments)?;
    } else {
        serde_json::to_writer(&mut out, &segments)?;
    }
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

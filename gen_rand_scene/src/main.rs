use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use prisme::{rand::SeedableRng, rand_pcg::Pcg64Mcg, SceneSettings};
use prisme_json::{serde_json, JsonSer};
use prisme_random::*;
use prisme_shapes::*;

/// Generates a random scene file, to be traced with `run_scene_json`.
#[derive(Parser)]
#[command(name = "gen_rand_scene")]
struct Args {
    /// Where to write the scene file
    output: PathBuf,

    /// Number of glass bodies, mirrors and blockers
    #[arg(long, default_value = "12")]
    objects: usize,

    /// Number of point sources
    #[arg(long, default_value = "1")]
    sources: usize,

    /// Number of rays added directly to the simulator
    #[arg(long, default_value = "4")]
    rays: usize,

    /// Seed used to generate the scene, random if not provided.
    /// It also becomes the seed of the generated scene.
    #[arg(long)]
    seed: Option<u64>,
}

fn generate_random_scene(args: &Args, seed: u64) -> SceneFile {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let mut objects: Vec<Box<dyn SceneObject>> =
        rand_vec::<Dynamic<Box<dyn SceneObject>>>(args.objects, &mut rng)
            .into_iter()
            .map(|d| d.0)
            .collect();

    objects.extend(
        rand_vec::<PointSource>(args.sources, &mut rng)
            .into_iter()
            .map(|source| Box::new(source) as Box<dyn SceneObject>),
    );

    SceneFile {
        settings: SceneSettings {
            seed,
            ..Default::default()
        },
        objects,
        rays: rand_vec(args.rays, &mut rng),
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(prisme::rand::random);

    let scene = generate_random_scene(&args, seed);
    info!(
        "generated {} objects and {} rays with seed {seed}",
        scene.objects.len(),
        scene.rays.len()
    );

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &scene.to_json())?;

    Ok(())
}

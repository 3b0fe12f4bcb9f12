mod cli;
mod logging;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::Parser;

use strata_geom::{IAabb, Int3, Vec3};
use strata_runtime::{Terrain, TerrainStats};
use strata_tiles::{StyleSheet, TileShape};
use strata_world::{TerrainConfig, generate_demo};

use cli::{Args, Command};

fn int3(v: [i32; 3]) -> Int3 {
    Int3::new(v[0], v[1], v[2])
}

/// Empty is -1 on the wire, so shift by one.
fn shape_slot(s: TileShape) -> usize {
    (s.to_i32() + 1) as usize
}

fn load_config(path: &Path) -> Result<TerrainConfig, Box<dyn Error>> {
    if !path.exists() {
        log::warn!("config {} not found, using defaults", path.display());
        return Ok(TerrainConfig::default());
    }
    let cfg = TerrainConfig::from_path(path)?;
    log::info!("loaded config {}", path.display());
    Ok(cfg)
}

fn build_terrain(args: &Args, cfg: &TerrainConfig) -> Result<Terrain, Box<dyn Error>> {
    let mut terrain = Terrain::new(cfg)?;
    if let Some(p) = &args.styles {
        let sheet = StyleSheet::from_path(p)?;
        log::info!("applying {} styles from {}", sheet.styles.len(), p.display());
        terrain.apply_style_sheet(&sheet);
        terrain.create_texture_arrays(false);
    }
    Ok(terrain)
}

fn settle(terrain: &mut Terrain, max_ticks: usize) -> Result<(), Box<dyn Error>> {
    let t0 = Instant::now();
    // Mesh nearest the middle of the world first.
    let view = {
        let d = terrain.world_dimensions();
        let cs = terrain.cell_size();
        terrain.root_offset() + Vec3::new(d.x as f32 * cs.x, d.y as f32 * cs.y, d.z as f32 * cs.z) * 0.5
    };
    match terrain.settle(view, max_ticks) {
        Some(ticks) => {
            log::info!("settled in {} ticks, {} ms", ticks, t0.elapsed().as_millis());
            Ok(())
        }
        None => Err(format!("terrain still busy after {max_ticks} ticks").into()),
    }
}

fn print_stats(s: &TerrainStats) {
    println!("dimensions     {}x{}x{}", s.dims.x, s.dims.y, s.dims.z);
    println!("chunks         {} ({} active)", s.chunks, s.active_chunks);
    println!("render tris    {}", s.render_tris);
    println!("collision tris {}", s.collision_tris);
    println!(
        "dirty          geometry={} bitmask={} light={} sky={}",
        s.dirty.geometry, s.dirty.bitmask, s.dirty.light, s.dirty.sky_pending
    );
    println!("min ambient    {:.2}", s.min_ambient);
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut cfg = load_config(&args.config)?;
    match &args.cmd {
        Command::Demo { out, seed } => {
            if let Some(s) = seed {
                cfg.demo.seed = *s;
            }
            let mut terrain = build_terrain(&args, &cfg)?;
            generate_demo(&mut terrain, &cfg.demo);
            settle(&mut terrain, args.max_ticks)?;
            let bytes = terrain.serialize()?;
            fs::write(out, &bytes)?;
            log::info!("wrote {} bytes to {}", bytes.len(), out.display());
            print_stats(&terrain.stats());
        }
        Command::Load { input, at } => {
            let bytes = fs::read(input)?;
            let mut terrain = build_terrain(&args, &cfg)?;
            terrain.deserialize_at(&bytes, int3(*at))?;
            settle(&mut terrain, args.max_ticks)?;
            print_stats(&terrain.stats());
        }
        Command::Inspect { input } => {
            let bytes = fs::read(input)?;
            let region = strata_io::deserialize(&bytes)?;
            let mut counts = [0usize; 5];
            for c in &region.cells {
                counts[shape_slot(c.shape)] += 1;
            }
            println!("version {}", region.version);
            println!("size    {}x{}x{}", region.size.x, region.size.y, region.size.z);
            for shape in [
                TileShape::Empty,
                TileShape::Block,
                TileShape::Half,
                TileShape::Ramp,
                TileShape::Corner,
            ] {
                println!("{:<7} {}", format!("{shape:?}"), counts[shape_slot(shape)]);
            }
        }
        Command::Cut {
            input,
            out,
            start,
            end,
        } => {
            let region = strata_io::deserialize(&fs::read(input)?)?;
            let mut grid = strata_world::VoxelGrid::new(region.size);
            strata_io::paste_into(&mut grid, &region, Int3::ZERO)?;
            let bytes = strata_io::serialize_region(
                &grid,
                IAabb::new(int3(*start), int3(*end)),
            )?;
            fs::write(out, &bytes)?;
            log::info!("wrote {} bytes to {}", bytes.len(), out.display());
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = logging::init(args.log_file.as_deref()) {
        eprintln!("logging setup failed: {e}");
    }
    if let Err(e) = run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

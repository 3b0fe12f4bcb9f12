use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Headless voxel terrain tool")]
pub struct Args {
    /// Terrain config (TOML). Defaults are used when the file is missing.
    #[arg(long, default_value = "strata.toml")]
    pub config: PathBuf,

    /// Optional style sheet (TOML) applied before meshing.
    #[arg(long)]
    pub styles: Option<PathBuf>,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Give up settling after this many scheduler ticks.
    #[arg(long, default_value_t = 1_000_000)]
    pub max_ticks: usize,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the demo heightmap, settle meshing and light, then save.
    Demo {
        /// Output file for the serialized world.
        #[arg(short, long, default_value = "world.strata")]
        out: PathBuf,
        /// Override the noise seed from the config.
        #[arg(long)]
        seed: Option<i32>,
    },
    /// Load a saved world into an empty terrain, settle, and report.
    Load {
        input: PathBuf,
        /// Paste origin as x,y,z.
        #[arg(long, value_parser = parse_int3, default_value = "0,0,0")]
        at: [i32; 3],
    },
    /// Decode a saved world without building a terrain.
    Inspect { input: PathBuf },
    /// Cut a box out of a saved world into a new file.
    Cut {
        input: PathBuf,
        out: PathBuf,
        /// Inclusive minimum corner as x,y,z.
        #[arg(long, value_parser = parse_int3)]
        start: [i32; 3],
        /// Exclusive maximum corner as x,y,z.
        #[arg(long, value_parser = parse_int3)]
        end: [i32; 3],
    },
}

fn parse_int3(s: &str) -> Result<[i32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got '{s}'"));
    }
    let mut out = [0i32; 3];
    for (o, p) in out.iter_mut().zip(parts) {
        *o = p.parse().map_err(|e| format!("bad coordinate '{p}': {e}"))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_triples() {
        assert_eq!(parse_int3("1, -2,3"), Ok([1, -2, 3]));
        assert!(parse_int3("1,2").is_err());
        assert!(parse_int3("a,b,c").is_err());
    }

    #[test]
    fn demo_defaults() {
        let a = Args::parse_from(["strata", "demo"]);
        assert_eq!(a.config, PathBuf::from("strata.toml"));
        assert!(matches!(a.cmd, Command::Demo { seed: None, .. }));
    }

    #[test]
    fn cut_takes_corners() {
        let a = Args::parse_from([
            "strata", "cut", "in.strata", "out.strata", "--start", "0,0,0", "--end", "4,4,4",
        ]);
        match a.cmd {
            Command::Cut { start, end, .. } => {
                assert_eq!(start, [0, 0, 0]);
                assert_eq!(end, [4, 4, 4]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

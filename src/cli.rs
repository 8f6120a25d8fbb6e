use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "voxmap", version, about = "Top-down map renderer for voxel worlds")]
pub struct Cli {
    /// Path to the TOML config; a missing file means defaults.
    #[arg(long, default_value = "voxmap.toml")]
    pub config: PathBuf,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one region, or every configured region.
    Render {
        #[arg(long)]
        region: Option<String>,
    },
    #[command(subcommand)]
    Wall(WallCommand),
    #[command(subcommand)]
    Region(RegionCommand),
    /// Run the host tick loop against the demo world.
    Serve {
        /// Stop after this many ticks; runs until interrupted otherwise.
        #[arg(long)]
        ticks: Option<u64>,

        /// Reload the palette and re-render when the config or palette changes.
        #[arg(long, default_value_t = false)]
        watch_config: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum WallCommand {
    Create(CreateWall),
    Remove {
        #[arg(long)]
        region: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateWall {
    #[arg(long)]
    pub region: String,

    /// Tiles per side.
    #[arg(long)]
    pub size: u32,

    /// Origin block; defaults to the world spawn.
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<i32>,
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<i32>,
    #[arg(long, allow_hyphen_values = true)]
    pub z: Option<i32>,

    /// south, north, east or west.
    #[arg(long, default_value = "south")]
    pub facing: String,
}

#[derive(Subcommand, Debug)]
pub enum RegionCommand {
    /// Store a pending bounded-render config and confirm it.
    Set {
        #[arg(long)]
        region: String,
        #[arg(long, allow_hyphen_values = true)]
        center_x: i32,
        #[arg(long, allow_hyphen_values = true)]
        center_z: i32,
        #[arg(long)]
        radius: i32,
    },
    Clear {
        #[arg(long)]
        region: String,
    },
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wall_create_with_negative_origin() {
        let cli = Cli::try_parse_from([
            "voxmap", "wall", "create", "--region", "world", "--size", "3", "--x", "-12", "--facing",
            "east",
        ])
        .unwrap();
        match cli.command {
            Command::Wall(WallCommand::Create(c)) => {
                assert_eq!((c.region.as_str(), c.size, c.x, c.y), ("world", 3, Some(-12), None));
                assert_eq!(c.facing, "east");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("voxmap.toml"));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["voxmap", "--log-file", "out.log", "serve"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("out.log")));
        assert!(matches!(
            cli.command,
            Command::Serve {
                ticks: None,
                watch_config: false
            }
        ));
    }
}

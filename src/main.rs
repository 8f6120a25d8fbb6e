mod cli;
mod config;
mod demo;
mod host;
mod logging;
mod watch;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use voxmap_runtime::{MapService, ServiceSettings, ViewerSnapshot};
use voxmap_walls::Orientation;
use voxmap_world::BlockPos;

use crate::cli::{Cli, Command, CreateWall, RegionCommand, WallCommand};
use crate::config::Config;
use crate::host::DemoHost;
use crate::watch::ConfigWatch;

const DEMO_SEED: i32 = 1337;
/// Demo worlds extend this many cells from the origin in each direction.
const DEMO_RADIUS: i32 = 12;
const DEMO_VIEWER: u64 = 1;
const WALK_RADIUS: f64 = 48.0;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;

    let config = Config::load(&cli.config)?;
    let settings = config.settings();
    let palette = Arc::new(config.load_palette()?);
    let host = Arc::new(demo_host(&settings));
    let mut service = MapService::open(host.clone(), settings, palette)?;

    match cli.command {
        Command::Render { region } => {
            match region {
                Some(region) => service.request_render(&region)?,
                None => {
                    service.request_render_all();
                }
            }
            run_until_idle(&mut service);
            for region in host.regions() {
                if let Some(info) = service.rendered(&region) {
                    println!(
                        "{region}: {}x{} px, x {}..{}, z {}..{}",
                        info.width, info.height, info.min_x, info.max_x, info.min_z, info.max_z
                    );
                }
            }
        }
        Command::Wall(WallCommand::Create(args)) => create_wall(&mut service, &host, args)?,
        Command::Wall(WallCommand::Remove { region }) => match service.remove_wall(&region)? {
            Some(wall) => println!("Removed {}x{} wall in '{region}'", wall.size, wall.size),
            None => println!("No wall in '{region}'"),
        },
        Command::Region(RegionCommand::Set {
            region,
            center_x,
            center_z,
            radius,
        }) => {
            let cfg = service.set_region(&region, center_x, center_z, radius)?;
            service.confirm_region(&region)?;
            println!(
                "'{region}': {}x{} blocks around ({}, {}), rendering",
                cfg.side(),
                cfg.side(),
                cfg.center_x,
                cfg.center_z
            );
            run_until_idle(&mut service);
        }
        Command::Region(RegionCommand::Clear { region }) => match service.clear_region(&region)? {
            Some(_) => println!("Cleared region config for '{region}'"),
            None => println!("No region config for '{region}'"),
        },
        Command::Region(RegionCommand::Info) => {
            let info = service.region_info();
            if info.is_empty() {
                println!("No region configs");
            }
            for (region, cfg) in info {
                let b = cfg.bounds()?;
                println!(
                    "{region}: center ({}, {}) radius {} side {} x {}..{} z {}..{} {}",
                    cfg.center_x,
                    cfg.center_z,
                    cfg.radius,
                    cfg.side(),
                    b.min_x(),
                    b.max_x(),
                    b.min_z(),
                    b.max_z(),
                    if cfg.enabled { "enabled" } else { "pending" }
                );
            }
        }
        Command::Serve {
            ticks,
            watch_config,
        } => serve(&mut service, &host, &config, &cli.config, ticks, watch_config)?,
    }
    Ok(())
}

fn demo_host(settings: &ServiceSettings) -> DemoHost {
    settings
        .render_regions
        .iter()
        .enumerate()
        .fold(DemoHost::new(), |host, (i, region)| {
            let world = demo::world(DEMO_SEED.wrapping_add(i as i32), DEMO_RADIUS);
            host.with_world(region, Arc::new(world))
        })
}

/// A yaw that resolves to `facing`.
fn facing_yaw(facing: Orientation) -> f64 {
    match facing {
        Orientation::South => 0.0,
        Orientation::West => 90.0,
        Orientation::North => 180.0,
        Orientation::East => 270.0,
    }
}

fn create_wall(service: &mut MapService, host: &DemoHost, args: CreateWall) -> Result<(), Box<dyn Error>> {
    let facing = Orientation::parse(&args.facing)
        .ok_or_else(|| format!("unknown facing '{}'", args.facing))?;
    let spawn = host.spawn(&args.region).unwrap_or_default();
    let origin = BlockPos::new(
        args.x.unwrap_or(spawn.x),
        args.y.unwrap_or(spawn.y),
        args.z.unwrap_or(spawn.z),
    );
    service.create_wall(&args.region, args.size, origin, facing_yaw(facing))?;
    run_until_idle(service);
    match service.walls().get(&args.region) {
        Some(wall) => {
            let ids: Vec<u64> = wall.ids().collect();
            println!(
                "Wall in '{}': {}x{} facing {} at {:?}, tiles {}..={}",
                args.region,
                wall.size,
                wall.size,
                wall.facing,
                wall.origin,
                ids.first().copied().unwrap_or_default(),
                ids.last().copied().unwrap_or_default()
            );
        }
        None => println!("Wall in '{}' was not created, see log", args.region),
    }
    Ok(())
}

fn tick_period(service: &MapService) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(service.settings().ticks_per_second.max(1)))
}

/// Ticks until every background job, placement and delivery has finished.
fn run_until_idle(service: &mut MapService) {
    let period = tick_period(service);
    loop {
        service.tick();
        if service.is_idle() {
            break;
        }
        std::thread::sleep(period);
    }
}

fn walk(host: &DemoHost, region: &str, center: BlockPos, tick: u64) {
    let angle = tick as f64 * 0.01;
    host.upsert_viewer(ViewerSnapshot {
        id: DEMO_VIEWER,
        name: "Wanderer".to_string(),
        region: region.to_string(),
        x: f64::from(center.x) + WALK_RADIUS * angle.cos(),
        y: f64::from(center.y),
        z: f64::from(center.z) + WALK_RADIUS * angle.sin(),
        yaw: (angle.to_degrees() + 90.0).rem_euclid(360.0),
    });
}

fn serve(
    service: &mut MapService,
    host: &DemoHost,
    config: &Config,
    config_path: &Path,
    ticks: Option<u64>,
    watch_config: bool,
) -> Result<(), Box<dyn Error>> {
    let watch = if watch_config {
        let mut paths = vec![config_path.to_path_buf()];
        paths.extend(config.palette.clone());
        Some(ConfigWatch::new(&paths)?)
    } else {
        None
    };

    let region = service
        .settings()
        .render_regions
        .first()
        .cloned()
        .unwrap_or_else(|| "world".to_string());
    let center = host.spawn(&region).unwrap_or_default();
    walk(host, &region, center, 0);
    service.viewer_joined(DEMO_VIEWER);

    let period = tick_period(service);
    log::info!(target: "runtime", "Serving {} region(s) at {:?}/tick", host.regions().len(), period);
    let mut n = 0u64;
    while ticks.is_none_or(|limit| n < limit) {
        let started = Instant::now();
        if watch.as_ref().is_some_and(|w| w.changed()) {
            reload_palette(service, config_path);
        }
        walk(host, &region, center, n);
        let report = service.tick();
        if report.results_applied > 0 {
            log::debug!(target: "runtime", "tick {}: applied {} result(s)", report.tick, report.results_applied);
        }
        n += 1;
        std::thread::sleep(period.saturating_sub(started.elapsed()));
    }
    log::info!(
        target: "runtime",
        "Stopped after {n} tick(s): {} tile(s) sent, {} block(s) placed",
        host.tiles_sent(),
        host.blocks_placed()
    );
    Ok(())
}

fn reload_palette(service: &mut MapService, config_path: &Path) {
    let palette = Config::load(config_path).and_then(|c| c.load_palette());
    match palette {
        Ok(palette) => {
            service.set_palette(Arc::new(palette));
            let queued = service.request_render_all();
            log::info!("Config changed: palette reloaded, {queued} render(s) queued");
        }
        Err(e) => log::warn!("Config changed but could not be reloaded: {e}"),
    }
}

//! Formation Simulator
//!
//! Drives a scripted leader across open ground and reports where its
//! followers ended up relative to their formation slots.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use serde::Serialize;

use formation_ai::core::{set_config, FormationConfig, FormationError, Result};
use formation_ai::formation::{FormationStore, FormationType};
use formation_ai::movement::MovementFlags;
use formation_ai::world::{Unit, World};

/// Formation Simulator - run a leader and followers headless
#[derive(Parser, Debug)]
#[command(name = "formation_sim")]
#[command(about = "Run a scripted formation and print follower positions")]
struct Args {
    /// Formation store (TOML or JSON)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Formation config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Formation type, by name or number
    #[arg(long, default_value = "single_file")]
    formation: String,

    /// Number of followers
    #[arg(long, default_value_t = 5)]
    followers: u32,

    /// Follower distance (uses the formation default when omitted)
    #[arg(long)]
    radius: Option<f32>,

    /// How far the leader walks
    #[arg(long, default_value_t = 40.0)]
    distance: f32,

    /// Number of world ticks to run
    #[arg(long, default_value_t = 100)]
    ticks: u32,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 100)]
    tick_ms: u32,

    /// Lead with a player instead of a creature
    #[arg(long)]
    player_leader: bool,

    /// Random seed for random formations
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct FollowerReport {
    formation_position: u8,
    position: [f32; 2],
    offset: [f32; 2],
    slot_error: f32,
}

#[derive(Serialize)]
struct SimReport {
    formation: String,
    radius: f32,
    ticks: u32,
    leader_position: [f32; 2],
    leader_orientation: f32,
    followers: Vec<FollowerReport>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(report) => print_report(&report, &args.format),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<SimReport> {
    if let Some(path) = &args.config {
        let content = std::fs::read_to_string(path)?;
        let config = FormationConfig::from_toml_str(&content)?;
        if set_config(config).is_err() {
            tracing::warn!("Formation config already installed, ignoring {:?}", path);
        }
    }

    let store = match &args.store {
        Some(path) => FormationStore::load_from_file(path)?,
        None => FormationStore::new(),
    };
    let formation_type: FormationType = args
        .formation
        .parse()
        .map_err(FormationError::InvalidConfig)?;

    let mut world = World::with_store(Arc::new(store));

    let leader_unit = if args.player_leader {
        Unit::player(Vec2::ZERO)
    } else {
        Unit::creature(None, Vec2::ZERO)
    };
    let leader = world.spawn(leader_unit);

    if let (Some(seed), Some(formation)) = (args.seed, world.formation_mut(leader)) {
        formation.reseed(seed);
    }
    world.set_formation_type(leader, formation_type)?;
    if let Some(radius) = args.radius {
        world.set_follower_distance(leader, radius)?;
    }

    for i in 0..args.followers {
        let start = Vec2::new(-2.0 * (i + 1) as f32, 3.0);
        let follower = world.spawn(Unit::creature(None, start));
        world.add_follower(leader, follower, i as u8)?;
    }

    tracing::info!(
        "Running {} followers in {} for {} ticks",
        args.followers,
        formation_type,
        args.ticks
    );

    let destination = Vec2::new(args.distance, 0.0);
    if args.player_leader {
        if let Some(unit) = world.unit_mut(leader) {
            unit.movement_flags.insert(MovementFlags::FORWARD);
        }
    } else {
        world.move_point(leader, 1, destination)?;
    }

    for _ in 0..args.ticks {
        world.update(args.tick_ms);

        // Players walk until they pass the destination, then stop
        if args.player_leader {
            if let Some(unit) = world.unit_mut(leader) {
                if unit.position.x >= destination.x && unit.is_moving() {
                    unit.stop_moving();
                    tracing::info!("Leader stopped at tick {}", world.tick);
                }
            }
        }
    }

    build_report(&world, leader, args.ticks)
}

fn build_report(world: &World, leader: formation_ai::core::ActorId, ticks: u32) -> Result<SimReport> {
    let leader_unit = world.unit(leader).ok_or(FormationError::UnitNotFound(leader))?;
    let formation = world
        .formation(leader)
        .ok_or(FormationError::UnitNotFound(leader))?;
    let facing = Vec2::from_angle(leader_unit.orientation);

    let followers = formation
        .followers()
        .iter()
        .filter_map(|member| {
            let unit = world.unit(member.id)?;
            let slot = leader_unit.position + facing.rotate(member.offset);
            Some(FollowerReport {
                formation_position: member.formation_position,
                position: unit.position.to_array(),
                offset: member.offset.to_array(),
                slot_error: unit.position.distance(slot),
            })
        })
        .collect();

    Ok(SimReport {
        formation: formation.formation_type().to_string(),
        radius: formation.radius(),
        ticks,
        leader_position: leader_unit.position.to_array(),
        leader_orientation: leader_unit.orientation,
        followers,
    })
}

fn print_report(report: &SimReport, format: &str) {
    if format == "json" {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: {}", e),
        }
        return;
    }

    println!(
        "{} (radius {:.1}) after {} ticks",
        report.formation, report.radius, report.ticks
    );
    println!(
        "  leader at ({:.2}, {:.2}) facing {:.2}",
        report.leader_position[0], report.leader_position[1], report.leader_orientation
    );
    for follower in &report.followers {
        println!(
            "  #{:<3} at ({:7.2}, {:7.2}) offset ({:6.2}, {:6.2}) slot error {:.2}",
            follower.formation_position,
            follower.position[0],
            follower.position[1],
            follower.offset[0],
            follower.offset[1],
            follower.slot_error
        );
    }
}

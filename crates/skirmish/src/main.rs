//! Headless battle runner.
//!
//! ```text
//! skirmish <level.json> [--seconds N] [--dt S] [--seed N] [--config F] [--snapshot F]
//! ```
//!
//! Loads the level, starts every tank and steps at a fixed delta until one
//! team is left or the time runs out. Set `RUST_LOG=debug` to watch every
//! state change.

use std::path::PathBuf;
use std::process::ExitCode;

use skirmish::prelude::*;

struct Args {
    level: PathBuf,
    seconds: f32,
    dt: f32,
    seed: Option<u64>,
    config: Option<PathBuf>,
    snapshot: Option<PathBuf>,
}

const USAGE: &str =
    "usage: skirmish <level.json> [--seconds N] [--dt S] [--seed N] [--config F] [--snapshot F]";

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut level = None;
    let mut parsed = Args {
        level: PathBuf::new(),
        seconds: 120.0,
        dt: 1.0 / 60.0,
        seed: None,
        config: None,
        snapshot: None,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--seconds" => parsed.seconds = parse_number(&value("--seconds")?)?,
            "--dt" => parsed.dt = parse_number(&value("--dt")?)?,
            "--seed" => parsed.seed = Some(parse_number(&value("--seed")?)?),
            "--config" => parsed.config = Some(value("--config")?.into()),
            "--snapshot" => parsed.snapshot = Some(value("--snapshot")?.into()),
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
            path => level = Some(PathBuf::from(path)),
        }
    }

    parsed.level = level.ok_or_else(|| USAGE.to_string())?;
    if !(parsed.dt > 0.0) {
        return Err("--dt must be positive".to_string());
    }
    Ok(parsed)
}

fn parse_number<T: std::str::FromStr>(text: &str) -> Result<T, String> {
    text.parse().map_err(|_| format!("not a number: {text}"))
}

fn run(args: Args) -> Result<(), SimError> {
    let level = LevelData::from_file(&args.level)?;
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => level.config.clone().unwrap_or_default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut sim = level.build_simulation(Some(config))?;
    sim.start_all();

    let frames_per_second = (1.0 / args.dt).round().max(1.0) as u64;
    let total_frames = (args.seconds / args.dt).ceil() as u64;
    for frame in 1..=total_frames {
        for id in sim.step(args.dt) {
            log::debug!("removed {id}");
        }
        if frame % frames_per_second == 0 {
            let m = &sim.manager;
            log::info!(
                "t={:>6.1}s  Team A: {}  Team B: {}  entities: {}",
                sim.clock.elapsed_secs(),
                m.team_count(Team::A),
                m.team_count(Team::B),
                m.len()
            );
        }
        if sim.winning_team().is_some() {
            break;
        }
    }

    match sim.winning_team() {
        Some(team) => println!("{team} wins after {:.1}s", sim.clock.elapsed_secs()),
        None => println!("no winner after {:.1}s", sim.clock.elapsed_secs()),
    }
    for (entity, _) in sim.manager.tanks() {
        if let Some(info) = sim.tank_info(entity.id()) {
            println!(
                "  {:<6} {:<7} {:<12} hp {:>3}/{:<3} shells {:>2} fired {:>3}",
                info.name, info.team_name, info.state, info.hp, info.max_hp, info.shells_available, info.shells_fired
            );
        }
    }

    if let Some(path) = &args.snapshot {
        sim.snapshot().write_to(path)?;
        log::info!("snapshot written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

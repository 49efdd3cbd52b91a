/// Headless runner: play a decision script against a level.
///
/// Usage: `rewinder [LEVEL] [SCRIPT]`
///   LEVEL  = path to a `.txt` level, or a 1-based index into the level list
///            (levels directory, or the built-in set). Default: 1.
///   SCRIPT = path to a script file, `-` for stdin, or inline commands
///            such as `"RRE/WW"`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, trace, warn};

use rewinder::config::GameConfig;
use rewinder::domain::grid::Position;
use rewinder::sim::event::SimEvent;
use rewinder::sim::level::{self, LevelDef};
use rewinder::sim::scheduler::{DecisionOutcome, LevelProgress, Phase, PhaseScheduler};
use rewinder::sim::script::{self, Command};

/// Level progression for a single headless run.
struct RunOutcome {
    name: String,
    goal: Option<Position>,
    deaths: u32,
}

impl LevelProgress for RunOutcome {
    fn goal_reached(&mut self, at: Position) {
        info!(level = %self.name, %at, "level complete");
        self.goal = Some(at);
    }

    fn player_lost(&mut self, at: Position) {
        info!(level = %self.name, %at, "player lost");
        self.deaths += 1;
    }
}

fn main() -> Result<()> {
    let config = GameConfig::load();

    let default_filter: tracing_subscriber::filter::Directive = config
        .log_filter
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_filter),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let def = select_level(args.first().map(String::as_str), &config)?;
    let commands = match args.get(1) {
        Some(arg) => load_script(arg)?,
        None => vec![],
    };

    let world = level::build_world(&def).with_context(|| format!("failed to build level {:?}", def.name))?;
    let progress = RunOutcome { name: def.name.clone(), goal: None, deaths: 0 };
    let mut scheduler = PhaseScheduler::builder()
        .world(world)
        .level(progress)
        .config(&config)
        .build()
        .context("failed to start scheduler")?;

    log_events(&scheduler.run_until_idle()?);
    for command in commands {
        if scheduler.phase().is_level_over() {
            warn!(?command, "level is over, ignoring the rest of the script");
            break;
        }
        if let DecisionOutcome::Rejected(e) = scheduler.command(command)? {
            info!(?command, error = %e, "command rejected");
            continue;
        }
        log_events(&scheduler.run_until_idle()?);
    }

    println!("{}", def.name);
    print!("{}", scheduler.world().render());
    let outcome = scheduler.level();
    let status = match scheduler.phase() {
        Phase::LevelComplete => "complete",
        Phase::LevelFailed => "failed",
        _ => "in progress",
    };
    println!(
        "round {} turn {} | ghosts {} | deaths {} | {}",
        scheduler.round(),
        scheduler.turn(),
        scheduler.order().len() - 1,
        outcome.deaths,
        status,
    );
    if let Some(at) = outcome.goal {
        println!("goal reached at {at}");
    }
    Ok(())
}

fn select_level(arg: Option<&str>, config: &GameConfig) -> Result<LevelDef> {
    let arg = arg.unwrap_or("1");
    if let Ok(index) = arg.parse::<usize>() {
        let mut levels = level::available_levels(config);
        if index == 0 || index > levels.len() {
            bail!("level index {index} out of range (1-{})", levels.len());
        }
        return Ok(levels.swap_remove(index - 1));
    }
    level::load_level_file(Path::new(arg)).with_context(|| format!("failed to load level {arg}"))
}

fn load_script(arg: &str) -> Result<Vec<Command>> {
    let text = if arg == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read script from stdin")?
    } else if Path::new(arg).is_file() {
        std::fs::read_to_string(arg).with_context(|| format!("failed to read script {arg}"))?
    } else {
        arg.to_string()
    };
    Ok(script::parse_script(&text)?)
}

fn log_events(events: &[SimEvent]) {
    for event in events {
        match event {
            SimEvent::Motion { .. } => trace!(?event),
            _ => debug!(?event),
        }
    }
}

//! NetHack bot
//!
//! Starts NetHack on a pseudoterminal and plays it until the game exits.
//! The decoded screen goes to stdout each cycle, logs go to stderr.

use std::fs::OpenOptions;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use nhbot_core::{ActionSet, BotRng};
use nhbot_player::host::shutdown::{clear_shutdown_target, install_shutdown_handler};
use nhbot_player::{BotConfig, GameHost, Orchestrator, PtyHost, Vt100Terminal};

/// Q-learning NetHack bot
#[derive(Parser, Debug)]
#[command(name = "nhbot")]
#[command(author, version, about = "Plays terminal NetHack with tabular Q-learning", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Path of the NetHack executable
    #[arg(short = 'g', long = "game")]
    game: Option<PathBuf>,

    /// Seed for every random decision
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Stop after this many cycles
    #[arg(long = "max-cycles")]
    max_cycles: Option<u64>,

    /// Movement directions available to navigation
    #[arg(long = "action-set", value_enum)]
    action_set: Option<ActionSetArg>,

    /// Training iterations before each move
    #[arg(long = "training-iterations")]
    training_iterations: Option<u32>,

    /// Do not print the screen to stdout
    #[arg(long = "no-observer")]
    no_observer: bool,

    /// Append one JSON line per cycle to this file
    #[arg(long = "state-log")]
    state_log: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long = "dump-config")]
    dump_config: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Arguments passed through to the game
    #[arg(last = true)]
    game_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionSetArg {
    Cardinal,
    Compass,
}

impl From<ActionSetArg> for ActionSet {
    fn from(arg: ActionSetArg) -> Self {
        match arg {
            ActionSetArg::Cardinal => ActionSet::Cardinal,
            ActionSetArg::Compass => ActionSet::Compass,
        }
    }
}

impl Args {
    /// Layer command-line flags over the loaded configuration
    fn apply(&self, config: &mut BotConfig) {
        if let Some(game) = &self.game {
            config.game.path = game.clone();
        }
        if !self.game_args.is_empty() {
            config.game.args = self.game_args.clone();
        }
        if let Some(seed) = self.seed {
            config.session.seed = Some(seed);
        }
        if let Some(max_cycles) = self.max_cycles {
            config.session.max_cycles = Some(max_cycles);
        }
        if let Some(action_set) = self.action_set {
            config.navigation.action_set = action_set.into();
        }
        if let Some(iterations) = self.training_iterations {
            config.navigation.training_iterations = iterations;
        }
        if self.no_observer {
            config.session.observer = false;
        }
        if let Some(path) = &self.state_log {
            config.session.state_log = Some(path.clone());
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };
    args.apply(&mut config);

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let rng = match config.session.seed {
        Some(seed) => BotRng::new(seed),
        None => BotRng::from_entropy(),
    };
    info!(seed = rng.seed(), game = %config.game.path.display(), "starting bot");

    let host = PtyHost::spawn(&config.game).context("failed to start the game")?;
    install_shutdown_handler(host.pid()).context("failed to install signal handlers")?;

    let mut bot = Orchestrator::new(host, Vt100Terminal::new(), &config, rng);
    if config.session.observer {
        bot = bot.with_observer(Box::new(io::stdout()));
    }
    if let Some(path) = &config.session.state_log {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open state log '{}'", path.display()))?;
        bot = bot.with_state_log(Box::new(BufWriter::new(file)));
    }

    let result = bot.run();
    bot.host_mut().terminate();
    clear_shutdown_target();

    let summary = result.context("bot session failed")?;
    info!(
        cycles = summary.cycles,
        bytes_read = summary.bytes_read,
        movements = summary.movements,
        reactive_actions = summary.reactive_actions,
        prompt_responses = summary.prompt_responses,
        read_errors = summary.read_errors,
        turn = summary.last_stats.turn,
        dungeon_level = summary.last_stats.dungeon_level,
        "exiting"
    );
    Ok(())
}

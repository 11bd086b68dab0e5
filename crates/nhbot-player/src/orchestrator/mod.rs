//! Orchestrator for a live bot session.
//!
//! One cycle: wait for game output, feed it to the terminal engine, sync
//! the screen grid, interpret it, answer prompts, navigate, take at most
//! one reactive action, then publish the screen to the observer.

use std::io::Write;
use std::thread;

use nhbot_core::interpret::BottomLineStats;
use nhbot_core::{
    ActionValueTable, BotAction, BotRng, GameStateSnapshot, GridPos, NavigationEngine, RewardMap,
    ScreenGrid, TerminalEngine, dispatch, interpret, respond,
};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::{BotConfig, SessionConfig};
use crate::error::SessionError;
use crate::host::GameHost;

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    /// The game process is gone
    Exited,
}

/// Counters for a whole session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub cycles: u64,
    pub bytes_read: u64,
    pub movements: u64,
    pub reactive_actions: u64,
    pub prompt_responses: u64,
    pub read_errors: u64,
    pub last_stats: BottomLineStats,
}

/// One line of the state log
#[derive(Serialize)]
struct CycleRecord<'a> {
    cycle: u64,
    player: Option<GridPos>,
    movement: Option<BotAction>,
    reactive: Option<BotAction>,
    snapshot: &'a GameStateSnapshot,
}

/// Drives one game from start to exit
pub struct Orchestrator<H: GameHost, T: TerminalEngine> {
    host: H,
    terminal: T,
    screen: ScreenGrid,
    navigation: NavigationEngine,
    table: ActionValueTable,
    rng: BotRng,
    session: SessionConfig,
    observer: Option<Box<dyn Write>>,
    state_log: Option<Box<dyn Write>>,
    buf: Vec<u8>,
    summary: SessionSummary,
    snapshot: GameStateSnapshot,
}

impl<H: GameHost, T: TerminalEngine> Orchestrator<H, T> {
    pub fn new(host: H, terminal: T, config: &BotConfig, rng: BotRng) -> Self {
        Self {
            host,
            terminal,
            screen: ScreenGrid::new(),
            navigation: NavigationEngine::new(config.navigation),
            table: ActionValueTable::new(),
            rng,
            session: config.session.clone(),
            observer: None,
            state_log: None,
            buf: vec![0; config.session.read_buffer.max(1)],
            summary: SessionSummary::default(),
            snapshot: GameStateSnapshot::default(),
        }
    }

    /// Publish the character grid to `observer` after every cycle
    pub fn with_observer(mut self, observer: Box<dyn Write>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Append one JSON line per cycle to `log`
    pub fn with_state_log(mut self, log: Box<dyn Write>) -> Self {
        self.state_log = Some(log);
        self
    }

    /// Send the keys that get past the game's opening screens
    pub fn start(&mut self) -> Result<(), SessionError> {
        let keys = self.session.startup_keys.as_bytes();
        if keys.is_empty() {
            return Ok(());
        }
        let out = self.host.keystrokes();
        out.write_all(keys)
            .and_then(|()| out.flush())
            .map_err(SessionError::Startup)?;
        debug!(keys = keys.len(), "startup keys sent");
        Ok(())
    }

    /// Send the startup keys, then cycle until the game exits or the cycle
    /// limit is reached
    pub fn run(&mut self) -> Result<SessionSummary, SessionError> {
        self.start()?;
        info!(seed = self.rng.seed(), "session started");

        loop {
            if let Some(limit) = self.session.max_cycles {
                if self.summary.cycles >= limit {
                    info!(limit, "cycle limit reached");
                    break;
                }
            }
            if self.step()? == CycleOutcome::Exited {
                break;
            }
        }

        info!(
            cycles = self.summary.cycles,
            movements = self.summary.movements,
            valued_cells = self.table.valued_cells(),
            "session finished"
        );
        Ok(self.summary.clone())
    }

    /// Run one cycle
    pub fn step(&mut self) -> Result<CycleOutcome, SessionError> {
        self.summary.cycles += 1;
        let cycle = self.summary.cycles;

        let ready = match self.host.wait_for_output(self.session.poll_timeout()) {
            Ok(ready) => ready,
            Err(err) => {
                warn!(%err, cycle, "waiting for game output failed");
                self.summary.read_errors += 1;
                false
            }
        };

        if !self.host.is_running() {
            return Ok(CycleOutcome::Exited);
        }

        if ready {
            self.read_and_sync(cycle);
        }

        // the screen is interpreted even when nothing new arrived
        self.snapshot = interpret(&self.screen);

        for &response in &self.snapshot.responses {
            debug!(?response, "answering prompt");
            respond(self.host.keystrokes(), response, &mut self.rng)?;
            self.summary.prompt_responses += 1;
        }

        if !self.session.settle_delay().is_zero() {
            thread::sleep(self.session.settle_delay());
        }

        let mut movement = None;
        let mut reactive = None;
        if let Some(player) = self.snapshot.player {
            let rewards = RewardMap::from_grid(&self.screen);
            if let Some(dir) =
                self.navigation
                    .decide(&mut self.table, &rewards, player, &mut self.rng)
            {
                let action = BotAction::Move(dir);
                dispatch(self.host.keystrokes(), action, &mut self.rng)?;
                self.summary.movements += 1;
                movement = Some(action);
            }

            reactive = self.snapshot.reactive_action();
            if let Some(action) = reactive {
                debug!(%action, cycle, "reactive action");
                dispatch(self.host.keystrokes(), action, &mut self.rng)?;
                self.summary.reactive_actions += 1;
            }
        }
        self.summary.last_stats = self.snapshot.stats;

        self.publish();
        self.log_cycle(cycle, movement, reactive);

        Ok(CycleOutcome::Continue)
    }

    /// Feed one read's worth of output through the terminal into the grid
    fn read_and_sync(&mut self, cycle: u64) {
        let read = match self.host.read_output(&mut self.buf) {
            Ok(0) => {
                warn!(cycle, "game output was empty");
                self.summary.read_errors += 1;
                return;
            }
            Ok(n) => n,
            Err(err) => {
                warn!(%err, cycle, "reading game output failed");
                self.summary.read_errors += 1;
                return;
            }
        };
        self.summary.bytes_read += read as u64;
        trace!(cycle, read, "game output");

        self.terminal.write(&self.buf[..read]);
        self.screen.sync_from(&mut self.terminal);
    }

    fn publish(&mut self) {
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        if let Err(err) = observer
            .write_all(self.screen.chars())
            .and_then(|()| observer.flush())
        {
            warn!(%err, "observer write failed");
        }
    }

    fn log_cycle(&mut self, cycle: u64, movement: Option<BotAction>, reactive: Option<BotAction>) {
        let Some(log) = self.state_log.as_mut() else {
            return;
        };
        let record = CycleRecord {
            cycle,
            player: self.snapshot.player,
            movement,
            reactive,
            snapshot: &self.snapshot,
        };
        let result = serde_json::to_writer(&mut *log, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| log.write_all(b"\n"))
            .and_then(|()| log.flush());
        if let Err(err) = result {
            warn!(%err, "state log write failed");
        }
    }

    pub fn screen(&self) -> &ScreenGrid {
        &self.screen
    }

    /// Snapshot interpreted in the most recent cycle
    pub fn snapshot(&self) -> &GameStateSnapshot {
        &self.snapshot
    }

    pub fn table(&self) -> &ActionValueTable {
        &self.table
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

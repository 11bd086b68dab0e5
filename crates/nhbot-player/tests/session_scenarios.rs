//! Orchestrator cycles against a scripted game

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use nhbot_core::action::prompt_keystrokes;
use nhbot_core::color::{CLR_GRAY, CLR_WHITE, CLR_YELLOW};
use nhbot_core::{
    BotRng, DirtyRow, PromptResponse, SCREEN_CELLS, SCREEN_HEIGHT, SCREEN_WIDTH, TermCell,
    TerminalEngine,
};
use nhbot_player::{BotConfig, CycleOutcome, GameHost, Orchestrator, SessionError};

/// Keystroke sink that can be told to fail
#[derive(Default)]
struct Sink {
    data: Vec<u8>,
    fail: bool,
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "game closed its input"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A game that prints scripted chunks, then exits unless told to linger
#[derive(Default)]
struct FakeHost {
    script: VecDeque<io::Result<Vec<u8>>>,
    sink: Sink,
    linger: bool,
    terminated: bool,
}

impl FakeHost {
    fn with_frames(frames: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            script: frames.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }
}

impl GameHost for FakeHost {
    fn wait_for_output(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.script.is_empty())
    }

    fn read_output(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.pop_front() {
            Some(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Err(err)) => Err(err),
            None => Ok(0),
        }
    }

    fn is_running(&mut self) -> bool {
        !self.terminated && (self.linger || !self.script.is_empty())
    }

    fn keystrokes(&mut self) -> &mut dyn Write {
        &mut self.sink
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}

/// Terminal that takes each write as a full repaint, one line per row.
///
/// `@` is bold white, `$` yellow, walls and floor gray, anything else in
/// the default color.
struct FakeTerminal {
    rows: Vec<Vec<TermCell>>,
    dirty: bool,
}

impl FakeTerminal {
    fn new() -> Self {
        Self {
            rows: vec![vec![TermCell::default(); SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: false,
        }
    }
}

fn fake_cell(ch: u8) -> TermCell {
    match ch {
        b'@' => TermCell::colored(ch, CLR_WHITE, true),
        b'$' => TermCell::colored(ch, CLR_YELLOW, false),
        b'-' | b'|' | b'.' => TermCell::colored(ch, CLR_GRAY, false),
        _ => TermCell::plain(ch),
    }
}

impl TerminalEngine for FakeTerminal {
    fn write(&mut self, bytes: &[u8]) {
        for row in &mut self.rows {
            row.fill(TermCell::default());
        }
        for (r, line) in bytes.split(|&b| b == b'\n').take(SCREEN_HEIGHT).enumerate() {
            for (c, &ch) in line.iter().take(SCREEN_WIDTH).enumerate() {
                self.rows[r][c] = fake_cell(ch);
            }
        }
        self.dirty = true;
    }

    fn cursor(&self) -> (usize, usize) {
        (0, 0)
    }

    fn dirty_rows(&self) -> Vec<DirtyRow> {
        if !self.dirty {
            return Vec::new();
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| DirtyRow {
                row,
                cells: cells.clone(),
            })
            .collect()
    }

    fn clean(&mut self) {
        self.dirty = false;
    }
}

/// Writer whose contents the test can still read after handing it over
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Build a frame from (row, text) pairs
fn frame(lines: &[(usize, &str)]) -> Vec<u8> {
    let mut rows = vec![String::new(); SCREEN_HEIGHT];
    for &(row, text) in lines {
        rows[row] = text.to_string();
    }
    rows.join("\n").into_bytes()
}

/// A small walled room with the player and some gold, plus a status line
fn room_frame(message: &str, status: &str) -> Vec<u8> {
    frame(&[
        (0, message),
        (5, "          -----------"),
        (6, "          |.........|"),
        (7, "          |....@..$.|"),
        (8, "          |.........|"),
        (9, "          -----------"),
        (22, "Sir Bot the Gallant   St:16 Dx:10 Co:17 In:8 Wi:12 Ch:17 Lawful"),
        (23, status),
    ])
}

fn test_config() -> BotConfig {
    let mut config = BotConfig::default();
    config.session.settle_delay_ms = 0;
    config.navigation.training_iterations = 500;
    config
}

fn orchestrator(host: FakeHost) -> Orchestrator<FakeHost, FakeTerminal> {
    Orchestrator::new(host, FakeTerminal::new(), &test_config(), BotRng::new(7))
}

const MOVE_KEYS: &[u8] = b"kljh";

#[test]
fn test_hungry_player_moves_then_eats() {
    let host = FakeHost::with_frames([room_frame("", "Dlvl:1 $:0 HP:12(12) T:5 Hungry")]);
    let mut bot = orchestrator(host);

    assert_eq!(bot.step().unwrap(), CycleOutcome::Continue);

    let sent = &bot.host_mut().sink.data;
    assert!(MOVE_KEYS.contains(&sent[0]), "unexpected move key {}", sent[0]);
    assert_eq!(&sent[1..3], b"me");
    match sent.len() {
        3 => {}
        4 => assert!(b"fghj".contains(&sent[3])),
        n => panic!("unexpected key sequence of length {n}: {sent:?}"),
    }
    assert!(!sent.contains(&b'D'));

    let summary = bot.summary();
    assert_eq!(summary.movements, 1);
    assert_eq!(summary.reactive_actions, 1);
    assert_eq!(summary.last_stats.hit_points, 12);
    assert_eq!(summary.last_stats.strength, 16);
}

#[test]
fn test_yes_no_question_takes_priority() {
    let host = FakeHost::with_frames([room_frame(
        "Really attack the newt? [yn] (n)",
        "Dlvl:1 Hungry Burdened",
    )]);
    let mut bot = orchestrator(host);
    bot.step().unwrap();

    let sent = &bot.host_mut().sink.data;
    assert_eq!(sent.len(), 2, "sent {sent:?}");
    assert!(MOVE_KEYS.contains(&sent[0]));
    assert_eq!(sent[1], b'n');
}

#[test]
fn test_more_prompt_is_dismissed() {
    let host = FakeHost::with_frames([room_frame("You hear a door open.--More--", "Dlvl:1")]);
    let mut bot = orchestrator(host);
    bot.step().unwrap();

    let sent = &bot.host_mut().sink.data;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], b' ');
}

#[test]
fn test_no_player_no_actions() {
    let host = FakeHost::with_frames([frame(&[(0, "Things that are here:"), (23, "Hungry")])]);
    let mut bot = orchestrator(host);
    bot.step().unwrap();

    assert!(bot.host_mut().sink.data.is_empty());
    assert_eq!(bot.summary().movements, 0);
    assert_eq!(bot.summary().reactive_actions, 0);
    assert_eq!(bot.table().valued_cells(), 0);
}

#[test]
fn test_naming_prompt_gets_random_name() {
    let host = FakeHost::with_frames([frame(&[(0, "Call a scroll labeled FOOBIE BLETCH:")])]);
    let mut bot = orchestrator(host);
    bot.step().unwrap();

    let expected = prompt_keystrokes(
        PromptResponse::TypeName { marker: "Call a" },
        &mut BotRng::new(7),
    );
    assert_eq!(bot.host_mut().sink.data, expected);
    assert_eq!(bot.summary().prompt_responses, 1);
}

#[test]
fn test_selection_prompt_is_cancelled() {
    let host = FakeHost::with_frames([frame(&[(0, "What do you want to drop? [$a or ?*]")])]);
    let mut bot = orchestrator(host);
    bot.step().unwrap();
    assert_eq!(bot.host_mut().sink.data, b" \n");
}

#[test]
fn test_write_failure_ends_session() {
    let mut host = FakeHost::with_frames([room_frame("", "Dlvl:1")]);
    host.sink.fail = true;
    let mut bot = orchestrator(host);

    let err = bot.step().unwrap_err();
    assert!(matches!(err, SessionError::Dispatch(_)));
}

#[test]
fn test_exit_when_game_is_gone() {
    let mut bot = orchestrator(FakeHost::default());
    assert_eq!(bot.step().unwrap(), CycleOutcome::Exited);
}

#[test]
fn test_run_until_exit() {
    let frames = (0..3).map(|_| room_frame("", "Dlvl:1 T:1"));
    let mut bot = orchestrator(FakeHost::with_frames(frames));

    let summary = bot.run().unwrap();
    // three frames, then one cycle that notices the exit
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.movements, 3);

    let sent = &bot.host_mut().sink.data;
    assert_eq!(&sent[..2], b"  ");
    assert_eq!(sent.len(), 2 + 3);
}

#[test]
fn test_cycle_limit() {
    let frames = (0..10).map(|_| room_frame("", "Dlvl:1"));
    let mut config = test_config();
    config.session.max_cycles = Some(2);
    let mut bot = Orchestrator::new(
        FakeHost::with_frames(frames),
        FakeTerminal::new(),
        &config,
        BotRng::new(1),
    );

    let summary = bot.run().unwrap();
    assert_eq!(summary.cycles, 2);
}

#[test]
fn test_observer_gets_full_grid_every_cycle() {
    let observed = SharedBuf::default();
    let frames = (0..2).map(|_| room_frame("", "Dlvl:1"));
    let mut bot =
        orchestrator(FakeHost::with_frames(frames)).with_observer(Box::new(observed.clone()));

    bot.step().unwrap();
    bot.step().unwrap();

    let bytes = observed.0.borrow();
    assert_eq!(bytes.len(), 2 * SCREEN_CELLS);
    assert_eq!(&bytes[..SCREEN_CELLS], bot.screen().chars());
}

#[test]
fn test_read_errors_are_counted_and_survived() {
    let mut host = FakeHost::default();
    host.script.push_back(Err(io::Error::other("EIO")));
    host.script.push_back(Ok(room_frame("", "Dlvl:1")));
    let mut bot = orchestrator(host);

    assert_eq!(bot.step().unwrap(), CycleOutcome::Continue);
    assert_eq!(bot.summary().read_errors, 1);
    assert_eq!(bot.summary().movements, 0);

    assert_eq!(bot.step().unwrap(), CycleOutcome::Continue);
    assert_eq!(bot.summary().movements, 1);
}

#[test]
fn test_state_log_is_json_lines() {
    let log = SharedBuf::default();
    let frames = (0..2).map(|_| room_frame("", "Dlvl:2 $:15 T:9"));
    let mut bot = orchestrator(FakeHost::with_frames(frames)).with_state_log(Box::new(log.clone()));

    bot.step().unwrap();
    bot.step().unwrap();

    let text = String::from_utf8(log.0.borrow().clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let record: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(record["cycle"], 2);
    assert_eq!(record["snapshot"]["stats"]["gold"], 15);
    assert_eq!(record["snapshot"]["stats"]["dungeon_level"], 2);
    assert!(record["player"].is_object());
}

#[test]
fn test_learning_persists_across_cycles() {
    let frames = (0..2).map(|_| room_frame("", "Dlvl:1"));
    let mut bot = orchestrator(FakeHost::with_frames(frames));

    bot.step().unwrap();
    let valued = bot.table().valued_cells();
    assert!(valued > 0);

    bot.step().unwrap();
    assert!(bot.table().valued_cells() >= valued);
}

#[test]
fn test_quiet_cycle_acts_on_last_screen() {
    let mut host = FakeHost::with_frames([room_frame("", "Dlvl:1 Hungry")]);
    host.linger = true;
    let mut bot = orchestrator(host);

    bot.step().unwrap();
    let bytes_read = bot.summary().bytes_read;
    // no new output, the game is still running
    assert_eq!(bot.step().unwrap(), CycleOutcome::Continue);

    let summary = bot.summary();
    assert_eq!(summary.bytes_read, bytes_read);
    assert_eq!(summary.movements, 2);
    assert_eq!(summary.reactive_actions, 2);
    // the snapshot comes from the quiet cycle's own interpretation
    assert!(bot.snapshot().status.hungry);
    assert!(bot.snapshot().player.is_some());

    bot.host_mut().terminate();
    assert_eq!(bot.step().unwrap(), CycleOutcome::Exited);
}

//! The supervised game process
//!
//! - `pty`: the game on a pseudoterminal
//! - `shutdown`: SIGINT/SIGTERM forwarding to the game

pub mod pty;
pub mod shutdown;

use std::io::{self, Write};
use std::time::Duration;

pub use pty::PtyHost;

/// A running game the orchestrator can read from and type into
pub trait GameHost {
    /// Wait up to `timeout` for output; `Ok(true)` when bytes are ready
    fn wait_for_output(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read whatever output is available
    fn read_output(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Whether the game process still exists
    fn is_running(&mut self) -> bool;

    /// Sink for keystrokes
    fn keystrokes(&mut self) -> &mut dyn Write;

    /// Stop the game, best effort
    fn terminate(&mut self);
}

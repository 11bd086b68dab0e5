//! Forward SIGINT/SIGTERM to the game so it never outlives the bot

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};

use tracing::debug;

/// Process id of the game, 0 while no game is registered
static GAME_PID: AtomicI32 = AtomicI32::new(0);

extern "C" fn on_signal(_signum: libc::c_int) {
    let pid = GAME_PID.load(Ordering::SeqCst);
    if pid > 0 {
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }
    }
}

/// Register `pid` as the game and install the forwarding handler.
///
/// The bot keeps running after the signal; the game exits, and the next
/// cycle sees the child gone and ends the session normally.
pub fn install_shutdown_handler(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    GAME_PID.store(pid, Ordering::SeqCst);

    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    debug!(pid, "shutdown handler installed");
    Ok(())
}

/// Forget the registered game; later signals do nothing
pub fn clear_shutdown_target() {
    GAME_PID.store(0, Ordering::SeqCst);
}

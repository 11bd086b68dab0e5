//! The game attached to a pseudoterminal

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::ptr;
use std::thread;
use std::time::{Duration, Instant};

use nhbot_core::{SCREEN_HEIGHT, SCREEN_WIDTH};
use tracing::{debug, info, warn};

use super::GameHost;
use crate::config::GameConfig;
use crate::error::SessionError;

/// How long [`PtyHost::terminate`] waits after SIGTERM before killing
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Open a pty pair sized to the emulated screen, returning (master, slave)
fn open_pty(rows: usize, cols: usize) -> io::Result<(File, File)> {
    let mut master: libc::c_int = -1;
    let mut slave: libc::c_int = -1;
    let mut size = libc::winsize {
        ws_row: rows as libc::c_ushort,
        ws_col: cols as libc::c_ushort,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let rc = unsafe {
        libc::openpty(
            &mut master,
            &mut slave,
            ptr::null_mut(),
            ptr::null_mut(),
            &mut size,
        )
    };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: openpty just handed us both descriptors and nothing else owns them
    let (master, slave) = unsafe { (File::from_raw_fd(master), File::from_raw_fd(slave)) };
    set_cloexec(&master)?;
    set_cloexec(&slave)?;
    Ok((master, slave))
}

/// Keep a descriptor out of the game; its stdio gets dup'd copies instead
fn set_cloexec(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// A child process whose stdio is the slave side of a pty
pub struct PtyHost {
    child: Child,
    master: File,
    exited: bool,
}

impl PtyHost {
    /// Start the game. Its environment is exactly `TERM` and `NETHACKOPTIONS`.
    pub fn spawn(game: &GameConfig) -> Result<Self, SessionError> {
        Self::try_spawn(game).map_err(|source| SessionError::Spawn {
            path: game.path.clone(),
            source,
        })
    }

    fn try_spawn(game: &GameConfig) -> io::Result<Self> {
        let (master, slave) = open_pty(SCREEN_HEIGHT, SCREEN_WIDTH)?;

        let mut cmd = Command::new(&game.path);
        cmd.args(&game.args)
            .env_clear()
            .env("TERM", &game.term)
            .env("NETHACKOPTIONS", &game.options)
            .stdin(Stdio::from(slave.try_clone()?))
            .stdout(Stdio::from(slave.try_clone()?))
            .stderr(Stdio::from(slave));

        // SAFETY: only async-signal-safe calls between fork and exec
        unsafe {
            cmd.pre_exec(|| {
                if unsafe { libc::setsid() } == -1 {
                    return Err(io::Error::last_os_error());
                }
                if unsafe { libc::ioctl(0, libc::TIOCSCTTY, 0) } == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = cmd.spawn()?;
        info!(pid = child.id(), path = %game.path.display(), "game started");

        Ok(Self {
            child,
            master,
            exited: false,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl GameHost for PtyHost {
    fn wait_for_output(&mut self, timeout: Duration) -> io::Result<bool> {
        let mut fds = libc::pollfd {
            fd: self.master.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let rc = unsafe { libc::poll(&mut fds, 1, millis) };
        if rc == -1 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(rc > 0 && fds.revents & (libc::POLLIN | libc::POLLHUP) != 0)
    }

    fn read_output(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.master.read(buf)
    }

    fn is_running(&mut self) -> bool {
        if self.exited {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                info!(%status, "game exited");
                self.exited = true;
                false
            }
            Err(err) => {
                warn!(%err, "could not query game process");
                false
            }
        }
    }

    fn keystrokes(&mut self) -> &mut dyn Write {
        &mut self.master
    }

    fn terminate(&mut self) {
        if !self.is_running() {
            return;
        }
        let pid = self.child.id() as libc::pid_t;
        debug!(pid, "sending SIGTERM to game");
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }

        let deadline = Instant::now() + TERMINATE_GRACE;
        while Instant::now() < deadline {
            if !self.is_running() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }

        warn!(pid, "game ignored SIGTERM, killing it");
        if let Err(err) = self.child.kill() {
            warn!(%err, "kill failed");
        }
        if let Err(err) = self.child.wait() {
            warn!(%err, "wait failed");
        }
        self.exited = true;
    }
}

impl Drop for PtyHost {
    fn drop(&mut self) {
        self.terminate();
    }
}

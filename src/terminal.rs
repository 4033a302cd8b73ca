use std::io;
use std::os::unix::io::RawFd;
use std::sync::OnceLock;

use log::{debug, warn};
use nix::libc;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use termios::{tcsetattr, Termios, ECHO, ICANON, TCSANOW};

const STDIN_FILENO: RawFd = 0;
const STDOUT_FILENO: RawFd = 1;

/// Exit status after Ctrl-C, `-2` as seen by the shell.
pub const INTERRUPT_EXIT_CODE: i32 = 254;

// Settings from before raw mode, shared with the SIGINT handler.
static SAVED: OnceLock<Termios> = OnceLock::new();

/// Keeps stdin in cbreak/no-echo mode while alive.
pub struct RawMode {
    fd: RawFd,
    original: Option<Termios>,
}

impl RawMode {
    /// Enters raw mode on stdin and installs the SIGINT handler. When stdin is
    /// not a terminal only the handler is installed.
    pub fn enter() -> io::Result<Self> {
        install_interrupt_handler()?;

        let fd = STDIN_FILENO;
        let original = match Termios::from_fd(fd) {
            Ok(t) => t,
            Err(e) => {
                warn!("stdin is not a terminal ({}), leaving input buffered", e);
                return Ok(RawMode { fd, original: None });
            }
        };

        let _ = SAVED.set(original);

        let mut raw = original;
        raw.c_lflag &= !(ICANON | ECHO);
        tcsetattr(fd, TCSANOW, &raw)?;
        debug!("entered raw mode");

        Ok(RawMode {
            fd,
            original: Some(original),
        })
    }

    pub fn restore(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = tcsetattr(self.fd, TCSANOW, &original) {
                warn!("failed to restore terminal: {}", e);
            } else {
                debug!("restored terminal mode");
            }
        }
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        self.restore();
    }
}

fn install_interrupt_handler() -> io::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_interrupt),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGINT, &action) }.map_err(io::Error::from)?;
    Ok(())
}

extern "C" fn handle_interrupt(_: libc::c_int) {
    if let Some(original) = SAVED.get() {
        let _ = tcsetattr(STDIN_FILENO, TCSANOW, original);
    }
    let _ = nix::unistd::write(STDOUT_FILENO, b"\n");
    unsafe { libc::_exit(INTERRUPT_EXIT_CODE) };
}

use std::collections::VecDeque;
use std::io::{self, stdin, stdout, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Mutex;

use nix::errno::Errno;
use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};
use nix::unistd;

/// Host side of the keyboard and console the guest talks to.
pub trait Console: Send + Sync {
    /// Non-blocking, true if at least one byte can be read.
    fn key_ready(&self) -> bool;

    /// Blocks for one byte. End of input reads as `0`.
    fn read_byte(&self) -> io::Result<u8>;

    fn write_byte(&self, val: u8) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;
}

////////////////////////////////////////////////////////////////////////////////

/// Keys come straight off the input descriptor, unbuffered, so `key_ready`
/// never misses bytes already taken from the kernel.
#[derive(Clone, Copy)]
pub struct StdConsole {
    input: RawFd,
}

impl Default for StdConsole {
    fn default() -> Self {
        StdConsole {
            input: stdin().as_raw_fd(),
        }
    }
}

impl StdConsole {
    pub fn from_fd(input: RawFd) -> Self {
        StdConsole { input }
    }
}

impl Console for StdConsole {
    fn key_ready(&self) -> bool {
        let mut readfds = FdSet::new();
        readfds.insert(self.input);

        match select(None, &mut readfds, None, None, &mut TimeVal::zero()) {
            Ok(value) => value == 1,
            Err(_) => false,
        }
    }

    fn read_byte(&self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            match unistd::read(self.input, &mut buf) {
                Ok(0) => return Ok(0),
                Ok(_) => return Ok(buf[0]),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write_byte(&self, val: u8) -> io::Result<()> {
        stdout().lock().write_all(&[val])
    }

    fn flush(&self) -> io::Result<()> {
        stdout().lock().flush()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// In-memory console: input is scripted up front, output is captured.
#[derive(Default)]
pub struct PipeConsole {
    out_buf: Mutex<Vec<u8>>,
    in_buf: Mutex<VecDeque<u8>>,
}

impl PipeConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(vals: &[u8]) -> Self {
        let console = Self::default();
        console.write_input(vals);
        console
    }

    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut *lock(&self.out_buf))
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&lock(&self.out_buf)).into_owned()
    }

    pub fn write_input(&self, vals: &[u8]) {
        lock(&self.in_buf).extend(vals.iter().copied());
    }
}

impl Console for PipeConsole {
    fn key_ready(&self) -> bool {
        !lock(&self.in_buf).is_empty()
    }

    fn read_byte(&self) -> io::Result<u8> {
        Ok(lock(&self.in_buf).pop_front().unwrap_or(0))
    }

    fn write_byte(&self, val: u8) -> io::Result<()> {
        lock(&self.out_buf).push(val);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

// A poisoned buffer still holds valid bytes.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_console_round_trips_bytes() {
        let console = PipeConsole::with_input(b"ab");
        assert!(console.key_ready());
        assert_eq!(console.read_byte().unwrap(), b'a');
        assert_eq!(console.read_byte().unwrap(), b'b');
        assert!(!console.key_ready());

        console.write_byte(b'x').unwrap();
        console.write_byte(b'y').unwrap();
        assert_eq!(console.take_output(), b"xy");
        assert!(console.take_output().is_empty());
    }

    #[test]
    fn std_console_sees_bytes_left_after_a_read() {
        let (rx, tx) = unistd::pipe().unwrap();
        unistd::write(tx, b"ab").unwrap();

        let console = StdConsole::from_fd(rx);
        assert!(console.key_ready());
        assert_eq!(console.read_byte().unwrap(), b'a');
        assert!(console.key_ready());
        assert_eq!(console.read_byte().unwrap(), b'b');
        assert!(!console.key_ready());

        unistd::close(tx).unwrap();
        assert_eq!(console.read_byte().unwrap(), 0);
        unistd::close(rx).unwrap();
    }

    #[test]
    fn exhausted_input_reads_as_zero() {
        let console = PipeConsole::new();
        assert_eq!(console.read_byte().unwrap(), 0);
    }
}

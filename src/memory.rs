use std::io;

use crate::console::Console;
use crate::{KBDR, KBSR};

pub const MEMORY_SIZE: usize = u16::MAX as usize + 1;

const KEY_READY: u16 = 1 << 15;

/// Flat 64K-word address space. The keyboard registers live at `KBSR` and
/// `KBDR`; everything else is plain RAM.
pub struct Memory(Box<[u16]>);

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory(vec![0; MEMORY_SIZE].into_boxed_slice())
    }

    /// Guest-visible load. Reading `KBSR` polls the console and latches the
    /// pending key into `KBDR`.
    pub fn read(&mut self, addr: u16, console: &dyn Console) -> io::Result<u16> {
        if addr == KBSR {
            if console.key_ready() {
                self.0[KBSR as usize] = KEY_READY;
                self.0[KBDR as usize] = console.read_byte()? as u16;
            } else {
                self.0[KBSR as usize] = 0;
            }
        }
        Ok(self.0[addr as usize])
    }

    pub fn write(&mut self, addr: u16, val: u16) {
        self.0[addr as usize] = val;
    }

    /// Load without device side effects.
    pub fn peek(&self, addr: u16) -> u16 {
        self.0[addr as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::PipeConsole;

    #[test]
    fn plain_ram() {
        let console = PipeConsole::new();
        let mut mem = Memory::new();
        mem.write(0x3000, 0xbeef);
        mem.write(0xffff, 7);
        assert_eq!(mem.read(0x3000, &console).unwrap(), 0xbeef);
        assert_eq!(mem.read(0xffff, &console).unwrap(), 7);
        assert_eq!(mem.read(0x0000, &console).unwrap(), 0);
    }

    #[test]
    fn kbsr_latches_pending_key() {
        let console = PipeConsole::with_input(b"q");
        let mut mem = Memory::new();

        assert_eq!(mem.read(KBSR, &console).unwrap(), 0x8000);
        assert_eq!(mem.read(KBDR, &console).unwrap(), b'q' as u16);

        assert_eq!(mem.read(KBSR, &console).unwrap(), 0);
        assert_eq!(mem.read(KBDR, &console).unwrap(), b'q' as u16);
    }

    #[test]
    fn peek_has_no_side_effects() {
        let console = PipeConsole::with_input(b"q");
        let mut mem = Memory::new();
        assert_eq!(mem.peek(KBSR), 0);
        assert!(console.key_ready());
        assert_eq!(mem.read(KBSR, &console).unwrap(), 0x8000);
    }
}

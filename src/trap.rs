use log::{debug, warn};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::cpu::{CycleResult, CPU};
use crate::register::R;

const IN_PROMPT: &[u8] = b"Enter a character: ";
const HALT_BANNER: &[u8] = b"HALT\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u16)]
pub enum TrapVector {
    GETC = 0x20,  // read a key, no echo
    OUT = 0x21,   // write R0[7:0]
    PUTS = 0x22,  // one char per word
    IN = 0x23,    // prompt, read a key, echo
    PUTSP = 0x24, // two chars per word
    HALT = 0x25,
}

impl CPU {
    pub(crate) fn trap(&mut self, vector: u16) -> CycleResult {
        let vector = match TrapVector::from_u16(vector) {
            Some(v) => v,
            None => {
                warn!("ignoring unknown trap vector {:#04x}", vector);
                return Ok(());
            }
        };

        match vector {
            TrapVector::GETC => self.trap_getc(),
            TrapVector::OUT => self.trap_out(),
            TrapVector::PUTS => self.trap_puts(),
            TrapVector::IN => self.trap_in(),
            TrapVector::PUTSP => self.trap_putsp(),
            TrapVector::HALT => self.trap_halt(),
        }
    }

    fn trap_getc(&mut self) -> CycleResult {
        let key = self.console.read_byte()?;
        self.register.write(R::_0, key as u16);
        self.register.update_flag(R::_0);
        Ok(())
    }

    fn trap_out(&mut self) -> CycleResult {
        self.console.write_byte(self.register.read(R::_0) as u8)?;
        self.console.flush()?;
        Ok(())
    }

    fn trap_puts(&mut self) -> CycleResult {
        let mut addr = self.register.read(R::_0);
        loop {
            let word = self.memory.peek(addr);
            if word == 0 {
                break;
            }
            self.console.write_byte(word as u8)?;
            addr = addr.wrapping_add(1);
        }
        self.console.flush()?;
        Ok(())
    }

    fn trap_in(&mut self) -> CycleResult {
        for &c in IN_PROMPT {
            self.console.write_byte(c)?;
        }
        self.console.flush()?;

        let key = self.console.read_byte()?;
        self.console.write_byte(key)?;
        self.console.flush()?;

        self.register.write(R::_0, key as u16);
        self.register.update_flag(R::_0);
        Ok(())
    }

    fn trap_putsp(&mut self) -> CycleResult {
        let mut addr = self.register.read(R::_0);
        loop {
            let word = self.memory.peek(addr);
            if word == 0 {
                break;
            }
            let [lo, hi] = word.to_le_bytes();
            self.console.write_byte(lo)?;
            if hi != 0 {
                self.console.write_byte(hi)?;
            }
            addr = addr.wrapping_add(1);
        }
        self.console.flush()?;
        Ok(())
    }

    fn trap_halt(&mut self) -> CycleResult {
        for &c in HALT_BANNER {
            self.console.write_byte(c)?;
        }
        self.console.flush()?;
        debug!("halted at {:#06x}", self.register.read(R::PC));
        self.halted = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::console::PipeConsole;
    use crate::register::Flag;
    use crate::PC_START;

    fn cpu_with(console: &Arc<PipeConsole>, instr: u16) -> CPU {
        let mut cpu = CPU::new(console.clone());
        cpu.mem_write(PC_START, instr);
        cpu.reg_store(R::PC, PC_START);
        cpu
    }

    #[test]
    fn trap_saves_return_address() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf021);
        cpu.tick().unwrap();
        assert_eq!(cpu.reg_load(R::_7), 0x3001);
        assert_eq!(cpu.reg_load(R::PC), 0x3001);
    }

    #[test]
    fn getc_reads_without_echo() {
        let console = Arc::new(PipeConsole::with_input(b"k"));
        let mut cpu = cpu_with(&console, 0xf020);
        cpu.tick().unwrap();
        assert_eq!(cpu.reg_load(R::_0), b'k' as u16);
        assert_eq!(cpu.flag().unwrap(), Flag::Positive);
        assert!(console.take_output().is_empty());
    }

    #[test]
    fn getc_at_end_of_input_is_zero() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf020);
        cpu.reg_store(R::_0, 9);
        cpu.tick().unwrap();
        assert_eq!(cpu.reg_load(R::_0), 0);
        assert_eq!(cpu.flag().unwrap(), Flag::Zero);
    }

    #[test]
    fn out_writes_low_byte() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf021);
        cpu.reg_store(R::_0, 0x1241);
        cpu.tick().unwrap();
        assert_eq!(console.take_output(), b"A");
    }

    #[test]
    fn puts_writes_until_zero_word() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf022);
        cpu.reg_store(R::_0, 0x4000);
        for (i, w) in [0x48, 0x49, 0x21, 0x0000].iter().enumerate() {
            cpu.mem_write(0x4000 + i as u16, *w);
        }
        cpu.tick().unwrap();
        assert_eq!(console.take_output(), b"HI!");
    }

    #[test]
    fn in_prompts_and_echoes() {
        let console = Arc::new(PipeConsole::with_input(b"z"));
        let mut cpu = cpu_with(&console, 0xf023);
        cpu.tick().unwrap();
        assert_eq!(cpu.reg_load(R::_0), b'z' as u16);
        assert_eq!(console.output_string(), "Enter a character: z");
    }

    #[test]
    fn putsp_unpacks_two_chars_per_word() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf024);
        cpu.reg_store(R::_0, 0x4000);
        cpu.mem_write(0x4000, u16::from_le_bytes(*b"he"));
        cpu.mem_write(0x4001, u16::from_le_bytes(*b"ll"));
        cpu.mem_write(0x4002, b'o' as u16);
        cpu.mem_write(0x4003, 0);
        cpu.tick().unwrap();
        assert_eq!(console.take_output(), b"hello");
    }

    #[test]
    fn halt_stops_the_cpu() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf025);
        assert!(!cpu.is_halted());
        cpu.tick().unwrap();
        assert!(cpu.is_halted());
        assert_eq!(console.output_string(), "HALT\n");
    }

    #[test]
    fn unknown_vector_is_ignored() {
        let console = Arc::new(PipeConsole::new());
        let mut cpu = cpu_with(&console, 0xf0ff);
        cpu.set_flag(Flag::Negative);
        cpu.tick().unwrap();
        assert!(!cpu.is_halted());
        assert_eq!(cpu.reg_load(R::PC), 0x3001);
        assert_eq!(cpu.flag().unwrap(), Flag::Negative);
    }
}

use std::sync::Arc;

use log::trace;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::convert::{TryFrom, TryInto};

use crate::console::Console;
use crate::memory::Memory;
use crate::register::{Flag, Register, R};
use crate::{bit, reg_1st, reg_2nd, reg_3rd, sign_extend, Error};

pub type CycleResult = Result<(), Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u16)]
pub enum OpCode {
    BR,   // 0000
    ADD,  // 0001
    LD,   // 0010
    ST,   // 0011
    JSR,  // 0100
    AND,  // 0101
    LDR,  // 0110
    STR,  // 0111
    RTI,  // 1000
    NOT,  // 1001
    LDI,  // 1010
    STI,  // 1011
    JMP,  // 1100 // JMP R7 == RET
    RES,  // 1101 // reserved
    LEA,  // 1110
    TRAP, // 1111
}

impl TryFrom<u16> for OpCode {
    type Error = Error;

    fn try_from(val: u16) -> Result<Self, Self::Error> {
        OpCode::from_u16(val).ok_or(Error::UnknownOpcode(val))
    }
}

pub struct CPU {
    pub(crate) register: Register,
    pub(crate) memory: Memory,
    pub(crate) console: Arc<dyn Console>,
    pub(crate) halted: bool,
}

impl CPU {
    pub fn new(console: Arc<dyn Console>) -> Self {
        CPU {
            register: Register::new(),
            memory: Memory::new(),
            console,
            halted: false,
        }
    }

    /// Runs one fetch/decode/execute cycle.
    pub fn tick(&mut self) -> CycleResult {
        let addr = self.register.read_incr(R::PC);
        let instr: u16 = self.mem_read(addr)?;
        let opcode: OpCode = (instr >> 12).try_into()?;
        trace!("{:#06x}: {:#06x} {:?}", addr, instr, opcode);

        match opcode {
            OpCode::BR => self.mnemonic_br(instr)?,
            OpCode::ADD => self.mnemonic_add(instr)?,
            OpCode::LD => self.mnemonic_ld(instr)?,
            OpCode::ST => self.mnemonic_st(instr)?,
            OpCode::JSR => self.mnemonic_jsr(instr)?,
            OpCode::AND => self.mnemonic_and(instr)?,
            OpCode::LDR => self.mnemonic_ldr(instr)?,
            OpCode::STR => self.mnemonic_str(instr)?,
            OpCode::NOT => self.mnemonic_not(instr)?,
            OpCode::LDI => self.mnemonic_ldi(instr)?,
            OpCode::STI => self.mnemonic_sti(instr)?,
            OpCode::JMP => self.mnemonic_jmp(instr)?,
            OpCode::LEA => self.mnemonic_lea(instr)?,
            OpCode::TRAP => self.mnemonic_trap(instr)?,
            OpCode::RTI | OpCode::RES => return Err(Error::IllegalOpcode(opcode)),
        }

        Ok(())
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn reg_store(&mut self, r: R, val: u16) {
        self.register.write(r, val);
    }

    pub fn reg_load(&self, r: R) -> u16 {
        self.register.read(r)
    }

    pub fn flag(&self) -> Result<Flag, Error> {
        self.register.get_flag()
    }

    pub fn set_flag(&mut self, f: Flag) {
        self.register.set_flag(f);
    }

    pub fn mem_read(&mut self, addr: u16) -> Result<u16, Error> {
        Ok(self.memory.read(addr, self.console.as_ref())?)
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        self.memory.write(addr, val);
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    fn pc_relative(&self, args: u16) -> u16 {
        self.register
            .read(R::PC)
            .wrapping_add(sign_extend(args, 9))
    }

    fn base_relative(&self, args: u16) -> Result<u16, Error> {
        let base: R = reg_2nd(args)?;
        Ok(self.register.read(base).wrapping_add(sign_extend(args, 6)))
    }

    fn mnemonic_br(&mut self, args: u16) -> CycleResult {
        let n: bool = bit(args, 11) == 1;
        let z: bool = bit(args, 10) == 1;
        let p: bool = bit(args, 9) == 1;

        let flag = self.register.get_flag()?;

        if (n && flag == Flag::Negative)
            || (z && flag == Flag::Zero)
            || (p && flag == Flag::Positive)
        {
            self.register.write(R::PC, self.pc_relative(args));
        }

        Ok(())
    }

    fn mnemonic_imm5_or_sr2<F>(&mut self, args: u16, func: F) -> CycleResult
    where
        F: Fn(u16, u16) -> u16,
    {
        let r0: R = reg_1st(args)?;
        let r1: R = reg_2nd(args)?;
        let imm_flag: u16 = bit(args, 5);

        if imm_flag == 1 {
            self.register
                .write(r0, func(self.register.read(r1), sign_extend(args, 5)));
        } else {
            let r2: R = reg_3rd(args)?;
            self.register
                .write(r0, func(self.register.read(r1), self.register.read(r2)));
        }
        self.register.update_flag(r0);
        Ok(())
    }

    fn mnemonic_add(&mut self, args: u16) -> CycleResult {
        self.mnemonic_imm5_or_sr2(args, |r1, r2| r1.wrapping_add(r2))
    }

    fn mnemonic_and(&mut self, args: u16) -> CycleResult {
        self.mnemonic_imm5_or_sr2(args, |r1, r2| r1 & r2)
    }

    fn mnemonic_not(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        let r1: R = reg_2nd(args)?;
        self.register.write(r0, !self.register.read(r1));
        self.register.update_flag(r0);
        Ok(())
    }

    fn mnemonic_ld(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        let val = self.mem_read(self.pc_relative(args))?;
        self.register.write(r0, val);
        self.register.update_flag(r0);
        Ok(())
    }

    fn mnemonic_ldi(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        let addr = self.mem_read(self.pc_relative(args))?;
        let val = self.mem_read(addr)?;
        self.register.write(r0, val);
        self.register.update_flag(r0);
        Ok(())
    }

    fn mnemonic_ldr(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        let addr = self.base_relative(args)?;
        let val = self.mem_read(addr)?;
        self.register.write(r0, val);
        self.register.update_flag(r0);
        Ok(())
    }

    fn mnemonic_lea(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        self.register.write(r0, self.pc_relative(args));
        self.register.update_flag(r0);
        Ok(())
    }

    fn mnemonic_st(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        self.mem_write(self.pc_relative(args), self.register.read(r0));
        Ok(())
    }

    fn mnemonic_sti(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        let addr = self.mem_read(self.pc_relative(args))?;
        self.mem_write(addr, self.register.read(r0));
        Ok(())
    }

    fn mnemonic_str(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_1st(args)?;
        let addr = self.base_relative(args)?;
        self.mem_write(addr, self.register.read(r0));
        Ok(())
    }

    fn mnemonic_jmp(&mut self, args: u16) -> CycleResult {
        let r0: R = reg_2nd(args)?;
        self.register.write(R::PC, self.register.read(r0));
        Ok(())
    }

    fn mnemonic_jsr(&mut self, args: u16) -> CycleResult {
        let mode = bit(args, 11);

        self.register.write(R::_7, self.register.read(R::PC));

        if mode == 1 {
            self.register.write(
                R::PC,
                self.register
                    .read(R::_7)
                    .wrapping_add(sign_extend(args, 11)),
            );
            return Ok(());
        }

        let r0: R = reg_2nd(args)?;
        self.register.write(R::PC, self.register.read(r0));
        Ok(())
    }

    fn mnemonic_trap(&mut self, args: u16) -> CycleResult {
        self.register.write(R::_7, self.register.read(R::PC));
        self.trap(args & 0x00ff)
    }
}

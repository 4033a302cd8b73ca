pub mod console;
pub mod cpu;
pub mod error;
pub mod image;
pub mod memory;
pub mod register;
pub mod terminal;
pub mod trap;
pub mod vm;

pub use error::{Error, Result};

use register::R;
use std::convert::TryInto;

/// Default entry address of user programs.
pub const PC_START: u16 = 0x3000;

/// Keyboard status register, bit 15 set when a key is waiting.
pub const KBSR: u16 = 0xfe00;
/// Keyboard data register.
pub const KBDR: u16 = 0xfe02;

pub fn reg_1st(instr: u16) -> Result<R> {
    ((instr >> 9) & 0x7).try_into()
}

pub fn reg_2nd(instr: u16) -> Result<R> {
    ((instr >> 6) & 0x7).try_into()
}

pub fn reg_3rd(instr: u16) -> Result<R> {
    (instr & 0x7).try_into()
}

pub fn bit(args: u16, nth: u16) -> u16 {
    (args >> nth) & 0x1
}

/// Widens the low `bitcount` bits of `x` to 16 bits, two's complement.
/// Bits above `bitcount` in `x` are ignored.
pub fn sign_extend(x: u16, bitcount: u16) -> u16 {
    let x = x & (0xffff >> (16 - bitcount));
    if bit(x, bitcount - 1) == 1 {
        x | 0xffff << bitcount
    } else {
        x
    }
}

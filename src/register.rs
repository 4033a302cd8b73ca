use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::convert::{TryFrom, TryInto};

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u16)]
pub enum R {
    _0,
    _1,
    _2,
    _3,
    _4,
    _5,
    _6,
    _7,
    PC,
    COND,
}

impl TryFrom<u16> for R {
    type Error = Error;

    fn try_from(val: u16) -> Result<Self, Self::Error> {
        R::from_u16(val).ok_or(Error::InvalidRegister(val))
    }
}

#[derive(Clone, Copy, Debug, FromPrimitive, PartialEq, Eq)]
#[repr(u16)]
pub enum Flag {
    Positive = 1 << 0,
    Zero = 1 << 1,
    Negative = 1 << 2,
}

impl TryFrom<u16> for Flag {
    type Error = Error;

    fn try_from(val: u16) -> Result<Self, Self::Error> {
        Flag::from_u16(val).ok_or(Error::InvalidFlag(val))
    }
}

/// R0-R7, PC and COND. COND always holds exactly one of N, Z, P.
pub struct Register([u16; 10]);

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

impl Register {
    pub fn new() -> Self {
        let mut register = Register([0; 10]);
        register.set_flag(Flag::Zero);
        register
    }

    pub fn write(&mut self, r: R, val: u16) {
        self.0[r as usize] = val;
    }

    pub fn read(&self, r: R) -> u16 {
        self.0[r as usize]
    }

    pub fn read_incr(&mut self, r: R) -> u16 {
        let val = self.read(r);
        self.incr(r);
        val
    }

    pub fn update_flag(&mut self, r: R) {
        match self.0[r as usize] {
            0 => self.set_flag(Flag::Zero),
            x if x >> 15 == 1 => self.set_flag(Flag::Negative),
            _ => self.set_flag(Flag::Positive),
        }
    }

    pub fn set_flag(&mut self, f: Flag) {
        self.write(R::COND, f as u16);
    }

    pub fn get_flag(&self) -> Result<Flag, Error> {
        self.read(R::COND).try_into()
    }

    pub fn incr(&mut self, r: R) {
        self.write(r, self.read(r).wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_zero_flag() {
        let reg = Register::new();
        assert_eq!(reg.get_flag().unwrap(), Flag::Zero);
        assert_eq!(reg.read(R::COND).count_ones(), 1);
    }

    #[test]
    fn update_flag_tracks_sign() {
        let mut reg = Register::new();

        reg.write(R::_2, 0x8000);
        reg.update_flag(R::_2);
        assert_eq!(reg.get_flag().unwrap(), Flag::Negative);

        reg.write(R::_2, 0x7fff);
        reg.update_flag(R::_2);
        assert_eq!(reg.get_flag().unwrap(), Flag::Positive);

        reg.write(R::_2, 0);
        reg.update_flag(R::_2);
        assert_eq!(reg.get_flag().unwrap(), Flag::Zero);
    }

    #[test]
    fn read_incr_wraps() {
        let mut reg = Register::new();
        reg.write(R::PC, 0xffff);
        assert_eq!(reg.read_incr(R::PC), 0xffff);
        assert_eq!(reg.read(R::PC), 0);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        assert!(matches!(R::try_from(10), Err(Error::InvalidRegister(10))));
        assert!(matches!(Flag::try_from(3), Err(Error::InvalidFlag(3))));
    }
}

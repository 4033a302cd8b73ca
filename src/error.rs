use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cpu::OpCode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("console i/o: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load image {}: {source}", .path.display())]
    Image { path: PathBuf, source: io::Error },

    #[error("image has no origin word")]
    EmptyImage,

    #[error("illegal opcode {0:?}")]
    IllegalOpcode(OpCode),

    #[error("register index out of bound: {0}")]
    InvalidRegister(u16),

    #[error("wrong condition flag `{0}`")]
    InvalidFlag(u16),

    #[error("unknown opcode `{0}`")]
    UnknownOpcode(u16),
}

pub type Result<T> = std::result::Result<T, Error>;

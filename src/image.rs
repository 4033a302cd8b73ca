use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::memory::Memory;
use crate::{Error, Result};

/// Copies a big-endian image into memory. The first word is the origin;
/// words that would land past 0xFFFF are dropped, as is a trailing odd byte.
/// Returns the origin.
pub fn load_image_bytes(memory: &mut Memory, bytes: &[u8]) -> Result<u16> {
    let mut words = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));

    let origin = words.next().ok_or(Error::EmptyImage)?;
    let mut count = 0;
    for (addr, word) in (origin..=u16::MAX).zip(words) {
        memory.write(addr, word);
        count += 1;
    }

    debug!("loaded {} words at {:#06x}", count, origin);
    Ok(origin)
}

pub fn load_image<P: AsRef<Path>>(memory: &mut Memory, path: P) -> Result<u16> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} ({} bytes)", path.display(), bytes.len());
    load_image_bytes(memory, &bytes).map_err(|e| match e {
        Error::EmptyImage => Error::Image {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "no origin word"),
        },
        e => e,
    })
}

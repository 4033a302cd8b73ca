use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::console::{Console, StdConsole};
use crate::cpu::CPU;
use crate::image::{load_image, load_image_bytes};
use crate::register::{Flag, R};
use crate::{Result, PC_START};

pub struct Args {
    pub images: Vec<PathBuf>,
    pub offset: u16,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            images: Vec::new(),
            offset: PC_START,
        }
    }
}

pub struct VM {
    cpu: CPU,
    running: bool,
}

impl Default for VM {
    fn default() -> Self {
        VM::new(Arc::new(StdConsole::default()))
    }
}

impl VM {
    pub fn new(console: Arc<dyn Console>) -> Self {
        VM {
            cpu: CPU::new(console),
            running: false,
        }
    }

    /// Loads every image in order, later ones overwriting earlier ones, then
    /// points PC at the entry address.
    pub fn boot(&mut self, args: Args) -> Result<()> {
        for image in &args.images {
            self.load(image)?;
        }
        self.start_at(args.offset);
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<u16> {
        load_image(self.cpu.memory_mut(), path)
    }

    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<u16> {
        load_image_bytes(self.cpu.memory_mut(), bytes)
    }

    pub fn start_at(&mut self, addr: u16) {
        self.cpu.reg_store(R::PC, addr);
        self.cpu.set_flag(Flag::Zero);
        self.running = true;
        debug!("booting at {:#06x}", addr);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn next(&mut self) -> Result<()> {
        if let Err(e) = self.cpu.tick() {
            self.abort();
            return Err(e);
        }
        if self.cpu.is_halted() {
            self.running = false;
        }
        Ok(())
    }

    /// Runs until HALT or the first fatal error.
    pub fn run(&mut self) -> Result<()> {
        while self.is_running() {
            self.next()?;
        }
        Ok(())
    }

    pub fn abort(&mut self) {
        self.running = false
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }
}

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use log::{debug, error};

use lc3::terminal::RawMode;
use lc3::vm::{Args, VM};
use lc3::{Error, PC_START};

const EXIT_BAD_IMAGE: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_ILLEGAL_OPCODE: i32 = 3;
const EXIT_IO: i32 = 4;

/// LC-3 virtual machine
#[derive(Parser)]
struct Opt {
    /// Object images to load, in order
    images: Vec<PathBuf>,

    /// Address at which to start executing
    #[arg(long, default_value_t = PC_START, value_parser = parse_addr)]
    start: u16,
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("x")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address `{}`: {}", s, e))
}

fn main() {
    env_logger::init();

    let opt = Opt::parse();
    if opt.images.is_empty() {
        println!("lc3 [image-file1] ...");
        exit(EXIT_USAGE);
    }

    let mut vm = VM::default();
    let boot = vm.boot(Args {
        images: opt.images,
        offset: opt.start,
    });
    if let Err(e) = boot {
        debug!("{}", e);
        match e {
            Error::Image { path, .. } => println!("failed to load image: {}", path.display()),
            e => println!("failed to load image: {}", e),
        }
        exit(EXIT_BAD_IMAGE);
    }

    exit(run(&mut vm));
}

fn run(vm: &mut VM) -> i32 {
    let raw = match RawMode::enter() {
        Ok(raw) => raw,
        Err(e) => {
            error!("failed to enter raw mode: {}", e);
            return EXIT_IO;
        }
    };

    let result = vm.run();
    drop(raw);

    match result {
        Ok(()) => 0,
        Err(e @ Error::IllegalOpcode(_)) => {
            error!("{}, halting...", e);
            EXIT_ILLEGAL_OPCODE
        }
        Err(e) => {
            error!("{}, halting...", e);
            EXIT_IO
        }
    }
}

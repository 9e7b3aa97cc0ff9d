//! gbcore-run -- headless driver for gb-core.
//! Loads a ROM, steps the machine, and reports what happened.

use std::process::ExitCode;

use clap::Parser;
use gb_core::Machine;

#[derive(Parser, Debug)]
#[command(name = "gbcore-run", about = "Run a Game Boy ROM headlessly against gb-core")]
struct Args {
    /// Path to a raw .gb ROM image
    rom: std::path::PathBuf,

    /// Run exactly this many machine steps
    #[arg(long, conflicts_with = "frames")]
    steps: Option<u64>,

    /// Run until approximately this many frames have elapsed (70224 T-cycles/frame)
    #[arg(long)]
    frames: Option<u64>,

    /// Print the accumulated serial log when done
    #[arg(long)]
    dump_serial: bool,

    /// env_logger filter string, e.g. "gb_core=debug"
    #[arg(long, default_value = "gb_core=info")]
    log_level: String,
}

const T_CYCLES_PER_FRAME: u64 = 154 * 456;

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new().parse_filters(&args.log_level).init();

    let mut machine = match Machine::load_rom(&args.rom) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let target_cycles = args.frames.map(|f| f * T_CYCLES_PER_FRAME);
    let target_steps = args.steps;

    let mut steps_run = 0u64;
    loop {
        if let Some(steps) = target_steps {
            if steps_run >= steps {
                break;
            }
        } else if let Some(cycles) = target_cycles {
            if machine.total_t_cycles() >= cycles {
                break;
            }
        } else if steps_run >= 1_000_000 {
            // No bound given: the core imposes none, but a headless
            // run still needs a backstop against a runaway ROM.
            break;
        }

        if let Err(err) = machine.step() {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
        steps_run += 1;
    }

    let header = machine.header();
    println!("ROM: {:?} ({:?})", header.title, header.kind);
    println!(
        "steps={steps_run} t_cycles={} pc={:#06x}",
        machine.total_t_cycles(),
        machine.cpu.regs.pc
    );

    if args.dump_serial {
        println!("--- serial log ---");
        println!("{}", machine.serial_log());
    }

    ExitCode::SUCCESS
}

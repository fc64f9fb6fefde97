//! cu8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `cu8-emu run <program>` - Run whole instruction cycles
//! - `cu8-emu step <program>` - Run single FSM transitions
//! - `cu8-emu debug <program>` - Interactive debugger
//! - `cu8-emu asm <source>` - Assemble to a .hex image
//! - `cu8-emu disasm <image>` - Disassemble a .hex image
//! - `cu8-emu demo` - Walk through the built-in sample program
//!
//! `<program>` is an `.asm` source, a `.hex` image, or `sample`.

use clap::{Parser, Subcommand};
use cu8::{Cpu, Program, RunConfig};

#[derive(Parser)]
#[command(name = "cu8-emu")]
#[command(version)]
#[command(about = "An emulator of the control unit of a simplified 8-bit microcontroller")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a number of instruction cycles
    Run {
        /// Path to the .asm or .hex file, or `sample`
        program: String,
        /// Maximum number of instruction cycles (default: 1000)
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
        /// Stop before fetching from this address (repeatable)
        #[arg(short, long = "break")]
        breakpoints: Vec<u8>,
        /// JSON run configuration; flags override its values
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Run single state transitions, printing each one
    Step {
        /// Path to the .asm or .hex file, or `sample`
        program: String,
        /// Number of transitions
        #[arg(short = 'n', long, default_value = "3")]
        count: u32,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the .asm or .hex file, or `sample`
        program: String,
    },
    /// Assemble source to a .hex image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a .hex image to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Run the built-in sample program's setup sequence
    Demo {
        /// Number of instruction cycles to show
        #[arg(short = 'n', long, default_value = "12")]
        cycles: u32,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, json, breakpoints, config }) => {
            let mut cfg = match config {
                Some(path) => RunConfig::load(&path)
                    .unwrap_or_else(|e| fail(&format!("Failed to load config {}: {}", path, e))),
                None => RunConfig::default(),
            };
            if let Some(max) = max_cycles {
                cfg.max_cycles = max;
            }
            cfg.trace |= trace;
            cfg.json |= json;
            cfg.breakpoints.extend(breakpoints);
            run_program(&program, &cfg);
        }
        Some(Commands::Step { program, count }) => {
            step_program(&program, count);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Demo { cycles }) => {
            run_demo(cycles);
        }
        None => {
            println!("cu8 Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("An 8-bit microcontroller control unit emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Load a program from an .asm source, a .hex image, or the built-in sample.
fn load_program(path: &str) -> Program {
    if path == "sample" {
        return cu8::memory::sample::blink();
    }

    if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(&format!("Failed to read file: {}", e)));
        let program = cu8::assemble(&source)
            .unwrap_or_else(|e| fail(&format!("Assembly error: {}", e)));
        println!("📝 Assembled {} instructions", program.len());
        program
    } else {
        let program = cu8::load_image(path)
            .unwrap_or_else(|e| fail(&format!("Failed to load image: {}", e)));
        println!("📂 Loaded {} instructions", program.len());
        program
    }
}

fn make_cpu(program: Program) -> Cpu {
    Cpu::new(program).unwrap_or_else(|e| fail(&format!("Failed to load program: {}", e)))
}

fn run_program(path: &str, config: &RunConfig) {
    use cu8::asm::disasm::format_instruction;

    println!("🔧 Running: {}", path);
    let mut cpu = make_cpu(load_program(path));

    println!();
    println!("━━━ Execution ━━━");

    let mut cycles = 0u64;
    let mut faults = 0u64;
    while cycles < config.max_cycles {
        let pc = cpu.pc();
        if cycles > 0 && config.breakpoints.contains(&pc) {
            println!("⏸  Breakpoint at {:03}", pc);
            break;
        }

        match cpu.cycle() {
            Ok(instr) => {
                if config.trace {
                    println!("{:03}: {:<20} [{}]", pc, format_instruction(&instr), cpu.subroutine_name());
                }
            }
            Err(fault) => {
                faults += 1;
                println!("⚠️  {} (control unit reset)", fault);
            }
        }
        cycles += 1;
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cycles);
    println!("Faults: {}", faults);
    print_snapshot(&cpu, config.json);

    if cycles >= config.max_cycles {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", config.max_cycles);
    }
}

fn step_program(path: &str, count: u32) {
    use cu8::Step;
    use cu8::asm::disasm::format_instruction;

    let mut cpu = make_cpu(load_program(path));

    for _ in 0..count {
        let from = cpu.state();
        match cpu.step() {
            Step::Fetched { address, word } => {
                println!("{:<8} {:03}: {:06x}", from.name(), address, word);
            }
            Step::Decoded(fields) => {
                println!(
                    "{:<8} opcode={:#04x} op1={:#04x} op2={:#04x}",
                    from.name(),
                    fields.opcode,
                    fields.op1,
                    fields.op2
                );
            }
            Step::Executed(instr) => {
                println!("{:<8} {}", from.name(), format_instruction(&instr));
            }
            Step::Recovered(fault) => {
                println!("{:<8} ⚠️  {} (control unit reset)", from.name(), fault);
            }
        }
    }

    println!();
    print_snapshot(&cpu, false);
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    let program = load_program(path);

    println!("🚀 Launching debugger...");

    if let Err(e) = cu8::run_debugger(program) {
        fail(&format!("Debugger error: {}", e));
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use std::path::Path;

    let out_path = cu8::asm::image_path_for(Path::new(source_path), output.as_deref().map(Path::new))
        .unwrap_or_else(|e| fail(&format!("{}", e)));

    println!("📝 Assembling: {} → {}", source_path, out_path.display());

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail(&format!("Failed to read file: {}", e)));
    let program = cu8::assemble(&source)
        .unwrap_or_else(|e| fail(&format!("Assembly error: {}", e)));

    println!("✓ Assembled {} instructions, {} subroutines", program.len(), program.subroutines.len());

    if let Err(e) = cu8::save_image(&out_path, &program) {
        fail(&format!("Failed to save image: {}", e));
    }

    println!("✓ Saved to {}", out_path.display());
}

fn disassemble_file(image_path: &str) {
    println!("📖 Disassembling: {}", image_path);
    println!();

    let program = cu8::load_image(image_path)
        .unwrap_or_else(|e| fail(&format!("Failed to load image: {}", e)));

    println!("{}", cu8::disassemble(&program));
}

fn run_demo(cycles: u32) {
    let mut cpu = make_cpu(cu8::memory::sample::blink());

    println!("━━━ Sample program: LED blink ━━━");
    println!("{}", cpu.snapshot());
    println!();

    for _ in 0..cycles {
        if let Err(fault) = cpu.cycle() {
            println!("⚠️  {} (control unit reset)", fault);
        }
        println!("{}", cpu.snapshot());
        println!();
    }
}

fn print_snapshot(cpu: &Cpu, json: bool) {
    if json {
        match cpu.snapshot().to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => fail(&format!("Failed to serialize snapshot: {}", e)),
        }
    } else {
        println!("{}", cpu.snapshot());
    }
}

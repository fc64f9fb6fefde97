//! Debugger application state and logic.

use crate::asm::disasm::{disassemble_word, format_instruction};
use crate::cpu::decode::EXTENDED_PAGE_OFFSET;
use crate::cpu::{Cpu, Step};
use crate::memory::Program;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The control unit being debugged.
    pub cpu: Cpu,
    /// Breakpoints (by fetch address).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Program) -> Result<Self, crate::ProgramError> {
        Ok(Self {
            cpu: Cpu::new(program)?,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'c' to cycle, 'r' to run, 'q' to quit.".into(),
        })
    }

    /// Run a single state transition.
    pub fn step_state(&mut self) {
        let from = self.cpu.state().name();
        self.status = match self.cpu.step() {
            Step::Fetched { address, word } => format!("{}: read {:06x} from {:03}", from, word, address),
            Step::Decoded(fields) => format!(
                "{}: opcode={:#04x} op1={:#04x} op2={:#04x}",
                from, fields.opcode, fields.op1, fields.op2
            ),
            Step::Executed(instr) => format!("{}: {}", from, format_instruction(&instr)),
            Step::Recovered(fault) => {
                self.running = false;
                format!("{}: {} (reset)", from, fault)
            }
        };
    }

    /// Run one full instruction cycle.
    pub fn step_cycle(&mut self) {
        let pc = self.cpu.pc();
        match self.cpu.cycle() {
            Ok(instr) => {
                self.status = format!("PC={:03}: {}", pc, format_instruction(&instr));
            }
            Err(fault) => {
                self.status = format!("Fault: {} (reset)", fault);
                self.running = false;
            }
        }
    }

    /// Run until breakpoint or fault.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        // Check for breakpoint
        let pc = self.cpu.pc();
        if self.breakpoints.contains(&pc) && self.cpu.cycles() > 0 {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.step_cycle();
    }

    /// Toggle breakpoint at the current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Force the FSM into a raw state code. Unknown codes reset the unit.
    pub fn force_state(&mut self, raw: u8) {
        self.running = false;
        self.status = match self.cpu.force_state(raw) {
            Ok(state) => format!("Forced state {}", state.name()),
            Err(fault) => format!("Fault: {} (reset)", fault),
        };
    }

    /// Reset the control unit.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Cells of the extended data page written by STS, from its start.
    pub fn extended_page(&self, count: usize) -> Vec<(usize, u8)> {
        self.cpu.data.dump(usize::from(EXTENDED_PAGE_OFFSET), count)
    }

    /// Get disassembly around the current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let pc = self.cpu.pc() as usize;
        let start = pc.saturating_sub(lines / 2).min(256usize.saturating_sub(lines));

        (start..(start + lines).min(256))
            .map(|addr| {
                let addr = addr as u8;
                let text = disassemble_word(self.cpu.program().read(addr));
                (addr, text, addr == self.cpu.pc())
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Program) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Create app before touching the terminal
    let mut app = DebuggerApp::new(program)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step_state();
                        }
                        KeyCode::Char('c') => {
                            app.running = false;
                            app.step_cycle();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Char(d) if d.is_ascii_digit() => {
                            app.force_state(d as u8 - b'0');
                        }
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

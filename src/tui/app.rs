//! Front panel application state and logic.

use crate::cpu::disasm::disassemble_instruction;
use crate::keys::{ExtFunction, Key, KeyAction};
use crate::{Calculator, Rom};

/// Cycles executed per UI frame while free-running. The real machine ran
/// at roughly 3.5 kHz; this is comfortably faster without pegging a core.
const CYCLES_PER_FRAME: u64 = 700;

/// Front panel application state.
pub struct PanelApp {
    /// The emulated calculator.
    pub calc: Calculator,
    /// Free-running when false.
    pub paused: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl PanelApp {
    /// Create a panel around a ROM image.
    pub fn new(rom: Rom) -> Self {
        Self {
            calc: Calculator::new(rom),
            paused: false,
            should_quit: false,
            status: "Running. Type keys, space to pause, ? legend, q to quit.".into(),
        }
    }

    /// One UI frame's worth of emulation.
    pub fn tick(&mut self) {
        if !self.paused {
            self.calc.run(CYCLES_PER_FRAME);
        }
    }

    /// Execute a single microcycle while paused.
    pub fn step(&mut self) {
        let pc = self.calc.cpu().regs.pc;
        let offset = self.calc.cpu().regs.offset;
        let mi = self.calc.cpu().rom().fetch(offset, pc);
        self.calc.run(1);
        self.status = format!("{}:{:03}  {}", offset, pc, disassemble_instruction(mi));
    }

    /// Reset to power-on.
    pub fn reset(&mut self) {
        let rom = self.calc.cpu().rom().clone();
        self.calc = Calculator::new(rom);
        self.status = "Reset.".into();
    }

    /// Deliver a calculator key and note it in the status line.
    pub fn press(&mut self, action: KeyAction) {
        match action {
            KeyAction::Cpu(key) => {
                self.calc.press_key(key);
                self.status = format!("{:?}", key);
            }
            KeyAction::Ext(func) => {
                self.calc.press_ext(func);
                self.status = format!("{:?}", func);
            }
        }
    }

    /// Disassembly window around the current program counter.
    pub fn disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let cpu = self.calc.cpu();
        let pc = cpu.regs.pc;
        let offset = cpu.regs.offset;
        let start = pc.wrapping_sub((lines / 2) as u8);

        (0..lines as u8)
            .map(|i| {
                let addr = start.wrapping_add(i);
                let text = disassemble_instruction(cpu.rom().fetch(offset, addr));
                (addr, text, addr == pc)
            })
            .collect()
    }
}

/// Map a typed character to a calculator key.
///
/// Digits and operators are themselves; the scientific keys live on
/// uppercase letters (shown in the help panel).
pub fn key_for_char(c: char) -> Option<KeyAction> {
    use KeyAction::{Cpu, Ext};
    let action = match c {
        '0'..='9' => Cpu(Key::digit(c as u8 - b'0')),
        '.' => Cpu(Key::Dot),
        '+' => Cpu(Key::Add),
        '-' => Cpu(Key::Sub),
        '*' => Cpu(Key::Mul),
        '/' => Cpu(Key::Div),
        'S' => Cpu(Key::Sin),
        'C' => Cpu(Key::Cos),
        'T' => Cpu(Key::Tan),
        'A' => Cpu(Key::Arc),
        'L' => Cpu(Key::Ln),
        'G' => Cpu(Key::Log),
        'E' => Cpu(Key::Exp),
        'W' => Cpu(Key::Pow),
        'Q' => Cpu(Key::Sqrt),
        'I' => Cpu(Key::Inv),
        'P' => Cpu(Key::Pi),
        'V' => Cpu(Key::Chs),
        'M' => Cpu(Key::Sto),
        'R' => Cpu(Key::Rcl),
        'X' => Cpu(Key::Swap),
        'D' => Cpu(Key::Rot),
        'e' => Cpu(Key::Eex),
        'H' => Ext(ExtFunction::Hyp),
        _ => return None,
    };
    Some(action)
}

/// Run the front panel around a ROM image.
pub fn run_panel(rom: Rom) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PanelApp::new(rom);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char(' ') => {
                            app.paused = !app.paused;
                            app.status = if app.paused { "Paused." } else { "Running." }.into();
                        }
                        KeyCode::Char('s') => {
                            app.paused = true;
                            app.step();
                        }
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Enter => app.press(KeyAction::Cpu(Key::Enter)),
                        KeyCode::Backspace => app.press(KeyAction::Cpu(Key::Clx)),
                        KeyCode::Delete => app.press(KeyAction::Cpu(Key::Clr)),
                        KeyCode::Char(c) => {
                            if let Some(action) = key_for_char(c) {
                                app.press(action);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

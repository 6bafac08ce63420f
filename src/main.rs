//! HP-35 Emulator - CLI Entry Point
//!
//! Commands:
//! - `hp35 run <rom> --keys "..."` - Press a key sequence and show the display
//! - `hp35 panel <rom>` - Interactive front panel
//! - `hp35 disasm <rom>` - Disassemble the microcode
//! - `hp35 test` - Run the built-in self-test

use clap::{Parser, Subcommand};
use hp35::keys::{ExtFunction, Key, KeyAction};
use hp35::{Calculator, Rom};

#[derive(Parser)]
#[command(name = "hp35")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-level emulator of the HP-35 scientific calculator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Press a key sequence and print the settled display
    Run {
        /// Path to the 1536-byte microcode ROM image
        rom: String,
        /// Keys to press, space separated (e.g. "1 2 enter 3 4 add")
        #[arg(short, long)]
        keys: String,
        /// Print the display after every key
        #[arg(short, long)]
        trace: bool,
    },
    /// Interactive front panel
    Panel {
        /// Path to the ROM image
        rom: String,
    },
    /// Disassemble the microcode
    Disasm {
        /// Path to the ROM image
        rom: String,
        /// Bank to list (default: all)
        #[arg(short, long)]
        bank: Option<u8>,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { rom, keys, trace }) => run_keys(&rom, &keys, trace),
        Some(Commands::Panel { rom }) => run_panel(&rom),
        Some(Commands::Disasm { rom, bank }) => disassemble(&rom, bank),
        Some(Commands::Test) => run_self_test(),
        None => {
            println!("HP-35 Emulator v0.1.0");
            println!("Use --help for available commands");
        }
    }
}

fn load_rom(path: &str) -> Rom {
    match Rom::load(path) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("failed to load ROM {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn run_keys(rom_path: &str, keys: &str, trace: bool) {
    let mut calc = Calculator::new(load_rom(rom_path));

    // Let the ROM reach its idle loop before typing.
    calc.settle();

    for token in keys.split_whitespace() {
        let Some(action) = parse_token(token) else {
            eprintln!("unknown key: {}", token);
            std::process::exit(1);
        };
        match action {
            KeyAction::Cpu(key) => {
                calc.press_key(key);
            }
            KeyAction::Ext(func) => {
                calc.press_ext(func);
            }
        }
        calc.settle();
        if trace {
            println!("{:>8}  [{}]", token, calc.display_text().trim());
        }
    }

    if calc.error() {
        println!("Error");
    } else {
        println!("{}", calc.display_text().trim());
    }
}

fn run_panel(rom_path: &str) {
    #[cfg(feature = "tui")]
    {
        if let Err(e) = hp35::tui::run_panel(load_rom(rom_path)) {
            eprintln!("panel error: {}", e);
            std::process::exit(1);
        }
    }
    #[cfg(not(feature = "tui"))]
    {
        let _ = rom_path;
        eprintln!("built without the \"tui\" feature");
        std::process::exit(1);
    }
}

fn disassemble(rom_path: &str, bank: Option<u8>) {
    use hp35::cpu::disasm::disassemble_bank;

    let rom = load_rom(rom_path);
    match bank {
        Some(bank) => {
            if (bank as usize) < rom.banks() {
                print!("{}", disassemble_bank(&rom, bank));
            } else {
                eprintln!("bank {} not present (image has {})", bank, rom.banks());
                std::process::exit(1);
            }
        }
        None => {
            for bank in 0..rom.banks() as u8 {
                print!("{}", disassemble_bank(&rom, bank));
            }
        }
    }
}

/// Map a CLI token to a key or extended function.
fn parse_token(token: &str) -> Option<KeyAction> {
    use KeyAction::{Cpu, Ext};
    let action = match token.to_ascii_lowercase().as_str() {
        "0" => Cpu(Key::D0),
        "1" => Cpu(Key::D1),
        "2" => Cpu(Key::D2),
        "3" => Cpu(Key::D3),
        "4" => Cpu(Key::D4),
        "5" => Cpu(Key::D5),
        "6" => Cpu(Key::D6),
        "7" => Cpu(Key::D7),
        "8" => Cpu(Key::D8),
        "9" => Cpu(Key::D9),
        "." | "dot" => Cpu(Key::Dot),
        "enter" => Cpu(Key::Enter),
        "+" | "add" => Cpu(Key::Add),
        "-" | "sub" => Cpu(Key::Sub),
        "*" | "mul" => Cpu(Key::Mul),
        "/" | "div" => Cpu(Key::Div),
        "chs" => Cpu(Key::Chs),
        "eex" => Cpu(Key::Eex),
        "clx" => Cpu(Key::Clx),
        "clr" => Cpu(Key::Clr),
        "sqrt" => Cpu(Key::Sqrt),
        "inv" | "1/x" => Cpu(Key::Inv),
        "ln" => Cpu(Key::Ln),
        "log" => Cpu(Key::Log),
        "exp" | "e^x" => Cpu(Key::Exp),
        "pow" | "x^y" => Cpu(Key::Pow),
        "sin" => Cpu(Key::Sin),
        "cos" => Cpu(Key::Cos),
        "tan" => Cpu(Key::Tan),
        "arc" => Cpu(Key::Arc),
        "pi" => Cpu(Key::Pi),
        "sto" => Cpu(Key::Sto),
        "rcl" => Cpu(Key::Rcl),
        "swap" | "x<>y" => Cpu(Key::Swap),
        "rot" | "rdn" => Cpu(Key::Rot),
        "hyp" => Ext(ExtFunction::Hyp),
        "bright" => Ext(ExtFunction::Brightness),
        "sinh" => Ext(ExtFunction::Sinh),
        "cosh" => Ext(ExtFunction::Cosh),
        "tanh" => Ext(ExtFunction::Tanh),
        "asinh" => Ext(ExtFunction::Asinh),
        "acosh" => Ext(ExtFunction::Acosh),
        "atanh" => Ext(ExtFunction::Atanh),
        "r2p" => Ext(ExtFunction::RectToPolar),
        "p2r" => Ext(ExtFunction::PolarToRect),
        "pv" => Ext(ExtFunction::PresentValue),
        "nd" => Ext(ExtFunction::NormalDensity),
        "gamma" => Ext(ExtFunction::LogGamma),
        "qe" => Ext(ExtFunction::Quadratic),
        _ => return None,
    };
    Some(action)
}

fn run_self_test() {
    use hp35::bcd::{arith, digit, Reg, Span};
    use hp35::cpu::{decode, encode, ArithOp, Cpu, Field, MicroInstruction, MicroOp};

    println!("HP-35 Emulator Self-Test");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ok", name);
            passed += 1;
        } else {
            println!("{}... FAILED", name);
            failed += 1;
        }
    };

    check("digit adder", digit::add_digit(7, 8, 1) == (6, 1));
    check("digit subtractor", digit::sub_digit(3, 7, 0) == (6, 1));

    let (sum, carry) = arith::add(
        Reg::from_u64(99_999_999_999_999),
        Reg::from_u64(1),
        Span::word(),
        0,
    );
    check("full-word wrap", sum.is_zero() && carry == 1);

    let mut total = true;
    for h in 0..4u8 {
        for l in 0..=255u8 {
            let mi = MicroInstruction::new(h, l);
            let op = decode(mi);
            if op != MicroOp::Nop && decode(encode(&op)) != op {
                total = false;
            }
        }
    }
    check("decode/encode agreement", total);

    let words = [
        encode(&MicroOp::Arith { op: ArithOp::IncrementC, field: Field::X }).word(),
        encode(&MicroOp::Arith { op: ArithOp::AddAcToC, field: Field::X }).word(),
    ];
    let mut cpu = Cpu::new(Rom::from_words(&words));
    cpu.step();
    cpu.step();
    check("cpu microcycle", cpu.regs.c.to_u64() == 2);

    println!();
    println!("Results: {} passed, {} failed", passed, failed);
    if failed > 0 {
        std::process::exit(1);
    }
}

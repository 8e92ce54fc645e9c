//! Host demo: registers a trivial stdout-backed [`StdoutDriver`], feeds it
//! bytes from stdin, and dumps both the virtual screen and the physical
//! frame mirror. The direct analogue of the original C source's own
//! `main()`/`write_char`/`driver` stub at the bottom of `test_lcd-linux.c`.

use std::io::Read;

use lcd_engine::attr::{self, reverse_color_attr};
use lcd_engine::cell::Cell;
use lcd_engine::driver::{DriverPort, ValidateResult};
use lcd_engine::{Engine, Parameters};

/// A driver with no physical device behind it: every write is logged at
/// `trace` level and otherwise dropped. Stands in for a real HD44780/VFD
/// parallel-port driver the way the original's `write_char`/`init_port`/
/// `cleanup_port` stubs stood in for one.
struct StdoutDriver;

impl DriverPort for StdoutDriver {
    fn write_char(&mut self, offset: usize, cell: Cell) {
        log::trace!("write_char({offset}, glyph={:#x} attr={:#x})", cell.glyph(), cell.attr());
    }

    fn init_port(&mut self) -> Result<(), &'static str> {
        log::debug!("port initialized");
        Ok(())
    }

    fn cleanup_port(&mut self) -> Result<(), &'static str> {
        log::debug!("port cleaned up");
        Ok(())
    }

    fn validate(&mut self) -> Option<ValidateResult> {
        Some(Ok(true))
    }
}

fn main() {
    env_logger::init();

    let par = Parameters {
        name: "host_demo".into(),
        flags: 0,
        tabstop: 8,
        num_cntr: 1,
        cntr_rows: 5,
        cntr_cols: 4,
        vs_rows: 10,
        vs_cols: 20,
        cgram_chars: 8,
        cgram_bytes: 8,
        cgram_char0: 0,
    };

    let mut engine = match Engine::register_driver(Box::new(StdoutDriver), par) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("register failed: {e}");
            std::process::exit(1);
        }
    };

    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .expect("failed to read stdin");
    engine.write_bytes(&input);

    let par = engine.parameters().clone();
    print_buf("virtual screen", &engine, par.vs_cols as usize, par.fb_size(), true);
    print_buf("physical frame", &engine, par.frame_cols(), par.frame_size(), false);

    let (row, col) = engine.cursor();
    println!("row = {row}\tcol = {col}");

    if let Err(e) = engine.unregister() {
        eprintln!("unregister failed: {e}");
        std::process::exit(1);
    }
}

/// Dump a region of cells as an ANSI-colored grid. Grounded on the
/// original's `print_buf`: SGR-wrap each cell by its packed attribute byte,
/// then print the glyph (non-printable bytes show as `?`).
fn print_buf(label: &str, engine: &Engine, cols: usize, size: usize, virtual_screen: bool) {
    println!("--- {label} ---");
    let can_do_color = engine.mode_flags().can_do_color;

    print!("   +");
    for _ in 0..cols {
        print!("-");
    }
    println!("+");

    for i in 0..size {
        let cell = if virtual_screen {
            engine.read_cell(i)
        } else {
            engine.read_frame_cell(i)
        }
        .unwrap_or_default();

        if i % cols == 0 {
            print!("{:2} |", 1 + (i / cols));
        }

        if can_do_color {
            let fg = cell.attr() & attr::FG_COLOR;
            let bg = (cell.attr() & attr::BG_COLOR) >> 4;
            print!("\x1b[{}m", 30 + fg);
            print!("\x1b[{}m", 40 + bg);
        } else {
            let rev = cell.attr() & attr::REVERSE != 0;
            let attr_byte = if rev {
                reverse_color_attr(cell.attr())
            } else {
                cell.attr()
            };
            match attr_byte & attr::I_MASK {
                1 => print!("\x1b[21m"),
                2 => print!("\x1b[1m"),
                0 => print!("\x1b[2m"),
                _ => {}
            }
            if attr_byte & attr::ULINE != 0 {
                print!("\x1b[4m");
            }
            if attr_byte & attr::BLINK != 0 {
                print!("\x1b[5m");
            }
        }

        let glyph = cell.glyph();
        let ch = if glyph < 0x20 { b'?' } else { glyph };
        print!("{}\x1b[0m", ch as char);

        if (i + 1) % cols == 0 {
            println!("|");
        }
    }

    print!("   +");
    for _ in 0..cols {
        print!("-");
    }
    println!("+");
}

//! The public façade: `Engine` owns the framebuffer, the frame
//! window, the physical mirror, the CGRAM bank and every piece of emulator
//! state, and is the only thing callers touch. Shaped like
//! `driver_framework::manager::DeviceManager`, which is likewise the single
//! owning point through which every driver call is routed — except here
//! `register_driver` hands the caller an owned `Engine` instead of stashing
//! it in a global registry (see DESIGN.md, "singleton vs. handle").

use crate::attr::AttrState;
use crate::cell::Cell;
use crate::cgram::CgramBank;
use crate::driver::DriverPort;
use crate::error::{EngineError, EngineResult};
use crate::flags::{Direction, EscState, InputState, ModeFlags};
use crate::params::Parameters;

/// Max number of numeric parameters a single CSI sequence may carry.
pub const NPAR: usize = 16;

/// How far through driver bring-up the engine currently is. Mirrors the
/// original's `INIT_LEVEL` bitfield, collapsed to the two driver-facing
/// stages since buffer allocation in safe Rust isn't a separate fallible
/// step the way `vmalloc` was (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum InitLevel {
    Allocated,
    PortUp,
    DisplayUp,
}

pub struct Engine {
    pub(crate) par: Parameters,
    pub(crate) driver: Box<dyn DriverPort>,
    pub(crate) own_charmap: Option<[u8; 256]>,

    pub(crate) fb: Vec<Cell>,
    pub(crate) display: Vec<Cell>,
    pub(crate) frame_base: usize,

    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) top: usize,
    pub(crate) bot: usize,

    pub(crate) s_offset: usize,
    pub(crate) s_color: u8,
    pub(crate) s_attributes: u8,

    pub(crate) direction: Direction,
    pub(crate) input_state: InputState,
    pub(crate) esc_state: EscState,
    pub(crate) esc_args: u32,
    pub(crate) arg_index: usize,
    pub(crate) flags: ModeFlags,

    pub(crate) attr: AttrState,
    pub(crate) erase_char: Cell,

    pub(crate) csi_args: [u32; NPAR],
    pub(crate) csi_index: usize,

    pub(crate) cgram: CgramBank,
    pub(crate) cgram_index: u8,
    pub(crate) cgram_staging: Vec<u8>,

    pub(crate) init_level: InitLevel,
}

impl Engine {
    /// Bring a driver up: validate, allocate, and run it through the staged
    /// init sequence. Mirrors `lcd_register_driver`.
    pub fn register_driver(mut driver: Box<dyn DriverPort>, mut par: Parameters) -> EngineResult<Engine> {
        par.validate()?;
        let validated = driver.validate();

        let can_do_color = match validated {
            None => false,
            Some(Ok(color)) => color,
            Some(Err(_)) => return Err(EngineError::ValidationFailed),
        };

        let attr = AttrState::new(can_do_color);
        let erase_char = Cell::new(b' ', attr.erase_char_attr);

        let own_charmap = if driver.charmap().is_none() {
            let mut table = [0u8; 256];
            for (i, b) in table.iter_mut().enumerate() {
                *b = i as u8;
            }
            Some(table)
        } else {
            None
        };

        let mut flags = ModeFlags::default();
        flags.decawm = true;
        flags.can_do_color = can_do_color;
        flags.null_charmap = own_charmap.is_some();

        let fb_size = par.fb_size();
        let frame_size = par.frame_size();
        let bot = par.vs_rows as usize;

        let mut engine = Engine {
            cgram: CgramBank::new(&par),
            fb: vec![erase_char; fb_size],
            display: vec![erase_char; frame_size],
            frame_base: 0,
            row: 0,
            col: 0,
            top: 0,
            bot,
            s_offset: 0,
            s_color: attr.color,
            s_attributes: attr.attributes,
            direction: Direction::Forward,
            input_state: InputState::Normal,
            esc_state: EscState::None,
            esc_args: 0,
            arg_index: 0,
            flags,
            attr,
            erase_char,
            csi_args: [0; NPAR],
            csi_index: 0,
            cgram_index: 0,
            cgram_staging: Vec::new(),
            par,
            driver,
            own_charmap,
            init_level: InitLevel::Allocated,
        };

        if let Err(e) = engine.init_driver() {
            let _ = engine.cleanup_driver();
            return Err(e);
        }
        Ok(engine)
    }

    /// Tear a driver down, walking init levels back to zero. Mirrors
    /// `lcd_unregister_driver`. Consumes the engine: there is nothing left
    /// to call `handle_input` on afterward.
    pub fn unregister(mut self) -> EngineResult<()> {
        self.cleanup_driver()
    }

    /// Bring the driver port (and, if present, the display) up from
    /// whatever init level is currently reached. Mirrors `do_init_driver`'s
    /// stages 1 and 2 (stage 0 — validation/allocation — already happened in
    /// [`Engine::register_driver`], since it isn't a separate fallible step
    /// once the framebuffer is a plain `Vec`).
    pub(crate) fn init_driver(&mut self) -> EngineResult<()> {
        if self.init_level < InitLevel::PortUp {
            self.driver
                .init_port()
                .map_err(EngineError::PortInitFailed)?;
            self.init_level = InitLevel::PortUp;
        }
        if self.init_level < InitLevel::DisplayUp {
            self.driver
                .init_display()
                .map_err(EngineError::DisplayInitFailed)?;
            self.init_level = InitLevel::DisplayUp;
        }
        Ok(())
    }

    /// Tear the driver down from whatever init level is currently reached,
    /// in reverse order. Mirrors `do_cleanup_driver`.
    pub(crate) fn cleanup_driver(&mut self) -> EngineResult<()> {
        if self.init_level >= InitLevel::DisplayUp {
            self.driver
                .cleanup_display()
                .map_err(EngineError::DisplayCleanupFailed)?;
            self.init_level = InitLevel::PortUp;
        }
        if self.init_level >= InitLevel::PortUp {
            self.driver
                .cleanup_port()
                .map_err(EngineError::PortCleanupFailed)?;
            self.init_level = InitLevel::Allocated;
        }
        Ok(())
    }

    pub fn parameters(&self) -> &Parameters {
        &self.par
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode_flags(&self) -> ModeFlags {
        self.flags
    }

    /// Feed one byte of input through the state machine. Mirrors
    /// `handle_input` for the plain (non-SYN-raw) path.
    pub fn handle_input(&mut self, byte: u8) {
        self.dispatch_input(byte);
    }

    /// Feed a whole byte slice through [`Engine::handle_input`].
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.handle_input(b);
        }
    }

    /// Read back the raw framebuffer cell at a virtual-screen offset.
    /// Operates on `fb`, never on the physical mirror.
    pub fn read_cell(&self, offset: usize) -> Option<Cell> {
        self.fb.get(offset).copied()
    }

    /// Read back what the engine believes is currently on the physical
    /// device at a frame-local offset. Debug/demo use only (e.g. dumping
    /// both buffers side by side); ordinary callers should use
    /// [`Engine::read_cell`], which sees `fb`, never this mirror.
    pub fn read_frame_cell(&self, frame_offset: usize) -> Option<Cell> {
        self.display.get(frame_offset).copied()
    }

    /// Overwrite a framebuffer cell directly, bypassing the input state
    /// machine, and resync the frame window if the write is visible.
    /// Generalizes the original's positioned-write ioctl path.
    pub fn write_cell(&mut self, offset: usize, cell: Cell) {
        if offset >= self.fb.len() {
            return;
        }
        self.fb[offset] = cell;
        if self.show_cursor() {
            self.redraw_screen(0, self.par.fb_size() - 1);
        } else {
            self.redraw_screen(offset, offset);
        }
    }

    /// Move the cursor to an absolute virtual-screen offset, the
    /// `lseek`-style positioning operation from the original's host program.
    pub fn seek(&mut self, offset: usize) {
        let vs_cols = self.par.vs_cols as usize;
        let offset = offset.min(self.par.fb_size().saturating_sub(1));
        self.row = offset / vs_cols;
        self.col = offset % vs_cols;
    }
}

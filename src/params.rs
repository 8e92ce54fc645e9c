//! The parameter block — immutable-after-validation geometry and identity
//! for one engine instance. Shaped like `driver_framework::device::DeviceInfo`:
//! a plain data record describing a device, handed to the driver/engine at
//! registration time.

use crate::error::{EngineError, EngineResult};

/// Driver-specific bits that the engine passes through opaquely via
/// [`Parameters::flags`] and never interprets itself (e.g. a real HD44780
/// driver's busy-flag-check, 4-bit-bus, or 5x10-font selection). The engine
/// only reads/writes these through [`Parameters::flags`]; they carry no
/// engine-level semantics.
pub mod device_flags {
    pub const CHECK_BF: u32 = 1 << 0;
    pub const BUS_4BITS: u32 = 1 << 1;
    pub const FONT_5X10: u32 = 1 << 2;
}

/// Geometry and identity for one engine instance.
///
/// Invariant after [`Parameters::validate`]: `vs_rows >= frame_rows`,
/// `vs_cols >= frame_cols`, both frame dimensions are nonzero, and `name` is
/// non-empty.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub name: String,
    pub flags: u32,
    pub tabstop: u16,
    pub num_cntr: u16,
    pub cntr_rows: u16,
    pub cntr_cols: u16,
    pub vs_rows: u16,
    pub vs_cols: u16,
    pub cgram_chars: u16,
    pub cgram_bytes: u16,
    pub cgram_char0: u8,
}

impl Parameters {
    pub fn frame_rows(&self) -> usize {
        self.cntr_rows as usize * self.num_cntr as usize
    }

    pub fn frame_cols(&self) -> usize {
        self.cntr_cols as usize
    }

    pub fn frame_size(&self) -> usize {
        self.frame_rows() * self.frame_cols()
    }

    pub fn fb_size(&self) -> usize {
        self.vs_rows as usize * self.vs_cols as usize
    }

    /// Clamp `vs_rows`/`vs_cols` up to the frame size (the original driver
    /// does this silently during `do_init_driver` rather than rejecting the
    /// configuration) and check the remaining invariants.
    pub(crate) fn validate(&mut self) -> EngineResult<()> {
        if self.name.is_empty() {
            return Err(EngineError::InvalidParameters("name must not be empty"));
        }
        if self.frame_rows() == 0 || self.frame_cols() == 0 {
            return Err(EngineError::InvalidParameters(
                "frame dimensions must be nonzero",
            ));
        }
        if self.vs_rows < self.frame_rows() as u16 {
            self.vs_rows = self.frame_rows() as u16;
        }
        if self.vs_cols < self.frame_cols() as u16 {
            self.vs_cols = self.frame_cols() as u16;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Parameters {
        Parameters {
            name: "test".into(),
            flags: 0,
            tabstop: 8,
            num_cntr: 1,
            cntr_rows: 4,
            cntr_cols: 4,
            vs_rows: 4,
            vs_cols: 4,
            cgram_chars: 8,
            cgram_bytes: 8,
            cgram_char0: 0,
        }
    }

    #[test]
    fn rejects_empty_name() {
        let mut p = base();
        p.name.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_zero_frame() {
        let mut p = base();
        p.cntr_rows = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn clamps_virtual_screen_up_to_frame() {
        let mut p = base();
        p.vs_rows = 1;
        p.vs_cols = 1;
        p.validate().unwrap();
        assert_eq!(p.vs_rows, 4);
        assert_eq!(p.vs_cols, 4);
    }

    #[test]
    fn derived_sizes() {
        let p = base();
        assert_eq!(p.frame_rows(), 4);
        assert_eq!(p.frame_cols(), 4);
        assert_eq!(p.frame_size(), 16);
        assert_eq!(p.fb_size(), 16);
    }
}

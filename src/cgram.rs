//! CGRAM (user-definable glyph) sub-protocol. Grounded on the
//! original's `cgram_buffer` cache and `write_cgram`, with the per-slot
//! bitmap cache kept as owned `Vec<u8>` rows instead of one flat pointer
//! buffer with manual offset arithmetic.

use crate::engine::Engine;
use crate::flags::Direction;
use crate::params::Parameters;

/// One bank entry per uploadable glyph slot, each holding the last bitmap
/// pushed to the driver so repeat uploads of identical data can be elided.
pub struct CgramBank {
    char0: u8,
    bytes: usize,
    cache: Vec<Vec<u8>>,
}

impl CgramBank {
    pub fn new(par: &Parameters) -> CgramBank {
        let count = par.cgram_chars as usize;
        let bytes = par.cgram_bytes as usize;
        CgramBank {
            char0: par.cgram_char0,
            bytes,
            cache: vec![vec![0u8; bytes]; count],
        }
    }

    /// Whether any CGRAM slots were configured at all.
    pub fn is_supported(&self) -> bool {
        !self.cache.is_empty() && self.bytes > 0
    }

    /// The number of pixel bytes one glyph upload carries.
    pub fn bitmap_len(&self) -> usize {
        self.bytes
    }

    /// Whether `index` names a configured CGRAM slot.
    pub fn in_range(&self, index: u8) -> bool {
        self.is_supported()
            && index >= self.char0
            && (index as usize) < self.char0 as usize + self.cache.len()
    }

    fn slot(&self, index: u8) -> usize {
        (index - self.char0) as usize
    }
}

impl Engine {
    /// Read back the cached bitmap last pushed for a CGRAM slot.
    pub fn cgram_bitmap(&self, index: u8) -> Option<&[u8]> {
        if self.cgram.in_range(index) {
            Some(&self.cgram.cache[self.cgram.slot(index)])
        } else {
            None
        }
    }

    /// Push a full glyph bitmap to CGRAM slot `index`, skipping the write
    /// if it's identical to what's cached, and temporarily forcing the
    /// hardware address counter forward for the duration of the upload
    /// regardless of the engine's current scan direction (restored on every
    /// exit path). Mirrors `write_cgram`.
    pub(crate) fn write_cgram(&mut self, index: u8, pixels: &[u8]) {
        if !self.cgram.in_range(index) {
            log::warn!("bad CGRAM index {}", index);
            return;
        }
        let slot = self.cgram.slot(index);
        if self.cgram.cache[slot] == pixels {
            return;
        }

        let was_reverse = !self.direction.is_forward();
        if was_reverse {
            self.address_mode(Direction::Forward);
        }

        if self.driver.write_cgram_char(index, pixels) {
            self.cgram.cache[slot] = pixels.to_vec();
        } else {
            log::warn!("driver is missing the CGRAM write callback");
        }

        if was_reverse {
            self.address_mode(Direction::Reverse);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn par(chars: u16, bytes: u16, char0: u8) -> Parameters {
        Parameters {
            name: "t".into(),
            flags: 0,
            tabstop: 8,
            num_cntr: 1,
            cntr_rows: 2,
            cntr_cols: 5,
            vs_rows: 2,
            vs_cols: 5,
            cgram_chars: chars,
            cgram_bytes: bytes,
            cgram_char0: char0,
        }
    }

    #[test]
    fn bank_reports_unsupported_when_no_slots_configured() {
        let bank = CgramBank::new(&par(0, 0, 0));
        assert!(!bank.is_supported());
        assert!(!bank.in_range(0));
    }

    #[test]
    fn bank_tracks_configured_index_range() {
        let bank = CgramBank::new(&par(8, 8, 0));
        assert!(bank.is_supported());
        assert!(bank.in_range(0));
        assert!(bank.in_range(7));
        assert!(!bank.in_range(8));
    }
}

//! Cursor motion primitives and the cell-write path.
//! Grounded on the original `bs`/`cr`/`lf`/`ri`/`ff`/`tab`/`control_char`/
//! `gotoxy`/`gotoxay`/`write_data`.

use crate::cell::Cell;
use crate::engine::{Engine, NPAR};
use crate::flags::{Direction, InputState};
use crate::geometry;

impl Engine {
    /// Switch the hardware address-counter direction, notifying the driver
    /// only on an actual change. Mirrors `address_mode`.
    pub(crate) fn address_mode(&mut self, dir: Direction) {
        if dir != self.direction {
            self.driver.address_mode(dir);
            self.direction = dir;
        }
    }

    /// Back Space / Delete.
    pub(crate) fn bs(&mut self) {
        self.flags.need_wrap = false;
        if self.direction.is_forward() {
            if self.col > 0 {
                self.col -= 1;
            }
        } else if self.col + 1 < self.par.vs_cols as usize {
            self.col += 1;
        }
    }

    /// Carriage Return.
    pub(crate) fn cr(&mut self) {
        self.flags.need_wrap = false;
        self.col = if self.direction.is_forward() {
            0
        } else {
            self.par.vs_cols as usize - 1
        };
    }

    /// Line Feed / Vertical Tab.
    pub(crate) fn lf(&mut self) {
        self.flags.need_wrap = false;
        if self.direction.is_forward() {
            if self.row + 1 < self.bot {
                self.row += 1;
            } else if self.input_state != InputState::Raw {
                self.show_cursor();
                self.scrup(self.top, self.bot, 1);
            }
        } else if self.row > self.top {
            self.row -= 1;
        } else if self.input_state != InputState::Raw {
            self.show_cursor();
            self.scrdown(self.top, self.bot, 1);
        }
    }

    /// Reverse Line Feed.
    pub(crate) fn ri(&mut self) {
        self.flags.need_wrap = false;
        if self.direction.is_forward() {
            if self.row > self.top {
                self.row -= 1;
            } else {
                self.show_cursor();
                self.scrdown(self.top, self.bot, 1);
            }
        } else if self.row + 1 < self.bot {
            self.row += 1;
        } else {
            self.show_cursor();
            self.scrup(self.top, self.bot, 1);
        }
    }

    /// Form Feed: clear the whole screen and home the cursor.
    pub(crate) fn ff(&mut self) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;
        let erase = self.erase_char;

        self.flags.need_wrap = false;
        if self.driver.clear_display() {
            for cell in self.fb.iter_mut() {
                *cell = erase;
            }
            for cell in self.display.iter_mut() {
                *cell = erase;
            }
            self.frame_base = 0;
        } else if self.direction.is_forward() {
            let fb_size = self.par.fb_size();
            self.lcd_memset(0, erase, fb_size);
        } else {
            let fb_size = self.par.fb_size();
            self.lcd_memset(fb_size - 1, erase, fb_size);
        }

        if self.direction.is_forward() {
            self.row = 0;
            self.col = 0;
        } else {
            self.row = vs_rows - 1;
            self.col = vs_cols - 1;
        }
    }

    /// Horizontal Tab.
    pub(crate) fn tab(&mut self) {
        let vs_cols = self.par.vs_cols as usize;
        let tabstop = self.par.tabstop as usize;

        self.flags.need_wrap = false;
        if tabstop == 0 {
            return;
        }

        if self.direction.is_forward() {
            let i = tabstop - (self.col % tabstop);
            if self.col + i < vs_cols {
                self.col += i;
            }
        } else {
            let i = self.col % tabstop;
            let i = if i == 0 { tabstop } else { i };
            if self.col >= i {
                self.col -= i;
            }
        }
    }

    /// Dispatch a control character (any `Normal`-state byte < 0x20, plus
    /// the `0x9b` 8-bit CSI introducer). Mirrors `control_char`.
    pub(crate) fn control_char(&mut self, val: u8) {
        match val {
            0x08 | 0x7f => self.bs(),
            0x09 => self.tab(),
            0x0c => self.ff(),
            0x0a | 0x0b => {
                self.lf();
                if self.flags.crlf {
                    self.cr();
                }
            }
            0x0d => self.cr(),
            0x16 => self.input_state = InputState::Syn,
            0x1b => self.input_state = InputState::Esc,
            0x9b => {
                self.csi_args = [0; NPAR];
                self.csi_index = 0;
                self.input_state = InputState::Csi;
            }
            _ => {}
        }
    }

    /// Move the cursor to an absolute (column, row), clamped to the
    /// scrolling region or whole screen depending on `DECOM`, resyncing the
    /// frame window if the move scrolled it. Mirrors `gotoxy`.
    pub(crate) fn gotoxy(&mut self, new_col: i64, new_row: i64) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;

        self.flags.need_wrap = false;
        let (min_row, max_row) = if self.flags.decom {
            (self.top as i64, self.bot as i64)
        } else {
            (0i64, vs_rows as i64)
        };

        self.row = if new_row < min_row {
            min_row as usize
        } else if new_row >= max_row {
            (max_row - 1) as usize
        } else {
            new_row as usize
        };

        self.col = if new_col < 0 {
            0
        } else if new_col >= vs_cols as i64 {
            vs_cols - 1
        } else {
            new_col as usize
        };

        if self.show_cursor() {
            let fb_size = self.par.fb_size();
            self.redraw_screen(0, fb_size - 1);
        }
    }

    /// `gotoxy`, but `new_row` is relative to the scrolling region's top
    /// when `DECOM` is set. Mirrors `gotoxay`.
    pub(crate) fn gotoxay(&mut self, new_col: i64, new_row: i64) {
        let row = if self.flags.decom {
            self.top as i64 + new_row
        } else {
            new_row
        };
        self.gotoxy(new_col, row);
    }

    /// Write one already-attributed, already-charmapped cell to the
    /// virtual screen and advance the cursor. Mirrors `write_data`.
    pub(crate) fn write_data(&mut self, data: Cell) {
        let vs_cols = self.par.vs_cols as usize;

        if self.flags.need_wrap {
            self.cr();
            self.lf();
        }
        if self.flags.decim {
            self.insert_char(1);
        }

        let pos = self.row * vs_cols + self.col;
        let mut frame_pos = geometry::vs_to_frame(&self.par, self.frame_base, pos);
        if frame_pos.is_none() {
            self.show_cursor();
            let fb_size = self.par.fb_size();
            self.redraw_screen(0, fb_size - 1);
            frame_pos = geometry::vs_to_frame(&self.par, self.frame_base, pos);
        }

        if let Some(frame_pos) = frame_pos {
            if self.display[frame_pos] != data {
                self.driver.write_char(frame_pos, data);
                self.display[frame_pos] = data;
            }
        }

        self.fb[pos] = data;

        if self.direction.is_forward() {
            if self.col + 1 < vs_cols {
                self.col += 1;
            } else if self.flags.decawm {
                self.flags.need_wrap = true;
            }
        } else if self.col > 0 {
            self.col -= 1;
        } else if self.flags.decawm {
            self.flags.need_wrap = true;
        }
    }

    /// Resolve one raw input byte through the driver's charmap (or the
    /// engine's identity fallback) and compose it with the current
    /// attribute byte.
    pub(crate) fn compose_cell(&self, byte: u8) -> Cell {
        let glyph = match &self.own_charmap {
            Some(table) => table[byte as usize],
            None => self
                .driver
                .charmap()
                .map(|t| t[byte as usize])
                .unwrap_or(byte),
        };
        Cell::new(glyph, self.attr.attr)
    }
}

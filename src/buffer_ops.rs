//! Buffer operations and the physical mirror: `memset`/`memmove`
//! over the virtual framebuffer, frame-window resync, scrolling, and the
//! insert/delete-character primitives built on top of them. Grounded
//! directly on the original `lcd_memset`/`lcd_memmove`/`redraw_screen`/
//! `scrup`/`scrdown`/`lcd_insert_char`/`lcd_delete_char`/`browse_screen`/
//! `lcd_invert_screen`.

use crate::engine::Engine;
use crate::flags::InputState;
use crate::geometry;

impl Engine {
    /// Recompute `frame_base` so the cursor stays inside the visible
    /// window. Returns whether it moved. Mirrors `show_cursor`.
    pub(crate) fn show_cursor(&mut self) -> bool {
        let (new_base, changed) =
            geometry::show_cursor(&self.par, self.direction, self.row, self.col, self.frame_base);
        self.frame_base = new_base;
        changed
    }

    /// Sync the frame area `[s, e]` (virtual-screen offsets) with `fb`
    /// content, pushing only the cells that differ from `display` down to
    /// the driver. Mirrors `redraw_screen`.
    pub(crate) fn redraw_screen(&mut self, mut s: usize, mut e: usize) {
        let fb_size = self.par.fb_size();
        if s >= fb_size || e >= fb_size || e < s || e < self.frame_base {
            return;
        }

        let vs_cols = self.par.vs_cols as usize;
        let frame_cols = self.par.frame_cols();
        let saved_row = self.row;
        let saved_col = self.col;
        let inc_set = self.direction.is_forward();

        s = geometry::round_vs(&self.par, self.frame_base, s);
        e = geometry::round_vs(&self.par, self.frame_base, e);

        let mut len = 1 + e - s;
        if !inc_set {
            s = e;
        }

        self.row = s / vs_cols;
        self.col = s % vs_cols;

        let saved_flags = self.flags;
        let saved_state = self.input_state;
        self.flags.need_wrap = false;
        self.flags.decim = false;
        self.flags.decawm = true;
        self.input_state = InputState::Raw;

        if inc_set {
            while len > 0 {
                len -= 1;
                let pos = self.row * vs_cols + self.col;
                if geometry::vs_to_frame(&self.par, self.frame_base, pos).is_none() {
                    s += vs_cols - frame_cols;
                    len = len.saturating_sub(vs_cols - frame_cols - 1);
                    self.row = s / vs_cols;
                    self.col = s % vs_cols;
                } else {
                    let data = self.fb[s];
                    s += 1;
                    self.write_data(data);
                    if self.flags.need_wrap {
                        self.cr();
                        self.lf();
                    }
                }
            }
        } else {
            while len > 0 {
                len -= 1;
                let pos = self.row * vs_cols + self.col;
                if geometry::vs_to_frame(&self.par, self.frame_base, pos).is_none() {
                    s -= vs_cols - frame_cols;
                    len = len.saturating_sub(vs_cols - frame_cols - 1);
                    self.row = s / vs_cols;
                    self.col = s % vs_cols;
                } else {
                    let data = self.fb[s];
                    s = s.wrapping_sub(1);
                    self.write_data(data);
                    if self.flags.need_wrap {
                        self.cr();
                        self.lf();
                    }
                }
            }
        }

        self.flags = saved_flags;
        self.input_state = saved_state;
        self.row = saved_row;
        self.col = saved_col;
    }

    /// Pan the visible frame window by one step in one of four directions,
    /// independent of the cursor. Mirrors `browse_screen`.
    pub fn browse_screen(&mut self, dir: u8) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;
        let frame_rows = self.par.frame_rows();
        let frame_cols = self.par.frame_cols();
        let mut base_row = self.frame_base / vs_cols;
        let mut base_col = self.frame_base % vs_cols;

        match dir {
            b'1' => {
                if base_row == 0 {
                    return;
                }
                base_row -= 1;
            }
            b'2' => {
                if base_row >= vs_rows - frame_rows {
                    return;
                }
                base_row += 1;
            }
            b'3' => {
                if base_col == 0 {
                    return;
                }
                base_col -= 1;
            }
            b'4' => {
                if base_col >= vs_cols - frame_cols {
                    return;
                }
                base_col += 1;
            }
            _ => return,
        }

        self.frame_base = base_row * vs_cols + base_col;
        self.redraw_screen(0, self.par.fb_size() - 1);
    }

    /// Fill `len` cells starting at virtual offset `d` with `c`. Mirrors
    /// `lcd_memset`.
    pub(crate) fn lcd_memset(&mut self, mut d: usize, c: crate::cell::Cell, mut len: usize) {
        let fb_size = self.par.fb_size();
        if len == 0 || d >= fb_size {
            return;
        }
        let inc_set = self.direction.is_forward();

        if inc_set && d + len > fb_size {
            len = fb_size - d;
        } else if !inc_set && len > d + 1 {
            len = d + 1;
        }

        if !inc_set {
            d -= len - 1;
        }
        for cell in self.fb[d..d + len].iter_mut() {
            *cell = c;
        }

        if self.show_cursor() {
            self.redraw_screen(0, fb_size - 1);
        } else {
            self.redraw_screen(d, d + (len - 1));
        }
    }

    /// Non-destructively copy `len` cells from `s` to `d`. Display regions
    /// may overlap. Mirrors `lcd_memmove`.
    pub(crate) fn lcd_memmove(&mut self, mut d: usize, mut s: usize, mut len: usize) {
        let fb_size = self.par.fb_size();
        if len == 0 || d == s || d >= fb_size || s >= fb_size {
            return;
        }
        let inc_set = self.direction.is_forward();

        if d < s {
            if inc_set {
                if s + len > fb_size {
                    len = fb_size - s;
                }
            } else {
                if len > d + 1 {
                    len = d + 1;
                }
                d -= len - 1;
                s -= len - 1;
            }
            for i in 0..len {
                self.fb[d + i] = self.fb[s + i];
            }
            if self.show_cursor() {
                self.redraw_screen(0, fb_size - 1);
            } else {
                self.redraw_screen(d, d + (len - 1));
            }
        } else {
            if inc_set {
                if d + len > fb_size {
                    len = fb_size - d;
                }
                d += len - 1;
                s += len - 1;
            } else if len > s + 1 {
                len = s + 1;
            }
            for i in 0..len {
                self.fb[d - i] = self.fb[s - i];
            }
            if self.show_cursor() {
                self.redraw_screen(0, fb_size - 1);
            } else {
                self.redraw_screen(d - (len - 1), d);
            }
        }
    }

    /// Scroll rows `[t, b)` up by `nr` lines, pulling blank lines in from
    /// the bottom. Mirrors `scrup`.
    pub(crate) fn scrup(&mut self, t: usize, b: usize, mut nr: usize) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;

        if t + nr >= b {
            nr = b - t - 1;
        }
        if b > vs_rows || t >= b || nr < 1 {
            return;
        }
        let d = t * vs_cols;
        let s = (t + nr) * vs_cols;
        let erase = self.erase_char;
        if self.direction.is_forward() {
            self.lcd_memmove(d, s, (b - t - nr) * vs_cols);
            self.lcd_memset(d + (b - t - nr) * vs_cols, erase, nr * vs_cols);
        } else {
            self.lcd_memmove(
                d + (b - t - nr) * vs_cols - 1,
                s + (b - t - nr) * vs_cols - 1,
                (b - t - nr) * vs_cols,
            );
            self.lcd_memset(d + (b - t) * vs_cols - 1, erase, nr * vs_cols);
        }
    }

    /// Scroll rows `[t, b)` down by `nr` lines, pulling blank lines in from
    /// the top. Mirrors `scrdown`.
    pub(crate) fn scrdown(&mut self, t: usize, b: usize, mut nr: usize) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;

        if t + nr >= b {
            nr = b - t - 1;
        }
        if b > vs_rows || t >= b || nr < 1 {
            return;
        }
        let s = t * vs_cols;
        let d = (t + nr) * vs_cols;
        let erase = self.erase_char;
        if self.direction.is_forward() {
            self.lcd_memmove(d, s, (b - t - nr) * vs_cols);
            self.lcd_memset(s, erase, nr * vs_cols);
        } else {
            self.lcd_memmove(
                d + (b - t - nr) * vs_cols - 1,
                s + (b - t - nr) * vs_cols - 1,
                (b - t - nr) * vs_cols,
            );
            self.lcd_memset(s + nr * vs_cols - 1, erase, nr * vs_cols);
        }
    }

    /// Insert `nr` blank cells at the cursor, shifting the rest of the row
    /// away from it. Mirrors `lcd_insert_char`.
    pub(crate) fn insert_char(&mut self, nr: usize) {
        let vs_cols = self.par.vs_cols as usize;
        let pos = self.row * vs_cols + self.col;

        self.flags.need_wrap = false;
        if self.direction.is_forward() {
            self.lcd_memmove(pos + nr, pos, vs_cols - self.col - nr);
        } else {
            self.lcd_memmove(pos - nr, pos, self.col - (nr - 1));
        }
        let erase = self.erase_char;
        self.lcd_memset(pos, erase, nr);
    }

    /// Delete `nr` cells at the cursor, shifting the rest of the row toward
    /// it and filling the vacated end with blanks. Mirrors `lcd_delete_char`.
    pub(crate) fn delete_char(&mut self, nr: usize) {
        let vs_cols = self.par.vs_cols as usize;
        let pos = self.row * vs_cols + self.col;
        let erase = self.erase_char;

        self.flags.need_wrap = false;
        if self.direction.is_forward() {
            self.lcd_memmove(pos, pos + nr, vs_cols - (self.col + nr));
            self.lcd_memset((self.row + 1) * vs_cols - nr, erase, nr);
        } else {
            self.lcd_memmove(pos, pos - nr, self.col - (nr - 1));
            self.lcd_memset(self.row * vs_cols + (nr - 1), erase, nr);
        }
    }

    /// Toggle reverse video over `len` cells starting at `s`. Mirrors
    /// `lcd_invert_screen`.
    pub(crate) fn invert_screen(&mut self, s: usize, mut len: usize) {
        let fb_size = self.par.fb_size();
        if len == 0 || s >= fb_size {
            return;
        }
        let inc_set = self.direction.is_forward();
        if inc_set && s + len > fb_size {
            len = fb_size - s;
        } else if !inc_set && len > s + 1 {
            len = s + 1;
        }

        let can_do_color = self.flags.can_do_color;
        for i in 0..len {
            let cell = self.fb[s + i];
            self.fb[s + i] = if can_do_color {
                cell.with_attr(crate::attr::reverse_color_attr(cell.attr()))
            } else {
                cell.with_attr(cell.attr() ^ crate::attr::BLINK)
            };
        }

        if self.show_cursor() {
            self.redraw_screen(0, fb_size - 1);
        } else {
            self.redraw_screen(s, s + (len - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attr::AttrState;
    use crate::cell::Cell;
    use crate::cgram::CgramBank;
    use crate::driver::DriverPort;
    use crate::engine::{Engine, InitLevel};
    use crate::flags::{Direction, EscState, InputState, ModeFlags};
    use crate::params::Parameters;

    struct RecordingDriver {
        writes: Vec<(usize, Cell)>,
    }

    impl DriverPort for RecordingDriver {
        fn write_char(&mut self, offset: usize, cell: Cell) {
            self.writes.push((offset, cell));
        }
        fn init_port(&mut self) -> Result<(), &'static str> {
            Ok(())
        }
        fn cleanup_port(&mut self) -> Result<(), &'static str> {
            Ok(())
        }
    }

    fn test_engine(vs_rows: u16, vs_cols: u16, frame_rows: u16, frame_cols: u16) -> Engine {
        let par = Parameters {
            name: "t".into(),
            flags: 0,
            tabstop: 8,
            num_cntr: 1,
            cntr_rows: frame_rows,
            cntr_cols: frame_cols,
            vs_rows,
            vs_cols,
            cgram_chars: 0,
            cgram_bytes: 0,
            cgram_char0: 0,
        };
        let attr = AttrState::new(false);
        let erase_char = Cell::new(b' ', attr.erase_char_attr);
        Engine {
            fb: vec![erase_char; par.fb_size()],
            display: vec![erase_char; par.frame_size()],
            frame_base: 0,
            row: 0,
            col: 0,
            top: 0,
            bot: par.vs_rows as usize,
            s_offset: 0,
            s_color: attr.color,
            s_attributes: attr.attributes,
            direction: Direction::Forward,
            input_state: InputState::Normal,
            esc_state: EscState::None,
            esc_args: 0,
            arg_index: 0,
            flags: ModeFlags {
                decawm: true,
                ..ModeFlags::default()
            },
            attr,
            erase_char,
            csi_args: [0; crate::engine::NPAR],
            csi_index: 0,
            cgram_index: 0,
            cgram_staging: Vec::new(),
            cgram: CgramBank::new(&par),
            driver: Box::new(RecordingDriver { writes: Vec::new() }),
            own_charmap: Some({
                let mut t = [0u8; 256];
                for (i, b) in t.iter_mut().enumerate() {
                    *b = i as u8;
                }
                t
            }),
            par,
            init_level: InitLevel::DisplayUp,
        }
    }

    #[test]
    fn memset_fills_forward_run() {
        let mut e = test_engine(4, 10, 4, 10);
        let fill = Cell::new(b'x', 0);
        e.lcd_memset(2, fill, 3);
        assert_eq!(e.fb[2], fill);
        assert_eq!(e.fb[3], fill);
        assert_eq!(e.fb[4], fill);
        assert_ne!(e.fb[5], fill);
    }

    #[test]
    fn memset_reverse_fills_backward_run() {
        let mut e = test_engine(4, 10, 4, 10);
        e.direction = Direction::Reverse;
        let fill = Cell::new(b'x', 0);
        e.lcd_memset(5, fill, 3);
        assert_eq!(e.fb[3], fill);
        assert_eq!(e.fb[4], fill);
        assert_eq!(e.fb[5], fill);
        assert_ne!(e.fb[2], fill);
    }

    #[test]
    fn memmove_forward_copies_without_destroying_overlap() {
        let mut e = test_engine(4, 10, 4, 10);
        for i in 0..5 {
            e.fb[i] = Cell::new(b'a' + i as u8, 0);
        }
        e.lcd_memmove(2, 0, 5);
        assert_eq!(e.fb[2].glyph(), b'a');
        assert_eq!(e.fb[6].glyph(), b'a' + 4);
    }

    #[test]
    fn insert_char_shifts_row_right_and_blanks_gap() {
        let mut e = test_engine(2, 5, 2, 5);
        for i in 0..5 {
            e.fb[i] = Cell::new(b'a' + i as u8, 0);
        }
        e.row = 0;
        e.col = 1;
        e.insert_char(2);
        assert_eq!(e.fb[1], e.erase_char);
        assert_eq!(e.fb[2], e.erase_char);
        assert_eq!(e.fb[3].glyph(), b'b');
    }

    #[test]
    fn delete_char_shifts_row_left_and_blanks_tail() {
        let mut e = test_engine(2, 5, 2, 5);
        for i in 0..5 {
            e.fb[i] = Cell::new(b'a' + i as u8, 0);
        }
        e.row = 0;
        e.col = 1;
        e.delete_char(2);
        assert_eq!(e.fb[1].glyph(), b'd');
        assert_eq!(e.fb[3], e.erase_char);
        assert_eq!(e.fb[4], e.erase_char);
    }

    #[test]
    fn browse_screen_pans_without_moving_cursor() {
        let mut e = test_engine(10, 10, 4, 4);
        e.row = 0;
        e.col = 0;
        e.browse_screen(b'2');
        assert_eq!(e.frame_base / 10, 1);
        e.browse_screen(b'4');
        assert_eq!(e.frame_base % 10, 1);
    }
}

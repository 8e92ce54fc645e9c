//! ECMA-48 CSI (`ESC [`) sequence accumulation and dispatch.
//! Grounded on the original `handle_csi`/`csi_@`/`csi_J`/`csi_K`/`csi_L`/
//! `csi_M`/`csi_P`/`csi_X`/`csi_su`/`csi_m`/`csi_h`/`csi_l`/`csi_linux`/
//! `csi_r`.

use crate::attr;
use crate::engine::{Engine, NPAR};
use crate::flags::InputState;

impl Engine {
    /// Feed one byte while `InputState::Csi` is active. Mirrors
    /// `handle_csi`.
    pub(crate) fn handle_csi(&mut self, input: u8) {
        if self.csi_index >= NPAR {
            self.input_state = InputState::Normal;
            log::warn!("too many parameters in CSI escape sequence");
            return;
        }
        if input == b'?' {
            self.flags.ques = true;
            return;
        }
        if input == b';' {
            self.csi_index += 1;
            return;
        }
        if input.is_ascii_digit() {
            let slot = &mut self.csi_args[self.csi_index];
            *slot = slot.saturating_mul(10).saturating_add((input - b'0') as u32);
            return;
        }

        self.input_state = InputState::Normal;
        if !self.direction.is_forward() {
            return;
        }

        match input {
            b'h' => {
                self.csi_h(self.csi_args[0] as u8);
                self.flags.ques = false;
                return;
            }
            b'l' => {
                self.csi_l(self.csi_args[0] as u8);
                self.flags.ques = false;
                return;
            }
            _ => {}
        }
        self.flags.ques = false;

        match input {
            b'@' => self.csi_at(self.csi_args[0] as usize),
            b'G' | b'`' => {
                let mut n = self.csi_args[0];
                if n != 0 {
                    n -= 1;
                }
                let row = self.row as i64;
                self.gotoxy(n as i64, row);
            }
            b'A' => {
                let n = if self.csi_args[0] == 0 { 1 } else { self.csi_args[0] };
                let col = self.col as i64;
                self.gotoxy(col, self.row as i64 - n as i64);
            }
            b'B' | b'e' => {
                let n = if self.csi_args[0] == 0 { 1 } else { self.csi_args[0] };
                let col = self.col as i64;
                self.gotoxy(col, self.row as i64 + n as i64);
            }
            b'C' | b'a' => {
                let n = if self.csi_args[0] == 0 { 1 } else { self.csi_args[0] };
                let row = self.row as i64;
                self.gotoxy(self.col as i64 + n as i64, row);
            }
            b'D' => {
                let n = if self.csi_args[0] == 0 { 1 } else { self.csi_args[0] };
                let row = self.row as i64;
                self.gotoxy(self.col as i64 - n as i64, row);
            }
            b'E' => {
                let n = if self.csi_args[0] == 0 { 1 } else { self.csi_args[0] };
                self.gotoxy(0, self.row as i64 + n as i64);
            }
            b'F' => {
                let n = if self.csi_args[0] == 0 { 1 } else { self.csi_args[0] };
                self.gotoxy(0, self.row as i64 - n as i64);
            }
            b'd' => {
                let mut n = self.csi_args[0];
                if n != 0 {
                    n -= 1;
                }
                let col = self.col as i64;
                self.gotoxay(col, n as i64);
            }
            b'H' | b'f' => {
                let mut row = self.csi_args[0];
                if row != 0 {
                    row -= 1;
                }
                let mut col = self.csi_args[1];
                if col != 0 {
                    col -= 1;
                }
                self.gotoxay(col as i64, row as i64);
            }
            b'J' => self.csi_j(self.csi_args[0]),
            b'K' => self.csi_k(self.csi_args[0]),
            b'L' => self.csi_l_insert(self.csi_args[0] as usize),
            b'M' => self.csi_m_delete(self.csi_args[0] as usize),
            b'P' => self.csi_p(self.csi_args[0] as usize),
            b'X' => self.csi_x(self.csi_args[0] as usize),
            b'm' => self.csi_m(self.csi_index),
            b's' | b'u' => self.csi_su(input),
            b']' => self.csi_linux(),
            b'r' => {
                let mut top = self.csi_args[0];
                if top == 0 {
                    top = 1;
                }
                let mut bot = self.csi_args[1];
                if bot == 0 || bot > self.par.vs_rows as u32 {
                    bot = self.par.vs_rows as u32;
                }
                self.csi_r(top as usize, bot as usize);
            }
            b'c' | b'g' | b'n' | b'q' => {}
            other => {
                log::warn!("unrecognized CSI escape sequence: ESC [ {}", other as char);
            }
        }
    }

    /// `CSI @`: insert blank characters.
    fn csi_at(&mut self, mut nr: usize) {
        let vs_cols = self.par.vs_cols as usize;
        if self.col + nr > vs_cols {
            nr = vs_cols - self.col;
        } else if nr == 0 {
            nr += 1;
        }
        self.insert_char(nr);
    }

    /// `CSI J`: erase in display.
    fn csi_j(&mut self, action: u32) {
        let vs_cols = self.par.vs_cols as usize;
        let pos = self.row * vs_cols + self.col;
        let erase = self.erase_char;
        self.flags.need_wrap = false;
        match action {
            0 => {
                let fb_size = self.par.fb_size();
                self.lcd_memset(pos, erase, fb_size - pos);
            }
            1 => self.lcd_memset(0, erase, pos + 1),
            2 => {
                let fb_size = self.par.fb_size();
                self.lcd_memset(0, erase, fb_size);
            }
            _ => {}
        }
    }

    /// `CSI K`: erase in line.
    fn csi_k(&mut self, action: u32) {
        let vs_cols = self.par.vs_cols as usize;
        let row_start = self.row * vs_cols;
        let erase = self.erase_char;
        self.flags.need_wrap = false;
        match action {
            0 => self.lcd_memset(row_start + self.col, erase, vs_cols - self.col),
            1 => self.lcd_memset(row_start, erase, self.col + 1),
            2 => self.lcd_memset(row_start, erase, vs_cols),
            _ => {}
        }
    }

    /// `CSI L`: insert blank lines.
    fn csi_l_insert(&mut self, mut nr: usize) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;
        self.flags.need_wrap = false;
        if self.row + nr > vs_rows {
            nr = vs_rows - self.row;
        } else if nr == 0 {
            nr += 1;
        }
        let erase = self.erase_char;
        self.lcd_memmove((self.row + nr) * vs_cols, self.row * vs_cols, (vs_rows - self.row - nr) * vs_cols);
        self.lcd_memset(self.row * vs_cols, erase, nr * vs_cols);
    }

    /// `CSI M`: delete lines.
    fn csi_m_delete(&mut self, mut nr: usize) {
        let vs_rows = self.par.vs_rows as usize;
        let vs_cols = self.par.vs_cols as usize;
        self.flags.need_wrap = false;
        if self.row + nr > vs_rows {
            nr = vs_rows - self.row;
        } else if nr == 0 {
            nr += 1;
        }
        let erase = self.erase_char;
        self.lcd_memmove(self.row * vs_cols, (self.row + nr) * vs_cols, (vs_rows - self.row - nr) * vs_cols);
        self.lcd_memset((vs_rows - nr) * vs_cols, erase, nr * vs_cols);
    }

    /// `CSI P`: delete characters.
    fn csi_p(&mut self, mut nr: usize) {
        let vs_cols = self.par.vs_cols as usize;
        if self.col + nr > vs_cols {
            nr = vs_cols - self.col;
        } else if nr == 0 {
            nr += 1;
        }
        self.delete_char(nr);
    }

    /// `CSI X`: erase characters.
    fn csi_x(&mut self, mut nr: usize) {
        let vs_cols = self.par.vs_cols as usize;
        self.flags.need_wrap = false;
        if self.col + nr > vs_cols {
            nr = vs_cols - self.col;
        } else if nr == 0 {
            nr += 1;
        }
        let erase = self.erase_char;
        self.lcd_memset(self.row * vs_cols + self.col, erase, nr);
    }

    /// `CSI s` / `CSI u`: save/restore cursor position and attributes.
    /// Also the target of `ESC 7` / `ESC 8`, which use the same save slots.
    fn csi_su(&mut self, input: u8) {
        if input == b'u' {
            self.restore_cursor_and_attrs();
        } else {
            self.save_cursor_and_attrs();
        }
    }

    /// `CSI s` / `ESC 7`: latch cursor position and packed color/attributes.
    pub(crate) fn save_cursor_and_attrs(&mut self) {
        let vs_cols = self.par.vs_cols as usize;
        self.flags.need_wrap = false;
        self.s_offset = self.row * vs_cols + self.col;
        self.s_color = self.attr.color;
        self.s_attributes = self.attr.attributes;
    }

    /// `CSI u` / `ESC 8`: restore cursor position and packed color/attributes
    /// from the last [`Engine::save_cursor_and_attrs`] call.
    pub(crate) fn restore_cursor_and_attrs(&mut self) {
        let vs_cols = self.par.vs_cols as usize;
        self.flags.need_wrap = false;
        self.row = self.s_offset / vs_cols;
        self.col = self.s_offset % vs_cols;
        self.attr.color = self.s_color;
        self.attr.attributes = self.s_attributes;
        self.attr.update(self.flags.decscnm);
    }

    /// `CSI m`: set video attributes (SGR). Mirrors `csi_m` exactly,
    /// including its choice of `38`/`39` toggling underline rather than
    /// real extended-color SGR.
    fn csi_m(&mut self, n: usize) {
        for i in 0..=n {
            match self.csi_args[i] {
                0 => self.attr.default_attr(),
                1 => self.attr.attributes = (self.attr.attributes & !attr::I_MASK) | 2,
                2 => self.attr.attributes &= !attr::I_MASK,
                4 => self.attr.attributes |= attr::ULINE,
                5 => self.attr.attributes |= attr::BLINK,
                7 => self.attr.attributes |= attr::REVERSE,
                21 | 22 => self.attr.attributes = (self.attr.attributes & !attr::I_MASK) | 1,
                24 => self.attr.attributes &= !attr::ULINE,
                25 => self.attr.attributes &= !attr::BLINK,
                27 => self.attr.attributes &= !attr::REVERSE,
                38 => {
                    self.attr.attributes |= attr::ULINE;
                    self.attr.color = (self.attr.color & attr::BG_MASK) | (self.attr.defcolor & attr::FG_MASK);
                }
                39 => {
                    self.attr.attributes &= !attr::ULINE;
                    self.attr.color = (self.attr.color & attr::BG_MASK) | (self.attr.defcolor & attr::FG_MASK);
                }
                49 => {
                    self.attr.color = (self.attr.defcolor & attr::BG_MASK) | (self.attr.color & attr::FG_MASK);
                }
                arg @ 30..=37 => {
                    self.attr.color = (self.attr.color & attr::BG_MASK) | attr::COLOR_TABLE[(arg - 30) as usize];
                }
                arg @ 40..=47 => {
                    self.attr.color =
                        (self.attr.color & attr::FG_MASK) | (attr::COLOR_TABLE[(arg - 40) as usize] << 4);
                }
                _ => {}
            }
        }
        self.attr.update(self.flags.decscnm);
    }

    /// `CSI h`: DECSET / mode-set sequences.
    fn csi_h(&mut self, n: u8) {
        match n {
            4 => self.flags.decim = true,
            5 => {
                if self.flags.ques && !self.flags.decscnm {
                    let fb_size = self.par.fb_size();
                    self.invert_screen(0, fb_size);
                    self.flags.decscnm = true;
                    self.attr.update(self.flags.decscnm);
                }
            }
            6 => {
                if self.flags.ques {
                    self.flags.decom = true;
                    self.gotoxay(0, 0);
                }
            }
            7 => {
                if self.flags.ques {
                    self.flags.decawm = true;
                }
            }
            20 => self.flags.crlf = true,
            _ => {}
        }
    }

    /// `CSI l`: DECRST / mode-reset sequences.
    fn csi_l(&mut self, n: u8) {
        match n {
            4 => self.flags.decim = false,
            5 => {
                if self.flags.ques && self.flags.decscnm {
                    let fb_size = self.par.fb_size();
                    self.invert_screen(0, fb_size);
                    self.flags.decscnm = false;
                    self.attr.update(self.flags.decscnm);
                }
            }
            6 => {
                if self.flags.ques {
                    self.flags.decom = false;
                    self.gotoxay(0, 0);
                }
            }
            7 => {
                if self.flags.ques {
                    self.flags.decawm = false;
                }
            }
            20 => self.flags.crlf = false,
            _ => {}
        }
    }

    /// `CSI ]`: Linux-private sequences.
    fn csi_linux(&mut self) {
        match self.csi_args[0] {
            1 => {
                if self.flags.can_do_color && self.csi_args[1] < 16 {
                    self.attr.ulcolor = attr::COLOR_TABLE[self.csi_args[1] as usize];
                    if self.attr.attributes & attr::ULINE != 0 {
                        self.attr.update(self.flags.decscnm);
                    }
                }
            }
            2 => {
                if self.flags.can_do_color && self.csi_args[1] < 16 {
                    self.attr.halfcolor = attr::COLOR_TABLE[self.csi_args[1] as usize];
                    if self.attr.attributes & attr::I_MASK == 0 {
                        self.attr.update(self.flags.decscnm);
                    }
                }
            }
            8 => {
                self.attr.defcolor = self.attr.color;
                self.attr.default_attr();
                self.attr.update(self.flags.decscnm);
            }
            _ => {}
        }
    }

    /// `CSI r`: set the scrolling region.
    fn csi_r(&mut self, top: usize, bot: usize) {
        if top < bot {
            self.top = top - 1;
            self.bot = bot;
            self.gotoxay(0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attr::{self, AttrState};
    use crate::cell::Cell;
    use crate::cgram::CgramBank;
    use crate::driver::DriverPort;
    use crate::engine::{Engine, InitLevel, NPAR};
    use crate::flags::{Direction, EscState, InputState, ModeFlags};
    use crate::params::Parameters;

    struct NullDriver;
    impl DriverPort for NullDriver {
        fn write_char(&mut self, _offset: usize, _cell: Cell) {}
        fn init_port(&mut self) -> Result<(), &'static str> {
            Ok(())
        }
        fn cleanup_port(&mut self) -> Result<(), &'static str> {
            Ok(())
        }
    }

    fn test_engine() -> Engine {
        let par = Parameters {
            name: "t".into(),
            flags: 0,
            tabstop: 8,
            num_cntr: 1,
            cntr_rows: 4,
            cntr_cols: 10,
            vs_rows: 4,
            vs_cols: 10,
            cgram_chars: 0,
            cgram_bytes: 0,
            cgram_char0: 0,
        };
        let attr = AttrState::new(true);
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
                can_do_color: true,
                ..ModeFlags::default()
            },
            attr,
            erase_char,
            csi_args: [0; NPAR],
            csi_index: 0,
            cgram_index: 0,
            cgram_staging: Vec::new(),
            cgram: CgramBank::new(&par),
            driver: Box::new(NullDriver),
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
    fn csi_m_bold_sets_high_intensity() {
        let mut e = test_engine();
        e.csi_args[0] = 1;
        e.csi_m(0);
        assert_eq!(e.attr.attributes & attr::I_MASK, 2);
    }

    #[test]
    fn csi_m_reset_restores_default_color() {
        let mut e = test_engine();
        e.attr.color = 0xaa;
        e.csi_args[0] = 0;
        e.csi_m(0);
        assert_eq!(e.attr.color, e.attr.defcolor);
    }

    #[test]
    fn csi_j_whole_display_blanks_everything() {
        let mut e = test_engine();
        e.fb[0] = Cell::new(b'x', 0);
        e.csi_args[0] = 2;
        e.csi_j(2);
        assert_eq!(e.fb[0], e.erase_char);
    }

    #[test]
    fn csi_r_sets_scrolling_region_and_homes_cursor() {
        let mut e = test_engine();
        e.row = 3;
        e.col = 3;
        e.csi_r(2, 4);
        assert_eq!(e.top, 1);
        assert_eq!(e.bot, 4);
        assert_eq!(e.row, 1);
    }
}

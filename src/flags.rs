//! Named replacement for the original `struct_flags` packed word:
//! re-architected here as a small record of named fields rather than a
//! bitmask.
//!
//! `driver_framework` itself favors small `Copy` enums (`LCDStatus` in
//! `hd44780.rs`'s lineage, `ResourceKind` in `device.rs`) over bitmasks for
//! exactly this reason: exhaustive `match` beats manual
//! bit twiddling. `Direction` is cross-cutting — every motion primitive,
//! every memset/memmove, every scroll and wrap depends on it — so it gets
//! its own type rather than a bit read at each call site.

/// The address-counter's write direction. `Forward` increments after each
/// write (the ordinary case); `Reverse` decrements, which mirrors every
/// motion primitive, wrap direction, and memset/memmove span orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }

    pub fn flip(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// The top-level input dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Normal,
    Raw,
    Syn,
    Esc,
    Csi,
    EscG0,
    EscG1,
    EscHash,
    EscPercent,
    /// Waiting for `n` more bytes to feed into the engine's own pending
    /// custom-escape assembly (CGRAM select, scroll/browse, address mode).
    Arg,
    /// Waiting for `n` more bytes to feed into the driver's
    /// `handle_custom_char` callback.
    ArgDriver,
}

/// Which custom (non-ECMA-48) escape is currently collecting its argument
/// bytes. Replaces the original's `ESC_STATE` byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscState {
    /// No pending custom escape.
    None,
    /// `ESC s` — CGRAM character select + bitmap upload.
    CgramSelect,
    /// `ESC G` — one-shot CGRAM/normal character dispatch.
    CgramChar,
    /// `ESC r` — address-mode select (`0` forward, `1` reverse).
    AddressMode,
    /// `ESC A` — scroll up by N lines.
    ScrollUp,
    /// `ESC B` — scroll down by N lines.
    ScrollDown,
    /// `ESC C` — browse (pan) the frame window by one direction byte.
    Browse,
}

/// Boolean mode flags, kept as named fields instead of a bitmask so each one
/// is independently readable/settable and exhaustive matching elsewhere
/// never has to mask/shift.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeFlags {
    /// `NEED_WRAP`: the next printable byte triggers a cr+lf (or reverse
    /// equivalent) before it is written.
    pub need_wrap: bool,
    /// `DECIM`: insert mode.
    pub decim: bool,
    /// `DECOM`: cursor row addressing is relative to the scrolling region.
    pub decom: bool,
    /// `DECAWM`: autowrap enabled.
    pub decawm: bool,
    /// `DECSCNM`: whole screen is shown inverted.
    pub decscnm: bool,
    /// `CRLF`: LF/VT/FF additionally performs a CR.
    pub crlf: bool,
    /// `QUES`: the CSI sequence currently being accumulated began with `?`.
    pub ques: bool,
    /// `NULL_CHARMAP`: the engine supplied an identity charmap because the
    /// driver didn't provide one.
    pub null_charmap: bool,
    /// `CAN_DO_COLOR`: the driver validated as color-capable.
    pub can_do_color: bool,
}

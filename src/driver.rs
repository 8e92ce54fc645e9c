//! The driver port: the engine's only way of reaching a real character
//! device. Shaped like `driver_framework::driver`'s `Driver` trait
//! (`probe`/`start`/`stop`/`release`), which every concrete device driver
//! implements and which the engine (here, the analogue of
//! `driver_framework::manager::DeviceManager`) calls through.
//!
//! The original's function-pointer struct is a set of capability callbacks
//! with independent optionality, each checked for null before use. A Rust
//! trait with provided (default) methods gives the same shape without the
//! null check: a method either got overridden (capability present) or falls
//! back to its default (capability absent), and every call site below
//! inspects the return value rather than testing for a null pointer.

use crate::flags::Direction;

/// Outcome of [`DriverPort::validate`]: whether the attached device is
/// color-capable. Absence of an override (`None` returned by `validate`)
/// means "the driver performs no validation"; the engine then behaves as if
/// mono, exactly as the original treats a missing `validate_driver` pointer.
pub type ValidateResult = Result<bool, &'static str>;

/// The set of callbacks the engine requires or may optionally call into.
/// Implementors own the real device; the engine only ever calls these
/// methods in strictly nested fashion (engine -> driver -> return), never
/// concurrently.
pub trait DriverPort {
    /// Write one cell to frame position `offset`. Required.
    fn write_char(&mut self, offset: usize, cell: crate::cell::Cell);

    /// Initialize the communication port (init level 1). Required.
    fn init_port(&mut self) -> Result<(), &'static str>;

    /// Tear down the communication port (init level 1, in reverse). Required.
    fn cleanup_port(&mut self) -> Result<(), &'static str>;

    /// Read back one cell at frame position `offset`, if the driver can.
    fn read_char(&mut self, _offset: usize) -> Option<crate::cell::Cell> {
        None
    }

    /// Read back the bitmap currently stored in CGRAM for `index`, if the
    /// driver can.
    fn read_cgram_char(&mut self, _index: u8) -> Option<Vec<u8>> {
        None
    }

    /// Whether the driver can accept a CGRAM upload at all. Checked before
    /// the engine starts collecting an `ESC s` bitmap; `false` aborts the
    /// sequence immediately as a local "unsupported operation" error rather
    /// than silently absorbing the bitmap bytes.
    fn supports_cgram(&self) -> bool {
        false
    }

    /// Write a full CGRAM glyph bitmap. Returns whether the write succeeded;
    /// the engine surfaces a failure as a local sequence error.
    fn write_cgram_char(&mut self, _index: u8, _bitmap: &[u8]) -> bool {
        false
    }

    /// Clear the whole physical display in one shot. Returning `false`
    /// tells the engine no such fast path exists, so it should fall back to
    /// a plain `memset` of the framebuffer instead.
    fn clear_display(&mut self) -> bool {
        false
    }

    /// Set the device's hardware address-counter direction. Optional: many
    /// devices only support one direction and ignore this.
    fn address_mode(&mut self, _dir: Direction) {}

    /// Initialize the display itself (init level 2), after the port is up.
    fn init_display(&mut self) -> Result<(), &'static str> {
        Ok(())
    }

    /// Tear down the display (init level 2, in reverse).
    fn cleanup_display(&mut self) -> Result<(), &'static str> {
        Ok(())
    }

    /// Validate driver/device compatibility and report color capability.
    /// `None` means "no validation is performed" (the original's null
    /// `validate_driver` pointer); the engine then assumes monochrome.
    fn validate(&mut self) -> Option<ValidateResult> {
        None
    }

    /// A 256-entry input-byte -> device-glyph translation table. `None`
    /// means the driver has none, and the engine supplies an identity
    /// table of its own (flagged `NULL_CHARMAP` in the original).
    fn charmap(&self) -> Option<&[u8; 256]> {
        None
    }

    /// Begin handling a driver-specific escape byte not recognized by the
    /// engine. Returning `Some(n)` means the driver claims this sequence
    /// and wants `n` further bytes fed to [`DriverPort::handle_custom_char_arg`].
    /// `None` means the driver doesn't recognize it either.
    fn handle_custom_char(&mut self, _code: u8) -> Option<u32> {
        None
    }

    /// Feed one further byte of a driver-specific escape sequence begun by
    /// [`DriverPort::handle_custom_char`]. Returns whether the sequence is
    /// now complete. Any non-zero/true return ends the sequence (see
    /// DESIGN.md, "ARG's discarded return value").
    fn handle_custom_char_arg(&mut self, _byte: u8) -> bool {
        true
    }

    /// Driver-specific ioctl passthrough. `None` means unsupported.
    fn handle_custom_ioctl(&mut self, _cmd: u32, _arg: u64, _from_userspace: bool) -> Option<i32> {
        None
    }
}

//! # VGA text console
//!
//! Row-addressed output to the 80x25 text buffer and hardware cursor
//! placement. Diagnostics use fixed rows rather than a scrolling cursor so
//! they stay readable after a fault.

use crate::utils::io::Hardware;
use core::fmt;

pub const VGA_BUFFER_ADDRESS: usize = 0xb8000;
pub const VGA_COLUMNS: usize = 80;
pub const VGA_ROWS: usize = 25;
const VGA_CTRL_REGISTER: u16 = 0x3d4;
const VGA_DATA_REGISTER: u16 = 0x3d5;
const CURSOR_LOW: u8 = 0x0f;
const CURSOR_HIGH: u8 = 0x0e;

/// Light gray on black.
pub const DEFAULT_ATTRIBUTE: u8 = 0x07;

/// Two-character escape that moves output to the start of the next row.
const LINE_BREAK: &[u8; 2] = b"/n";

/// Somewhere diagnostics can be written one row at a time.
pub trait TextSink {
	/// Writes `text` starting at column 0 of `row`.
	fn write_line(&mut self, row: usize, text: &str);
}

/// The memory-mapped text buffer.
pub struct VgaText {
	buffer: *mut u16,
}

// SAFETY: the kernel runs on one core; callers serialise access themselves.
unsafe impl Send for VgaText {}

impl VgaText {
	/// # Safety
	///
	/// `buffer` must point to `VGA_COLUMNS * VGA_ROWS` writable cells.
	pub const unsafe fn new(buffer: *mut u16) -> Self {
		VgaText { buffer }
	}

	/// The hardware text buffer at `0xb8000`.
	///
	/// # Safety
	///
	/// Only valid with identity-mapped low memory in text mode.
	pub const unsafe fn hardware() -> Self {
		Self::new(VGA_BUFFER_ADDRESS as *mut u16)
	}

	fn put(&mut self, row: usize, column: usize, byte: u8) {
		if row >= VGA_ROWS || column >= VGA_COLUMNS {
			return;
		}
		let cell = (DEFAULT_ATTRIBUTE as u16) << 8 | byte as u16;
		unsafe {
			self.buffer
				.add(row * VGA_COLUMNS + column)
				.write_volatile(cell);
		}
	}

	/// Cell at `row`, `column`, or `None` off screen.
	pub fn read(&self, row: usize, column: usize) -> Option<u16> {
		if row >= VGA_ROWS || column >= VGA_COLUMNS {
			return None;
		}
		Some(unsafe { self.buffer.add(row * VGA_COLUMNS + column).read_volatile() })
	}

	/// Fills every cell with a blank.
	pub fn clear_screen(&mut self) {
		for row in 0..VGA_ROWS {
			for column in 0..VGA_COLUMNS {
				self.put(row, column, b' ');
			}
		}
	}

	/// Writes `bytes` from the start of `row`; `/n` continues on the next row.
	/// Returns the row output ended on.
	pub fn write_bytes(&mut self, mut row: usize, bytes: &[u8]) -> usize {
		let mut column = 0;
		let mut i = 0;
		while i < bytes.len() {
			if bytes[i..].starts_with(LINE_BREAK) {
				row += 1;
				column = 0;
				i += LINE_BREAK.len();
				continue;
			}
			self.put(row, column, bytes[i]);
			column += 1;
			i += 1;
		}
		row
	}

	/// Formats `args` onto `row`.
	pub fn write_fmt_at(&mut self, row: usize, args: fmt::Arguments) {
		struct RowWriter<'a> {
			vga: &'a mut VgaText,
			row: usize,
			column: usize,
		}

		impl fmt::Write for RowWriter<'_> {
			fn write_str(&mut self, s: &str) -> fmt::Result {
				for byte in s.bytes() {
					self.vga.put(self.row, self.column, byte);
					self.column += 1;
				}
				Ok(())
			}
		}

		let mut writer = RowWriter {
			vga: self,
			row,
			column: 0,
		};
		let _ = fmt::Write::write_fmt(&mut writer, args);
	}
}

impl TextSink for VgaText {
	fn write_line(&mut self, row: usize, text: &str) {
		self.write_bytes(row, text.as_bytes());
	}
}

/// Places the blinking hardware cursor.
pub fn set_cursor<H: Hardware + ?Sized>(hw: &mut H, row: usize, column: usize) {
	let position = (row * VGA_COLUMNS + column) as u16;

	hw.outb(VGA_CTRL_REGISTER, CURSOR_LOW);
	hw.outb(VGA_DATA_REGISTER, (position & 0xff) as u8);
	hw.outb(VGA_CTRL_REGISTER, CURSOR_HIGH);
	hw.outb(VGA_DATA_REGISTER, ((position >> 8) & 0xff) as u8);
}

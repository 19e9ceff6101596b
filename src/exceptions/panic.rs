//! Kernel panics are handled like CPU exceptions: report, then halt.

use crate::utils::debug::LogLevel;
use crate::utils::io::{halt_forever, Hardware};
use crate::vga::console::{TextSink, VGA_COLUMNS};
use core::fmt::{self, Display, Write};

const PANIC_ROW: usize = 10;

/// One console row of formatted text, truncated at the screen width.
struct RowBuffer {
	bytes: [u8; VGA_COLUMNS],
	len: usize,
}

impl RowBuffer {
	fn new() -> Self {
		RowBuffer {
			bytes: [0; VGA_COLUMNS],
			len: 0,
		}
	}

	fn as_str(&self) -> &str {
		// Truncation only ever happens on a char boundary, see write_str.
		core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
	}
}

impl fmt::Write for RowBuffer {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		for c in s.chars() {
			let width = c.len_utf8();
			if self.len + width > self.bytes.len() {
				break;
			}
			c.encode_utf8(&mut self.bytes[self.len..]);
			self.len += width;
		}
		Ok(())
	}
}

pub fn handle_panic<H, S, D>(hw: &mut H, screen: &mut S, info: &D) -> !
where
	H: Hardware + ?Sized,
	S: TextSink + ?Sized,
	D: Display + ?Sized,
{
	log!(LogLevel::Panic, "{}", info);

	let mut row = RowBuffer::new();
	let _ = write!(row, "{}", info);
	screen.write_line(PANIC_ROW, row.as_str());
	screen.write_line(PANIC_ROW + 1, "See serial output for more information.");

	halt_forever(hw)
}

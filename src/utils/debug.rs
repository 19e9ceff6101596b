//! # Serial Port Debugging Module
//!
//! Kernel log output over the first serial port. The [`SerialPort`] logic is
//! written against [`Hardware`] so it can be checked on the simulated bus;
//! [`DEBUG`] binds it to the real CPU for the `log!` macro.

use crate::utils::io::{Cpu, Hardware};
use core::fmt;
use lazy_static::lazy_static;
use spin::Mutex;

const SERIAL_PORT: u16 = 0x3f8;
const LINE_STATUS_OFFSET: u16 = 5;
const TRANSMIT_EMPTY: u8 = 0x20;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Panic,
	Emergency,
	Alert,
	Critical,
	Error,
	Warning,
	Notice,
	Info,
	Debug,
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			LogLevel::Panic => "PANIC",
			LogLevel::Emergency => "EMERGENCY",
			LogLevel::Alert => "ALERT",
			LogLevel::Critical => "CRITICAL",
			LogLevel::Error => "ERROR",
			LogLevel::Warning => "WARNING",
			LogLevel::Notice => "NOTICE",
			LogLevel::Info => "INFO",
			LogLevel::Debug => "DEBUG",
		}
	}
}

/// A 16550-compatible UART at a fixed base port.
#[derive(Debug, Clone, Copy)]
pub struct SerialPort {
	base: u16,
}

impl SerialPort {
	pub const fn new(base: u16) -> Self {
		SerialPort { base }
	}

	/// 38400 baud, 8N1, FIFO enabled.
	pub fn init<H: Hardware + ?Sized>(&self, hw: &mut H) {
		hw.outb(self.base + 1, 0x00);
		hw.outb(self.base + 3, 0x80);
		hw.outb(self.base, 0x03);
		hw.outb(self.base + 1, 0x00);
		hw.outb(self.base + 3, 0x03);
		hw.outb(self.base + 2, 0xc7);
		hw.outb(self.base + 4, 0x0b);
	}

	fn is_transmit_empty<H: Hardware + ?Sized>(&self, hw: &mut H) -> bool {
		hw.inb(self.base + LINE_STATUS_OFFSET) & TRANSMIT_EMPTY != 0
	}

	fn write_byte<H: Hardware + ?Sized>(&self, hw: &mut H, byte: u8) {
		while !self.is_transmit_empty(hw) {}
		hw.outb(self.base, byte);
	}

	/// Writes `s`, following every `\n` with `\r`.
	pub fn write_str<H: Hardware + ?Sized>(&self, hw: &mut H, s: &str) {
		for byte in s.bytes() {
			self.write_byte(hw, byte);
			if byte == b'\n' {
				self.write_byte(hw, b'\r');
			}
		}
	}
}

lazy_static! {
	pub static ref DEBUG: Mutex<SerialWriter> = Mutex::new(SerialWriter {
		port: SerialPort::new(SERIAL_PORT),
	});
}

/// COM1 on the real CPU.
pub struct SerialWriter {
	port: SerialPort,
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl fmt::Write for SerialWriter {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		self.port.write_str(&mut Cpu, s);
		Ok(())
	}
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn init_serial_port() {
	DEBUG.lock().port.init(&mut Cpu);
	log!(LogLevel::Info, "Serial port initialized");
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::utils::sim::SimHardware;

	#[test]
	fn newline_is_followed_by_carriage_return() {
		let mut hw = SimHardware::new();
		let port = SerialPort::new(SERIAL_PORT);

		port.write_str(&mut hw, "ok\n");

		assert_eq!(hw.writes_to(SERIAL_PORT), b"ok\n\r".to_vec());
	}

	#[test]
	fn init_programs_divisor_and_fifo() {
		let mut hw = SimHardware::new();
		SerialPort::new(SERIAL_PORT).init(&mut hw);

		assert_eq!(hw.writes_to(SERIAL_PORT + 3), vec![0x80, 0x03]);
		assert_eq!(hw.writes_to(SERIAL_PORT), vec![0x03]);
		assert_eq!(hw.writes_to(SERIAL_PORT + 2), vec![0xc7]);
	}

	#[test]
	fn level_names() {
		assert_eq!(LogLevel::Panic.as_str(), "PANIC");
		assert_eq!(LogLevel::Warning.as_str(), "WARNING");
	}
}

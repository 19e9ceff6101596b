//! # CPU exceptions
//!
//! Vectors 0..32 are reserved for processor exceptions. Nothing in this
//! kernel can repair the state behind a fault, so every exception reports
//! itself and stops the machine.

use crate::exceptions::interrupts::Registers;
use crate::utils::debug::LogLevel;
use crate::utils::io::{halt_forever, Hardware};
use crate::vga::console::TextSink;

/// Number of vectors reserved for exceptions.
pub const EXCEPTION_VECTORS: usize = 32;

/// Console row of the exception name.
const MESSAGE_ROW: usize = 7;
/// Console row of the halt notice.
const HALTED_ROW: usize = 8;
const HALTED_NOTICE: &str = "   Exception. System Halted!";

/// Message for each exception vector.
pub const EXCEPTION_MESSAGES: [&str; EXCEPTION_VECTORS] = [
	"Division By Zero",
	"Debug",
	"Non Maskable Interrupt",
	"Breakpoint",
	"Into Detected Overflow",
	"Out of Bounds",
	"Invalid Opcode",
	"No Coprocessor",
	"Double Fault",
	"Coprocessor Segment Overrun",
	"Bad TSS",
	"Segment Not Present",
	"Stack Fault",
	"General Protection Fault",
	"Page Fault",
	"Unknown Interrupt",
	"Coprocessor Fault",
	"Alignment Check",
	"Machine Check",
	"SIMD Floating-Point Exception",
	"Virtualization Exception",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
	"Reserved",
];

/// Vectors for which the CPU pushes an error code.
pub const fn has_error_code(vector: u8) -> bool {
	matches!(vector, 8 | 10..=14 | 17)
}

/// The message for `vector`, or `None` for non-exception vectors.
pub fn exception_message(vector: u32) -> Option<&'static str> {
	EXCEPTION_MESSAGES.get(vector as usize).copied()
}

/// Entry point for vectors 0..32.
///
/// Writes the exception name and the halt notice to the console, logs the
/// full snapshot, then halts with interrupts disabled and never returns.
/// A vector outside the exception range is logged and ignored.
pub fn handle_fault<H, S>(hw: &mut H, screen: &mut S, regs: &Registers)
where
	H: Hardware + ?Sized,
	S: TextSink + ?Sized,
{
	let Some(message) = exception_message(regs.int_no) else {
		log!(LogLevel::Warning, "fault handler entered for vector {}", regs.int_no);
		return;
	};

	screen.write_line(MESSAGE_ROW, message);
	screen.write_line(HALTED_ROW, HALTED_NOTICE);

	log!(
		LogLevel::Panic,
		"EXCEPTION {}: {} (error code {:#x}) at {:#010x}",
		regs.int_no,
		message,
		regs.err_code,
		regs.eip
	);
	log!(LogLevel::Panic, "{:#x?}", regs);

	halt_forever(hw)
}

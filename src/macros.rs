//! # Macros and Printing Utilities
//!
//! Serial logging macros (`print_serial!`, `println_serial!`, `log!`) and the
//! entry stub generators used to build one trampoline per interrupt vector.

use core::fmt;

/// Macro for printing formatted text to the serial port.
///
/// This macro uses the global `DEBUG` instance to output text to COM1.
#[macro_export]
macro_rules! print_serial {
	($($arg:tt)*) => {
		$crate::macros::print_serial(format_args!($($arg)*))
	};
}

/// Macro for printing formatted text with a newline to the serial port.
#[macro_export]
macro_rules! println_serial {
	() => ($crate::print_serial!("\n"));
	($($arg:tt)*) => ($crate::print_serial!("{}\n", format_args!($($arg)*)));
}

/// Logs a line prefixed with the level name, e.g. `INFO: IDT loaded`.
#[macro_export]
macro_rules! log {
	($level:expr, $($arg:tt)*) => {{
		let level_str = $level.as_str();
		$crate::macros::print_serial(format_args!("{}", level_str));
		$crate::macros::print_serial(format_args!(": {}\n", format_args!($($arg)*)));
	}};
}

/// Generates an entry stub for a vector where the CPU pushes no error code.
///
/// The stub pushes a zero error code and the vector number so every vector
/// leaves the same layout on the stack, then jumps to the common stub.
#[macro_export]
macro_rules! isr {
	($name:ident, $vector:expr, $common:path) => {
		#[unsafe(naked)]
		pub extern "C" fn $name() {
			core::arch::naked_asm!(
				"push 0",
				"push {vector}",
				"jmp {common}",
				vector = const $vector,
				common = sym $common,
			);
		}
	};
}

/// Generates an entry stub for a vector where the CPU already pushed an
/// error code.
#[macro_export]
macro_rules! isr_with_error_code {
	($name:ident, $vector:expr, $common:path) => {
		#[unsafe(naked)]
		pub extern "C" fn $name() {
			core::arch::naked_asm!(
				"push {vector}",
				"jmp {common}",
				vector = const $vector,
				common = sym $common,
			);
		}
	};
}

/// Generates the stub shared by a group of vectors.
///
/// Saves the general purpose and segment registers in the order of
/// `Registers`, switches to the kernel data segment, calls `$handler` with a
/// pointer to the snapshot, restores everything, discards the vector and
/// error code, and returns from the interrupt.
#[macro_export]
macro_rules! isr_common {
	($name:ident, $handler:path) => {
		#[unsafe(naked)]
		extern "C" fn $name() {
			core::arch::naked_asm!(
				"pushad",
				"push ds",
				"push es",
				"push fs",
				"push gs",
				"mov ax, 0x10",
				"mov ds, ax",
				"mov es, ax",
				"mov fs, ax",
				"mov gs, ax",
				"push esp",
				"call {handler}",
				"add esp, 4",
				"pop gs",
				"pop fs",
				"pop es",
				"pop ds",
				"popad",
				"add esp, 8",
				"iretd",
				handler = sym $handler,
			);
		}
	};
}

/// Prints formatted text to the serial port.
///
/// Masks interrupts while `DEBUG` is held so a handler that logs cannot spin
/// on a lock taken by the code it interrupted.
#[cfg(not(test))]
pub fn print_serial(args: fmt::Arguments) {
	use crate::utils::io::{without_interrupts, Cpu};
	use core::fmt::Write;

	without_interrupts(&mut Cpu, |_| {
		let _ = crate::utils::debug::DEBUG.lock().write_fmt(args);
	});
}

#[cfg(test)]
pub fn print_serial(args: fmt::Arguments) {
	std::eprint!("{}", args);
}

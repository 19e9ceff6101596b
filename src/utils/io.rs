//! # Port I/O and interrupt flag access
//!
//! Everything that touches the machine directly goes through the [`Hardware`]
//! trait, so the PIC, keyboard, timer and dispatch code can run against the
//! real CPU ([`Cpu`]) or a simulated bus in the tests.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use core::arch::asm;

/// Interrupt flag bit in EFLAGS.
const EFLAGS_IF: usize = 1 << 9;

/// Privileged operations the interrupt subsystem needs from the CPU.
pub trait Hardware {
	/// Read a byte from an I/O port.
	fn inb(&mut self, port: u16) -> u8;

	/// Write a byte to an I/O port.
	fn outb(&mut self, port: u16, value: u8);

	/// Set the interrupt flag (`sti`).
	fn enable_interrupts(&mut self);

	/// Clear the interrupt flag (`cli`).
	fn disable_interrupts(&mut self);

	/// Whether IF is set in EFLAGS.
	fn interrupts_enabled(&self) -> bool;

	/// Halt until the next external interrupt (`hlt`).
	fn wait_for_interrupt(&mut self);
}

/// Runs `f` with interrupts disabled and restores the previous interrupt flag.
///
/// This is the only critical section available on a single core: while the
/// flag is clear no dispatcher can run.
pub fn without_interrupts<H, F, R>(hw: &mut H, f: F) -> R
where
	H: Hardware + ?Sized,
	F: FnOnce(&mut H) -> R,
{
	let enabled = hw.interrupts_enabled();
	if enabled {
		hw.disable_interrupts();
	}
	let result = f(hw);
	if enabled {
		hw.enable_interrupts();
	}
	result
}

/// Disables interrupts and halts forever.
pub fn halt_forever<H: Hardware + ?Sized>(hw: &mut H) -> ! {
	hw.disable_interrupts();
	loop {
		hw.wait_for_interrupt();
	}
}

/// The real processor.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cpu;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Hardware for Cpu {
	fn inb(&mut self, port: u16) -> u8 {
		unsafe { inb(port) }
	}

	fn outb(&mut self, port: u16, value: u8) {
		unsafe { outb(port, value) }
	}

	fn enable_interrupts(&mut self) {
		unsafe {
			asm!("sti", options(preserves_flags, nostack));
		}
	}

	fn disable_interrupts(&mut self) {
		unsafe {
			asm!("cli", options(preserves_flags, nostack));
		}
	}

	fn interrupts_enabled(&self) -> bool {
		let flags: usize;
		unsafe {
			#[cfg(target_arch = "x86")]
			asm!("pushfd", "pop {}", out(reg) flags, options(nomem, preserves_flags));
			#[cfg(target_arch = "x86_64")]
			asm!("pushfq", "pop {}", out(reg) flags, options(nomem, preserves_flags));
		}
		flags & EFLAGS_IF != 0
	}

	fn wait_for_interrupt(&mut self) {
		unsafe {
			asm!("hlt", options(nomem, nostack, preserves_flags));
		}
	}
}

/// Read a byte from a port.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub unsafe fn inb(port: u16) -> u8 {
	let value: u8;
	asm!("in al, dx", out("al") value, in("dx") port, options(nomem, nostack));
	value
}

/// Write a byte to a port.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub unsafe fn outb(port: u16, value: u8) {
	asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack));
}

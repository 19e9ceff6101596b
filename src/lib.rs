//! Interrupt subsystem of a small protected-mode x86 kernel: IDT, PIC remap,
//! exception and IRQ dispatch, PIT tick counter and PS/2 keyboard.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]

#[macro_use]
pub mod macros;

pub mod exceptions;
pub mod kernel;
pub mod structures;
pub mod utils;
pub mod vga;

#[cfg(not(test))]
use core::panic::PanicInfo;

/// Entered from the boot code once the CPU is in protected mode with a flat
/// GDT and interrupts disabled.
#[cfg(all(target_arch = "x86", not(test)))]
#[no_mangle]
pub extern "C" fn kmain() -> ! {
	use crate::exceptions::keyboard::NO_CHAR;
	use crate::exceptions::trampolines::gate_addresses;
	use crate::exceptions::timer::seconds_to_ticks;
	use crate::kernel::KERNEL;
	use crate::utils::io::{Cpu, Hardware};
	use crate::vga::console::{set_cursor, TextSink, VgaText};

	let mut cpu = Cpu;
	let mut screen = unsafe { VgaText::hardware() };

	utils::debug::init_serial_port();
	KERNEL.init(&mut cpu, &gate_addresses());
	unsafe { KERNEL.load_idt() };
	cpu.enable_interrupts();

	screen.clear_screen();
	screen.write_line(0, "Welcome to WelcomeBack OS.");
	screen.write_line(1, "The C kernel has been loaded.");
	set_cursor(&mut cpu, 3, 0);

	KERNEL
		.timer
		.wait_with(&mut cpu, &KERNEL.irqs, seconds_to_ticks(1), |_| {
			screen.write_line(8, "waiting time runs");
		});
	screen.write_line(9, "waiting time has passed");

	loop {
		let key = KERNEL.keyboard.get_char(&mut cpu);
		if key != NO_CHAR {
			screen.clear_screen();
			screen.write_fmt_at(0, format_args!("{}", key as char));
			screen.write_fmt_at(1, format_args!("{}", key));
			screen.write_fmt_at(2, format_args!("{:02X}", key));
		}
		cpu.wait_for_interrupt();
	}
}

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
	let mut screen = unsafe { vga::console::VgaText::hardware() };
	exceptions::panic::handle_panic(&mut utils::io::Cpu, &mut screen, info)
}

//! Per-vector entry stubs.
//!
//! Each stub normalises the stack (dummy error code where the CPU pushes
//! none, then the vector) and jumps to a common stub that saves the rest of
//! [`Registers`](crate::exceptions::interrupts::Registers) and calls the
//! matching dispatcher.

use crate::kernel::{fault_handler, irq_handler, GateAddresses};
use crate::{isr, isr_common, isr_with_error_code};

isr_common!(fault_common, fault_handler);
isr_common!(irq_common, irq_handler);

isr!(isr0, 0, fault_common);
isr!(isr1, 1, fault_common);
isr!(isr2, 2, fault_common);
isr!(isr3, 3, fault_common);
isr!(isr4, 4, fault_common);
isr!(isr5, 5, fault_common);
isr!(isr6, 6, fault_common);
isr!(isr7, 7, fault_common);
isr_with_error_code!(isr8, 8, fault_common);
isr!(isr9, 9, fault_common);
isr_with_error_code!(isr10, 10, fault_common);
isr_with_error_code!(isr11, 11, fault_common);
isr_with_error_code!(isr12, 12, fault_common);
isr_with_error_code!(isr13, 13, fault_common);
isr_with_error_code!(isr14, 14, fault_common);
isr!(isr15, 15, fault_common);
isr!(isr16, 16, fault_common);
isr_with_error_code!(isr17, 17, fault_common);
isr!(isr18, 18, fault_common);
isr!(isr19, 19, fault_common);
isr!(isr20, 20, fault_common);
isr!(isr21, 21, fault_common);
isr!(isr22, 22, fault_common);
isr!(isr23, 23, fault_common);
isr!(isr24, 24, fault_common);
isr!(isr25, 25, fault_common);
isr!(isr26, 26, fault_common);
isr!(isr27, 27, fault_common);
isr!(isr28, 28, fault_common);
isr!(isr29, 29, fault_common);
isr!(isr30, 30, fault_common);
isr!(isr31, 31, fault_common);

isr!(irq0, 32, irq_common);
isr!(irq1, 33, irq_common);
isr!(irq2, 34, irq_common);
isr!(irq3, 35, irq_common);
isr!(irq4, 36, irq_common);
isr!(irq5, 37, irq_common);
isr!(irq6, 38, irq_common);
isr!(irq7, 39, irq_common);
isr!(irq8, 40, irq_common);
isr!(irq9, 41, irq_common);
isr!(irq10, 42, irq_common);
isr!(irq11, 43, irq_common);
isr!(irq12, 44, irq_common);
isr!(irq13, 45, irq_common);
isr!(irq14, 46, irq_common);
isr!(irq15, 47, irq_common);

/// Addresses of every stub, in vector order.
pub fn gate_addresses() -> GateAddresses {
	let exceptions: [extern "C" fn(); 32] = [
		isr0, isr1, isr2, isr3, isr4, isr5, isr6, isr7, isr8, isr9, isr10, isr11, isr12, isr13,
		isr14, isr15, isr16, isr17, isr18, isr19, isr20, isr21, isr22, isr23, isr24, isr25,
		isr26, isr27, isr28, isr29, isr30, isr31,
	];
	let irqs: [extern "C" fn(); 16] = [
		irq0, irq1, irq2, irq3, irq4, irq5, irq6, irq7, irq8, irq9, irq10, irq11, irq12, irq13,
		irq14, irq15,
	];

	GateAddresses {
		exceptions: exceptions.map(|stub| stub as usize as u32),
		irqs: irqs.map(|stub| stub as usize as u32),
	}
}

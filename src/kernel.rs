//! # Kernel interrupt state
//!
//! [`Kernel`] owns every table and driver the interrupt path touches. The
//! running kernel has exactly one, [`KERNEL`], reached by the entry points
//! the trampolines call; tests build their own.

use crate::exceptions::faults::{handle_fault, EXCEPTION_VECTORS};
use crate::exceptions::interrupts::{IrqDispatcher, IrqLine, Registers, IRQ_LINES};
use crate::exceptions::keyboard::Keyboard;
use crate::exceptions::pic8259::{ChainedPics, PIC_1_OFFSET};
use crate::exceptions::timer::Timer;
use crate::structures::idt::{InterruptDescriptorTable, KERNEL_CODE_SELECTOR, KERNEL_INTERRUPT_GATE};
use crate::utils::debug::LogLevel;
use crate::utils::io::{without_interrupts, Hardware};
use crate::vga::console::TextSink;
use spin::Mutex;

/// Entry stub addresses, one per exception vector and one per IRQ line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateAddresses {
	pub exceptions: [u32; EXCEPTION_VECTORS],
	pub irqs: [u32; IRQ_LINES],
}

pub struct Kernel {
	idt: Mutex<InterruptDescriptorTable>,
	pub irqs: IrqDispatcher,
	pub timer: Timer,
	pub keyboard: Keyboard,
}

pub static KERNEL: Kernel = Kernel::new();

impl Kernel {
	pub const fn new() -> Self {
		Kernel {
			idt: Mutex::new(InterruptDescriptorTable::new()),
			irqs: IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET)),
			timer: Timer::new(),
			keyboard: Keyboard::new(),
		}
	}

	/// Fills the IDT, remaps the PICs and registers the timer and keyboard.
	///
	/// Runs with interrupts masked and leaves the interrupt flag as it found
	/// it; the caller loads the IDT and enables interrupts afterwards.
	pub fn init<H: Hardware + ?Sized>(&'static self, hw: &mut H, gates: &GateAddresses) {
		without_interrupts(hw, |hw| {
			self.install_exception_gates(gates);
			self.install_irq_gates(hw, gates);

			let stale = self.keyboard.drain(hw);
			if stale > 0 {
				log!(LogLevel::Debug, "discarded {} stale keyboard bytes", stale);
			}

			self.timer.install(hw, &self.irqs);
			self.keyboard.install(hw, &self.irqs);
		});
		log!(LogLevel::Info, "Interrupt subsystem initialized");
	}

	fn install_exception_gates(&self, gates: &GateAddresses) {
		let mut idt = self.idt.lock();
		for (vector, &handler) in gates.exceptions.iter().enumerate() {
			idt.set_gate(vector as u8, handler, KERNEL_CODE_SELECTOR, KERNEL_INTERRUPT_GATE);
		}
	}

	fn install_irq_gates<H: Hardware + ?Sized>(&self, hw: &mut H, gates: &GateAddresses) {
		self.irqs.pics().remap(hw);

		let mut idt = self.idt.lock();
		for (line, &handler) in IrqLine::ALL.iter().zip(gates.irqs.iter()) {
			idt.set_gate(line.vector(), handler, KERNEL_CODE_SELECTOR, KERNEL_INTERRUPT_GATE);
		}
	}

	pub fn is_gate_present(&self, vector: u8) -> bool {
		self.idt.lock().is_present(vector)
	}

	/// Loads the IDT into the CPU.
	///
	/// # Safety
	///
	/// [`Kernel::init`] must have run.
	#[cfg(target_arch = "x86")]
	pub unsafe fn load_idt(&'static self) {
		let idt = self.idt.lock();
		idt.load();
		log!(LogLevel::Info, "IDT successfully loaded at 0x{:08x}", idt.register().base);
	}

	pub fn dispatch_irq<H: Hardware>(&self, hw: &mut H, regs: &mut Registers) {
		self.irqs.dispatch(hw, regs);
	}

	pub fn dispatch_fault<H, S>(&self, hw: &mut H, screen: &mut S, regs: &Registers)
	where
		H: Hardware + ?Sized,
		S: TextSink + ?Sized,
	{
		handle_fault(hw, screen, regs);
	}
}

impl Default for Kernel {
	fn default() -> Self {
		Self::new()
	}
}

/// Called by the exception trampolines.
#[cfg(not(test))]
#[no_mangle]
pub extern "C" fn fault_handler(regs: &mut Registers) {
	use crate::utils::io::Cpu;
	use crate::vga::console::VgaText;

	let mut screen = unsafe { VgaText::hardware() };
	KERNEL.dispatch_fault(&mut Cpu, &mut screen, regs);
}

/// Called by the IRQ trampolines.
#[cfg(not(test))]
#[no_mangle]
pub extern "C" fn irq_handler(regs: &mut Registers) {
	KERNEL.dispatch_irq(&mut crate::utils::io::Cpu, regs);
}

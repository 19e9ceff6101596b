//! # Hardware interrupt dispatch
//!
//! Vectors 32..48 land in [`IrqDispatcher::dispatch`], which looks up the
//! handler registered for the line, runs it and acknowledges the PICs.

use crate::exceptions::pic8259::{ChainedPics, PIC_1_OFFSET};
use crate::utils::debug::LogLevel;
use crate::utils::io::{without_interrupts, Hardware};
use spin::Mutex;

/// Number of lines on the chained PICs.
pub const IRQ_LINES: usize = 16;

/// Machine state saved by the entry trampolines, lowest address first.
///
/// The trampoline builds this on the interrupted stack and the CPU resumes
/// from it after the handler returns, so handlers get it by reference and
/// it never moves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Registers {
	pub gs: u32,
	pub fs: u32,
	pub es: u32,
	pub ds: u32,
	pub edi: u32,
	pub esi: u32,
	pub ebp: u32,
	pub esp: u32,
	pub ebx: u32,
	pub edx: u32,
	pub ecx: u32,
	pub eax: u32,
	/// Vector number pushed by the trampoline.
	pub int_no: u32,
	/// Pushed by the CPU for some exceptions, zero otherwise.
	pub err_code: u32,
	pub eip: u32,
	pub cs: u32,
	pub eflags: u32,
	pub useresp: u32,
	pub ss: u32,
}

impl Registers {
	/// A zeroed snapshot for `vector`.
	pub const fn for_vector(vector: u8) -> Self {
		Registers {
			gs: 0,
			fs: 0,
			es: 0,
			ds: 0,
			edi: 0,
			esi: 0,
			ebp: 0,
			esp: 0,
			ebx: 0,
			edx: 0,
			ecx: 0,
			eax: 0,
			int_no: vector as u32,
			err_code: 0,
			eip: 0,
			cs: 0,
			eflags: 0,
			useresp: 0,
			ss: 0,
		}
	}
}

/// IRQ lines of the legacy PC, in PIC input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IrqLine {
	Timer = 0,
	Keyboard,
	Cascade,
	Com2,
	Com1,
	Lpt2,
	Floppy,
	Lpt1,
	Rtc,
	Free1,
	Free2,
	Free3,
	Ps2Mouse,
	Fpu,
	PrimaryAtaHardDisk,
	SecondaryAtaHardDisk,
}

impl IrqLine {
	pub const ALL: [IrqLine; IRQ_LINES] = [
		IrqLine::Timer,
		IrqLine::Keyboard,
		IrqLine::Cascade,
		IrqLine::Com2,
		IrqLine::Com1,
		IrqLine::Lpt2,
		IrqLine::Floppy,
		IrqLine::Lpt1,
		IrqLine::Rtc,
		IrqLine::Free1,
		IrqLine::Free2,
		IrqLine::Free3,
		IrqLine::Ps2Mouse,
		IrqLine::Fpu,
		IrqLine::PrimaryAtaHardDisk,
		IrqLine::SecondaryAtaHardDisk,
	];

	pub fn from_index(line: usize) -> Option<IrqLine> {
		Self::ALL.get(line).copied()
	}

	/// The line raised on `vector`, if it belongs to the PICs.
	pub fn from_vector(vector: u32) -> Option<IrqLine> {
		let line = vector.checked_sub(PIC_1_OFFSET as u32)?;
		Self::from_index(line as usize)
	}

	pub fn as_u8(self) -> u8 {
		self as u8
	}

	pub fn as_usize(self) -> usize {
		usize::from(self.as_u8())
	}

	pub fn vector(self) -> u8 {
		PIC_1_OFFSET + self.as_u8()
	}

	/// Lines 8..16 sit on the secondary PIC.
	pub fn is_secondary(self) -> bool {
		self.as_u8() >= 8
	}
}

/// A driver servicing one IRQ line.
///
/// Called with interrupts disabled. The PICs are acknowledged by the
/// dispatcher after `handle` returns.
pub trait IrqHandler: Sync {
	fn handle(&self, hw: &mut dyn Hardware, regs: &mut Registers);
}

/// One slot of the handler table.
pub type IrqSlot = Option<&'static dyn IrqHandler>;

/// Sixteen handler slots, one per line.
pub struct IrqHandlers {
	slots: [IrqSlot; IRQ_LINES],
}

impl IrqHandlers {
	pub const fn new() -> Self {
		IrqHandlers {
			slots: [None; IRQ_LINES],
		}
	}

	/// Replaces whatever was installed on `line`.
	pub fn install(&mut self, line: IrqLine, handler: &'static dyn IrqHandler) {
		self.slots[line.as_usize()] = Some(handler);
	}

	pub fn uninstall(&mut self, line: IrqLine) -> IrqSlot {
		self.slots[line.as_usize()].take()
	}

	pub fn get(&self, line: IrqLine) -> IrqSlot {
		self.slots[line.as_usize()]
	}

	pub fn is_installed(&self, line: IrqLine) -> bool {
		self.slots[line.as_usize()].is_some()
	}
}

impl Default for IrqHandlers {
	fn default() -> Self {
		Self::new()
	}
}

/// The handler table together with the PIC pair it acknowledges.
pub struct IrqDispatcher {
	handlers: Mutex<IrqHandlers>,
	pics: ChainedPics,
}

impl IrqDispatcher {
	pub const fn new(pics: ChainedPics) -> Self {
		IrqDispatcher {
			handlers: Mutex::new(IrqHandlers::new()),
			pics,
		}
	}

	pub fn pics(&self) -> &ChainedPics {
		&self.pics
	}

	/// Installs `handler` on `line` with interrupts masked.
	pub fn install_handler<H: Hardware + ?Sized>(
		&self,
		hw: &mut H,
		line: IrqLine,
		handler: &'static dyn IrqHandler,
	) {
		without_interrupts(hw, |_| self.handlers.lock().install(line, handler));
	}

	/// Clears `line` with interrupts masked.
	pub fn uninstall_handler<H: Hardware + ?Sized>(&self, hw: &mut H, line: IrqLine) {
		without_interrupts(hw, |_| {
			self.handlers.lock().uninstall(line);
		});
	}

	/// Whether `line` has a handler, read with interrupts masked.
	pub fn is_installed<H: Hardware + ?Sized>(&self, hw: &mut H, line: IrqLine) -> bool {
		without_interrupts(hw, |_| self.handlers.lock().is_installed(line))
	}

	/// Services the hardware interrupt described by `regs`.
	///
	/// Runs the registered handler, if any, then sends the end-of-interrupt:
	/// to the secondary for lines 8..16 and to the primary in every case. An
	/// empty slot is still acknowledged.
	pub fn dispatch<H: Hardware>(&self, hw: &mut H, regs: &mut Registers) {
		let Some(line) = IrqLine::from_vector(regs.int_no) else {
			log!(LogLevel::Warning, "IRQ dispatch on foreign vector {}", regs.int_no);
			return;
		};

		// The table lock is released before the handler runs so it may
		// reinstall itself.
		let handler = self.handlers.lock().get(line);
		if let Some(handler) = handler {
			handler.handle(hw, regs);
		}

		self.pics.notify_end_of_interrupt(hw, line.vector());
	}
}

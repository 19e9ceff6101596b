//! # Interrupt Descriptor Table (IDT)
//!
//! The IDT is read by the CPU to find the entry point for each of the 256
//! vectors. The table and the pointer handed to `lidt` are hardware
//! structures, so both are kept as explicitly encoded bytes instead of
//! packed Rust structs: [`IdtEntry::to_bytes`] and [`IdtRegister::to_bytes`]
//! define the exact layout.
//!
//! ## Entry layout (little-endian)
//!
//! | bytes | field                        |
//! |-------|------------------------------|
//! | 0..2  | handler address bits 0..15   |
//! | 2..4  | code segment selector        |
//! | 4     | reserved, always zero        |
//! | 5     | type and attributes          |
//! | 6..8  | handler address bits 16..31  |

use bitflags::bitflags;

/// Number of vectors in the table.
pub const IDT_ENTRIES: usize = 256;

/// Size of one encoded entry.
pub const IDT_ENTRY_SIZE: usize = 8;

/// Flat ring 0 code segment installed by the boot code.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

bitflags! {
	/// Type and attributes byte of a gate.
	///
	/// See Intel 3a, Section 6.11 "IDT Descriptors".
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct GateFlags: u8 {
		/// Set if the gate is valid.
		const PRESENT = 1 << 7;
		/// Lowest privilege level allowed to invoke the gate with `int`.
		const DPL_RING3 = 0b11 << 5;
		/// Clear for interrupt and trap gates.
		const STORAGE_SEGMENT = 1 << 4;
		const TASK_GATE = 0x5;
		const INTERRUPT_GATE_16 = 0x6;
		const TRAP_GATE_16 = 0x7;
		const INTERRUPT_GATE_32 = 0xe;
		const TRAP_GATE_32 = 0xf;
	}
}

/// Present, ring 0, 32-bit interrupt gate (`0x8e`). Interrupts stay masked
/// while the handler runs.
pub const KERNEL_INTERRUPT_GATE: GateFlags = GateFlags::PRESENT.union(GateFlags::INTERRUPT_GATE_32);

/// Decoded view of one IDT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdtEntry {
	pub offset: u32,
	pub selector: u16,
	pub flags: u8,
}

impl IdtEntry {
	pub const fn new(offset: u32, selector: u16, flags: GateFlags) -> Self {
		IdtEntry {
			offset,
			selector,
			flags: flags.bits(),
		}
	}

	pub const fn to_bytes(&self) -> [u8; IDT_ENTRY_SIZE] {
		let low = (self.offset & 0xffff) as u16;
		let high = ((self.offset >> 16) & 0xffff) as u16;
		let [l0, l1] = low.to_le_bytes();
		let [s0, s1] = self.selector.to_le_bytes();
		let [h0, h1] = high.to_le_bytes();
		[l0, l1, s0, s1, 0, self.flags, h0, h1]
	}

	pub const fn from_bytes(bytes: [u8; IDT_ENTRY_SIZE]) -> Self {
		let low = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
		let high = u16::from_le_bytes([bytes[6], bytes[7]]) as u32;
		IdtEntry {
			offset: (high << 16) | low,
			selector: u16::from_le_bytes([bytes[2], bytes[3]]),
			flags: bytes[5],
		}
	}

	pub fn is_present(&self) -> bool {
		GateFlags::from_bits_retain(self.flags).contains(GateFlags::PRESENT)
	}
}

/// The 256-entry table, stored in its hardware encoding.
#[repr(C, align(8))]
pub struct InterruptDescriptorTable {
	entries: [[u8; IDT_ENTRY_SIZE]; IDT_ENTRIES],
}

impl InterruptDescriptorTable {
	/// An all-zero table: every gate not present.
	pub const fn new() -> Self {
		InterruptDescriptorTable {
			entries: [[0; IDT_ENTRY_SIZE]; IDT_ENTRIES],
		}
	}

	/// Points `vector` at `handler`.
	///
	/// Neither `selector` nor `flags` is checked; a bad value surfaces as a
	/// CPU fault the next time the vector fires. Must not be called with
	/// interrupts enabled, a firing vector could read a half-written entry.
	pub fn set_gate(&mut self, vector: u8, handler: u32, selector: u16, flags: GateFlags) {
		self.entries[vector as usize] = IdtEntry::new(handler, selector, flags).to_bytes();
	}

	pub fn entry(&self, vector: u8) -> IdtEntry {
		IdtEntry::from_bytes(self.entries[vector as usize])
	}

	pub fn is_present(&self, vector: u8) -> bool {
		self.entry(vector).is_present()
	}

	pub fn as_bytes(&self) -> &[[u8; IDT_ENTRY_SIZE]; IDT_ENTRIES] {
		&self.entries
	}

	/// The pointer structure describing this table.
	pub fn register(&self) -> IdtRegister {
		IdtRegister {
			limit: (IDT_ENTRIES * IDT_ENTRY_SIZE - 1) as u16,
			base: self.entries.as_ptr() as usize as u32,
		}
	}

	/// Loads this table into the IDTR.
	///
	/// # Safety
	///
	/// The table must stay at this address for as long as interrupts can
	/// fire, and every vector that can fire must be present.
	#[cfg(target_arch = "x86")]
	pub unsafe fn load(&self) {
		let register = self.register().to_bytes();
		core::arch::asm!(
			"lidt [{}]",
			in(reg) register.as_ptr(),
			options(readonly, nostack, preserves_flags)
		);
	}
}

impl Default for InterruptDescriptorTable {
	fn default() -> Self {
		Self::new()
	}
}

/// Limit and base loaded with `lidt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdtRegister {
	pub limit: u16,
	pub base: u32,
}

impl IdtRegister {
	/// Limit then base, little-endian, no padding.
	pub const fn to_bytes(&self) -> [u8; 6] {
		let [l0, l1] = self.limit.to_le_bytes();
		let [b0, b1, b2, b3] = self.base.to_le_bytes();
		[l0, l1, b0, b1, b2, b3]
	}
}

//! # Programmable Interrupt Controller (PIC)
//!
//! The two cascaded 8259 controllers deliver IRQ lines 0..16. After reset the
//! primary pair raises lines 0..8 on vectors 8..16, on top of the CPU
//! exceptions, so the pair is reprogrammed to surface lines 0..8 at
//! [`PIC_1_OFFSET`] and lines 8..16 at [`PIC_2_OFFSET`]. The trampolines are
//! wired to exactly these vectors.
//!
//! Every serviced hardware interrupt must be acknowledged: a missing
//! end-of-interrupt leaves the line, and everything of lower priority on the
//! same chip, masked for good.

use crate::utils::io::Hardware;

pub const PIC_1_OFFSET: u8 = 32;
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

const CMD_INIT: u8 = 0x11;
const CMD_END_OF_INTERRUPT: u8 = 0x20;
const MODE_8086: u8 = 0x01;
/// Primary: a secondary is attached on line 2.
const CASCADE_PRIMARY: u8 = 0x04;
/// Secondary: cascade identity 2.
const CASCADE_SECONDARY: u8 = 0x02;
const UNMASK_ALL: u8 = 0x00;

const PIC1_COMMAND: u16 = 0x20;
const PIC1_DATA: u16 = 0x21;
const PIC2_COMMAND: u16 = 0xa0;
const PIC2_DATA: u16 = 0xa1;

#[derive(Debug, Clone, Copy)]
struct Pic {
	offset: u8,
	command: u16,
	data: u16,
}

impl Pic {
	fn handles_interrupt(&self, vector: u8) -> bool {
		self.offset <= vector && vector < self.offset + 8
	}

	fn end_of_interrupt<H: Hardware + ?Sized>(&self, hw: &mut H) {
		hw.outb(self.command, CMD_END_OF_INTERRUPT);
	}
}

/// Represents a pair of chained PICs.
#[derive(Debug, Clone, Copy)]
pub struct ChainedPics {
	pics: [Pic; 2],
}

impl ChainedPics {
	pub const fn new(offset1: u8, offset2: u8) -> ChainedPics {
		ChainedPics {
			pics: [
				Pic {
					offset: offset1,
					command: PIC1_COMMAND,
					data: PIC1_DATA,
				},
				Pic {
					offset: offset2,
					command: PIC2_COMMAND,
					data: PIC2_DATA,
				},
			],
		}
	}

	pub const fn new_contiguous(primary_offset: u8) -> ChainedPics {
		Self::new(primary_offset, primary_offset + 8)
	}

	/// Reinitialises both controllers with the configured vector offsets and
	/// unmasks every line.
	///
	/// Each step is sent to the primary then the secondary; the controllers
	/// expect the initialisation words back to back on their data port.
	pub fn remap<H: Hardware + ?Sized>(&self, hw: &mut H) {
		let [primary, secondary] = &self.pics;

		hw.outb(primary.command, CMD_INIT);
		hw.outb(secondary.command, CMD_INIT);

		hw.outb(primary.data, primary.offset);
		hw.outb(secondary.data, secondary.offset);

		hw.outb(primary.data, CASCADE_PRIMARY);
		hw.outb(secondary.data, CASCADE_SECONDARY);

		hw.outb(primary.data, MODE_8086);
		hw.outb(secondary.data, MODE_8086);

		hw.outb(primary.data, UNMASK_ALL);
		hw.outb(secondary.data, UNMASK_ALL);

		log!(
			crate::utils::debug::LogLevel::Info,
			"PICs remapped to vectors {} and {}",
			primary.offset,
			secondary.offset
		);
	}

	pub fn handles_interrupt(&self, vector: u8) -> bool {
		self.pics.iter().any(|p| p.handles_interrupt(vector))
	}

	/// Acknowledges `vector`: the secondary first if it raised the line,
	/// then always the primary, which relayed it.
	pub fn notify_end_of_interrupt<H: Hardware + ?Sized>(&self, hw: &mut H, vector: u8) {
		if self.handles_interrupt(vector) {
			if self.pics[1].handles_interrupt(vector) {
				self.pics[1].end_of_interrupt(hw);
			}
			self.pics[0].end_of_interrupt(hw);
		}
	}
}

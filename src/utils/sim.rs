//! Simulated machine for the unit tests.
//!
//! Records every port write, scripts the keyboard controller and delivers
//! simulated interrupts whenever the code under test halts.

use crate::utils::io::Hardware;
use std::collections::VecDeque;
use std::vec::Vec;

const KEYBOARD_DATA: u16 = 0x60;
const KEYBOARD_STATUS: u16 = 0x64;
const SYSTEM_CONTROL: u16 = 0x61;
const SERIAL_LINE_STATUS: u16 = 0x3f8 + 5;
const PIC1_COMMAND: u16 = 0x20;
const PIC2_COMMAND: u16 = 0xa0;
const END_OF_INTERRUPT: u8 = 0x20;

/// Gives up on halts past this count so a broken wait loop fails the test
/// instead of hanging it.
const MAX_IDLE: usize = 100_000;

pub struct SimHardware {
	pub writes: Vec<(u16, u8)>,
	pub reads: Vec<u16>,
	pub interrupts_enabled: bool,
	pub sti_count: usize,
	pub cli_count: usize,
	pub idle_count: usize,
	/// Called on every halt with interrupts enabled, stands in for the next
	/// hardware interrupt.
	pub on_idle: Option<fn(&mut SimHardware)>,
	keyboard: VecDeque<u8>,
	system_control: u8,
}

impl SimHardware {
	pub fn new() -> Self {
		SimHardware {
			writes: Vec::new(),
			reads: Vec::new(),
			interrupts_enabled: false,
			sti_count: 0,
			cli_count: 0,
			idle_count: 0,
			on_idle: None,
			keyboard: VecDeque::new(),
			system_control: 0x10,
		}
	}

	/// Queues scancodes in the keyboard controller output buffer.
	pub fn press(&mut self, scancodes: &[u8]) {
		self.keyboard.extend(scancodes.iter().copied());
	}

	pub fn pending_scancodes(&self) -> usize {
		self.keyboard.len()
	}

	pub fn writes_to(&self, port: u16) -> Vec<u8> {
		self.writes
			.iter()
			.filter(|(p, _)| *p == port)
			.map(|(_, v)| *v)
			.collect()
	}

	pub fn master_eoi_count(&self) -> usize {
		self.eoi_count(PIC1_COMMAND)
	}

	pub fn slave_eoi_count(&self) -> usize {
		self.eoi_count(PIC2_COMMAND)
	}

	fn eoi_count(&self, port: u16) -> usize {
		self.writes
			.iter()
			.filter(|&&(p, v)| p == port && v == END_OF_INTERRUPT)
			.count()
	}

	pub fn clear_log(&mut self) {
		self.writes.clear();
		self.reads.clear();
	}
}

impl Hardware for SimHardware {
	fn inb(&mut self, port: u16) -> u8 {
		self.reads.push(port);
		match port {
			KEYBOARD_STATUS => !self.keyboard.is_empty() as u8,
			KEYBOARD_DATA => self.keyboard.pop_front().unwrap_or(0),
			SYSTEM_CONTROL => self.system_control,
			SERIAL_LINE_STATUS => 0x20,
			_ => 0,
		}
	}

	fn outb(&mut self, port: u16, value: u8) {
		self.writes.push((port, value));
		if port == SYSTEM_CONTROL {
			self.system_control = value;
		}
	}

	fn enable_interrupts(&mut self) {
		self.sti_count += 1;
		self.interrupts_enabled = true;
	}

	fn disable_interrupts(&mut self) {
		self.cli_count += 1;
		self.interrupts_enabled = false;
	}

	fn interrupts_enabled(&self) -> bool {
		self.interrupts_enabled
	}

	fn wait_for_interrupt(&mut self) {
		self.idle_count += 1;
		if !self.interrupts_enabled {
			panic!("cpu halted with interrupts disabled");
		}
		if self.idle_count > MAX_IDLE {
			panic!("no interrupt arrived after {} halts", MAX_IDLE);
		}
		match self.on_idle {
			Some(deliver) => deliver(self),
			None => panic!("cpu halted with no interrupt source"),
		}
	}
}

/// Collects console output by row.
#[derive(Default)]
pub struct SimScreen {
	pub lines: Vec<(usize, std::string::String)>,
}

impl SimScreen {
	pub fn row(&self, row: usize) -> Vec<&str> {
		self.lines
			.iter()
			.filter(|(r, _)| *r == row)
			.map(|(_, text)| text.as_str())
			.collect()
	}
}

impl crate::vga::console::TextSink for SimScreen {
	fn write_line(&mut self, row: usize, text: &str) {
		self.lines.push((row, text.into()));
	}
}

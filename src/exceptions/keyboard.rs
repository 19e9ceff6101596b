//! # PS/2 keyboard
//!
//! Scancodes reach the kernel only through line 1: the interrupt handler
//! pulls the byte off the controller, acknowledges it and queues it. The main
//! flow turns queued scancodes into characters with [`Keyboard::get_char`].
//! Nothing outside the handler reads the data port, so a key event is
//! consumed exactly once.

use crate::exceptions::interrupts::{IrqDispatcher, IrqHandler, IrqLine, Registers};
use crate::exceptions::keymap;
use crate::utils::debug::LogLevel;
use crate::utils::io::{without_interrupts, Hardware};
use spin::Mutex;

const KEYBOARD_DATA: u16 = 0x60;
const KEYBOARD_STATUS: u16 = 0x64;
/// System control port B; bit 7 acknowledges the keyboard on XT-style
/// controllers.
const SYSTEM_CONTROL: u16 = 0x61;

const OUTPUT_BUFFER_FULL: u8 = 0x01;
const KEYBOARD_ACK: u8 = 0x80;
const RELEASE_BIT: u8 = 0x80;

pub const QUEUE_CAPACITY: usize = 32;

/// Returned by [`Keyboard::get_char`] when the event produced nothing
/// displayable.
pub const NO_CHAR: u8 = 0;

/// Reads one scancode from the controller, if one is waiting, and
/// acknowledges it by pulsing bit 7 of port `0x61`.
pub fn fetch_scancode<H: Hardware + ?Sized>(hw: &mut H) -> Option<u8> {
	if hw.inb(KEYBOARD_STATUS) & OUTPUT_BUFFER_FULL == 0 {
		return None;
	}
	let scancode = hw.inb(KEYBOARD_DATA);

	let control = hw.inb(SYSTEM_CONTROL);
	hw.outb(SYSTEM_CONTROL, control | KEYBOARD_ACK);
	hw.outb(SYSTEM_CONTROL, control & !KEYBOARD_ACK);

	Some(scancode)
}

/// Shift latch and press/release edge of the last event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardState {
	shift_down: bool,
	pressed: bool,
	last_scancode: u8,
}

impl KeyboardState {
	pub const fn new() -> Self {
		KeyboardState {
			shift_down: false,
			pressed: false,
			last_scancode: 0,
		}
	}

	pub fn shift_down(&self) -> bool {
		self.shift_down
	}

	pub fn pressed(&self) -> bool {
		self.pressed
	}

	/// Low seven bits of the last scancode.
	pub fn last_scancode(&self) -> u8 {
		self.last_scancode
	}

	/// Applies one raw scancode and returns the character it types, or
	/// [`NO_CHAR`] for releases and shift keys.
	pub fn process(&mut self, raw: u8) -> u8 {
		let code = raw & !RELEASE_BIT;
		let released = raw & RELEASE_BIT != 0;

		self.pressed = !released;
		if keymap::is_shift(code) {
			self.shift_down = !released;
		}
		self.last_scancode = code;

		let c = keymap::translate(code, self.shift_down);
		if self.pressed && !keymap::is_shift(code) {
			c
		} else {
			NO_CHAR
		}
	}
}

/// Fixed-size FIFO of raw scancodes.
pub struct ScancodeQueue {
	buffer: [u8; QUEUE_CAPACITY],
	head: usize,
	len: usize,
	dropped: usize,
}

impl ScancodeQueue {
	pub const fn new() -> Self {
		ScancodeQueue {
			buffer: [0; QUEUE_CAPACITY],
			head: 0,
			len: 0,
			dropped: 0,
		}
	}

	/// Appends `scancode`; when full the new byte is dropped and counted.
	pub fn push(&mut self, scancode: u8) -> bool {
		if self.len == QUEUE_CAPACITY {
			self.dropped += 1;
			return false;
		}
		self.buffer[(self.head + self.len) % QUEUE_CAPACITY] = scancode;
		self.len += 1;
		true
	}

	pub fn pop(&mut self) -> Option<u8> {
		if self.len == 0 {
			return None;
		}
		let scancode = self.buffer[self.head];
		self.head = (self.head + 1) % QUEUE_CAPACITY;
		self.len -= 1;
		Some(scancode)
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn dropped(&self) -> usize {
		self.dropped
	}
}

impl Default for ScancodeQueue {
	fn default() -> Self {
		Self::new()
	}
}

/// The keyboard driver: interrupt-side queue plus main-flow decoder state.
pub struct Keyboard {
	queue: Mutex<ScancodeQueue>,
	state: Mutex<KeyboardState>,
}

impl Keyboard {
	pub const fn new() -> Self {
		Keyboard {
			queue: Mutex::new(ScancodeQueue::new()),
			state: Mutex::new(KeyboardState::new()),
		}
	}

	/// Discards whatever the controller still holds from before boot.
	pub fn drain<H: Hardware + ?Sized>(&self, hw: &mut H) -> usize {
		let mut discarded = 0;
		while hw.inb(KEYBOARD_STATUS) & OUTPUT_BUFFER_FULL != 0 {
			hw.inb(KEYBOARD_DATA);
			discarded += 1;
		}
		discarded
	}

	pub fn install<H: Hardware + ?Sized>(&'static self, hw: &mut H, irqs: &IrqDispatcher) {
		irqs.install_handler(hw, IrqLine::Keyboard, self);
	}

	/// Decodes the oldest queued scancode.
	///
	/// Returns [`NO_CHAR`] when nothing is queued or the event does not type
	/// a character.
	pub fn get_char<H: Hardware + ?Sized>(&self, hw: &mut H) -> u8 {
		let scancode = without_interrupts(hw, |_| self.queue.lock().pop());
		match scancode {
			Some(raw) => self.state.lock().process(raw),
			None => NO_CHAR,
		}
	}

	pub fn state(&self) -> KeyboardState {
		*self.state.lock()
	}

	/// Number of queued scancodes, read with interrupts masked.
	pub fn pending<H: Hardware + ?Sized>(&self, hw: &mut H) -> usize {
		without_interrupts(hw, |_| self.queue.lock().len())
	}

	pub fn dropped<H: Hardware + ?Sized>(&self, hw: &mut H) -> usize {
		without_interrupts(hw, |_| self.queue.lock().dropped())
	}
}

impl Default for Keyboard {
	fn default() -> Self {
		Self::new()
	}
}

impl IrqHandler for Keyboard {
	fn handle(&self, hw: &mut dyn Hardware, _regs: &mut Registers) {
		if let Some(scancode) = fetch_scancode(hw) {
			let mut queue = self.queue.lock();
			if !queue.push(scancode) {
				log!(
					LogLevel::Warning,
					"keyboard queue full, dropped {:#04x} ({} total)",
					scancode,
					queue.dropped()
				);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::exceptions::pic8259::{ChainedPics, PIC_1_OFFSET};
	use crate::utils::sim::SimHardware;

	const KEY_A: u8 = 0x1e;
	const KEY_A_RELEASE: u8 = 0x9e;
	const LEFT_SHIFT_RELEASE: u8 = 0xaa;
	const RIGHT_SHIFT_RELEASE: u8 = 0xb6;

	fn type_keys(hw: &mut SimHardware, keyboard: &Keyboard, scancodes: &[u8]) -> Vec<u8> {
		let mut out = Vec::new();
		for &scancode in scancodes {
			hw.press(&[scancode]);
			keyboard.handle(hw, &mut Registers::for_vector(33));
			out.push(keyboard.get_char(hw));
		}
		out
	}

	#[test]
	fn fetch_acknowledges_with_bit_seven_pulse() {
		let mut hw = SimHardware::new();
		hw.press(&[KEY_A]);

		assert_eq!(fetch_scancode(&mut hw), Some(KEY_A));
		assert_eq!(hw.writes_to(0x61), vec![0x90, 0x10]);
	}

	#[test]
	fn fetch_without_data_reads_only_status() {
		let mut hw = SimHardware::new();

		assert_eq!(fetch_scancode(&mut hw), None);
		assert_eq!(hw.reads, vec![0x64]);
		assert!(hw.writes.is_empty());
	}

	#[test]
	fn release_clears_pressed_and_yields_nothing() {
		let mut state = KeyboardState::new();

		assert_eq!(state.process(KEY_A), b'a');
		assert!(state.pressed());
		assert_eq!(state.process(KEY_A_RELEASE), NO_CHAR);
		assert!(!state.pressed());
		assert_eq!(state.last_scancode(), KEY_A);
	}

	#[test]
	fn shift_latch_selects_table() {
		let mut state = KeyboardState::new();

		assert_eq!(state.process(keymap::LEFT_SHIFT), NO_CHAR);
		assert!(state.shift_down());
		assert_eq!(state.process(KEY_A), b'A');
		assert_eq!(state.process(KEY_A_RELEASE), NO_CHAR);
		assert_eq!(state.process(LEFT_SHIFT_RELEASE), NO_CHAR);
		assert!(!state.shift_down());
		assert_eq!(state.process(KEY_A), b'a');
	}

	#[test]
	fn right_shift_latches_too() {
		let mut state = KeyboardState::new();

		state.process(keymap::RIGHT_SHIFT);
		assert_eq!(state.process(0x03), b'@');
		state.process(RIGHT_SHIFT_RELEASE);
		assert_eq!(state.process(0x03), b'2');
	}

	#[test]
	fn unmapped_press_yields_nothing() {
		let mut state = KeyboardState::new();
		assert_eq!(state.process(0x3b), NO_CHAR);
		assert!(state.pressed());
	}

	#[test]
	fn interrupt_path_end_to_end() {
		let keyboard = Keyboard::new();
		let mut hw = SimHardware::new();

		let typed = type_keys(
			&mut hw,
			&keyboard,
			&[keymap::LEFT_SHIFT, KEY_A, KEY_A_RELEASE, LEFT_SHIFT_RELEASE, KEY_A],
		);

		assert_eq!(typed, vec![NO_CHAR, b'A', NO_CHAR, NO_CHAR, b'a']);
		assert_eq!(keyboard.get_char(&mut hw), NO_CHAR);
	}

	#[test]
	fn get_char_never_touches_the_controller() {
		let keyboard = Keyboard::new();
		let mut hw = SimHardware::new();
		hw.press(&[KEY_A]);

		assert_eq!(keyboard.get_char(&mut hw), NO_CHAR);
		assert_eq!(hw.pending_scancodes(), 1);
		assert!(hw.reads.is_empty());
	}

	#[test]
	fn dispatch_on_line_one_queues_scancode() {
		static KEYBOARD: Keyboard = Keyboard::new();
		let irqs = IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET));
		let mut hw = SimHardware::new();

		KEYBOARD.install(&mut hw, &irqs);
		hw.press(&[0x23]);
		irqs.dispatch(&mut hw, &mut Registers::for_vector(33));

		assert_eq!(KEYBOARD.pending(&mut hw), 1);
		assert_eq!(hw.master_eoi_count(), 1);
		assert_eq!(KEYBOARD.get_char(&mut hw), b'h');
	}

	#[test]
	fn full_queue_drops_scancode_but_still_acknowledges() {
		static KEYBOARD: Keyboard = Keyboard::new();
		let irqs = IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET));
		let mut hw = SimHardware::new();
		KEYBOARD.install(&mut hw, &irqs);

		for _ in 0..=QUEUE_CAPACITY {
			hw.press(&[0x1e]);
			irqs.dispatch(&mut hw, &mut Registers::for_vector(33));
		}

		assert_eq!(KEYBOARD.pending(&mut hw), QUEUE_CAPACITY);
		assert_eq!(KEYBOARD.dropped(&mut hw), 1);
		assert_eq!(hw.pending_scancodes(), 0);
		assert_eq!(hw.master_eoi_count(), QUEUE_CAPACITY + 1);
	}

	#[test]
	fn accessors_restore_interrupt_flag() {
		static KEYBOARD: Keyboard = Keyboard::new();
		let mut hw = SimHardware::new();
		hw.enable_interrupts();

		assert_eq!(KEYBOARD.pending(&mut hw), 0);
		assert_eq!(KEYBOARD.dropped(&mut hw), 0);
		assert!(hw.interrupts_enabled());
		assert_eq!(hw.cli_count, 2);
	}

	#[test]
	fn queue_overflow_drops_newest() {
		let mut queue = ScancodeQueue::new();
		for i in 0..QUEUE_CAPACITY as u8 {
			assert!(queue.push(i));
		}
		assert!(!queue.push(0xff));
		assert_eq!(queue.dropped(), 1);
		assert_eq!(queue.len(), QUEUE_CAPACITY);
		assert_eq!(queue.pop(), Some(0));

		assert!(queue.push(0x42));
		let drained: Vec<u8> = core::iter::from_fn(|| queue.pop()).collect();
		assert_eq!(drained.len(), QUEUE_CAPACITY);
		assert_eq!(drained.last(), Some(&0x42));
		assert!(queue.is_empty());
	}

	#[test]
	fn drain_empties_controller() {
		let keyboard = Keyboard::new();
		let mut hw = SimHardware::new();
		hw.press(&[0xfa, 0xaa]);

		assert_eq!(keyboard.drain(&mut hw), 2);
		assert_eq!(hw.pending_scancodes(), 0);
	}
}

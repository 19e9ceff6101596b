//! # Programmable interval timer
//!
//! The PIT is left at its power-on rate and raises line 0 about 18.222 times
//! a second. Every firing advances the tick counter and, while a wait is
//! armed, counts the wait down by one.

use crate::exceptions::interrupts::{IrqDispatcher, IrqHandler, IrqLine, Registers};
use crate::utils::debug::LogLevel;
use crate::utils::io::{without_interrupts, Hardware};
use core::sync::atomic::{AtomicU32, Ordering};

/// Default PIT rate in millihertz (1193182 Hz / 65536).
pub const TICK_RATE_MILLIHZ: u32 = 18_222;

/// Progress of a blocking wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
	Waiting { remaining: u32 },
	Elapsed,
}

/// Tick counter and wait countdown.
pub struct Timer {
	ticks: AtomicU32,
	countdown: AtomicU32,
}

impl Timer {
	pub const fn new() -> Self {
		Timer {
			ticks: AtomicU32::new(0),
			countdown: AtomicU32::new(0),
		}
	}

	/// Ticks since the handler was first installed. Wraps after about
	/// seven years.
	pub fn ticks(&self) -> u32 {
		self.ticks.load(Ordering::SeqCst)
	}

	pub fn remaining(&self) -> u32 {
		self.countdown.load(Ordering::SeqCst)
	}

	/// One timer firing.
	pub fn tick(&self) {
		self.ticks.fetch_add(1, Ordering::SeqCst);
		let _ = self
			.countdown
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
	}

	pub fn poll_wait(&self) -> WaitState {
		match self.remaining() {
			0 => WaitState::Elapsed,
			remaining => WaitState::Waiting { remaining },
		}
	}

	pub fn install<H: Hardware + ?Sized>(&'static self, hw: &mut H, irqs: &IrqDispatcher) {
		irqs.install_handler(hw, IrqLine::Timer, self);
	}

	pub fn uninstall<H: Hardware + ?Sized>(&self, hw: &mut H, irqs: &IrqDispatcher) {
		irqs.uninstall_handler(hw, IrqLine::Timer);
	}

	/// Blocks until `ticks` timer interrupts have fired.
	///
	/// The whole machine stalls for the duration. Interrupts must be enabled
	/// or this never returns.
	pub fn wait<H: Hardware + ?Sized>(&'static self, hw: &mut H, irqs: &IrqDispatcher, ticks: u32) {
		self.wait_with(hw, irqs, ticks, |_| {});
	}

	/// [`Timer::wait`], calling `progress` with the remaining ticks before
	/// each halt.
	pub fn wait_with<H, F>(&'static self, hw: &mut H, irqs: &IrqDispatcher, ticks: u32, mut progress: F)
	where
		H: Hardware + ?Sized,
		F: FnMut(u32),
	{
		without_interrupts(hw, |hw| {
			self.uninstall(hw, irqs);
			self.countdown.store(ticks, Ordering::SeqCst);
			self.install(hw, irqs);
		});

		if ticks > 0 && !hw.interrupts_enabled() {
			log!(LogLevel::Warning, "timer wait of {} ticks with interrupts disabled", ticks);
		}

		while let WaitState::Waiting { remaining } = self.poll_wait() {
			progress(remaining);
			hw.wait_for_interrupt();
		}
	}

	/// Waits roughly `seconds` seconds at the default PIT rate.
	pub fn sleep_seconds<H: Hardware + ?Sized>(&'static self, hw: &mut H, irqs: &IrqDispatcher, seconds: u32) {
		self.wait(hw, irqs, seconds_to_ticks(seconds));
	}
}

impl Default for Timer {
	fn default() -> Self {
		Self::new()
	}
}

impl IrqHandler for Timer {
	fn handle(&self, _hw: &mut dyn Hardware, _regs: &mut Registers) {
		self.tick();
	}
}

/// Timer ticks in `seconds`, rounded down.
pub const fn seconds_to_ticks(seconds: u32) -> u32 {
	(seconds as u64 * TICK_RATE_MILLIHZ as u64 / 1000) as u32
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::exceptions::pic8259::{ChainedPics, PIC_1_OFFSET};

	fn deliver_timer(hw: &mut crate::utils::sim::SimHardware, irqs: &IrqDispatcher) {
		irqs.dispatch(hw, &mut Registers::for_vector(IrqLine::Timer.vector()));
	}

	#[test]
	fn countdown_stops_at_zero() {
		let timer = Timer::new();
		timer.tick();
		assert_eq!(timer.ticks(), 1);
		assert_eq!(timer.poll_wait(), WaitState::Elapsed);
	}

	#[test]
	fn countdown_state_machine() {
		let timer = Timer::new();
		timer.countdown.store(2, Ordering::SeqCst);

		assert_eq!(timer.poll_wait(), WaitState::Waiting { remaining: 2 });
		timer.tick();
		assert_eq!(timer.poll_wait(), WaitState::Waiting { remaining: 1 });
		timer.tick();
		assert_eq!(timer.poll_wait(), WaitState::Elapsed);
		timer.tick();
		assert_eq!(timer.remaining(), 0);
		assert_eq!(timer.ticks(), 3);
	}

	#[test]
	fn wait_returns_after_exactly_n_firings() {
		use crate::utils::sim::SimHardware;

		static TIMER: Timer = Timer::new();
		static IRQS: IrqDispatcher = IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET));

		fn fire(hw: &mut SimHardware) {
			deliver_timer(hw, &IRQS);
		}

		let mut hw = SimHardware::new();
		hw.enable_interrupts();
		hw.on_idle = Some(fire);
		let before = TIMER.ticks();

		let mut reports = std::vec::Vec::new();
		TIMER.wait_with(&mut hw, &IRQS, 5, |remaining| reports.push(remaining));

		assert_eq!(hw.idle_count, 5);
		assert_eq!(hw.master_eoi_count(), 5);
		assert!(TIMER.ticks() - before >= 5);
		assert_eq!(reports, vec![5, 4, 3, 2, 1]);
		assert!(IRQS.is_installed(&mut hw, IrqLine::Timer));
		assert!(hw.interrupts_enabled());
	}

	#[test]
	fn zero_wait_does_not_halt() {
		use crate::utils::sim::SimHardware;

		static TIMER: Timer = Timer::new();
		static IRQS: IrqDispatcher = IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET));

		let mut hw = SimHardware::new();
		TIMER.wait(&mut hw, &IRQS, 0);

		assert_eq!(hw.idle_count, 0);
		assert!(IRQS.is_installed(&mut hw, IrqLine::Timer));
	}

	#[test]
	fn sleep_seconds_uses_pit_rate() {
		use crate::utils::sim::SimHardware;

		static TIMER: Timer = Timer::new();
		static IRQS: IrqDispatcher = IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET));

		fn fire(hw: &mut SimHardware) {
			deliver_timer(hw, &IRQS);
		}

		let mut hw = SimHardware::new();
		hw.enable_interrupts();
		hw.on_idle = Some(fire);

		TIMER.sleep_seconds(&mut hw, &IRQS, 2);

		assert_eq!(hw.idle_count, 36);
	}

	#[test]
	fn tick_conversion() {
		assert_eq!(seconds_to_ticks(0), 0);
		assert_eq!(seconds_to_ticks(1), 18);
		assert_eq!(seconds_to_ticks(10), 182);
		assert_eq!(seconds_to_ticks(1000), 18_222);
	}

	#[test]
	#[should_panic(expected = "cpu halted")]
	fn wait_with_interrupts_disabled_stalls() {
		use crate::utils::sim::SimHardware;

		static TIMER: Timer = Timer::new();
		static IRQS: IrqDispatcher = IrqDispatcher::new(ChainedPics::new_contiguous(PIC_1_OFFSET));

		let mut hw = SimHardware::new();
		TIMER.wait(&mut hw, &IRQS, 3);
	}
}

/// Hardware interrupt dispatch
pub mod interrupts;

/// Programmable Interrupt Controller (PIC)
pub mod pic8259;

/// CPU exceptions
pub mod faults;

/// Programmable interval timer
pub mod timer;

/// Keyboard driver
pub mod keyboard;

/// Scancode translation tables
pub mod keymap;

/// Per-vector entry stubs
#[cfg(all(target_arch = "x86", not(test)))]
pub mod trampolines;

/// Kernel panic reporting
pub mod panic;

//! Low-level helpers shared by the interrupt subsystem.

/// Port I/O and the interrupt flag
pub mod io;

/// Serial log output
pub mod debug;

/// Simulated machine for the unit tests
#[cfg(test)]
pub mod sim;

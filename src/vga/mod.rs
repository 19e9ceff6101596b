//! VGA text mode output.

/// Row-addressed text console and cursor
pub mod console;

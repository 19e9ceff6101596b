//! US QWERTY translation tables for scancode set 1.
//!
//! Both tables are indexed by the low seven bits of a make code. Keys that
//! produce no character (modifiers, function keys, arrows) map to `0`.

/// Make code of the left shift key.
pub const LEFT_SHIFT: u8 = 0x2a;
/// Make code of the right shift key.
pub const RIGHT_SHIFT: u8 = 0x36;

pub const TABLE_SIZE: usize = 128;

pub type Keymap = [u8; TABLE_SIZE];

const fn build(pairs: &[(u8, u8)]) -> Keymap {
	let mut map = [0; TABLE_SIZE];
	let mut i = 0;
	while i < pairs.len() {
		map[pairs[i].0 as usize] = pairs[i].1;
		i += 1;
	}
	map
}

#[rustfmt::skip]
pub static ASCII_NON_SHIFT: Keymap = build(&[
	(0x01, 0x1b),
	(0x02, b'1'), (0x03, b'2'), (0x04, b'3'), (0x05, b'4'), (0x06, b'5'),
	(0x07, b'6'), (0x08, b'7'), (0x09, b'8'), (0x0a, b'9'), (0x0b, b'0'),
	(0x0c, b'-'), (0x0d, b'='), (0x0e, 0x08), (0x0f, b'\t'),
	(0x10, b'q'), (0x11, b'w'), (0x12, b'e'), (0x13, b'r'), (0x14, b't'),
	(0x15, b'y'), (0x16, b'u'), (0x17, b'i'), (0x18, b'o'), (0x19, b'p'),
	(0x1a, b'['), (0x1b, b']'), (0x1c, b'\n'),
	(0x1e, b'a'), (0x1f, b's'), (0x20, b'd'), (0x21, b'f'), (0x22, b'g'),
	(0x23, b'h'), (0x24, b'j'), (0x25, b'k'), (0x26, b'l'),
	(0x27, b';'), (0x28, b'\''), (0x29, b'`'), (0x2b, b'\\'),
	(0x2c, b'z'), (0x2d, b'x'), (0x2e, b'c'), (0x2f, b'v'), (0x30, b'b'),
	(0x31, b'n'), (0x32, b'm'), (0x33, b','), (0x34, b'.'), (0x35, b'/'),
	(0x37, b'*'), (0x39, b' '), (0x4a, b'-'), (0x4e, b'+'),
]);

#[rustfmt::skip]
pub static ASCII_SHIFT: Keymap = build(&[
	(0x01, 0x1b),
	(0x02, b'!'), (0x03, b'@'), (0x04, b'#'), (0x05, b'$'), (0x06, b'%'),
	(0x07, b'^'), (0x08, b'&'), (0x09, b'*'), (0x0a, b'('), (0x0b, b')'),
	(0x0c, b'_'), (0x0d, b'+'), (0x0e, 0x08), (0x0f, b'\t'),
	(0x10, b'Q'), (0x11, b'W'), (0x12, b'E'), (0x13, b'R'), (0x14, b'T'),
	(0x15, b'Y'), (0x16, b'U'), (0x17, b'I'), (0x18, b'O'), (0x19, b'P'),
	(0x1a, b'{'), (0x1b, b'}'), (0x1c, b'\n'),
	(0x1e, b'A'), (0x1f, b'S'), (0x20, b'D'), (0x21, b'F'), (0x22, b'G'),
	(0x23, b'H'), (0x24, b'J'), (0x25, b'K'), (0x26, b'L'),
	(0x27, b':'), (0x28, b'"'), (0x29, b'~'), (0x2b, b'|'),
	(0x2c, b'Z'), (0x2d, b'X'), (0x2e, b'C'), (0x2f, b'V'), (0x30, b'B'),
	(0x31, b'N'), (0x32, b'M'), (0x33, b'<'), (0x34, b'>'), (0x35, b'?'),
	(0x37, b'*'), (0x39, b' '), (0x4a, b'-'), (0x4e, b'+'),
]);

pub fn is_shift(code: u8) -> bool {
	code == LEFT_SHIFT || code == RIGHT_SHIFT
}

/// The character for `code` (low seven bits of a scancode).
pub fn translate(code: u8, shifted: bool) -> u8 {
	let table = if shifted { &ASCII_SHIFT } else { &ASCII_NON_SHIFT };
	table[(code & 0x7f) as usize]
}

//! Sanitizing of mail text.
//!
//! Header values and bodies arrive as bytes in whatever charset the sender
//! felt like. Everything exposed in an event goes through [`scrub`] first.

use std::borrow::Cow;
use std::fmt::Write as _;

/// Converts bytes to text, replacing every byte that is not part of a valid
/// UTF-8 sequence with `<hh>` (lowercase hex of that byte).
///
/// Valid input is borrowed unchanged, and the output is always valid input,
/// so `scrub(scrub(x)) == scrub(x)`.
#[must_use]
pub fn scrub(input: &[u8]) -> Cow<'_, str> {
    if let Ok(valid) = std::str::from_utf8(input) {
        return Cow::Borrowed(valid);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for chunk in input.utf8_chunks() {
        out.push_str(chunk.valid());
        for byte in chunk.invalid() {
            let _ = write!(out, "<{byte:02x}>");
        }
    }
    Cow::Owned(out)
}

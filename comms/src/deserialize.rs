use std::io;

/// Reads a message out of a received frame.
pub trait Deserialize<'a>: Sized {
    /// Deserializes a frame body, borrowing from `buf` where possible.
    fn deserialize(buf: &'a [u8]) -> io::Result<Self>;
}

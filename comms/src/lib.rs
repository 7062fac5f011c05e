//! Length-prefixed framing for the coordinator's invocation protocol.
//!
//! Every frame is a big-endian `u64` length followed by the serialized message.

mod deserialize;
pub mod msg;
mod receiver;
mod sender;
mod serialize;

use tokio::io::{AsyncRead, AsyncWrite};

pub use deserialize::Deserialize;
pub use receiver::OnoReceiver;
pub use sender::OnoSender;
pub use serialize::Serialize;

type LenType = u64;
const LEN_TYPE_SIZE: usize = size_of::<LenType>();

/// Frames longer than this are neither sent nor accepted.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Wraps the two halves of a stream into a framed receiver and sender.
///
/// # Arguments
/// * `rx` - The reading half.
/// * `tx` - The writing half.
pub fn channel<R, W>(rx: R, tx: W) -> (OnoReceiver<R>, OnoSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (OnoReceiver::new(rx), OnoSender::new(tx))
}

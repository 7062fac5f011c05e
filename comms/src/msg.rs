use std::{borrow::Cow, io};

use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::{Deserialize, Serialize};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();

const ERR: Header = 0;
const CONTROL: Header = 1;
const INVOKE: Header = 2;
const REPLY: Header = 3;
const EVENT: Header = 4;

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Asks the node to forward every coordinator event on this connection.
    Subscribe,
    Disconnect,
}

/// A named call into the coordinator with its text arguments.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Creates a new `Invocation`.
    ///
    /// # Arguments
    /// * `function` - The name of the entry point, e.g. `StartAggregation`.
    /// * `args` - The positional text arguments.
    pub fn new<S: Into<String>>(function: S, args: Vec<String>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }
}

/// An event published by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
pub struct Event {
    pub name: String,
    pub payload: String,
}

/// The application layer message for the entire system.
#[derive(Debug)]
pub enum Msg<'a> {
    Err(Cow<'a, str>),
    Control(Command),
    Invoke(Invocation),
    Reply(Cow<'a, str>),
    Event(Event),
}

impl Msg<'_> {
    fn buf_is_too_small<T>(size: usize) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("The given buffer is too small {size}, must at least be {HEADER_SIZE} bytes"),
        ))
    }

    fn invalid_kind_byte<T>(kind: Header) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Received an invalid kind header {kind}"),
        ))
    }

    fn text(buf: &[u8]) -> io::Result<Cow<'_, str>> {
        std::str::from_utf8(buf)
            .map(Cow::Borrowed)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn write_json<T: SerdeSerialize>(kind: Header, value: &T, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&kind.to_be_bytes());

        // SAFETY: The Serialize impls of the json bodies are derived and hold
        //         only strings and string lists, they can't fail.
        serde_json::to_writer(buf, value).unwrap();
    }
}

impl<'a> Serialize<'a> for Msg<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        match self {
            Msg::Err(text) | Msg::Reply(text) => {
                let kind = if matches!(self, Msg::Err(_)) { ERR } else { REPLY };
                buf.extend_from_slice(&kind.to_be_bytes());
                Some(text.as_bytes())
            }
            Msg::Control(cmd) => {
                Self::write_json(CONTROL, cmd, buf);
                None
            }
            Msg::Invoke(invocation) => {
                Self::write_json(INVOKE, invocation, buf);
                None
            }
            Msg::Event(event) => {
                Self::write_json(EVENT, event, buf);
                None
            }
        }
    }
}

impl<'a> Deserialize<'a> for Msg<'a> {
    fn deserialize(buf: &'a [u8]) -> io::Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Self::buf_is_too_small(buf.len());
        }

        let (kind_buf, rest) = buf.split_at(HEADER_SIZE);

        // SAFETY: We splitted the buffer to be of size `HEADER_SIZE` just above.
        let kind = Header::from_be_bytes(kind_buf.try_into().unwrap());

        match kind {
            ERR => Ok(Self::Err(Self::text(rest)?)),
            CONTROL => Ok(Self::Control(serde_json::from_slice(rest)?)),
            INVOKE => Ok(Self::Invoke(serde_json::from_slice(rest)?)),
            REPLY => Ok(Self::Reply(Self::text(rest)?)),
            EVENT => Ok(Self::Event(serde_json::from_slice(rest)?)),
            kind => Self::invalid_kind_byte(kind),
        }
    }
}

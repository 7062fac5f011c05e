use std::{borrow::Cow, io, sync::Arc};

use comms::{
    OnoSender,
    msg::{Command, Event, Invocation, Msg},
};
use coordinator::{
    Coordinator,
    events::{BroadcastSink, ModelEvent},
};
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::{Mutex, broadcast},
    task::JoinHandle,
};

type SharedSender<W> = Arc<Mutex<OnoSender<W>>>;

/// Serves one participant connection.
///
/// Invocations are answered one at a time, in arrival order. Once subscribed, coordinator
/// events are forwarded by a separate task sharing the sending half.
pub struct Connection {
    coordinator: Arc<Coordinator<BroadcastSink>>,
    events: BroadcastSink,
}

impl Connection {
    /// Creates a new `Connection`.
    ///
    /// # Arguments
    /// * `coordinator` - The coordinator invocations are run against.
    /// * `events` - The sink the coordinator publishes its events to.
    pub fn new(coordinator: Arc<Coordinator<BroadcastSink>>, events: BroadcastSink) -> Self {
        Self {
            coordinator,
            events,
        }
    }

    /// Runs the connection until the participant disconnects or closes the stream.
    ///
    /// # Arguments
    /// * `rx` - The reading half of the stream.
    /// * `tx` - The writing half of the stream.
    ///
    /// # Returns
    /// An `io::Error` if the stream broke or carried an invalid frame.
    pub async fn serve<R, W>(self, rx: R, tx: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (mut rx, tx) = comms::channel(rx, tx);
        let tx = Arc::new(Mutex::new(tx));
        let mut forwarder: Option<JoinHandle<()>> = None;
        let mut buf = Vec::new();

        let ret = loop {
            let msg = match rx.recv_into(&mut buf).await {
                Ok(msg) => msg,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break Ok(()),
                Err(e) => break Err(e),
            };

            match msg {
                Msg::Invoke(Invocation { function, args }) => {
                    let reply = match self.coordinator.invoke(&function, &args).await {
                        Ok(text) => Msg::Reply(Cow::Owned(text)),
                        Err(e) => {
                            warn!("{function} failed: {e}");
                            Msg::Err(Cow::Owned(e.to_string()))
                        }
                    };

                    if let Err(e) = tx.lock().await.send(&reply).await {
                        break Err(e);
                    }
                }
                Msg::Control(Command::Subscribe) => {
                    if forwarder.is_none() {
                        info!("participant subscribed to events");
                        let events = self.events.subscribe();
                        forwarder = Some(tokio::spawn(forward(events, tx.clone())));
                    }
                }
                Msg::Control(Command::Disconnect) => {
                    let bye = Msg::Control(Command::Disconnect);
                    break tx.lock().await.send(&bye).await;
                }
                other => warn!("ignoring unexpected message {other:?}"),
            }
        };

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }

        ret
    }
}

/// Forwards every coordinator event to the participant until either side goes away.
async fn forward<W>(mut events: broadcast::Receiver<ModelEvent>, tx: SharedSender<W>)
where
    W: AsyncWrite + Unpin + Send,
{
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(lost)) => {
                warn!("subscriber lagged behind, {lost} event(s) lost");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };

        let msg = Msg::Event(Event {
            name: event.name.to_string(),
            payload: event.payload.to_string(),
        });

        if let Err(e) = tx.lock().await.send(&msg).await {
            debug!("stopped forwarding events: {e}");
            return;
        }
    }
}

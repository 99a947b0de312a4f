//! Tree-owning dispatch thread
//!
//! Every frame from every connection is queued to one dedicated thread and
//! processed to completion (resolve, act, flush, reply) before the next one.
//! Pass-through channel calls and handler swaps travel through the same queue,
//! so they interleave with requests in arrival order.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::automation::AutomationHandler;
use crate::channel::{ChannelHandle, ChannelTransport, PassThroughChannel};
use crate::rpc::{Routed, RpcDispatcher};

/// Frame queued for a session's socket writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Session writer handed to the pass-through channel
struct SessionTransport {
    outbound: OutboundSender,
}

impl ChannelTransport for SessionTransport {
    fn send(&self, raw: String) -> bool {
        self.outbound.send(Outbound::Text(raw)).is_ok()
    }
}

enum Command {
    Open {
        session: String,
        outbound: OutboundSender,
    },
    Frame {
        session: String,
        text: String,
    },
    Close {
        session: String,
    },
    SetHandler(Option<Box<dyn AutomationHandler>>),
    Shutdown,
}

struct SessionLink {
    outbound: OutboundSender,
    channel: ChannelHandle,
}

struct DispatchLoop {
    rpc: RpcDispatcher,
    channel: Box<dyn PassThroughChannel>,
    sessions: HashMap<String, SessionLink>,
}

impl DispatchLoop {
    fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.blocking_recv() {
            match command {
                Command::Open { session, outbound } => self.open(session, outbound),
                Command::Frame { session, text } => self.frame(&session, &text),
                Command::Close { session } => self.close(&session),
                Command::SetHandler(handler) => {
                    debug!("Handler {}", if handler.is_some() { "installed" } else { "cleared" });
                    self.rpc.set_handler(handler);
                }
                Command::Shutdown => break,
            }
        }

        for (session, link) in self.sessions.drain() {
            self.channel.disconnect(link.channel);
            let _ = link.outbound.send(Outbound::Close);
            debug!("Closed session {} on shutdown", session);
        }
        info!("Dispatch loop stopped");
    }

    fn open(&mut self, session: String, outbound: OutboundSender) {
        let transport = Arc::new(SessionTransport {
            outbound: outbound.clone(),
        });
        let channel = self.channel.connect(transport);
        debug!("Session {} attached to channel handle {}", session, channel);
        self.sessions.insert(session, SessionLink { outbound, channel });
    }

    fn frame(&mut self, session: &str, text: &str) {
        let Some(link) = self.sessions.get(session) else {
            debug!("Dropping frame for unknown session {}", session);
            return;
        };

        match self.rpc.dispatch(text) {
            Routed::Reply(response) => match serde_json::to_string(&response) {
                Ok(json) => {
                    // The session may already be gone; its reply is discarded.
                    let _ = link.outbound.send(Outbound::Text(json));
                }
                Err(e) => debug!("Failed to encode reply {}: {}", response.id, e),
            },
            Routed::PassThrough => self.channel.deliver(link.channel, text),
            Routed::Dropped(_) => {}
        }
    }

    fn close(&mut self, session: &str) {
        if let Some(link) = self.sessions.remove(session) {
            self.channel.disconnect(link.channel);
            debug!("Session {} detached from channel", session);
        }
    }
}

/// Sender side of the dispatch queue plus the thread that drains it
pub struct Dispatch {
    tx: mpsc::UnboundedSender<Command>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatch {
    pub fn spawn(
        rpc: RpcDispatcher,
        channel: Box<dyn PassThroughChannel>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatch_loop = DispatchLoop {
            rpc,
            channel,
            sessions: HashMap::new(),
        };
        let thread = std::thread::Builder::new()
            .name("uiproxy-dispatch".to_string())
            .spawn(move || dispatch_loop.run(rx))?;

        Ok(Self {
            tx,
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn open(&self, session: &str, outbound: OutboundSender) {
        self.send(Command::Open {
            session: session.to_string(),
            outbound,
        });
    }

    pub fn frame(&self, session: &str, text: String) {
        self.send(Command::Frame {
            session: session.to_string(),
            text,
        });
    }

    pub fn close(&self, session: &str) {
        self.send(Command::Close {
            session: session.to_string(),
        });
    }

    pub fn set_handler(&self, handler: Option<Box<dyn AutomationHandler>>) {
        self.send(Command::SetHandler(handler));
    }

    /// Close every attached session and stop the thread
    ///
    /// Commands queued before this call are processed first. Blocks until the
    /// thread has exited.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
        if let Some(thread) = self.thread.lock().take() {
            let _ = thread.join();
        }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("Dispatch loop is not running; command discarded");
        }
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::NullChannel;
    use serde_json::json;

    /// Channel that echoes every inbound frame back to its transport
    #[derive(Default)]
    struct Echo {
        transports: HashMap<ChannelHandle, Arc<dyn ChannelTransport>>,
        delivered: Arc<Mutex<Vec<String>>>,
    }

    impl PassThroughChannel for Echo {
        fn connect(&mut self, transport: Arc<dyn ChannelTransport>) -> ChannelHandle {
            let handle = self.transports.len() as ChannelHandle + 1;
            self.transports.insert(handle, transport);
            handle
        }

        fn deliver(&mut self, handle: ChannelHandle, raw: &str) {
            self.delivered.lock().push(raw.to_string());
            if let Some(transport) = self.transports.get(&handle) {
                transport.send(format!("echo:{raw}"));
            }
        }

        fn disconnect(&mut self, handle: ChannelHandle) {
            self.transports.remove(&handle);
        }
    }

    async fn next_text(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> String {
        match rx.recv().await {
            Some(Outbound::Text(text)) => text,
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replies_follow_request_order() {
        let dispatch =
            Dispatch::spawn(RpcDispatcher::new(None), Box::new(NullChannel::new())).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch.open("s1", tx);
        for id in 1..=5 {
            dispatch.frame("s1", format!(r#"{{"id":{id},"method":"dump_tree"}}"#));
        }

        for id in 1..=5 {
            let reply: serde_json::Value = serde_json::from_str(&next_text(&mut rx).await).unwrap();
            assert_eq!(reply["id"], json!(id));
            assert_eq!(reply["error"], json!("Handler is not configured"));
        }
        dispatch.shutdown();
    }

    #[tokio::test]
    async fn test_pass_through_reaches_channel_once() {
        let channel = Echo::default();
        let delivered = channel.delivered.clone();
        let dispatch =
            Dispatch::spawn(RpcDispatcher::new(Some("t".into())), Box::new(channel)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        dispatch.open("s1", tx);

        let raw = r#"{"type":3,"payload":{"a":1}}"#;
        dispatch.frame("s1", raw.to_string());
        assert_eq!(next_text(&mut rx).await, format!("echo:{raw}"));
        dispatch.shutdown();

        assert_eq!(delivered.lock().as_slice(), [raw.to_string()]);
        assert_eq!(rx.recv().await, Some(Outbound::Close));
    }

    #[tokio::test]
    async fn test_frames_after_close_are_dropped() {
        let channel = Echo::default();
        let delivered = channel.delivered.clone();
        let dispatch = Dispatch::spawn(RpcDispatcher::new(None), Box::new(channel)).unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        dispatch.open("s1", tx);
        dispatch.close("s1");
        dispatch.frame("s1", r#"{"type":1}"#.to_string());
        dispatch.shutdown();

        assert!(delivered.lock().is_empty());
    }
}

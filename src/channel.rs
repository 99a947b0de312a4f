//! Pass-through sub-channel
//!
//! Frames without a `method` key belong to a secondary object-exposure
//! protocol that shares the connection. Its wire format is opaque here: raw
//! text goes in through [`PassThroughChannel::deliver`] and comes back out
//! through the session's [`ChannelTransport`].

use std::collections::HashMap;
use std::sync::Arc;

/// Identifies one connected transport inside a channel
pub type ChannelHandle = u64;

/// Outbound half of a session as seen by the channel
pub trait ChannelTransport: Send + Sync {
    /// Queue a raw frame for the client; `false` once the session is gone
    fn send(&self, raw: String) -> bool;
}

/// Secondary protocol multiplexed over each connection
///
/// All calls arrive on the dispatch thread, interleaved with control-plane
/// requests in frame order.
pub trait PassThroughChannel: Send {
    fn connect(&mut self, transport: Arc<dyn ChannelTransport>) -> ChannelHandle;

    /// Hand over an inbound frame exactly as received
    fn deliver(&mut self, handle: ChannelHandle, raw: &str);

    fn disconnect(&mut self, handle: ChannelHandle);
}

/// Channel that accepts transports and drops every inbound frame
#[derive(Default)]
pub struct NullChannel {
    next: ChannelHandle,
    transports: HashMap<ChannelHandle, Arc<dyn ChannelTransport>>,
}

impl NullChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(&self) -> usize {
        self.transports.len()
    }
}

impl PassThroughChannel for NullChannel {
    fn connect(&mut self, transport: Arc<dyn ChannelTransport>) -> ChannelHandle {
        self.next += 1;
        self.transports.insert(self.next, transport);
        self.next
    }

    fn deliver(&mut self, handle: ChannelHandle, raw: &str) {
        tracing::trace!("Dropping pass-through frame for handle {}: {} bytes", handle, raw.len());
    }

    fn disconnect(&mut self, handle: ChannelHandle) {
        self.transports.remove(&handle);
    }
}

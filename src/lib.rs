//! WebSocket automation proxy
//!
//! Exposes a live application's UI object tree to remote automation clients.
//! Control-plane requests (`resolve`, `execute_action`, `read_property`,
//! `screenshot`, `dump_tree`) are routed to an [`automation::AutomationHandler`];
//! every other frame on the same connection goes to a pass-through channel.

pub mod api;
pub mod automation;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod object;
pub mod rpc;
pub mod server;

pub use automation::{AutomationHandler, GenericHandler, ObjectDescriptor, TargetDescriptor};
pub use channel::{ChannelHandle, ChannelTransport, NullChannel, PassThroughChannel};
pub use config::Config;
pub use error::{AutomationError, ServerError};
pub use server::{ProxyServer, ServerHandle};

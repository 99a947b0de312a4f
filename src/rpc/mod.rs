//! Control-plane protocol: frame decoding, wire types and request routing

pub mod dispatcher;
pub mod frame;
pub mod types;

pub use dispatcher::{Routed, RpcDispatcher};
pub use frame::{parse_frame, Frame};
pub use types::{RpcRequest, RpcResponse};

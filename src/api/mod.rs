//! Connection manager: WebSocket sessions and the health endpoint

pub mod handlers;
pub mod routes;
pub mod state;
pub mod websocket;

pub use routes::create_router;
pub use state::AppState;

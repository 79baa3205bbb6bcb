//! WebSocket layer: wire protocol, session registry and the upgrade handler

pub mod handler;
pub mod protocol;
pub mod session;

pub use handler::ws_handler;
pub use session::SessionRegistry;

//! HTTP surface: health, leaderboard queries and the WebSocket route

pub mod routes;

pub use routes::build_router;

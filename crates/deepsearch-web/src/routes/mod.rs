mod chat;
mod health;
mod session;

pub use chat::{chat_routes, ChatRequest};
pub use health::health_routes;
pub use session::session_routes;

mod chat;

pub use chat::{spawn_relay, ChatRelay, RelaySettings, GENERIC_ERROR_MESSAGE};

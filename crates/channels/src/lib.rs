//! Transport to the external chat agent.
//!
//! [`ChannelOutbound`] is the side-effect contract a reply cycle drives;
//! [`AgentConnection`] implements it over a JSON-over-WebSocket link and
//! [`ConsoleOutbound`] prints the same effects to a terminal.

pub mod console;
pub mod error;
pub mod frame;
pub mod plugin;
pub mod websocket;

pub use {
    console::ConsoleOutbound,
    error::{Error, Result},
    frame::AgentFrame,
    plugin::ChannelOutbound,
    websocket::AgentConnection,
};

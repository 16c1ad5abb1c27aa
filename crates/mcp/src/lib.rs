// MCP (Model Context Protocol) server exposing the Kit API as tools

pub mod config;
pub mod protocol;
pub mod server;
pub mod state;
pub mod tools;

pub use config::KitbridgeConfig;
pub use server::McpServer;
pub use state::AppState;

// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_storage;
pub mod host_api;
pub mod host_events;
pub mod snapshot_renderer;
pub mod websocket_transport;
pub mod workspace;

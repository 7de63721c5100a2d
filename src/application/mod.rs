// Application layer - Stateful core of the panels
pub mod bridge_listener;
pub mod chart_adapter;
pub mod chart_renderer;
pub mod coordinate_readout;
pub mod endpoint;
pub mod interaction;
pub mod layout_origin;
pub mod overlay_controller;
pub mod overlay_service;
pub mod series_buffer;
pub mod telemetry_client;
pub mod view_state_store;

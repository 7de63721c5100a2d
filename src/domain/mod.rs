// Domain layer - Plain data shared by every other layer
pub mod graph;
pub mod host;
pub mod series;
pub mod telemetry;
pub mod view_state;

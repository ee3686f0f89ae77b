// Application layer - use cases and seams
pub mod device_api;
pub mod playback;
pub mod registry;
pub mod render_surface;
pub mod tracker;

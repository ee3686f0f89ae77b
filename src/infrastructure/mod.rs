// Infrastructure layer - external dependencies and adapters
pub mod config;
pub mod http_api;
pub mod map_scene;
pub mod stream;

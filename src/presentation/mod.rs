// Presentation layer - panel view models and the event loop
pub mod app;
pub mod panel;

// Domain layer - data model and pure derivations
pub mod device;
pub mod diagnostics;
pub mod settings;

pub mod configuration;
pub mod loader;

pub use configuration::Configuration;
pub use loader::ConfigLoader;

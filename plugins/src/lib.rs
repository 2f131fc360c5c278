pub mod factory;
pub mod llm;
pub mod services;
pub mod strategies;

pub use services::PluginServicesFactory;

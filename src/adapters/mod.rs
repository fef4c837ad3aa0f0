// Adapters layer: concrete implementations of the domain ports (HTTP API, console)
pub mod ovh;
pub mod prompt;

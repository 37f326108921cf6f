pub mod canvas;
pub mod config;
pub mod derive;
pub mod errors;
pub mod loader;
pub mod output;
pub mod report;
pub mod session;
pub mod types;
pub mod upload;
pub mod util;

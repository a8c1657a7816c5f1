// Prospector - API Core
//
// HTTP front for the automation pipelines: scrape a map search into a CSV
// export, or deliver a message batch through a WhatsApp bridge. Only one Job
// runs at a time and any Job can be cancelled from another request.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;

// HTTP routes
pub mod cancel;
pub mod health;
pub mod messages;
pub mod scrape;

pub use cancel::*;
pub use health::*;
pub use messages::*;
pub use scrape::*;

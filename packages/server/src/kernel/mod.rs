// Kernel - server dependencies and vendor adapters
pub mod deps;

pub use deps::*;

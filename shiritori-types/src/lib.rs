pub mod game;
pub mod messages;
pub mod settings;

// Re-export all types
pub use game::*;
pub use messages::*;
pub use settings::*;

pub mod engine;
pub mod genre;
pub mod kana;
pub mod timer;
pub mod vote;

// Re-export main components
pub use engine::*;
pub use genre::*;
pub use kana::*;
pub use timer::*;
pub use vote::*;

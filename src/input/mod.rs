pub mod handler;

pub use handler::{CursorMove, InputHandler, KeyAction};

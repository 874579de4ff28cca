pub mod renderer;

pub use renderer::{Dashboard, Renderer};

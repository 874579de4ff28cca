pub mod train;
pub mod watch;

pub use train::{SessionConfig, TrainConfig, TrainMode, build_session};
pub use watch::{PlaybackSpeed, WatchMode};

pub mod session_metrics;
pub mod training_stats;

pub use session_metrics::SessionMetrics;
pub use training_stats::TrainingStats;

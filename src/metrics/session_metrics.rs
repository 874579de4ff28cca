use std::time::{Duration, Instant};

use crate::rl::EpisodeSummary;

/// Wall-clock and outcome counters for an interactive session
pub struct SessionMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub best_reward: Option<f32>,
    pub solved_episodes: u32,
    pub episodes_watched: u32,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            best_reward: None,
            solved_episodes: 0,
            episodes_watched: 0,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_time = self.start_time.elapsed();
    }

    pub fn on_reset(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
    }

    /// Count a finished episode; `threshold` is the similarity that counts as solved
    pub fn on_episode_end(&mut self, summary: &EpisodeSummary, threshold: f32) {
        self.episodes_watched += 1;
        if summary.final_similarity > threshold {
            self.solved_episodes += 1;
        }
        let best = self.best_reward.get_or_insert(summary.total_reward);
        if summary.total_reward > *best {
            *best = summary.total_reward;
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

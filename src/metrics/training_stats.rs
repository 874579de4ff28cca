//! Training statistics tracking for DQN
//!
//! This module provides utilities for tracking and monitoring training progress,
//! including episode rewards, lengths, final similarities, and loss values.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// Tracks episode-level metrics (rewards, lengths, final similarity) and the
/// loss of every training step using rolling windows for smoothed statistics.
/// The reward window doubles as the reward history shown by the watch view.
///
/// # Example
///
/// ```rust
/// use life_shaper::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// // Record an episode
/// stats.record_episode(2.5, 40, 0.92);
///
/// // Record a training step
/// stats.record_update(0.03);
///
/// // Get statistics
/// println!("Mean reward: {}", stats.mean_episode_reward());
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Similarity to the target when each episode ended (rolling window)
    final_similarities: VecDeque<f32>,

    /// Training losses (rolling window)
    losses: VecDeque<f32>,

    /// Highest final similarity seen so far
    best_similarity: f32,

    /// Total number of episodes completed
    total_episodes: usize,

    /// Total number of environment steps taken
    total_steps: usize,

    /// Total number of training steps
    total_updates: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a new training statistics tracker
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of recent values to keep for rolling averages
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            final_similarities: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            best_similarity: 0.0,
            total_episodes: 0,
            total_steps: 0,
            total_updates: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    ///
    /// # Arguments
    ///
    /// * `reward` - Total reward accumulated during the episode
    /// * `length` - Number of steps taken in the episode
    /// * `similarity` - Similarity to the target at the end of the episode
    ///
    /// # Example
    ///
    /// ```rust
    /// use life_shaper::metrics::TrainingStats;
    ///
    /// let mut stats = TrainingStats::new(100);
    /// stats.record_episode(1.5, 100, 0.8);
    ///
    /// assert_eq!(stats.total_episodes(), 1);
    /// assert_eq!(stats.total_steps(), 100);
    /// ```
    pub fn record_episode(&mut self, reward: f32, length: usize, similarity: f32) {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.final_similarities, similarity, self.window_size);
        self.best_similarity = self.best_similarity.max(similarity);
        self.total_episodes += 1;
        self.total_steps += length;
    }

    /// Record the loss of one training step
    pub fn record_update(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
        self.total_updates += 1;
    }

    /// Rewards of the most recent episodes, oldest first
    pub fn episode_rewards(&self) -> impl Iterator<Item = f32> + '_ {
        self.episode_rewards.iter().copied()
    }

    /// Get the mean episode reward over the rolling window
    ///
    /// # Returns
    ///
    /// The average reward, or 0.0 if no episodes have been recorded
    pub fn mean_episode_reward(&self) -> f32 {
        self.mean(&self.episode_rewards)
    }

    /// Get the mean episode length over the rolling window
    pub fn mean_episode_length(&self) -> f32 {
        let sum: usize = self.episode_lengths.iter().sum();
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            sum as f32 / self.episode_lengths.len() as f32
        }
    }

    /// Get the mean final similarity over the rolling window
    pub fn mean_final_similarity(&self) -> f32 {
        self.mean(&self.final_similarities)
    }

    /// Get the mean training loss over the rolling window
    ///
    /// # Returns
    ///
    /// The average loss, or 0.0 if no training step has run
    pub fn mean_loss(&self) -> f32 {
        self.mean(&self.losses)
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.losses.back().copied()
    }

    pub fn best_similarity(&self) -> f32 {
        self.best_similarity
    }

    /// Get the total number of episodes completed
    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Get the total number of environment steps taken
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn total_updates(&self) -> usize {
        self.total_updates
    }

    /// Get the window size for rolling averages
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Format a summary of the current statistics
    ///
    /// # Example
    ///
    /// ```rust
    /// use life_shaper::metrics::TrainingStats;
    ///
    /// let mut stats = TrainingStats::new(100);
    /// stats.record_episode(2.5, 40, 0.92);
    /// stats.record_update(0.03);
    ///
    /// println!("{}", stats.format_summary());
    /// // Output: Episodes: 1 | Steps: 40 | Reward: 2.50 | Len: 40.0 | Sim: 0.920 | Best: 0.920 | Loss: 0.0300
    /// ```
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Reward: {:.2} | Len: {:.1} | Sim: {:.3} | Best: {:.3} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_reward(),
            self.mean_episode_length(),
            self.mean_final_similarity(),
            self.best_similarity,
            self.mean_loss(),
        )
    }

    /// Helper function to compute mean of a VecDeque<f32>
    fn mean(&self, deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    /// Helper function to push to a deque with size limit
    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

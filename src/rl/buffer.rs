//! Experience replay buffer
//!
//! This module implements a bounded FIFO store of transitions with uniform
//! random sampling for off-policy training. Once full, each new transition
//! evicts the oldest one.

use rand::Rng;
use std::collections::VecDeque;

/// One recorded step of interaction with the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Flattened grid before the action
    pub state: Vec<f32>,

    /// Linear index of the toggled cell
    pub action: usize,

    /// Reward received for the step
    pub reward: f32,

    /// Flattened grid after the action (and evolution, if enabled)
    pub next_state: Vec<f32>,

    /// Whether the step ended the episode
    pub done: bool,
}

impl Transition {
    pub fn new(
        state: Vec<f32>,
        action: usize,
        reward: f32,
        next_state: Vec<f32>,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Bounded replay buffer with FIFO eviction
///
/// # Example
///
/// ```rust
/// use life_shaper::rl::{ReplayBuffer, Transition};
///
/// let mut buffer = ReplayBuffer::new(2);
/// for tag in 0..3 {
///     buffer.store(Transition::new(vec![0.0; 4], tag, 0.0, vec![0.0; 4], false));
/// }
///
/// assert_eq!(buffer.len(), 2);
/// let actions: Vec<usize> = buffer.iter().map(|t| t.action).collect();
/// assert_eq!(actions, vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    /// Stored transitions, oldest first
    transitions: VecDeque<Transition>,

    /// Maximum number of transitions kept
    capacity: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer holding at most `capacity` transitions
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a transition, evicting the oldest one if the buffer is full
    pub fn store(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Draw `batch_size` transitions uniformly at random, with replacement
    ///
    /// Returns `None` when fewer than `batch_size` transitions are stored; the
    /// caller skips training in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use life_shaper::rl::{ReplayBuffer, Transition};
    ///
    /// let mut buffer = ReplayBuffer::new(100);
    /// let mut rng = rand::thread_rng();
    /// assert!(buffer.sample_batch(4, &mut rng).is_none());
    ///
    /// for tag in 0..4 {
    ///     buffer.store(Transition::new(vec![0.0], tag, 0.0, vec![0.0], false));
    /// }
    /// assert_eq!(buffer.sample_batch(4, &mut rng).unwrap().len(), 4);
    /// ```
    pub fn sample_batch<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Option<Vec<Transition>> {
        let n = self.transitions.len();
        if n == 0 || n < batch_size {
            return None;
        }

        Some(
            (0..batch_size)
                .map(|_| self.transitions[rng.gen_range(0..n)].clone())
                .collect(),
        )
    }

    /// Number of stored transitions
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over stored transitions, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Transition> + '_ {
        self.transitions.iter()
    }

    /// Drop every stored transition
    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

//! Episode-driven training loop
//!
//! [`TrainingLoop`] owns everything one training session mutates: the
//! environment, the replay buffer, the agent, the episode counters and the
//! reward history. One call to [`TrainingLoop::step`] runs one full
//! select → act → simulate → reward → store → train cycle to completion.
//!
//! Cancellation is cooperative: a shared flag, exposed through
//! [`TrainingHandle`], is polled at the top of every step and every episode.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::agent::DqnAgent;
use super::buffer::{ReplayBuffer, Transition};
use super::config::DqnConfig;
use super::qfunction::QFunction;
use super::reward::reward;
use crate::life::{Grid, GridEnvironment};
use crate::metrics::TrainingStats;

/// Number of episode rewards kept for charting
pub const REWARD_HISTORY_LEN: usize = 100;

/// Cloneable switch for starting and stopping a training loop from elsewhere
#[derive(Debug, Clone, Default)]
pub struct TrainingHandle {
    active: Arc<AtomicBool>,
}

impl TrainingHandle {
    pub fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Whether an episode is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

/// Per-episode counters, reset at every episode start
#[derive(Debug, Clone, PartialEq)]
struct EpisodeState {
    steps: usize,
    total_reward: f32,
    last_similarity: f32,
}

/// What happened during one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub action: usize,
    pub reward: f32,
    pub similarity: f32,
    pub done: bool,
    /// Loss of the training call, if one ran
    pub loss: Option<f32>,
    /// Filled in when this step finished the episode
    pub episode: Option<EpisodeSummary>,
}

/// Totals for a finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Zero-based index of the finished episode
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f32,
    pub final_similarity: f32,
    /// Exploration rate after decay
    pub epsilon: f32,
    pub target_synced: bool,
}

/// A training session over one fixed grid size
pub struct TrainingLoop<Q: QFunction> {
    env: GridEnvironment,
    buffer: ReplayBuffer,
    agent: DqnAgent<Q>,
    config: DqnConfig,
    stats: TrainingStats,
    phase: Phase,
    episode: usize,
    current: Option<EpisodeState>,
    handle: TrainingHandle,
}

impl<Q: QFunction> TrainingLoop<Q> {
    /// Assemble a session
    ///
    /// The Q-functions' action space must equal the environment's grid area;
    /// sessions for another grid size need new Q-functions and a new loop.
    pub fn new(env: GridEnvironment, policy: Q, target: Q, config: DqnConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid DQN configuration: {}", e))?;

        let cells = env.action_space();
        if policy.action_space() != cells || target.action_space() != cells {
            anyhow::bail!(
                "Q-function action space ({}, {}) does not match grid area {}",
                policy.action_space(),
                target.action_space(),
                cells
            );
        }

        Ok(Self {
            buffer: ReplayBuffer::new(config.buffer_capacity),
            agent: DqnAgent::new(policy, target, &config),
            stats: TrainingStats::new(REWARD_HISTORY_LEN),
            env,
            config,
            phase: Phase::Idle,
            episode: 0,
            current: None,
            handle: TrainingHandle::default(),
        })
    }

    /// Handle sharing this loop's training-active flag
    pub fn handle(&self) -> TrainingHandle {
        self.handle.clone()
    }

    /// Reset the environment and episode counters; the loop becomes `Running`
    pub fn start_episode(&mut self) {
        self.env.reset();
        self.current = Some(EpisodeState {
            steps: 0,
            total_reward: 0.0,
            last_similarity: self.env.similarity(),
        });
        self.phase = Phase::Running;
        debug!(episode = self.episode, "episode started");
    }

    /// Run one step of the current episode, starting one if needed
    ///
    /// Returns `Ok(None)` when the training flag is cleared; the loop goes
    /// `Idle` and completed steps are kept. A Q-function failure abandons the
    /// episode and is returned as an error; the transition of that step has
    /// already been stored.
    pub fn step(&mut self) -> Result<Option<StepOutcome>> {
        if !self.handle.is_active() {
            self.pause();
            return Ok(None);
        }

        if self.current.is_none() {
            self.start_episode();
        }

        match self.advance() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(err) => {
                warn!(episode = self.episode, error = %err, "episode aborted");
                self.current = None;
                self.phase = Phase::Idle;
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<StepOutcome> {
        let steps = match &self.current {
            Some(ep) => ep.steps,
            None => anyhow::bail!("no episode in progress"),
        };

        // Live grid; cells may have been edited while paused
        let prev_similarity = self.env.similarity();

        let state = self.env.state_vector();
        let action = self
            .agent
            .select_action(&state)
            .context("action selection failed")?;

        self.env.apply_action(action);
        if self.env.auto_evolve() {
            self.env.step();
        }

        let similarity = self.env.similarity();
        let step_reward = reward(prev_similarity, similarity);
        let next_state = self.env.state_vector();
        let last_step = steps + 1 >= self.config.max_steps;
        let done = similarity > self.config.success_threshold || last_step;

        self.buffer.store(Transition::new(
            state,
            action,
            step_reward,
            next_state,
            done,
        ));

        if let Some(ep) = self.current.as_mut() {
            ep.steps += 1;
            ep.total_reward += step_reward;
            ep.last_similarity = similarity;
        }

        let loss = self
            .agent
            .train_step(&self.buffer)
            .context("training step failed")?;
        if let Some(loss) = loss {
            self.stats.record_update(loss);
        }

        let episode = if done { self.finish_episode() } else { None };

        Ok(StepOutcome {
            action,
            reward: step_reward,
            similarity,
            done,
            loss,
            episode,
        })
    }

    /// Close the current episode: decay epsilon, sync the target every
    /// `target_sync_interval` episodes, log the reward, advance the counter
    fn finish_episode(&mut self) -> Option<EpisodeSummary> {
        let ep = self.current.take()?;
        let final_similarity = ep.last_similarity;

        let epsilon = self.agent.decay_epsilon();

        let completed = self.episode + 1;
        let target_synced = completed % self.config.target_sync_interval == 0;
        if target_synced {
            self.agent.sync_target();
            debug!(episode = self.episode, "target network synced");
        }

        self.stats
            .record_episode(ep.total_reward, ep.steps, final_similarity);

        let summary = EpisodeSummary {
            episode: self.episode,
            steps: ep.steps,
            total_reward: ep.total_reward,
            final_similarity,
            epsilon,
            target_synced,
        };

        info!(
            episode = summary.episode,
            steps = summary.steps,
            reward = summary.total_reward,
            similarity = summary.final_similarity,
            epsilon = summary.epsilon,
            "episode finished"
        );

        self.episode = completed;
        self.phase = Phase::Idle;
        Some(summary)
    }

    /// Run steps until the current episode ends or training is stopped
    ///
    /// Returns `Ok(None)` if the flag was cleared before the episode finished.
    pub fn run_episode(&mut self) -> Result<Option<EpisodeSummary>> {
        loop {
            match self.step()? {
                Some(StepOutcome {
                    episode: Some(summary),
                    ..
                }) => return Ok(Some(summary)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    /// Train until `max_episodes` more episodes finish or training is stopped
    ///
    /// Sets the training flag on entry.
    pub fn run(&mut self, max_episodes: usize) -> Result<Vec<EpisodeSummary>> {
        self.handle.start();
        let mut summaries = Vec::new();

        while summaries.len() < max_episodes && self.handle.is_active() {
            match self.run_episode()? {
                Some(summary) => summaries.push(summary),
                None => break,
            }
        }

        Ok(summaries)
    }

    /// Stop advancing; the episode in progress is kept and resumes on the next step
    fn pause(&mut self) {
        if self.phase == Phase::Running {
            debug!(episode = self.episode, "training paused");
        }
        self.phase = Phase::Idle;
    }

    /// Abandon any episode in progress and re-randomise the grid
    ///
    /// Epsilon, the episode counter, the replay buffer and the Q-functions are kept.
    pub fn reset(&mut self) {
        self.env.reset();
        self.current = None;
        self.phase = Phase::Idle;
    }

    /// Continue episode numbering and exploration from a saved session
    pub fn resume(&mut self, episodes_completed: usize, epsilon: f32) {
        self.episode = episodes_completed;
        self.agent.set_epsilon(epsilon);
    }

    /// Manually flip a cell; ignored while an episode is running or out of range
    pub fn toggle_cell(&mut self, row: usize, col: usize) -> bool {
        if self.phase == Phase::Running || self.handle.is_active() {
            return false;
        }
        let size = self.env.grid().size();
        if row >= size || col >= size {
            return false;
        }
        self.env.apply_action(row * size + col)
    }

    /// Enable or disable one generation of evolution after every action
    pub fn set_auto_evolve(&mut self, enabled: bool) {
        self.env.set_auto_evolve(enabled);
    }

    pub fn auto_evolve(&self) -> bool {
        self.env.auto_evolve()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the episode in progress (or the next one to start)
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Steps taken in the current episode
    pub fn episode_steps(&self) -> usize {
        self.current.as_ref().map_or(0, |ep| ep.steps)
    }

    /// Reward accumulated in the current episode
    pub fn episode_reward(&self) -> f32 {
        self.current.as_ref().map_or(0.0, |ep| ep.total_reward)
    }

    pub fn epsilon(&self) -> f32 {
        self.agent.epsilon()
    }

    pub fn similarity(&self) -> f32 {
        self.env.similarity()
    }

    pub fn grid(&self) -> &Grid {
        self.env.grid()
    }

    pub fn target(&self) -> &Grid {
        self.env.target()
    }

    /// Total rewards of the most recent episodes, oldest first
    pub fn reward_history(&self) -> impl Iterator<Item = f32> + '_ {
        self.stats.episode_rewards()
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn agent(&self) -> &DqnAgent<Q> {
        &self.agent
    }

    pub fn environment(&self) -> &GridEnvironment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut GridEnvironment {
        &mut self.env
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }
}

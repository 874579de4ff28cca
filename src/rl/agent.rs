//! DQN agent
//!
//! Pairs a live Q-function with a frozen target copy, selects actions
//! epsilon-greedily and turns sampled transitions into corrected targets for a
//! training step.

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::buffer::{ReplayBuffer, Transition};
use super::config::DqnConfig;
use super::qfunction::QFunction;

/// Geometrically decaying exploration rate with a floor
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f32,
    min: f32,
    decay: f32,
}

impl EpsilonGreedy {
    pub fn new(start: f32, min: f32, decay: f32) -> Self {
        Self {
            epsilon: start.max(min),
            min,
            decay,
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Overwrite the current rate, e.g. when resuming; clamped to `[min, 1]`
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(self.min, 1.0);
    }

    /// Apply one episode of decay and return the new rate
    pub fn decay(&mut self) -> f32 {
        self.epsilon = (self.epsilon * self.decay).max(self.min);
        self.epsilon
    }
}

/// Index of the largest value; the first index wins on ties
///
/// ```rust
/// use life_shaper::rl::argmax;
///
/// assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
/// ```
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Seed for the agent's generator, offset so a session seed shared with the
/// environment yields a separate stream
pub fn exploration_seed(seed: u64) -> u64 {
    seed.wrapping_add(1)
}

/// Off-policy value learner with a target network
pub struct DqnAgent<Q: QFunction> {
    /// Q-function being trained
    policy: Q,

    /// Frozen copy used for bootstrapped targets
    target: Q,

    exploration: EpsilonGreedy,

    /// Discount applied to bootstrapped values
    gamma: f32,

    batch_size: usize,

    /// Random source for exploration and replay sampling
    rng: StdRng,

    /// Number of completed training steps
    training_steps: usize,
}

impl<Q: QFunction> DqnAgent<Q> {
    /// Create an agent; `target` is immediately overwritten with the policy's parameters
    pub fn new(policy: Q, mut target: Q, config: &DqnConfig) -> Self {
        policy.clone_parameters_into(&mut target);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(exploration_seed(seed)),
            None => StdRng::from_entropy(),
        };

        Self {
            policy,
            target,
            exploration: EpsilonGreedy::new(
                config.epsilon_start,
                config.epsilon_min,
                config.epsilon_decay,
            ),
            gamma: config.gamma,
            batch_size: config.batch_size,
            rng,
            training_steps: 0,
        }
    }

    /// Epsilon-greedy action for `state`
    ///
    /// With probability epsilon a uniformly random action, otherwise the
    /// argmax of the live Q-function.
    pub fn select_action(&mut self, state: &[f32]) -> Result<usize> {
        let epsilon = self.exploration.epsilon();
        if self.rng.gen_bool(f64::from(epsilon)) {
            return Ok(self.rng.gen_range(0..self.policy.action_space()));
        }

        self.greedy_action(state)
    }

    /// Best action according to the live Q-function
    pub fn greedy_action(&self, state: &[f32]) -> Result<usize> {
        let values = self.policy.predict(state)?;
        if values.is_empty() {
            bail!("Q-function returned no action values");
        }
        Ok(argmax(&values))
    }

    /// Build the regression targets for a sampled batch
    ///
    /// Each target vector is the live prediction for the state with only the
    /// taken action's slot replaced by `r` (terminal) or
    /// `r + gamma * max(target(s'))`.
    pub fn compute_targets(&self, batch: &[Transition]) -> Result<Vec<Vec<f32>>> {
        let states: Vec<Vec<f32>> = batch.iter().map(|t| t.state.clone()).collect();
        let next_states: Vec<Vec<f32>> = batch.iter().map(|t| t.next_state.clone()).collect();

        let mut targets = self.policy.predict_batch(&states)?;
        let next_values = self.target.predict_batch(&next_states)?;

        if targets.len() != batch.len() || next_values.len() != batch.len() {
            bail!("Q-function returned the wrong number of predictions");
        }

        for ((transition, target), next) in batch.iter().zip(&mut targets).zip(&next_values) {
            let slot = target.get_mut(transition.action).with_context(|| {
                format!("action {} outside the action space", transition.action)
            })?;

            *slot = if transition.done {
                transition.reward
            } else {
                let best_next = next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                transition.reward + self.gamma * best_next
            };
        }

        Ok(targets)
    }

    /// Sample a batch and run one update of the live Q-function
    ///
    /// Returns `Ok(None)` without touching the Q-function when the buffer
    /// holds fewer transitions than the batch size.
    pub fn train_step(&mut self, buffer: &ReplayBuffer) -> Result<Option<f32>> {
        let Some(batch) = buffer.sample_batch(self.batch_size, &mut self.rng) else {
            return Ok(None);
        };

        let targets = self.compute_targets(&batch)?;
        let states: Vec<Vec<f32>> = batch.into_iter().map(|t| t.state).collect();

        let loss = self.policy.update(&states, &targets)?;
        self.training_steps += 1;

        Ok(Some(loss))
    }

    /// Copy the live parameters into the target network
    pub fn sync_target(&mut self) {
        self.policy.clone_parameters_into(&mut self.target);
    }

    /// Apply one episode of exploration decay
    pub fn decay_epsilon(&mut self) -> f32 {
        self.exploration.decay()
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.exploration.set_epsilon(epsilon);
    }

    pub fn training_steps(&self) -> usize {
        self.training_steps
    }

    pub fn action_space(&self) -> usize {
        self.policy.action_space()
    }

    pub fn policy(&self) -> &Q {
        &self.policy
    }

    pub fn target(&self) -> &Q {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Q-function returning the same values for every state
    struct FixedQ {
        values: Vec<f32>,
        updates: Vec<(Vec<Vec<f32>>, Vec<Vec<f32>>)>,
        fail_update: bool,
    }

    impl FixedQ {
        fn new(values: Vec<f32>) -> Self {
            Self {
                values,
                updates: Vec::new(),
                fail_update: false,
            }
        }
    }

    impl QFunction for FixedQ {
        fn action_space(&self) -> usize {
            self.values.len()
        }

        fn predict(&self, _state: &[f32]) -> Result<Vec<f32>> {
            Ok(self.values.clone())
        }

        fn update(&mut self, states: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<f32> {
            if self.fail_update {
                return Err(anyhow!("out of memory"));
            }
            self.updates.push((states.to_vec(), targets.to_vec()));
            Ok(0.5)
        }

        fn clone_parameters_into(&self, target: &mut Self) {
            target.values = self.values.clone();
        }
    }

    fn greedy_config() -> DqnConfig {
        DqnConfig {
            epsilon_start: 0.0,
            epsilon_min: 0.0,
            batch_size: 2,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_argmax_first_index_wins() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[5.0, 5.0]), 0);
        assert_eq!(argmax(&[-2.0, -1.0, -3.0]), 1);
        assert_eq!(argmax(&[0.0]), 0);
    }

    #[test]
    fn test_zero_epsilon_is_deterministic_argmax() {
        let values = vec![0.1, 0.4, 0.9, 0.9, 0.2];
        let mut agent = DqnAgent::new(
            FixedQ::new(values.clone()),
            FixedQ::new(vec![0.0; 5]),
            &greedy_config(),
        );

        for _ in 0..100 {
            assert_eq!(agent.select_action(&[0.0; 5]).unwrap(), 2);
        }
    }

    #[test]
    fn test_full_epsilon_explores_whole_space() {
        let config = DqnConfig {
            epsilon_start: 1.0,
            epsilon_min: 1.0,
            seed: Some(3),
            ..Default::default()
        };
        let mut agent = DqnAgent::new(FixedQ::new(vec![0.0; 4]), FixedQ::new(vec![0.0; 4]), &config);

        let mut seen = [false; 4];
        for _ in 0..200 {
            let action = agent.select_action(&[0.0; 4]).unwrap();
            assert!(action < 4);
            seen[action] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_session_seed_gives_agent_its_own_stream() {
        let config = DqnConfig {
            epsilon_start: 1.0,
            epsilon_min: 1.0,
            seed: Some(7),
            ..Default::default()
        };
        let mut agent = DqnAgent::new(
            FixedQ::new(vec![0.0; 1000]),
            FixedQ::new(vec![0.0; 1000]),
            &config,
        );
        let actions: Vec<usize> = (0..8)
            .map(|_| agent.select_action(&[0.0]).unwrap())
            .collect();

        // Same draws the agent makes, from a generator sharing the raw session seed
        let mut shared = StdRng::seed_from_u64(7);
        let mirrored: Vec<usize> = (0..8)
            .map(|_| {
                shared.gen_bool(1.0);
                shared.gen_range(0..1000)
            })
            .collect();

        let mut offset = StdRng::seed_from_u64(exploration_seed(7));
        let expected: Vec<usize> = (0..8)
            .map(|_| {
                offset.gen_bool(1.0);
                offset.gen_range(0..1000)
            })
            .collect();

        assert_eq!(actions, expected);
        assert_ne!(actions, mirrored);
        assert_eq!(exploration_seed(u64::MAX), 0);
    }

    #[test]
    fn test_new_syncs_target() {
        let agent = DqnAgent::new(
            FixedQ::new(vec![1.0, 2.0]),
            FixedQ::new(vec![9.0, 9.0]),
            &greedy_config(),
        );
        assert_eq!(agent.target().values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_targets_bootstrap_from_target_network() {
        let mut agent = DqnAgent::new(
            FixedQ::new(vec![1.0, 2.0, 3.0]),
            FixedQ::new(vec![0.0; 3]),
            &greedy_config(),
        );
        // Diverge the frozen copy from the live policy
        agent.target.values = vec![10.0, 20.0, 5.0];

        let batch = vec![
            Transition::new(vec![0.0; 3], 0, 0.5, vec![1.0; 3], false),
            Transition::new(vec![0.0; 3], 2, -1.0, vec![1.0; 3], true),
        ];

        let targets = agent.compute_targets(&batch).unwrap();

        assert!((targets[0][0] - (0.5 + 0.95 * 20.0)).abs() < 1e-5);
        assert_eq!(&targets[0][1..], &[2.0, 3.0]);
        assert_eq!(targets[1], vec![1.0, 2.0, -1.0]);
    }

    #[test]
    fn test_targets_reject_out_of_range_action() {
        let agent = DqnAgent::new(
            FixedQ::new(vec![0.0; 3]),
            FixedQ::new(vec![0.0; 3]),
            &greedy_config(),
        );
        let batch = vec![Transition::new(vec![0.0; 3], 7, 0.0, vec![0.0; 3], true)];
        assert!(agent.compute_targets(&batch).is_err());
    }

    #[test]
    fn test_train_step_skips_small_buffer() {
        let mut agent = DqnAgent::new(
            FixedQ::new(vec![0.0; 3]),
            FixedQ::new(vec![0.0; 3]),
            &greedy_config(),
        );
        let mut buffer = ReplayBuffer::new(10);
        buffer.store(Transition::new(vec![0.0; 3], 1, 1.0, vec![0.0; 3], false));

        assert_eq!(agent.train_step(&buffer).unwrap(), None);
        assert!(agent.policy().updates.is_empty());
        assert_eq!(agent.training_steps(), 0);
    }

    #[test]
    fn test_train_step_updates_policy_with_batch() {
        let mut agent = DqnAgent::new(
            FixedQ::new(vec![0.0; 3]),
            FixedQ::new(vec![0.0; 3]),
            &greedy_config(),
        );
        let mut buffer = ReplayBuffer::new(10);
        for action in 0..3 {
            buffer.store(Transition::new(vec![1.0; 3], action, 1.0, vec![0.0; 3], true));
        }

        assert_eq!(agent.train_step(&buffer).unwrap(), Some(0.5));

        let (states, targets) = &agent.policy().updates[0];
        assert_eq!(states.len(), 2);
        assert_eq!(targets.len(), 2);
        assert_eq!(agent.training_steps(), 1);
    }

    #[test]
    fn test_train_step_propagates_failure() {
        let mut policy = FixedQ::new(vec![0.0; 3]);
        policy.fail_update = true;
        let mut agent = DqnAgent::new(policy, FixedQ::new(vec![0.0; 3]), &greedy_config());

        let mut buffer = ReplayBuffer::new(10);
        for _ in 0..2 {
            buffer.store(Transition::new(vec![0.0; 3], 0, 0.0, vec![0.0; 3], false));
        }

        assert!(agent.train_step(&buffer).is_err());
        assert_eq!(agent.training_steps(), 0);
    }

    #[test]
    fn test_epsilon_decay_respects_floor() {
        let mut exploration = EpsilonGreedy::new(1.0, 0.05, 0.9);
        for _ in 0..10_000 {
            let epsilon = exploration.decay();
            assert!(epsilon >= 0.05);
        }
        assert_eq!(exploration.epsilon(), 0.05);
    }

    #[test]
    fn test_epsilon_decay_is_geometric() {
        let mut exploration = EpsilonGreedy::new(1.0, 0.01, 0.5);
        assert_eq!(exploration.decay(), 0.5);
        assert_eq!(exploration.decay(), 0.25);
    }

    #[test]
    fn test_set_epsilon_is_clamped() {
        let mut exploration = EpsilonGreedy::new(1.0, 0.1, 0.99);
        exploration.set_epsilon(0.0);
        assert_eq!(exploration.epsilon(), 0.1);
        exploration.set_epsilon(2.0);
        assert_eq!(exploration.epsilon(), 1.0);
    }
}

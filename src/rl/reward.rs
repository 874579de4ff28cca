//! Reward shaping for the grid-shaping task
//!
//! Improvements in similarity are paid at twice the rate that regressions are
//! charged, and a step that changes nothing costs a flat time penalty.

/// Reward per unit of similarity gained
pub const IMPROVEMENT_SCALE: f32 = 10.0;

/// Penalty per unit of similarity lost
pub const REGRESSION_SCALE: f32 = 5.0;

/// Reward for a step that leaves similarity unchanged
pub const STALL_PENALTY: f32 = -0.1;

/// Map the similarity before and after a step to a scalar reward
///
/// ```rust
/// use life_shaper::rl::reward;
///
/// assert_eq!(reward(0.5, 0.5), -0.1);
/// assert!(reward(0.5, 0.6) > 0.0);
/// assert!(reward(0.6, 0.5) < 0.0);
/// ```
pub fn reward(prev_similarity: f32, curr_similarity: f32) -> f32 {
    let delta = curr_similarity - prev_similarity;

    if curr_similarity > prev_similarity {
        IMPROVEMENT_SCALE * delta
    } else if curr_similarity < prev_similarity {
        REGRESSION_SCALE * delta
    } else {
        STALL_PENALTY
    }
}

//! Interactive mode for watching and steering training
//!
//! This module implements a TUI that runs the training loop one step per
//! tick and displays the current grid next to the target pattern, with the
//! recent episode rewards as a sparkline.
//!
//! # Controls
//!
//! - Space: Start/stop training
//! - R: Reset the grid (stops training)
//! - E: Toggle auto-evolve
//! - Arrow keys: Move the edit cursor
//! - Enter/T: Toggle the cell under the cursor (only while stopped)
//! - 1-4: Speed control (1=slow, 2=normal, 3=fast, 4=very fast)
//! - S: Save the model (when a save path is configured)
//! - Q/Esc: Quit

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{Stderr, stderr},
    path::PathBuf,
    time::Duration,
};
use tokio::time::{Interval, interval};
use tracing::error;

use crate::input::{CursorMove, InputHandler, KeyAction};
use crate::metrics::SessionMetrics;
use crate::render::{Dashboard, Renderer};
use crate::rl::{BurnQFunction, TrainingHandle, TrainingLoop, save_model};

/// Playback speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSpeed {
    /// Slow: 2 Hz (500ms per step)
    Slow,
    /// Normal: 8 Hz (125ms per step)
    Normal,
    /// Fast: 20 Hz (50ms per step)
    Fast,
    /// Very Fast: 60 Hz (16ms per step)
    VeryFast,
}

impl PlaybackSpeed {
    /// Speed for a number key, 1 (slowest) to 4
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Slow),
            2 => Some(Self::Normal),
            3 => Some(Self::Fast),
            4 => Some(Self::VeryFast),
            _ => None,
        }
    }

    /// Get the tick interval for this speed
    pub fn tick_interval(&self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(500),
            Self::Normal => Duration::from_millis(125),
            Self::Fast => Duration::from_millis(50),
            Self::VeryFast => Duration::from_millis(16),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }
}

/// Move the cursor one cell, staying inside a `size`×`size` grid
fn move_cursor((row, col): (usize, usize), direction: CursorMove, size: usize) -> (usize, usize) {
    let last = size.saturating_sub(1);
    match direction {
        CursorMove::Up => (row.saturating_sub(1), col),
        CursorMove::Down => ((row + 1).min(last), col),
        CursorMove::Left => (row, col.saturating_sub(1)),
        CursorMove::Right => (row, (col + 1).min(last)),
    }
}

/// Watch mode: the training session behind a terminal control surface
pub struct WatchMode<B: AutodiffBackend> {
    /// Training session driven one step per tick
    training: TrainingLoop<BurnQFunction<B>>,

    /// Training-active flag of the session
    handle: TrainingHandle,

    renderer: Renderer,
    input_handler: InputHandler,
    metrics: SessionMetrics,

    /// Where `S` saves the model
    save_path: Option<PathBuf>,

    /// Edit cursor (row, col)
    cursor: (usize, usize),

    /// Current playback speed
    speed: PlaybackSpeed,

    /// Last message shown in the footer
    status: Option<String>,

    /// Whether to quit
    should_quit: bool,
}

impl<B: AutodiffBackend> WatchMode<B> {
    /// Wrap a training session; training starts stopped
    pub fn new(training: TrainingLoop<BurnQFunction<B>>, save_path: Option<PathBuf>) -> Self {
        let handle = training.handle();
        handle.stop();

        Self {
            training,
            handle,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            metrics: SessionMetrics::new(),
            save_path,
            cursor: (0, 0),
            speed: PlaybackSpeed::Normal,
            status: Some("Press Space to start training".to_string()),
            should_quit: false,
        }
    }

    /// Run the interactive loop
    ///
    /// Sets up the terminal, runs the main loop, and cleans up on exit.
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_watch_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_watch_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Training steps based on speed
        let mut tick_timer = interval(self.speed.tick_interval());

        // Render at 30 FPS
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle keyboard input
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer);
                    }
                }

                // Training tick
                _ = tick_timer.tick() => {
                    self.tick();
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    terminal.draw(|frame| {
                        self.render_frame(frame);
                    }).context("Failed to draw frame")?;
                }

                // Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        self.handle.stop();
        Ok(())
    }

    /// Advance training by one step if it is running
    ///
    /// A failed step stops training and is reported in the footer.
    fn tick(&mut self) {
        if !self.handle.is_active() {
            return;
        }

        match self.training.step() {
            Ok(Some(outcome)) => {
                if let Some(summary) = outcome.episode {
                    let threshold = self.training.config().success_threshold;
                    self.metrics.on_episode_end(&summary, threshold);
                }
            }
            Ok(None) => {}
            Err(err) => {
                error!(error = %format!("{:#}", err), "training step failed");
                self.handle.stop();
                self.status = Some(format!("Training stopped: {:#}", err));
            }
        }
    }

    /// Handle keyboard events
    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) {
        if let Event::Key(key) = event {
            // Only process key press events
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            if let Some(speed) = self.apply(action) {
                tick_timer.reset_after(speed.tick_interval());
            }
        }
    }

    /// Apply a key action; returns the new speed if it changed
    fn apply(&mut self, action: KeyAction) -> Option<PlaybackSpeed> {
        match action {
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::ToggleTraining => {
                if self.handle.is_active() {
                    self.handle.stop();
                    self.status = Some("Training stopped".to_string());
                } else {
                    self.handle.start();
                    self.status = None;
                }
            }
            KeyAction::Reset => {
                self.handle.stop();
                self.training.reset();
                self.metrics.on_reset();
                self.status = Some("Grid reset".to_string());
            }
            KeyAction::ToggleAutoEvolve => {
                let enabled = !self.training.auto_evolve();
                self.training.set_auto_evolve(enabled);
            }
            KeyAction::MoveCursor(direction) => {
                let size = self.training.grid().size();
                self.cursor = move_cursor(self.cursor, direction, size);
            }
            KeyAction::ToggleCell => {
                let (row, col) = self.cursor;
                if !self.training.toggle_cell(row, col) {
                    self.status = Some("Stop training to edit cells".to_string());
                }
            }
            KeyAction::SetSpeed(level) => {
                if let Some(speed) = PlaybackSpeed::from_level(level) {
                    self.speed = speed;
                    return Some(speed);
                }
            }
            KeyAction::Save => self.save(),
            KeyAction::None => {}
        }

        None
    }

    fn save(&mut self) {
        let Some(path) = &self.save_path else {
            self.status = Some("No save path configured".to_string());
            return;
        };

        self.status = Some(match save_model(&self.training, path) {
            Ok(()) => format!("Model saved to {:?}", path),
            Err(err) => {
                error!(error = %format!("{:#}", err), "failed to save model");
                format!("Save failed: {:#}", err)
            }
        });
    }

    /// Render the current frame
    fn render_frame(&self, frame: &mut ratatui::Frame) {
        let training = self.handle.is_active();
        let rewards: Vec<f32> = self.training.reward_history().collect();

        let view = Dashboard {
            grid: self.training.grid(),
            target: self.training.target(),
            cursor: (!training).then_some(self.cursor),
            pattern: &self.training.environment().config().target_pattern,
            episode: self.training.episode(),
            step: self.training.episode_steps(),
            episode_reward: self.training.episode_reward(),
            similarity: self.training.similarity(),
            epsilon: self.training.epsilon(),
            training,
            auto_evolve: self.training.auto_evolve(),
            speed: self.speed.as_str(),
            rewards: &rewards,
            stats: self.training.stats(),
            metrics: &self.metrics,
            status: self.status.as_deref(),
        };

        self.renderer.render(frame, &view);
    }

    /// Cleanup terminal state
    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

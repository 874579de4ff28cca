use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Sparkline},
};

use crate::life::Grid;
use crate::metrics::{SessionMetrics, TrainingStats};

/// Read-only snapshot of a training session for one frame
pub struct Dashboard<'a> {
    pub grid: &'a Grid,
    pub target: &'a Grid,
    /// Editing cursor, shown only while training is stopped
    pub cursor: Option<(usize, usize)>,
    pub pattern: &'a str,
    pub episode: usize,
    pub step: usize,
    pub episode_reward: f32,
    pub similarity: f32,
    pub epsilon: f32,
    pub training: bool,
    pub auto_evolve: bool,
    pub speed: &'a str,
    pub rewards: &'a [f32],
    pub stats: &'a TrainingStats,
    pub metrics: &'a SessionMetrics,
    pub status: Option<&'a str>,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, view: &Dashboard) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Grids
                Constraint::Length(6), // Reward history
                Constraint::Length(2), // Status + controls
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(view), chunks[0]);

        let grids = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let current = self.render_grid(view.grid, Some(view.target), view.cursor, " Current ");
        frame.render_widget(current, grids[0]);

        let title = format!(" Target: {} ", view.pattern);
        let target = self.render_grid(view.target, None, None, &title);
        frame.render_widget(target, grids[1]);

        let data = sparkline_data(view.rewards);
        let history = Sparkline::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Episode reward "),
            )
            .style(Style::default().fg(Color::Cyan))
            .data(&data);
        frame.render_widget(history, chunks[2]);

        frame.render_widget(self.render_footer(view), chunks[3]);
    }

    /// Cells matching `reference` are green, extra live cells red, missing ones yellow
    fn render_grid<'a>(
        &self,
        grid: &Grid,
        reference: Option<&Grid>,
        cursor: Option<(usize, usize)>,
        title: &'a str,
    ) -> Paragraph<'a> {
        let size = grid.size();
        let mut lines = Vec::with_capacity(size);

        for row in 0..size {
            let mut spans = Vec::with_capacity(size);

            for col in 0..size {
                let alive = grid.get(row, col);
                let wanted = reference.map_or(alive, |r| r.get(row, col));

                let (symbol, color) = match (alive, wanted) {
                    (true, true) => ("■ ", Color::Green),
                    (true, false) => ("■ ", Color::Red),
                    (false, true) => ("□ ", Color::Yellow),
                    (false, false) => (". ", Color::DarkGray),
                };

                let mut style = Style::default().fg(color);
                if cursor == Some((row, col)) {
                    style = style.bg(Color::Blue).add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(symbol, style));
            }

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats<'a>(&self, view: &Dashboard<'a>) -> Paragraph<'a> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let (state, state_color) = if view.training {
            ("TRAINING", Color::Green)
        } else {
            ("STOPPED", Color::Red)
        };

        let first = Line::from(vec![
            Span::styled(
                state,
                Style::default()
                    .fg(state_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Episode: ", label),
            Span::styled(view.episode.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Step: ", label),
            Span::styled(view.step.to_string(), value),
            Span::raw("    "),
            Span::styled("Similarity: ", label),
            Span::styled(format!("{:.1}%", view.similarity * 100.0), value),
            Span::raw("    "),
            Span::styled("Reward: ", label),
            Span::styled(format!("{:.2}", view.episode_reward), value),
        ]);

        let best = view
            .metrics
            .best_reward
            .map_or_else(|| "-".to_string(), |r| format!("{:.2}", r));

        let second = Line::from(vec![
            Span::styled("Epsilon: ", label),
            Span::styled(format!("{:.3}", view.epsilon), value),
            Span::raw("    "),
            Span::styled("Loss: ", label),
            Span::styled(format!("{:.4}", view.stats.mean_loss()), value),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(best, value),
            Span::raw("    "),
            Span::styled("Solved: ", label),
            Span::styled(view.metrics.solved_episodes.to_string(), value),
            Span::raw("    "),
            Span::styled("Evolve: ", label),
            Span::styled(if view.auto_evolve { "on" } else { "off" }, value),
            Span::raw("    "),
            Span::styled("Speed: ", label),
            Span::styled(view.speed, value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(view.metrics.format_time(), value),
        ]);

        Paragraph::new(vec![first, second]).alignment(Alignment::Center)
    }

    fn render_footer<'a>(&self, view: &Dashboard<'a>) -> Paragraph<'a> {
        let status = Line::from(Span::styled(
            view.status.unwrap_or(""),
            Style::default().fg(Color::Magenta),
        ));

        let controls = Line::from(vec![
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" start/stop | "),
            Span::styled("R", Style::default().fg(Color::Cyan)),
            Span::raw(" reset | "),
            Span::styled("E", Style::default().fg(Color::Cyan)),
            Span::raw(" evolve | "),
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" + "),
            Span::styled("T", Style::default().fg(Color::Cyan)),
            Span::raw(" edit | "),
            Span::styled("1-4", Style::default().fg(Color::Cyan)),
            Span::raw(" speed | "),
            Span::styled("S", Style::default().fg(Color::Cyan)),
            Span::raw(" save | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ]);

        Paragraph::new(vec![status, controls]).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Shift rewards to non-negative bar heights; the lowest reward gets height 1
pub fn sparkline_data(rewards: &[f32]) -> Vec<u64> {
    let min = rewards.iter().copied().fold(f32::INFINITY, f32::min);
    rewards
        .iter()
        .map(|r| ((r - min) * 100.0).round() as u64 + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn test_sparkline_data_shifts_negative_rewards() {
        assert_eq!(sparkline_data(&[-1.0, 0.0, 0.5]), vec![1, 101, 151]);
        assert_eq!(sparkline_data(&[2.0, 2.0]), vec![1, 1]);
        assert!(sparkline_data(&[]).is_empty());
    }

    #[test]
    fn test_render_dashboard() {
        let grid = Grid::from_rows(&[".....", ".##..", ".#...", ".....", "....."]);
        let target = Grid::from_rows(&[".....", ".##..", ".##..", ".....", "....."]);
        let stats = TrainingStats::new(10);
        let metrics = SessionMetrics::new();
        let rewards = [0.5, -0.2, 1.0];

        let view = Dashboard {
            grid: &grid,
            target: &target,
            cursor: Some((0, 0)),
            pattern: "block",
            episode: 7,
            step: 3,
            episode_reward: 0.25,
            similarity: grid.similarity(&target),
            epsilon: 0.9,
            training: false,
            auto_evolve: true,
            speed: "Normal",
            rewards: &rewards,
            stats: &stats,
            metrics: &metrics,
            status: Some("ready"),
        };

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|frame| Renderer::new().render(frame, &view))
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();

        assert!(text.contains("STOPPED"));
        assert!(text.contains("Episode: 7"));
        assert!(text.contains("Target: block"));
        assert!(text.contains("Similarity: 96.0%"));
        assert!(text.contains("ready"));
    }
}

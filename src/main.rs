use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use life_shaper::life::Boundary;
use life_shaper::modes::{SessionConfig, TrainConfig, TrainMode, WatchMode, build_session};
use life_shaper::rl::{TrainingBackend, default_device};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "life_shaper")]
#[command(version, about = "Deep Q-learning agent that shapes Game of Life grids")]
struct Cli {
    /// Execution mode
    #[arg(long, default_value = "watch")]
    mode: Mode,

    /// JSON file with "life" and "dqn" sections; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length
    #[arg(long)]
    grid_size: Option<usize>,

    /// Target pattern (block, blinker, glider, toad, beacon)
    #[arg(long)]
    pattern: Option<String>,

    /// Episodes to train (train mode)
    #[arg(long, default_value = "1000")]
    episodes: usize,

    /// Step limit per episode
    #[arg(long)]
    max_steps: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Run one Life generation after every action
    #[arg(long)]
    auto_evolve: bool,

    /// Wrap neighbour counts around the grid edges
    #[arg(long)]
    toroidal: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Where to save the model (train mode default: models/life_shaper)
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Continue from a saved model
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Write log events to this file (watch mode)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train headless, printing progress and saving checkpoints
    Train,
    /// Watch and steer training in the terminal
    Watch,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    fn session_config(&self) -> Result<SessionConfig> {
        let mut session = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)?,
            None => SessionConfig::default(),
        };

        if let Some(grid_size) = self.grid_size {
            session.life.grid_size = grid_size;
        }
        if let Some(pattern) = &self.pattern {
            session.life.target_pattern = pattern.clone();
        }
        if self.auto_evolve {
            session.life.auto_evolve = true;
        }
        if self.toroidal {
            session.life.boundary = Boundary::Toroidal;
        }
        if let Some(max_steps) = self.max_steps {
            session.dqn.max_steps = max_steps;
        }
        if let Some(learning_rate) = self.learning_rate {
            session.dqn.learning_rate = learning_rate;
        }
        if self.seed.is_some() {
            session.dqn.seed = self.seed;
        }

        session
            .life
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid environment configuration: {}", e))?;
        session
            .dqn
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid DQN configuration: {}", e))?;

        Ok(session)
    }
}

/// Log to stderr in train mode; the TUI owns the terminal, so watch mode only
/// logs when given a file
fn init_tracing(mode: &Mode, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match (mode, log_file) {
        (_, Some(path)) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (Mode::Train, None) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        (Mode::Watch, None) => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.mode, cli.log_file.as_ref())?;

    let session = cli.session_config()?;
    let device = default_device();

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Train => {
            let save_path = cli
                .save_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("models/life_shaper"));

            let mut config = TrainConfig::new(cli.episodes, save_path);
            config.life_config = session.life;
            config.dqn_config = session.dqn;
            config.resume = cli.resume.clone();

            let mut train_mode = TrainMode::<TrainingBackend>::new(config, device)?;
            train_mode.stop_on_ctrl_c();
            train_mode.run()?;
        }
        Mode::Watch => {
            let training = build_session::<TrainingBackend>(
                session.life,
                session.dqn,
                cli.resume.as_deref(),
                device,
            )?;
            let mut watch_mode = WatchMode::new(training, cli.save_path.clone());
            watch_mode.run().await?;
        }
    }

    Ok(())
}

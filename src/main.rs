//! Arcade Center entry point
//!
//! Command line front end over the game center. Games run headless with the
//! built-in autopilot and their results are recorded like any other session.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use arcade_center::center::GameStats;
use arcade_center::{GameCenter, GameKind, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about = "Game center with four arcade mini-games", long_about = None)]
struct Cli {
    /// Data directory holding accounts and the session log
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Settings JSON file
    #[arg(long, global = true, default_value = "settings.json")]
    settings: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account
    Register { username: String },
    /// Check an account exists and show its stats
    Login { username: String },
    /// Play a game with the autopilot and record the score
    Play {
        /// snake, balls, letters or digits
        game: String,
        #[arg(long)]
        user: String,
        /// Seed for the game's RNG; defaults to the current time
        #[arg(long)]
        seed: Option<u64>,
        /// Simulated time limit
        #[arg(long, default_value_t = 120)]
        seconds: u64,
    },
    /// Show the rating leaderboard
    Leaderboard,
    /// Show finished sessions, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List the available games
    Games,
}

fn print_stats(stats: impl IntoIterator<Item = (GameKind, GameStats)>) {
    for (kind, stats) in stats {
        println!(
            "  {:<8} high {:>5}  last {:>5}",
            kind.display_name(),
            stats.high_score,
            stats.last_score
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.settings);
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    let mut center = GameCenter::open(settings.clone())
        .with_context(|| format!("opening game center at {}", settings.data_dir.display()))?;

    match cli.command {
        Commands::Register { username } => {
            center
                .register(&username)
                .with_context(|| format!("registering '{username}'"))?;
            println!("Welcome, {}!", username.trim());
        }
        Commands::Login { username } => {
            center
                .login(&username)
                .with_context(|| format!("logging in as '{username}'"))?;
            let account = center.account()?;
            println!("Logged in as {}", account.username);
            print_stats(GameKind::ALL.into_iter().map(|k| (k, account.stats(k))));
        }
        Commands::Play {
            game,
            user,
            seed,
            seconds,
        } => {
            center
                .login(&user)
                .with_context(|| format!("logging in as '{user}'"))?;
            let seed = seed.unwrap_or_else(|| chrono::Local::now().timestamp_millis() as u64);
            log::info!("Playing {} with seed {}", game, seed);

            let run = center
                .play_headless(&game, seed, Duration::from_secs(seconds))
                .with_context(|| format!("playing '{game}'"))?;
            let outcome = if run.finished { "game over" } else { "time limit" };
            match run.score {
                Some(score) => println!(
                    "{} ended ({}) after {:.1}s with score {}",
                    run.kind.display_name(),
                    outcome,
                    run.game_time.as_secs_f32(),
                    score
                ),
                None => println!("{} never started", run.kind.display_name()),
            }
            let account = center.account()?;
            print_stats([(run.kind, account.stats(run.kind))]);
        }
        Commands::Leaderboard => {
            let board = center.leaderboard();
            if board.is_empty() {
                println!("No players yet");
            }
            for (i, standing) in board.standings.iter().enumerate() {
                let scores: Vec<String> = GameKind::ALL
                    .into_iter()
                    .map(|k| format!("{} {}", k.id(), standing.high_score(k)))
                    .collect();
                println!(
                    "{:>2}. {:<16} {:>5.2}  {}",
                    i + 1,
                    standing.username,
                    standing.rating,
                    scores.join(", ")
                );
            }
        }
        Commands::History { limit } => {
            let history = center.history();
            if history.is_empty() {
                println!("No sessions recorded");
            }
            for entry in history.into_iter().take(limit) {
                println!("{entry}");
            }
        }
        Commands::Games => {
            for kind in GameKind::ALL {
                println!("{:<8} {}", kind.id(), kind.description());
            }
        }
    }

    Ok(())
}

use anyhow::Result;
use base64::Engine;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use melomood::classifier::{EmotionClassifier, MoodInput};
use melomood::config;
use melomood::feedback::{FeedbackStore, SqliteDurableStore};
use melomood::inference::{InferenceProvider, OllamaProvider};
use melomood::model::{FeedbackKind, Platform, Weather, WeatherSource};
use melomood::recommend::RecommendationEngine;
use melomood::session::{SessionController, SessionState};
use melomood::weather::OpenMeteoProvider;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Path to the feedback database file. Can also be specified in config file.
    #[clap(long)]
    pub db_path: Option<PathBuf>,

    /// Base URL of the Ollama server.
    #[clap(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model to use for classification and recommendation.
    #[clap(long, default_value = "llama3.1:8b")]
    pub ollama_model: String,

    /// Latitude for the weather lookup.
    #[clap(long, default_value_t = 52.52, allow_hyphen_values = true)]
    pub latitude: f64,

    /// Longitude for the weather lookup.
    #[clap(long, default_value_t = 13.40, allow_hyphen_values = true)]
    pub longitude: f64,

    /// Streaming platform playlists are generated for.
    #[clap(long, default_value = "spotify")]
    pub platform: Platform,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            ollama_url: args.ollama_url.clone(),
            ollama_model: args.ollama_model.clone(),
            latitude: args.latitude,
            longitude: args.longitude,
            platform: args.platform,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  ollama: {} ({})", app_config.ollama_url, app_config.ollama_model);
    info!("  platform: {}", app_config.platform);

    let store = Arc::new(SqliteDurableStore::new(&app_config.db_path)?);
    let feedback = FeedbackStore::load(store);

    let provider = Arc::new(OllamaProvider::new(
        app_config.ollama_url.clone(),
        app_config.ollama_model.clone(),
    ));
    if let Err(e) = provider.health_check().await {
        warn!(error = %e, "Inference provider health check failed, submissions may error");
    }

    let classifier = EmotionClassifier::new(provider.clone() as Arc<dyn InferenceProvider>);
    let engine = RecommendationEngine::new(provider as Arc<dyn InferenceProvider>);
    let weather_provider = Arc::new(OpenMeteoProvider::new(
        app_config.latitude,
        app_config.longitude,
    ));

    let mut controller = SessionController::new(
        classifier,
        engine,
        feedback,
        weather_provider,
        app_config.platform,
    );
    controller.refresh_weather().await;

    println!("MeloMood ready. Type 'help' for commands.");
    print_status(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut time_of_day_ticker = tokio::time::interval(Duration::from_secs(60 * 60));
    // Skip the first immediate tick, wait for the first interval
    time_of_day_ticker.tick().await;

    loop {
        tokio::select! {
            _ = time_of_day_ticker.tick() => {
                controller.refresh_time_of_day();
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&mut controller, line.trim()).await {
                    break;
                }
            }
        }
    }

    controller.flush_feedback()?;
    info!("Feedback history flushed, bye");
    Ok(())
}

/// Dispatch one line-oriented command. Returns false to quit.
async fn handle_command(controller: &mut SessionController, line: &str) -> bool {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" => print_help(),
        "quit" | "exit" => return false,
        "text" if !rest.is_empty() => {
            controller.submit(MoodInput::Text(rest.to_string())).await;
            print_state(controller);
        }
        "voice" if !rest.is_empty() => {
            controller.submit(MoodInput::Voice(rest.to_string())).await;
            print_state(controller);
        }
        "camera" if !rest.is_empty() => match tokio::fs::read(rest).await {
            Ok(bytes) => {
                let image_base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
                controller.submit(MoodInput::Camera { image_base64 }).await;
                print_state(controller);
            }
            Err(e) => println!("Could not read image {}: {}", rest, e),
        },
        "like" | "dislike" => {
            let kind = if command == "like" {
                FeedbackKind::Like
            } else {
                FeedbackKind::Dislike
            };
            match playlist_entry(controller, rest).cloned() {
                Some(song) => {
                    controller.give_feedback(song, kind);
                    println!(
                        "Noted. {} liked, {} disliked.",
                        controller.feedback_history().liked.len(),
                        controller.feedback_history().disliked.len()
                    );
                }
                None => println!("No such playlist entry: {}", rest),
            }
        }
        "platform" => match rest.parse::<Platform>() {
            Ok(platform) => {
                controller.set_platform(platform);
                println!("Platform set to {}", platform);
            }
            Err(e) => println!("{}", e),
        },
        "weather" if rest == "auto" => {
            controller.refresh_weather().await;
            print_status(controller);
        }
        "weather" => match rest.parse::<Weather>() {
            Ok(weather) => {
                controller.set_weather_manual(weather);
                println!("Weather set to {}", weather);
            }
            Err(e) => println!("{}", e),
        },
        "search" => {
            controller.set_search_query(rest);
            print_state(controller);
        }
        "reset" => {
            controller.reset();
            println!("Back to input.");
        }
        "clear" => {
            controller.clear_feedback();
            println!("Feedback history cleared.");
        }
        "history" => print_history(controller),
        "status" => print_status(controller),
        other => println!("Unknown command: {} (try 'help')", other),
    }
    true
}

fn playlist_entry<'a>(
    controller: &'a SessionController,
    index: &str,
) -> Option<&'a melomood::model::Song> {
    let index: usize = index.parse().ok()?;
    match controller.state() {
        SessionState::Result { playlist, .. } => playlist.get(index.checked_sub(1)?),
        _ => None,
    }
}

fn print_state(controller: &SessionController) {
    match controller.state() {
        SessionState::Input { error: Some(message) } => println!("{}", message),
        SessionState::Input { error: None } => println!("Waiting for mood input."),
        SessionState::Analyzing => println!("Analyzing your mood..."),
        SessionState::Result {
            emotion,
            playlist,
            search_query,
        } => {
            println!("Detected emotion: {}", emotion);
            let shown: Vec<_> = playlist
                .iter()
                .enumerate()
                .filter(|(_, s)| {
                    search_query.is_empty()
                        || s.title.to_lowercase().contains(&search_query.to_lowercase())
                        || s.artist.to_lowercase().contains(&search_query.to_lowercase())
                })
                .collect();
            for (i, song) in &shown {
                let marker = if controller.feedback_history().is_liked(song) {
                    " [liked]"
                } else if controller.feedback_history().is_disliked(song) {
                    " [disliked]"
                } else {
                    ""
                };
                if song.album.is_empty() {
                    println!("  {}. {} - {}{}", i + 1, song.title, song.artist, marker);
                } else {
                    println!(
                        "  {}. {} - {} ({}){}",
                        i + 1,
                        song.title,
                        song.artist,
                        song.album,
                        marker
                    );
                }
            }
            if shown.is_empty() && !search_query.is_empty() {
                println!("  (no songs match '{}')", search_query);
            }
        }
    }
}

fn print_status(controller: &SessionController) {
    let source = match controller.weather_source() {
        WeatherSource::Auto => "auto",
        WeatherSource::Manual => "manual",
    };
    println!(
        "Platform: {} | Weather: {} ({}) | Time of day: {}",
        controller.platform(),
        controller.weather(),
        source,
        controller.time_of_day()
    );
    if let Some(notice) = controller.weather_notice() {
        println!("Weather lookup unavailable: {} (pick one with 'weather <condition>')", notice);
    }
}

fn print_history(controller: &SessionController) {
    let history = controller.feedback_history();
    println!("Liked:");
    for song in &history.liked {
        println!("  {} - {}", song.title, song.artist);
    }
    println!("Disliked:");
    for song in &history.disliked {
        println!("  {} - {}", song.title, song.artist);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  text <how you feel>     analyze free text");
    println!("  voice <tone description> analyze a description of your voice");
    println!("  camera <image path>     analyze a photo of your face");
    println!("  like <n> / dislike <n>  give feedback on playlist entry n");
    println!("  platform <name>         spotify | youtube-music | apple-music");
    println!("  weather <condition>     sunny | cloudy | rainy | snowy, or 'auto'");
    println!("  search <query>          filter the current playlist");
    println!("  history                 show liked/disliked songs");
    println!("  status                  show context signals");
    println!("  reset / clear / quit");
}

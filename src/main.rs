// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tennis Match command-line client
//!
//! Drives the session and match search client against a running backend.
//! The session token persists between invocations in the configured
//! credential store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tennis_match_client::{
    models::{Coordinates, Credentials, FindResponse, Handedness, MatchFormat, Profile},
    services::{SearchInput, SearchOutcome, SessionStatus},
    time_utils, AppError, Config, TennisClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tennis partner matching client
#[derive(Parser)]
#[command(name = "tennis-match")]
#[command(about = "Find tennis partners and courts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with an identity-provider ID token
    LoginGoogle {
        #[arg(long)]
        id_token: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the session state
    Status,
    /// Show or edit the matching profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Search for partners and court suggestions
    Find {
        /// Search radius in km (empty for the default)
        #[arg(long, default_value = "")]
        radius: String,
        #[arg(long, default_value = "SINGLES")]
        format: MatchFormat,
        /// Window start (RFC3339); defaults to now
        #[arg(long)]
        window_start: Option<String>,
        /// Search center latitude; defaults to the device position
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    Show,
    /// Update fields and save the complete profile
    Set {
        #[arg(long)]
        handedness: Option<Handedness>,
        #[arg(long)]
        level: Option<f64>,
        /// Comma-separated formats, e.g. SINGLES,DOUBLES
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<MatchFormat>>,
        #[arg(long)]
        radius: Option<u32>,
        #[arg(long, requires = "home_lng", allow_hyphen_values = true)]
        home_lat: Option<f64>,
        #[arg(long, requires = "home_lat", allow_hyphen_values = true)]
        home_lng: Option<f64>,
        #[arg(long, conflicts_with_all = ["home_lat", "home_lng"])]
        clear_home: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app) => eprintln!("{}", app.notice()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let client = TennisClient::from_config(config)?;
    client.start().await;

    match cli.command {
        Commands::Register { email, password } => {
            client.register(&Credentials::new(email, password)).await?;
            println!("Registered and signed in.");
        }
        Commands::Login { email, password } => {
            client.login(&Credentials::new(email, password)).await?;
            println!("Signed in.");
        }
        Commands::LoginGoogle { id_token } => {
            if client.google_client_id().is_none() {
                tracing::warn!("No identity-provider client id configured");
            }
            client.login_with_identity_token(&id_token).await?;
            println!("Signed in.");
        }
        Commands::Logout => {
            client.sign_out().await?;
            println!("Signed out.");
        }
        Commands::Status => match client.status() {
            SessionStatus::Authenticated(_) => println!("Signed in ({})", client.config().api_base),
            SessionStatus::Anonymous | SessionStatus::Loading => println!("Signed out"),
        },
        Commands::Profile { command } => run_profile(&client, command).await?,
        Commands::Find {
            radius,
            format,
            window_start,
            lat,
            lng,
        } => {
            let search = client.match_search();
            if let (Some(lat), Some(lng)) = (lat, lng) {
                search.set_center(Coordinates::new(lat, lng)?);
            }

            let mut input = SearchInput::new(radius, format);
            if let Some(raw) = window_start {
                let start = time_utils::parse_rfc3339(&raw)
                    .map_err(|e| AppError::Validation(format!("window start {raw:?}: {e}")))?;
                input = input.starting_at(start);
            }

            match search.search(input).await? {
                SearchOutcome::Applied(response) => print_results(&response),
                SearchOutcome::Discarded => println!("Search result discarded."),
            }
        }
    }
    Ok(())
}

async fn run_profile(client: &TennisClient, command: ProfileCommands) -> anyhow::Result<()> {
    match command {
        ProfileCommands::Show => match client.profile().await {
            Ok(profile) => print_profile(&profile),
            Err(AppError::NotFound(_)) => println!("No profile yet. Create one with `profile set`."),
            Err(e) => return Err(e.into()),
        },
        ProfileCommands::Set {
            handedness,
            level,
            formats,
            radius,
            home_lat,
            home_lng,
            clear_home,
        } => {
            // Full replace: start from the saved profile and overlay flags.
            let mut profile = match client.profile().await {
                Ok(profile) => profile,
                Err(AppError::NotFound(_)) => {
                    Profile::new(Handedness::Right, 0.0, [MatchFormat::Singles], 10)
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(handedness) = handedness {
                profile.handedness = handedness;
            }
            if let Some(level) = level {
                profile.level_est = level;
            }
            if let Some(formats) = formats {
                profile.preferred_formats = formats.into_iter().collect();
            }
            if let Some(radius) = radius {
                profile.radius_km = radius;
            }
            if let (Some(lat), Some(lng)) = (home_lat, home_lng) {
                profile.set_home(Some(Coordinates::new(lat, lng)?));
            }
            if clear_home {
                profile.set_home(None);
            }

            let saved = client.save_profile(&profile).await?;
            print_profile(&saved);
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    let formats: Vec<String> = profile
        .preferred_formats
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Handedness: {:?}", profile.handedness);
    println!("Level:      {:.1}", profile.level_est);
    println!("Elo:        {}", profile.elo);
    println!("Formats:    {}", formats.join(", "));
    println!("Radius:     {} km", profile.radius_km);
    match profile.home() {
        Some(home) => println!("Home:       {home}"),
        None => println!("Home:       not set"),
    }
}

fn print_results(response: &FindResponse) {
    if response.is_empty() {
        println!("No matches found.");
        return;
    }

    println!("Candidates:");
    for candidate in &response.candidates {
        println!(
            "  user {:>6}  elo {:>5}  {:>6.1} km  score {:.2}",
            candidate.user_id,
            candidate.elo,
            candidate.kilometers(),
            candidate.score
        );
    }

    println!("Suggestions:");
    for suggestion in &response.suggestions {
        println!(
            "  court {:>4}  {} - {}  {}",
            suggestion.court_id,
            time_utils::format_utc_rfc3339(suggestion.start_at),
            time_utils::format_utc_rfc3339(suggestion.end_at),
            suggestion.message
        );
    }
}

/// Initialize logging: human-readable to stderr, or JSON when
/// `TENNIS_LOG_FORMAT=json`.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,tennis_match_client=info"));

    let json = std::env::var("TENNIS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal-Tracker console
//!
//! Runs an interactive meal-logging session over stdin/stdout, with meals
//! stored under the configured data directory.

use meal_tracker::{
    config::Config,
    console::{Command, Session, HELP},
    App,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        base_url = %config.off_base_url,
        "Starting Meal-Tracker"
    );

    let app = App::init(config).await?;
    let mut session = Session::new(&app);

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("error: {}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match session.execute(command).await {
            Ok(output) => println!("{}", output),
            Err(e) => println!("error: {}", e),
        }
    }

    tracing::info!("Session ended");
    Ok(())
}

/// Initialize logging on stderr. `LOG_FORMAT=json` switches to JSON lines.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("meal_tracker=debug,info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

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
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use panel_db::config::{self, Config};
use panel_db::QueryOutcome;

/// Connects to every configured database and runs a trivial query.
fn probe(config: &Config) -> bool {
    let mut all_ok = true;
    for (label, profile) in config.profiles() {
        let status = config.open(profile).map_err(|e| e.to_string()).and_then(|mut db| {
            match db.execute("SELECT 1") {
                QueryOutcome::Rows(_) => Ok(()),
                _ => Err(db.last_error().to_string()),
            }
        });

        match status {
            Ok(()) => println!("{}: ok", label),
            Err(e) => {
                error!(database = %label, error = %e, "Probe failed");
                println!("{}: failed ({})", label, e);
                all_ok = false;
            }
        }
    }
    all_ok
}

fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    info!("Starting panel-db...");

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => match Config::default_path() {
            Some(path) => path,
            None => {
                eprintln!("No configuration file given and no default config directory available.");
                return ExitCode::from(2);
            }
        },
    };

    let config = match config::load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration {}: {}", path.display(), e);
            return ExitCode::from(2);
        }
    };

    if probe(&config) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

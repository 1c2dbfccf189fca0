//! Network Speed Tester - Main CLI Application
//!
//! Measures calibrated ping, download and upload speed against a
//! cooperating HTTP payload server.

use clap::Parser;
use network_speed_tester::{
    app::App,
    cli::Cli,
    config::EnvManager,
    error::{AppError, ErrorReporter},
};
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = Cli::parse();

    if cli.env_help {
        println!("{}", EnvManager::display_env_help());
        print_env_file_check(Path::new(".env"));
        return;
    }

    if let Some(path) = &cli.generate_env {
        if let Err(e) = EnvManager::save_example_env_file(path) {
            ErrorReporter::new(false, cli.verbose).report_error(&e);
            process::exit(e.exit_code());
        }
        println!("Wrote example configuration to {}", path.display());
        return;
    }

    let use_color = cli.use_colors();
    if !use_color {
        colored::control::set_override(false);
    }
    let reporter = ErrorReporter::new(use_color, cli.verbose);

    if let Err(message) = cli.validate() {
        let error = AppError::validation(message);
        reporter.report_error(&error);
        process::exit(error.exit_code());
    }

    let result = match App::new(cli) {
        Ok(app) => app.run().await.map(|_| ()),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Report problems in an existing .env file
fn print_env_file_check(path: &Path) {
    match EnvManager::check_env_file(path) {
        Ok(None) => {}
        Ok(Some(problems)) if problems.is_empty() => {
            println!("\n{}: all values are valid", path.display());
        }
        Ok(Some(problems)) => {
            println!("\n{}: {} invalid value(s)", path.display(), problems.len());
            for problem in problems {
                println!("  {}", problem);
            }
        }
        Err(e) => eprintln!("{}", e),
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (see --env-help)");
            eprintln!("  - The server URL must start with http:// or https://");
            eprintln!("  - Payload sizes and calibration factors must be positive numbers");
        }
        AppError::Network(_) | AppError::HttpRequest(_) | AppError::HttpStatus(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check that the speed test server is running");
            eprintln!("  - Verify the --url value and endpoint paths");
            eprintln!("  - Verify firewall settings");
        }
        AppError::TestExecution(_) | AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Execution troubleshooting:");
            eprintln!("  - Increase the phase timeout with --timeout");
            eprintln!("  - Reduce payload sizes with --download-size and --upload-size");
            eprintln!("  - Run with --verbose to see per-phase errors");
        }
        _ => {}
    }
}

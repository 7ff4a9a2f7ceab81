//! `candytron-cli` – Candytron Command Line Interface
//!
//! This binary is the entry point for the candy-sorting demonstration.  It:
//!
//! 1. Loads `~/.candytron/config.toml` (defaults when absent).
//! 2. Boots the coordination core: pose store, detector, arm sequencer.
//! 3. Homes the arm and calibrates the table grid from the camera.
//! 4. Drops the user into an **interactive REPL** with slash-commands
//!    (`/calibrate`, `/scene`, `/move`, `/demo`, `/home`, `/poses`, `/help`).
//! 5. Intercepts **Ctrl-C** to drain the motion worker and exit safely.

mod config;
mod repl;
mod service;

use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use candytron_hal::sim::{SimArm, SimDetector};
use candytron_motion::MotionSequencer;
use candytron_poses::PoseStore;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set CANDYTRON_LOG_FORMAT=json to emit newline-delimited JSON logs
    // suitable for log aggregators.  The CLI's user-facing output still uses
    // println! for UX consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("CANDYTRON_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – finishing the current arm motion …"
                .yellow()
                .bold()
        );
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            println!(
                "  No config at {} – using defaults.",
                config::config_path().display().to_string().dimmed()
            );
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Boot sequence ─────────────────────────────────────────────────────
    println!();
    println!("{}", "═══════════════════════════════════════".bold());
    println!("{}", "        Candytron Boot Sequence        ".bold().cyan());
    println!("{}", "═══════════════════════════════════════".bold());

    // Step 1 – Pose store
    print!("  [1/4] {} … ", "Opening pose store".bold());
    std::io::stdout().flush().ok();
    let poses = match PoseStore::open(&cfg.base_pose_file, &cfg.local_pose_file) {
        Ok(store) => {
            println!(
                "{} ({} base, {} local)",
                "OK".green(),
                store.base_names().len(),
                store.local_names().len()
            );
            store
        }
        Err(e) => {
            println!("{}: {}", "FAILED".red(), e);
            return;
        }
    };

    // Step 2 – Object detector
    print!("  [2/4] {} … ", "Initializing object detector".bold());
    std::io::stdout().flush().ok();
    if !cfg.offline {
        println!("{}", "no hardware driver linked".yellow());
        println!(
            "  {}",
            "Physical camera drivers live outside this build; using the simulated detector."
                .dimmed()
        );
        print!("        {} … ", "Falling back to simulation".bold());
    }
    let detector = Box::new(SimDetector::exhibition("table_yolo"));
    println!("{}", "OK".green());

    // Step 3 – Arm + motion sequencer
    print!("  [3/4] {} … ", "Starting motion sequencer".bold());
    std::io::stdout().flush().ok();
    let sequencer = MotionSequencer::new(Box::new(SimArm::new("ned2")));
    let mut service = service::CandyService::new(detector, sequencer, poses);
    service.move_home();
    println!("{}", "OK".green());

    // Step 4 – Grid calibration
    print!(
        "  [4/4] {} ({}x{}) … ",
        "Calibrating table grid".bold(),
        cfg.grid_rows,
        cfg.grid_cols
    );
    std::io::stdout().flush().ok();
    if service.calibrate_with_retries(cfg.grid_rows, cfg.grid_cols, cfg.calibration_attempts) {
        println!("{}", "OK".green());
    } else {
        println!("{}", "FAILED".red());
        println!(
            "  {}",
            "Make sure the area is visible, put one candy in each corner, then run /calibrate."
                .yellow()
        );
    }

    println!("{}", "═══════════════════════════════════════".bold());
    println!(
        "  {} Candytron is {}. Type {} for commands.",
        "✓".green().bold(),
        "READY".green().bold(),
        "/help".bold().cyan()
    );
    println!("{}", "═══════════════════════════════════════".bold());
    println!();

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(&mut service, &cfg, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ______                 __      __                  "#.bold().magenta());
    println!("{}", r#"  / ____/___ _____  ____/ /_  __/ /________  ____    "#.bold().magenta());
    println!("{}", r#" / /   / __ `/ __ \/ __  / / / / __/ ___/ __ \/ __ \ "#.bold().magenta());
    println!("{}", r#"/ /___/ /_/ / / / / /_/ / /_/ / /_/ /  / /_/ / / / / "#.bold().magenta());
    println!("{}", r#"\____/\__,_/_/ /_/\__,_/\__, /\__/_/   \____/_/ /_/  "#.bold().magenta());
    println!("{}", r#"                       /____/                        "#.bold().magenta());
    println!();
    println!(
        "  {} {}",
        "Candytron 4000".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Vision-guided candy sorting demonstration");
    println!();
}

//! REPL – Read-Eval-Print Loop for the Candytron interactive shell.
//!
//! Supported slash-commands:
//!   /help               – show this list
//!   /calibrate [r c]    – recalibrate the table grid
//!   /scene              – print the voted occupancy snapshot
//!   /move <src> <dst>   – pick-and-place between two named positions
//!   /demo               – demonstrate a random move
//!   /home               – send the arm to its rest pose
//!   /poses              – list known pose names
//!   /quit | /exit       – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::service::CandyService;

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(service: &mut CandyService, cfg: &Config, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "candytron>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = tokens.split_first() else {
            continue;
        };

        match cmd {
            "/help" => cmd_help(),
            "/calibrate" => cmd_calibrate(service, cfg, args),
            "/scene" => cmd_scene(service),
            "/move" => cmd_move(service, args),
            "/demo" => cmd_demo(service),
            "/home" => {
                service.move_home();
                println!("{}", "Arm returning to home pose.".green());
            }
            "/poses" => cmd_poses(service),
            "/quit" | "/exit" => {
                println!("{}", "Waiting for the arm to finish …".dimmed());
                service.wait_until_idle();
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }

    // Ctrl-C lands here with jobs possibly still in flight.
    service.wait_until_idle();
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Candytron Commands".bold().underline());
    println!("  {}  – recalibrate the table grid",        "/calibrate [rows cols]".bold().cyan());
    println!("  {}                 – show the current occupancy snapshot", "/scene".bold().cyan());
    println!("  {}       – move a candy between positions", "/move <src> <dst>".bold().cyan());
    println!("  {}                  – demonstrate a random move",          "/demo".bold().cyan());
    println!("  {}                  – send the arm to its rest pose",      "/home".bold().cyan());
    println!("  {}                 – list known pose names",               "/poses".bold().cyan());
    println!("  {}            – exit the CLI",                      "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_calibrate(service: &mut CandyService, cfg: &Config, args: &[&str]) {
    let (rows, cols) = match args {
        [] => (cfg.grid_rows, cfg.grid_cols),
        [r, c] => match (r.parse::<u32>(), c.parse::<u32>()) {
            (Ok(rows), Ok(cols)) => (rows, cols),
            _ => {
                println!("{} usage: /calibrate [rows cols]", "Invalid dimensions.".red());
                return;
            }
        },
        _ => {
            println!("{} usage: /calibrate [rows cols]", "Invalid arguments.".red());
            return;
        }
    };

    print!("  Calibrating a {}x{} grid … ", rows, cols);
    io::stdout().flush().ok();
    if service.calibrate(rows, cols) {
        println!("{}", "OK".green());
    } else {
        println!("{}", "FAILED".red());
        println!(
            "  {}",
            "Put one candy in each corner of the area and try again.".dimmed()
        );
    }
}

fn cmd_scene(service: &mut CandyService) {
    if !service.is_calibrated() {
        println!("{} Run {} first.", "Not calibrated.".yellow(), "/calibrate".bold());
        return;
    }
    let scene = service.scene();
    if scene.is_empty() {
        println!("  {}", "No candies observed.".dimmed());
        return;
    }
    println!("{}", "Observed candies".bold().underline());
    for (tag, label) in &scene {
        println!("  {} : {}", tag.to_string().bold(), label);
    }
}

fn cmd_move(service: &CandyService, args: &[&str]) {
    let [src, dst] = args else {
        println!("{} usage: /move <src> <dst>", "Invalid arguments.".red());
        return;
    };
    if service.move_between(src, dst) {
        println!(
            "  {} {} → {}",
            "Move accepted:".green(),
            src.bold(),
            dst.bold()
        );
    } else {
        println!("  {} {} → {}", "Move rejected:".red(), src, dst);
    }
}

fn cmd_demo(service: &mut CandyService) {
    match service.demo_move() {
        Some((src, dst)) => println!(
            "  {} {} → {}",
            "Demonstrating a move:".green(),
            src.to_string().bold(),
            dst.to_string().bold()
        ),
        None => println!(
            "  {}",
            "No demo possible: need at least one occupied and one empty cell.".yellow()
        ),
    }
}

fn cmd_poses(service: &CandyService) {
    let store = service.pose_store();
    println!("{}", "Known poses".bold().underline());
    let base = store.base_names();
    let local = store.local_names();
    if base.is_empty() && local.is_empty() {
        println!("  {}", "none".dimmed());
        return;
    }
    for name in &base {
        println!("  {} {}", name.bold(), "(base)".dimmed());
    }
    for name in &local {
        println!("  {} {}", name.bold(), "(local)".dimmed());
    }
}

// ─────────────────────────────────────────────────────────────────────
// PField — Case Runner
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Solve the field of a case directory and trace its particles.
//!
//! Usage: `pfield-run <case-dir> [--out <dir>]`
//!
//! Outputs (`geometry.txt`, `field.npz`, `particle_track_<id>.txt`) go to
//! `--out`, or to the case directory itself like the GUI expects.

use pfield_core::simulation::Simulation;
use pfield_types::state::SolverWarning;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_help_and_exit() -> ! {
    eprintln!("Usage:\n  pfield-run <case-dir> [--out <dir>]");
    std::process::exit(2)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut case_dir: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => print_help_and_exit(),
            "--out" => {
                i += 1;
                if i >= args.len() {
                    print_help_and_exit();
                }
                out_dir = Some(PathBuf::from(&args[i]));
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown argument: {other}");
                print_help_and_exit();
            }
            other => {
                if case_dir.is_some() {
                    eprintln!("Unexpected extra argument: {other}");
                    print_help_and_exit();
                }
                case_dir = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    let Some(case_dir) = case_dir else {
        print_help_and_exit();
    };
    let out_dir = out_dir.unwrap_or_else(|| case_dir.clone());

    let mut sim = match Simulation::from_dir(&case_dir) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let grid = &sim.field().grid;
    println!(
        "case {}: {}x{}x{} cells, {} electrodes, {} particles, method {:?}",
        case_dir.display(),
        grid.nx,
        grid.ny,
        grid.nz,
        sim.electrodes().len(),
        sim.particles().len(),
        sim.config().method,
    );

    let (summary, trajectories) = match sim.run() {
        Ok(out) => out,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for w in &summary.solve.warnings {
        match w {
            SolverWarning::NonConvergence {
                iterations,
                max_change,
                tolerance,
            } => eprintln!(
                "warning: field not converged after {iterations} iterations \
                 (max change {max_change:.3e} V > tolerance {tolerance:.3e} V)"
            ),
        }
    }
    println!("{summary}");

    match sim.write_outputs(&out_dir, &trajectories) {
        Ok(paths) => {
            println!("wrote {} files to {}", paths.len(), out_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use molt_negotiator::ConcessionCurve;

/// Negotiator - adaptive bilateral bargaining simulator.
#[derive(Parser, Debug, Clone)]
#[command(name = "negotiator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, env = "NEGOTIATOR_JSON_LOGS", global = true)]
    pub json_logs: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run two agents against each other on a scenario file.
    Simulate(SimulateArgs),

    /// Print the target utility of a concession curve per round.
    Curve(CurveArgs),
}

/// Arguments for the simulate command.
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Scenario file (JSON).
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Base seed; party `i` is seeded with `seed + i`.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Concession curve shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum CurveKind {
    /// Slow early, fast late.
    #[default]
    Quadratic,
    /// Fast early, slow late.
    SquareRoot,
}

impl From<CurveKind> for ConcessionCurve {
    fn from(kind: CurveKind) -> Self {
        match kind {
            CurveKind::Quadratic => Self::Quadratic,
            CurveKind::SquareRoot => Self::SquareRoot,
        }
    }
}

/// Arguments for the curve command.
#[derive(Parser, Debug, Clone)]
pub struct CurveArgs {
    /// Number of rounds in the session.
    #[arg(short, long, default_value_t = 10)]
    pub rounds: u32,

    /// Best utility we can achieve.
    #[arg(long, default_value_t = 1.0)]
    pub my_best: f64,

    /// Utility to us of the opponent's best offer.
    #[arg(long, default_value_t = 0.4)]
    pub opponent_best: f64,

    /// Curve shape.
    #[arg(long, value_enum, default_value_t = CurveKind::Quadratic)]
    pub curve: CurveKind,

    /// Floor ratio: the quadratic target never drops below `my_best / ratio`.
    #[arg(long, default_value_t = 1.4)]
    pub boundary_ratio: f64,
}

//! Concession curve inspection.

use std::io::Write;

use molt_negotiator::{ConcessionConfig, ConcessionCurve, ConcessionInput, ConcessionScheduler};
use serde::Serialize;

use crate::cli::CurveArgs;
use crate::error::CliError;
use crate::output::TableDisplay;

/// Target utility at one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Round number.
    pub round: u32,
    /// Lowest utility worth offering at this round.
    pub target: f64,
}

/// Target utility per round of an undiscounted session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveReport {
    /// Curve shape.
    pub curve: ConcessionCurve,
    /// Round budget.
    pub rounds: u32,
    /// Best utility we can achieve.
    pub my_best: f64,
    /// Utility of the opponent's best offer.
    pub opponent_best: f64,
    /// One point per round, deadline included.
    pub points: Vec<CurvePoint>,
}

/// Computes the curve described by `args`.
///
/// # Errors
///
/// Returns [`CliError::Negotiation`] for an invalid boundary ratio, a zero
/// round budget or utilities outside `[0, 1]`.
pub fn compute(args: &CurveArgs) -> Result<CurveReport, CliError> {
    let config = ConcessionConfig::default()
        .with_curve(args.curve.into())
        .with_boundary_ratio(args.boundary_ratio);
    let scheduler = ConcessionScheduler::new(config)?;
    let total = f64::from(args.rounds);

    let points = (0..=args.rounds)
        .map(|round| {
            let input = ConcessionInput::new(f64::from(round), total, args.my_best, args.opponent_best);
            scheduler
                .target_utility(&input)
                .map(|target| CurvePoint { round, target })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CurveReport {
        curve: config.curve,
        rounds: args.rounds,
        my_best: args.my_best,
        opponent_best: args.opponent_best,
        points,
    })
}

impl TableDisplay for CurveReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let curve = match self.curve {
            ConcessionCurve::Quadratic => "quadratic",
            ConcessionCurve::SquareRoot => "square-root",
        };
        writeln!(writer, "Concession Curve ({curve})")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "My best:          {:.4}", self.my_best)?;
        writeln!(writer, "Opponent best:    {:.4}", self.opponent_best)?;
        writeln!(writer)?;
        writeln!(writer, "{:<8} {:>8}", "ROUND", "TARGET")?;
        writeln!(writer, "{}", "─".repeat(17))?;
        for point in &self.points {
            writeln!(writer, "{:<8} {:>8.4}", point.round, point.target)?;
        }
        Ok(())
    }
}

//! # molt-negotiator-cli
//!
//! Command-line front end for the `molt-negotiator` engine.
//!
//! Provides commands for:
//! - Simulating a bilateral session between two configured agents
//! - Printing the target utility of a concession curve per round
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   scenario   ┌────────────────────┐
//! │ negotiator │─────────────►│ NegotiationSession │ x2
//! │  simulate  │◄─────────────│   (alternating)    │
//! └────────────┘    report    └────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod cli;
pub mod curve;
pub mod error;
pub mod output;
pub mod scenario;
pub mod simulate;

pub use cli::{Cli, Commands, CurveArgs, CurveKind, Format, SimulateArgs};
pub use error::CliError;
pub use output::{OutputFormat, TableDisplay};
pub use scenario::Scenario;

//! Simulation engine — the month-by-month state fold.

pub mod simulation;
pub mod state;

pub use simulation::run_simulation;
pub use state::{Bankruptcy, BankruptcyCause, SimulationRun};

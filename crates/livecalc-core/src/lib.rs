pub mod constants;
pub mod csv_io;
pub mod error;
pub mod scenario;
pub mod tables;
pub mod types;

pub use constants::*;
pub use error::CoreError;
pub use scenario::{Scenario, ScenarioSet};
pub use tables::{ExpenseAssumptions, LapseTable, MortalityTable};
pub use types::{Gender, Policy, PolicySet, ProductType, UnderwritingClass};

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod builder;
mod conditions;
mod config;
pub mod dof;
mod element;
mod errors;
mod geometry;
mod report;
mod truss;

pub use builder::{Section, TrussBuilder};
pub use conditions::LoadCase;
pub use config::SolverSettings;
pub use element::BarElement;
pub use errors::{
    AnalysisError, ConfigError, ElementError, LoadCaseError, ReportError, TrussBuildError,
};
pub use geometry::{force, point, Axis, Displacement, Force, Point};
pub use report::{ElementResult, NodeResult, StressUnit, TrussReport};
pub use truss::Truss;

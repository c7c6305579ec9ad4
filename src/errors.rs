//! Error types produced while building, loading or solving trusses.

use petgraph::graph::NodeIndex;
use thiserror::Error;

/// Error returned when a bar element cannot be constructed from its inputs.
///
/// The variants describe which input was rejected so callers can point users at the
/// offending material or geometry value.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ElementError {
    /// Returned when the Young's modulus is zero, negative or not finite.
    #[error("Young's modulus must be positive (received {0})")]
    NonPositiveYoungsModulus(f64),
    /// Returned when the density is negative or not finite.
    #[error("density must be non-negative (received {0})")]
    NegativeDensity(f64),
    /// Returned when the cross-sectional area is zero, negative or not finite.
    #[error("area must be positive (received {0})")]
    NonPositiveArea(f64),
    /// Returned when an end-node coordinate is NaN or infinite.
    #[error("end-node coordinates must be finite")]
    NonFinitePosition,
    /// Returned when both end nodes coincide.
    #[error("element has zero length")]
    ZeroLength,
    /// Returned when the inputs are individually valid but the stiffness overflows or
    /// underflows, such as a length so short that its cube rounds to zero.
    #[error("element stiffness is not finite")]
    NonFiniteStiffness,
}

/// Error returned when assembling a [`Truss`](crate::Truss) from its input arrays.
#[derive(Debug, Error, PartialEq)]
pub enum TrussBuildError {
    /// Returned when a per-element property array does not match the connectivity length.
    #[error("expected {expected} {property} values, received {found}")]
    PropertyCountMismatch {
        /// Name of the property array.
        property: &'static str,
        /// Number of elements in the connectivity array.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
    /// Returned when an element references a node that does not exist.
    #[error("element {element} references node {node} but the truss has {node_count} nodes")]
    NodeOutOfRange {
        /// Index of the offending element.
        element: usize,
        /// Node index that was referenced.
        node: usize,
        /// Number of nodes in the truss.
        node_count: usize,
    },
    /// Returned when a bar element rejects its inputs.
    #[error("element {element} is invalid: {source}")]
    InvalidElement {
        /// Index of the offending element.
        element: usize,
        /// Reason the element was rejected.
        #[source]
        source: ElementError,
    },
    /// Returned when a builder is asked to connect a joint it does not contain.
    #[error("joint {0:?} does not exist in this truss")]
    UnknownJoint(NodeIndex),
}

/// Error returned when a load case cannot be compiled for a truss.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum LoadCaseError {
    /// Returned when a load or restraint names a node outside the load case.
    #[error("node {node} does not exist (load case covers {node_count} nodes)")]
    UnknownNode {
        /// Node index that was referenced.
        node: usize,
        /// Number of nodes covered by the load case.
        node_count: usize,
    },
    /// Returned when a nonzero load sits on a degree of freedom with a prescribed displacement.
    #[error("degree of freedom {0} is prescribed and cannot also carry a load")]
    LoadOnPrescribedDof(usize),
}

/// Error returned when a truss analysis fails.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when the freedom mask or force vector has the wrong length.
    #[error("expected {expected} degree-of-freedom entries, received {found}")]
    DofCountMismatch {
        /// Three entries per node.
        expected: usize,
        /// Length of the offending input.
        found: usize,
    },
    /// Returned when a load or prescribed displacement is NaN or infinite.
    #[error("force vector entry {dof} is not finite (received {value})")]
    NonFiniteForce {
        /// Degree of freedom holding the value.
        dof: usize,
        /// The offending value.
        value: f64,
    },
    /// Returned when the reduced stiffness matrix cannot be factorised reliably.
    #[error(
        "stiffness matrix is singular (pivot ratio {pivot_ratio:e}); check supports and connectivity"
    )]
    SingularStiffness {
        /// Smallest ratio between a free degree of freedom's pivot and the largest
        /// magnitude in its column of the reduced stiffness.
        pivot_ratio: f64,
    },
    /// Returned when the solve produced NaN or infinite displacements or nodal forces.
    #[error("solution contains non-finite displacements or forces")]
    NonFiniteSolution,
    /// Returned when the supplied load case is inconsistent.
    #[error("invalid load case: {0}")]
    InvalidLoadCase(#[from] LoadCaseError),
}

/// Error returned when solver settings cannot be loaded or saved.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when [`SolverSettings`](crate::SolverSettings) cannot be read from or
    /// written to JSON.
    #[error("solver settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Returned when the pivot tolerance lies outside `[0, 1)`.
    #[error("pivot tolerance must lie in [0, 1) (received {0})")]
    InvalidTolerance(f64),
}

/// Error returned by the reporting helpers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    /// Returned when a stress unit name is not recognised.
    #[error("unknown stress unit {0:?}; expected one of: Pa, KPa, MPa, GPa")]
    UnknownStressUnit(String),
}

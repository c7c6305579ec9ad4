//! Incremental, graph-backed construction of a [`Truss`].

use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::errors::TrussBuildError;
use crate::geometry::Point;
use crate::truss::Truss;

/// Material and cross-section of a member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Young's modulus in pascals.
    pub youngs_modulus: f64,
    /// Density in kilograms per cubic metre.
    pub density: f64,
    /// Cross-sectional area in square metres.
    pub area: f64,
}

impl Section {
    /// Create a [`Section`] with explicit properties.
    #[must_use]
    pub const fn new(youngs_modulus: f64, density: f64, area: f64) -> Self {
        Self {
            youngs_modulus,
            density,
            area,
        }
    }
}

/// Collects joints and members one at a time, then assembles a [`Truss`].
///
/// Joints become nodes in insertion order and members become elements in insertion
/// order, so `NodeIndex::index()` and `EdgeIndex::index()` address the built truss.
///
/// # Examples
/// ```
/// use truss3d::{point, Section, TrussBuilder};
///
/// let steel = Section::new(200.0e9, 7_850.0, 0.01);
/// let mut builder = TrussBuilder::new();
/// let a = builder.add_joint(point(0.0, 0.0, 0.0));
/// let b = builder.add_joint(point(1.0, 0.0, 0.0));
/// let ab = builder.add_member(a, b, steel)?;
///
/// let truss = builder.build()?;
/// assert_eq!(truss.element_nodes()[ab.index()], [a.index(), b.index()]);
/// # Ok::<(), truss3d::TrussBuildError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct TrussBuilder {
    /// Joints as nodes, members as edges.
    graph: Graph<Point, Section>,
}

impl TrussBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    /// Return the number of joints added so far.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of members added so far.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a joint at `position`.
    pub fn add_joint(&mut self, position: Point) -> NodeIndex {
        self.graph.add_node(position)
    }

    /// Connect two existing joints with a member.
    ///
    /// # Errors
    ///
    /// Returns [`TrussBuildError::UnknownJoint`] when either joint was not created by
    /// this builder.
    pub fn add_member(
        &mut self,
        start: NodeIndex,
        end: NodeIndex,
        section: Section,
    ) -> Result<EdgeIndex, TrussBuildError> {
        for joint in [start, end] {
            if self.graph.node_weight(joint).is_none() {
                return Err(TrussBuildError::UnknownJoint(joint));
            }
        }
        Ok(self.graph.add_edge(start, end, section))
    }

    /// Position of a joint, if it exists.
    #[must_use]
    pub fn joint_position(&self, joint: NodeIndex) -> Option<Point> {
        self.graph.node_weight(joint).copied()
    }

    /// Assemble the truss.
    ///
    /// # Errors
    ///
    /// Returns [`TrussBuildError::InvalidElement`] when a member's section or geometry is
    /// rejected by [`BarElement::new`](crate::BarElement::new).
    pub fn build(&self) -> Result<Truss, TrussBuildError> {
        let node_positions: Vec<Point> =
            self.graph.raw_nodes().iter().map(|node| node.weight).collect();
        let edges = self.graph.raw_edges();
        let element_nodes: Vec<[usize; 2]> = edges
            .iter()
            .map(|edge| [edge.source().index(), edge.target().index()])
            .collect();
        let youngs_moduli: Vec<f64> = edges.iter().map(|edge| edge.weight.youngs_modulus).collect();
        let densities: Vec<f64> = edges.iter().map(|edge| edge.weight.density).collect();
        let areas: Vec<f64> = edges.iter().map(|edge| edge.weight.area).collect();
        Truss::new(
            &youngs_moduli,
            &densities,
            &areas,
            &node_positions,
            &element_nodes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ElementError;
    use crate::geometry::point;

    const STEEL: Section = Section::new(200.0e9, 7_850.0, 0.01);

    #[test]
    fn builder_matches_array_constructor() {
        let positions = [
            point(0.0, 0.0, 0.0),
            point(2.0, 0.0, 0.0),
            point(1.0, 1.5, 0.0),
            point(1.0, 0.5, 1.0),
        ];
        let connectivity = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];

        let mut builder = TrussBuilder::new();
        let joints: Vec<NodeIndex> = positions.iter().map(|&p| builder.add_joint(p)).collect();
        for [a, b] in connectivity {
            builder
                .add_member(joints[a], joints[b], STEEL)
                .expect("known joints");
        }
        assert_eq!(builder.joint_count(), 4);
        assert_eq!(builder.member_count(), 6);
        assert_eq!(builder.joint_position(joints[2]), Some(positions[2]));

        let built = builder.build().expect("valid truss");
        let direct = Truss::new(
            &[STEEL.youngs_modulus; 6],
            &[STEEL.density; 6],
            &[STEEL.area; 6],
            &positions,
            &connectivity,
        )
        .expect("valid truss");
        assert_eq!(built.element_nodes(), direct.element_nodes());
        assert_eq!(built.stiffness(), direct.stiffness());
        assert_eq!(built.weight(), direct.weight());
    }

    #[test]
    fn foreign_joints_are_rejected() {
        let mut other = TrussBuilder::new();
        other.add_joint(point(0.0, 0.0, 0.0));
        let foreign = other.add_joint(point(1.0, 0.0, 0.0));

        let mut builder = TrussBuilder::new();
        let a = builder.add_joint(point(0.0, 0.0, 0.0));
        let error = builder
            .add_member(a, foreign, STEEL)
            .expect_err("unknown joint rejected");
        assert_eq!(error, TrussBuildError::UnknownJoint(foreign));
    }

    #[test]
    fn invalid_sections_surface_at_build() {
        let mut builder = TrussBuilder::new();
        let a = builder.add_joint(point(0.0, 0.0, 0.0));
        let b = builder.add_joint(point(0.0, 3.0, 0.0));
        builder
            .add_member(a, b, Section::new(200.0e9, 7_850.0, 0.0))
            .expect("known joints");
        let error = builder.build().expect_err("zero area rejected");
        assert_eq!(
            error,
            TrussBuildError::InvalidElement {
                element: 0,
                source: ElementError::NonPositiveArea(0.0),
            }
        );
    }
}

//! Two-node axial bar element.

use nalgebra::{Matrix3, Matrix6, Vector3};

use crate::errors::ElementError;
use crate::geometry::Point;

/// A pin-ended member that carries only axial force.
///
/// Geometry, material and the element stiffness are fixed at construction. The axial
/// force and stress start at zero and change only through
/// [`apply_displacements`](BarElement::apply_displacements) and [`reset`](BarElement::reset).
#[derive(Clone, Debug, PartialEq)]
pub struct BarElement {
    /// Young's modulus in pascals.
    youngs_modulus: f64,
    /// Density in kilograms per cubic metre.
    density: f64,
    /// Cross-sectional area in square metres.
    area: f64,
    /// Start and end node positions.
    positions: [Point; 2],
    /// Vector from the start node to the end node.
    span: Vector3<f64>,
    /// Undeformed length in metres.
    length: f64,
    /// Mass of the member in kilograms.
    weight: f64,
    /// Stiffness in global coordinates, start node DOFs first.
    stiffness: Matrix6<f64>,
    /// Axial force in newtons, tension positive.
    force: f64,
    /// Axial stress in pascals.
    stress: f64,
}

impl BarElement {
    /// Create a bar between `positions[0]` and `positions[1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError`] when the modulus or area is not strictly positive, the
    /// density is negative, a coordinate is not finite, or both ends coincide, and
    /// [`ElementError::NonFiniteStiffness`] when the stiffness overflows or underflows.
    ///
    /// # Examples
    /// ```
    /// use truss3d::{point, BarElement};
    ///
    /// let bar = BarElement::new(200.0e9, 7_850.0, 0.01, [point(0.0, 0.0, 0.0), point(2.0, 0.0, 0.0)])
    ///     .expect("valid bar");
    /// assert_eq!(bar.length(), 2.0);
    /// assert_eq!(bar.force(), 0.0);
    /// ```
    pub fn new(
        youngs_modulus: f64,
        density: f64,
        area: f64,
        positions: [Point; 2],
    ) -> Result<Self, ElementError> {
        if !(youngs_modulus.is_finite() && youngs_modulus > 0.0) {
            return Err(ElementError::NonPositiveYoungsModulus(youngs_modulus));
        }
        if !(density.is_finite() && density >= 0.0) {
            return Err(ElementError::NegativeDensity(density));
        }
        if !(area.is_finite() && area > 0.0) {
            return Err(ElementError::NonPositiveArea(area));
        }
        if !positions.iter().all(|position| position.is_finite()) {
            return Err(ElementError::NonFinitePosition);
        }

        let span = positions[1].to_vector() - positions[0].to_vector();
        let length = span.norm();
        if length == 0.0 {
            return Err(ElementError::ZeroLength);
        }
        let weight = length * area * density;

        // The outer product is not normalised; dividing by length cubed leaves EA/L along the axis.
        let projector: Matrix3<f64> = span * span.transpose();
        let mut stiffness = Matrix6::zeros();
        stiffness.fixed_view_mut::<3, 3>(0, 0).copy_from(&projector);
        stiffness.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-projector));
        stiffness.fixed_view_mut::<3, 3>(3, 0).copy_from(&(-projector));
        stiffness.fixed_view_mut::<3, 3>(3, 3).copy_from(&projector);
        stiffness *= youngs_modulus * area / length.powi(3);
        if stiffness.iter().any(|value| !value.is_finite()) {
            return Err(ElementError::NonFiniteStiffness);
        }

        Ok(Self {
            youngs_modulus,
            density,
            area,
            positions,
            span,
            length,
            weight,
            stiffness,
            force: 0.0,
            stress: 0.0,
        })
    }

    /// Update the axial force and stress from the six end displacements.
    ///
    /// `displacements` holds the start node's X, Y, Z components followed by the end
    /// node's, in the same order used for the stiffness matrix.
    pub fn apply_displacements(&mut self, displacements: &[f64; 6]) {
        let elongation = Vector3::new(
            displacements[3] - displacements[0],
            displacements[4] - displacements[1],
            displacements[5] - displacements[2],
        );
        self.force =
            self.youngs_modulus * self.area / self.length.powi(2) * self.span.dot(&elongation);
        self.stress = self.force / self.area;
    }

    /// Zero the axial force and stress.
    pub fn reset(&mut self) {
        self.force = 0.0;
        self.stress = 0.0;
    }

    /// Young's modulus in pascals.
    #[must_use]
    pub fn youngs_modulus(&self) -> f64 {
        self.youngs_modulus
    }

    /// Density in kilograms per cubic metre.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Cross-sectional area in square metres.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Start and end node positions.
    #[must_use]
    pub fn positions(&self) -> [Point; 2] {
        self.positions
    }

    /// Vector from the start node to the end node.
    #[must_use]
    pub fn span(&self) -> Vector3<f64> {
        self.span
    }

    /// Undeformed length in metres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Mass of the member, `length * area * density`.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Element stiffness in global coordinates.
    #[must_use]
    pub fn stiffness(&self) -> &Matrix6<f64> {
        &self.stiffness
    }

    /// Axial force in newtons; positive in tension.
    #[must_use]
    pub fn force(&self) -> f64 {
        self.force
    }

    /// Axial stress in pascals.
    #[must_use]
    pub fn stress(&self) -> f64 {
        self.stress
    }
}

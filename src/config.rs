//! Solver settings.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Tunables for the linear solve.
///
/// Settings can be written by hand or read from JSON; missing fields fall back to
/// [`SolverSettings::default`].
///
/// # Examples
/// ```
/// use truss3d::SolverSettings;
///
/// let settings = SolverSettings::from_json(r#"{ "pivot_tolerance": 1e-8 }"#).expect("valid settings");
/// assert_eq!(settings.pivot_tolerance, 1.0e-8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    /// Smallest accepted ratio between the LU pivot of a free degree of freedom and the
    /// largest magnitude in its column of the reduced stiffness. Anything at or below it
    /// is reported as a singular stiffness.
    pub pivot_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1.0e-10,
        }
    }
}

impl SolverSettings {
    /// Parse settings from a JSON document and validate them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::InvalidTolerance`] when the tolerance is outside `[0, 1)`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialise the settings as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTolerance`] when the tolerance is outside `[0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pivot_tolerance.is_finite() && (0.0..1.0).contains(&self.pivot_tolerance)) {
            return Err(ConfigError::InvalidTolerance(self.pivot_tolerance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = SolverSettings::from_json("{}").expect("defaults");
        assert_eq!(settings, SolverSettings::default());
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = SolverSettings {
            pivot_tolerance: 1.0e-6,
        };
        let json = settings.to_json().expect("serialises");
        assert_eq!(SolverSettings::from_json(&json).expect("parses"), settings);
    }

    #[test]
    fn out_of_range_tolerance_is_rejected() {
        let error = SolverSettings::from_json(r#"{ "pivot_tolerance": 2.0 }"#)
            .expect_err("tolerance above one rejected");
        assert!(matches!(error, ConfigError::InvalidTolerance(t) if t == 2.0));

        let error = SolverSettings::from_json(r#"{ "pivot_tolerance": -1e-3 }"#)
            .expect_err("negative tolerance rejected");
        assert!(matches!(error, ConfigError::InvalidTolerance(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let error = SolverSettings::from_json(r#"{ "pivot_tol": 1e-3 }"#)
            .expect_err("unknown field rejected");
        assert!(matches!(error, ConfigError::Json(_)));
    }
}

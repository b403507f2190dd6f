use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::{FeatureVector, FEATURE_LAYOUT};

/// Fitted per-dimension standardization, as exported from a standard scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParameters {
    /// Feature layout the parameters were fitted against.
    #[serde(default = "current_layout_version")]
    pub layout_version: u32,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

fn current_layout_version() -> u32 {
    FEATURE_LAYOUT.version
}

impl NormalizationParameters {
    pub fn dimensions(&self) -> usize {
        self.mean.len()
    }

    /// Structural checks that do not depend on the feature layout.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(index) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean[{index}] is not finite"));
        }
        if let Some(index) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(format!("scale[{index}] must be finite and non-zero"));
        }
        Ok(())
    }
}

/// Feature vector after standardization; only the [`Normalizer`] makes these.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVector {
    values: Array1<f64>,
}

impl NormalizedVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    #[cfg(test)]
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self {
            values: Array1::from(values),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Normalizer {
    pub fn new(params: NormalizationParameters) -> std::result::Result<Self, String> {
        params.validate()?;
        Ok(Self {
            mean: Array1::from(params.mean),
            scale: Array1::from(params.scale),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / scale`, element-wise; lengths must match exactly.
    pub fn normalize(&self, features: &FeatureVector) -> Result<NormalizedVector> {
        if features.len() != self.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: features.len(),
            });
        }
        let values = (&features.view() - &self.mean) / &self.scale;
        Ok(NormalizedVector { values })
    }
}

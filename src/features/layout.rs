use std::ops::Range;

use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};

/// One named sub-block of the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureBlock {
    pub name: &'static str,
    pub width: usize,
}

/// Positional contract between the extractor and the fitted scaler/model.
///
/// Any change to the blocks or their order must bump `version`, since
/// artifacts fitted against an older layout would silently misread it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub version: u32,
    pub blocks: [FeatureBlock; 5],
}

pub const CEPSTRAL_COEFFICIENTS: usize = 40;
pub const CHROMA_BINS: usize = 12;
pub const MEL_BANDS: usize = 128;
pub const CONTRAST_BANDS: usize = 7;
pub const TONAL_DIMENSIONS: usize = 6;

pub const FEATURE_LAYOUT: FeatureLayout = FeatureLayout {
    version: 1,
    blocks: [
        FeatureBlock {
            name: "cepstral",
            width: CEPSTRAL_COEFFICIENTS,
        },
        FeatureBlock {
            name: "chroma",
            width: CHROMA_BINS,
        },
        FeatureBlock {
            name: "mel",
            width: MEL_BANDS,
        },
        FeatureBlock {
            name: "contrast",
            width: CONTRAST_BANDS,
        },
        FeatureBlock {
            name: "tonal",
            width: TONAL_DIMENSIONS,
        },
    ],
};

pub const FEATURE_DIM: usize = 193;

const _: () = assert!(FEATURE_LAYOUT.total_width() == FEATURE_DIM);

impl FeatureLayout {
    pub const fn total_width(&self) -> usize {
        let mut total = 0;
        let mut index = 0;
        while index < self.blocks.len() {
            total += self.blocks[index].width;
            index += 1;
        }
        total
    }

    /// Index range occupied by the block called `name`.
    pub fn range_of(&self, name: &str) -> Option<Range<usize>> {
        let mut start = 0;
        for block in &self.blocks {
            let end = start + block.width;
            if block.name == name {
                return Some(start..end);
            }
            start = end;
        }
        None
    }
}

/// The 193 time-averaged descriptors of one waveform, in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f64>,
}

impl FeatureVector {
    /// Concatenate per-block values, checking each against the layout.
    pub(crate) fn from_blocks(blocks: [Array1<f64>; 5]) -> Result<Self> {
        let mut values = Vec::with_capacity(FEATURE_DIM);
        for (block, expected) in blocks.iter().zip(FEATURE_LAYOUT.blocks.iter()) {
            if block.len() != expected.width {
                return Err(Error::extraction(format!(
                    "{} block has {} values, layout expects {}",
                    expected.name,
                    block.len(),
                    expected.width
                )));
            }
            values.extend(block.iter().copied());
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::extraction(format!(
                "non-finite value at dimension {index}"
            )));
        }
        Ok(Self {
            values: Array1::from(values),
        })
    }

    /// Wrap raw values, e.g. features computed elsewhere. No layout check.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values: Array1::from(values),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice().unwrap_or(&[])
    }

    /// Values of one named block, if the vector follows the layout.
    pub fn block(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let range = FEATURE_LAYOUT.range_of(name)?;
        (range.end <= self.values.len()).then(|| self.values.slice(ndarray::s![range]))
    }
}

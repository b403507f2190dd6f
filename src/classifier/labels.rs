use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Emotion;

/// Maps model class indices to emotion labels, in the order the model was fitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncodedClasses", into = "EncodedClasses")]
pub struct LabelEncoder {
    classes: Vec<Emotion>,
}

#[derive(Serialize, Deserialize)]
struct EncodedClasses {
    classes: Vec<Emotion>,
}

impl TryFrom<EncodedClasses> for LabelEncoder {
    type Error = String;

    fn try_from(encoded: EncodedClasses) -> std::result::Result<Self, Self::Error> {
        LabelEncoder::new(encoded.classes)
    }
}

impl From<LabelEncoder> for EncodedClasses {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    pub fn new(classes: Vec<Emotion>) -> std::result::Result<Self, String> {
        if classes.is_empty() {
            return Err("label encoder has no classes".to_string());
        }
        for (index, class) in classes.iter().enumerate() {
            if classes[..index].contains(class) {
                return Err(format!("label '{class}' appears more than once"));
            }
        }
        Ok(Self { classes })
    }

    /// Encoder with labels sorted by name, as a fitted scikit-learn encoder stores them.
    pub fn sorted() -> Self {
        let mut classes = Emotion::ALL.to_vec();
        classes.sort_by_key(|emotion| emotion.as_str());
        Self { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[Emotion] {
        &self.classes
    }

    pub fn decode(&self, index: usize) -> Result<Emotion> {
        self.classes
            .get(index)
            .copied()
            .ok_or(Error::UnknownClass {
                index,
                known: self.classes.len(),
            })
    }
}

// File: src/core/codec.rs
use crate::core::types::Field;
use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fixed vocabulary learned offline. The code of a value is its
/// position in `classes`.
///
/// Serialized as the bare list of classes; the reverse index is rebuilt
/// on load and duplicate entries are rejected there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), code).is_some() {
                return Err(format!("duplicate class '{class}'"));
            }
        }
        Ok(Self { classes, index })
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TryFrom<Vec<String>> for LabelEncoder {
    type Error = String;

    fn try_from(classes: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(classes)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(encoder: LabelEncoder) -> Self {
        encoder.classes
    }
}

/// The four feature encoders as they appear in the artifact bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSet {
    pub restaurant_id: LabelEncoder,
    pub menu_category: LabelEncoder,
    pub menu_item: LabelEncoder,
    pub ingredients: LabelEncoder,
}

/// Every categorical mapping of the pipeline behind one interface:
/// the four feature encoders plus the target decoder.
#[derive(Debug, Clone)]
pub struct CategoricalCodec {
    encoders: EncoderSet,
    target: LabelEncoder,
}

impl CategoricalCodec {
    pub fn new(encoders: EncoderSet, target: LabelEncoder) -> Self {
        Self { encoders, target }
    }

    fn encoder(&self, field: Field) -> &LabelEncoder {
        match field {
            Field::RestaurantId => &self.encoders.restaurant_id,
            Field::MenuCategory => &self.encoders.menu_category,
            Field::MenuItem => &self.encoders.menu_item,
            Field::Ingredients => &self.encoders.ingredients,
            Field::Target => &self.target,
        }
    }

    /// Exact, case-sensitive lookup. Unseen values are an error, never a
    /// substituted default code.
    pub fn encode(&self, field: Field, value: &str) -> Result<usize, PredictError> {
        self.encoder(field)
            .encode(value)
            .ok_or_else(|| PredictError::UnknownCategory {
                field,
                value: value.to_string(),
            })
    }

    pub fn decode(&self, field: Field, code: usize) -> Result<&str, PredictError> {
        self.encoder(field)
            .decode(code)
            .ok_or(PredictError::UnknownLabel { code })
    }

    pub fn target(&self) -> &LabelEncoder {
        &self.target
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }
}

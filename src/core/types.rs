// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the classifier input.
pub const FEATURE_COUNT: usize = 5;

/// One row of the reference table.
/// Column names match the header of the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    #[serde(rename = "RestaurantID")]
    pub restaurant_id: String,
    #[serde(rename = "MenuCategory")]
    pub menu_category: String,
    #[serde(rename = "MenuItem")]
    pub menu_item: String,
    #[serde(rename = "Ingredients")]
    pub ingredients: String,
    #[serde(rename = "Price")]
    pub price: f64,
}

/// The categorical fields known to the codec. `Target` is the
/// classifier's output vocabulary; the other four feed the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RestaurantId,
    MenuCategory,
    MenuItem,
    Ingredients,
    Target,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::RestaurantId => "restaurant ID",
            Field::MenuCategory => "menu category",
            Field::MenuItem => "menu item",
            Field::Ingredients => "ingredients",
            Field::Target => "profit label",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `[restaurant, category, item, ingredients, price]`, codes as floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(codes: [usize; 4], price: f64) -> Self {
        Self([
            codes[0] as f64,
            codes[1] as f64,
            codes[2] as f64,
            codes[3] as f64,
            price,
        ])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn price(&self) -> f64 {
        self.0[4]
    }
}

/// Display bucket for a decoded profit label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    High,
    Medium,
    Low,
}

impl Bucket {
    /// Case-insensitive match on "high" and "medium"; anything else,
    /// including labels outside the trained vocabulary, is `Low`.
    pub fn classify(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "high" => Bucket::High,
            "medium" => Bucket::Medium,
            _ => Bucket::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::High => "high",
            Bucket::Medium => "medium",
            Bucket::Low => "low",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one encode-predict-decode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub features: FeatureVector,
    pub label_code: usize,
    pub label: String,
    pub bucket: Bucket,
}

// File: src/core/selection.rs
use crate::core::engine::SelectorPredictor;
use crate::core::types::{Field, PredictionResult};
use crate::error::{PredictError, SelectItemError, SelectionIncomplete};
use tracing::debug;

/// Fully resolved inputs that passed the pre-predict gate.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub restaurant_id: String,
    pub menu_category: String,
    pub menu_item: String,
    pub ingredients: String,
    pub price: f64,
}

impl PredictRequest {
    pub fn run(&self, engine: &SelectorPredictor) -> Result<PredictionResult, PredictError> {
        engine.predict(
            &self.restaurant_id,
            &self.menu_category,
            &self.menu_item,
            &self.ingredients,
            self.price,
        )
    }
}

/// One session's progress through the cascading form.
///
/// Each field is only set after the previous one; changing or clearing a
/// field drops everything after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    restaurant_id: Option<String>,
    menu_category: Option<String>,
    menu_item: Option<String>,
    ingredients: Option<String>,
    price: Option<f64>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_id.as_deref()
    }

    pub fn menu_category(&self) -> Option<&str> {
        self.menu_category.as_deref()
    }

    pub fn menu_item(&self) -> Option<&str> {
        self.menu_item.as_deref()
    }

    pub fn ingredients(&self) -> Option<&str> {
        self.ingredients.as_deref()
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn select_restaurant(&mut self, restaurant_id: &str) {
        self.clear_restaurant();
        self.restaurant_id = chosen(restaurant_id);
    }

    pub fn select_category(&mut self, category: &str) -> Result<(), SelectionIncomplete> {
        if self.restaurant_id.is_none() {
            return Err(SelectionIncomplete { missing: vec![Field::RestaurantId] });
        }
        self.clear_category();
        self.menu_category = chosen(category);
        Ok(())
    }

    /// Picks an item and resolves its ingredients and price from the
    /// reference table. A miss leaves the item unset.
    pub fn select_item(&mut self, engine: &SelectorPredictor, item: &str) -> Result<(), SelectItemError> {
        let (Some(restaurant_id), Some(category)) =
            (self.restaurant_id.clone(), self.menu_category.clone())
        else {
            return Err(SelectItemError::Incomplete(SelectionIncomplete {
                missing: self.missing_before(Field::MenuItem),
            }));
        };
        self.clear_item();
        let Some(item) = chosen(item) else {
            return Ok(());
        };

        let row = engine.require(&restaurant_id, &category, &item)?;
        self.ingredients = Some(row.ingredients.clone());
        self.price = Some(row.price);
        self.menu_item = Some(item);
        debug!("Selected {:?}", self);
        Ok(())
    }

    pub fn clear_restaurant(&mut self) {
        self.restaurant_id = None;
        self.clear_category();
    }

    pub fn clear_category(&mut self) {
        self.menu_category = None;
        self.clear_item();
    }

    pub fn clear_item(&mut self) {
        self.menu_item = None;
        self.ingredients = None;
        self.price = None;
    }

    /// The pre-predict gate. Restaurant, category and item must be chosen
    /// and the price resolved before the engine is called.
    pub fn request(&self) -> Result<PredictRequest, SelectionIncomplete> {
        match (
            &self.restaurant_id,
            &self.menu_category,
            &self.menu_item,
            &self.ingredients,
            self.price,
        ) {
            (Some(restaurant_id), Some(category), Some(item), Some(ingredients), Some(price)) => {
                Ok(PredictRequest {
                    restaurant_id: restaurant_id.clone(),
                    menu_category: category.clone(),
                    menu_item: item.clone(),
                    ingredients: ingredients.clone(),
                    price,
                })
            }
            _ => Err(SelectionIncomplete { missing: self.missing_before(Field::Target) }),
        }
    }

    fn missing_before(&self, field: Field) -> Vec<Field> {
        let mut missing = Vec::new();
        if self.restaurant_id.is_none() {
            missing.push(Field::RestaurantId);
        }
        if matches!(field, Field::MenuItem | Field::Target) && self.menu_category.is_none() {
            missing.push(Field::MenuCategory);
        }
        if field == Field::Target && self.menu_item.is_none() {
            missing.push(Field::MenuItem);
        }
        missing
    }
}

/// Empty or whitespace-only values count as the placeholder.
fn chosen(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

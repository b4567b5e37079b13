use crate::core::classifier::Classifier;
use crate::core::codec::CategoricalCodec;
use crate::core::table::ReferenceTable;
use crate::core::types::{Bucket, FeatureVector, Field, PredictionResult, ReferenceRow};
use crate::error::{LoadError, PredictError};
use crate::persistence::{load_artifacts, ModelArtifacts};
use std::path::Path;
use tracing::{debug, info};

/// The Selector-Predictor: cascading reads over the reference table plus
/// the fixed encode, classify, decode sequence.
///
/// Everything here is read-only after construction, so one instance can be
/// shared between sessions. Selection state lives in `SelectionState`.
pub struct SelectorPredictor {
    table: ReferenceTable,
    codec: CategoricalCodec,
    classifier: Box<dyn Classifier>,
}

impl SelectorPredictor {
    pub fn new(table: ReferenceTable, codec: CategoricalCodec, classifier: Box<dyn Classifier>) -> Self {
        Self { table, codec, classifier }
    }

    pub fn from_artifacts(table: ReferenceTable, artifacts: ModelArtifacts) -> Self {
        let codec = CategoricalCodec::new(artifacts.encoders, artifacts.target);
        Self::new(table, codec, Box::new(artifacts.classifier))
    }

    /// One-time startup load of the table and the artifact bundle.
    pub fn load(table_path: &Path, artifacts_path: &Path, delimiter: u8) -> Result<Self, LoadError> {
        let table = ReferenceTable::load(table_path, delimiter)?;
        let artifacts = load_artifacts(artifacts_path)?;
        info!(
            "Selector-Predictor ready: {} restaurants, {} target labels",
            table.restaurants().len(),
            artifacts.target.len()
        );
        Ok(Self::from_artifacts(table, artifacts))
    }

    pub fn list_restaurants(&self) -> &[String] {
        self.table.restaurants()
    }

    pub fn list_categories(&self, restaurant_id: &str) -> Vec<&str> {
        self.table.categories(restaurant_id)
    }

    pub fn list_items(&self, restaurant_id: &str, category: &str) -> Vec<&str> {
        self.table.items(restaurant_id, category)
    }

    pub fn lookup(&self, restaurant_id: &str, category: &str, item: &str) -> Option<&ReferenceRow> {
        self.table.lookup(restaurant_id, category, item)
    }

    /// `lookup` for call paths where a miss is a state inconsistency.
    pub fn require(&self, restaurant_id: &str, category: &str, item: &str) -> Result<&ReferenceRow, PredictError> {
        self.lookup(restaurant_id, category, item)
            .ok_or_else(|| PredictError::LookupNotFound {
                restaurant_id: restaurant_id.to_string(),
                category: category.to_string(),
                item: item.to_string(),
            })
    }

    pub fn encode(
        &self,
        restaurant_id: &str,
        category: &str,
        item: &str,
        ingredients: &str,
        price: f64,
    ) -> Result<FeatureVector, PredictError> {
        let codes = [
            self.codec.encode(Field::RestaurantId, restaurant_id)?,
            self.codec.encode(Field::MenuCategory, category)?,
            self.codec.encode(Field::MenuItem, item)?,
            self.codec.encode(Field::Ingredients, ingredients)?,
        ];
        Ok(FeatureVector::new(codes, price))
    }

    pub fn predict(
        &self,
        restaurant_id: &str,
        category: &str,
        item: &str,
        ingredients: &str,
        price: f64,
    ) -> Result<PredictionResult, PredictError> {
        let features = self.encode(restaurant_id, category, item, ingredients, price)?;
        let label_code = self.classifier.predict(&features);
        let label = self.codec.decode(Field::Target, label_code)?.to_string();
        let bucket = Bucket::classify(&label);

        debug!(?features, label_code, %label, %bucket, "Predicted {restaurant_id}/{category}/{item}");

        Ok(PredictionResult { features, label_code, label, bucket })
    }

    pub fn codec(&self) -> &CategoricalCodec {
        &self.codec
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::classifier::{DecisionTree, TreeEnsemble};
    use crate::core::codec::{EncoderSet, LabelEncoder};
    use std::sync::Arc;

    const TABLE: &str = "\
RestaurantID;MenuCategory;MenuItem;Ingredients;Price
R1;Desserts;Cake;Flour,Sugar,Egg;5.5
R1;Beverages;Lemonade;Lemon,Sugar,Water;2.99
R2;Main Course;Steak;Beef,Butter,Garlic;24.99
R2;Desserts;Cake;Flour,Sugar,Egg;6.0
";

    fn encoder(classes: &[&str]) -> LabelEncoder {
        LabelEncoder::new(classes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn codec() -> CategoricalCodec {
        CategoricalCodec::new(
            EncoderSet {
                restaurant_id: encoder(&["R1", "R2"]),
                menu_category: encoder(&["Beverages", "Desserts", "Main Course"]),
                menu_item: encoder(&["Cake", "Lemonade", "Steak"]),
                ingredients: encoder(&["Beef,Butter,Garlic", "Flour,Sugar,Egg", "Lemon,Sugar,Water"]),
            },
            encoder(&["High", "Low", "Medium"]),
        )
    }

    /// Price <= 6.5 splits on category (<= 0.5 -> "Low", else "Medium"),
    /// anything pricier is "High".
    fn tree() -> TreeEnsemble {
        TreeEnsemble {
            classes: vec![0, 1, 2],
            trees: vec![DecisionTree {
                children_left: vec![1, 3, -1, -1, -1],
                children_right: vec![2, 4, -1, -1, -1],
                feature: vec![4, 1, -2, -2, -2],
                threshold: vec![6.5, 0.5, -2.0, -2.0, -2.0],
                value: vec![
                    vec![4.0, 3.0, 5.0],
                    vec![0.0, 3.0, 5.0],
                    vec![4.0, 0.0, 0.0],
                    vec![0.0, 3.0, 0.0],
                    vec![0.0, 0.0, 5.0],
                ],
            }],
        }
    }

    struct FixedCode(usize);

    impl Classifier for FixedCode {
        fn predict(&self, _features: &FeatureVector) -> usize {
            self.0
        }
    }

    pub(crate) fn engine() -> SelectorPredictor {
        let table = ReferenceTable::from_reader(TABLE.as_bytes(), b';').unwrap();
        SelectorPredictor::new(table, codec(), Box::new(tree()))
    }

    #[test]
    fn test_listing_cascade() {
        let engine = engine();
        assert_eq!(engine.list_restaurants(), ["R1", "R2"]);
        assert_eq!(engine.list_categories("R2"), ["Desserts", "Main Course"]);
        assert_eq!(engine.list_items("R1", "Desserts"), ["Cake"]);
        assert!(engine.list_items("R1", "Main Course").is_empty());
    }

    #[test]
    fn test_predict_stages() {
        let engine = engine();
        let result = engine
            .predict("R1", "Desserts", "Cake", "Flour,Sugar,Egg", 5.5)
            .unwrap();
        assert_eq!(result.features.values(), &[0.0, 1.0, 0.0, 1.0, 5.5]);
        assert_eq!(result.label_code, 2);
        assert_eq!(result.label, "Medium");
        assert_eq!(result.bucket, Bucket::Medium);

        let result = engine
            .predict("R2", "Main Course", "Steak", "Beef,Butter,Garlic", 24.99)
            .unwrap();
        assert_eq!(result.bucket, Bucket::High);

        let result = engine
            .predict("R1", "Beverages", "Lemonade", "Lemon,Sugar,Water", 2.99)
            .unwrap();
        assert_eq!(result.label, "Low");
        assert_eq!(result.bucket, Bucket::Low);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let engine = engine();
        let first = engine.predict("R2", "Desserts", "Cake", "Flour,Sugar,Egg", 6.0);
        for _ in 0..10 {
            assert_eq!(engine.predict("R2", "Desserts", "Cake", "Flour,Sugar,Egg", 6.0), first);
        }
    }

    #[test]
    fn test_unseen_ingredients_propagate() {
        let engine = engine();
        assert_eq!(
            engine.predict("R1", "Desserts", "Cake", "Flour,Sugar", 5.5),
            Err(PredictError::UnknownCategory {
                field: Field::Ingredients,
                value: "Flour,Sugar".to_string(),
            })
        );
    }

    #[test]
    fn test_unmapped_label_code_is_detected() {
        let table = ReferenceTable::from_reader(TABLE.as_bytes(), b';').unwrap();
        let engine = SelectorPredictor::new(table, codec(), Box::new(FixedCode(3)));
        assert_eq!(
            engine.predict("R1", "Desserts", "Cake", "Flour,Sugar,Egg", 5.5),
            Err(PredictError::UnknownLabel { code: 3 })
        );
    }

    #[test]
    fn test_require_reports_missing_triple() {
        let engine = engine();
        assert!(engine.require("R1", "Desserts", "Cake").is_ok());
        assert!(matches!(
            engine.require("R1", "Desserts", "Steak"),
            Err(PredictError::LookupNotFound { .. })
        ));
    }

    #[test]
    fn test_shared_between_sessions() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine
                        .predict("R1", "Desserts", "Cake", "Flour,Sugar,Egg", 5.5)
                        .map(|r| r.bucket)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(Bucket::Medium));
        }
    }
}

use profit_core::core::types::Field;
use profit_core::error::{LoadError, PredictError};
use profit_core::persistence::{load_artifacts, save_artifacts};
use profit_core::{Bucket, SelectionState, SelectorPredictor};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn engine() -> SelectorPredictor {
    SelectorPredictor::load(
        &fixture("restaurant_profitability.csv"),
        &fixture("artifacts.json"),
        b';',
    )
    .expect("fixtures load")
}

#[test]
fn cascade_lists_are_scoped_sorted_and_distinct() {
    let engine = engine();
    assert_eq!(engine.list_restaurants(), ["R1", "R2", "R3"]);
    assert_eq!(
        engine.list_categories("R1"),
        ["Beverages", "Desserts", "Main Course"]
    );
    assert_eq!(engine.list_categories("R3"), ["Appetizers", "Beverages"]);
    assert!(engine.list_categories("R4").is_empty());
    assert_eq!(engine.list_items("R1", "Desserts"), ["Brownie", "Cake"]);
}

#[test]
fn every_category_comes_from_that_restaurant() {
    let engine = engine();
    let rows = engine.table().rows();
    for restaurant in engine.list_restaurants() {
        let categories = engine.list_categories(restaurant);
        let mut sorted = categories.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(categories, sorted);
        for category in categories {
            assert!(rows
                .iter()
                .any(|r| &r.restaurant_id == restaurant && r.menu_category == category));
        }
    }
}

#[test]
fn duplicate_triple_resolves_to_first_row() {
    let engine = engine();
    let row = engine.lookup("R1", "Desserts", "Cake").unwrap();
    assert_eq!(row.ingredients, "Flour,Sugar,Egg");
    assert_eq!(row.price, 5.5);
}

#[test]
fn dessert_scenario_stage_by_stage() {
    let engine = engine();
    let codec = engine.codec();

    assert_eq!(codec.encode(Field::RestaurantId, "R1"), Ok(0));
    assert_eq!(codec.encode(Field::MenuCategory, "Desserts"), Ok(2));
    assert_eq!(codec.encode(Field::MenuItem, "Cake"), Ok(2));
    assert_eq!(codec.encode(Field::Ingredients, "Flour,Sugar,Egg"), Ok(5));

    let result = engine
        .predict("R1", "Desserts", "Cake", "Flour,Sugar,Egg", 5.5)
        .unwrap();
    assert_eq!(result.features.values(), &[0.0, 2.0, 2.0, 5.0, 5.5]);
    assert_eq!(result.label_code, 2);
    assert_eq!(result.label, "Medium");
    assert_eq!(result.bucket, Bucket::Medium);
}

#[test]
fn every_menu_item_predicts_a_bucket() {
    let engine = engine();
    let expected = [
        ("R1", "Beverages", "Lemonade", Bucket::Low),
        ("R1", "Main Course", "Grilled Chicken", Bucket::High),
        ("R2", "Appetizers", "Spring Rolls", Bucket::High),
        ("R2", "Desserts", "Cake", Bucket::Medium),
        ("R3", "Beverages", "Iced Tea", Bucket::Low),
    ];
    for (restaurant, category, item, bucket) in expected {
        let row = engine.require(restaurant, category, item).unwrap();
        let result = engine
            .predict(restaurant, category, item, &row.ingredients, row.price)
            .unwrap();
        assert_eq!(result.bucket, bucket, "{restaurant}/{category}/{item}");
    }
}

#[test]
fn unseen_menu_item_is_not_encoded() {
    let engine = engine();
    let err = engine
        .predict("R1", "Desserts", "Tiramisu", "Flour,Sugar,Egg", 5.5)
        .unwrap_err();
    assert_eq!(
        err,
        PredictError::UnknownCategory {
            field: Field::MenuItem,
            value: "Tiramisu".to_string(),
        }
    );
}

#[test]
fn form_session_with_midflow_clear() {
    let engine = engine();
    let mut state = SelectionState::new();

    state.select_restaurant("R2");
    state.select_category("Main Course").unwrap();
    state.select_item(&engine, "Steak").unwrap();
    assert_eq!(state.price(), Some(24.99));

    state.clear_category();
    assert_eq!(state.menu_item(), None);
    let incomplete = state.request().unwrap_err();
    assert!(incomplete
        .to_string()
        .starts_with("Please complete all selections before predicting"));

    state.select_category("Desserts").unwrap();
    state.select_item(&engine, "Cake").unwrap();
    let result = state.request().unwrap().run(&engine).unwrap();
    assert_eq!(result.bucket, Bucket::Medium);
}

#[test]
fn json_bundle_exported_to_bincode_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("artifacts.bin");
    save_artifacts(&load_artifacts(&fixture("artifacts.json")).unwrap(), &exported).unwrap();

    let from_json = engine();
    let from_bin = SelectorPredictor::load(&fixture("restaurant_profitability.csv"), &exported, b';').unwrap();
    for restaurant in from_json.list_restaurants() {
        for category in from_json.list_categories(restaurant) {
            for item in from_json.list_items(restaurant, category) {
                let row = from_json.require(restaurant, category, item).unwrap();
                assert_eq!(
                    from_json.predict(restaurant, category, item, &row.ingredients, row.price),
                    from_bin.predict(restaurant, category, item, &row.ingredients, row.price),
                );
            }
        }
    }
}

#[test]
fn malformed_tree_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    let text = std::fs::read_to_string(fixture("artifacts.json"))
        .unwrap()
        .replacen("\"feature\": [\n          4,", "\"feature\": [\n          9,", 1);
    std::fs::write(&path, text).unwrap();

    assert!(matches!(load_artifacts(&path), Err(LoadError::InvalidArtifact(_))));
}

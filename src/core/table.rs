// File: src/core/table.rs
use crate::core::types::ReferenceRow;
use crate::error::LoadError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const PRICE_COLUMN: &str = "Price";

/// category -> item -> index of the first matching row
type CategoryIndex = BTreeMap<String, BTreeMap<String, usize>>;

/// The static reference table with its hierarchical indexes.
///
/// Indexes are built once at load time: restaurant -> category -> item,
/// each level ordered, so the three cascading queries are plain map reads
/// rather than full scans.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
    index: BTreeMap<String, CategoryIndex>,
    restaurants: Vec<String>,
}

impl ReferenceTable {
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        let mut index: BTreeMap<String, CategoryIndex> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            index
                .entry(row.restaurant_id.clone())
                .or_default()
                .entry(row.menu_category.clone())
                .or_default()
                .entry(row.menu_item.clone())
                // duplicates keep the first row
                .or_insert(i);
        }

        let mut restaurants: Vec<String> = index.keys().cloned().collect();
        if restaurants.iter().all(|id| id.parse::<i64>().is_ok()) {
            restaurants.sort_by(|a, b| numeric_order(a, b));
        }

        Self { rows, index, restaurants }
    }

    /// Reads a delimited table with a header row.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let price_column = headers.iter().position(|h| h == PRICE_COLUMN);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row: ReferenceRow = record.deserialize(Some(&headers)).map_err(|e| {
                // only blame the price when its cell is actually the bad one
                let bad_price = price_column
                    .and_then(|i| record.get(i))
                    .filter(|cell| cell.parse::<f64>().is_err());
                let is_deserialize = matches!(e.kind(), csv::ErrorKind::Deserialize { .. });
                match bad_price {
                    Some(value) if is_deserialize => LoadError::InvalidPrice {
                        line: record.position().map(|p| p.line()),
                        value: value.to_string(),
                    },
                    _ => LoadError::Csv(e),
                }
            })?;
            rows.push(row);
        }
        debug!("Parsed {} reference rows", rows.len());
        Ok(Self::from_rows(rows))
    }

    pub fn load(path: &Path, delimiter: u8) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file), delimiter)?;
        info!(
            "Loaded {} rows for {} restaurants from {}",
            table.len(),
            table.restaurants.len(),
            path.display()
        );
        Ok(table)
    }

    /// Distinct restaurant IDs, ascending. Numeric when every ID is an
    /// integer, lexicographic otherwise.
    pub fn restaurants(&self) -> &[String] {
        &self.restaurants
    }

    /// Distinct categories served by `restaurant_id`, ascending. Empty for
    /// an unknown restaurant.
    pub fn categories(&self, restaurant_id: &str) -> Vec<&str> {
        self.index
            .get(restaurant_id)
            .map(|categories| categories.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn items(&self, restaurant_id: &str, category: &str) -> Vec<&str> {
        self.index
            .get(restaurant_id)
            .and_then(|categories| categories.get(category))
            .map(|items| items.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// First row matching the triple, in file order.
    pub fn lookup(&self, restaurant_id: &str, category: &str, item: &str) -> Option<&ReferenceRow> {
        let i = *self.index.get(restaurant_id)?.get(category)?.get(item)?;
        self.rows.get(i)
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn numeric_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

//! Job catalog and feature selection
//!
//! A [`Catalog`] is the table of [`ItemRecord`]s the clusters are built
//! from. [`FeatureSelector`] turns it into a raw [`FeatureMatrix`]: it keeps
//! the pre-declared numeric columns actually present in the catalog and
//! appends ordinal encodings of the known categorical columns.

use crate::matrix::FeatureMatrix;
use crate::{Error, Result};
use ahash::AHashMap;
use pathwise_schema::{CategoricalMapping, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric job attributes used for clustering, in column order.
pub const DECLARED_NUMERIC_FEATURES: &[&str] = &[
    "verbal_aptitude_weight",
    "quantitative_aptitude_weight",
    "creativity_requirement",
    "teamwork_requirement",
    "exploration_requirement",
    "salary_inr_avg",
    "work_life_balance_score",
    "stress_level",
    "growth_trajectory_5yr",
    "automation_risk_level",
    "industry_stability",
    "job_security_score",
];

/// Fixed ordinal scale for a categorical column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdinalEncoding {
    /// Catalog column holding the raw level
    pub source: &'static str,
    /// Feature column produced
    pub target: &'static str,
    pub levels: &'static [(&'static str, f64)],
    /// Value for unknown, missing or non-text cells
    pub default: f64,
}

impl OrdinalEncoding {
    pub fn encode(&self, value: Option<&FieldValue>) -> f64 {
        value
            .and_then(FieldValue::as_text)
            .and_then(|text| self.levels.iter().find(|(level, _)| *level == text))
            .map(|(_, code)| *code)
            .unwrap_or(self.default)
    }
}

pub const ENTRY_DIFFICULTY: OrdinalEncoding = OrdinalEncoding {
    source: "entry_difficulty",
    target: "entry_difficulty_enc",
    levels: &[
        ("Easy", 0.0),
        ("Moderate", 1.0),
        ("Hard", 2.0),
        ("Very Hard", 3.0),
        ("Very Hard,", 3.0),
    ],
    default: 0.0,
};

pub const REMOTE_WORK_FEASIBILITY: OrdinalEncoding = OrdinalEncoding {
    source: "remote_work_feasibility",
    target: "remote_work_feasibility_enc",
    levels: &[
        ("Remote", 0.0),
        ("Hybrid", 1.0),
        ("On-site", 2.0),
        ("Low", 1.0),
        ("High", 0.0),
    ],
    default: 1.0,
};

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: u64,
    /// Display name, e.g. the job title
    pub title: String,
    /// Grouping category; empty when unknown
    pub category: String,
    pub attributes: BTreeMap<String, FieldValue>,
}

impl ItemRecord {
    pub fn new(id: u64, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            category: category.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(FieldValue::as_f64)
    }
}

/// Ordered item records plus the column names of the source table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogRecords")]
pub struct Catalog {
    columns: Vec<String>,
    items: Vec<ItemRecord>,
    #[serde(skip)]
    index: AHashMap<u64, usize>,
}

/// Serialized form of a [`Catalog`]; the id index is rebuilt on load.
#[derive(Deserialize)]
struct CatalogRecords {
    columns: Vec<String>,
    items: Vec<ItemRecord>,
}

impl TryFrom<CatalogRecords> for Catalog {
    type Error = Error;

    fn try_from(records: CatalogRecords) -> Result<Self> {
        let mut catalog = Self::new(records.columns);
        for item in records.items {
            catalog.push(item)?;
        }
        Ok(catalog)
    }
}

impl Catalog {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            items: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Build a catalog whose columns are the union of the records'
    /// attribute names.
    pub fn from_records(records: Vec<ItemRecord>) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for name in record.attributes.keys() {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        let mut catalog = Self::new(columns);
        for record in records {
            catalog.push(record)?;
        }
        Ok(catalog)
    }

    pub fn push(&mut self, record: ItemRecord) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(Error::DuplicateItem(record.id));
        }
        self.index.insert(record.id, self.items.len());
        self.items.push(record);
        Ok(())
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    #[inline]
    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&ItemRecord> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    /// Encode every catalog column that has an entry in the mapping table.
    ///
    /// Cells are looked up by their exact trimmed string form; unknown and
    /// missing cells become the unknown-category sentinel. Returns the number
    /// of columns rewritten.
    pub fn apply_mapping(&mut self, mapping: &CategoricalMapping) -> usize {
        let targets: Vec<String> = mapping
            .columns()
            .filter(|c| self.has_column(c))
            .map(str::to_string)
            .collect();

        for column in &targets {
            for item in &mut self.items {
                let encoded = mapping.encode_raw(column, item.attributes.get(column));
                item.attributes.insert(column.clone(), encoded);
            }
            tracing::debug!(column = %column, "applied categorical mapping to catalog column");
        }
        targets.len()
    }
}

/// Chooses and orders the feature columns of the clustering matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSelector {
    numeric: Vec<String>,
    ordinals: Vec<OrdinalEncoding>,
}

impl Default for FeatureSelector {
    fn default() -> Self {
        Self {
            numeric: DECLARED_NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
            ordinals: vec![ENTRY_DIFFICULTY, REMOTE_WORK_FEASIBILITY],
        }
    }
}

impl FeatureSelector {
    /// A selector over `numeric` columns with no ordinal encodings.
    pub fn new(numeric: Vec<String>) -> Self {
        Self {
            numeric,
            ordinals: Vec::new(),
        }
    }

    pub fn with_ordinal(mut self, encoding: OrdinalEncoding) -> Self {
        self.ordinals.push(encoding);
        self
    }

    /// Feature columns this selector yields for a catalog, in order:
    /// present declared numeric columns, then ordinal targets whose source
    /// column is present. Absent declared columns are dropped with a warning.
    pub fn resolve_columns(&self, catalog: &Catalog) -> Vec<String> {
        let mut columns = Vec::new();
        for name in &self.numeric {
            if catalog.has_column(name) {
                columns.push(name.clone());
            } else {
                tracing::warn!(column = %name, "declared feature column missing from catalog; dropping it");
            }
        }
        for encoding in &self.ordinals {
            if catalog.has_column(encoding.source) {
                columns.push(encoding.target.to_string());
            }
        }
        columns
    }

    /// Build the raw feature matrix. Missing or non-numeric numeric cells
    /// are `NaN`, left for the scaler to impute.
    pub fn select(&self, catalog: &Catalog) -> Result<FeatureMatrix> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let numeric: Vec<&String> = self.numeric.iter().filter(|n| catalog.has_column(n)).collect();
        let ordinals: Vec<&OrdinalEncoding> = self
            .ordinals
            .iter()
            .filter(|e| catalog.has_column(e.source))
            .collect();

        let columns = self.resolve_columns(catalog);
        if columns.is_empty() {
            return Err(Error::NoFeatureColumns);
        }

        let mut matrix = FeatureMatrix::new(columns);
        for item in catalog.items() {
            let mut row: Vec<f64> = numeric
                .iter()
                .map(|name| item.number(name).unwrap_or(f64::NAN))
                .collect();
            row.extend(ordinals.iter().map(|e| e.encode(item.attribute(e.source))));
            matrix.push_row(item.id, row)?;
        }
        Ok(matrix)
    }
}

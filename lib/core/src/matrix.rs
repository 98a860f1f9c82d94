//! Feature matrix
//!
//! An ordered `item id -> row` table with named columns. Missing cells of a
//! raw matrix are `NaN` until the scaler imputes them.

use crate::{Error, Result};
use ahash::AHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    item_ids: Vec<u64>,
    rows: Vec<Vec<f64>>,
    index: AHashMap<u64, usize>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            item_ids: Vec::new(),
            rows: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub fn from_rows<I>(columns: Vec<String>, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, Vec<f64>)>,
    {
        let mut matrix = Self::new(columns);
        for (id, row) in rows {
            matrix.push_row(id, row)?;
        }
        Ok(matrix)
    }

    /// Append a row. The row must have one value per column and the id must
    /// not already be present.
    pub fn push_row(&mut self, id: u64, row: Vec<f64>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::DimensionMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateItem(id));
        }
        self.index.insert(id, self.rows.len());
        self.item_ids.push(id);
        self.rows.push(row);
        Ok(())
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn item_ids(&self) -> &[u64] {
        &self.item_ids
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn row(&self, position: usize) -> &[f64] {
        &self.rows[position]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Row position of an item id
    pub fn position(&self, id: u64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn row_by_id(&self, id: u64) -> Option<&[f64]> {
        self.position(id).map(|p| self.row(p))
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[column])
    }

    /// Borrow the rows at the given positions, in the given order.
    pub fn select_rows(&self, positions: &[usize]) -> Vec<&[f64]> {
        positions.iter().map(|&p| self.row(p)).collect()
    }

    /// Same ids and columns with every row rewritten by `f`.
    pub(crate) fn map_rows<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&[f64]) -> Vec<f64>,
    {
        Self {
            columns: self.columns.clone(),
            item_ids: self.item_ids.clone(),
            rows: self.rows.iter().map(|r| f(r)).collect(),
            index: self.index.clone(),
        }
    }
}

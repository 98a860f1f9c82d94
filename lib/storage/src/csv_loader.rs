// CSV loaders for the job catalog, the categorical mapping table and
// batches of candidate profiles
use anyhow::{bail, Context, Result};
use pathwise_core::{Catalog, ItemRecord};
use pathwise_schema::{CategoricalMapping, ExternalProfile, FieldValue, MappingRow};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns of the catalog table with a special role
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogColumns {
    /// Display name of a job
    pub title: String,
    /// Category tallied per cluster
    pub category: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            title: "job_title".to_string(),
            category: "primary_category".to_string(),
        }
    }
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Load the job catalog. Item ids are the zero-based row indices.
pub fn load_catalog_csv<P: AsRef<Path>>(path: P, columns: &CatalogColumns) -> Result<Catalog> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open catalog {:?}", path))?;
    let catalog = read_catalog(file, columns).with_context(|| format!("Failed to read catalog {:?}", path))?;
    tracing::info!(path = ?path, items = catalog.len(), columns = catalog.columns().len(), "loaded catalog");
    Ok(catalog)
}

/// Read a catalog table from any reader.
///
/// Empty cells are left out of the record; numeric-looking cells become
/// numbers. A table without data rows is an error.
pub fn read_catalog<R: Read>(source: R, columns: &CatalogColumns) -> Result<Catalog> {
    let mut rdr = reader(source);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if !headers.contains(&columns.title) {
        tracing::warn!(column = %columns.title, "title column missing from catalog; titles will be empty");
    }

    let mut catalog = Catalog::new(headers.clone());
    for (index, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("Malformed catalog row {}", index + 1))?;
        let mut record = ItemRecord::new(index as u64, "", "");
        for (name, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            if *name == columns.title {
                record.title = cell.to_string();
            }
            if *name == columns.category {
                record.category = cell.to_string();
            }
            record.attributes.insert(name.clone(), FieldValue::parse(cell));
        }
        catalog.push(record)?;
    }

    if catalog.is_empty() {
        bail!("Catalog has no rows");
    }
    Ok(catalog)
}

/// Load the mapping table. A missing file is an empty mapping.
pub fn load_mapping_csv<P: AsRef<Path>>(path: P) -> Result<CategoricalMapping> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = ?path, "no mapping table found; categorical values stay unmapped");
        return Ok(CategoricalMapping::new());
    }
    let file = File::open(path).with_context(|| format!("Failed to open mapping table {:?}", path))?;
    let mapping = read_mapping(file).with_context(|| format!("Failed to read mapping table {:?}", path))?;
    tracing::info!(path = ?path, columns = mapping.len(), "loaded mapping table");
    Ok(mapping)
}

/// Read `column,original_value,encoded_value` rows.
pub fn read_mapping<R: Read>(source: R) -> Result<CategoricalMapping> {
    let mut rdr = reader(source);
    let rows = rdr
        .deserialize::<MappingRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(CategoricalMapping::from_rows(rows))
}

/// Load one profile per row, skipping empty cells.
pub fn load_profiles_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ExternalProfile>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open profiles {:?}", path))?;
    read_profiles(file).with_context(|| format!("Failed to read profiles {:?}", path))
}

pub fn read_profiles<R: Read>(source: R) -> Result<Vec<ExternalProfile>> {
    let mut rdr = reader(source);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut profiles = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let profile: ExternalProfile = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name.clone(), FieldValue::parse(cell)))
            .collect();
        profiles.push(profile);
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const CATALOG: &str = "\
job_title,primary_category,salary_inr_avg,entry_difficulty
Data Analyst,Technology,\"850,000\",Moderate
Painter,Arts,,Easy
 Nurse ,Healthcare,600000,Hard
";

    #[test]
    fn test_read_catalog() {
        let catalog = read_catalog(CATALOG.as_bytes(), &CatalogColumns::default()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.columns().len(), 4);

        let analyst = catalog.get(0).unwrap();
        assert_eq!(analyst.title, "Data Analyst");
        assert_eq!(analyst.category, "Technology");
        assert_eq!(analyst.number("salary_inr_avg"), Some(850_000.0));
        assert_eq!(analyst.attribute("entry_difficulty"), Some(&FieldValue::Text("Moderate".to_string())));

        assert!(catalog.get(1).unwrap().attribute("salary_inr_avg").is_none());
        assert_eq!(catalog.get(2).unwrap().title, "Nurse");
    }

    #[test]
    fn test_empty_catalog_fails() {
        let err = read_catalog("job_title,salary_inr_avg\n".as_bytes(), &CatalogColumns::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_catalog_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(load_catalog_csv(dir.path().join("missing.csv"), &CatalogColumns::default()).is_err());
    }

    #[test]
    fn test_read_mapping() {
        let csv = "column,original_value,encoded_value\nstream,Science,2\nstream,Arts,1.5\nboard,CBSE,central\nboard,,3\n";
        let mapping = read_mapping(csv.as_bytes()).unwrap();
        assert_eq!(mapping.lookup("stream", "Science"), Some(&FieldValue::Number(2.0)));
        assert_eq!(mapping.lookup("stream", "Arts"), Some(&FieldValue::Number(1.5)));
        assert_eq!(mapping.lookup("board", "CBSE"), Some(&FieldValue::Text("central".to_string())));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_missing_mapping_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mapping = load_mapping_csv(dir.path().join("mapping.csv")).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_load_mapping_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapping.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "column,original_value,encoded_value").unwrap();
        writeln!(file, "stream, Commerce ,3").unwrap();
        drop(file);

        let mapping = load_mapping_csv(&path).unwrap();
        assert_eq!(mapping.lookup("stream", "Commerce"), Some(&FieldValue::Number(3.0)));
    }

    #[test]
    fn test_read_profiles() {
        let csv = "expected_salary,stream,creativity_score\n1200000,Science,7\n,Arts,\n";
        let profiles = read_profiles(csv.as_bytes()).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].number("expected_salary"), Some(1_200_000.0));
        assert_eq!(profiles[1].len(), 1);
        assert_eq!(profiles[1].get("stream"), Some(&FieldValue::Text("Arts".to_string())));
    }
}

pub mod artifact;
pub mod csv_loader;
pub mod export;

pub use artifact::{ArtifactInfo, ArtifactStore, FORMAT_VERSION};
pub use csv_loader::{
    load_catalog_csv, load_mapping_csv, load_profiles_csv, read_catalog, read_mapping, read_profiles,
    CatalogColumns,
};
pub use export::{export_metadata_json, metadata_document, ClusterExport};

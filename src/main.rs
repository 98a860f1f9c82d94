use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pathwise_api::RestApi;
use pathwise_core::{BuildConfig, CareerModel, ModelBuilder, SplitConfig};
use pathwise_schema::{profile_from_free_text, ExternalProfile};
use pathwise_storage::{
    export_metadata_json, load_catalog_csv, load_mapping_csv, load_profiles_csv, ArtifactStore, CatalogColumns,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Career recommendation by recursive cluster splitting
#[derive(Parser, Debug)]
#[command(name = "pathwise")]
#[command(about = "Cluster a career catalog and match profiles to it", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a model artifact from a catalog and a mapping table
    Build {
        /// Career catalog CSV
        #[arg(long)]
        catalog: PathBuf,

        /// Mapping table CSV; a missing file means no mappings
        #[arg(long, default_value = "mapping.csv")]
        mapping: PathBuf,

        /// Output artifact path
        #[arg(long, default_value = "career_model.bin")]
        out: PathBuf,

        /// Clusters larger than this are split
        #[arg(long, default_value_t = 25)]
        max_cluster_size: usize,

        /// Silhouette margin a split must exceed
        #[arg(long, default_value_t = 0.05)]
        min_improvement: f64,

        /// Catalog column with job titles
        #[arg(long, default_value = "job_title")]
        title_column: String,

        /// Catalog column with job categories
        #[arg(long, default_value = "primary_category")]
        category_column: String,
    },

    /// Export cluster metadata of a model as JSON
    Export {
        #[arg(long, env = "PATHWISE_MODEL_PATH", default_value = "career_model.bin")]
        model: PathBuf,

        #[arg(long, default_value = "clusters_meta.json")]
        out: PathBuf,
    },

    /// Match profiles against a model and print the ranked clusters as JSON
    Match {
        #[arg(long, env = "PATHWISE_MODEL_PATH", default_value = "career_model.bin")]
        model: PathBuf,

        /// JSON file with one profile object
        #[arg(long, conflicts_with_all = ["text", "profiles"])]
        profile: Option<PathBuf>,

        /// Free-text profile description
        #[arg(long, conflicts_with = "profiles")]
        text: Option<String>,

        /// CSV file with one profile per row
        #[arg(long)]
        profiles: Option<PathBuf>,

        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },

    /// Serve the model over HTTP
    Serve {
        #[arg(long, env = "PATHWISE_MODEL_PATH", default_value = "career_model.bin")]
        model: PathBuf,

        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Build {
            catalog,
            mapping,
            out,
            max_cluster_size,
            min_improvement,
            title_column,
            category_column,
        } => {
            let columns = CatalogColumns {
                title: title_column,
                category: category_column,
            };
            let config = BuildConfig {
                split: SplitConfig {
                    max_cluster_size,
                    min_improvement,
                    ..SplitConfig::default()
                },
                ..BuildConfig::default()
            };
            build(&catalog, &mapping, &out, &columns, config)
        }
        Command::Export { model, out } => {
            let model = ArtifactStore::new(&model).load()?;
            export_metadata_json(&out, &model)?;
            info!("Exported {} clusters to {:?}", model.n_clusters(), out);
            Ok(())
        }
        Command::Match {
            model,
            profile,
            text,
            profiles,
            top_k,
        } => {
            let model = ArtifactStore::new(&model).load()?;
            run_match(&model, profile, text, profiles, top_k)
        }
        Command::Serve { model, http_port } => serve(&model, http_port).await,
    }
}

fn build(
    catalog: &Path,
    mapping: &Path,
    out: &Path,
    columns: &CatalogColumns,
    config: BuildConfig,
) -> anyhow::Result<()> {
    let catalog = load_catalog_csv(catalog, columns)?;
    let mapping = load_mapping_csv(mapping)?;
    let model = ModelBuilder::new(config).build(catalog, mapping)?;
    let saved = ArtifactStore::new(out).save(&model)?;

    info!("Model saved to {:?}", saved.path);
    info!("Features: {}", model.feature_columns.join(", "));
    info!("Clusters: {}", saved.clusters);
    info!("Checksum: {}", saved.checksum);
    Ok(())
}

fn run_match(
    model: &CareerModel,
    profile: Option<PathBuf>,
    text: Option<String>,
    profiles: Option<PathBuf>,
    top_k: usize,
) -> anyhow::Result<()> {
    let output = if let Some(path) = profiles {
        let profiles: Vec<ExternalProfile> = load_profiles_csv(&path)?
            .iter()
            .map(|p| model.prepare_profile(p))
            .collect();
        let results = model
            .context()
            .match_many(&profiles, top_k)
            .into_iter()
            .collect::<pathwise_core::Result<Vec<_>>>()?;
        serde_json::to_string_pretty(&results)?
    } else {
        let profile = match (profile, text) {
            (Some(path), _) => {
                let raw = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
                let value: serde_json::Value = serde_json::from_str(&raw)?;
                ExternalProfile::from_json(&value)?
            }
            (None, Some(text)) => profile_from_free_text(&text, Some(&model.mappings)),
            (None, None) => bail!("one of --profile, --text or --profiles is required"),
        };
        serde_json::to_string_pretty(&model.match_profile(&profile, top_k)?)?
    };

    println!("{}", output);
    Ok(())
}

async fn serve(model_path: &Path, http_port: u16) -> anyhow::Result<()> {
    info!("Starting Pathwise v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {:?}", model_path);
    info!("HTTP API port: {}", http_port);

    let model = Arc::new(ArtifactStore::new(model_path).load()?);
    info!("Model loaded with {} clusters", model.n_clusters());

    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(model, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

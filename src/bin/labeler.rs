//! Labeler CLI - Command-line interface for the journey labeler
//!
//! Commands:
//! - label: Auto-label a captured trajectory and store it
//! - verify: Record a user-confirmed transport mode
//! - export: Write training CSV (verified only, or everything)
//! - report: Print the data-quality report
//! - features: Print the feature vector of a stored journey
//! - classify: Run the mode rule table on a list of speeds

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use journey_labeler::config::PipelineConfig;
use journey_labeler::store::StoreError;
use journey_labeler::{
    infer_transport_mode_with_confidence, AutoLabelingService, DataExporter, FeatureExtractor,
    GpsPoint, InMemoryJourneyStore, JourneyStore, LabelingError, RoadClassifier,
    SnapToRoadsClient, StaticRoadHint, TransportMode, LABELER_VERSION,
};

/// Labeler - Auto-labeling and feature extraction for transport-mode training data
#[derive(Parser)]
#[command(name = "labeler")]
#[command(version = LABELER_VERSION)]
#[command(about = "Turn commute captures into labeled training data", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Auto-label a trajectory and add it to the store
    Label {
        /// Trajectory JSON: [{"lat":..,"lng":..,"time":..}] (use - for stdin)
        #[arg(short, long)]
        trajectory: PathBuf,

        /// Accelerometer stream JSON file
        #[arg(long)]
        accel: Option<PathBuf>,

        /// Gyroscope stream JSON file
        #[arg(long)]
        gyro: Option<PathBuf>,

        /// Barometer stream JSON file
        #[arg(long)]
        baro: Option<PathBuf>,

        /// Journey store file
        #[arg(short, long)]
        store: PathBuf,

        /// Google Roads API key
        #[arg(long)]
        api_key: Option<String>,

        /// Use a fixed road-type hint instead of calling the road service
        #[arg(long)]
        road_hint: Option<String>,
    },

    /// Record a user-confirmed transport mode
    Verify {
        #[arg(short, long)]
        store: PathBuf,

        /// Journey id
        #[arg(long)]
        id: i64,

        /// Corrected transport mode (e.g. BUS)
        #[arg(long)]
        mode: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Export training CSV
    Export {
        #[arg(short, long)]
        store: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Include unverified auto labels
        #[arg(long)]
        all: bool,
    },

    /// Print the data-quality report
    Report {
        #[arg(short, long)]
        store: PathBuf,
    },

    /// Print the feature vector of a stored journey as JSON
    Features {
        #[arg(short, long)]
        store: PathBuf,

        #[arg(long)]
        id: i64,
    },

    /// Classify a speed profile with the mode rule table
    Classify {
        /// Speeds in m/s, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        speeds: Vec<f64>,

        /// Road-type hint
        #[arg(long, default_value = "")]
        road_types: String,

        #[arg(long, default_value = "0")]
        duration_ms: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), LabelerCliError> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Label {
            trajectory,
            accel,
            gyro,
            baro,
            store,
            api_key,
            road_hint,
        } => {
            let inputs = LabelInputs {
                trajectory: read_trajectory(&trajectory)?,
                accel: read_optional(accel.as_deref())?,
                gyro: read_optional(gyro.as_deref())?,
                baro: read_optional(baro.as_deref())?,
            };

            match road_hint {
                Some(hint) => {
                    cmd_label(&config, &store, &inputs, StaticRoadHint::new(hint), "").await
                }
                None => {
                    let key = api_key.ok_or(LabelerCliError::MissingApiKey)?;
                    let client = SnapToRoadsClient::new(&config.roads);
                    cmd_label(&config, &store, &inputs, client, &key).await
                }
            }
        }

        Commands::Verify {
            store,
            id,
            mode,
            notes,
        } => cmd_verify(&store, id, TransportMode::from(mode), &notes).await,

        Commands::Export { store, output, all } => cmd_export(&config, &store, &output, all).await,

        Commands::Report { store } => {
            let journeys = Arc::new(InMemoryJourneyStore::load(&store).await?);
            let exporter = DataExporter::with_config(journeys, config.export.clone());
            print!("{}", exporter.generate_data_report().await);
            Ok(())
        }

        Commands::Features { store, id } => {
            let journeys = InMemoryJourneyStore::load(&store).await?;
            let journey = journeys
                .get_journey_by_id(id)
                .await?
                .ok_or(LabelerCliError::JourneyNotFound(id))?;
            let features = FeatureExtractor::extract_features(&journey);
            println!("{}", serde_json::to_string_pretty(&features)?);
            Ok(())
        }

        Commands::Classify {
            speeds,
            road_types,
            duration_ms,
        } => {
            let prediction =
                infer_transport_mode_with_confidence(&speeds, &road_types, duration_ms);
            println!("{}", serde_json::to_string(&prediction)?);
            Ok(())
        }
    }
}

struct LabelInputs {
    trajectory: Vec<GpsPoint>,
    accel: String,
    gyro: String,
    baro: String,
}

async fn cmd_label<R: RoadClassifier>(
    config: &PipelineConfig,
    store_path: &Path,
    inputs: &LabelInputs,
    roads: R,
    api_key: &str,
) -> Result<(), LabelerCliError> {
    let store = Arc::new(InMemoryJourneyStore::load(store_path).await?);
    let service = AutoLabelingService::with_config(store.clone(), roads, config.labeling.clone());

    let journey = service
        .auto_label_trajectory(
            &inputs.trajectory,
            &inputs.accel,
            &inputs.gyro,
            &inputs.baro,
            api_key,
        )
        .await
        .ok_or(LabelerCliError::NotLabeled)?;

    store.save(store_path).await?;
    println!(
        "{}",
        serde_json::json!({
            "id": journey.id,
            "transportMode": journey.transport_mode,
            "confidence": journey.snap_confidence,
            "roadTypes": journey.road_types,
            "avgSpeed": journey.avg_speed,
        })
    );
    Ok(())
}

async fn cmd_verify(
    store_path: &Path,
    id: i64,
    mode: TransportMode,
    notes: &str,
) -> Result<(), LabelerCliError> {
    let store = Arc::new(InMemoryJourneyStore::load(store_path).await?);
    // Verification never touches the road service
    let service = AutoLabelingService::new(store.clone(), StaticRoadHint::default());

    if !service.verify_label(id, mode, notes).await {
        return Err(LabelerCliError::NotVerified(id));
    }
    store.save(store_path).await?;
    Ok(())
}

async fn cmd_export(
    config: &PipelineConfig,
    store_path: &Path,
    output: &Path,
    all: bool,
) -> Result<(), LabelerCliError> {
    let store = Arc::new(InMemoryJourneyStore::load(store_path).await?);
    let exporter = DataExporter::with_config(store, config.export.clone());

    let written = if all {
        exporter.export_all_data_to_csv(output).await
    } else {
        exporter.export_verified_data_to_csv(output).await
    };

    if written < 0 {
        return Err(LabelerCliError::ExportFailed);
    }
    println!("{}", serde_json::json!({ "rows": written, "path": output.display().to_string() }));
    Ok(())
}

fn read_trajectory(path: &Path) -> Result<Vec<GpsPoint>, LabelerCliError> {
    let data = if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&data)?)
}

fn read_optional(path: Option<&Path>) -> Result<String, LabelerCliError> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => Ok(String::new()),
    }
}

// Error types

#[derive(Debug)]
enum LabelerCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Labeling(LabelingError),
    Store(StoreError),
    MissingApiKey,
    NotLabeled,
    JourneyNotFound(i64),
    NotVerified(i64),
    ExportFailed,
}

impl From<io::Error> for LabelerCliError {
    fn from(e: io::Error) -> Self {
        LabelerCliError::Io(e)
    }
}

impl From<serde_json::Error> for LabelerCliError {
    fn from(e: serde_json::Error) -> Self {
        LabelerCliError::Json(e)
    }
}

impl From<LabelingError> for LabelerCliError {
    fn from(e: LabelingError) -> Self {
        LabelerCliError::Labeling(e)
    }
}

impl From<StoreError> for LabelerCliError {
    fn from(e: StoreError) -> Self {
        LabelerCliError::Store(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LabelerCliError> for CliError {
    fn from(e: LabelerCliError) -> Self {
        match e {
            LabelerCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LabelerCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Trajectory must be a JSON array of {lat, lng, time} objects".to_string(),
                ),
            },
            LabelerCliError::Labeling(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the --config file".to_string()),
            },
            LabelerCliError::Store(e) => CliError {
                code: "STORE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that the store file is a labeler snapshot".to_string()),
            },
            LabelerCliError::MissingApiKey => CliError {
                code: "MISSING_API_KEY".to_string(),
                message: "No API key for the road service".to_string(),
                hint: Some("Pass --api-key, or --road-hint to label offline".to_string()),
            },
            LabelerCliError::NotLabeled => CliError {
                code: "NOT_LABELED".to_string(),
                message: "Trajectory was rejected and nothing was stored".to_string(),
                hint: Some("Set RUST_LOG=debug to see which gate rejected it".to_string()),
            },
            LabelerCliError::JourneyNotFound(id) => CliError {
                code: "NOT_FOUND".to_string(),
                message: format!("Journey {} not found", id),
                hint: None,
            },
            LabelerCliError::NotVerified(id) => CliError {
                code: "NOT_VERIFIED".to_string(),
                message: format!("Journey {} was not verified", id),
                hint: Some("Check that the journey id exists in the store".to_string()),
            },
            LabelerCliError::ExportFailed => CliError {
                code: "EXPORT_FAILED".to_string(),
                message: "CSV export failed".to_string(),
                hint: Some("Check the output path and the store file".to_string()),
            },
        }
    }
}

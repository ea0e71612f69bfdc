//! PDF text extraction server with a direct-then-OCR pipeline.

mod accuracy;
mod config;
mod direct;
mod drive;
mod error;
mod extractor;
mod ocr;
mod preprocess;
mod schema;
mod store;
#[cfg(test)]
mod testutil;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use config::ExtractionSettings;
use drive::DriveClient;
use extractor::PipelineExtractor;
use schema::ProcessEnvelope;
use std::path::PathBuf;
use std::sync::Arc;
use store::{DocumentStore, StoredDocument};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    settings: Arc<ExtractionSettings>,
    store: DocumentStore,
    drive: Option<Arc<DriveClient>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docutext=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ExtractionSettings::load(std::path::Path::new("config.json"))?;
    info!(
        "settings: lang={}, dpi={}, psm={}, window={}",
        settings.ocr_language, settings.raster_dpi, settings.page_seg_mode,
        settings.threshold_window
    );

    let drive = DriveClient::from_env(reqwest::Client::new()).map(Arc::new);
    if drive.is_none() {
        info!("Drive credentials not configured, remote retrieval disabled");
    }

    let state = AppState {
        settings: Arc::new(settings),
        store: DocumentStore::new(),
        drive,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_upload))
        .route("/extract/drive/:file_id", post(extract_drive))
        .route("/documents/:id", get(get_document))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024)) // 100MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server listening on http://0.0.0.0:3000");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Upload a PDF and run the extraction pipeline on it.
async fn extract_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Json<ProcessEnvelope> {
    let mut filename = String::new();
    let mut file_data = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    filename = field.file_name().unwrap_or("document.pdf").to_string();
                    match field.bytes().await {
                        Ok(bytes) => file_data = bytes.to_vec(),
                        Err(e) => {
                            return Json(ProcessEnvelope::failed(format!(
                                "failed to read file: {}",
                                e
                            )))
                        }
                    }
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => return Json(ProcessEnvelope::failed(format!("multipart error: {}", e))),
        }
    }

    if file_data.is_empty() {
        return Json(ProcessEnvelope::failed("no file uploaded"));
    }
    info!("received {} ({} bytes)", filename, file_data.len());

    // Stage under a unique directory so the metadata title stays the
    // original basename.
    let staging = staging_dir(&state);
    let local_path = staging.join(&filename);
    if let Err(e) = tokio::fs::create_dir_all(&staging).await {
        return Json(ProcessEnvelope::failed(format!("staging failed: {}", e)));
    }
    if let Err(e) = tokio::fs::write(&local_path, &file_data).await {
        let _ = tokio::fs::remove_dir_all(&staging).await;
        return Json(ProcessEnvelope::failed(format!("staging failed: {}", e)));
    }

    let envelope = process_document(&state, &filename, local_path).await;

    // Staged uploads are transient; remove them regardless of outcome.
    let _ = tokio::fs::remove_dir_all(&staging).await;
    Json(envelope)
}

/// Download a Drive file and run the extraction pipeline on it.
async fn extract_drive(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Json<ProcessEnvelope> {
    let Some(drive) = state.drive.clone() else {
        return Json(ProcessEnvelope::failed("Drive credentials not configured"));
    };

    let staging = staging_dir(&state);
    let local_path = match drive.download(&file_id, &staging).await {
        Ok(path) => path,
        Err(e) => {
            error!("download failed for {}: {:#}", file_id, e);
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Json(ProcessEnvelope::failed(format!("download failed: {}", e)));
        }
    };

    let envelope = process_document(&state, &file_id, local_path).await;

    let _ = tokio::fs::remove_dir_all(&staging).await;
    Json(envelope)
}

/// Fetch a stored extraction by document id.
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredDocument>, StatusCode> {
    state.store.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

// ============================================================================
// Processing
// ============================================================================

/// Run the blocking pipeline on the worker pool and persist the result.
///
/// Pipeline failures become a failure envelope instead of an error status,
/// so a caller working through a batch can continue past one bad document.
async fn process_document(
    state: &AppState,
    file_id: &str,
    pdf_path: PathBuf,
) -> ProcessEnvelope {
    let settings = state.settings.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let pipeline = PipelineExtractor::from_settings(&settings);
        pipeline.extract(&pdf_path)
    })
    .await;

    match outcome {
        Ok(Ok(result)) => {
            let metadata = result.metadata.clone();
            let document_id = state.store.insert(file_id, result);
            info!(
                "extraction complete: {} via {}",
                document_id,
                metadata.extraction_method.as_str()
            );
            ProcessEnvelope::ok(document_id, metadata)
        }
        Ok(Err(e)) => {
            error!("extraction failed for {}: {}", file_id, e);
            ProcessEnvelope::failed(e.to_string())
        }
        Err(e) => {
            error!("extraction task failed for {}: {}", file_id, e);
            ProcessEnvelope::failed("extraction task failed")
        }
    }
}

fn staging_dir(state: &AppState) -> PathBuf {
    PathBuf::from(&state.settings.upload_dir).join(Uuid::new_v4().simple().to_string())
}

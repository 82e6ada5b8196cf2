use std::fmt;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task;
use tracing::{error, info};

use kassa_config::Settings;
use kassa_io::XlsxError;
use kassa_report::{fill_register, FillReport, RegisterLayout};
use kassa_storage::{ObjectStore, StorageError};

use crate::AppState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Lifetime of the returned download link, in seconds.
const LINK_TTL_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
pub struct ReceiveRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(default)]
    pub data: RecordBatch,
}

/// Clients send either an array of records or a single bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecordBatch {
    Many(Vec<Value>),
    One(serde_json::Map<String, Value>),
}

impl RecordBatch {
    pub fn into_records(self) -> Vec<Value> {
        match self {
            RecordBatch::Many(records) => records,
            RecordBatch::One(record) => vec![Value::Object(record)],
        }
    }
}

impl Default for RecordBatch {
    fn default() -> Self {
        RecordBatch::Many(Vec::new())
    }
}

#[derive(Debug)]
enum ProcessError {
    Xlsx(XlsxError),
    Storage(StorageError),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Xlsx(e) => write!(f, "spreadsheet error: {}", e),
            ProcessError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl From<XlsxError> for ProcessError {
    fn from(e: XlsxError) -> Self {
        ProcessError::Xlsx(e)
    }
}

impl From<StorageError> for ProcessError {
    fn from(e: StorageError) -> Self {
        ProcessError::Storage(e)
    }
}

pub async fn index() -> &'static str {
    "Register service is running. POST transaction batches to /receive-data."
}

pub async fn receive_data(
    State(state): State<AppState>,
    Json(request): Json<ReceiveRequest>,
) -> Response {
    let file_name = request.file_name;
    let records = request.data.into_records();
    info!(
        file = %file_name,
        records = records.len(),
        "received transaction batch"
    );

    let settings = state.settings.clone();
    let task_file_name = file_name.clone();
    let outcome = task::spawn_blocking(move || {
        process_batch(&settings, &task_file_name, &records)
    })
    .await;

    match outcome {
        Ok(Ok((url, report))) => {
            info!(
                file = %file_name,
                rows = report.rows_written,
                groups = report.groups_closed,
                "register updated and uploaded"
            );
            Json(json!({
                "success": true,
                "message": "Data processed and uploaded successfully",
                "fileUrl": url,
            }))
            .into_response()
        }
        Ok(Err(e)) => {
            error!(file = %file_name, error = %e, "failed to process batch");
            internal_error()
        }
        Err(e) => {
            error!(file = %file_name, error = %e, "worker task failed");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "Internal server error",
        })),
    )
        .into_response()
}

fn object_key(file_name: &str) -> String {
    format!("uploads/{}.xlsx", file_name)
}

/// Runs on the blocking pool: template load, register fill, export,
/// upload, presign.
fn process_batch(
    settings: &Settings,
    file_name: &str,
    records: &[Value],
) -> Result<(String, FillReport), ProcessError> {
    let mut workbook = kassa_io::import(&settings.template_path)?;
    let layout = RegisterLayout::default();
    let report = fill_register(workbook.active_sheet_mut(), &layout, records);
    let bytes = kassa_io::export_to_buffer(&workbook)?;

    let store = ObjectStore::new(
        &settings.s3_endpoint,
        settings.s3_region.clone(),
        settings.s3_bucket.clone(),
        settings.s3_access_key.clone(),
        settings.s3_secret_key.clone(),
    )?;
    let key = object_key(file_name);
    store.put_object(&key, bytes, XLSX_CONTENT_TYPE)?;
    let url = store.presign_get(&key, LINK_TTL_SECS);
    Ok((url, report))
}

pub async fn download_latest(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.settings.template_path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"Updated.xlsx\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(
                path = %state.settings.template_path.display(),
                error = %e,
                "failed to read template file"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response()
        }
    }
}

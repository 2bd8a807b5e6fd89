//! Spreadsheet import endpoint and the matching template download.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use super::types::UploadReport;
use super::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, ImportError};
use crate::importer::pipeline::import_rows;
use crate::importer::sheet::rows_from_workbook;

/// Accepted upload extensions.
const EXCEL_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".xlsm"];

/// `POST /api/upload-excel`
///
/// Reads the transposed registration workbook, validates every record
/// and imports the batch all-or-nothing. The response always carries the
/// outcome summary; only an unreadable file or a broken transaction is
/// an HTTP error.
pub async fn upload_excel(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReport>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {e}")))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let name = file_name.unwrap_or_default();
    let lowered = name.to_lowercase();
    if !EXCEL_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
        return Err(ApiError::BadRequest(
            "Invalid file format. Please upload Excel file (.xlsx or .xls)".to_string(),
        ));
    }

    info!(file = %name, size = bytes.len(), "upload received");

    let rows = rows_from_workbook(&bytes).map_err(ImportError::from)?;
    let outcome = import_rows(&state.pool, &rows).await?;

    Ok(Json(UploadReport {
        message: outcome.message(),
        count: outcome.committed,
        errors: outcome.reported_errors().to_vec(),
    }))
}

/// `GET /api/export-template`
///
/// Serves the fill-in workbook the import expects.
pub async fn export_template(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let path = &state.config.template_path;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Cannot read template '{path}': {e}")))?;

    let file_name = path.rsplit('/').next().unwrap_or("LansiaTemplate.xlsm");
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.ms-excel.sheet.macroEnabled.12".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}

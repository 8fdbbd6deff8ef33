use attain_core::model::ScriptImage;
use attain_core::rubric::Rubric;
use attain_core::AttainError;
use axum::extract::{Multipart, State};
use axum::Json;

use crate::error::ApiError;
use crate::grading::responses::ProcessResponse;
use crate::AppState;

const MISSING_FILES: &str = "Rubric or script files missing.";

struct Upload {
    rubric: Option<(String, Vec<u8>)>,
    scripts: Vec<ScriptImage>,
}

/// Reads the `rubric` file field and every `scripts` file field. Empty file
/// parts (an unfilled form input) are dropped.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload {
        rubric: None,
        scripts: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();

        match name.as_str() {
            "rubric" => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload.rubric = Some((file_name, bytes.to_vec()));
                }
            }
            "scripts" => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload.scripts.push(ScriptImage::new(file_name, bytes.to_vec()));
                }
            }
            other => tracing::debug!(event = "upload_field_ignored", field = other),
        }
    }

    Ok(upload)
}

pub async fn process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let upload = read_upload(&mut multipart).await?;

    let (rubric_name, rubric_bytes) = upload
        .rubric
        .ok_or_else(|| AttainError::InvalidInput(MISSING_FILES.to_string()))?;
    if upload.scripts.is_empty() {
        return Err(AttainError::InvalidInput(MISSING_FILES.to_string()).into());
    }

    tracing::info!(
        event = "process_request",
        rubric = %rubric_name,
        scripts = upload.scripts.len()
    );

    let rubric = Rubric::load(&rubric_name, &rubric_bytes)?;
    let outcome = state.processor.process(&rubric, upload.scripts).await?;

    Ok(Json(outcome.into()))
}

//! Share-target intercept handler.

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::worker::{review_redirect, store_shared, ShareOutcome, SharedPart, WorkerError};

use super::super::state::AppState;

/// Multipart field name carrying file parts, repeatable.
const FILES_FIELD: &str = "files";

/// Handle an intercepted share submission.
///
/// Extracts every `files` part and persists it to the durable store, then
/// answers with a 303 redirect to the queue-review page whatever happened;
/// the submission never falls through to a dead network request. Success or
/// failure travels in the `saved` query parameter.
pub async fn share_submission(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let outcome = extract_and_store(&state, multipart).await;
    if let Err(ref e) = outcome {
        tracing::warn!(error = %e, "share submission failed, redirecting with error flag");
    }
    let target = review_redirect(&state.intercept, &outcome);
    Redirect::to(&target).into_response()
}

async fn extract_and_store(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ShareOutcome, WorkerError> {
    let mut parts = Vec::new();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| WorkerError::ShareExtractionFailed(e.to_string()))?;
        let Some(field) = field else {
            break;
        };

        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .unwrap_or("unnamed")
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| WorkerError::ShareExtractionFailed(e.to_string()))?
            .to_vec();

        parts.push(SharedPart {
            name,
            mime_type,
            bytes,
        });
    }

    store_shared(&state.store, parts)
}

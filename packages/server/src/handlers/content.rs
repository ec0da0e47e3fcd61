use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use quire_common::ArtifactId;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::content::{ContentResponse, RegisterContentRequest};
use crate::registry::{FetchedArtifact, RegistrationOutcome};
use crate::state::AppState;

const EPUB_CONTENT_TYPE: &str = "application/epub+zip";

#[utoipa::path(
    post,
    path = "/{content_id}",
    tag = "Contents",
    operation_id = "ingestContent",
    summary = "Encrypt and register a raw upload",
    description = "Streams the request body to a scratch file, encrypts it using the path \
        segment as disposition name and registers the result under a freshly generated \
        content id, which is returned.",
    params(("content_id" = String, Path, description = "Disposition file name for the new content")),
    request_body(content_type = "application/octet-stream", description = "Plaintext EPUB bytes"),
    responses(
        (status = 201, description = "Content registered; body is the new content id", body = String),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Encryption or storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, body), fields(name = %name))]
pub async fn ingest_content(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    let staged = state.publications.stage(body.into_data_stream()).await?;
    let id = state.publications.ingest_content(&name, staged).await?;
    Ok((StatusCode::CREATED, Json(id.into_string())))
}

#[utoipa::path(
    put,
    path = "/{content_id}",
    tag = "Contents",
    operation_id = "registerContent",
    summary = "Register an encrypted file",
    description = "Copies the encrypted file at `protected-content-location` into the blob store \
        under `content_id`, then inserts or replaces its metadata. Re-registering an id replaces \
        both its bytes and every metadata field; omitted optional fields reset to unknown.",
    params(("content_id" = String, Path, description = "Content id")),
    request_body = RegisterContentRequest,
    responses(
        (status = 201, description = "Content created"),
        (status = 200, description = "Existing content replaced"),
        (status = 400, description = "Invalid id, payload or unreadable location (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(content_id = %content_id))]
pub async fn register_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    AppJson(payload): AppJson<RegisterContentRequest>,
) -> Result<StatusCode, AppError> {
    let id = ArtifactId::parse(&content_id)?;
    let artifact = payload.into_artifact()?;

    let outcome = state.registry.register_artifact(&id, &artifact).await?;

    Ok(match outcome {
        RegistrationOutcome::Created => StatusCode::CREATED,
        RegistrationOutcome::Updated => StatusCode::OK,
    })
}

#[utoipa::path(
    get,
    path = "/{content_id}",
    tag = "Contents",
    operation_id = "getContent",
    summary = "Download encrypted content",
    description = "Streams the stored encrypted bytes. Content that is catalogued but missing \
        from the blob store is reported as INTEGRITY_ERROR, never as not found.",
    params(("content_id" = String, Path, description = "Content id")),
    responses(
        (status = 200, description = "Encrypted EPUB", content_type = "application/epub+zip"),
        (status = 400, description = "Invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Blob missing for catalogued content (INTEGRITY_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(content_id = %content_id))]
pub async fn get_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<Response, AppError> {
    let id = ArtifactId::parse(&content_id)?;
    let fetched = state.registry.fetch_artifact(&id).await?;
    build_content_response(fetched)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Contents",
    operation_id = "listContents",
    summary = "List registered content",
    description = "Returns every content record, oldest first. Keys are never included.",
    responses(
        (status = 200, description = "Content list", body = Vec<ContentResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_contents(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentResponse>>, AppError> {
    let records = state.registry.list_contents().await?;
    Ok(Json(records.into_iter().map(ContentResponse::from).collect()))
}

/// Build a streaming response over a fetched artifact.
fn build_content_response(fetched: FetchedArtifact) -> Result<Response, AppError> {
    let FetchedArtifact { record, blob } = fetched;
    // The declared length is advisory; only the stored size matches the body.
    let length = blob.size;
    if let Some(declared) = record.known_length()
        && declared != length
    {
        tracing::warn!(
            content_id = %record.id,
            declared,
            stored = length,
            "Serving stored size instead of declared length"
        );
    }
    let filename = if record.location.is_empty() {
        record.id.as_str()
    } else {
        record.location.as_str()
    };

    let body = Body::from_stream(ReaderStream::new(blob.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, EPUB_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, length.to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition_value(filename))
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

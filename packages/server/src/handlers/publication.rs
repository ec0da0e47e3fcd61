use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::publication::{
    CreatePublicationRequest, PublicationResponse, TitleQuery, UpdatePublicationRequest,
    UploadResponse,
};
use crate::models::shared::{PageQuery, PageRequest};
use crate::pipeline::StagedUpload;
use crate::state::AppState;

/// Public path used in pagination links.
pub const PUBLICATIONS_PATH: &str = "/api/v1/publications";

/// Multipart uploads are bounded by the storage limit, not axum's default.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::disable()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Publications",
    operation_id = "listPublications",
    summary = "List publications",
    description = "Returns one page of publications ordered by id. A `Link` header with \
        `rel=\"next\"` is sent whenever the page is non-empty, and one with `rel=\"previous\"` \
        whenever `page > 1`.",
    params(PageQuery),
    responses(
        (status = 200, description = "Publication page", body = Vec<PublicationResponse>),
        (status = 400, description = "Invalid pagination (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_publications(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::from_query(&query)?;
    let records = state.publications.list(page.index(), page.per_page).await?;

    let mut headers = HeaderMap::new();
    for link in page.link_headers(PUBLICATIONS_PATH, records.len()) {
        let value = HeaderValue::from_str(&link)
            .map_err(|e| AppError::Internal(format!("Invalid Link header: {e}")))?;
        headers.append(header::LINK, value);
    }

    let body: Vec<PublicationResponse> =
        records.into_iter().map(PublicationResponse::from).collect();
    Ok((headers, Json(body)))
}

#[utoipa::path(
    get,
    path = "/check-by-title",
    tag = "Publications",
    operation_id = "checkPublicationByTitle",
    summary = "Find a publication by exact title",
    params(TitleQuery),
    responses(
        (status = 200, description = "Publication found", body = PublicationResponse),
        (status = 400, description = "Missing title (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No publication with that title (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(title = %query.title))]
pub async fn check_by_title(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TitleQuery>,
) -> Result<Json<PublicationResponse>, AppError> {
    let record = state.publications.get_by_title(&query.title).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Publications",
    operation_id = "getPublication",
    summary = "Get a publication by id",
    params(("id" = i64, Path, description = "Publication ID")),
    responses(
        (status = 200, description = "Publication details", body = PublicationResponse),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicationResponse>, AppError> {
    Ok(Json(state.publications.get(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Publications",
    operation_id = "createPublication",
    summary = "Create a publication from a master file",
    description = "Encrypts `masterFilename` from the master repository, registers the artifact \
        under a new content id with the title's slug as disposition, then records the \
        publication in `draft` status. Nothing is recorded if encryption or registration fails.",
    request_body = CreatePublicationRequest,
    responses(
        (status = 201, description = "Publication created", body = PublicationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Master file not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Encryption or storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(title = %payload.title))]
pub async fn create_publication(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePublicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .publications
        .create(&payload.master_filename, &payload.title)
        .await?;
    Ok((StatusCode::CREATED, Json(PublicationResponse::from(record))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Publications",
    operation_id = "updatePublication",
    summary = "Rename a publication",
    description = "Replaces the title only. Status and the registered artifact are unchanged.",
    params(("id" = i64, Path, description = "Publication ID")),
    request_body = UpdatePublicationRequest,
    responses(
        (status = 200, description = "Publication updated", body = PublicationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdatePublicationRequest>,
) -> Result<Json<PublicationResponse>, AppError> {
    let record = state.publications.update(id, &payload.title).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Publications",
    operation_id = "deletePublication",
    summary = "Delete a publication",
    description = "Removes the master file and the publication record. The registered \
        content and its bytes remain available.",
    params(("id" = i64, Path, description = "Publication ID")),
    responses(
        (status = 204, description = "Publication deleted"),
        (status = 404, description = "Publication not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Master file could not be removed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.publications.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Publications",
    operation_id = "uploadPublicationFile",
    summary = "Encrypt and register an uploaded EPUB",
    description = "Streams the `file` multipart field to a scratch file, encrypts it with the \
        slug of `title` as disposition and registers it under a new content id. No publication \
        record is created.",
    params(TitleQuery),
    request_body(content_type = "multipart/form-data", description = "EPUB file in the `file` field"),
    responses(
        (status = 201, description = "Content registered", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Encryption or storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query, multipart), fields(title = %query.title))]
pub async fn upload_publication_file(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TitleQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut staged: Option<StagedUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(staged) = staged {
                    staged.discard().await;
                }
                return Err(AppError::Validation(format!("Multipart error: {e}")));
            }
        };
        if field.name() == Some("file") && staged.is_none() {
            staged = Some(state.publications.stage(field).await?);
        }
        // Ignore unknown fields.
    }

    let staged = staged.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let uploaded = state.publications.upload(&query.title, staged).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            content_id: uploaded.id.into_string(),
            disposition: uploaded.disposition,
        }),
    ))
}

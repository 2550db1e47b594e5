//! REST endpoints.
//!
//! Every resource kind shares one set of handlers; the `:kind` path segment
//! selects the [`ResourceService`](mediavault_core::ResourceService) to
//! dispatch to. Binary fetches support `binary=true|yes|1`; without it,
//! content and thumbnails are returned base64-encoded inside the response
//! envelope.

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use mediavault_core::{ListQuery, NewResource, ServiceError, UploadFile};
use mediavault_id::ResourceId;
use mediavault_types::{DetailMeta, ResourceKind, SortField, SortOrder, ThumbnailSize};

use crate::auth::AuthUser;
use crate::envelope::{ApiEnvelope, ApiFailure};
use crate::state::AppState;

/// Uploads are capped at 512 MiB.
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// MIME types served with an attachment disposition on named downloads.
const ATTACHMENT_MIMETYPES: &[&str] = &[
    "application/zip",
    "application/epub+zip",
    "application/x-msdownload",
];

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_summary,
        get_list,
        get_ids,
        post_resource,
        post_resource_detail,
        post_resource_contents,
        get_resource,
        put_resource,
        delete_resource,
        get_contents,
        post_content,
        get_content,
        put_content,
        delete_content,
        get_thumbnail,
        put_thumbnail,
        patch_thumbnail,
        get_address,
        get_user_profile,
        put_user_profile,
    ),
    components(schemas(ApiEnvelope))
)]
pub struct ApiDoc;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/user/profile", get(get_user_profile).put(put_user_profile))
        .route("/:kind", get(get_list).post(post_resource))
        .route("/:kind/summary", get(get_summary))
        .route("/:kind/ids", get(get_ids))
        .route("/:kind/detail", post(post_resource_detail))
        .route("/:kind/contents", post(post_resource_contents))
        .route(
            "/:kind/:resource_id",
            get(get_resource).put(put_resource).delete(delete_resource),
        )
        .route(
            "/:kind/:resource_id/contents",
            get(get_contents).post(post_content),
        )
        .route(
            "/:kind/:resource_id/contents/:content_id",
            get(get_content).put(put_content).delete(delete_content),
        )
        .route(
            "/:kind/:resource_id/contents/:content_id/exif",
            patch(patch_content_exif),
        )
        .route(
            "/:kind/:resource_id/contents/:content_id/:filename",
            get(get_content_file),
        )
        .route(
            "/:kind/:resource_id/thumbnail",
            get(get_thumbnail).put(put_thumbnail).patch(patch_thumbnail),
        )
        .route("/:kind/:resource_id/address", get(get_address))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_kind(op: &'static str, kind: &str) -> Result<ResourceKind, ApiFailure> {
    kind.parse().map_err(|_| {
        ApiFailure::from_service(
            op,
            ServiceError::not_found(
                "Unknown resource type.",
                format!("no such resource type: '{kind}'"),
            ),
        )
    })
}

fn parse_id(op: &'static str, raw: &str) -> Result<ResourceId, ApiFailure> {
    ResourceId::parse(raw).map_err(|e| {
        ApiFailure::from_service(
            op,
            ServiceError::validation("Invalid resource ID.", e.to_string()),
        )
    })
}

fn parse_content_id(op: &'static str, raw: &str) -> Result<u32, ApiFailure> {
    raw.parse().map_err(|_| {
        ApiFailure::from_service(
            op,
            ServiceError::validation(
                "Invalid Content ID format.",
                "content id must be a positive integer",
            ),
        )
    })
}

fn truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("yes") | Some("1")
    )
}

/// Parsed multipart form fields.
#[derive(Default)]
struct UploadParts {
    detail: Option<DetailMeta>,
    content: Option<UploadFile>,
    thumbnail: Option<UploadFile>,
}

async fn read_multipart(
    op: &'static str,
    mut multipart: Multipart,
) -> Result<UploadParts, ApiFailure> {
    let mut parts = UploadParts::default();

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            ApiFailure::bad_request(op, "Malformed multipart request.", e.to_string())
        })?;
        let Some(field) = field else { break };

        let name = field.name().unwrap_or_default().to_owned();
        let filename = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| {
                ApiFailure::bad_request(op, "Malformed multipart request.", e.to_string())
            })?
            .to_vec();

        match name.as_str() {
            "detail-file" => {
                let parsed: serde_json::Value =
                    serde_json::from_slice(&bytes).map_err(|e| {
                        ApiFailure::bad_request(
                            op,
                            "Invalid detail file format.",
                            format!("invalid detail-file JSON: {e}"),
                        )
                    })?;
                match parsed {
                    serde_json::Value::Object(map) if !map.is_empty() => {
                        parts.detail = Some(map);
                    }
                    _ => {
                        return Err(ApiFailure::bad_request(
                            op,
                            "Invalid metadata format.",
                            "metadata must be a non-empty JSON object",
                        ))
                    }
                }
            }
            "content-file" => parts.content = Some(UploadFile { filename, bytes }),
            "thumbnail-file" => parts.thumbnail = Some(UploadFile { filename, bytes }),
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(parts)
}

#[utoipa::path(get, path = "/health", responses((status = 200, body = ApiEnvelope)))]
async fn health() -> Response {
    ApiEnvelope::success("ok").into_response_with(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/{kind}/summary",
    tag = "resources",
    params(("kind" = String, Path, description = "Resource kind")),
    responses((status = 200, body = ApiEnvelope))
)]
async fn get_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(kind): Path<String>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_summary";
    let kind = parse_kind(OP, &kind)?;

    let summary = state
        .service(kind)
        .summary(&user)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success("Resources summary retrieved successfully.")
        .with_data(summary)
        .into_response_with(StatusCode::OK))
}

#[derive(serde::Deserialize)]
struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
    order: Option<String>,
    sort: Option<String>,
}

#[utoipa::path(
    get,
    path = "/{kind}",
    tag = "resources",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("page" = Option<u32>, Query, description = "Page number (with per_page)"),
        ("per_page" = Option<u32>, Query, description = "Items per page (with page)"),
        ("order" = Option<String>, Query, description = "asc or desc"),
        ("sort" = Option<String>, Query, description = "Sort field"),
    ),
    responses((status = 200, body = ApiEnvelope), (status = 400, body = ApiEnvelope))
)]
async fn get_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_list";
    let kind = parse_kind(OP, &kind)?;

    let order: SortOrder = match params.order.as_deref() {
        Some(raw) => raw.parse().map_err(|_| {
            ApiFailure::from_service(
                OP,
                ServiceError::validation(
                    "Invalid sort order parameter.",
                    format!("'{raw}' is not a valid order"),
                ),
            )
        })?,
        None => SortOrder::default(),
    };
    let sort: SortField = match params.sort.as_deref() {
        Some(raw) => raw.parse().map_err(|_| {
            ApiFailure::from_service(
                OP,
                ServiceError::validation(
                    "Invalid sorting field parameter.",
                    format!("'{raw}' is not a valid sort field"),
                ),
            )
        })?,
        None => SortField::default(),
    };

    let listing = state
        .service(kind)
        .list(
            &user,
            ListQuery {
                page: params.page,
                per_page: params.per_page,
                order,
                sort,
            },
        )
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    let data = json!({
        "resources": listing.resources,
        "total_items": listing.total_items,
        "page": listing.page.map_or(json!("all"), |page| json!(page)),
        "per_page": listing.per_page.map_or(json!("all"), |per| json!(per)),
    });

    Ok(ApiEnvelope::success("Resource list retrieved successfully.")
        .with_data(data)
        .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    get,
    path = "/{kind}/ids",
    tag = "resources",
    params(("kind" = String, Path, description = "Resource kind")),
    responses((status = 200, body = ApiEnvelope))
)]
async fn get_ids(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(kind): Path<String>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_ids";
    let kind = parse_kind(OP, &kind)?;

    let ids = state
        .service(kind)
        .ids(&user)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success("Resource list retrieved successfully.")
        .with_data(json!({ "resource_ids": ids }))
        .into_response_with(StatusCode::OK))
}

/// Which multipart fields a creation endpoint requires.
#[derive(Clone, Copy, PartialEq)]
enum CreateComponent {
    Any,
    DetailOnly,
    ContentOnly,
}

async fn create_resource(
    op: &'static str,
    state: AppState,
    user: String,
    kind: String,
    component: CreateComponent,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    let kind = parse_kind(op, &kind)?;
    let parts = read_multipart(op, multipart).await?;

    match component {
        CreateComponent::DetailOnly if parts.detail.is_none() => {
            return Err(ApiFailure::bad_request(
                op,
                "Metadata is required for this operation.",
                "missing detail-file",
            ));
        }
        CreateComponent::ContentOnly if parts.content.is_none() => {
            return Err(ApiFailure::bad_request(
                op,
                "Content file is required for this operation.",
                "missing content-file",
            ));
        }
        _ => {}
    }

    let created = state
        .service(kind)
        .create(
            &user,
            NewResource {
                detail: parts.detail,
                content: parts.content,
                thumbnail: parts.thumbnail,
            },
        )
        .map_err(|e| ApiFailure::from_service(op, e))?;

    let mut envelope = ApiEnvelope::success(format!("{kind} added successfully."))
        .with_resource_id(&created.resource_id);
    if let Some(content_id) = created.content_id {
        envelope = envelope.with_content_id(content_id);
    }

    Ok(envelope.into_response_with(StatusCode::CREATED))
}

#[utoipa::path(
    post,
    path = "/{kind}",
    tag = "resources",
    params(("kind" = String, Path, description = "Resource kind")),
    responses((status = 201, body = ApiEnvelope), (status = 400, body = ApiEnvelope))
)]
async fn post_resource(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    create_resource(
        "make_resource",
        state,
        user,
        kind,
        CreateComponent::Any,
        multipart,
    )
    .await
}

#[utoipa::path(
    post,
    path = "/{kind}/detail",
    tag = "resources",
    params(("kind" = String, Path, description = "Resource kind")),
    responses((status = 201, body = ApiEnvelope), (status = 400, body = ApiEnvelope))
)]
async fn post_resource_detail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    create_resource(
        "make_resource_detail",
        state,
        user,
        kind,
        CreateComponent::DetailOnly,
        multipart,
    )
    .await
}

#[utoipa::path(
    post,
    path = "/{kind}/contents",
    tag = "resources",
    params(("kind" = String, Path, description = "Resource kind")),
    responses((status = 201, body = ApiEnvelope), (status = 400, body = ApiEnvelope))
)]
async fn post_resource_contents(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    create_resource(
        "make_resource_content",
        state,
        user,
        kind,
        CreateComponent::ContentOnly,
        multipart,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/{kind}/{resource_id}",
    tag = "resources",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses((status = 200, body = ApiEnvelope), (status = 404, body = ApiEnvelope))
)]
async fn get_resource(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_meta";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let meta = state
        .service(kind)
        .get_meta(&user, &resource_id)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!(
        "Metadata for resource '{resource_id}' retrieved successfully."
    ))
    .with_resource_id(&resource_id)
    .with_meta(&meta)
    .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    put,
    path = "/{kind}/{resource_id}",
    tag = "resources",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses((status = 200, body = ApiEnvelope), (status = 404, body = ApiEnvelope))
)]
async fn put_resource(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    const OP: &str = "put_resource_detail";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let parts = read_multipart(OP, multipart).await?;
    let detail = parts.detail.ok_or_else(|| {
        ApiFailure::bad_request(OP, "Detail file is required.", "missing detail-file")
    })?;

    state
        .service(kind)
        .update_detail(&user, &resource_id, detail)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!(
        "Details for {kind} with ID '{resource_id}' updated successfully."
    ))
    .with_resource_id(&resource_id)
    .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    delete,
    path = "/{kind}/{resource_id}",
    tag = "resources",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses((status = 204), (status = 404, body = ApiEnvelope))
)]
async fn delete_resource(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "delete_resource";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    state
        .service(kind)
        .delete(&user, &resource_id)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/{kind}/{resource_id}/contents",
    tag = "contents",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses((status = 200, body = ApiEnvelope), (status = 404, body = ApiEnvelope))
)]
async fn get_contents(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_content_list";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let contents = state
        .service(kind)
        .content_list(&user, &resource_id)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!(
        "Content list for resource '{resource_id}' retrieved successfully."
    ))
    .with_resource_id(&resource_id)
    .with_data(contents)
    .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    post,
    path = "/{kind}/{resource_id}/contents",
    tag = "contents",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses(
        (status = 201, body = ApiEnvelope),
        (status = 400, body = ApiEnvelope),
        (status = 404, body = ApiEnvelope)
    )
)]
async fn post_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    const OP: &str = "post_resource_content_addition";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let parts = read_multipart(OP, multipart).await?;
    let file = parts.content.ok_or_else(|| {
        ApiFailure::bad_request(OP, "Content file is required.", "missing content-file")
    })?;

    let content_id = state
        .service(kind)
        .add_content(&user, &resource_id, file)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!(
        "New content added to {kind} with ID '{resource_id}'."
    ))
    .with_resource_id(&resource_id)
    .with_content_id(content_id)
    .into_response_with(StatusCode::CREATED))
}

#[derive(serde::Deserialize)]
struct ContentParams {
    binary: Option<String>,
    format: Option<String>,
}

fn content_response(
    payload: mediavault_core::ContentPayload,
    resource_id: &ResourceId,
    content_id: u32,
    binary: bool,
    disposition_filename: Option<&str>,
) -> Response {
    if let Some(filename) = disposition_filename {
        let disposition = if ATTACHMENT_MIMETYPES.contains(&payload.mimetype.as_str()) {
            format!("attachment; filename=\"{filename}\"")
        } else {
            format!("inline; filename=\"{filename}\"")
        };
        return (
            [
                (header::CONTENT_TYPE, payload.mimetype),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            payload.bytes,
        )
            .into_response();
    }

    if binary {
        return ([(header::CONTENT_TYPE, payload.mimetype)], payload.bytes).into_response();
    }

    let encoded = general_purpose::STANDARD.encode(&payload.bytes);
    ApiEnvelope::success("Resource content retrieved successfully.")
        .with_resource_id(resource_id)
        .with_content_id(content_id)
        .with_data(json!({ "content": encoded, "mimetype": payload.mimetype }))
        .into_response_with(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/{kind}/{resource_id}/contents/{content_id}",
    tag = "contents",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
        ("content_id" = u32, Path, description = "Content id"),
        ("binary" = Option<String>, Query, description = "Return raw bytes"),
        ("format" = Option<String>, Query, description = "Convert to this format"),
    ),
    responses((status = 200, body = ApiEnvelope), (status = 404, body = ApiEnvelope))
)]
async fn get_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id, content_id)): Path<(String, String, String)>,
    Query(params): Query<ContentParams>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_content";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;
    let content_id = parse_content_id(OP, &content_id)?;

    let payload = state
        .service(kind)
        .fetch_content(&user, &resource_id, content_id, params.format.as_deref())
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(content_response(
        payload,
        &resource_id,
        content_id,
        truthy(params.binary.as_deref()),
        None,
    ))
}

#[utoipa::path(
    put,
    path = "/{kind}/{resource_id}/contents/{content_id}",
    tag = "contents",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
        ("content_id" = u32, Path, description = "Content id"),
    ),
    responses(
        (status = 200, body = ApiEnvelope),
        (status = 400, body = ApiEnvelope),
        (status = 404, body = ApiEnvelope)
    )
)]
async fn put_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id, content_id)): Path<(String, String, String)>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    const OP: &str = "put_resource_content";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;
    let content_id = parse_content_id(OP, &content_id)?;

    let parts = read_multipart(OP, multipart).await?;
    let file = parts.content.ok_or_else(|| {
        ApiFailure::bad_request(OP, "Content file is required.", "missing content-file")
    })?;

    state
        .service(kind)
        .update_content(&user, &resource_id, content_id, file)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!(
        "Content with ID '{content_id}' updated for {kind} with ID '{resource_id}'."
    ))
    .with_resource_id(&resource_id)
    .with_content_id(content_id)
    .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    delete,
    path = "/{kind}/{resource_id}/contents/{content_id}",
    tag = "contents",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
        ("content_id" = u32, Path, description = "Content id"),
    ),
    responses((status = 204), (status = 404, body = ApiEnvelope))
)]
async fn delete_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id, content_id)): Path<(String, String, String)>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "delete_resource_content";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;
    let content_id = parse_content_id(OP, &content_id)?;

    state
        .service(kind)
        .delete_content(&user, &resource_id, content_id)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn get_content_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id, content_id, filename)): Path<(String, String, String, String)>,
    Query(params): Query<ContentParams>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_content_file";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;
    let content_id = parse_content_id(OP, &content_id)?;

    let payload = state
        .service(kind)
        .fetch_content(&user, &resource_id, content_id, params.format.as_deref())
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(content_response(
        payload,
        &resource_id,
        content_id,
        true,
        Some(&filename),
    ))
}

async fn patch_content_exif(
    State(_state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path((_kind, _resource_id, _content_id)): Path<(String, String, String)>,
) -> ApiFailure {
    ApiFailure::from_service(
        "patch_content_exif",
        ServiceError::unsupported(
            "Updating content EXIF data is not supported.",
            "exif patching is not implemented",
        ),
    )
}

#[derive(serde::Deserialize)]
struct ThumbnailParams {
    size: Option<String>,
    binary: Option<String>,
}

#[utoipa::path(
    get,
    path = "/{kind}/{resource_id}/thumbnail",
    tag = "thumbnails",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
        ("size" = Option<String>, Query, description = "original, small, medium or large"),
        ("binary" = Option<String>, Query, description = "Return raw bytes"),
    ),
    responses((status = 200, body = ApiEnvelope), (status = 404, body = ApiEnvelope))
)]
async fn get_thumbnail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
    Query(params): Query<ThumbnailParams>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_thumbnail";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let size: ThumbnailSize = match params.size.as_deref() {
        Some(raw) => raw.trim().to_ascii_lowercase().parse().map_err(|_| {
            ApiFailure::from_service(
                OP,
                ServiceError::validation(
                    "Invalid thumbnail size parameter.",
                    format!("'{raw}' is not a valid thumbnail size"),
                ),
            )
        })?,
        None => ThumbnailSize::default(),
    };

    let bytes = state
        .service(kind)
        .thumbnail(&user, &resource_id, size)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    if truthy(params.binary.as_deref()) {
        return Ok(([(header::CONTENT_TYPE, "image/webp")], bytes).into_response());
    }

    let encoded = general_purpose::STANDARD.encode(&bytes);
    Ok(ApiEnvelope::success(format!(
        "Thumbnail for resource '{resource_id}' retrieved successfully."
    ))
    .with_resource_id(&resource_id)
    .with_data(json!({ "thumbnail": encoded }))
    .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    put,
    path = "/{kind}/{resource_id}/thumbnail",
    tag = "thumbnails",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses(
        (status = 200, body = ApiEnvelope),
        (status = 400, body = ApiEnvelope),
        (status = 404, body = ApiEnvelope)
    )
)]
async fn put_thumbnail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, ApiFailure> {
    const OP: &str = "put_resource_thumbnail";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let parts = read_multipart(OP, multipart).await?;
    let file = parts.thumbnail.ok_or_else(|| {
        ApiFailure::bad_request(OP, "Thumbnail file is required.", "missing thumbnail-file")
    })?;

    state
        .service(kind)
        .set_thumbnail(&user, &resource_id, file)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!(
        "Thumbnail for resource '{resource_id}' updated successfully."
    ))
    .with_resource_id(&resource_id)
    .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    patch,
    path = "/{kind}/{resource_id}/thumbnail",
    tag = "thumbnails",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses(
        (status = 200, body = ApiEnvelope),
        (status = 400, body = ApiEnvelope),
        (status = 404, body = ApiEnvelope)
    )
)]
async fn patch_thumbnail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
    body: Option<Json<serde_json::Value>>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "patch_resource_thumbnail";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let angle = body
        .as_ref()
        .and_then(|Json(body)| body.get("angle"))
        .ok_or_else(|| {
            ApiFailure::bad_request(OP, "Missing angle parameter.", "missing angle parameter")
        })?;
    let angle: i32 = angle
        .as_i64()
        .or_else(|| angle.as_str().and_then(|raw| raw.trim().parse().ok()))
        .and_then(|value| i32::try_from(value).ok())
        .ok_or_else(|| {
            ApiFailure::bad_request(OP, "Invalid angle parameter.", "angle must be an integer")
        })?;

    state
        .service(kind)
        .rotate_thumbnail(&user, &resource_id, angle)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success(format!("Thumbnail rotated by {angle} degrees."))
        .with_resource_id(&resource_id)
        .into_response_with(StatusCode::OK))
}

#[utoipa::path(
    get,
    path = "/{kind}/{resource_id}/address",
    tag = "resources",
    params(
        ("kind" = String, Path, description = "Resource kind"),
        ("resource_id" = String, Path, description = "Resource id"),
    ),
    responses(
        (status = 200, body = ApiEnvelope),
        (status = 404, body = ApiEnvelope),
        (status = 501, body = ApiEnvelope)
    )
)]
async fn get_address(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, resource_id)): Path<(String, String)>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_resource_address";
    let kind = parse_kind(OP, &kind)?;
    let resource_id = parse_id(OP, &resource_id)?;

    let address = state
        .service(kind)
        .address(&user, &resource_id)
        .map_err(|e| ApiFailure::from_service(OP, e))?;

    Ok(ApiEnvelope::success("Address resolved successfully.")
        .with_resource_id(&resource_id)
        .with_data(json!({ "address": address }))
        .into_response_with(StatusCode::OK))
}

#[utoipa::path(get, path = "/user/profile", tag = "users", responses((status = 200, body = ApiEnvelope)))]
async fn get_user_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, ApiFailure> {
    const OP: &str = "get_user_profile";

    let profile = state
        .backend()
        .load_user_profile(&user)
        .map_err(|e| ApiFailure::from_service(OP, ServiceError::Storage(e)))?
        .unwrap_or_else(|| json!({}));

    Ok(ApiEnvelope::success("User profile retrieved successfully.")
        .with_data(profile)
        .into_response_with(StatusCode::OK))
}

#[utoipa::path(put, path = "/user/profile", tag = "users", responses((status = 200, body = ApiEnvelope), (status = 400, body = ApiEnvelope)))]
async fn put_user_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Option<Json<serde_json::Value>>,
) -> Result<Response, ApiFailure> {
    const OP: &str = "put_user_profile";

    let profile = match body {
        Some(Json(value)) if value.is_object() => value,
        _ => {
            return Err(ApiFailure::bad_request(
                OP,
                "Invalid profile format.",
                "profile must be a JSON object",
            ))
        }
    };

    state
        .backend()
        .save_user_profile(&user, &profile)
        .map_err(|e| ApiFailure::from_service(OP, ServiceError::Storage(e)))?;

    Ok(ApiEnvelope::success("User profile updated successfully.")
        .into_response_with(StatusCode::OK))
}

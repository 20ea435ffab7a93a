use crate::controller::CollectionController;
use crate::error::AppError;
use crate::info;
use crate::notify::{NotificationKind, Notifier};
use crate::record::Record;
use crate::schema::{FieldDescriptor, SchemaRegistry};
use crate::session::SessionManager;
use crate::store::DataStore;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

// Our own JSON extractor wrapping `axum::Json`, so rejections are formatted
// through AppError like every other failure.
#[derive(axum::extract::FromRequest, Deserialize)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::JsonRejection(rej) => rej.body_text(),
            other                        => other.to_string(),
        };
        (status, AppJson(ErrorResponse { message, code: status.as_u16() })).into_response()
    }
}

#[derive(Clone)]
pub struct RequestState {
    pub registry: Arc<SchemaRegistry>,
    pub store: Arc<dyn DataStore>,
    pub sessions: Arc<SessionManager>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(OpenApi)]
#[openapi(info(title = "adminbit", description = "Schema-driven admin console backend", license(name = "MIT")))]
pub struct ApiDoc;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(IntoParams, Serialize, Deserialize, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against every field of every record.
    pub search: Option<String>,
}

/// One collection as the table UI consumes it: schema-derived columns plus
/// the (possibly filtered) rows.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CollectionView {
    pub collection: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub total: usize,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(http::header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// Session gate: every collection route is reachable only with a live token.
fn authorize(state: &RequestState, headers: &HeaderMap) -> Result<(), AppError> {
    match bearer_token(headers) {
        Some(token) if state.sessions.is_authenticated(token) => Ok(()),
        _ => Err(AppError::Unauthorized("missing or invalid session token".to_string())),
    }
}

fn controller_for(state: &RequestState, name: &str) -> Result<CollectionController, AppError> {
    if !state.registry.contains(name) {
        return Err(AppError::NotFound(format!("unknown collection `{name}`")));
    }
    Ok(CollectionController::new(
        name,
        Arc::clone(&state.registry),
        Arc::clone(&state.store),
        Arc::clone(&state.notifier),
    ))
}

#[utoipa::path(
    post,
    path = "/session",
    request_body = LoginRequest,
    responses((status = OK, body = TokenResponse), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Session"
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<RequestState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<AppJson<TokenResponse>, AppError> {
    match state.sessions.login(&request.username, &request.password) {
        Ok(token) => {
            state.notifier.notify(NotificationKind::Success, "Login successful", "welcome to the admin console");
            Ok(AppJson(TokenResponse { token }))
        }
        Err(e) => {
            state.notifier.notify(NotificationKind::Error, "Authentication failed", "invalid username or password");
            Err(e)
        }
    }
}

#[utoipa::path(
    delete,
    path = "/session",
    responses((status = NO_CONTENT), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Session"
)]
#[axum::debug_handler]
pub async fn logout(State(state): State<RequestState>, headers: HeaderMap) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing session token".to_string()))?;
    state.sessions.logout(token)?;
    state.notifier.notify(NotificationKind::Success, "Logout successful", "session closed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/collections",
    responses((status = OK, body = Vec<String>), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Collections"
)]
#[axum::debug_handler]
pub async fn list_collections(
    State(state): State<RequestState>,
    headers: HeaderMap,
) -> Result<AppJson<Vec<String>>, AppError> {
    authorize(&state, &headers)?;
    Ok(AppJson(state.registry.collection_names()))
}

#[utoipa::path(
    get,
    path = "/collections/{name}/schema",
    params(("name" = String, Path, description = "Collection name")),
    responses((status = OK, body = Vec<FieldDescriptor>), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Collections"
)]
#[axum::debug_handler]
pub async fn collection_schema(
    State(state): State<RequestState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<AppJson<Vec<FieldDescriptor>>, AppError> {
    authorize(&state, &headers)?;
    if !state.registry.contains(&name) {
        return Err(AppError::NotFound(format!("unknown collection `{name}`")));
    }
    Ok(AppJson(state.registry.fields(&name).to_vec()))
}

#[utoipa::path(
    get,
    path = "/collections/{name}",
    params(("name" = String, Path, description = "Collection name"), SearchQuery),
    responses((status = OK, body = CollectionView), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Collections"
)]
#[axum::debug_handler]
pub async fn list_records(
    State(state): State<RequestState>,
    Path(name): Path<String>,
    Query(query): Query<SearchQuery>,
    headers: HeaderMap,
) -> Result<AppJson<CollectionView>, AppError> {
    authorize(&state, &headers)?;
    let mut controller = controller_for(&state, &name)?;
    if !controller.load().await {
        return Err(AppError::Custom(format!("could not load collection `{name}`")));
    }
    let rows = controller.search(query.search.as_deref().unwrap_or(""));
    let total = rows.len();
    Ok(AppJson(CollectionView { collection: name, columns: controller.columns(), rows, total }))
}

#[utoipa::path(
    post,
    path = "/collections/{name}",
    request_body = Record,
    params(("name" = String, Path, description = "Collection name")),
    responses((status = CREATED, body = Record), (status = BAD_REQUEST, body = ErrorResponse), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Collections"
)]
#[axum::debug_handler]
pub async fn create_record(
    State(state): State<RequestState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    AppJson(payload): AppJson<Value>,
) -> Result<(StatusCode, AppJson<Record>), AppError> {
    authorize(&state, &headers)?;
    let mut controller = controller_for(&state, &name)?;
    if !controller.load().await {
        return Err(AppError::Custom(format!("could not load collection `{name}`")));
    }
    controller.begin_create();
    let fields = state.registry.fields(&name);
    {
        let form = controller
            .form_mut()
            .ok_or_else(|| AppError::Custom("editing session not open".to_string()))?;
        form.apply_json(fields, &payload)?;
        form.validate_required(fields)?;
    }
    let saved = controller
        .save()
        .await
        .ok_or_else(|| AppError::Custom(format!("could not save record into `{name}`")))?;
    Ok((StatusCode::CREATED, AppJson(saved)))
}

#[utoipa::path(
    put,
    path = "/collections/{name}/{id}",
    request_body = Record,
    params(("name" = String, Path, description = "Collection name"), ("id" = u64, Path, description = "Record id")),
    responses((status = OK, body = Record), (status = BAD_REQUEST, body = ErrorResponse), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Collections"
)]
#[axum::debug_handler]
pub async fn update_record(
    State(state): State<RequestState>,
    Path((name, id)): Path<(String, u64)>,
    headers: HeaderMap,
    AppJson(payload): AppJson<Value>,
) -> Result<AppJson<Record>, AppError> {
    authorize(&state, &headers)?;
    let mut controller = controller_for(&state, &name)?;
    if !controller.load().await {
        return Err(AppError::Custom(format!("could not load collection `{name}`")));
    }
    let target = controller
        .rows()
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no record with id {id} in `{name}`")))?;
    controller.begin_edit(&target);
    let fields = state.registry.fields(&name);
    {
        let form = controller
            .form_mut()
            .ok_or_else(|| AppError::Custom("editing session not open".to_string()))?;
        form.apply_json(fields, &payload)?;
        form.validate_required(fields)?;
    }
    let saved = controller
        .save()
        .await
        .ok_or_else(|| AppError::Custom(format!("could not save record into `{name}`")))?;
    Ok(AppJson(saved))
}

#[utoipa::path(
    delete,
    path = "/collections/{name}/{id}",
    params(("name" = String, Path, description = "Collection name"), ("id" = u64, Path, description = "Record id")),
    responses((status = NO_CONTENT), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Collections"
)]
#[axum::debug_handler]
pub async fn delete_record(
    State(state): State<RequestState>,
    Path((name, id)): Path<(String, u64)>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    authorize(&state, &headers)?;
    let mut controller = controller_for(&state, &name)?;
    if !controller.delete(id).await {
        return Err(AppError::Custom(format!("could not delete record {id} from `{name}`")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn build_router(state: RequestState, extras: Option<OpenApiRouter<RequestState>>, cors: Option<CorsLayer>) -> Router<()> {
    let mut router: OpenApiRouter<RequestState> = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(login, logout))
        .routes(routes!(list_collections))
        .routes(routes!(collection_schema))
        .routes(routes!(list_records, create_record))
        .routes(routes!(update_record, delete_record));

    if let Some(extra) = extras {
        router = router.merge(extra);
    }
    let (r, openapi) = router.split_for_parts();

    let merged = r
        .merge(SwaggerUi::new("/swagger-ui").url("/apidoc/openapi.json", openapi))
        .with_state(state);
    if let Some(cors_layer) = cors {
        merged.layer(cors_layer)
    } else {
        merged
    }
}

pub async fn serve(
    state: RequestState,
    socket_addr: SocketAddr,
    extras: Option<OpenApiRouter<RequestState>>,
    cors: Option<CorsLayer>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let router: Router<()> = build_router(state, extras, cors);
    let tcp = TcpListener::bind(socket_addr).await?;

    let mut shutdown = shutdown.clone();
    axum::serve(tcp, router)
        .with_graceful_shutdown(async move {
            if shutdown.changed().await.is_ok() {
                info!("Shutting down server...");
            }
        })
        .await?;
    Ok(())
}

//! API Routes
//!
//! HTTP endpoint definitions. Each route unwraps the `{ "user": ... }`
//! envelope, dispatches a command, and wraps the result the same way.

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::dispatch::Dispatcher;
use crate::domain::{OperationContext, UserProfile};
use crate::error::AppError;
use crate::handlers::{AuthenticateUserCommand, CreateUserCommand};

// =========================================================================
// Request/Response types
// =========================================================================

/// Missing fields arrive empty so validation can report all of them
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub user: NewUser,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user: LoginUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<Dispatcher> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/login", post(login))
}

/// Unparseable JSON or a missing `user` envelope
fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::InvalidRequest(rejection.body_text())
}

// =========================================================================
// POST /users
// =========================================================================

/// Register a new user
async fn create_user(
    State(dispatcher): State<Dispatcher>,
    context: Option<Extension<OperationContext>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(request) = body.map_err(reject_body)?;
    let NewUser {
        email,
        username,
        password,
    } = request.user;
    let command = CreateUserCommand::new(email, username, password);

    let context = context.map(|Extension(c)| c).unwrap_or_default();
    let user = dispatcher.dispatch_with(command, &context).await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

// =========================================================================
// POST /users/login
// =========================================================================

/// Check credentials and return the user
async fn login(
    State(dispatcher): State<Dispatcher>,
    context: Option<Extension<OperationContext>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(request) = body.map_err(reject_body)?;
    let command = AuthenticateUserCommand::new(request.user.email, request.user.password);

    let context = context.map(|Extension(c)| c).unwrap_or_default();
    let user = dispatcher.dispatch_with(command, &context).await?;

    Ok(Json(UserResponse { user }))
}

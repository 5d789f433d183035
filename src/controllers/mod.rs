use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::{ActionResult, ErrorKind},
    models::Session,
};

pub mod home_controller;
pub mod watchlist_controller;
pub mod alerts_controller;

/// Handlers mounted without the session middleware see no extension; that
/// is the same as being logged out.
fn session_of(ext: Option<Extension<Session>>) -> Session {
    ext.map(|Extension(s)| s).unwrap_or_default()
}

fn action_response<T: Serialize>(res: ActionResult<T>) -> Response {
    let status = if res.is_unauthenticated() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    (status, Json(res)).into_response()
}

/// A body that does not parse is answered like any other invalid input:
/// 200 with the usual failure shape.
fn rejected_body(session: &Session, rejection: JsonRejection, message: &str) -> Response {
    if session.user().is_none() {
        return action_response(ActionResult::<()>::failure(
            ErrorKind::NotAuthenticated,
            "Not authenticated",
        ));
    }

    tracing::debug!(error = %rejection, "rejected request body");
    action_response(ActionResult::<()>::failure(ErrorKind::InvalidInput, message))
}

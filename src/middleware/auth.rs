use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    models::{Session, SessionUser},
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

/// Turns the session cookie of a request into a [`Session`].
#[derive(Clone)]
pub struct SessionResolver {
    jwt_secret: String,
    cookie_name: String,
}

impl SessionResolver {
    pub fn new(jwt_secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.jwt_secret.clone(), settings.jwt_cookie_name.clone())
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Missing, malformed or expired tokens all resolve to
    /// `Session::Anonymous`.
    pub fn resolve(&self, headers: &HeaderMap) -> Session {
        let jar = CookieJar::from_headers(headers);
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Session::Anonymous;
        };

        self.resolve_token(cookie.value())
    }

    pub fn resolve_token(&self, token: &str) -> Session {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        );

        match decoded {
            Ok(data) if !data.claims.sub.trim().is_empty() => Session::Authenticated(SessionUser {
                id: data.claims.sub,
                email: data.claims.email,
                name: data.claims.name,
            }),
            Ok(_) => Session::Anonymous,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring session token");
                Session::Anonymous
            }
        }
    }

    /// Mints a session token for `user`, valid for `days`.
    pub fn issue_token(&self, user: &SessionUser, days: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + Duration::days(days)).timestamp().max(0) as usize;

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
    }
}

pub async fn inject_session(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let session = state.sessions.resolve(req.headers());

    // Store the session in request extensions so handlers can access it
    req.extensions_mut().insert(session);

    next.run(req).await
}

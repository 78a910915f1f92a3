//! Typed client for the invite endpoints, used by the dashboard's
//! server-side rendering layer and by integration tooling.
//!
//! The join endpoint's 409/403 responses are protocol branches, not
//! failures; `redeem` decodes them into [`JoinOutcome`] so the caller
//! renders the confirmation or owned-team screen and, when the user
//! approves, calls again with `confirm_switch` set.

use api_types::{InvitePreview, JoinOutcome, JoinRequest};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("invite code not found")]
    InvalidCode,
    #[error("invite has expired")]
    InviteExpired,
    #[error("invite has no uses remaining")]
    InviteExhausted,
    #[error("unexpected response ({status}): {message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

pub struct InviteClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl InviteClient {
    pub fn new(mut base_url: Url) -> Self {
        // Keep a trailing slash so Url::join appends instead of
        // replacing the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Invite details for the join page; works unauthenticated.
    pub async fn preview(&self, code: &str) -> Result<InvitePreview, ClientError> {
        let url = self.base_url.join(&format!("v1/join/{code}"))?;
        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status => Err(rejection(status, response).await),
        }
    }

    /// Run the join protocol once. Call again with `confirm_switch`
    /// after the user approves leaving their current team.
    pub async fn redeem(
        &self,
        code: &str,
        confirm_switch: bool,
        is_new_signup: bool,
    ) -> Result<JoinOutcome, ClientError> {
        let url = self.base_url.join("v1/join")?;
        let mut request = self.http.post(url).json(&JoinRequest {
            invite_code: code.to_string(),
            confirm_switch,
            is_new_signup,
        });
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::CONFLICT | StatusCode::FORBIDDEN => {
                Ok(response.json().await?)
            }
            status => Err(rejection(status, response).await),
        }
    }
}

async fn rejection(status: StatusCode, response: reqwest::Response) -> ClientError {
    let body: Option<ErrorBody> = response.json().await.ok();
    let kind = body.as_ref().map(|b| b.error.as_str()).unwrap_or("");
    match (status, kind) {
        (StatusCode::UNAUTHORIZED, _) => ClientError::Unauthenticated,
        (StatusCode::NOT_FOUND, _) => ClientError::InvalidCode,
        (StatusCode::GONE, "invite_exhausted") => ClientError::InviteExhausted,
        (StatusCode::GONE, _) => ClientError::InviteExpired,
        _ => ClientError::Api {
            status,
            message: body.map(|b| b.message).unwrap_or_default(),
        },
    }
}

/// Where to send an unauthenticated visitor: sign-up with the invite
/// code attached, so the same join flow runs right after registration.
pub fn signup_redirect_url(base: &Url, invite_code: &str) -> Url {
    let mut url = base.clone();
    url.set_path("/signup");
    url.query_pairs_mut()
        .clear()
        .append_pair("invite", invite_code);
    url
}

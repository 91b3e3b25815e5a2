use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use threadboard_shared::{
    endpoints, Comment, CommentDetail, CommentResponse, FetchFailure, FormErrors, ListQuery,
    Submission,
};
use wasm_bindgen::JsValue;
use web_sys::File;

use crate::config::BoardConfig;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Status(u16),
    #[error("not found")]
    NotFound,
    #[error("rejected by server: {0:?}")]
    Rejected(FormErrors),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
            other => ApiError::Network(other.to_string()),
        }
    }
}

impl From<ApiError> for FetchFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound => FetchFailure::NotFound,
            other => FetchFailure::Failed(other.to_string()),
        }
    }
}

fn js_error(value: JsValue) -> ApiError {
    ApiError::Network(format!("{:?}", value))
}

fn api_base() -> String {
    BoardConfig::current().api_base
}

async fn get<T: DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    let resp = Request::get(url).send().await?;
    check_status(&resp)?;
    Ok(resp.json().await?)
}

fn check_status(resp: &Response) -> Result<(), ApiError> {
    match resp.status() {
        404 => Err(ApiError::NotFound),
        _ if resp.ok() => Ok(()),
        status => Err(ApiError::Status(status)),
    }
}

/// GET /api/title-comments/?...
pub async fn list_comments(query: &ListQuery) -> Result<CommentResponse, ApiError> {
    get(&endpoints::list_url(&api_base(), query)).await
}

/// GET /api/title-comments/{id}/
pub async fn get_thread(id: i64) -> Result<CommentDetail, ApiError> {
    get(&endpoints::detail_url(&api_base(), id)).await
}

/// POST /api/comments/
///
/// A non-2xx response with a field-keyed body comes back as
/// [`ApiError::Rejected`].
pub async fn submit_comment(submission: Submission<File>) -> Result<Comment, ApiError> {
    let url = endpoints::create_url(&api_base());
    let req = if submission.is_multipart() {
        Request::post(&url).body(multipart_body(&submission)?)?
    } else {
        Request::post(&url).json(&submission.payload)?
    };

    let resp = req.send().await?;
    if !resp.ok() {
        let status = resp.status();
        return Err(match resp.json::<FormErrors>().await {
            Ok(errors) if !errors.is_empty() => ApiError::Rejected(errors),
            _ => ApiError::Status(status),
        });
    }

    Ok(resp.json().await?)
}

fn multipart_body(submission: &Submission<File>) -> Result<web_sys::FormData, ApiError> {
    let form = web_sys::FormData::new().map_err(js_error)?;
    let payload = &submission.payload;

    let fields = [
        ("username", payload.username.as_str()),
        ("email", payload.email.as_str()),
        ("home_page", payload.home_page.as_deref().unwrap_or("")),
        ("text", payload.text.as_str()),
        ("captcha_text", payload.captcha_text.as_str()),
    ];
    for (name, value) in fields {
        form.append_with_str(name, value).map_err(js_error)?;
    }

    for (name, attachment) in [("image", &submission.image), ("file", &submission.file)] {
        if let Some(file) = attachment {
            form.append_with_blob_and_filename(name, file, &file.name())
                .map_err(js_error)?;
        }
    }

    if let Some(parent_id) = payload.parent_id {
        form.append_with_str("parent_id", &parent_id.to_string())
            .map_err(js_error)?;
    }

    Ok(form)
}

/// Captcha image for the given challenge nonce.
pub fn captcha_url(nonce: u64) -> String {
    endpoints::captcha_url(&api_base(), nonce)
}

/// A cache-busting value for a new captcha challenge.
pub fn fresh_captcha_nonce() -> u64 {
    web_sys::js_sys::Date::now() as u64
}

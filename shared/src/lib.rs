use serde::{Deserialize, Serialize};

pub mod endpoints;
pub mod fetch;
pub mod form;
pub mod list;
pub mod thread;

pub use fetch::{FetchFailure, FetchState, RequestSeq, Ticket};
pub use form::{Field, FormController, FormData, FormErrors, FormPhase, Submission, SubmitBlocked};
pub use list::{FilterField, ListController, ListQuery, SortOrder, PAGE_SIZE};
pub use thread::{ReplyTarget, ThreadController, ThreadRow};

// ── Comments ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub home_page: Option<String>,
    pub text: String,
    pub created_at: String,
}

/// A comment together with its full reply tree, as served by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDetail {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(default)]
    pub replies: Vec<CommentDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Comment>,
}

/// JSON body for `POST /api/comments/` when no attachment is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateComment {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page: Option<String>,
    pub text: String,
    pub captcha_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

// ── Push channel ──

/// Broadcast hint sent after a local submission so other viewers re-fetch.
#[derive(Debug, Serialize)]
pub struct Announcement<'a> {
    pub message: &'a Comment,
}

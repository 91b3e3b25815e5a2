//! URL builders for the board API, captcha, push channel and client routes.

use crate::list::ListQuery;

fn trim(base: &str) -> &str {
    base.trim_end_matches('/')
}

/// `GET /api/title-comments/?...`
pub fn list_url(api_base: &str, query: &ListQuery) -> String {
    format!("{}/api/title-comments/?{}", trim(api_base), query.to_query_string())
}

/// `GET /api/title-comments/{id}/`
pub fn detail_url(api_base: &str, id: i64) -> String {
    format!("{}/api/title-comments/{}/", trim(api_base), id)
}

/// `POST /api/comments/`
pub fn create_url(api_base: &str) -> String {
    format!("{}/api/comments/", trim(api_base))
}

/// Captcha image; `nonce` only busts the browser cache.
pub fn captcha_url(api_base: &str, nonce: u64) -> String {
    format!("{}/api/generate-captcha/?{}", trim(api_base), nonce)
}

/// Push channel for one thread.
pub fn channel_url(ws_base: &str, id: i64) -> String {
    format!("{}/ws/comments/{}/", trim(ws_base), id)
}

/// WebSocket origin matching an HTTP API base.
pub fn ws_base_for(api_base: &str) -> String {
    let base = trim(api_base);
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    }
}

/// Client-side route of the thread view.
pub fn detail_route(id: i64) -> String {
    format!("/detail-title-comments/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::SortOrder;

    #[test]
    fn list_url_carries_query() {
        let query = ListQuery {
            username: "bob".into(),
            order: SortOrder::Ascending,
            page: 3,
            ..ListQuery::default()
        };
        assert_eq!(
            list_url("http://127.0.0.1:8000/", &query),
            "http://127.0.0.1:8000/api/title-comments/?username=bob&created_at=fifo&page=3"
        );
    }

    #[test]
    fn resource_urls() {
        let base = "http://127.0.0.1:8000";
        assert_eq!(detail_url(base, 7), "http://127.0.0.1:8000/api/title-comments/7/");
        assert_eq!(create_url(base), "http://127.0.0.1:8000/api/comments/");
        assert_eq!(
            captcha_url(base, 1714557600000),
            "http://127.0.0.1:8000/api/generate-captcha/?1714557600000"
        );
        assert_eq!(detail_route(7), "/detail-title-comments/7");
    }

    #[test]
    fn channel_scheme_follows_api_scheme() {
        assert_eq!(ws_base_for("http://127.0.0.1:8000/"), "ws://127.0.0.1:8000");
        assert_eq!(ws_base_for("https://board.example"), "wss://board.example");
        assert_eq!(
            channel_url(&ws_base_for("https://board.example"), 12),
            "wss://board.example/ws/comments/12/"
        );
    }
}

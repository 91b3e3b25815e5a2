use std::cell::OnceCell;

use threadboard_shared::endpoints;
use web_sys::window;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

thread_local! {
    static CONFIG: OnceCell<BoardConfig> = const { OnceCell::new() };
}

/// Where the board API and push channel live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub api_base: String,
    pub ws_base: String,
}

impl BoardConfig {
    /// Reads `<meta name="threadboard-api">` and `<meta name="threadboard-ws">`
    /// from the host page. A missing ws entry is derived from the API base.
    pub fn from_document() -> Self {
        let api_base = meta_content("threadboard-api").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let ws_base = meta_content("threadboard-ws").unwrap_or_else(|| endpoints::ws_base_for(&api_base));
        Self { api_base, ws_base }
    }

    /// Loaded on first use, then cached for the page's lifetime.
    pub fn current() -> Self {
        CONFIG.with(|cell| cell.get_or_init(Self::from_document).clone())
    }
}

fn meta_content(name: &str) -> Option<String> {
    let document = window()?.document()?;
    let el = document
        .query_selector(&format!("meta[name='{name}']"))
        .ok()
        .flatten()?;
    el.get_attribute("content").filter(|url| !url.is_empty())
}

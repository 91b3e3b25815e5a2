mod api;
mod app;
mod config;
mod debounce;
mod detail;
mod form;
mod list_view;
mod live;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

fn main() {
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"threadboard: logger already initialised".into());
    }

    let document = web_sys::window()
        .expect("no window")
        .document()
        .expect("no document");

    // Mount the board if the host page provides a mount point
    if let Some(el) = document.get_element_by_id("threadboard") {
        let html_el: web_sys::HtmlElement = el.unchecked_into();
        log::info!("mounting threadboard against {}", config::BoardConfig::current().api_base);
        leptos::mount::mount_to(html_el, move || {
            view! { <app::BoardApp /> }
        })
        .forget();
    } else {
        log::warn!("no #threadboard element on this page");
    }
}

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use threadboard_shared::{Comment, FetchFailure, FetchState, ThreadController, ThreadRow};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use crate::api;
use crate::form::CommentForm;
use crate::live::{use_live_bridge, LiveHandle};

const INDENT_PX: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Loading,
    Ready,
    NotFound,
    Failed(String),
}

/// A thread: the root comment and every reply under it, kept current by
/// the push channel.
#[component]
pub fn ThreadView() -> impl IntoView {
    let params = use_params_map();
    let thread_id = Memo::new(move |_| {
        params.with(|p| p.get("id")).and_then(|id| id.parse::<i64>().ok())
    });
    let thread = RwSignal::new(ThreadController::new(0));

    let refetch = move || {
        let Some(ticket) = thread.try_update(ThreadController::begin_fetch) else {
            return;
        };
        let id = thread.with_untracked(ThreadController::id);
        spawn_local(async move {
            let result = api::get_thread(id).await.map_err(FetchFailure::from);
            let _ = thread.try_update(|t| t.finish_fetch(ticket, result));
        });
    };

    Effect::new(move |_| match thread_id.get() {
        Some(id) => {
            thread.update(|t| t.switch_to(id));
            refetch();
        }
        None => thread.update(ThreadController::mark_not_found),
    });

    let live = use_live_bridge(thread_id, move |_| refetch());

    let on_created = Callback::new(move |_: Comment| {
        thread.update(ThreadController::close_reply);
        refetch();
    });

    let status = Memo::new(move |_| {
        thread.with(|t| match t.state() {
            FetchState::Loading => Status::Loading,
            FetchState::Ready(_) => Status::Ready,
            FetchState::NotFound => Status::NotFound,
            FetchState::Failed(message) => Status::Failed(message.clone()),
        })
    });
    let rows = Memo::new(move |_| thread.with(ThreadController::rows));

    view! {
        <section class="threadboard-thread">
            <A href="/">"\u{2190} All comments"</A>
            {move || match status.get() {
                Status::Loading => view! { <p class="threadboard-loading">"Loading..."</p> }.into_any(),
                Status::NotFound => view! { <p class="threadboard-hint">"No comment found"</p> }.into_any(),
                Status::Failed(message) => view! { <p class="threadboard-error">{message}</p> }.into_any(),
                Status::Ready => view! {
                    <div class="threadboard-tree">
                        <For
                            each=move || rows.get()
                            key=|row| row.comment.id
                            let:row
                        >
                            <ThreadNode row=row thread=thread live=live on_created=on_created />
                        </For>
                    </div>
                }
                .into_any(),
            }}
        </section>
    }
}

/// One comment in the tree, indented by its depth, with its reply slot.
#[component]
fn ThreadNode(
    row: ThreadRow,
    thread: RwSignal<ThreadController>,
    live: LiveHandle,
    on_created: Callback<Comment>,
) -> impl IntoView {
    let id = row.comment.id;
    let is_open = Memo::new(move |_| thread.with(|t| t.reply_target().is_open(id)));
    let indent = format!("margin-left: {}px", row.depth * INDENT_PX);
    let comment = row.comment;

    view! {
        <article class="threadboard-node" style=indent>
            <header class="threadboard-node-header">
                <strong>{comment.username.clone()}</strong>
                <time>{format_timestamp(&comment.created_at)}</time>
                {comment.home_page.clone().map(home_page_link)}
            </header>
            <p class="threadboard-node-body">{comment.text.clone()}</p>
            <button
                class="threadboard-btn threadboard-btn-sm"
                on:click=move |_| thread.update(|t| t.toggle_reply(id))
            >
                {move || if is_open.get() { "Cancel" } else { "Reply" }}
            </button>
            <Show when=move || is_open.get()>
                <CommentForm parent_id=id on_success=on_created live=live />
            </Show>
        </article>
    }
}

fn home_page_link(url: String) -> impl IntoView {
    let href = url.clone();
    view! { <a href=href target="_blank" rel="noopener">{url}</a> }
}

/// Renders a server timestamp in the browser's locale, or as-is if unparseable.
fn format_timestamp(raw: &str) -> String {
    let date = web_sys::js_sys::Date::new(&JsValue::from_str(raw));
    if date.get_time().is_nan() {
        return raw.to_string();
    }
    date.to_locale_string("default", &JsValue::UNDEFINED).into()
}

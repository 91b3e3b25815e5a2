use leptos::prelude::*;
use leptos_router::components::A;
use threadboard_shared::{
    endpoints, Comment, FetchFailure, FilterField, ListController, ListQuery, SortOrder,
};
use wasm_bindgen_futures::spawn_local;

use crate::api;
use crate::debounce::use_debounce;
use crate::form::CommentForm;

const FETCH_DEBOUNCE_MS: u32 = 300;

/// Paginated, filterable list of top-level comments.
#[component]
pub fn CommentList() -> impl IntoView {
    let list = RwSignal::new(ListController::new());
    let query = Memo::new(move |_| list.with(|l| l.query().clone()));

    let fetch_page = move |_: ListQuery| {
        let Some((ticket, query)) = list.try_update(ListController::begin_fetch) else {
            return;
        };
        spawn_local(async move {
            let result = api::list_comments(&query).await.map_err(FetchFailure::from);
            let _ = list.try_update(|l| l.finish_fetch(ticket, result));
        });
    };

    use_debounce(FETCH_DEBOUNCE_MS, move || query.get(), fetch_page);

    let on_created = Callback::new(move |_: Comment| fetch_page(query.get_untracked()));

    view! {
        <section class="threadboard-list">
            <h1>"Heading comments"</h1>
            <div class="threadboard-filters">
                <input
                    class="threadboard-input"
                    type="text"
                    placeholder="Username"
                    prop:value=move || query.with(|q| q.username.clone())
                    on:input=move |ev| {
                        list.update(|l| l.update_filter(FilterField::Username, event_target_value(&ev)))
                    }
                />
                <input
                    class="threadboard-input"
                    type="text"
                    placeholder="Email"
                    prop:value=move || query.with(|q| q.email.clone())
                    on:input=move |ev| {
                        list.update(|l| l.update_filter(FilterField::Email, event_target_value(&ev)))
                    }
                />
                <select
                    class="threadboard-select"
                    prop:value=move || query.with(|q| q.order.as_param())
                    on:change=move |ev| {
                        let order = SortOrder::from_param(&event_target_value(&ev));
                        list.update(|l| l.update_sort_order(order));
                    }
                >
                    <option value="">"---"</option>
                    <option value="fifo">"FIFO"</option>
                    <option value="lifo">"LIFO"</option>
                </select>
            </div>

            <Show when=move || !list.with(ListController::is_loaded)>
                <p class="threadboard-loading">"Loading comments..."</p>
            </Show>

            <table class="threadboard-table">
                <thead>
                    <tr>
                        <th>"Username"</th>
                        <th>"Email"</th>
                        <th>"Home Page"</th>
                        <th>"Text"</th>
                        <th>"Created At"</th>
                        <th>"Detail"</th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || list.with(|l| l.comments().to_vec())
                        key=|c| c.id
                        let:comment
                    >
                        <tr>
                            <td>{comment.username.clone()}</td>
                            <td>{comment.email.clone()}</td>
                            <td>{comment.home_page.clone().unwrap_or_else(|| "N/A".to_string())}</td>
                            <td>{comment.text.clone()}</td>
                            <td>{comment.created_at.clone()}</td>
                            <td>
                                <A href=endpoints::detail_route(comment.id)>"\u{2192}"</A>
                            </td>
                        </tr>
                    </For>
                </tbody>
            </table>

            <div class="threadboard-pagination">
                <button
                    class="threadboard-btn threadboard-btn-sm"
                    disabled=move || !list.with(ListController::has_previous)
                    on:click=move |_| {
                        list.update(|l| {
                            l.go_to_page(l.current_page().saturating_sub(1));
                        })
                    }
                >
                    "Previous"
                </button>
                <span>
                    {move || list.with(|l| format!("Page {} of {}", l.current_page(), l.total_pages()))}
                </span>
                <button
                    class="threadboard-btn threadboard-btn-sm"
                    disabled=move || !list.with(ListController::has_next)
                    on:click=move |_| {
                        list.update(|l| {
                            l.go_to_page(l.current_page() + 1);
                        })
                    }
                >
                    "Next"
                </button>
            </div>

            <CommentForm on_success=on_created />
        </section>
    }
}

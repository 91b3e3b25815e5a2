use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use crate::detail::ThreadView;
use crate::list_view::CommentList;

/// Board SPA: the comment list and the thread detail view.
#[component]
pub fn BoardApp() -> impl IntoView {
    view! {
        <Router>
            <div class="threadboard">
                <Routes fallback=|| view! { <p>"Page not found."</p> }>
                    <Route path=path!("/") view=CommentList />
                    <Route path=path!("/detail-title-comments/:id") view=ThreadView />
                </Routes>
            </div>
        </Router>
    }
}

use leptos::prelude::*;
use threadboard_shared::{Comment, Field, FormController, FormPhase, SubmitBlocked};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Blob, File, HtmlInputElement, Url};

use crate::api::{self, ApiError};
use crate::live::{self, LiveHandle};

type FormSignal = RwSignal<FormController<File>, LocalStorage>;
type UrlSlot = RwSignal<Option<ObjectUrl>>;

/// A `blob:` URL pointing at a picked file. Revoked when dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn for_blob(blob: &Blob) -> Option<Self> {
        match Url::create_object_url_with_blob(blob) {
            Ok(url) => Some(Self(url)),
            Err(e) => {
                log::warn!("could not create object URL: {:?}", e);
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Err(e) = Url::revoke_object_url(&self.0) {
            log::debug!("revoking {} failed: {:?}", self.0, e);
        }
    }
}

/// Form for posting a comment, or a reply when `parent_id` is set.
///
/// `on_success` receives the created comment. When `live` is given the
/// comment is also announced on that channel.
#[component]
pub fn CommentForm(
    #[prop(optional, into)] parent_id: Option<i64>,
    on_success: Callback<Comment>,
    #[prop(optional, into)] live: Option<LiveHandle>,
) -> impl IntoView {
    let form: FormSignal =
        RwSignal::new_local(FormController::new(parent_id, api::fresh_captcha_nonce()));
    let preview: UrlSlot = RwSignal::new(None);
    let file_link: UrlSlot = RwSignal::new(None);
    let phase = Memo::new(move |_| form.with(FormController::phase));

    on_cleanup(move || {
        clear(preview);
        clear(file_link);
    });

    let heading = if parent_id.is_some() { "Reply" } else { "Add a Comment" };

    view! {
        <div class="threadboard-form">
            <h4>{heading}</h4>
            <Show
                when=move || phase.get() == FormPhase::Success
                fallback=move || view! {
                    <FormBody
                        form=form
                        preview=preview
                        file_link=file_link
                        on_success=on_success
                        live=live
                    />
                }
            >
                <p class="threadboard-success">"Comment added successfully!"</p>
                <Show when=move || parent_id.is_none()>
                    <button
                        class="threadboard-btn threadboard-btn-sm"
                        on:click=move |_| form.update(FormController::reopen)
                    >
                        "Add another comment"
                    </button>
                </Show>
            </Show>
        </div>
    }
}

#[component]
fn FormBody(
    form: FormSignal,
    preview: UrlSlot,
    file_link: UrlSlot,
    on_success: Callback<Comment>,
    live: Option<LiveHandle>,
) -> impl IntoView {
    let submitting = Memo::new(move |_| form.with(|f| f.phase() == FormPhase::Submitting));
    let captcha_nonce = Memo::new(move |_| form.with(FormController::captcha_nonce));
    let modal_open = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(result) = form.try_update(FormController::begin_submit) else {
            return;
        };
        let submission = match result {
            Ok(submission) => submission,
            Err(SubmitBlocked::Missing(fields)) => {
                log::debug!("comment form incomplete: {:?}", fields);
                return;
            }
            Err(SubmitBlocked::InFlight) => return,
        };

        spawn_local(async move {
            match api::submit_comment(submission).await {
                Ok(comment) => {
                    let mounted = form
                        .try_update(|f| f.submit_succeeded(api::fresh_captcha_nonce()))
                        .is_some();
                    if !mounted {
                        return;
                    }
                    clear(preview);
                    clear(file_link);
                    if let Some(handle) = live {
                        live::announce(handle, &comment);
                    }
                    on_success.run(comment);
                }
                Err(ApiError::Rejected(errors)) => {
                    let _ = form.try_update(|f| f.submit_rejected(errors));
                }
                Err(err) => {
                    log::error!("comment submission failed: {}", err);
                    let _ = form.try_update(FormController::submit_failed);
                }
            }
        });
    };

    let on_pick = move |field: Field| {
        move |ev: leptos::ev::Event| {
            let Some(input) = ev
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let file = input.files().and_then(|files| files.get(0));
            let slot = if field == Field::Image { preview } else { file_link };
            // Replacing the slot drops, and so revokes, the previous URL.
            slot.set(file.as_ref().and_then(|f| ObjectUrl::for_blob(f)));
            form.update(|f| f.set_file(field, file));
        }
    };

    let picked_file = move || {
        let name = form.with(|f| f.data().file.as_ref().map(File::name))?;
        let href = url_of(file_link)?;
        Some(file_anchor(name, href))
    };

    let general_errors = move || {
        form.with(|f| f.errors().general().map(str::to_string).collect::<Vec<_>>())
    };

    view! {
        <form class="threadboard-comment-form" on:submit=on_submit>
            <TextInput form=form field=Field::Username label="Username" />
            <TextInput form=form field=Field::Email label="Email" kind="email" />
            <TextInput form=form field=Field::HomePage label="Home page (optional)" kind="url" />

            <label class="threadboard-field">
                "Image file (optional)"
                <input
                    class="threadboard-input"
                    type="file"
                    accept="image/*"
                    on:change=on_pick(Field::Image)
                />
            </label>
            {move || url_of(preview).map(|url| view! {
                <img
                    class="threadboard-preview"
                    src=url
                    alt="Uploaded"
                    width="90"
                    height="90"
                    on:click=move |_| modal_open.set(true)
                />
            })}
            <FieldError form=form field=Field::Image />

            <label class="threadboard-field">
                "Other file (optional)"
                <input class="threadboard-input" type="file" on:change=on_pick(Field::File) />
            </label>
            {picked_file}
            <FieldError form=form field=Field::File />

            <label class="threadboard-field">
                "Comment"
                <textarea
                    class="threadboard-textarea"
                    class:invalid=move || form.with(|f| f.errors().get(Field::Text).is_some())
                    rows="2"
                    prop:value=move || form.with(|f| f.data().text.clone())
                    on:input=move |ev| form.update(|f| f.set_field(Field::Text, event_target_value(&ev)))
                />
            </label>
            <FieldError form=form field=Field::Text />

            <div class="threadboard-captcha">
                <img
                    src=move || api::captcha_url(captcha_nonce.get())
                    alt="Captcha"
                    title="Click for a new challenge"
                    on:click=move |_| form.update(|f| f.refresh_captcha(api::fresh_captcha_nonce()))
                />
                <TextInput form=form field=Field::CaptchaText label="Enter CAPTCHA" />
            </div>

            <For each=general_errors key=|message| message.clone() let:message>
                <p class="threadboard-error">{message}</p>
            </For>

            <button class="threadboard-btn" type="submit" disabled=move || submitting.get()>
                {move || if submitting.get() { "Submitting..." } else { "Submit" }}
            </button>
        </form>

        <Show when=move || modal_open.get()>
            <div class="threadboard-modal" on:click=move |_| modal_open.set(false)>
                <img src=move || url_of(preview).unwrap_or_default() alt="Preview" />
            </div>
        </Show>
    }
}

#[component]
fn TextInput(
    form: FormSignal,
    field: Field,
    label: &'static str,
    #[prop(default = "text")] kind: &'static str,
) -> impl IntoView {
    view! {
        <label class="threadboard-field">
            {label}
            <input
                class="threadboard-input"
                class:invalid=move || form.with(|f| f.errors().get(field).is_some())
                type=kind
                prop:value=move || form.with(|f| f.data().value(field).unwrap_or_default().to_string())
                on:input=move |ev| form.update(|f| f.set_field(field, event_target_value(&ev)))
            />
        </label>
        <FieldError form=form field=field />
    }
}

#[component]
fn FieldError(form: FormSignal, field: Field) -> impl IntoView {
    move || {
        form.with(|f| f.errors().get(field).map(str::to_string))
            .map(|message| view! { <p class="threadboard-error">{message}</p> })
    }
}

/// Link to a picked attachment, opened in a new tab.
fn file_anchor(name: String, href: String) -> impl IntoView {
    view! {
        <a class="threadboard-file-name" href=href target="_blank" rel="noopener noreferrer">
            {name}
        </a>
    }
}

fn url_of(slot: UrlSlot) -> Option<String> {
    slot.try_with(|url| url.as_ref().map(|u| u.as_str().to_string()))
        .flatten()
}

fn clear(slot: UrlSlot) {
    let _ = slot.try_set(None);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use gloo_net::http::Request;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn object_url_stops_resolving_once_dropped() {
        let blob = Blob::new().unwrap();
        let url = ObjectUrl::for_blob(&blob).unwrap();
        let href = url.as_str().to_string();
        assert!(href.starts_with("blob:"));
        assert!(Request::get(&href).send().await.is_ok());

        drop(url);
        assert!(Request::get(&href).send().await.is_err());
    }

    #[wasm_bindgen_test]
    fn picked_file_is_linked_by_name() {
        leptos::mount::mount_to_body(|| {
            file_anchor("notes.txt".to_string(), "blob:threadboard-test".to_string())
        });

        let document = web_sys::window().unwrap().document().unwrap();
        let link = document
            .query_selector("a[href='blob:threadboard-test']")
            .unwrap()
            .unwrap();
        assert_eq!(link.text_content().unwrap().trim(), "notes.txt");
        assert_eq!(link.get_attribute("target").as_deref(), Some("_blank"));
    }
}

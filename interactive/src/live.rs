//! Push-channel subscription for one thread.
//!
//! Any inbound message means "re-fetch"; its payload is never inspected.
//! Open/close/error events are only logged.

use std::fmt;

use leptos::prelude::*;
use thiserror::Error;
use threadboard_shared::{endpoints, Announcement, Comment};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::config::BoardConfig;

#[derive(Debug, Clone, Error)]
pub enum LiveError {
    #[error("could not open channel: {0}")]
    Open(String),
    #[error("channel is not open")]
    NotOpen,
    #[error("could not encode announcement: {0}")]
    Encode(String),
    #[error("send failed: {0}")]
    Send(String),
}

/// Owns the socket and its handlers. Dropping it detaches the handlers and
/// closes the socket.
pub struct LiveBridge {
    thread_id: i64,
    socket: WebSocket,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl LiveBridge {
    pub fn open(url: &str, thread_id: i64, on_invalidate: impl Fn() + 'static) -> Result<Self, LiveError> {
        let socket = WebSocket::new(url).map_err(|e| LiveError::Open(format!("{:?}", e)))?;

        let on_open = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_: Event| {
            log::debug!("channel for thread {} opened", thread_id);
        }));
        let on_message = Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(move |_: MessageEvent| {
            log::debug!("invalidation for thread {}", thread_id);
            on_invalidate();
        }));
        let on_close = Closure::<dyn FnMut(CloseEvent)>::wrap(Box::new(move |ev: CloseEvent| {
            log::debug!("channel for thread {} closed ({})", thread_id, ev.code());
        }));
        let on_error = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_: Event| {
            log::warn!("channel for thread {} errored", thread_id);
        }));

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Self {
            thread_id,
            socket,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
        })
    }

    pub fn thread_id(&self) -> i64 {
        self.thread_id
    }

    pub fn socket(&self) -> &WebSocket {
        &self.socket
    }

    /// Tells other viewers of the thread that `comment` was just created.
    pub fn announce(&self, comment: &Comment) -> Result<(), LiveError> {
        if self.socket.ready_state() != WebSocket::OPEN {
            return Err(LiveError::NotOpen);
        }
        let text = serde_json::to_string(&Announcement { message: comment })
            .map_err(|e| LiveError::Encode(e.to_string()))?;
        self.socket
            .send_with_str(&text)
            .map_err(|e| LiveError::Send(format!("{:?}", e)))
    }
}

impl Drop for LiveBridge {
    fn drop(&mut self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        self.socket.set_onerror(None);
        if let Err(e) = self.socket.close() {
            log::warn!("closing channel for thread {} failed: {:?}", self.thread_id, e);
        }
    }
}

impl fmt::Debug for LiveBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveBridge")
            .field("thread_id", &self.thread_id)
            .field("ready_state", &self.socket.ready_state())
            .finish()
    }
}

/// Handle to the view's bridge. Forms borrow it only to announce.
pub type LiveHandle = StoredValue<Option<LiveBridge>, LocalStorage>;

/// Keeps one bridge open for the current thread id. Switching ids closes
/// the previous bridge; unmounting closes the current one.
pub fn use_live_bridge<F>(thread_id: Memo<Option<i64>>, on_invalidate: F) -> LiveHandle
where
    F: Fn(i64) + Clone + 'static,
{
    let handle: LiveHandle = StoredValue::new_local(None);

    Effect::new(move |_| {
        let id = thread_id.get();
        handle.set_value(None);

        let Some(id) = id else { return };
        let url = endpoints::channel_url(&BoardConfig::current().ws_base, id);
        let on_invalidate = on_invalidate.clone();
        match LiveBridge::open(&url, id, move || on_invalidate(id)) {
            Ok(bridge) => handle.set_value(Some(bridge)),
            Err(err) => log::warn!("{}", err),
        }
    });

    on_cleanup(move || {
        let _ = handle.try_update_value(|bridge| *bridge = None);
    });

    handle
}

/// Best effort: a closed or missing channel only costs other viewers an update.
pub fn announce(handle: LiveHandle, comment: &Comment) {
    let _ = handle.try_with_value(|bridge| match bridge {
        Some(bridge) => match bridge.announce(comment) {
            Ok(()) => log::debug!("announced comment {} on thread {}", comment.id, bridge.thread_id()),
            Err(err) => log::warn!(
                "announcing comment {} on thread {} failed: {}",
                comment.id,
                bridge.thread_id(),
                err
            ),
        },
        None => log::debug!("no channel open, comment {} not announced", comment.id),
    });
}

//! Session context and hooks for the UI.

use std::rc::Rc;

use api::{SessionState, SessionWatch};
use dioxus::prelude::*;
use futures::channel::mpsc;
use futures::StreamExt;
use store::{Backend, Session};

/// The backend services provided at the root of the app.
pub fn use_backend() -> Backend {
    use_context::<Backend>()
}

/// Get the current session state.
/// Returns a signal that updates when the user signs in or out.
pub fn use_session() -> Signal<SessionState> {
    use_context::<Signal<SessionState>>()
}

/// Provider component that mirrors the credential service's session.
/// Wrap your app with this component (inside the [`Backend`] context).
#[component]
pub fn SessionProvider(children: Element) -> Element {
    let backend = use_backend();
    let mut state = use_signal(SessionState::default);

    // Session callbacks may arrive on any thread; forward them through a
    // channel drained on the UI task.
    let _watch = use_hook(move || {
        let (tx, mut rx) = mpsc::unbounded::<Option<Session>>();
        spawn(async move {
            while let Some(session) = rx.next().await {
                state.with_mut(|s| s.apply(session));
                tracing::debug!(uid = ?state.peek().uid(), "Session changed");
            }
        });
        Rc::new(SessionWatch::start(backend.auth.as_ref(), move |session| {
            let _ = tx.unbounded_send(session);
        }))
    });

    use_context_provider(|| state);

    rsx! {
        {children}
    }
}

//! Profile data hooks.

use api::{ProfileState, ProfileWatch, SavedProfile};
use dioxus::prelude::*;
use futures::channel::mpsc;
use futures::StreamExt;
use store::Document;

use crate::auth::{use_backend, use_session};

/// Shared handle to the signed-in user's profile.
#[derive(Clone, Copy, PartialEq)]
pub struct ProfileHandle {
    pub state: Signal<ProfileState>,
    generation: Signal<u64>,
}

impl ProfileHandle {
    /// Refetch the profile, showing the loading state.
    pub fn refresh(&mut self) {
        *self.generation.write() += 1;
    }

    /// Show a just-saved profile without waiting for the refetch.
    pub fn apply_saved(&mut self, saved: &SavedProfile) {
        self.state.with_mut(|s| {
            s.profile = Some(saved.profile.clone());
            s.error = None;
        });
    }
}

/// Fetch the profile of the current session, refetching whenever the session
/// changes or [`ProfileHandle::refresh`] is called.
///
/// With `live`, the hook also subscribes to the profile document and applies
/// every remote change. The subscription is replaced when the session changes
/// and released when the calling component unmounts.
pub fn use_profile(live: bool) -> ProfileHandle {
    let backend = use_backend();
    let session = use_session();
    let mut state = use_signal(ProfileState::default);
    let generation = use_signal(|| 0u64);

    let fetch_backend = backend.clone();
    let _loader = use_resource(move || {
        let backend = fetch_backend.clone();
        let _ = generation();
        let current = session().session;
        async move {
            let Some(fetch) = state.with_mut(|s| s.begin_load(current.as_ref())) else {
                return;
            };
            let result = fetch.run(backend.documents.as_ref()).await;
            state.with_mut(|s| s.apply(result));
        }
    });

    let mut watch = use_signal(ProfileWatch::default);
    use_effect(move || {
        let current = session().session;
        if !live {
            return;
        }
        let (tx, mut rx) = mpsc::unbounded::<Result<Vec<Document>, store::BackendError>>();
        let subscribed = watch.with_mut(|w| {
            w.follow(backend.documents.as_ref(), current.as_ref(), move |result| {
                let _ = tx.unbounded_send(result);
            })
        });
        if let (true, Some(watched)) = (subscribed, current) {
            spawn(async move {
                while let Some(result) = rx.next().await {
                    state.with_mut(|s| s.apply_snapshot(result, &watched));
                }
            });
        }
    });

    ProfileHandle { state, generation }
}

/// Provide one profile handle to every screen below.
#[component]
pub fn ProfileProvider(#[props(default)] live: bool, children: Element) -> Element {
    let handle = use_profile(live);
    use_context_provider(|| handle);

    rsx! {
        {children}
    }
}

pub fn use_profile_context() -> ProfileHandle {
    use_context::<ProfileHandle>()
}

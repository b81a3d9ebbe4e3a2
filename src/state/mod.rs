pub(crate) mod request_store;

pub(crate) use request_store::RequestStore;

use crate::api::ApiClient;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// The paginated request listing, its index and its mutation protocol.
    pub requests: RequestStore,

    /// Server-side acceptance flag. `None` until the first /config load.
    pub accepting: RwSignal<Option<bool>>,
    pub accepting_error: RwSignal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        let api_client = RwSignal::new(ApiClient::load_from_storage());
        Self {
            api_client,
            requests: RequestStore::new(api_client),
            accepting: RwSignal::new(None),
            accepting_error: RwSignal::new(None),
        }
    }

    pub fn load_accept_mode(&self) {
        let state = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            match api_client.fetch_accept_mode().await {
                Ok(accept) => {
                    state.accepting.set(Some(accept));
                    state.accepting_error.set(None);
                }
                Err(e) => {
                    state.accepting_error.set(Some(e.to_string()));
                }
            }
        });
    }

    /// Flip the flag locally, POST the toggle, then re-read server truth on
    /// settle: the same optimistic/invalidate shape the listing uses.
    pub fn toggle_accept_mode(&self) {
        self.accepting.update(|a| {
            if let Some(accept) = a {
                *accept = !*accept;
            }
        });

        let state = *self;
        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            if let Err(e) = api_client.toggle_accept_mode().await {
                state.accepting_error.set(Some(e.to_string()));
            }
            state.load_accept_mode();
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);

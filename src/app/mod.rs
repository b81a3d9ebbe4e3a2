use crate::pages::RequestsPage;
use crate::state::{AppContext, AppState};
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // Single-screen app; the queue is the whole UI.
    view! { <RequestsPage /> }
}

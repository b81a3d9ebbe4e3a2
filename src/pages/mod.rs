use crate::cache::{group_by_day, DayGroup};
use crate::components::hooks::{use_infinite_scroll, UseInfiniteScroll};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, List, ListItem,
    ListSection, ListSubheader, Spinner,
};
use crate::models::SongRequest;
use crate::state::AppContext;
use crate::storage::{clear_api_key, save_api_key};
use leptos::prelude::*;
use leptos_dom::helpers::set_timeout;
use std::time::Duration;

/// How long the delete button stays in its "confirm" state before falling
/// back to a plain delete button.
const DELETE_CONFIRM_WINDOW: Duration = Duration::from_millis(2000);

#[component]
fn RequestInput() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let title: RwSignal<String> = RwSignal::new(String::new());

    let on_keyup = Callback::new(move |ev: web_sys::KeyboardEvent| {
        let value = title.get_untracked();
        if value.is_empty() || ev.key() != "Enter" {
            return;
        }
        title.set(String::new());
        app_state.0.requests.insert(value);
    });

    view! {
        <Input
            placeholder="ENTER鍵加入歌單"
            bind_value=title
            on_keyup=on_keyup
            class="w-full"
        />
    }
}

#[component]
fn RequestRow(request: SongRequest) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let store = app_state.0.requests;

    let SongRequest {
        id,
        title,
        requester,
        done,
        ..
    } = request;

    // Two-step delete: first click arms, second click within the window
    // performs the removal.
    let delete_pending: RwSignal<bool> = RwSignal::new(false);

    let toggle_id = id.clone();
    let on_toggle = move |_| {
        store.set_done(toggle_id.clone(), !done);
    };

    let copy_title = title.clone();
    let on_copy = move |_| {
        // Best effort; there is no fallback UI when the clipboard is denied.
        if let Some(win) = web_sys::window() {
            let _ = win.navigator().clipboard().write_text(&copy_title);
        }
    };

    let delete_id = id.clone();
    let on_delete = move |_| {
        if !delete_pending.get_untracked() {
            delete_pending.set(true);
            set_timeout(move || delete_pending.set(false), DELETE_CONFIRM_WINDOW);
            return;
        }
        store.remove(delete_id.clone());
    };

    view! {
        <ListItem>
            <button
                class="flex min-w-0 flex-1 items-center gap-3 text-left hover:cursor-pointer"
                on:click=on_toggle
            >
                <input type="checkbox" prop:checked=done class="pointer-events-none size-4" />
                <span class=move || {
                    if done {
                        "min-w-0 flex-1 truncate line-through opacity-50"
                    } else {
                        "min-w-0 flex-1 truncate"
                    }
                }>
                    <span class="block truncate text-sm">{title.clone()}</span>
                    <span class="block truncate text-xs text-muted-foreground">{requester}</span>
                </span>
            </button>

            <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_copy>
                "複製歌曲"
            </Button>
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Sm
                class="text-destructive"
                on:click=on_delete
            >
                {move || if delete_pending.get() { "確認刪除" } else { "刪除" }}
            </Button>
        </ListItem>
    }
}

#[component]
fn DaySection(group: DayGroup) -> impl IntoView {
    view! {
        <ListSection>
            <ListSubheader>{group.key.clone()}</ListSubheader>
            {group
                .requests
                .into_iter()
                .map(|request| view! { <RequestRow request /> })
                .collect_view()}
        </ListSection>
    }
}

/// Sticky accept-mode toggle. Optimistically flips the flag, POSTs the
/// toggle, then re-reads server truth on settle.
#[component]
fn ModeControl() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let accepting = app_state.0.accepting;
    let accepting_error = app_state.0.accepting_error;

    view! {
        <div class="sticky bottom-4 z-20 flex items-center justify-end gap-2 pr-2">
            <Show when=move || accepting_error.get().is_some() fallback=|| ().into_view()>
                {move || {
                    accepting_error.get().map(|e| view! {
                        <span class="rounded bg-destructive/10 px-2 py-1 text-xs text-destructive">
                            {e}
                        </span>
                    })
                }}
            </Show>
            <Show when=move || accepting.get().is_some() fallback=|| ().into_view()>
                {move || {
                    let on = accepting.get().unwrap_or(false);
                    let variant = if on { ButtonVariant::Destructive } else { ButtonVariant::Success };
                    view! {
                        <Button
                            variant=variant
                            size=ButtonSize::Fab
                            on:click=move |_| app_state.0.toggle_accept_mode()
                        >
                            {if on { "停止點歌" } else { "開始點歌" }}
                        </Button>
                    }
                }}
            </Show>
        </div>
    }
}

/// Operator API key entry. The key is persisted under the legacy
/// localStorage slot and attached to mutating calls only.
#[component]
fn ApiKeySettings() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let key: RwSignal<String> =
        RwSignal::new(app_state.0.api_client.get_untracked().api_key.clone().unwrap_or_default());

    let on_save = move |_| {
        let value = key.get_untracked();
        if value.trim().is_empty() {
            clear_api_key();
        } else {
            save_api_key(&value);
        }
        let mut client = app_state.0.api_client.get_untracked();
        client.set_api_key(Some(value));
        app_state.0.api_client.set(client);
    };

    view! {
        <div class="flex items-center gap-2">
            <Input r#type="password" placeholder="API key" bind_value=key class="h-8 text-sm" />
            <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_save>
                "保存"
            </Button>
        </div>
    }
}

#[component]
pub fn RequestsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let store = app_state.0.requests;

    Effect::new(move |_| {
        store.load_initial();
        app_state.0.load_accept_mode();
    });

    use_infinite_scroll(UseInfiniteScroll {
        is_loading: store.is_loading.into(),
        is_fetching: store.is_fetching.into(),
        has_more: store.has_more.into(),
        fetch_failed: Signal::derive(move || store.error.get().is_some()),
        on_load_more: Callback::new(move |_| store.load_next_page()),
    });

    let groups = Memo::new(move |_| group_by_day(&store.snapshot()));

    view! {
        <div class="container relative mx-auto min-h-screen max-w-md border-x border-solid border-border">
            <section class="border-b px-4 py-4 text-foreground">"DD的點歌系統"</section>

            <section class="flex flex-col gap-3 p-3 pt-5">
                <RequestInput />
                <ApiKeySettings />
            </section>

            <Show when=move || store.error.get().is_some() fallback=|| ().into_view()>
                {move || {
                    store.error.get().map(|e| view! {
                        <Alert class="border-destructive/30 mx-3">
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    })
                }}
            </Show>

            <Show when=move || store.mutation_error.get().is_some() fallback=|| ().into_view()>
                {move || {
                    store.mutation_error.get().map(|e| view! {
                        <Alert class="border-destructive/30 mx-3">
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    })
                }}
            </Show>

            <Show
                when=move || !store.is_loading.get()
                fallback=move || view! {
                    <section class="flex items-center justify-center gap-2 py-6 text-sm text-muted-foreground">
                        <Spinner />
                        "載入中…"
                    </section>
                }
            >
                <Show
                    when=move || !groups.get().is_empty()
                    fallback=move || view! {
                        <section class="flex flex-col items-center gap-3 py-4 text-muted-foreground">
                            <p>"暫無歌曲"</p>
                        </section>
                    }
                >
                    <List>
                        {move || {
                            groups
                                .get()
                                .into_iter()
                                .map(|group| view! { <DaySection group /> })
                                .collect_view()
                        }}
                    </List>
                </Show>
            </Show>

            <Show when=move || store.is_fetching.get() fallback=|| ().into_view()>
                <section class="flex justify-center py-3">
                    <Spinner />
                </section>
            </Show>

            <ModeControl />
        </div>
    }
}

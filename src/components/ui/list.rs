use leptos::prelude::*;
use leptos_ui::clx;

// Grouped request list: one `ListSection` per day, headed by a sticky
// `ListSubheader`, rows as `ListItem`.
mod components {
    use super::*;
    clx! {List, ul, "flex flex-col"}
    clx! {ListSection, li, "flex flex-col"}
    clx! {ListSubheader, div, "sticky top-0 z-10 bg-background px-3 py-1.5 text-xs font-medium text-muted-foreground"}
    clx! {ListItem, div, "flex items-center gap-2 px-2 py-1.5 hover:bg-accent/50"}
}

pub use components::*;

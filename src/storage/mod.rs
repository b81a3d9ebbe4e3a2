/// Operator API key, sent as `x-api-key` on mutating config calls.
/// Same key the legacy web client kept in localStorage.
pub(crate) const API_KEY_KEY: &str = "api-key";

pub(crate) fn load_api_key() -> Option<String> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    storage
        .get_item(API_KEY_KEY)
        .ok()
        .flatten()
        .filter(|k| !k.trim().is_empty())
}

pub(crate) fn save_api_key(key: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(API_KEY_KEY, key);
    }
}

pub(crate) fn clear_api_key() {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.remove_item(API_KEY_KEY);
    }
}

pub(crate) mod edit_session;

use crate::api::ApiClient;
use crate::models::{AccountInfo, Note};
use crate::storage::load_sidebar_collapsed;
use leptos::prelude::*;

/// All fields are signals, so the whole state is `Copy` and can be captured
/// freely by event closures.
#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<AccountInfo>>,

    /// Sidebar list, loaded from the store. Independent of which note is
    /// currently open.
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,

    /// Notes load guard (avoid duplicate loads + ignore stale responses).
    pub notes_request_id: RwSignal<u64>,
    pub notes_loaded_once: RwSignal<bool>,

    /// Global UI state, persisted across sessions.
    pub sidebar_collapsed: RwSignal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let stored_user = crate::storage::load_user_from_storage();

        Self {
            api_client: RwSignal::new(stored_client),
            current_user: RwSignal::new(stored_user),
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(false),
            notes_request_id: RwSignal::new(0),
            notes_loaded_once: RwSignal::new(false),
            sidebar_collapsed: RwSignal::new(load_sidebar_collapsed()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);

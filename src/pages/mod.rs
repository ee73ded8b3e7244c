use crate::api::{ApiErrorKind, ApiResult};
use crate::components::ui::{
    Alert, AlertDescription, Button, Card, CardContent, CardDescription, CardFooter, CardHeader,
    CardTitle, Input, Label, Spinner,
};
use crate::editor::RichTextEditor;
use crate::models::Note;
use crate::state::edit_session::{
    delete_outcome, DeleteOutcome, EditSession, SavePayload, TITLE_AUTOSAVE_MS,
};
use crate::state::AppContext;
use crate::storage::{save_sidebar_collapsed, save_user_to_storage};
use crate::util::{format_date_year, now_ms};
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;
use wasm_bindgen::JsCast;

/// Token is gone or rejected: drop the session and go back to the login page.
fn force_relogin(app_state: AppContext) {
    let mut c = app_state.0.api_client.get_untracked();
    c.logout();
    app_state.0.api_client.set(c);
    app_state.0.current_user.set(None);
    let _ = window().location().set_href("/login");
}

/// Load the shared notes list, with stale-response protection: only the
/// newest request may write its result back.
fn refresh_notes_list(app_state: AppContext) {
    if app_state.0.notes_loading.get_untracked() {
        return;
    }

    let req_id = app_state
        .0
        .notes_request_id
        .get_untracked()
        .saturating_add(1);
    app_state.0.notes_request_id.set(req_id);
    app_state.0.notes_loading.set(true);

    let api_client = app_state.0.api_client.get_untracked();
    spawn_local(async move {
        let result = api_client.fetch_notes().await;
        apply_notes_result(app_state, req_id, result);
    });
}

/// Write a notes-list response back into shared state. `notes_loading` is
/// cleared on every path, otherwise a dropped response would jam the
/// in-flight gate above for the rest of the session.
fn apply_notes_result(app_state: AppContext, req_id: u64, result: ApiResult<Vec<Note>>) {
    app_state.0.notes_loading.set(false);

    // Ignore stale responses.
    if app_state.0.notes_request_id.get_untracked() != req_id {
        return;
    }

    match result {
        Ok(notes) => {
            app_state.0.notes.set(notes);
            app_state.0.notes_loaded_once.set(true);
        }
        Err(e) => {
            if e.kind == ApiErrorKind::Unauthorized {
                force_relogin(app_state);
                return;
            }
            leptos::logging::error!("notes list load failed: {}", e);
        }
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.login(&email_val, &password_val).await {
                Ok(response) => {
                    api_client.set_token(response.token);
                    api_client.save_to_storage();
                    save_user_to_storage(&response.user);
                    app_state.0.api_client.set(api_client);
                    app_state.0.current_user.set(Some(response.user));
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-md flex-col justify-center px-4 py-12">
                <div class="mb-6">
                    <a href="/" class="text-sm font-medium text-foreground">"Notespace"</a>
                    <div class="text-xs text-muted-foreground">"Your notes, in one place."</div>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-xl">"Sign in"</CardTitle>
                        <CardDescription>
                            "Welcome back. Use your Notespace account to continue."
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-4" on:submit=on_submit>
                            <div class="flex flex-col gap-2">
                                <Label html_for="email">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                />
                            </div>

                            <div class="flex flex-col gap-2">
                                <Label html_for="password">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive">{e}</AlertDescription>
                                        </Alert>
                                    })
                                }}
                            </Show>

                            <Button
                                class="w-full"
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Sign in" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>

                    <CardFooter class="justify-between">
                        <div class="text-xs text-muted-foreground">
                            "Accounts are provisioned by your administrator."
                        </div>
                    </CardFooter>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            {move || children.with_value(|c| c())}
        </Show>
    }
}

/// `/` — there is no index view of its own: land on the first note, creating
/// one for an empty account.
#[component]
pub fn NotesIndexRedirect() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    Effect::new(move |_| {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.fetch_notes().await {
                Ok(notes) => {
                    app_state.0.notes.set(notes.clone());
                    app_state.0.notes_loaded_once.set(true);

                    if let Some(first) = notes.first() {
                        let url = format!("/notes/{}", first.uuid);
                        navigate.with_value(|nav| nav(&url, Default::default()));
                        return;
                    }

                    // Empty account: same rule as deleting the last note.
                    match api_client.create_note("", "<p></p>").await {
                        Ok(n) => {
                            app_state.0.notes.update(|xs| xs.insert(0, n.clone()));
                            let url = format!("/notes/{}", n.uuid);
                            navigate.with_value(|nav| nav(&url, Default::default()));
                        }
                        Err(e) => leptos::logging::error!("create note failed: {}", e),
                    }
                }
                Err(e) => {
                    if e.kind == ApiErrorKind::Unauthorized {
                        force_relogin(app_state);
                        return;
                    }
                    leptos::logging::error!("notes list load failed: {}", e);
                }
            }
        });
    });

    view! {
        <div class="p-16 text-sm text-muted-foreground">"Loading..."</div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub note_id: Option<String>,
}

#[component]
pub fn NotePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params::<NoteRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    let notes = app_state.0.notes;
    let sidebar_collapsed = app_state.0.sidebar_collapsed;

    // Params access must happen inside a reactive tracking context.
    let note_id = move || {
        params
            .get()
            .ok()
            .and_then(|p| p.note_id)
            .unwrap_or_default()
    };

    let session: RwSignal<EditSession> = RwSignal::new(EditSession::new());

    // Bumped on every route change; async results from a previous note are
    // dropped instead of writing into the new session.
    let load_generation: RwSignal<u64> = RwSignal::new(0);

    // Title autosave: idle debounce timer handle. At most one live timer.
    let title_debounce_timer_id: RwSignal<Option<i32>> = RwSignal::new(None);

    let creating: RwSignal<bool> = RwSignal::new(false);
    let title_ref: NodeRef<html::Textarea> = NodeRef::new();

    let title = Memo::new(move |_| session.with(|s| s.title.clone()));
    let saved = Memo::new(move |_| session.with(|s| !s.is_dirty()));
    let not_found = Memo::new(move |_| session.with(|s| s.not_found));
    let current_note = Memo::new(move |_| session.with(|s| s.note.clone()));

    let cancel_title_debounce = move || {
        if let Some(win) = web_sys::window() {
            if let Some(tid) = title_debounce_timer_id.get_untracked() {
                let _ = win.clear_timeout_with_handle(tid);
            }
        }
        title_debounce_timer_id.set(None);
    };

    let run_save = move |payload: SavePayload, generation: u64| {
        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client
                .save_note(&payload.uuid, &payload.title, &payload.content)
                .await
            {
                Ok(()) => {
                    // Only the session that issued the save may be marked
                    // clean, and only if the payload is still current.
                    if load_generation.get_untracked() == generation {
                        session.update(|s| s.save_succeeded(&payload));
                    }

                    // Keep the sidebar in sync with what was persisted.
                    notes.update(|xs| {
                        if let Some(n) = xs.iter_mut().find(|n| n.uuid == payload.uuid) {
                            n.title = payload.title.clone();
                            n.content = payload.content.clone();
                        }
                    });
                }
                Err(e) => leptos::logging::error!("note save failed: {}", e),
            }
        });
    };

    // Load (a): the full notes list for the sidebar, once per app session.
    Effect::new(move |_| {
        if !app_state.0.notes_loaded_once.get_untracked() {
            refresh_notes_list(app_state);
        }
    });

    // Load (b): the routed note. Independent of (a); either may fail alone.
    Effect::new(move |_| {
        let id = note_id();

        let generation = load_generation.get_untracked().saturating_add(1);
        load_generation.set(generation);

        // Any scheduled autosave belongs to the previous note.
        cancel_title_debounce();
        session.update(|s| s.begin_load());

        if id.trim().is_empty() {
            session.update(|s| s.note_missing());
            return;
        }

        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            let result = api_client.get_note_by_uuid(&id).await;

            // Ignore stale responses.
            if load_generation.get_untracked() != generation {
                return;
            }

            match result {
                Ok(Some(n)) => session.update(|s| s.note_loaded(n)),
                Ok(None) => session.update(|s| s.note_missing()),
                Err(e) => {
                    if e.kind == ApiErrorKind::Unauthorized {
                        force_relogin(app_state);
                        return;
                    }
                    leptos::logging::error!("note load failed: {}", e);
                    session.update(|s| s.note_missing());
                }
            }
        });
    });

    // Autosize the title textarea to its content.
    Effect::new(move |_| {
        let _ = title.get();
        if let Some(el) = title_ref.get_untracked() {
            // Fully qualified: the render prelude also has a `style` builder
            // method on elements, which would shadow the CSS declaration.
            let style = web_sys::HtmlElement::style(&el);
            let _ = style.set_property("height", "auto");
            let _ = style.set_property("height", &format!("{}px", el.scroll_height()));
        }
    });

    let on_title_input = move |ev: web_sys::Event| {
        let Some(el) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        else {
            return;
        };
        let v = el.value();

        session.update(|s| s.edit_title(&v, now_ms()));

        // Trailing-edge debounce: cancel the pending timer, schedule a new
        // save one quiet period out.
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Some(tid) = title_debounce_timer_id.get_untracked() {
            let _ = win.clear_timeout_with_handle(tid);
        }

        let generation = load_generation.get_untracked();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            title_debounce_timer_id.set(None);
            if load_generation.get_untracked() != generation {
                return;
            }

            let mut payload: Option<SavePayload> = None;
            session.update(|s| payload = s.take_due_save(now_ms()));
            if let Some(p) = payload {
                run_save(p, generation);
            }
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                TITLE_AUTOSAVE_MS as i32,
            )
            .unwrap_or(0);
        title_debounce_timer_id.set(Some(tid));
    };

    // Leaving the editing area persists the full pair unconditionally.
    let on_editor_blur = move |_ev: web_sys::FocusEvent| {
        cancel_title_debounce();

        let generation = load_generation.get_untracked();
        let mut payload: Option<SavePayload> = None;
        session.update(|s| payload = s.flush());
        if let Some(p) = payload {
            run_save(p, generation);
        }
    };

    let on_content_change = move |markup: String| {
        session.update(|s| s.edit_content(&markup));
    };

    let add_new_note = move || {
        if creating.get_untracked() {
            return;
        }
        creating.set(true);

        let api_client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match api_client.create_note("", "<p></p>").await {
                Ok(n) => {
                    notes.update(|xs| {
                        if !xs.iter().any(|x| x.uuid == n.uuid) {
                            xs.insert(0, n.clone());
                        }
                    });
                    let url = format!("/notes/{}", n.uuid);
                    navigate.with_value(|nav| nav(&url, Default::default()));
                }
                Err(e) => leptos::logging::error!("create note failed: {}", e),
            }
            creating.set(false);
        });
    };

    let on_delete_note = move |n: Note| {
        let current = note_id();
        let current = (!current.trim().is_empty()).then_some(current);
        let (remaining, outcome) =
            delete_outcome(&notes.get_untracked(), &n.uuid, current.as_deref());

        let api_client = app_state.0.api_client.get_untracked();
        let uuid = n.uuid.clone();
        spawn_local(async move {
            if let Err(e) = api_client.delete_note(&uuid).await {
                leptos::logging::error!("delete note failed: {}", e);
            }
        });

        notes.set(remaining);

        match outcome {
            DeleteOutcome::SidebarOnly => {}
            DeleteOutcome::NavigateTo(id) => {
                let url = format!("/notes/{}", id);
                navigate.with_value(|nav| nav(&url, Default::default()));
            }
            DeleteOutcome::CreateReplacement => add_new_note(),
        }
    };

    // Arm the browser leave-prompt exactly while the session is dirty.
    let guard_handle: StoredValue<Option<WindowListenerHandle>> = StoredValue::new(None);
    Effect::new(move |_| {
        let dirty = !saved.get();

        guard_handle.update_value(|h| {
            if let Some(h) = h.take() {
                h.remove();
            }
        });

        if dirty {
            let h = window_event_listener(ev::beforeunload, |ev: web_sys::BeforeUnloadEvent| {
                ev.prevent_default();
                ev.set_return_value("");
            });
            guard_handle.set_value(Some(h));
        }
    });

    on_cleanup(move || {
        cancel_title_debounce();
        guard_handle.update_value(|h| {
            if let Some(h) = h.take() {
                h.remove();
            }
        });
    });

    let toggle_sidebar = move |_ev: web_sys::MouseEvent| {
        let next = !sidebar_collapsed.get_untracked();
        sidebar_collapsed.set(next);
        save_sidebar_collapsed(next);
    };

    view! {
        <div class="flex size-full min-h-screen gap-16 bg-background p-16">
            <div class="flex flex-1 flex-col gap-2 overflow-y-auto pr-4">
                <div class="flex w-full items-center justify-between text-sm text-muted-foreground">
                    <div class="flex gap-4">
                        <Show when=move || current_note.get().is_some() fallback=|| ().into_view()>
                            <p class="flex items-center">
                                {move || {
                                    current_note
                                        .get()
                                        .map(|n| format_date_year(&n.created_at))
                                        .unwrap_or_default()
                                }}
                            </p>
                        </Show>

                        {move || {
                            if creating.get() {
                                view! {
                                    <div class="flex items-center gap-1 rounded-md px-1">
                                        <Spinner />
                                        <span>"loading..."</span>
                                    </div>
                                }
                                .into_any()
                            } else {
                                view! {
                                    <button
                                        class="flex items-center gap-1 truncate rounded-md px-1 hover:bg-secondary"
                                        on:click=move |_| add_new_note()
                                    >
                                        <span>"+ Add a new note"</span>
                                    </button>
                                }
                                .into_any()
                            }
                        }}
                    </div>

                    <div class="flex cursor-default items-center gap-4">
                        <span>{move || if saved.get() { "saved" } else { "..." }}</span>
                        <button class="flex items-center hover:text-foreground" on:click=toggle_sidebar>
                            {move || if sidebar_collapsed.get() { "‹" } else { "›" }}
                        </button>
                    </div>
                </div>

                {move || {
                    if not_found.get() {
                        return view! {
                            <div class="mt-4 text-muted-foreground">
                                <p>"note not found"</p>
                            </div>
                        }
                        .into_any();
                    }

                    if current_note.get().is_none() {
                        return view! {
                            <div class="mt-4 text-muted-foreground">
                                <p>"loading..."</p>
                            </div>
                        }
                        .into_any();
                    }

                    view! {
                        <div on:focusout=on_editor_blur>
                            <textarea
                                node_ref=title_ref
                                rows="1"
                                placeholder="Untitled"
                                class="w-full resize-none overflow-hidden whitespace-pre-wrap break-words bg-background py-2 text-3xl font-bold text-foreground outline-none placeholder:text-muted-foreground"
                                prop:value=move || title.get()
                                on:input=on_title_input
                                on:keydown=move |ev: web_sys::KeyboardEvent| {
                                    // Titles are single-line; Enter commits and
                                    // moves focus out (blur-save picks it up).
                                    if ev.key() == "Enter" {
                                        ev.prevent_default();
                                        if let Some(t) = ev
                                            .target()
                                            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
                                        {
                                            let _ = t.blur();
                                        }
                                    }
                                }
                            ></textarea>

                            <RichTextEditor
                                note_uuid=Signal::derive(move || {
                                    current_note.get().map(|n| n.uuid).unwrap_or_default()
                                })
                                initial_content=Signal::derive(move || {
                                    session.with(|s| s.content.clone())
                                })
                                on_change=on_content_change
                                editable=Signal::derive(move || current_note.get().is_some())
                            />
                        </div>
                    }
                    .into_any()
                }}
            </div>

            <div class=move || {
                if sidebar_collapsed.get() {
                    "hidden"
                } else {
                    "flex max-h-screen w-full max-w-[200px] flex-col gap-8 overflow-y-auto text-sm text-muted-foreground"
                }
            }>
                <span class="text-foreground">"notes"</span>
                <div class="flex flex-col gap-2 px-2">
                    {move || {
                        let current = note_id();
                        notes
                            .get()
                            .into_iter()
                            .map(|n| {
                                let is_current = n.uuid == current;
                                let href = format!("/notes/{}", n.uuid);

                                // The open note's row mirrors the live title.
                                let shown = if is_current {
                                    title.get()
                                } else {
                                    n.title.clone()
                                };
                                let shown = if shown.trim().is_empty() {
                                    "Untitled".to_string()
                                } else {
                                    shown
                                };

                                let row_class = if is_current {
                                    "truncate text-foreground"
                                } else {
                                    "truncate text-muted-foreground"
                                };

                                let n2 = n.clone();
                                view! {
                                    <div class="group flex items-center justify-between gap-1 truncate rounded-md px-2 py-1 hover:bg-secondary">
                                        <a href=href class="flex-1 truncate">
                                            <p class=row_class>{shown}</p>
                                        </a>
                                        <button
                                            class="opacity-0 hover:text-foreground group-hover:opacity-100"
                                            on:click=move |ev: web_sys::MouseEvent| {
                                                ev.stop_propagation();
                                                on_delete_note(n2.clone());
                                            }
                                        >
                                            "del"
                                        </button>
                                    </div>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ApiError};
    use crate::state::AppState;

    // Built by hand: the storage-backed constructor needs a browser.
    fn test_state() -> AppContext {
        AppContext(AppState {
            api_client: RwSignal::new(ApiClient::new("http://localhost:8080".to_string())),
            current_user: RwSignal::new(None),
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(true),
            notes_request_id: RwSignal::new(1),
            notes_loaded_once: RwSignal::new(false),
            sidebar_collapsed: RwSignal::new(false),
        })
    }

    fn note(uuid: &str) -> Note {
        Note {
            uuid: uuid.to_string(),
            title: "t".to_string(),
            content: "<p></p>".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn notes_load_success_clears_loading_and_stores_list() {
        let st = test_state();
        apply_notes_result(st, 1, Ok(vec![note("a")]));
        assert!(!st.0.notes_loading.get_untracked());
        assert!(st.0.notes_loaded_once.get_untracked());
        assert_eq!(st.0.notes.get_untracked().len(), 1);
    }

    #[test]
    fn notes_load_failure_clears_loading_so_a_retry_can_start() {
        let st = test_state();
        apply_notes_result(
            st,
            1,
            Err(ApiError {
                kind: ApiErrorKind::Http,
                message: "boom".to_string(),
            }),
        );
        assert!(!st.0.notes_loading.get_untracked());
        assert!(!st.0.notes_loaded_once.get_untracked());
    }

    #[test]
    fn stale_notes_response_is_dropped_but_still_clears_loading() {
        let st = test_state();
        st.0.notes_request_id.set(2);
        apply_notes_result(st, 1, Ok(vec![note("old")]));
        assert!(!st.0.notes_loading.get_untracked());
        assert!(st.0.notes.get_untracked().is_empty());
        assert!(!st.0.notes_loaded_once.get_untracked());
    }
}

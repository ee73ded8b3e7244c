use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Thin binding to the rich-text surface.
///
/// The engine itself is collaborator infrastructure: this component only
/// seeds it with a note's markup, reports change events upward, and toggles
/// editability. It deliberately owns no document model.
///
/// Seeding happens once per note uuid. Re-running the seed on every render
/// would clobber the user's in-progress edits with the last-loaded server
/// state.
#[component]
pub fn RichTextEditor(
    /// Which note the surface is showing; a change re-seeds the content.
    #[prop(into)] note_uuid: Signal<String>,
    /// Markup to seed with when `note_uuid` changes.
    #[prop(into)] initial_content: Signal<String>,
    /// Fired with the full updated markup on every engine change event.
    #[prop(into)] on_change: Callback<String>,
    #[prop(optional)] editable: Option<Signal<bool>>,
) -> impl IntoView {
    let editable = editable.unwrap_or_else(|| Signal::derive(|| true));
    let surface_ref: NodeRef<html::Div> = NodeRef::new();

    let seeded_for: RwSignal<Option<String>> = RwSignal::new(None);
    Effect::new(move |_| {
        let id = note_uuid.get();
        let Some(el) = surface_ref.get() else {
            return;
        };
        if seeded_for.get_untracked().as_deref() == Some(id.as_str()) {
            return;
        }
        el.set_inner_html(&initial_content.get_untracked());
        seeded_for.set(Some(id));
    });

    let on_input = move |ev: web_sys::Event| {
        if let Some(el) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
        {
            on_change.run(el.inner_html());
        }
    };

    view! {
        <div
            data-name="RichTextEditor"
            node_ref=surface_ref
            contenteditable=move || if editable.get() { "true" } else { "false" }
            class="min-h-40 w-full whitespace-pre-wrap break-words rounded-md bg-background py-2 text-sm leading-relaxed text-foreground outline-none [&_p]:my-1"
            on:input=on_input
        ></div>
    }
}

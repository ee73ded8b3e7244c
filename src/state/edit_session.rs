use crate::models::Note;

/// Quiet period for the trailing-edge title debounce.
pub(crate) const TITLE_AUTOSAVE_MS: i64 = 2000;

/// What a fired save persists: always the full current pair for the note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SavePayload {
    pub uuid: String,
    pub title: String,
    pub content: String,
}

/// Local editing state for one note view, independent of the DOM.
///
/// The page owns one of these per mounted route and drives it through
/// explicit transitions (load, edit, due-save, blur-flush, save-ok). The
/// real browser timer mirrors `pending_save_at`; keeping the deadline here
/// makes the autosave policy checkable without a browser.
#[derive(Clone, Debug)]
pub(crate) struct EditSession {
    pub note: Option<Note>,
    pub title: String,
    pub content: String,
    pub not_found: bool,

    saved: bool,
    pending_save_at: Option<i64>,
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            note: None,
            title: String::new(),
            content: String::new(),
            not_found: false,
            saved: true,
            pending_save_at: None,
        }
    }

    /// Reset for a (possibly different) note id. Any pending autosave
    /// belongs to the previous note and is discarded; the caller cancels
    /// the matching browser timer.
    pub fn begin_load(&mut self) {
        *self = Self::new();
    }

    pub fn note_loaded(&mut self, note: Note) {
        self.title = note.title.clone();
        self.content = note.content.clone();
        self.note = Some(note);
        self.not_found = false;
        self.saved = true;
        self.pending_save_at = None;
    }

    pub fn note_missing(&mut self) {
        self.note = None;
        self.not_found = true;
    }

    pub fn is_loading(&self) -> bool {
        self.note.is_none() && !self.not_found
    }

    pub fn is_dirty(&self) -> bool {
        !self.saved
    }

    /// The browser prompt is armed exactly while this is true.
    pub fn should_warn_on_leave(&self) -> bool {
        self.is_dirty()
    }

    /// A title keystroke: the field updates immediately, the session goes
    /// dirty, and the save deadline moves to `now + TITLE_AUTOSAVE_MS`
    /// (cancel-and-reschedule, so rapid typing keeps pushing it out).
    pub fn edit_title(&mut self, title: &str, now_ms: i64) {
        self.title = title.to_string();
        self.saved = false;
        self.pending_save_at = Some(now_ms + TITLE_AUTOSAVE_MS);
    }

    /// A change event from the editor engine. Content is persisted on blur,
    /// not on its own debounce; this only tracks the value and dirtiness.
    pub fn edit_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.saved = false;
    }

    /// Trailing edge of the debounce: returns the payload once the quiet
    /// period has elapsed, and at most once per scheduled deadline.
    pub fn take_due_save(&mut self, now_ms: i64) -> Option<SavePayload> {
        let due = self.pending_save_at?;
        if now_ms < due {
            return None;
        }
        self.pending_save_at = None;
        self.payload()
    }

    /// Blur: persist the full current pair unconditionally, independent of
    /// the debounce timer (which is cancelled so it cannot double-fire).
    pub fn flush(&mut self) -> Option<SavePayload> {
        self.pending_save_at = None;
        self.payload()
    }

    /// A completed save settles the session only if nothing changed while
    /// the request was in flight; a response for an older payload must not
    /// mark newer keystrokes as persisted.
    pub fn save_succeeded(&mut self, payload: &SavePayload) {
        let same_note = self.note.as_ref().is_some_and(|n| n.uuid == payload.uuid);
        if same_note && self.title == payload.title && self.content == payload.content {
            self.saved = true;
        }
    }

    fn payload(&self) -> Option<SavePayload> {
        let note = self.note.as_ref()?;
        Some(SavePayload {
            uuid: note.uuid.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    /// Deleted note was not open; only the sidebar list changes.
    SidebarOnly,
    /// Deleted the open note; go to the first remaining note (pre-deletion
    /// order).
    NavigateTo(String),
    /// Deleted the open note and nothing remains; create a fresh note.
    CreateReplacement,
}

/// Decide what deleting `deleted_uuid` does, given the pre-deletion list
/// and the currently open note. Returns the remaining list alongside.
pub(crate) fn delete_outcome(
    notes: &[Note],
    deleted_uuid: &str,
    current_uuid: Option<&str>,
) -> (Vec<Note>, DeleteOutcome) {
    let remaining: Vec<Note> = notes
        .iter()
        .filter(|n| n.uuid != deleted_uuid)
        .cloned()
        .collect();

    if current_uuid != Some(deleted_uuid) {
        return (remaining, DeleteOutcome::SidebarOnly);
    }

    let outcome = match remaining.first() {
        Some(first) => DeleteOutcome::NavigateTo(first.uuid.clone()),
        None => DeleteOutcome::CreateReplacement,
    };

    (remaining, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(uuid: &str, title: &str) -> Note {
        Note {
            uuid: uuid.to_string(),
            title: title.to_string(),
            content: "<p></p>".to_string(),
            created_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }

    fn loaded_session() -> EditSession {
        let mut s = EditSession::new();
        s.begin_load();
        s.note_loaded(note("n-1", "hello"));
        s
    }

    #[test]
    fn load_sequencing_states() {
        let mut s = EditSession::new();
        s.begin_load();
        assert!(s.is_loading());
        assert!(!s.not_found);

        s.note_loaded(note("n-1", "hello"));
        assert!(!s.is_loading());
        assert_eq!(s.title, "hello");
        assert!(!s.is_dirty());
    }

    #[test]
    fn missing_note_yields_not_found_never_editor() {
        let mut s = EditSession::new();
        s.begin_load();
        s.note_missing();
        assert!(s.not_found);
        assert!(s.note.is_none());
        assert!(!s.is_loading());
        // No note: nothing can be saved from this state.
        assert!(s.flush().is_none());
        assert!(s.take_due_save(i64::MAX).is_none());
    }

    #[test]
    fn rapid_typing_fires_at_most_one_save_with_last_title() {
        let mut s = loaded_session();
        s.edit_title("h", 0);
        s.edit_title("he", 300);
        s.edit_title("hel", 900);

        // Poll every 100ms across the whole window; count fires.
        let mut fired: Vec<SavePayload> = vec![];
        let mut t = 0;
        while t <= 4_000 {
            if let Some(p) = s.take_due_save(t) {
                fired.push(p);
            }
            t += 100;
        }

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].title, "hel");
        assert_eq!(fired[0].uuid, "n-1");
    }

    #[test]
    fn save_fires_only_after_full_quiet_period() {
        let mut s = loaded_session();
        s.edit_title("a", 0);
        assert!(s.take_due_save(1_999).is_none());

        s.edit_title("ab", 1_500); // reschedule
        assert!(s.take_due_save(2_000).is_none()); // old deadline is gone
        assert!(s.take_due_save(3_499).is_none());

        let p = s.take_due_save(3_500).expect("save should be due");
        assert_eq!(p.title, "ab");
        // Exactly once.
        assert!(s.take_due_save(10_000).is_none());
    }

    #[test]
    fn idle_after_typing_yields_exactly_one_save() {
        let mut s = loaded_session();
        s.edit_title("final", 100);
        let p = s.take_due_save(2_100).expect("save should be due");
        assert_eq!(p.title, "final");
        assert!(s.take_due_save(99_999).is_none());
    }

    #[test]
    fn blur_flushes_regardless_of_debounce_and_clears_dirty() {
        let mut s = loaded_session();
        s.edit_title("typed", 0);
        s.edit_content("<p>body</p>");
        assert!(s.is_dirty());

        // Blur well inside the quiet window.
        let p = s.flush().expect("blur always saves when a note is open");
        assert_eq!(p.title, "typed");
        assert_eq!(p.content, "<p>body</p>");

        s.save_succeeded(&p);
        assert!(!s.is_dirty());
        // The pending debounce was cancelled by the flush.
        assert!(s.take_due_save(10_000).is_none());
    }

    #[test]
    fn content_edits_mark_dirty_without_scheduling() {
        let mut s = loaded_session();
        s.edit_content("<p>x</p>");
        assert!(s.is_dirty());
        assert!(s.take_due_save(i64::MAX).is_none());
    }

    #[test]
    fn leave_warning_armed_iff_dirty() {
        let mut s = loaded_session();
        assert!(!s.should_warn_on_leave());

        s.edit_title("x", 0);
        assert!(s.should_warn_on_leave());

        let p = s.take_due_save(2_000).expect("save should be due");
        s.save_succeeded(&p);
        assert!(!s.should_warn_on_leave());

        s.edit_content("<p>y</p>");
        assert!(s.should_warn_on_leave());
    }

    #[test]
    fn stale_save_response_does_not_clear_newer_edits() {
        let mut s = loaded_session();
        s.edit_title("ab", 0);
        let in_flight = s.take_due_save(2_000).expect("save should be due");

        // Keystroke lands while the PUT is still on the wire.
        s.edit_title("abc", 2_100);

        // The response for "ab" must not mark "abc" as persisted.
        s.save_succeeded(&in_flight);
        assert!(s.is_dirty());
        assert!(s.should_warn_on_leave());

        // A response matching the current pair does settle the session.
        let current = s.flush().expect("note is open");
        s.save_succeeded(&current);
        assert!(!s.is_dirty());
    }

    #[test]
    fn save_response_for_another_note_is_ignored() {
        let mut s = loaded_session();
        s.edit_title("mine", 0);

        let foreign = SavePayload {
            uuid: "n-other".to_string(),
            title: "mine".to_string(),
            content: "<p></p>".to_string(),
        };
        s.save_succeeded(&foreign);
        assert!(s.is_dirty());
    }

    #[test]
    fn switching_notes_discards_pending_autosave() {
        let mut s = loaded_session();
        s.edit_title("stale", 0);
        s.begin_load();
        s.note_loaded(note("n-2", "other"));
        assert!(s.take_due_save(i64::MAX).is_none());
        assert!(!s.is_dirty());
        assert_eq!(s.title, "other");
    }

    #[test]
    fn delete_open_note_navigates_to_first_remaining() {
        let notes = vec![note("a", "A"), note("b", "B"), note("c", "C")];
        let (remaining, outcome) = delete_outcome(&notes, "b", Some("b"));
        assert_eq!(outcome, DeleteOutcome::NavigateTo("a".to_string()));
        assert_eq!(
            remaining.iter().map(|n| n.uuid.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );

        // Deleting the head falls through to the next in original order.
        let (_, outcome) = delete_outcome(&notes, "a", Some("a"));
        assert_eq!(outcome, DeleteOutcome::NavigateTo("b".to_string()));
    }

    #[test]
    fn delete_last_open_note_creates_replacement() {
        let notes = vec![note("only", "Only")];
        let (remaining, outcome) = delete_outcome(&notes, "only", Some("only"));
        assert!(remaining.is_empty());
        assert_eq!(outcome, DeleteOutcome::CreateReplacement);
    }

    #[test]
    fn delete_unopened_note_touches_only_the_sidebar() {
        let notes = vec![note("a", "A"), note("b", "B")];
        let (remaining, outcome) = delete_outcome(&notes, "b", Some("a"));
        assert_eq!(outcome, DeleteOutcome::SidebarOnly);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].uuid, "a");
    }
}

// Task list store with write-through persistence

use crate::filter::{self, StatusFilter};
use crate::slot::Slot;
use crate::task::{Priority, RawTask, Stamp, Task, TaskId};
use eyre::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Key the task list is stored under
pub const SLOT_KEY: &str = "todoList";

pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";
pub const DEFAULT_TIME_FORMAT: &str = "%I:%M %p";

/// How a store treats priorities, old records and timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Track a priority per task (defaults to medium). When off, no task carries one.
    pub priorities: bool,
    /// Fill in missing fields on load and rewrite the slot if anything changed
    pub backfill: bool,
    /// strftime format for the creation date
    pub date_format: String,
    /// strftime format for the creation time
    pub time_format: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            priorities: true,
            backfill: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl StoreOptions {
    /// The variant without priorities or back-filling
    pub fn plain() -> Self {
        Self {
            priorities: false,
            backfill: false,
            ..Self::default()
        }
    }
}

/// A task currently being edited inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub id: TaskId,
    pub text: String,
}

/// Transient UI state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub draft: String,
    pub draft_priority: Priority,
    pub edit: Option<Edit>,
    pub filter: StatusFilter,
    pub search: String,
}

/// Ordered task list mirrored to a persistence slot after every mutation
///
/// Mutations are staged on a copy of the list, written to the slot, and only
/// then committed in memory. A failed write leaves the store unchanged.
pub struct TaskListStore<S: Slot> {
    slot: S,
    options: StoreOptions,
    tasks: Vec<Task>,
    last_id: u64,
    view: ViewState,
}

impl<S: Slot> TaskListStore<S> {
    /// Load the task list from `slot`
    ///
    /// Absent or unparseable data yields an empty list. The only error is a
    /// failed rewrite after back-filling.
    pub fn open(slot: S, options: StoreOptions) -> Result<Self> {
        let raw = match slot.read(SLOT_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = SLOT_KEY, error = ?e, "Failed to read slot, starting empty");
                None
            }
        };

        let entries = raw.as_deref().map(parse_entries).unwrap_or_default();

        let mut store = Self {
            slot,
            options,
            tasks: Vec::new(),
            last_id: 0,
            view: ViewState::default(),
        };

        let changed = store.hydrate(entries);
        if changed && store.options.backfill {
            info!(count = store.tasks.len(), "Back-filled missing task fields, rewriting slot");
            Self::persist(&mut store.slot, &store.tasks)?;
        }

        info!(count = store.tasks.len(), "Opened task list");
        Ok(store)
    }

    /// Turn loosely typed entries into tasks. Returns true if any entry was normalized.
    fn hydrate(&mut self, entries: Vec<RawTask>) -> bool {
        self.last_id = entries
            .iter()
            .filter_map(RawTask::parsed_id)
            .map(|id| id.0)
            .max()
            .unwrap_or(0);

        let stamp = self.stamp();
        let mut seen = HashSet::new();
        let mut changed = false;

        for raw in entries {
            let id = match raw.parsed_id() {
                Some(id) if seen.insert(id) => id,
                other => {
                    let id = self.next_id();
                    warn!(old = ?other, new = %id, "Assigned fresh id to task");
                    seen.insert(id);
                    changed = true;
                    id
                }
            };

            // Ids that only parsed after coercion are rewritten as integers
            if !matches!(raw.id.as_ref().and_then(Value::as_u64), Some(n) if n == id.0) {
                changed = true;
            }

            let completed = raw.parsed_completed().unwrap_or_else(|| {
                changed = true;
                false
            });

            let (date, time) = if self.options.backfill {
                let date = raw.non_empty_date().map(str::to_string).unwrap_or_else(|| {
                    changed = true;
                    stamp.date.clone()
                });
                let time = raw.non_empty_time().map(str::to_string).unwrap_or_else(|| {
                    changed = true;
                    stamp.time.clone()
                });
                (date, time)
            } else {
                (raw.date.clone().unwrap_or_default(), raw.time.clone().unwrap_or_default())
            };

            let priority = if !self.options.priorities {
                if raw.priority.is_some() {
                    changed = true;
                }
                None
            } else {
                match raw.parsed_priority() {
                    Some(p) => Some(p),
                    None if self.options.backfill => {
                        changed = true;
                        Some(Priority::default())
                    }
                    None => None,
                }
            };

            self.tasks.push(Task {
                id,
                text: raw.text,
                completed,
                date,
                time,
                priority,
            });
        }

        changed
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Tasks still left to complete
    pub fn remaining(&self) -> usize {
        filter::remaining(&self.tasks)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Prepend a new task
    ///
    /// Returns `None` without touching anything if `text` is blank.
    pub fn add(&mut self, text: &str, priority: Option<Priority>) -> Result<Option<TaskId>> {
        if text.trim().is_empty() {
            debug!("add: rejected blank text");
            return Ok(None);
        }

        let priority = self.options.priorities.then(|| priority.unwrap_or_default());
        let id = self.next_id();
        let task = Task::new(id, text.to_string(), priority, self.stamp());

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task);
        next.extend(self.tasks.iter().cloned());
        self.commit(next)?;

        info!(%id, "Added task");
        Ok(Some(id))
    }

    /// Add a task from the draft in the view state, then reset the draft
    pub fn submit_draft(&mut self) -> Result<Option<TaskId>> {
        let text = self.view.draft.clone();
        let id = self.add(&text, Some(self.view.draft_priority))?;

        if id.is_some() {
            self.view.draft.clear();
            self.view.draft_priority = Priority::default();
        }
        Ok(id)
    }

    /// Remove a task. Returns false if no task has this id.
    pub fn remove(&mut self, id: TaskId) -> Result<bool> {
        if self.get(id).is_none() {
            debug!(%id, "remove: no such task");
            return Ok(false);
        }

        let next = self.tasks.iter().filter(|t| t.id != id).cloned().collect();
        self.commit(next)?;

        if self.view.edit.as_ref().is_some_and(|e| e.id == id) {
            self.view.edit = None;
        }

        info!(%id, "Removed task");
        Ok(true)
    }

    pub fn begin_edit(&mut self, id: TaskId, current_text: &str) {
        self.view.edit = Some(Edit {
            id,
            text: current_text.to_string(),
        });
    }

    /// Update the pending edit text; ignored when nothing is being edited
    pub fn set_edit_text(&mut self, text: &str) {
        if let Some(edit) = self.view.edit.as_mut() {
            edit.text = text.to_string();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.view.edit = None;
    }

    /// Replace the text of the task under edit and leave edit mode
    ///
    /// Blank text is rejected and the edit stays open.
    pub fn commit_edit(&mut self, new_text: &str) -> Result<bool> {
        if new_text.trim().is_empty() {
            debug!("commit_edit: rejected blank text");
            return Ok(false);
        }

        let Some(edit) = self.view.edit.clone() else {
            debug!("commit_edit: nothing under edit");
            return Ok(false);
        };

        if self.get(edit.id).is_none() {
            warn!(id = %edit.id, "commit_edit: task under edit no longer exists");
            self.view.edit = None;
            return Ok(false);
        }

        let next = self
            .tasks
            .iter()
            .map(|t| {
                if t.id == edit.id {
                    Task {
                        text: new_text.to_string(),
                        ..t.clone()
                    }
                } else {
                    t.clone()
                }
            })
            .collect();
        self.commit(next)?;
        self.view.edit = None;

        info!(id = %edit.id, "Edited task");
        Ok(true)
    }

    /// Flip `completed` on one task. Returns false if no task has this id.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<bool> {
        if self.get(id).is_none() {
            debug!(%id, "toggle_complete: no such task");
            return Ok(false);
        }

        let next = self
            .tasks
            .iter()
            .map(|t| {
                let mut t = t.clone();
                if t.id == id {
                    t.completed = !t.completed;
                }
                t
            })
            .collect();
        self.commit(next)?;

        debug!(%id, "Toggled task");
        Ok(true)
    }

    /// Drop every completed task. Returns how many were removed.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let next: Vec<Task> = self.tasks.iter().filter(|t| !t.completed).cloned().collect();
        let removed = self.tasks.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        let edit_cleared = self
            .view
            .edit
            .as_ref()
            .is_some_and(|e| !next.iter().any(|t| t.id == e.id));
        self.commit(next)?;
        if edit_cleared {
            self.view.edit = None;
        }

        info!(removed, "Cleared completed tasks");
        Ok(removed)
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn visible_tasks(&self, filter: StatusFilter, search: &str) -> Vec<&Task> {
        filter::visible_tasks(&self.tasks, filter, search)
    }

    /// Visible tasks for the filter and search held in the view state
    pub fn visible(&self) -> Vec<&Task> {
        self.visible_tasks(self.view.filter, &self.view.search)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        Self::persist(&mut self.slot, &next)?;
        self.tasks = next;
        Ok(())
    }

    fn persist(slot: &mut S, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks).context("Failed to serialize task list")?;
        slot.write(SLOT_KEY, &json).context("Failed to write task list")?;
        debug!(count = tasks.len(), "Persisted task list");
        Ok(())
    }

    /// Next id, strictly above every id seen so far
    fn next_id(&mut self) -> TaskId {
        let id = now_ms().max(self.last_id.saturating_add(1));
        self.last_id = id;
        TaskId(id)
    }

    fn stamp(&self) -> Stamp {
        Stamp::now(&self.options.date_format, &self.options.time_format)
    }
}

/// Parse the slot content, skipping entries that are not tasks
fn parse_entries(content: &str) -> Vec<RawTask> {
    let values: Vec<Value> = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            warn!(key = SLOT_KEY, error = ?e, "Failed to parse task list, starting empty");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<RawTask>(value) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(index, error = ?e, "Failed to parse task, skipping");
                None
            }
        })
        .collect()
}

// Helper function for ids
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{FileSlot, MemorySlot};
    use eyre::eyre;
    use tempfile::TempDir;

    fn open_memory() -> TaskListStore<MemorySlot> {
        TaskListStore::open(MemorySlot::new(), StoreOptions::default()).unwrap()
    }

    fn persisted(store: &TaskListStore<MemorySlot>) -> Vec<Task> {
        serde_json::from_str(store.slot().get(SLOT_KEY).unwrap()).unwrap()
    }

    // Slot whose writes can be switched off
    #[derive(Default)]
    struct FlakySlot {
        inner: MemorySlot,
        fail_writes: bool,
    }

    impl Slot for FlakySlot {
        fn read(&self, key: &str) -> Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                return Err(eyre!("disk full"));
            }
            self.inner.write(key, value)
        }
    }

    #[test]
    fn test_open_empty_slot() {
        let store = open_memory();
        assert!(store.is_empty());
        // Nothing to back-fill, nothing written
        assert!(store.slot().get(SLOT_KEY).is_none());
    }

    #[test]
    fn test_open_unparseable_slot_starts_empty() {
        for content in ["not json", "{\"id\":1}", "null", ""] {
            let slot = MemorySlot::with_entry(SLOT_KEY, content);
            let store = TaskListStore::open(slot, StoreOptions::default()).unwrap();
            assert!(store.is_empty(), "content {:?} should load as empty", content);
        }
    }

    #[test]
    fn test_add_prepends_and_persists() {
        let mut store = open_memory();

        let first = store.add("First", None).unwrap().unwrap();
        let second = store.add("Second", Some(Priority::Low)).unwrap().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.tasks()[0].id, second);
        assert_eq!(store.tasks()[1].id, first);
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.tasks()[0].priority, Some(Priority::Low));
        assert_eq!(store.tasks()[1].priority, Some(Priority::Medium));
        assert!(!store.tasks()[0].date.is_empty());
        assert!(!store.tasks()[0].time.is_empty());
        assert!(second > first);

        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let mut store = open_memory();
        store.add("keep", None).unwrap();
        let before = store.tasks().to_vec();

        assert_eq!(store.add("", None).unwrap(), None);
        assert_eq!(store.add("   ", Some(Priority::High)).unwrap(), None);
        assert_eq!(store.add("\t\n", None).unwrap(), None);

        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(persisted(&store), before);
    }

    #[test]
    fn test_add_keeps_text_as_typed() {
        let mut store = open_memory();
        store.add("  padded  ", None).unwrap();
        assert_eq!(store.tasks()[0].text, "  padded  ");
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = open_memory();
        let a = store.add("a", None).unwrap().unwrap();
        store.remove(a).unwrap();
        let b = store.add("b", None).unwrap().unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_toggle_flips_only_target() {
        let mut store = open_memory();
        let a = store.add("a", None).unwrap().unwrap();
        let b = store.add("b", Some(Priority::High)).unwrap().unwrap();
        let before = store.tasks().to_vec();

        assert!(store.toggle_complete(b).unwrap());

        let after = store.tasks();
        assert!(after[0].completed);
        assert_eq!(
            Task {
                completed: false,
                ..after[0].clone()
            },
            before[0]
        );
        assert_eq!(after[1], before[1]);
        assert!(!store.get(a).unwrap().completed);

        assert!(store.toggle_complete(b).unwrap());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_toggle_missing_id_is_noop() {
        let mut store = open_memory();
        store.add("a", None).unwrap();
        let before = store.tasks().to_vec();

        assert!(!store.toggle_complete(TaskId(1)).unwrap());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = open_memory();
        let a = store.add("a", None).unwrap().unwrap();
        let b = store.add("b", None).unwrap().unwrap();

        assert!(store.remove(a).unwrap());
        assert!(!store.remove(a).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tasks()[0].id, b);
        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn test_edit_flow() {
        let mut store = open_memory();
        let id = store.add("Buy milk", Some(Priority::High)).unwrap().unwrap();
        let before = store.get(id).unwrap().clone();

        store.begin_edit(id, &before.text);
        assert_eq!(
            store.view().edit,
            Some(Edit {
                id,
                text: "Buy milk".to_string()
            })
        );

        store.set_edit_text("Buy oat milk");
        assert_eq!(store.view().edit.as_ref().unwrap().text, "Buy oat milk");

        assert!(store.commit_edit("Buy oat milk").unwrap());
        assert!(store.view().edit.is_none());

        let after = store.get(id).unwrap();
        assert_eq!(after.text, "Buy oat milk");
        assert_eq!(after.id, before.id);
        assert_eq!(after.date, before.date);
        assert_eq!(after.time, before.time);
        assert_eq!(after.priority, before.priority);
        assert_eq!(after.completed, before.completed);
        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn test_commit_edit_rejects_blank_and_keeps_edit() {
        let mut store = open_memory();
        let id = store.add("text", None).unwrap().unwrap();
        store.begin_edit(id, "text");

        assert!(!store.commit_edit("  ").unwrap());
        assert!(store.view().edit.is_some());
        assert_eq!(store.get(id).unwrap().text, "text");
    }

    #[test]
    fn test_cancel_edit_has_no_persistence_effect() {
        let mut store = open_memory();
        let id = store.add("text", None).unwrap().unwrap();
        let snapshot = store.slot().get(SLOT_KEY).unwrap().to_string();

        store.begin_edit(id, "text");
        store.set_edit_text("changed");
        store.cancel_edit();

        assert!(store.view().edit.is_none());
        assert_eq!(store.slot().get(SLOT_KEY).unwrap(), snapshot);
        assert!(!store.commit_edit("changed").unwrap());
        assert_eq!(store.get(id).unwrap().text, "text");
    }

    #[test]
    fn test_remove_clears_edit_of_removed_task() {
        let mut store = open_memory();
        let id = store.add("text", None).unwrap().unwrap();
        store.begin_edit(id, "text");

        store.remove(id).unwrap();
        assert!(store.view().edit.is_none());
    }

    #[test]
    fn test_clear_completed_clears_edit_of_cleared_task() {
        let mut store = open_memory();
        let keep = store.add("keep", None).unwrap().unwrap();
        let done = store.add("done", None).unwrap().unwrap();
        store.toggle_complete(done).unwrap();

        // Editing a task that survives is left alone
        store.begin_edit(keep, "keep");
        assert_eq!(store.clear_completed().unwrap(), 1);
        assert_eq!(store.view().edit.as_ref().map(|e| e.id), Some(keep));

        let gone = store.add("gone", None).unwrap().unwrap();
        store.toggle_complete(gone).unwrap();
        store.begin_edit(gone, "gone");
        assert_eq!(store.clear_completed().unwrap(), 1);
        assert!(store.view().edit.is_none());
        assert!(!store.commit_edit("revived").unwrap());
        assert!(store.get(gone).is_none());
    }

    #[test]
    fn test_clear_completed_preserves_order() {
        let mut store = open_memory();
        let ids: Vec<TaskId> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|t| store.add(t, None).unwrap().unwrap())
            .collect();
        // Stored order is e, d, c, b, a
        store.toggle_complete(ids[1]).unwrap();
        store.toggle_complete(ids[3]).unwrap();

        assert_eq!(store.clear_completed().unwrap(), 2);

        let texts: Vec<&str> = store.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["e", "c", "a"]);
        assert!(store.tasks().iter().all(|t| !t.completed));
        assert_eq!(store.clear_completed().unwrap(), 0);
        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn test_visible_tasks_partition() {
        let mut store = open_memory();
        let a = store.add("alpha", None).unwrap().unwrap();
        store.add("beta", None).unwrap();
        let c = store.add("Gamma alpha", None).unwrap().unwrap();
        store.toggle_complete(a).unwrap();

        let done: Vec<TaskId> = store
            .visible_tasks(StatusFilter::Completed, "")
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(done, vec![a]);

        let active = store.visible_tasks(StatusFilter::Active, "");
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|t| !t.completed));

        let found: Vec<TaskId> = store
            .visible_tasks(StatusFilter::All, "ALPHA")
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(found, vec![c, a]);

        store.view_mut().filter = StatusFilter::Active;
        store.view_mut().search = "alp".to_string();
        let view: Vec<TaskId> = store.visible().iter().map(|t| t.id).collect();
        assert_eq!(view, vec![c]);
        assert_eq!(store.remaining(), 2);
    }

    #[test]
    fn test_submit_draft_resets_draft() {
        let mut store = open_memory();

        store.view_mut().draft = "   ".to_string();
        store.view_mut().draft_priority = Priority::High;
        assert_eq!(store.submit_draft().unwrap(), None);
        assert_eq!(store.view().draft_priority, Priority::High);

        store.view_mut().draft = "Water plants".to_string();
        let id = store.submit_draft().unwrap().unwrap();
        assert_eq!(store.get(id).unwrap().priority, Some(Priority::High));
        assert!(store.view().draft.is_empty());
        assert_eq!(store.view().draft_priority, Priority::Medium);
    }

    #[test]
    fn test_buy_milk_scenario() {
        let mut store = open_memory();

        let id = store.add("Buy milk", Some(Priority::High)).unwrap().unwrap();
        let json: Value = serde_json::from_str(store.slot().get(SLOT_KEY).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["text"], "Buy milk");
        assert_eq!(json[0]["completed"], false);
        assert_eq!(json[0]["priority"], "high");

        store.toggle_complete(id).unwrap();
        assert!(store.get(id).unwrap().completed);

        store.clear_completed().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.slot().get(SLOT_KEY), Some("[]"));
    }

    #[test]
    fn test_backfill_legacy_record() {
        let slot = MemorySlot::with_entry(SLOT_KEY, r#"[{"id":1,"text":"old"}]"#);
        let store = TaskListStore::open(slot, StoreOptions::default()).unwrap();

        let task = &store.tasks()[0];
        assert_eq!(task.id, TaskId(1));
        assert_eq!(task.text, "old");
        assert!(!task.completed);
        assert_eq!(task.priority, Some(Priority::Medium));
        assert!(!task.date.is_empty());
        assert!(!task.time.is_empty());

        // Slot rewritten with the back-filled shape
        let json: Value = serde_json::from_str(store.slot().get(SLOT_KEY).unwrap()).unwrap();
        assert_eq!(json[0]["priority"], "medium");
        assert_eq!(json[0]["completed"], false);
        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn test_complete_records_are_not_rewritten() {
        let content = concat!(
            r#"[{"id":5,"text":"done","completed":true,"#,
            r#""date":"1/2/2025","time":"08:00 AM","priority":"low"}]"#
        );
        let slot = MemorySlot::with_entry(SLOT_KEY, content);
        let store = TaskListStore::open(slot, StoreOptions::default()).unwrap();

        assert_eq!(store.slot().get(SLOT_KEY), Some(content));
        let task = &store.tasks()[0];
        assert!(task.completed);
        assert_eq!(task.date, "1/2/2025");
        assert_eq!(task.priority, Some(Priority::Low));
    }

    #[test]
    fn test_load_repairs_ids() {
        let content = r#"[
            {"id":1760860000000.75,"text":"float id","completed":false,
             "date":"d","time":"t","priority":"low"},
            {"id":3,"text":"dup a","completed":false,"date":"d","time":"t","priority":"low"},
            {"id":3,"text":"dup b","completed":false,"date":"d","time":"t","priority":"low"},
            {"text":"no id","completed":false,"date":"d","time":"t","priority":"low"},
            {"id":9,"completed":true}
        ]"#;
        let slot = MemorySlot::with_entry(SLOT_KEY, content);
        let mut store = TaskListStore::open(slot, StoreOptions::default()).unwrap();

        // Entry without text is dropped
        assert_eq!(store.len(), 4);
        assert_eq!(store.tasks()[0].id, TaskId(1760860000000));
        assert_eq!(store.tasks()[1].id, TaskId(3));

        let ids: HashSet<TaskId> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(store.tasks()[2].id.0 > 1760860000000);
        assert!(store.tasks()[3].id > store.tasks()[2].id);

        let fresh = store.add("new", None).unwrap().unwrap();
        assert!(fresh > store.tasks()[4].id);
        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn test_plain_configuration() {
        let content = r#"[{"id":2,"text":"legacy","priority":"high"}]"#;
        let slot = MemorySlot::with_entry(SLOT_KEY, content);
        let mut store = TaskListStore::open(slot, StoreOptions::plain()).unwrap();

        // No back-fill means no rewrite on open
        assert_eq!(store.slot().get(SLOT_KEY), Some(content));
        assert_eq!(store.tasks()[0].priority, None);
        assert_eq!(store.tasks()[0].date, "");

        store.add("fresh", Some(Priority::High)).unwrap();
        assert_eq!(store.tasks()[0].priority, None);
        assert!(!store.tasks()[0].date.is_empty());
        assert!(!store.slot().get(SLOT_KEY).unwrap().contains("priority"));
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let mut store = TaskListStore::open(FlakySlot::default(), StoreOptions::default()).unwrap();
        let id = store.add("stable", None).unwrap().unwrap();
        let before = store.tasks().to_vec();
        let snapshot = store.slot().inner.get(SLOT_KEY).unwrap().to_string();

        store.slot.fail_writes = true;
        assert!(store.add("lost", None).is_err());
        assert!(store.toggle_complete(id).is_err());
        assert!(store.remove(id).is_err());

        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.slot().inner.get(SLOT_KEY).unwrap(), snapshot);
    }

    #[test]
    fn test_oversized_ids_get_fresh_ids_on_open() {
        let content = r#"[{"id":18446744073709551615,"text":"big"},{"text":"no id"}]"#;
        let slot = MemorySlot::with_entry(SLOT_KEY, content);
        let mut store = TaskListStore::open(slot, StoreOptions::default()).unwrap();

        assert_eq!(store.len(), 2);
        assert_ne!(store.tasks()[0].id, store.tasks()[1].id);
        assert!(store.tasks().iter().all(|t| t.id.0 <= crate::task::MAX_ID));
        assert_eq!(persisted(&store), store.tasks());

        let fresh = store.add("new", None).unwrap().unwrap();
        assert!(fresh > store.tasks()[2].id);
    }

    #[test]
    fn test_add_at_id_ceiling_does_not_panic() {
        let mut store = open_memory();
        store.last_id = u64::MAX;

        let id = store.add("edge", None).unwrap().unwrap();
        assert_eq!(id, TaskId(u64::MAX));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unreadable_file_slot_starts_empty() {
        let temp = TempDir::new().unwrap();
        let slot = FileSlot::open(temp.path()).unwrap();
        let path = slot.path_for(SLOT_KEY).unwrap();
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let store = TaskListStore::open(slot, StoreOptions::default()).unwrap();
        assert!(store.is_empty());
        // Nothing normalized, so the unreadable file is left as it was
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xff, 0xfe, 0x00, 0xc3]);
    }

    #[test]
    fn test_round_trip_through_file_slot() {
        let temp = TempDir::new().unwrap();

        let expected = {
            let slot = FileSlot::open(temp.path()).unwrap();
            let mut store = TaskListStore::open(slot, StoreOptions::default()).unwrap();
            let a = store.add("Write report", Some(Priority::High)).unwrap().unwrap();
            store.add("Read book", Some(Priority::Low)).unwrap();
            store.toggle_complete(a).unwrap();
            store.tasks().to_vec()
        };

        assert!(temp.path().join("todoList.json").exists());

        let slot = FileSlot::open(temp.path()).unwrap();
        let reopened = TaskListStore::open(slot, StoreOptions::default()).unwrap();
        assert_eq!(reopened.tasks(), expected.as_slice());
    }
}

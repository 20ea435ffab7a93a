use crate::error::StoreError;
use crate::form::{EditingSession, FormState};
use crate::notify::{NotificationKind, Notifier};
use crate::record::Record;
use crate::schema::SchemaRegistry;
use crate::store::DataStore;
use std::sync::Arc;

/// Pure search view over a set of rows: a record matches if any of its field
/// values, stringified and lower-cased, contains the lower-cased term as a
/// substring. The empty term matches everything.
pub fn search(term: &str, rows: &[Record]) -> Vec<Record> {
    let needle = term.to_lowercase();
    rows.iter().filter(|r| r.matches(&needle)).cloned().collect()
}

/// Orchestrates load, search, create, update and delete against one named
/// collection. Owns the collection's rows from activation until the controller
/// is rebound to another name; store failures are absorbed here and surfaced
/// as error notifications, never propagated to callers.
pub struct CollectionController {
    collection: String,
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
    rows: Vec<Record>,
    loading: bool,
    generation: u64,
    editing: EditingSession,
}

impl CollectionController {
    pub fn new(
        collection: &str,
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn DataStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            registry,
            store,
            notifier,
            rows: Vec::new(),
            loading: false,
            generation: 0,
            editing: EditingSession::Closed,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn editing(&self) -> &EditingSession {
        &self.editing
    }

    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        self.editing.form_mut()
    }

    /// Rebinds the controller to another collection: drops the owned rows,
    /// closes any editing session and supersedes in-flight loads.
    pub fn activate(&mut self, collection: &str) {
        self.collection = collection.to_string();
        self.rows.clear();
        self.editing = EditingSession::Closed;
        self.generation += 1;
    }

    /// Marks the controller loading and returns the generation the caller
    /// must hand back to [`Self::finish_load`].
    pub fn begin_load(&mut self) -> u64 {
        self.loading = true;
        self.generation
    }

    /// Clears the loading flag on every path. A fetch belonging to a
    /// superseded activation is discarded, not merged; a failed fetch keeps
    /// the prior rows and notifies. Returns whether the rows were replaced.
    pub fn finish_load(&mut self, generation: u64, fetched: Result<Vec<Record>, StoreError>) -> bool {
        self.loading = false;
        if generation != self.generation {
            return false;
        }
        match fetched {
            Ok(rows) => {
                self.rows = rows;
                true
            }
            Err(e) => {
                self.notify_error("Load failed", &format!("could not load `{}`: {e}", self.collection));
                false
            }
        }
    }

    /// Fetches the full collection contents from the store.
    pub async fn load(&mut self) -> bool {
        let generation = self.begin_load();
        let fetched = self.store.fetch_all(&self.collection).await;
        self.finish_load(generation, fetched)
    }

    /// Filtered view of the owned rows; never mutates them.
    pub fn search(&self, term: &str) -> Vec<Record> {
        search(term, &self.rows)
    }

    /// Displayed columns, derived from the schema registry field list (stable,
    /// independent of record order and content): `id` first, then schema
    /// order. Empty for a collection the registry does not know.
    pub fn columns(&self) -> Vec<String> {
        let fields = self.registry.fields(&self.collection);
        if fields.is_empty() {
            return Vec::new();
        }
        let mut columns = Vec::with_capacity(fields.len() + 1);
        columns.push("id".to_string());
        columns.extend(fields.iter().map(|f| f.name.clone()));
        columns
    }

    /// Opens a creating session with schema defaults: 0 for number fields,
    /// empty string otherwise.
    pub fn begin_create(&mut self) -> &FormState {
        let form = FormState::for_create(self.registry.fields(&self.collection));
        self.editing = EditingSession::Creating(form);
        match self.editing.form() {
            Some(form) => form,
            None => unreachable!("session was just opened"),
        }
    }

    /// Opens an editing session targeting the record, form pre-filled from it
    /// verbatim.
    pub fn begin_edit(&mut self, record: &Record) -> &FormState {
        let form = FormState::for_edit(self.registry.fields(&self.collection), record);
        self.editing = EditingSession::Editing { target_id: record.id, form };
        match self.editing.form() {
            Some(form) => form,
            None => unreachable!("session was just opened"),
        }
    }

    /// Closes the editing session without saving.
    pub fn cancel(&mut self) {
        self.editing = EditingSession::Closed;
    }

    /// Writes the open session through the store. Editing a target replaces
    /// the record sharing its id, the id never taken from form input; creating
    /// appends with id `max(existing ids, 0) + 1`. Success closes the session
    /// and notifies; failure keeps the session open and the rows unmodified.
    pub async fn save(&mut self) -> Option<Record> {
        let (form, target) = match &self.editing {
            EditingSession::Closed => return None,
            EditingSession::Creating(form) => (form.clone(), None),
            EditingSession::Editing { target_id, form } => (form.clone(), Some(*target_id)),
        };
        let outcome = match target {
            Some(id) => self.store.update(&self.collection, id, form.into_record(id)).await,
            None => {
                let new_id = self.rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
                self.store.insert(&self.collection, form.into_record(new_id)).await
            }
        };
        match outcome {
            Ok(saved) => {
                match self.rows.iter_mut().find(|r| r.id == saved.id) {
                    Some(row) => *row = saved.clone(),
                    None => self.rows.push(saved.clone()),
                }
                self.editing = EditingSession::Closed;
                let title = if target.is_some() { "Record updated" } else { "Record created" };
                self.notify_success(title, &format!("record {} saved in `{}`", saved.id, self.collection));
                Some(saved)
            }
            Err(e) => {
                // Session stays open so the operator can retry.
                self.notify_error("Save failed", &format!("could not save into `{}`: {e}", self.collection));
                None
            }
        }
    }

    /// Store-confirmed removal: local rows change only after the store
    /// acknowledges. An id the store no longer has counts as done.
    pub async fn delete(&mut self, id: u64) -> bool {
        match self.store.remove(&self.collection, id).await {
            Ok(()) | Err(StoreError::NotFound { .. }) => {
                self.rows.retain(|r| r.id != id);
                self.notify_success("Record deleted", &format!("record {id} removed from `{}`", self.collection));
                true
            }
            Err(e) => {
                self.notify_error("Delete failed", &format!("could not delete from `{}`: {e}", self.collection));
                false
            }
        }
    }

    fn notify_success(&self, title: &str, message: &str) {
        self.notifier.notify(NotificationKind::Success, title, message);
    }

    fn notify_error(&self, title: &str, message: &str) {
        self.notifier.notify(NotificationKind::Error, title, message);
    }
}

//! Edit flow for a single day's entry.
//!
//! `Idle → Editing → Saving → Idle`, with the delete branch
//! `Editing → ConfirmingDelete → Deleting → Idle`. The store is the source
//! of truth: a successful save or delete triggers a full re-fetch of the
//! entry map, never a local merge, and a failed call drops back to the
//! prior interactive state with the error surfaced. Overlapping saves race
//! at the store and the last write wins.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::entry::EntryBody;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Both outcome flags must be set before saving")]
    IncompleteDraft,

    #[error("No delete confirmation pending")]
    NotConfirming,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Backing store for a user's entries. Implemented over the HTTP API by
/// clients and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait EntryStore {
    async fn fetch_all(&self) -> Result<BTreeMap<NaiveDate, EntryBody>, StoreError>;
    async fn upsert(&self, date: NaiveDate, body: &EntryBody) -> Result<(), StoreError>;
    async fn delete(&self, date: NaiveDate) -> Result<(), StoreError>;
}

/// The viewer's in-memory entry map, refreshed wholesale from the store.
#[derive(Debug, Default)]
pub struct EntryBook {
    entries: BTreeMap<NaiveDate, EntryBody>,
}

impl EntryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<NaiveDate, EntryBody> {
        &self.entries
    }

    pub fn get(&self, date: NaiveDate) -> Option<&EntryBody> {
        self.entries.get(&date)
    }

    /// Replace the whole map with the store's current contents.
    pub async fn refresh<S: EntryStore>(&mut self, store: &S) -> Result<(), StoreError> {
        self.entries = store.fetch_all().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing,
    Saving,
    ConfirmingDelete,
    Deleting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    pub success: Option<bool>,
    pub happy: Option<bool>,
    pub notes: String,
}

impl EntryDraft {
    fn seeded(existing: &EntryBody) -> Self {
        Self {
            success: Some(existing.success),
            happy: Some(existing.happy),
            notes: existing.notes.clone(),
        }
    }

    pub fn complete(&self) -> bool {
        self.success.is_some() && self.happy.is_some()
    }

    /// Persistable form; notes are trimmed of surrounding whitespace.
    fn body(&self) -> Option<EntryBody> {
        Some(EntryBody {
            success: self.success?,
            happy: self.happy?,
            notes: self.notes.trim().to_string(),
        })
    }
}

#[derive(Debug)]
pub struct EntryEditFlow {
    date: NaiveDate,
    state: EditState,
    draft: EntryDraft,
    last_error: Option<StoreError>,
}

impl EntryEditFlow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            state: EditState::Idle,
            draft: EntryDraft::default(),
            last_error: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn draft(&self) -> &EntryDraft {
        &self.draft
    }

    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    /// Begin editing, seeding the draft from the existing entry if present.
    pub fn open(&mut self, existing: Option<&EntryBody>) {
        self.draft = existing.map(EntryDraft::seeded).unwrap_or_default();
        self.last_error = None;
        self.state = EditState::Editing;
    }

    pub fn set_success(&mut self, value: bool) {
        if self.state == EditState::Editing {
            self.draft.success = Some(value);
        }
    }

    pub fn set_happy(&mut self, value: bool) {
        if self.state == EditState::Editing {
            self.draft.happy = Some(value);
        }
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        if self.state == EditState::Editing {
            self.draft.notes = notes.into();
        }
    }

    pub fn clear(&mut self) {
        if self.state == EditState::Editing {
            self.draft = EntryDraft::default();
        }
    }

    pub fn can_save(&self) -> bool {
        self.state == EditState::Editing && self.draft.complete()
    }

    /// Close the editor without persisting anything.
    pub fn cancel(&mut self) {
        if matches!(self.state, EditState::Editing | EditState::ConfirmingDelete) {
            self.state = EditState::Idle;
        }
    }

    /// Upsert the draft. An incomplete draft is rejected before any store
    /// call; a store failure returns the flow to `Editing`.
    pub async fn save<S: EntryStore>(
        &mut self,
        store: &S,
        book: &mut EntryBook,
    ) -> Result<(), FlowError> {
        if !self.can_save() {
            return Err(FlowError::IncompleteDraft);
        }
        // complete() held above, so the body exists.
        let body = self.draft.body().ok_or(FlowError::IncompleteDraft)?;

        self.state = EditState::Saving;
        match store.upsert(self.date, &body).await {
            Ok(()) => {
                self.state = EditState::Idle;
                self.last_error = None;
                book.refresh(store).await?;
                Ok(())
            }
            Err(e) => {
                self.state = EditState::Editing;
                self.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Ask for delete confirmation. The destructive call is only issued
    /// from `confirm_delete`.
    pub fn request_delete(&mut self) {
        if self.state == EditState::Editing {
            self.state = EditState::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        if self.state == EditState::ConfirmingDelete {
            self.state = EditState::Editing;
        }
    }

    pub async fn confirm_delete<S: EntryStore>(
        &mut self,
        store: &S,
        book: &mut EntryBook,
    ) -> Result<(), FlowError> {
        if self.state != EditState::ConfirmingDelete {
            return Err(FlowError::NotConfirming);
        }

        self.state = EditState::Deleting;
        match store.delete(self.date).await {
            Ok(()) => {
                self.state = EditState::Idle;
                self.last_error = None;
                book.refresh(store).await?;
                Ok(())
            }
            Err(e) => {
                self.state = EditState::Editing;
                self.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }
}

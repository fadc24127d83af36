//! The working set of fountains near the user.

use berez_api::error::ApiError;
use berez_api::fountain::Fountain;
use berez_api::location::Coordinates;
use berez_api::source::FountainSource;
use berez_data::rating::{apply_optimistic, RatingError};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectoryError {
    #[error("failed to fetch fountains near {at}: {source}")]
    Fetch { at: Coordinates, source: ApiError },

    #[error("failed to fetch fountain {id}: {source}")]
    FetchOne { id: i64, source: ApiError },
}

impl DirectoryError {
    /// A failed proximity fetch is always retried by the next tick. A single
    /// fountain lookup is worth retrying unless the fountain is gone.
    pub fn is_retryable(&self) -> bool {
        match self {
            DirectoryError::Fetch { .. } => true,
            DirectoryError::FetchOne { source, .. } => !matches!(source, ApiError::NotFound(_)),
        }
    }
}

/// Outcome of a refresh that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    Applied(Rc<[Fountain]>),
    /// A refresh issued later has already been applied; this result was
    /// dropped.
    Superseded,
}

struct DirectoryState {
    fountains: Rc<[Fountain]>,
    location: Option<Coordinates>,
    issued: u64,
    applied: u64,
    error: Option<DirectoryError>,
}

impl DirectoryState {
    fn empty() -> Self {
        Self {
            fountains: Rc::from(Vec::new()),
            location: None,
            issued: 0,
            applied: 0,
            error: None,
        }
    }
}

/// Holds the fountains returned by the last applied proximity query.
///
/// Readers take [`snapshot`](FountainDirectory::snapshot)s; writers swap the
/// whole set. Cloning shares the same set.
#[derive(Clone)]
pub struct FountainDirectory {
    source: Rc<dyn FountainSource>,
    state: Rc<RefCell<DirectoryState>>,
}

impl FountainDirectory {
    pub fn new(source: Rc<dyn FountainSource>) -> Self {
        Self {
            source,
            state: Rc::new(RefCell::new(DirectoryState::empty())),
        }
    }

    pub fn snapshot(&self) -> Rc<[Fountain]> {
        Rc::clone(&self.state.borrow().fountains)
    }

    /// Location the current working set was fetched for.
    pub fn location(&self) -> Option<Coordinates> {
        self.state.borrow().location
    }

    pub fn len(&self) -> usize {
        self.state.borrow().fountains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_by_id(&self, id: i64) -> Option<Fountain> {
        self.state
            .borrow()
            .fountains
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }

    pub fn last_error(&self) -> Option<DirectoryError> {
        self.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.state.borrow_mut().error = None;
    }

    /// Replace the working set with the fountains near `at`.
    ///
    /// On failure the previous set is kept and the error is recorded. A
    /// result for an older request than the one last applied is dropped.
    pub async fn refresh(&self, at: Coordinates) -> Result<Refresh, DirectoryError> {
        let seq = {
            let mut state = self.state.borrow_mut();
            state.issued += 1;
            state.issued
        };
        debug!("[Berez] directory: refresh {} near {}", seq, at);

        let result = self.source.nearby(at).await;

        let mut state = self.state.borrow_mut();
        if seq <= state.applied {
            debug!(
                "[Berez] directory: dropping refresh {}, {} already applied",
                seq, state.applied
            );
            return Ok(Refresh::Superseded);
        }
        match result {
            Ok(fountains) => {
                info!("[Berez] directory: {} fountains near {}", fountains.len(), at);
                let fountains: Rc<[Fountain]> = fountains.into();
                state.fountains = Rc::clone(&fountains);
                state.location = Some(at);
                state.applied = seq;
                state.error = None;
                Ok(Refresh::Applied(fountains))
            }
            Err(source) => {
                let error = DirectoryError::Fetch { at, source };
                warn!(
                    "[Berez] directory: {}; keeping {} fountains",
                    error,
                    state.fountains.len()
                );
                state.error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Fetch a single fountain without touching the working set.
    pub async fn fetch_one(&self, id: i64) -> Result<Fountain, DirectoryError> {
        debug!("[Berez] directory: fetching fountain {}", id);
        self.source
            .fountain(id)
            .await
            .map_err(|source| DirectoryError::FetchOne { id, source })
    }

    /// Working-set hit first, single fetch otherwise.
    pub async fn find(&self, id: i64) -> Result<Fountain, DirectoryError> {
        match self.get_by_id(id) {
            Some(fountain) => Ok(fountain),
            None => self.fetch_one(id).await,
        }
    }

    /// Fold a new general rating into the held fountain and swap in the new
    /// working set. Returns `None` when the fountain is not held.
    pub fn apply_review(&self, id: i64, rating: u8) -> Result<Option<Fountain>, RatingError> {
        let mut state = self.state.borrow_mut();
        let Some(index) = state.fountains.iter().position(|f| f.id == id) else {
            return Ok(None);
        };
        let updated = apply_optimistic(&state.fountains[index], rating)?;
        let mut next = state.fountains.to_vec();
        next[index] = updated.clone();
        state.fountains = next.into();
        Ok(Some(updated))
    }
}

//! Owning side of a background load.
//!
//! A `Session` owns the station list and the visible load state. Fetches run
//! on a worker (`pipeline::spawn_fetch`); the session applies the outcome on
//! whichever thread owns it, so the list is only ever touched from one place.
//! A failed fetch becomes `LoadState::Failed`, which a view can show.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::config::FeedConfig;
use crate::ingest::http::TextSource;
use crate::list_model::StationList;
use crate::logging::{self, DataSource};
use crate::pipeline::{FetchOutcome, spawn_fetch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded { count: usize },
    Failed(String),
}

impl LoadState {
    /// Status-bar text for a view.
    pub fn status_line(&self) -> String {
        match self {
            LoadState::Idle => "Ready".to_string(),
            LoadState::Loading => "Fetching stations…".to_string(),
            LoadState::Loaded { count } => format!("Loaded {} stations", count),
            LoadState::Failed(msg) => format!("Error: {}", msg),
        }
    }
}

pub struct Session {
    list: StationList,
    state: LoadState,
    pending: Option<Receiver<FetchOutcome>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            list: StationList::new(),
            state: LoadState::Idle,
            pending: None,
        }
    }

    pub fn list(&self) -> &StationList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut StationList {
        &mut self.list
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a background fetch. Returns `false` if one is already running.
    pub fn request_load(&mut self, config: FeedConfig, source: Arc<dyn TextSource>) -> bool {
        if self.pending.is_some() {
            return false;
        }
        logging::debug(DataSource::System, Some(config.profile.name), "Background fetch started");
        self.pending = Some(spawn_fetch(config, source));
        self.state = LoadState::Loading;
        true
    }

    /// Applies the outcome if it has arrived. Returns `true` when the state
    /// changed.
    pub fn poll(&mut self) -> bool {
        let outcome = match self.pending.as_ref().map(|rx| rx.try_recv()) {
            None | Some(Err(TryRecvError::Empty)) => return false,
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(TryRecvError::Disconnected)) => Err(()),
        };
        self.settle(outcome);
        true
    }

    /// Blocks until the running fetch finishes, then applies it.
    pub fn wait(&mut self) {
        if let Some(rx) = self.pending.as_ref() {
            let outcome = rx.recv().map_err(|_| ());
            self.settle(outcome);
        }
    }

    fn settle(&mut self, delivered: Result<FetchOutcome, ()>) {
        self.pending = None;
        self.state = match delivered {
            Ok(Ok(records)) => {
                let count = records.len();
                self.list.append(records);
                LoadState::Loaded { count }
            }
            Ok(Err(e)) => LoadState::Failed(e.to_string()),
            Err(()) => {
                logging::error(DataSource::System, None, "Fetch worker stopped without a result");
                LoadState::Failed("fetch worker stopped without a result".to_string())
            }
        };
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! [`RankingCoordinator`]: the single owner of the list being ranked.
//!
//! A session covers one (city, action type) pair and moves through three
//! phases:
//!
//! - `Viewing`: the list as last persisted. Initial phase after selection.
//! - `Reordering`: moves are applied to an in-memory working copy only.
//! - `Saving`: the working copy is being committed. Success returns to
//!   `Viewing` with the working copy as the new baseline; failure returns to
//!   `Reordering` with the edits kept.
//!
//! Cancelling a reorder restores the baseline. Selecting another city or
//! clearing the selection discards the session; fetch and save results that
//! arrive for a discarded session are dropped and reported as
//! [`Error::Stale`].
//!
//! The state lock is never held across an await, so the coordinator can be
//! shared by reference between concurrently polled futures. A save future
//! dropped before its write resolves releases its storage key and returns
//! the session to `Reordering`.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use canopy_core::{
  action::{ActionType, ClimateAction},
  ranking,
  store::{ObjectStore, StorageKey},
};
use strum::Display;

use crate::{Error, RankingRepository, Result};

/// An immutable, shareable ranked list.
pub type RankedActionList = Arc<[ClimateAction]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
  Viewing,
  Reordering,
  Saving,
}

/// Result of comparing the session baseline with the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
  /// The remote object is byte-identical to the last one read or written.
  InSync,
  /// Someone else has written a different ranking since.
  Diverged,
  /// The remote object existed but has since disappeared.
  Missing,
}

/// A read-only view of the current session handed to display and export
/// layers.
#[derive(Debug, Clone)]
pub struct RankingSnapshot {
  pub city:        String,
  pub action_type: ActionType,
  pub phase:       Phase,
  pub actions:     RankedActionList,
  /// Whether the working copy differs from the persisted baseline.
  pub dirty:       bool,
  /// The last fetch or save failure, for display.
  pub last_error:  Option<String>,
}

// ─── Session state ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SessionKey {
  city:        String,
  action_type: ActionType,
  storage_key: StorageKey,
}

struct Session {
  key:             SessionKey,
  phase:           Phase,
  baseline:        RankedActionList,
  working:         RankedActionList,
  /// Digest of the bytes last read or written; `None` if nothing is stored.
  baseline_digest: Option<String>,
  last_error:      Option<String>,
}

impl Session {
  fn snapshot(&self) -> RankingSnapshot {
    RankingSnapshot {
      city:        self.key.city.clone(),
      action_type: self.key.action_type,
      phase:       self.phase,
      actions:     self.working.clone(),
      dirty:       self.working != self.baseline,
      last_error:  self.last_error.clone(),
    }
  }
}

#[derive(Default)]
struct State {
  /// Bumped on every selection change.
  generation:      u64,
  session:         Option<Session>,
  saves_in_flight: HashSet<StorageKey>,
}

impl State {
  fn session_mut(&mut self) -> Result<&mut Session> {
    self.session.as_mut().ok_or(Error::NoSelection)
  }
}

fn lock_state(state: &Mutex<State>) -> MutexGuard<'_, State> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a storage key in `saves_in_flight` for the life of one save.
///
/// Settled explicitly once the write resolves. If it is dropped unsettled
/// (the save future was cancelled mid-write) it releases the key itself, and
/// a session of the same generation still in `Saving` goes back to
/// `Reordering` with its edits kept.
struct SaveGuard<'a> {
  state:      &'a Mutex<State>,
  key:        StorageKey,
  generation: u64,
  settled:    bool,
}

impl SaveGuard<'_> {
  fn settle(mut self, state: &mut State) {
    state.saves_in_flight.remove(&self.key);
    self.settled = true;
  }
}

impl Drop for SaveGuard<'_> {
  fn drop(&mut self) {
    if self.settled {
      return;
    }
    let mut guard = lock_state(self.state);
    let state = &mut *guard;
    state.saves_in_flight.remove(&self.key);
    tracing::warn!(key = %self.key, "save abandoned before the write resolved");

    if state.generation != self.generation {
      return;
    }
    if let Some(session) = state.session.as_mut() {
      if session.phase == Phase::Saving {
        session.phase = Phase::Reordering;
        session.last_error =
          Some("save was cancelled; the stored ranking may be unchanged".to_owned());
      }
    }
  }
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct RankingCoordinator<S> {
  repository: RankingRepository<S>,
  state:      Mutex<State>,
}

impl<S: ObjectStore> RankingCoordinator<S> {
  pub fn new(repository: RankingRepository<S>) -> Self {
    Self {
      repository,
      state: Mutex::new(State::default()),
    }
  }

  pub fn repository(&self) -> &RankingRepository<S> { &self.repository }

  fn lock(&self) -> MutexGuard<'_, State> { lock_state(&self.state) }

  /// The current session, if any.
  pub fn snapshot(&self) -> Option<RankingSnapshot> {
    self.lock().session.as_ref().map(Session::snapshot)
  }

  /// Select `city` and `action_type`, discarding any current session, and
  /// load its stored ranking.
  ///
  /// A city with no stored ranking yields an empty list. Any other read
  /// failure still establishes the session with an empty list and the error
  /// recorded in [`RankingSnapshot::last_error`], then returns the error.
  pub async fn select(
    &self,
    city: &str,
    action_type: ActionType,
  ) -> Result<RankingSnapshot> {
    let key = SessionKey {
      city: city.to_owned(),
      action_type,
      storage_key: self.repository.key_for(city, action_type)?,
    };

    let generation = {
      let mut state = self.lock();
      state.generation += 1;
      state.session = None;
      state.generation
    };

    let fetched = self.repository.fetch(&key.storage_key, action_type).await;

    let mut state = self.lock();
    if state.generation != generation {
      tracing::warn!(key = %key.storage_key, "discarding stale fetch");
      return Err(Error::Stale { key: key.storage_key });
    }

    let (actions, digest, outcome) = match fetched {
      Ok(stored) => (stored.actions, Some(stored.digest), Ok(())),
      Err(e) if e.is_not_found() => {
        tracing::debug!(key = %key.storage_key, "no stored ranking, starting empty");
        (Vec::new(), None, Ok(()))
      }
      Err(e) => (Vec::new(), None, Err(e)),
    };

    let actions: RankedActionList = actions.into();
    let session = Session {
      key,
      phase: Phase::Viewing,
      baseline: actions.clone(),
      working: actions,
      baseline_digest: digest,
      last_error: outcome.as_ref().err().map(ToString::to_string),
    };
    let snapshot = session.snapshot();
    state.session = Some(session);
    outcome.map(|()| snapshot)
  }

  /// Drop the current session. Pending fetches and saves for it become
  /// stale.
  pub fn clear(&self) {
    let mut state = self.lock();
    state.generation += 1;
    state.session = None;
  }

  /// Enter manual ranking. Calling it while already reordering is a no-op.
  pub fn begin_reorder(&self) -> Result<RankingSnapshot> {
    let mut state = self.lock();
    let session = state.session_mut()?;
    match session.phase {
      Phase::Viewing => session.phase = Phase::Reordering,
      Phase::Reordering => {}
      Phase::Saving => {
        return Err(Error::InvalidState {
          operation: "begin reordering",
          phase:     session.phase,
        });
      }
    }
    Ok(session.snapshot())
  }

  /// Move the action at `from` to `to` in the working copy.
  pub fn move_action(&self, from: usize, to: usize) -> Result<RankingSnapshot> {
    let mut state = self.lock();
    let session = state.session_mut()?;
    if session.phase != Phase::Reordering {
      return Err(Error::InvalidState {
        operation: "move an action",
        phase:     session.phase,
      });
    }
    session.working = ranking::move_action(&session.working, from, to)?.into();
    Ok(session.snapshot())
  }

  /// Leave manual ranking, discarding unsaved edits. A no-op while viewing.
  pub fn cancel_reorder(&self) -> Result<RankingSnapshot> {
    let mut state = self.lock();
    let session = state.session_mut()?;
    match session.phase {
      Phase::Viewing => {}
      Phase::Reordering => {
        session.working = session.baseline.clone();
        session.phase = Phase::Viewing;
        session.last_error = None;
      }
      Phase::Saving => {
        return Err(Error::InvalidState {
          operation: "cancel reordering",
          phase:     session.phase,
        });
      }
    }
    Ok(session.snapshot())
  }

  /// Commit the working copy.
  ///
  /// Only one save per storage key may be in flight; a second request while
  /// one is pending fails with [`Error::SaveInFlight`] and causes no write.
  pub async fn save(&self) -> Result<RankingSnapshot> {
    let (key, generation, list) = {
      let mut guard = self.lock();
      let state = &mut *guard;
      let generation = state.generation;
      let session = state.session.as_mut().ok_or(Error::NoSelection)?;
      match session.phase {
        Phase::Reordering => {}
        Phase::Saving => {
          return Err(Error::SaveInFlight {
            key: session.key.storage_key.clone(),
          });
        }
        Phase::Viewing => {
          return Err(Error::InvalidState {
            operation: "save",
            phase:     session.phase,
          });
        }
      }
      if !state.saves_in_flight.insert(session.key.storage_key.clone()) {
        return Err(Error::SaveInFlight {
          key: session.key.storage_key.clone(),
        });
      }
      session.phase = Phase::Saving;
      (session.key.clone(), generation, session.working.clone())
    };
    let in_flight = SaveGuard {
      state: &self.state,
      key: key.storage_key.clone(),
      generation,
      settled: false,
    };

    let result = self
      .repository
      .commit(&key.storage_key, key.action_type, &list)
      .await;

    let mut guard = self.lock();
    let state = &mut *guard;
    in_flight.settle(state);

    let session = match state.session.as_mut() {
      Some(session) if state.generation == generation => session,
      _ => {
        tracing::warn!(
          key = %key.storage_key,
          succeeded = result.is_ok(),
          "discarding stale save result"
        );
        return Err(Error::Stale { key: key.storage_key });
      }
    };

    match result {
      Ok(digest) => {
        session.baseline = list;
        session.baseline_digest = Some(digest);
        session.phase = Phase::Viewing;
        session.last_error = None;
        Ok(session.snapshot())
      }
      Err(e) => {
        session.phase = Phase::Reordering;
        session.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }

  /// Compare the session baseline with what is currently stored.
  pub async fn check_divergence(&self) -> Result<Divergence> {
    let (storage_key, generation, baseline_digest) = {
      let state = self.lock();
      let session = state.session.as_ref().ok_or(Error::NoSelection)?;
      (
        session.key.storage_key.clone(),
        state.generation,
        session.baseline_digest.clone(),
      )
    };

    let remote = self.repository.remote_digest(&storage_key).await?;

    if self.lock().generation != generation {
      return Err(Error::Stale { key: storage_key });
    }

    let divergence = match (remote, baseline_digest) {
      (None, None) => Divergence::InSync,
      (None, Some(_)) => Divergence::Missing,
      (Some(remote), Some(baseline)) if remote == baseline => Divergence::InSync,
      (Some(_), _) => Divergence::Diverged,
    };
    if divergence != Divergence::InSync {
      tracing::info!(key = %storage_key, ?divergence, "remote ranking diverged");
    }
    Ok(divergence)
  }
}

//! Location resolution through the precise → approximate fallback chain.
//!
//! ```text
//! Idle → RequestingPrecise → Located(GPS)
//!                          ↘ RequestingApproximate → Located(IP) + warning
//!                                                  ↘ Failed
//! ```
//!
//! Every call to [`LocationResolver::resolve`] takes a sequence number. A
//! result is applied only if no newer resolution has been issued while it
//! was in flight; otherwise it is dropped and reported as
//! [`LocationError::Superseded`].

use berez_api::error::{ApiError, PositionError};
use berez_api::location::{Location, LocationSource};
use berez_api::source::{IpLocator, PositionSource};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

pub const MIN_PRECISE_TIMEOUT: Duration = Duration::from_secs(5);
pub const MAX_PRECISE_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// Both tiers failed; terminal for this cycle, the next tick retries
    #[error("could not determine location: precise position failed ({precise}); IP lookup failed ({approximate})")]
    Unavailable {
        precise: PositionError,
        approximate: ApiError,
    },

    #[error("superseded by a newer location request")]
    Superseded,
}

/// Where the resolver currently stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolverState {
    #[default]
    Idle,
    RequestingPrecise,
    RequestingApproximate,
    Located(Location),
    Failed(LocationError),
}

/// What subscribers are told.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Located(Location),
    /// The position is IP-based. Raised once per failed precise attempt
    /// that the IP tier recovered; distinct from a hard failure.
    ApproximateWarning { reason: PositionError },
    Failed(LocationError),
}

struct Inner {
    precise: Box<dyn PositionSource>,
    approximate: Box<dyn IpLocator>,
    precise_timeout: Duration,
    issued: Cell<u64>,
    state: RefCell<ResolverState>,
    events: broadcast::Sender<LocationEvent>,
    current: watch::Sender<Option<Location>>,
}

/// Resolves the user's position. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LocationResolver {
    inner: Rc<Inner>,
}

impl LocationResolver {
    /// `precise_timeout` is clamped to 5..=10 seconds.
    pub fn new(
        precise: impl PositionSource + 'static,
        approximate: impl IpLocator + 'static,
        precise_timeout: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (current, _) = watch::channel(None);
        Self {
            inner: Rc::new(Inner {
                precise: Box::new(precise),
                approximate: Box::new(approximate),
                precise_timeout: precise_timeout.clamp(MIN_PRECISE_TIMEOUT, MAX_PRECISE_TIMEOUT),
                issued: Cell::new(0),
                state: RefCell::new(ResolverState::Idle),
                events,
                current,
            }),
        }
    }

    pub fn state(&self) -> ResolverState {
        self.inner.state.borrow().clone()
    }

    /// Latest published location, if any resolution has succeeded.
    pub fn current(&self) -> Option<Location> {
        *self.inner.current.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot channel of the latest location.
    pub fn watch(&self) -> watch::Receiver<Option<Location>> {
        self.inner.current.subscribe()
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.inner.issued.get() == seq
    }

    fn set_state(&self, state: ResolverState) {
        *self.inner.state.borrow_mut() = state;
    }

    fn emit(&self, event: LocationEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn publish(&self, location: Location) -> Location {
        info!("[Berez] resolver: located at {}", location);
        self.set_state(ResolverState::Located(location));
        self.inner.current.send_replace(Some(location));
        self.emit(LocationEvent::Located(location));
        location
    }

    /// Run one pass of the fallback chain.
    pub async fn resolve(&self) -> Result<Location, LocationError> {
        let seq = self.inner.issued.get() + 1;
        self.inner.issued.set(seq);
        self.set_state(ResolverState::RequestingPrecise);
        debug!("[Berez] resolver: request {} asking for a precise position", seq);

        let precise = match tokio::time::timeout(
            self.inner.precise_timeout,
            self.inner.precise.current_position(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PositionError::Timeout),
        };
        if !self.is_latest(seq) {
            debug!("[Berez] resolver: dropping stale precise result of request {}", seq);
            return Err(LocationError::Superseded);
        }

        let reason = match precise {
            Ok(coordinates) => return Ok(self.publish(Location::new(coordinates, LocationSource::Gps))),
            Err(reason) => reason,
        };

        warn!(
            "[Berez] resolver: precise position failed ({}); falling back to IP lookup",
            reason
        );
        self.set_state(ResolverState::RequestingApproximate);
        let approximate = self.inner.approximate.locate().await;
        if !self.is_latest(seq) {
            debug!("[Berez] resolver: dropping stale IP result of request {}", seq);
            return Err(LocationError::Superseded);
        }

        match approximate {
            Ok(coordinates) => {
                self.emit(LocationEvent::ApproximateWarning { reason });
                Ok(self.publish(Location::new(coordinates, LocationSource::Ip)))
            }
            Err(approximate) => {
                let error = LocationError::Unavailable {
                    precise: reason,
                    approximate,
                };
                warn!("[Berez] resolver: {}", error);
                self.set_state(ResolverState::Failed(error.clone()));
                self.emit(LocationEvent::Failed(error.clone()));
                Err(error)
            }
        }
    }
}

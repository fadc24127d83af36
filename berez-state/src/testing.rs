//! Scripted collaborators for the engine's unit tests.

use async_trait::async_trait;
use berez_api::error::{ApiError, PositionError};
use berez_api::fountain::Fountain;
use berez_api::location::Coordinates;
use berez_api::source::{FountainSource, IpLocator, PositionSource};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tokio::sync::oneshot;

pub(crate) fn fountain(id: i64, latitude: f64, longitude: f64, average: f64, count: u32) -> Fountain {
    Fountain {
        id,
        address: format!("Fountain {}", id),
        latitude,
        longitude,
        dog_friendly: false,
        bottle_refill: false,
        fountain_type: Default::default(),
        average_general_rating: average,
        number_of_ratings: count,
        status: Default::default(),
        last_updated: None,
    }
}

/// One scripted answer: ready now, released later through a channel, or
/// never.
pub(crate) enum Step<T> {
    Ready(T),
    Gated(oneshot::Receiver<T>),
    Hang,
}

pub(crate) struct Script<T> {
    steps: RefCell<VecDeque<Step<T>>>,
    fallback: RefCell<Option<T>>,
    calls: Rc<Cell<usize>>,
}

impl<T: Clone> Script<T> {
    pub(crate) fn new() -> Self {
        Self {
            steps: RefCell::new(VecDeque::new()),
            fallback: RefCell::new(None),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub(crate) fn push(&self, value: T) {
        self.steps.borrow_mut().push_back(Step::Ready(value));
    }

    pub(crate) fn gate(&self) -> oneshot::Sender<T> {
        let (tx, rx) = oneshot::channel();
        self.steps.borrow_mut().push_back(Step::Gated(rx));
        tx
    }

    pub(crate) fn hang(&self) {
        self.steps.borrow_mut().push_back(Step::Hang);
    }

    /// Answer used once the scripted steps run out.
    pub(crate) fn always(&self, value: T) {
        *self.fallback.borrow_mut() = Some(value);
    }

    pub(crate) fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }

    async fn next(&self, exhausted: T) -> T {
        self.calls.set(self.calls.get() + 1);
        let step = self.steps.borrow_mut().pop_front();
        match step {
            Some(Step::Ready(value)) => value,
            Some(Step::Gated(rx)) => rx.await.unwrap_or(exhausted),
            Some(Step::Hang) => std::future::pending().await,
            None => self.fallback.borrow().clone().unwrap_or(exhausted),
        }
    }
}

pub(crate) struct ScriptedPosition(pub(crate) Rc<Script<Result<Coordinates, PositionError>>>);

#[async_trait(?Send)]
impl PositionSource for ScriptedPosition {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        self.0
            .next(Err(PositionError::Unavailable("script exhausted".to_string())))
            .await
    }
}

pub(crate) struct ScriptedIp(pub(crate) Rc<Script<Result<Coordinates, ApiError>>>);

#[async_trait(?Send)]
impl IpLocator for ScriptedIp {
    async fn locate(&self) -> Result<Coordinates, ApiError> {
        self.0
            .next(Err(ApiError::Transport("script exhausted".to_string())))
            .await
    }
}

pub(crate) struct ScriptedSource {
    pub(crate) nearby: Script<Result<Vec<Fountain>, ApiError>>,
    pub(crate) by_id: RefCell<HashMap<i64, Fountain>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            nearby: Script::new(),
            by_id: RefCell::new(HashMap::new()),
        }
    }
}

#[async_trait(?Send)]
impl FountainSource for ScriptedSource {
    async fn nearby(&self, _at: Coordinates) -> Result<Vec<Fountain>, ApiError> {
        self.nearby
            .next(Err(ApiError::Transport("script exhausted".to_string())))
            .await
    }

    async fn fountain(&self, id: i64) -> Result<Fountain, ApiError> {
        self.by_id
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound(id))
    }
}

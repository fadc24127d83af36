//! The engine session: one resolver, one directory, one view, one timer.

use crate::directory::{DirectoryError, FountainDirectory, Refresh};
use crate::markers::{self, DetailPanel, Marker, Selection};
use crate::models::{self, FountainRow, ViewState};
use crate::resolver::{LocationError, LocationResolver};
use crate::view::ViewStateController;
use berez_api::fountain::Fountain;
use berez_api::location::{Coordinates, Location};
use berez_api::source::{FountainSource, IpLocator, PositionSource};
use berez_data::rating::RatingError;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Time between location/fetch cycles.
    pub refresh_interval: Duration,
    /// Bound on the precise position attempt, clamped to 5..=10 s.
    pub precise_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            precise_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of one resolve-then-refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    Refreshed { location: Location, count: usize },
    FetchFailed { location: Location, error: DirectoryError },
    LocationFailed(LocationError),
    /// A newer cycle overtook this one.
    Superseded,
}

struct Core {
    resolver: LocationResolver,
    directory: FountainDirectory,
    selection: RefCell<Selection>,
}

impl Core {
    async fn tick(&self) -> TickReport {
        let location = match self.resolver.resolve().await {
            Ok(location) => location,
            Err(LocationError::Superseded) => return TickReport::Superseded,
            Err(e) => return TickReport::LocationFailed(e),
        };
        match self.directory.refresh(location.coordinates()).await {
            Ok(Refresh::Applied(fountains)) => {
                if self.selection.borrow_mut().reconcile(&fountains) {
                    info!("[Berez] session: selected fountain left the working set");
                }
                TickReport::Refreshed {
                    location,
                    count: fountains.len(),
                }
            }
            Ok(Refresh::Superseded) => TickReport::Superseded,
            Err(error) => TickReport::FetchFailed { location, error },
        }
    }
}

/// Owns the engine state and the periodic refresh timer.
///
/// At most one timer runs at a time; it is aborted by [`Session::stop`] and
/// when the session is dropped. The timer is spawned with
/// `tokio::task::spawn_local`, so [`Session::start`] must be called inside a
/// `LocalSet`.
pub struct Session {
    core: Rc<Core>,
    view: ViewStateController,
    config: SessionConfig,
    timer: RefCell<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        precise: impl PositionSource + 'static,
        approximate: impl IpLocator + 'static,
        source: Rc<dyn FountainSource>,
        view: ViewStateController,
        config: SessionConfig,
    ) -> Self {
        Self {
            core: Rc::new(Core {
                resolver: LocationResolver::new(precise, approximate, config.precise_timeout),
                directory: FountainDirectory::new(source),
                selection: RefCell::new(Selection::default()),
            }),
            view,
            config,
            timer: RefCell::new(None),
        }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.core.resolver
    }

    pub fn directory(&self) -> &FountainDirectory {
        &self.core.directory
    }

    pub fn view(&self) -> &ViewStateController {
        &self.view
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn location(&self) -> Option<Location> {
        self.core.resolver.current()
    }

    /// Run one cycle now, independent of the timer.
    pub async fn tick(&self) -> TickReport {
        self.core.tick().await
    }

    /// Start the periodic timer, replacing any running one. The first cycle
    /// runs immediately. Every cycle's outcome is sent on the returned
    /// channel; dropping the receiver does not stop the timer.
    pub fn start(&self) -> mpsc::UnboundedReceiver<TickReport> {
        self.stop();
        let (tx, rx) = mpsc::unbounded_channel();
        let core = Rc::clone(&self.core);
        let period = self.config.refresh_interval;
        let handle = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let report = core.tick().await;
                debug!("[Berez] session: tick finished: {:?}", report);
                let _ = tx.send(report);
            }
        });
        info!(
            "[Berez] session: refreshing every {}s",
            period.as_secs_f64()
        );
        *self.timer.borrow_mut() = Some(handle);
        rx
    }

    pub fn stop(&self) {
        if let Some(handle) = self.timer.borrow_mut().take() {
            debug!("[Berez] session: stopping refresh timer");
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer
            .borrow()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Select a fountain held in the working set. Returns false, leaving the
    /// selection unchanged, when the id is not held.
    pub fn select(&self, id: i64) -> bool {
        if self.core.directory.get_by_id(id).is_none() {
            warn!("[Berez] session: fountain {} is not in the working set", id);
            return false;
        }
        self.core.selection.borrow_mut().select(id);
        true
    }

    pub fn close_detail(&self) {
        self.core.selection.borrow_mut().clear();
    }

    pub fn selected(&self) -> Option<i64> {
        self.core.selection.borrow().id()
    }

    /// Detail panel for the selected fountain, measured from the latest
    /// location.
    pub fn detail(&self) -> Option<DetailPanel> {
        let fountains = self.core.directory.snapshot();
        let selection = *self.core.selection.borrow();
        let location = self.location();
        selection
            .resolve(&fountains)
            .map(|fountain| markers::detail(fountain, location.as_ref()))
    }

    pub fn markers(&self) -> Vec<Marker> {
        let selection = *self.core.selection.borrow();
        markers::present(&self.core.directory.snapshot(), &selection)
    }

    pub fn map_center(&self) -> Coordinates {
        markers::center(self.location().as_ref())
    }

    pub fn rows(&self) -> Vec<FountainRow> {
        models::rows(&self.core.directory.snapshot(), self.location().as_ref())
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            mode: self.view.mode(),
            selected_fountain_id: self.selected(),
        }
    }

    /// Optimistically fold a review's general rating into the working set.
    pub fn apply_review(&self, id: i64, rating: u8) -> Result<Option<Fountain>, RatingError> {
        self.core.directory.apply_review(id, rating)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fountain, Script, ScriptedIp, ScriptedPosition, ScriptedSource};
    use crate::view::{MemoryPreferenceStore, ViewMode};
    use berez_api::error::{ApiError, PositionError};
    use berez_api::location::LocationSource;
    use tokio::task::LocalSet;

    const USER: Coordinates = Coordinates {
        latitude: 32.0853,
        longitude: 34.7818,
    };

    struct Harness {
        session: Session,
        precise: Rc<Script<Result<Coordinates, PositionError>>>,
        ip: Rc<Script<Result<Coordinates, ApiError>>>,
        source: Rc<ScriptedSource>,
    }

    fn harness() -> Harness {
        let precise = Rc::new(Script::new());
        let ip = Rc::new(Script::new());
        let source = Rc::new(ScriptedSource::new());
        let view = ViewStateController::open(MemoryPreferenceStore::default(), None);
        let session = Session::new(
            ScriptedPosition(Rc::clone(&precise)),
            ScriptedIp(Rc::clone(&ip)),
            source.clone(),
            view,
            SessionConfig::default(),
        );
        Harness {
            session,
            precise,
            ip,
            source,
        }
    }

    #[tokio::test]
    async fn locate_list_and_rate() {
        let h = harness();
        h.precise.always(Ok(USER));
        h.source.nearby.always(Ok(vec![fountain(1, 32.086, 34.782, 4.0, 3)]));

        let report = h.session.tick().await;
        assert_eq!(
            report,
            TickReport::Refreshed {
                location: Location::new(USER, LocationSource::Gps),
                count: 1
            }
        );

        let rows = h.session.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].distance.as_deref(), Some("80 m"));

        let updated = h.session.apply_review(1, 5).unwrap().unwrap();
        assert!((updated.average_general_rating - 4.25).abs() < 1e-12);
        assert_eq!(updated.number_of_ratings, 4);
        assert_eq!(h.session.rows()[0].ratings, 4);

        // The next refresh restores the backend's numbers.
        h.session.tick().await;
        assert_eq!(h.session.rows()[0].ratings, 3);
    }

    #[tokio::test]
    async fn approximate_location_still_lists() {
        let h = harness();
        h.precise.push(Err(PositionError::PermissionDenied));
        h.ip.push(Ok(USER));
        h.source.nearby.push(Ok(vec![fountain(1, 32.086, 34.782, 4.0, 3)]));

        match h.session.tick().await {
            TickReport::Refreshed { location, .. } => assert!(location.is_approximate()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failures_keep_the_list() {
        let h = harness();
        h.precise.always(Ok(USER));
        h.source.nearby.push(Ok(vec![fountain(1, 32.086, 34.782, 4.0, 3)]));
        h.source.nearby.push(Err(ApiError::Transport("offline".to_string())));
        h.session.tick().await;

        assert!(matches!(h.session.tick().await, TickReport::FetchFailed { .. }));
        assert_eq!(h.session.rows().len(), 1);

        let h = harness();
        h.precise.always(Err(PositionError::Unsupported));
        h.ip.always(Err(ApiError::Transport("offline".to_string())));
        assert!(matches!(
            h.session.tick().await,
            TickReport::LocationFailed(LocationError::Unavailable { .. })
        ));
        assert_eq!(h.source.nearby.calls().get(), 0);
    }

    #[tokio::test]
    async fn selection_follows_the_working_set() {
        let h = harness();
        h.precise.always(Ok(USER));
        h.source.nearby.push(Ok(vec![fountain(1, 32.086, 34.782, 4.0, 3), fountain(2, 32.09, 34.78, 2.0, 1)]));
        h.source.nearby.push(Ok(vec![fountain(2, 32.09, 34.78, 2.0, 1)]));
        h.session.tick().await;

        assert!(!h.session.select(9));
        assert!(h.session.select(1));
        let panel = h.session.detail().unwrap();
        assert_eq!(panel.fountain.id, 1);
        assert_eq!(panel.distance.as_deref(), Some("80 m"));
        assert!(h.session.markers().iter().any(|m| m.fountain_id == 1 && m.selected));
        assert_eq!(
            h.session.view_state(),
            ViewState {
                mode: ViewMode::List,
                selected_fountain_id: Some(1)
            }
        );

        h.session.tick().await;
        assert_eq!(h.session.selected(), None);
        assert!(h.session.detail().is_none());

        assert!(h.session.select(2));
        h.session.close_detail();
        assert_eq!(h.session.selected(), None);
    }

    #[tokio::test]
    async fn map_center_before_and_after_locating() {
        let h = harness();
        assert_eq!(h.session.map_center(), berez_api::location::DEFAULT_CENTER);
        h.precise.always(Ok(Coordinates::new(31.7683, 35.2137)));
        h.source.nearby.always(Ok(Vec::new()));
        h.session.tick().await;
        assert_eq!(h.session.map_center(), Coordinates::new(31.7683, 35.2137));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ticks_until_stopped() {
        LocalSet::new()
            .run_until(async {
                let h = harness();
                h.precise.always(Ok(USER));
                h.source.nearby.always(Ok(vec![fountain(1, 32.086, 34.782, 4.0, 3)]));
                let started = tokio::time::Instant::now();

                let mut reports = h.session.start();
                assert!(h.session.is_running());
                for _ in 0..3 {
                    let report = reports.recv().await.unwrap();
                    assert!(matches!(report, TickReport::Refreshed { count: 1, .. }));
                }
                assert!(started.elapsed() >= Duration::from_secs(60));
                assert_eq!(h.precise.calls().get(), 3);

                h.session.stop();
                assert!(!h.session.is_running());
                tokio::time::sleep(Duration::from_secs(300)).await;
                assert_eq!(reports.recv().await, None);
                assert_eq!(h.precise.calls().get(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn timer_retries_after_a_failed_cycle() {
        LocalSet::new()
            .run_until(async {
                let h = harness();
                h.precise.push(Err(PositionError::Unsupported));
                h.precise.always(Ok(USER));
                h.ip.push(Err(ApiError::Transport("offline".to_string())));
                h.source.nearby.always(Ok(vec![fountain(1, 32.086, 34.782, 4.0, 3)]));
                let started = tokio::time::Instant::now();

                let mut reports = h.session.start();
                assert!(matches!(
                    reports.recv().await,
                    Some(TickReport::LocationFailed(LocationError::Unavailable { .. }))
                ));
                assert!(h.session.is_running());

                let report = reports.recv().await.unwrap();
                assert_eq!(
                    report,
                    TickReport::Refreshed {
                        location: Location::new(USER, LocationSource::Gps),
                        count: 1
                    }
                );
                assert!(started.elapsed() >= Duration::from_secs(30));
                assert_eq!(h.session.rows().len(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_the_timer() {
        LocalSet::new()
            .run_until(async {
                let h = harness();
                h.precise.always(Ok(USER));
                h.source.nearby.always(Ok(Vec::new()));

                let mut first = h.session.start();
                let mut second = h.session.start();
                assert_eq!(first.recv().await, None);
                assert!(second.recv().await.is_some());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_stops_the_timer() {
        LocalSet::new()
            .run_until(async {
                let h = harness();
                h.precise.always(Ok(USER));
                h.source.nearby.always(Ok(Vec::new()));
                let calls = h.precise.calls();

                let mut reports = h.session.start();
                reports.recv().await.unwrap();
                drop(h);

                tokio::time::sleep(Duration::from_secs(300)).await;
                assert_eq!(reports.recv().await, None);
                assert_eq!(calls.get(), 1);
            })
            .await;
    }
}

//! The Berez engine: where the user is, which fountains are near, and how
//! they are shown.
//!
//! # Architecture
//!
//! Single-threaded and cooperative, built for a tokio current-thread runtime
//! inside a `LocalSet`:
//! - [`resolver::LocationResolver`] runs the precise → IP fallback chain and
//!   drops stale results by sequence number
//! - [`directory::FountainDirectory`] holds the working set as an
//!   `Rc<RefCell<_>>`, swapped whole on every refresh
//! - [`view::ViewStateController`] keeps the list/map mode and persists it
//! - [`markers`] turns the working set into colored map markers and the
//!   detail panel
//! - [`session::Session`] owns all of the above plus the periodic refresh
//!   timer
//!
//! No `RefCell` borrow is ever held across an `.await`.
//!
//! # Cycle
//!
//! ```text
//! timer tick ─► resolve() ─► Location ─► refresh(lon, lat) ─► working set
//!                                                         └─► selection reconciled
//! ```

pub mod directory;
pub mod markers;
pub mod models;
pub mod resolver;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use directory::{DirectoryError, FountainDirectory, Refresh};
pub use resolver::{LocationError, LocationEvent, LocationResolver, ResolverState};
pub use session::{Session, SessionConfig, TickReport};
pub use view::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, ViewMode, ViewStateController};

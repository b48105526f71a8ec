//! Event records and the broadcast bus.
//!
//! - `EventRecord`: One immutable observability fact
//! - `EventBus`: Bounded drop-oldest queue plus the broadcaster loop
//! - `Connection` / `EventSink`: Per-observer transport seam

mod bus;
mod connection;
mod record;
mod sink;

pub use bus::EventBus;
pub use connection::{Connection, ConnectionId, ConnectionStats};
pub use record::{EventRecord, EventType, Severity};
pub use sink::{EventSink, LogSink};

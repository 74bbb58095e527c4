//! Notification dispatch: persistence, delivery and order fan-out

pub mod dispatcher;
pub mod error;
pub mod transport;
pub mod worker;

pub use dispatcher::NotificationDispatcher;
pub use error::{DispatchError, DispatchResult};
pub use transport::{Address, NotificationTransport, OutboundMessage, TransportError, TransportSet};
pub use worker::{DispatchJob, NotificationQueue, NotificationWorker};

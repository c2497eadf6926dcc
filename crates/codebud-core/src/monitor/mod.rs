//! Client side of the local API: the HTTP client, the two-channel poll
//! loop and the messages it sends to the conversational session.

mod api;
mod messages;
mod poller;

pub use api::{ApiClient, CodeBudApi};
pub use messages::{context_summary, review_label, review_message};
pub use poller::{CodeMonitor, MonitorEvent};

//! Incident-org and collaboration room provisioner.
//!
//! Classifies incident notifications by routing key and reacts to them:
//!
//! - Incident added: associate the orgs registered for the incident type(s)
//! - Incident updated / incident-org added: create the configured rooms for
//!   each associated org
//! - Escalation: create joint rooms for each (parent, child) org pair
//!
//! Rooms are built at most once per batch and submitted in a single call.

mod error;
mod handler;
mod notification;
mod rooms;
mod routing;
mod types;

pub use error::ProvisionerError;
pub use handler::IncidentOrgProvisioner;
pub use notification::{IncidentIds, IncidentNotification};
pub use rooms::{render_template, RoomBatch, RoomTemplate, RoomsConfig};
pub use routing::{RouteKind, Router};
pub use types::{ProcessOutcome, ProcessReport};

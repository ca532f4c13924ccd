pub mod webhook;

pub use webhook::{IntakeEvent, IntakeKind, WebhookError, WebhookForwarder};

// ── Per-container operation state ──
//
// `EntityMachine` tracks one container's check/update/exclusion cycle;
// `EntityRegistry` owns every machine and reconciles them against each
// applied container snapshot.

mod machine;
mod registry;

pub use machine::{EntityMachine, EntityStatus};
pub use registry::EntityRegistry;

/// Permission to update one container, issued by
/// [`Dashboard::request_update`](crate::Dashboard::request_update).
///
/// Only this crate can create one and
/// [`Dashboard::confirm_update`](crate::Dashboard::confirm_update) consumes
/// it, so an update can never be sent without passing the confirmation step.
#[derive(Debug)]
pub struct ConfirmationToken {
    id: String,
    name: String,
}

impl ConfirmationToken {
    pub(crate) fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The question to put to the operator.
    pub fn prompt(&self) -> String {
        format!(
            "Are you sure you want to update {}? This will recreate the container.",
            self.name
        )
    }
}

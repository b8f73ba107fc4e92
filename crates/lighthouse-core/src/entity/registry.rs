// ── Entity registry ──
//
// Concurrent map of container id -> `EntityMachine`, plus a version
// counter consumers can watch. Reconciliation against container snapshots
// is serialized and skips generations older than the last one applied.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::machine::EntityMachine;
use crate::model::{BulkRow, Container};

pub struct EntityRegistry {
    machines: DashMap<String, EntityMachine>,
    version: watch::Sender<u64>,
    /// Container snapshot version last reconciled.
    reconciled: Mutex<u64>,
}

impl EntityRegistry {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            machines: DashMap::new(),
            version,
            reconciled: Mutex::new(0),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<EntityMachine> {
        self.machines.get(id).map(|m| m.value().clone())
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Bumped after every mutation of any machine.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Run `f` against one machine. `None` if the id is unknown.
    ///
    /// Watchers are only notified when the machine actually changed.
    pub(crate) fn update<R>(&self, id: &str, f: impl FnOnce(&mut EntityMachine) -> R) -> Option<R> {
        let (result, changed) = {
            let mut machine = self.machines.get_mut(id)?;
            let before = machine.value().clone();
            let result = f(machine.value_mut());
            (result, *machine.value() != before)
        };
        if changed {
            self.bump();
        }
        Some(result)
    }

    /// Move a machine to the id its container got after recreation. If a
    /// refresh already created a machine for `new_id`, the old machine's
    /// settled state is merged into it instead.
    pub(crate) fn rekey(&self, old_id: &str, new_id: &str) {
        if old_id == new_id {
            return;
        }
        let Some((_, mut machine)) = self.machines.remove(old_id) else {
            return;
        };
        match self.machines.entry(new_id.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().absorb(&machine);
                debug!(old_id, new_id, "entity state merged into recreated container");
            }
            Entry::Vacant(entry) => {
                machine.rekey(new_id.to_owned());
                entry.insert(machine);
                debug!(old_id, new_id, "entity re-keyed after recreation");
            }
        }
        self.bump();
    }

    /// Fan bulk rows out to their machines. Returns how many were applied.
    pub(crate) fn apply_bulk(&self, rows: &[BulkRow]) -> usize {
        let applied = rows
            .iter()
            .filter(|row| {
                self.machines
                    .get_mut(&row.id)
                    .is_some_and(|mut m| m.value_mut().apply_bulk_row(row))
            })
            .count();
        if applied > 0 {
            self.bump();
        }
        applied
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Align machines with container snapshot `generation`.
    ///
    /// Machines for vanished ids are dropped unless an operation is still in
    /// flight. A new id whose name matches a dropped machine inherits its
    /// settled status (the container was recreated).
    pub(crate) fn reconcile(&self, generation: u64, containers: &[Container]) {
        let mut last = self
            .reconciled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if generation <= *last {
            trace!(generation, last = *last, "skipping stale reconciliation");
            return;
        }
        *last = generation;

        let live: HashSet<&str> = containers.iter().map(|c| c.id.as_str()).collect();
        let mut departed: HashMap<String, EntityMachine> = HashMap::new();
        self.machines.retain(|id, machine| {
            if live.contains(id.as_str()) || machine.is_busy() {
                return true;
            }
            departed.insert(machine.name().to_owned(), machine.clone());
            false
        });

        for container in containers {
            match self.machines.entry(container.id.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().sync(container),
                Entry::Vacant(entry) => {
                    let mut machine = EntityMachine::new(container);
                    if let Some(predecessor) = departed.get(&container.name) {
                        debug!(
                            id = %container.id,
                            previous = predecessor.id(),
                            "entity inherits state from recreated container"
                        );
                        machine.inherit(predecessor);
                    }
                    entry.insert(machine);
                }
            }
        }

        trace!(generation, count = self.machines.len(), "entities reconciled");
        self.bump();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entity::EntityStatus;
    use crate::model::{BulkRowStatus, ContainerState, ImageDelta, UpdateCheck, UpdateOutcome};

    fn container(id: &str, name: &str, excluded: bool) -> Container {
        Container {
            id: id.into(),
            short_id: id.into(),
            name: name.into(),
            image: format!("{name}:latest"),
            state: ContainerState::Running,
            status: "Up".into(),
            created: None,
            created_raw: None,
            excluded,
            server_check: None,
        }
    }

    fn available() -> EntityStatus {
        EntityStatus::UpdateAvailable(ImageDelta {
            current: None,
            latest: None,
            image: None,
        })
    }

    #[test]
    fn reconcile_adds_and_prunes() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false), container("b", "db", false)]);
        assert_eq!(registry.len(), 2);

        registry.reconcile(2, &[container("a", "web", false)]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn stale_generation_is_ignored() {
        let registry = EntityRegistry::new();
        registry.reconcile(5, &[container("a", "web", false)]);
        registry.reconcile(4, &[]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn exclusion_follows_snapshot() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false)]);
        registry.reconcile(2, &[container("a", "web", true)]);
        assert!(registry.get("a").unwrap().excluded());
    }

    #[test]
    fn recreated_container_inherits_status() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false)]);
        registry.update("a", |m| {
            m.begin_check().unwrap();
            m.finish_check(available());
        });

        registry.reconcile(2, &[container("a2", "web", false)]);
        let machine = registry.get("a2").unwrap();
        assert_eq!(machine.status(), &available());
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn busy_machines_survive_pruning() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false)]);
        registry.update("a", |m| m.begin_update().unwrap());

        registry.reconcile(2, &[]);
        assert!(registry.get("a").is_some());
    }

    #[test]
    fn rekey_moves_machine() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false)]);
        registry.rekey("a", "a2");
        assert!(registry.get("a").is_none());
        assert_eq!(registry.get("a2").unwrap().id(), "a2");
    }

    #[test]
    fn rekey_merges_into_machine_created_by_refresh() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false)]);
        registry.update("a", |m| m.begin_update().unwrap());
        // The recreated container shows up while the update is still running.
        registry.reconcile(2, &[container("a2", "web", false)]);
        assert!(registry.get("a").is_some());

        registry.update("a", |m| {
            m.finish_update(UpdateOutcome::Success {
                message: "Successfully updated web".into(),
                new_id: Some("a2".into()),
            });
        });
        registry.rekey("a", "a2");

        assert!(registry.get("a").is_none());
        let machine = registry.get("a2").unwrap();
        assert_eq!(machine.id(), "a2");
        assert!(machine.outcome().unwrap().is_success());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejected_operation_does_not_notify() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", true)]);
        let before = registry.version();

        let rejected = registry.update("a", EntityMachine::begin_check).unwrap();
        assert!(rejected.is_err());
        assert_eq!(registry.version(), before);

        registry.reconcile(2, &[container("a", "web", false)]);
        let after_sync = registry.version();
        registry.update("a", EntityMachine::begin_check).unwrap().unwrap();
        assert!(registry.version() > after_sync);
    }

    #[test]
    fn bulk_skips_unknown_and_excluded() {
        let registry = EntityRegistry::new();
        registry.reconcile(
            1,
            &[container("a", "web", false), container("b", "db", true)],
        );
        let rows = vec![
            BulkRow {
                id: "a".into(),
                name: "web".into(),
                status: BulkRowStatus::UpToDate,
                message: None,
                reason: None,
            },
            BulkRow {
                id: "b".into(),
                name: "db".into(),
                status: BulkRowStatus::UpToDate,
                message: None,
                reason: None,
            },
            BulkRow {
                id: "zzz".into(),
                name: "ghost".into(),
                status: BulkRowStatus::Updated,
                message: None,
                reason: None,
            },
        ];
        assert_eq!(registry.apply_bulk(&rows), 1);
        assert_eq!(registry.get("a").unwrap().status(), &EntityStatus::UpToDate);
        assert_eq!(registry.get("b").unwrap().status(), &EntityStatus::Idle);
    }

    #[test]
    fn server_cache_downgrades_available() {
        let registry = EntityRegistry::new();
        registry.reconcile(1, &[container("a", "web", false)]);
        registry.update("a", |m| {
            m.begin_check().unwrap();
            m.finish_check(available());
        });
        let mut fresh = container("a", "web", false);
        fresh.server_check = Some(UpdateCheck::UpToDate);
        registry.reconcile(2, &[fresh]);
        assert_eq!(registry.get("a").unwrap().status(), &EntityStatus::Idle);
    }

    #[test]
    fn version_bumps_on_mutation() {
        let registry = EntityRegistry::new();
        let before = registry.version();
        registry.reconcile(1, &[container("a", "web", false)]);
        assert!(registry.version() > before);
    }
}

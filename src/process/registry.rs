/*!
 * PID Registry
 * Set of tracked processes keyed by pid, pruned against a process table
 */

use super::probe::ProcessTable;
use super::types::TrackedProcess;
use crate::core::types::Pid;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Tracked processes; not synchronized, owned by the admission controller
#[derive(Debug, Default)]
pub struct PidRegistry {
    entries: HashMap<Pid, TrackedProcess>,
    next_generation: u64,
}

impl PidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.contains_key(&pid)
    }

    /// Track `pid`, returning the generation of its registration
    ///
    /// An already tracked pid keeps its existing entry.
    pub fn insert(&mut self, pid: Pid) -> u64 {
        if let Some(generation) = self.generation(pid) {
            return generation;
        }
        self.next_generation += 1;
        self.entries
            .insert(pid, TrackedProcess::new(pid, self.next_generation));
        self.next_generation
    }

    /// Generation of the current registration of `pid`
    pub fn generation(&self, pid: Pid) -> Option<u64> {
        self.entries.get(&pid).map(|entry| entry.generation)
    }

    pub fn remove(&mut self, pid: Pid) -> Option<TrackedProcess> {
        self.entries.remove(&pid)
    }

    /// Remove `pid` only if it is still the registration with `generation`
    pub fn remove_generation(&mut self, pid: Pid, generation: u64) -> Option<TrackedProcess> {
        if self.generation(pid) != Some(generation) {
            return None;
        }
        self.entries.remove(&pid)
    }

    /// Drop every entry whose process is no longer alive
    ///
    /// Returns the pids that were removed.
    pub fn prune(&mut self, table: &dyn ProcessTable) -> Vec<Pid> {
        let dead: Vec<Pid> = self
            .entries
            .keys()
            .copied()
            .filter(|pid| !table.is_alive(*pid))
            .collect();

        for pid in &dead {
            if let Some(entry) = self.entries.remove(pid) {
                info!(
                    pid,
                    tracked_secs = entry.age().as_secs(),
                    "Pruned exited process from registry"
                );
            }
        }

        dead
    }

    pub fn pids(&self) -> HashSet<Pid> {
        self.entries.keys().copied().collect()
    }

    /// Entries ordered oldest first
    pub fn snapshot(&self) -> Vec<TrackedProcess> {
        let mut entries: Vec<TrackedProcess> = self.entries.values().cloned().collect();
        entries.sort_by_key(|entry| entry.generation);
        entries
    }

    /// Remove and return every entry
    pub fn drain(&mut self) -> Vec<TrackedProcess> {
        let mut entries: Vec<TrackedProcess> =
            self.entries.drain().map(|(_, entry)| entry).collect();
        entries.sort_by_key(|entry| entry.generation);
        entries
    }
}

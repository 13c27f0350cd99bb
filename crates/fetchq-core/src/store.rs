//! Job store: id → record map.
//!
//! Not synchronized on its own. [`crate::registry::Registry`] keeps it behind the
//! same lock as the pending queue so both change together.

use std::collections::BTreeMap;

use crate::job::{JobId, JobRecord, JobStatus, Quality};

#[derive(Debug, Default)]
pub struct JobStore {
    records: BTreeMap<JobId, JobRecord>,
    last_id: JobId,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `queued` record and returns its fresh id (1, 2, 3, ...).
    pub fn create(&mut self, target: String, quality: Quality) -> JobId {
        self.last_id += 1;
        let id = self.last_id;
        self.records.insert(id, JobRecord::new(id, target, quality));
        id
    }

    pub fn get(&self, id: JobId) -> Option<&JobRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut JobRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.records.contains_key(&id)
    }

    /// Records in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.values()
    }

    /// Ids of records currently in `status`, in creation order.
    pub fn ids_with_status(&self, status: JobStatus) -> Vec<JobId> {
        self.records
            .values()
            .filter(|r| r.status == status)
            .map(|r| r.id)
            .collect()
    }
}

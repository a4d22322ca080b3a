use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use minifier_core::store::Result;
use minifier_core::{RecordId, RecordStore, ShortCode, StorageError, UrlRecord};
use std::collections::HashSet;

/// In-memory implementation of [`RecordStore`] using DashMap.
///
/// Records are keyed by id. A second map indexes short codes; claiming a code
/// goes through its entry lock, so two concurrent inserts of the same code
/// cannot both succeed. A third map indexes ids by owner.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<RecordId, UrlRecord>,
    codes: DashMap<ShortCode, RecordId>,
    owners: DashMap<String, HashSet<RecordId>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            codes: DashMap::with_capacity(capacity),
            owners: DashMap::new(),
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: UrlRecord) -> Result<()> {
        // The code entry stays locked until the record is fully indexed.
        match self.codes.entry(record.short_code.clone()) {
            Entry::Occupied(_) => Err(StorageError::Duplicate(record.short_code.to_string())),
            Entry::Vacant(code_slot) => match self.records.entry(record.id.clone()) {
                Entry::Occupied(_) => Err(StorageError::DuplicateId(record.id.to_string())),
                Entry::Vacant(record_slot) => {
                    let id = record.id.clone();
                    self.owners
                        .entry(record.owner_id.clone())
                        .or_default()
                        .insert(id.clone());
                    record_slot.insert(record);
                    code_slot.insert(id);
                    Ok(())
                }
            },
        }
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<UrlRecord> {
        let id = self
            .codes
            .get(code)
            .map(|id| id.clone())
            .ok_or_else(|| StorageError::NotFound(code.to_string()))?;

        self.records
            .get(&id)
            .map(|record| record.clone())
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<UrlRecord> {
        self.records
            .get(id)
            .map(|record| record.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let Some((_, record)) = self.records.remove(id) else {
            return Err(StorageError::NotFound(id.to_string()));
        };

        self.codes
            .remove_if(&record.short_code, |_, holder| holder == id);

        if let Some(mut ids) = self.owners.get_mut(&record.owner_id) {
            ids.remove(id);
        }
        self.owners
            .remove_if(&record.owner_id, |_, ids| ids.is_empty());

        Ok(())
    }

    async fn code_available(&self, code: &ShortCode) -> Result<bool> {
        Ok(!self.codes.contains_key(code))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<UrlRecord>> {
        let ids: Vec<RecordId> = match self.owners.get(owner_id) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return Ok(Vec::new()),
        };

        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|record| record.clone()))
            .collect())
    }
}

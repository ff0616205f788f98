use async_trait::async_trait;
use mongodb::bson::{self, Bson, Document};
use std::{
    collections::BTreeMap,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        RwLock,
    },
};

use super::{Filter, Record, Repository, SortBy, StoreError};

/// Repository over an in-process map.
///
/// Records are kept as BSON documents produced by the same serde mapping the
/// MongoDB backend uses, so filters see identical field names and types.
pub struct InMemoryRepository<T> {
    documents: RwLock<BTreeMap<String, Document>>,
    unique: Vec<&'static str>,
    unavailable: AtomicBool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_unique(&[])
    }

    /// Reject inserts and replacements that repeat a non-null value of any of `fields`.
    pub fn with_unique(fields: &[&'static str]) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            unique: fields.to_vec(),
            unavailable: AtomicBool::new(false),
            _record: PhantomData,
        }
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "{} is unavailable",
                T::COLLECTION
            )));
        }
        Ok(())
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable(format!("{} lock poisoned", T::COLLECTION))
    }

    fn encode(record: &T) -> Result<Document, StoreError> {
        bson::to_document(record).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn decode(document: &Document) -> Result<T, StoreError> {
        bson::from_document(document.clone()).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn check_unique(
        &self,
        documents: &BTreeMap<String, Document>,
        candidate: &Document,
        id: &str,
    ) -> Result<(), StoreError> {
        for field in &self.unique {
            let value = match candidate.get(*field) {
                None | Some(Bson::Null) => continue,
                Some(value) => value,
            };
            let clash = documents
                .iter()
                .any(|(other_id, other)| other_id != id && other.get(*field) == Some(value));
            if clash {
                return Err(StoreError::Duplicate(format!(
                    "{}.{}",
                    T::COLLECTION,
                    field
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Repository<T> for InMemoryRepository<T> {
    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        self.check_available()?;
        let document = Self::encode(record)?;
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;

        if documents.contains_key(record.id()) {
            return Err(StoreError::Duplicate(format!("{}._id", T::COLLECTION)));
        }
        self.check_unique(&documents, &document, record.id())?;

        documents.insert(record.id().to_string(), document);
        Ok(())
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        documents
            .values()
            .find(|d| filter.matches(d))
            .map(Self::decode)
            .transpose()
    }

    async fn find(&self, filter: Filter, sort: SortBy) -> Result<Vec<T>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        let mut matched: Vec<&Document> = documents.values().filter(|d| filter.matches(d)).collect();
        matched.sort_by(|a, b| sort.compare(a, b));
        matched.into_iter().map(Self::decode).collect()
    }

    async fn replace(&self, record: &T) -> Result<bool, StoreError> {
        self.check_available()?;
        let document = Self::encode(record)?;
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;

        if !documents.contains_key(record.id()) {
            return Ok(false);
        }
        self.check_unique(&documents, &document, record.id())?;

        documents.insert(record.id().to_string(), document);
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        Ok(documents.remove(id).is_some())
    }

    async fn delete_many(&self, filter: Filter) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        let before = documents.len();
        documents.retain(|_, d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

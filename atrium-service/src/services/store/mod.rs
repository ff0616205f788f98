//! Document store abstraction.
//!
//! Every collection is reached through [`Repository`], backed either by MongoDB
//! ([`MongoRepository`]) or by an in-process map ([`InMemoryRepository`]) for
//! tests and local development. Queries are expressed with the small
//! [`Filter`] algebra so both backends answer them identically.

mod memory;
mod mongo;

pub use memory::InMemoryRepository;
pub use mongo::{MongoDb, MongoRepository};

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};
use std::{cmp::Ordering, sync::Arc};
use thiserror::Error;

use crate::models::{
    Lead, Meeting, Organization, Post, Project, ProjectUpdate, SecurityAuditLog, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// A document persisted in its own collection, keyed by `_id`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(&'static str, Bson),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Bson>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn id(id: &str) -> Self {
        Filter::eq("_id", id)
    }

    /// Conjunction with `All` terms dropped.
    pub fn and(filters: Vec<Filter>) -> Self {
        let mut terms: Vec<Filter> = filters
            .into_iter()
            .filter(|f| !matches!(f, Filter::All))
            .collect();
        match terms.len() {
            0 => Filter::All,
            1 => terms.remove(0),
            _ => Filter::And(terms),
        }
    }

    /// Disjunction; any `All` term makes the whole filter `All`.
    pub fn or(filters: Vec<Filter>) -> Self {
        if filters.iter().any(|f| matches!(f, Filter::All)) {
            return Filter::All;
        }
        match filters.len() {
            1 => filters.into_iter().next().unwrap_or(Filter::All),
            _ => Filter::Or(filters),
        }
    }

    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => doc! {},
            Filter::Eq(field, value) => doc! { *field: value.clone() },
            Filter::And(terms) => doc! { "$and": Self::render_terms(terms) },
            Filter::Or(terms) if terms.is_empty() => doc! { "$expr": false },
            Filter::Or(terms) => doc! { "$or": Self::render_terms(terms) },
        }
    }

    fn render_terms(terms: &[Filter]) -> Vec<Bson> {
        terms
            .iter()
            .map(|t| Bson::Document(t.to_document()))
            .collect()
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => match document.get(*field) {
                Some(found) => found == value,
                None => matches!(value, Bson::Null),
            },
            Filter::And(terms) => terms.iter().all(|t| t.matches(document)),
            Filter::Or(terms) => terms.iter().any(|t| t.matches(document)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortBy {
    pub field: &'static str,
    pub descending: bool,
}

impl SortBy {
    pub fn newest_first() -> Self {
        Self {
            field: "created_at",
            descending: true,
        }
    }

    pub fn ascending(field: &'static str) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn to_document(&self) -> Document {
        let direction = if self.descending { -1 } else { 1 };
        doc! { self.field: direction }
    }

    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_bson(a.get(self.field), b.get(self.field));
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(Bson::Int32(x)), Some(Bson::Int32(y))) => x.cmp(y),
        (Some(Bson::Int64(x)), Some(Bson::Int64(y))) => x.cmp(y),
        (Some(Bson::Double(x)), Some(Bson::Double(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn insert(&self, record: &T) -> Result<(), StoreError>;

    async fn find_one(&self, filter: Filter) -> Result<Option<T>, StoreError>;

    async fn find(&self, filter: Filter, sort: SortBy) -> Result<Vec<T>, StoreError>;

    /// Replace the stored document with the same id. Returns false when none exists.
    async fn replace(&self, record: &T) -> Result<bool, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn delete_many(&self, filter: Filter) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.find_one(Filter::id(id)).await
    }
}

/// One repository per collection.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn Repository<User>>,
    pub organizations: Arc<dyn Repository<Organization>>,
    pub posts: Arc<dyn Repository<Post>>,
    pub leads: Arc<dyn Repository<Lead>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub project_updates: Arc<dyn Repository<ProjectUpdate>>,
    pub meetings: Arc<dyn Repository<Meeting>>,
    pub audit_logs: Arc<dyn Repository<SecurityAuditLog>>,
}

impl Stores {
    pub fn mongo(db: &MongoDb) -> Self {
        Self {
            users: Arc::new(db.repository::<User>()),
            organizations: Arc::new(db.repository::<Organization>()),
            posts: Arc::new(db.repository::<Post>()),
            leads: Arc::new(db.repository::<Lead>()),
            projects: Arc::new(db.repository::<Project>()),
            project_updates: Arc::new(db.repository::<ProjectUpdate>()),
            meetings: Arc::new(db.repository::<Meeting>()),
            audit_logs: Arc::new(db.repository::<SecurityAuditLog>()),
        }
    }

    /// In-process stores enforcing the same unique keys as the MongoDB indexes.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::<User>::with_unique(&["email", "username"])),
            organizations: Arc::new(InMemoryRepository::<Organization>::with_unique(&["domain"])),
            posts: Arc::new(InMemoryRepository::<Post>::new()),
            leads: Arc::new(InMemoryRepository::<Lead>::new()),
            projects: Arc::new(InMemoryRepository::<Project>::new()),
            project_updates: Arc::new(InMemoryRepository::<ProjectUpdate>::new()),
            meetings: Arc::new(InMemoryRepository::<Meeting>::new()),
            audit_logs: Arc::new(InMemoryRepository::<SecurityAuditLog>::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, status: &str, visibility: &str) -> Document {
        doc! { "author_id": author, "status": status, "visibility": visibility }
    }

    #[test]
    fn and_drops_all_terms() {
        assert_eq!(Filter::and(vec![Filter::All, Filter::All]), Filter::All);
        assert_eq!(
            Filter::and(vec![Filter::All, Filter::eq("a", 1)]),
            Filter::eq("a", 1)
        );
    }

    #[test]
    fn or_with_all_is_all() {
        assert_eq!(Filter::or(vec![Filter::eq("a", 1), Filter::All]), Filter::All);
    }

    #[test]
    fn owner_or_published_public_predicate() {
        let filter = Filter::or(vec![
            Filter::eq("author_id", "u1"),
            Filter::and(vec![
                Filter::eq("status", "published"),
                Filter::eq("visibility", "public"),
            ]),
        ]);

        assert!(filter.matches(&post("u1", "draft", "private")));
        assert!(filter.matches(&post("u2", "published", "public")));
        assert!(!filter.matches(&post("u2", "published", "private")));
        assert!(!filter.matches(&post("u2", "draft", "public")));
    }

    #[test]
    fn renders_mongo_query() {
        let filter = Filter::and(vec![Filter::id("p1"), Filter::eq("organization_id", "o1")]);
        assert_eq!(
            filter.to_document(),
            doc! { "$and": [ { "_id": "p1" }, { "organization_id": "o1" } ] }
        );
        assert_eq!(Filter::Or(vec![]).to_document(), doc! { "$expr": false });
    }

    #[test]
    fn null_matches_missing_field() {
        assert!(Filter::eq("organization_id", Bson::Null).matches(&doc! {}));
    }

    #[test]
    fn sort_orders_descending() {
        let sort = SortBy { field: "n", descending: true };
        let mut docs = vec![doc! { "n": 1 }, doc! { "n": 3 }, doc! { "n": 2 }];
        docs.sort_by(|a, b| sort.compare(a, b));
        let order: Vec<i32> = docs.iter().filter_map(|d| d.get_i32("n").ok()).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::{Filter, Record, Repository, SortBy, StoreError};
use crate::models::{Lead, Meeting, Organization, Post, Project, ProjectUpdate, User};

const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
                StoreError::Duplicate(write.message.clone())
            }
            ErrorKind::BsonDeserialization(e) => StoreError::Corrupt(e.to_string()),
            ErrorKind::BsonSerialization(e) => StoreError::Corrupt(e.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to MongoDB");
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        self.create_index::<User>(doc! { "email": 1 }, "email_unique", true, false)
            .await?;
        self.create_index::<User>(doc! { "username": 1 }, "username_unique", true, false)
            .await?;
        self.create_index::<User>(doc! { "organization_id": 1 }, "organization_lookup", false, false)
            .await?;
        self.create_index::<Organization>(doc! { "domain": 1 }, "domain_unique", true, true)
            .await?;
        self.create_index::<Post>(doc! { "author_id": 1, "status": 1 }, "author_status", false, false)
            .await?;
        self.create_index::<Post>(
            doc! { "status": 1, "visibility": 1 },
            "status_visibility",
            false,
            false,
        )
        .await?;
        self.create_index::<Lead>(
            doc! { "organization_id": 1, "assigned_to": 1 },
            "organization_assignee",
            false,
            false,
        )
        .await?;
        self.create_index::<Lead>(
            doc! { "organization_id": 1, "status": 1 },
            "organization_status",
            false,
            false,
        )
        .await?;
        self.create_index::<Project>(doc! { "organization_id": 1 }, "organization_lookup", false, false)
            .await?;
        self.create_index::<ProjectUpdate>(
            doc! { "project_id": 1, "organization_id": 1 },
            "project_lookup",
            false,
            false,
        )
        .await?;
        self.create_index::<Meeting>(
            doc! { "organization_id": 1, "meeting_date": 1 },
            "organization_schedule",
            false,
            false,
        )
        .await?;

        tracing::info!("MongoDB indexes ready");
        Ok(())
    }

    async fn create_index<T: Record>(
        &self,
        keys: Document,
        name: &str,
        unique: bool,
        sparse: bool,
    ) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(name.to_string())
                    .unique(unique)
                    .sparse(sparse)
                    .build(),
            )
            .build();

        self.db
            .collection::<Document>(T::COLLECTION)
            .create_index(index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    collection = T::COLLECTION,
                    index = name,
                    "Failed to create index"
                );
                AppError::from(e)
            })?;
        tracing::debug!(collection = T::COLLECTION, index = name, "Created index");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    pub fn repository<T: Record>(&self) -> MongoRepository<T> {
        MongoRepository {
            collection: self.db.collection(T::COLLECTION),
        }
    }
}

pub struct MongoRepository<T: Record> {
    collection: Collection<T>,
}

#[async_trait]
impl<T: Record> Repository<T> for MongoRepository<T> {
    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        self.collection.insert_one(record, None).await?;
        Ok(())
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        Ok(self.collection.find_one(filter.to_document(), None).await?)
    }

    async fn find(&self, filter: Filter, sort: SortBy) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::builder().sort(sort.to_document()).build();
        let cursor = self.collection.find(filter.to_document(), options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, record: &T) -> Result<bool, StoreError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": record.id() }, record, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, filter: Filter) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_many(filter.to_document(), None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.collection.estimated_document_count(None).await?;
        Ok(())
    }
}

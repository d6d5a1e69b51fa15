use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{self, doc},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use serde::{Deserialize, Serialize};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::WaitlistRepo,
    domain::entities::subscriber::{InsertOutcome, Subscriber},
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct SubscriberDocument {
    email: String,
    timestamp: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl From<&Subscriber> for SubscriberDocument {
    fn from(s: &Subscriber) -> Self {
        Self {
            email: s.email.clone(),
            timestamp: bson::DateTime::from_millis(s.timestamp.and_utc().timestamp_millis()),
            status: s.status.clone(),
            source: s.source.clone(),
        }
    }
}

impl From<SubscriberDocument> for Subscriber {
    fn from(d: SubscriberDocument) -> Self {
        let timestamp = DateTime::from_timestamp_millis(d.timestamp.timestamp_millis())
            .map(|dt| dt.naive_utc())
            .unwrap_or_else(NaiveDateTime::default);
        Subscriber {
            email: d.email,
            timestamp,
            status: d.status,
            source: d.source,
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        tracing::error!(error = ?err, "MongoDB error");
        AppError::Storage(format!("MongoDB operation failed: {err}"))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// A unique-index rejection is a duplicate signup, not a storage failure.
fn insert_outcome<T>(result: mongodb::error::Result<T>, email: &str) -> AppResult<InsertOutcome> {
    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(err) if is_duplicate_key(&err) => {
            tracing::info!(email, "Unique index rejected duplicate signup");
            Ok(InsertOutcome::AlreadyPresent)
        }
        Err(err) => Err(err.into()),
    }
}

/// Waitlist stored as one document per subscriber, unique on `email`.
#[derive(Clone)]
pub struct MongoWaitlistStore {
    collection: Collection<SubscriberDocument>,
}

impl MongoWaitlistStore {
    /// Connects and makes sure the unique email index exists.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> AppResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self {
            collection: client.database(database).collection(collection),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl WaitlistRepo for MongoWaitlistStore {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn contains(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .collection
            .find_one(doc! { "email": email })
            .await?
            .is_some())
    }

    async fn insert(&self, subscriber: &Subscriber) -> AppResult<InsertOutcome> {
        let result = self
            .collection
            .insert_one(SubscriberDocument::from(subscriber))
            .await;
        insert_outcome(result, &subscriber.email)
    }

    async fn list(&self) -> AppResult<Vec<Subscriber>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await?;
        let docs: Vec<SubscriberDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Subscriber::from).collect())
    }

    async fn remove(&self, email: &str) -> AppResult<bool> {
        let result = self
            .collection
            .delete_many(doc! { "email": email })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

//! MongoDB-backed [`DocumentStore`].

use async_trait::async_trait;
use citsm_core::error::{MigrationError, MigrationResult};
use citsm_core::fields::TextIndexSpec;
use citsm_core::store::{DocumentStore, StoreConnector};
use citsm_core::value::Document;
use futures::TryStreamExt;
use mongodb::bson::{self, doc};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::convert::to_bson_document;

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Connection settings for one target collection.
#[derive(Clone)]
pub struct MongoConnector {
    uri: String,
    database: String,
    collection: String,
}

impl MongoConnector {
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Open a client and ping the deployment.
    ///
    /// The driver connects lazily, so the ping is what turns a bad URI or
    /// unreachable cluster into an error here instead of on first write.
    pub async fn open(&self) -> MigrationResult<MongoStore> {
        let client = Client::with_uri_str(&self.uri)
            .await
            .map_err(|e| MigrationError::store_connection(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| MigrationError::store_connection(e.to_string()))?;

        tracing::info!(
            database = %self.database,
            collection = %self.collection,
            "Connected to document store",
        );

        let collection = client
            .database(&self.database)
            .collection::<bson::Document>(&self.collection);

        Ok(MongoStore {
            client: Some(client),
            collection,
        })
    }
}

impl std::fmt::Debug for MongoConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URI carries credentials.
        f.debug_struct("MongoConnector")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    type Store = MongoStore;

    async fn connect(&self) -> MigrationResult<MongoStore> {
        self.open().await
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// An open handle on one MongoDB collection.
pub struct MongoStore {
    client: Option<Client>,
    collection: Collection<bson::Document>,
}

impl MongoStore {
    /// Run a filtered, sorted, limited find.
    pub async fn find(
        &self,
        filter: bson::Document,
        sort: bson::Document,
        limit: i64,
    ) -> MigrationResult<Vec<bson::Document>> {
        let cursor = self
            .collection
            .find(filter)
            .sort(sort)
            .limit(limit)
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))?;

        cursor
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))
    }

    pub async fn find_one(
        &self,
        filter: bson::Document,
    ) -> MigrationResult<Option<bson::Document>> {
        self.collection
            .find_one(filter)
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))
    }

    /// Run an aggregation pipeline and collect every result document.
    pub async fn aggregate(
        &self,
        pipeline: Vec<bson::Document>,
    ) -> MigrationResult<Vec<bson::Document>> {
        let cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))?;

        cursor
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))
    }

    /// Names of every index currently defined on the collection.
    pub async fn index_names(&self) -> MigrationResult<Vec<String>> {
        self.collection
            .list_index_names()
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))
    }
}

/// Index model for a text index over `spec.fields`.
pub fn text_index_model(spec: &TextIndexSpec) -> IndexModel {
    let mut keys = bson::Document::new();
    for field in &spec.fields {
        keys.insert(field.clone(), "text");
    }

    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(spec.name.clone()).build())
        .build()
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn collection_name(&self) -> &str {
        self.collection.name()
    }

    async fn insert_batch(&mut self, documents: Vec<Document>) -> MigrationResult<u64> {
        if documents.is_empty() {
            return Ok(0);
        }

        let batch: Vec<bson::Document> = documents.into_iter().map(to_bson_document).collect();
        let result = self
            .collection
            .insert_many(batch)
            .await
            .map_err(|e| MigrationError::Write(e.to_string()))?;

        Ok(result.inserted_ids.len() as u64)
    }

    async fn ensure_text_index(&mut self, spec: &TextIndexSpec) -> MigrationResult<()> {
        let result = self
            .collection
            .create_index(text_index_model(spec))
            .await
            .map_err(|e| MigrationError::Index(e.to_string()))?;

        tracing::info!(
            collection = %self.collection.name(),
            index = %result.index_name,
            fields = ?spec.fields,
            "Text index ensured",
        );
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            tracing::debug!("Document store client shut down");
        }
    }
}

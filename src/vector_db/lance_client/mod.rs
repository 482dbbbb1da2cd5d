//! LanceDB vector database client
//!
//! One table per (repository, tool chain). Rows are keyed by their
//! time-based id so a reload replaces rows instead of duplicating them.

use crate::error::VectorDbError;
use crate::vector_db::{CommitRow, CommitSearchResult, TimeWindow, VectorDatabase};
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator,
    StringArray, types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::Table;
use lancedb::connection::Connection;
use lancedb::index::Index;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Smallest table for which an ANN index is trained
pub const MIN_ROWS_FOR_INDEX: usize = 256;

/// LanceDB vector database implementation (embedded, no server required)
pub struct LanceVectorDB {
    connection: Connection,
    db_path: String,
    /// Serializes commits to the dataset so concurrent workers don't race
    /// each other's table versions
    write_lock: Mutex<()>,
}

impl LanceVectorDB {
    /// Create a new LanceDB instance with custom path
    pub async fn with_path(db_path: &str) -> Result<Self> {
        tracing::info!("Connecting to LanceDB at: {}", db_path);

        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed(e.to_string()))
            .context("Failed to connect to LanceDB")?;

        Ok(Self {
            connection,
            db_path: db_path.to_string(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Create schema for a commit table
    fn create_schema(dimension: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new("id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("metadata", DataType::Utf8, false),
            Field::new("commit_hash", DataType::Utf8, false),
            Field::new("author", DataType::Utf8, false),
            Field::new("date", DataType::Utf8, false),
            Field::new("committed_at", DataType::Int64, false),
            Field::new("time_partition", DataType::Utf8, false),
        ]))
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .context("Failed to list tables")?;
        Ok(table_names.iter().any(|name| name == table))
    }

    async fn get_table(&self, table: &str) -> Result<Table> {
        self.connection
            .open_table(table)
            .execute()
            .await
            .map_err(|_| VectorDbError::TableNotFound(table.to_string()))
            .with_context(|| format!("Failed to open table '{}'", table))
    }

    /// Convert rows to a RecordBatch
    fn create_record_batch(rows: Vec<CommitRow>, schema: Arc<Schema>) -> Result<RecordBatch> {
        let dimension = match schema.field_with_name("vector")?.data_type() {
            DataType::FixedSizeList(_, size) => *size as usize,
            other => {
                return Err(VectorDbError::InvalidBatch(format!(
                    "vector column has type {}",
                    other
                ))
                .into());
            }
        };

        if let Some(bad) = rows.iter().find(|r| r.vector.len() != dimension) {
            return Err(VectorDbError::InvalidBatch(format!(
                "commit {} has a {}-dim vector, table expects {}",
                bad.commit_hash,
                bad.vector.len(),
                dimension
            ))
            .into());
        }

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            rows.iter()
                .map(|r| Some(r.vector.iter().copied().map(Some))),
            dimension as i32,
        );

        let strings = |f: fn(&CommitRow) -> &str| {
            StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
        };
        let id_array = strings(|r| r.id.as_str());
        let content_array = strings(|r| r.content.as_str());
        let metadata_array = strings(|r| r.metadata.as_str());
        let hash_array = strings(|r| r.commit_hash.as_str());
        let author_array = strings(|r| r.author.as_str());
        let date_array = strings(|r| r.date.as_str());
        let partition_array = strings(|r| r.time_partition.as_str());
        let committed_at_array =
            Int64Array::from(rows.iter().map(|r| r.committed_at).collect::<Vec<_>>());

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(vector_array),
                Arc::new(id_array),
                Arc::new(content_array),
                Arc::new(metadata_array),
                Arc::new(hash_array),
                Arc::new(author_array),
                Arc::new(date_array),
                Arc::new(committed_at_array),
                Arc::new(partition_array),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .with_context(|| format!("Missing or invalid '{}' column", name))
    }

    fn batch_to_results(batch: &RecordBatch) -> Result<Vec<CommitSearchResult>> {
        let distance_array = batch
            .column_by_name("_distance")
            .context("Missing _distance column")?
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("Invalid _distance type")?;
        let hashes = Self::string_column(batch, "commit_hash")?;
        let authors = Self::string_column(batch, "author")?;
        let dates = Self::string_column(batch, "date")?;
        let partitions = Self::string_column(batch, "time_partition")?;
        let contents = Self::string_column(batch, "content")?;
        let metadata = Self::string_column(batch, "metadata")?;

        let mut results = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let distance = distance_array.value(i);
            results.push(CommitSearchResult {
                commit_hash: hashes.value(i).to_string(),
                author: authors.value(i).to_string(),
                date: dates.value(i).to_string(),
                time_partition: partitions.value(i).to_string(),
                content: contents.value(i).to_string(),
                metadata: serde_json::from_str(metadata.value(i))
                    .unwrap_or(serde_json::Value::Null),
                score: 1.0 / (1.0 + distance),
            });
        }
        Ok(results)
    }
}

#[async_trait::async_trait]
impl VectorDatabase for LanceVectorDB {
    async fn recreate_table(&self, table: &str, dimension: usize) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.table_exists(table).await? {
            tracing::info!("Dropping existing table '{}'", table);
            self.connection
                .drop_table(table, &[])
                .await
                .map_err(|e| VectorDbError::TableCreationFailed {
                    table: table.to_string(),
                    reason: e.to_string(),
                })?;
        }

        let schema = Self::create_schema(dimension);
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let batches =
            RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema.clone());

        self.connection
            .create_table(table, Box::new(batches))
            .execute()
            .await
            .map_err(|e| VectorDbError::TableCreationFailed {
                table: table.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!("Created table '{}' (dimension {})", table, dimension);
        Ok(())
    }

    async fn upsert(&self, table: &str, rows: Vec<CommitRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        // Open under the lock so the merge starts from the latest version
        let _guard = self.write_lock.lock().await;
        let tbl = self.get_table(table).await?;
        let schema = tbl.schema().await.context("Failed to read table schema")?;
        let batch = Self::create_record_batch(rows, schema.clone())?;
        let count = batch.num_rows();
        let reader = Box::new(RecordBatchIterator::new(
            vec![batch].into_iter().map(Ok),
            schema,
        ));

        let mut merge = tbl.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(reader)
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                table: table.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Upserted {} rows into '{}'", count, table);
        Ok(count)
    }

    async fn create_index(&self, table: &str) -> Result<bool> {
        let rows = self.count_rows(table).await?;
        if rows < MIN_ROWS_FOR_INDEX {
            tracing::info!(
                "Skipping index for '{}': {} rows (need {})",
                table,
                rows,
                MIN_ROWS_FOR_INDEX
            );
            return Ok(false);
        }

        let _guard = self.write_lock.lock().await;
        let tbl = self.get_table(table).await?;
        tbl.create_index(&["vector"], Index::Auto)
            .execute()
            .await
            .with_context(|| format!("Failed to build vector index on '{}'", table))?;

        tracing::info!("Built vector index on '{}' ({} rows)", table, rows);
        Ok(true)
    }

    async fn count_rows(&self, table: &str) -> Result<usize> {
        let tbl = self.get_table(table).await?;
        let count = tbl
            .count_rows(None)
            .await
            .with_context(|| format!("Failed to count rows in '{}'", table))?;
        Ok(count)
    }

    async fn search(
        &self,
        table: &str,
        query_vector: Vec<f32>,
        limit: usize,
        window: TimeWindow,
    ) -> Result<Vec<CommitSearchResult>> {
        let tbl = self.get_table(table).await?;

        let query = tbl
            .vector_search(query_vector)
            .context("Failed to create vector search")?
            .limit(limit);

        let stream = match window.to_filter() {
            Some(filter) => query.only_if(filter).execute().await,
            None => query.execute().await,
        }
        .map_err(|e| VectorDbError::SearchFailed {
            table: table.to_string(),
            reason: e.to_string(),
        })?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut results = Vec::new();
        for batch in &batches {
            results.extend(Self::batch_to_results(batch)?);
        }
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(results)
    }
}

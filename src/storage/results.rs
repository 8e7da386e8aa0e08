//! Tantivy-backed store for the latest clustering result set.
//!
//! The whole set is replaced in one writer transaction: delete everything,
//! add the new rows and the run metadata, commit. Readers hold a searcher
//! over the last committed generation, so they never see a mix of old and
//! new rows. A failed replace is rolled back and the previous set stays
//! readable.
//!
//! Opening a store only builds a reader. The index lockfile is taken by a
//! [`StoreWriter`] for the length of one write, so any number of processes
//! can read while a single one refreshes.

use super::error::{StorageError, StorageResult};
use crate::analysis::Placement;
use crate::types::{ClusterId, LegislatorId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tantivy::collector::{Count, DocSetCollector};
use tantivy::directory::MmapDirectory;
use tantivy::directory::error::LockError;
use tantivy::query::TermQuery;
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, STORED, STRING, Schema, SchemaBuilder, Value,
};
use tantivy::{
    Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, Searcher,
    TantivyDocument as Document, TantivyError, Term,
};

/// Tag stamped on results when none is configured.
pub const DEFAULT_MODEL_VERSION: &str = "v1.0";

const RESULT_DOC: &str = "result";
const RUN_DOC: &str = "run";
const WRITER_HEAP_BYTES: usize = 50_000_000;
const DATE_FORMAT: &str = "%Y-%m-%d";
const WRITER_POLL_START: Duration = Duration::from_millis(25);
const WRITER_POLL_MAX: Duration = Duration::from_millis(1_000);

/// One persisted placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// `cluster_{legislator_id}_{YYYYMMDD}`
    pub id: String,
    pub legislator_id: LegislatorId,
    pub cluster_id: ClusterId,
    pub x: f64,
    pub y: f64,
    pub similarity: f64,
    pub model_version: String,
    pub computed_at: NaiveDate,
}

impl ClusteringResult {
    /// Two runs for the same legislator on the same day share an id.
    pub fn result_id(legislator_id: &LegislatorId, computed_at: NaiveDate) -> String {
        format!("cluster_{legislator_id}_{}", computed_at.format("%Y%m%d"))
    }

    pub fn from_placement(
        placement: &Placement,
        model_version: &str,
        computed_at: NaiveDate,
    ) -> Self {
        Self {
            id: Self::result_id(&placement.legislator_id, computed_at),
            legislator_id: placement.legislator_id.clone(),
            cluster_id: placement.cluster_id,
            x: placement.x,
            y: placement.y,
            similarity: placement.similarity,
            model_version: model_version.to_string(),
            computed_at,
        }
    }

    fn validate(&self) -> StorageResult<()> {
        let reject = |reason: &str| StorageError::InvalidResult {
            legislator_id: self.legislator_id.to_string(),
            reason: reason.to_string(),
        };
        if self.legislator_id.as_str().is_empty() {
            return Err(reject("empty legislator id"));
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(reject("coordinates must be finite"));
        }
        if !self.similarity.is_finite() {
            return Err(reject("similarity must be finite"));
        }
        Ok(())
    }
}

/// Facts about the run that produced the stored set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub model_version: String,
    pub computed_at: NaiveDate,
    pub legislators: usize,
    pub clusters: usize,
    pub degenerate: bool,
    pub explained_variance: [f64; 2],
}

#[derive(Debug, Clone)]
struct ResultSchema {
    doc_type: Field,
    result_id: Field,
    legislator_id: Field,
    cluster_id: Field,
    x: Field,
    y: Field,
    similarity: Field,
    model_version: Field,
    computed_at: Field,
    meta_json: Field,
}

impl ResultSchema {
    fn build() -> Schema {
        let mut builder = SchemaBuilder::default();

        let float_options = NumericOptions::default().set_stored().set_fast();

        builder.add_text_field("doc_type", STRING | STORED);
        builder.add_text_field("result_id", STRING | STORED);
        builder.add_text_field("legislator_id", STRING | STORED);
        builder.add_u64_field(
            "cluster_id",
            NumericOptions::default()
                .set_indexed()
                .set_stored()
                .set_fast(),
        );
        builder.add_f64_field("x", float_options.clone());
        builder.add_f64_field("y", float_options.clone());
        builder.add_f64_field("similarity", float_options);
        builder.add_text_field("model_version", STRING | STORED);
        builder.add_text_field("computed_at", STRING | STORED);
        builder.add_text_field("meta_json", STORED);

        builder.build()
    }

    /// Resolve field handles, failing if the on-disk schema is foreign.
    fn resolve(schema: &Schema) -> StorageResult<Self> {
        let field = |name: &str| {
            schema.get_field(name).map_err(|_| StorageError::Corrupted {
                reason: format!("missing field '{name}'"),
            })
        };
        Ok(Self {
            doc_type: field("doc_type")?,
            result_id: field("result_id")?,
            legislator_id: field("legislator_id")?,
            cluster_id: field("cluster_id")?,
            x: field("x")?,
            y: field("y")?,
            similarity: field("similarity")?,
            model_version: field("model_version")?,
            computed_at: field("computed_at")?,
            meta_json: field("meta_json")?,
        })
    }
}

/// Holder of the current result set.
pub struct ResultStore {
    index: Index,
    reader: IndexReader,
    schema: ResultSchema,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ResultStore {
    /// Open the store at `path`, creating an empty one if needed.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;

        let existing = path.join("meta.json").exists();
        let index = if existing {
            Index::open_in_dir(&path)?
        } else {
            let dir = MmapDirectory::open(&path)?;
            Index::create(dir, ResultSchema::build(), IndexSettings::default())?
        };

        tracing::debug!(path = %path.display(), existing, "opened result store");
        Self::from_index(index, Some(path))
    }

    /// Non-persistent store, used by tests and one-shot runs.
    pub fn open_in_ram() -> StorageResult<Self> {
        Self::from_index(Index::create_in_ram(ResultSchema::build()), None)
    }

    fn from_index(index: Index, path: Option<PathBuf>) -> StorageResult<Self> {
        let schema = ResultSchema::resolve(&index.schema())?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        reader.reload()?;

        Ok(Self {
            index,
            reader,
            schema,
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Take the index lock for one write.
    ///
    /// Fails with [`StorageError::WriterBusy`] when another writer holds it.
    pub fn writer(&self) -> StorageResult<StoreWriter<'_>> {
        let writer = self
            .index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .map_err(|e| match e {
                TantivyError::LockFailure(LockError::LockBusy, _) => StorageError::WriterBusy,
                other => StorageError::Tantivy(other),
            })?;
        Ok(StoreWriter {
            store: self,
            writer,
        })
    }

    /// Like [`writer`](Self::writer), but polls until the lock is free.
    pub fn wait_for_writer(&self) -> StorageResult<StoreWriter<'_>> {
        let mut delay = WRITER_POLL_START;
        loop {
            match self.writer() {
                Err(StorageError::WriterBusy) => {
                    tracing::debug!(
                        delay_ms = delay.as_millis() as u64,
                        "result store locked, waiting"
                    );
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(WRITER_POLL_MAX);
                }
                other => return other,
            }
        }
    }

    /// Atomically swap the stored set for `results`.
    ///
    /// On error nothing is committed and the previous set remains.
    pub fn replace(
        &self,
        results: &[ClusteringResult],
        metadata: &RunMetadata,
    ) -> StorageResult<()> {
        self.writer()?.replace(results, metadata)
    }

    fn stage(
        &self,
        writer: &mut IndexWriter<Document>,
        results: &[ClusteringResult],
        metadata: &RunMetadata,
    ) -> StorageResult<()> {
        writer.delete_all_documents()?;

        let mut seen = HashSet::with_capacity(results.len());
        for result in results {
            result.validate()?;
            if !seen.insert(&result.legislator_id) {
                return Err(StorageError::InvalidResult {
                    legislator_id: result.legislator_id.to_string(),
                    reason: "duplicate legislator in result set".to_string(),
                });
            }
            writer.add_document(self.result_document(result))?;
        }

        writer.add_document(self.run_document(metadata)?)?;
        Ok(())
    }

    fn result_document(&self, result: &ClusteringResult) -> Document {
        let mut doc = Document::default();
        doc.add_text(self.schema.doc_type, RESULT_DOC);
        doc.add_text(self.schema.result_id, &result.id);
        doc.add_text(self.schema.legislator_id, result.legislator_id.as_str());
        doc.add_u64(self.schema.cluster_id, u64::from(result.cluster_id.get()));
        doc.add_f64(self.schema.x, result.x);
        doc.add_f64(self.schema.y, result.y);
        doc.add_f64(self.schema.similarity, result.similarity);
        doc.add_text(self.schema.model_version, &result.model_version);
        doc.add_text(
            self.schema.computed_at,
            result.computed_at.format(DATE_FORMAT).to_string(),
        );
        doc
    }

    fn run_document(&self, metadata: &RunMetadata) -> StorageResult<Document> {
        let json = serde_json::to_string(metadata)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut doc = Document::default();
        doc.add_text(self.schema.doc_type, RUN_DOC);
        doc.add_text(self.schema.meta_json, json);
        Ok(doc)
    }

    /// Every stored result, ordered by legislator id.
    pub fn snapshot(&self) -> StorageResult<Vec<ClusteringResult>> {
        let searcher = self.searcher()?;
        let addresses = searcher.search(&self.doc_type_query(RESULT_DOC), &DocSetCollector)?;

        let mut results = addresses
            .into_iter()
            .map(|address| {
                let doc: Document = searcher.doc(address)?;
                self.decode_result(&doc)
            })
            .collect::<StorageResult<Vec<_>>>()?;
        results.sort_by(|a, b| a.legislator_id.cmp(&b.legislator_id));
        Ok(results)
    }

    /// Metadata of the run behind the current set, if any run has been stored.
    pub fn metadata(&self) -> StorageResult<Option<RunMetadata>> {
        let searcher = self.searcher()?;
        let addresses = searcher.search(&self.doc_type_query(RUN_DOC), &DocSetCollector)?;

        let Some(address) = addresses.into_iter().next() else {
            return Ok(None);
        };
        let doc: Document = searcher.doc(address)?;
        let json = doc
            .get_first(self.schema.meta_json)
            .and_then(|v| v.as_str())
            .ok_or_else(|| invalid_field("meta_json", "missing"))?;
        serde_json::from_str(json)
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Number of stored results.
    pub fn count(&self) -> StorageResult<usize> {
        let searcher = self.searcher()?;
        Ok(searcher.search(&self.doc_type_query(RESULT_DOC), &Count)?)
    }

    /// Remove every result and the run metadata.
    pub fn clear(&self) -> StorageResult<()> {
        self.writer()?.clear()
    }

    /// Searcher over the newest commit, including commits from other processes.
    fn searcher(&self) -> StorageResult<Searcher> {
        self.reader.reload()?;
        Ok(self.reader.searcher())
    }

    fn doc_type_query(&self, doc_type: &str) -> TermQuery {
        TermQuery::new(
            Term::from_field_text(self.schema.doc_type, doc_type),
            IndexRecordOption::Basic,
        )
    }

    fn decode_result(&self, doc: &Document) -> StorageResult<ClusteringResult> {
        let text = |field: Field, name: &str| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| invalid_field(name, "missing"))
        };
        let float = |field: Field, name: &str| {
            doc.get_first(field)
                .and_then(|v| v.as_f64())
                .ok_or_else(|| invalid_field(name, "missing"))
        };

        let cluster_id = doc
            .get_first(self.schema.cluster_id)
            .and_then(|v| v.as_u64())
            .and_then(|raw| u32::try_from(raw).ok())
            .map(ClusterId::new)
            .ok_or_else(|| invalid_field("cluster_id", "not a valid u32"))?;

        let computed_at = text(self.schema.computed_at, "computed_at")?;
        let computed_at = NaiveDate::parse_from_str(&computed_at, DATE_FORMAT)
            .map_err(|e| invalid_field("computed_at", &e.to_string()))?;

        Ok(ClusteringResult {
            id: text(self.schema.result_id, "result_id")?,
            legislator_id: LegislatorId::new(text(self.schema.legislator_id, "legislator_id")?),
            cluster_id,
            x: float(self.schema.x, "x")?,
            y: float(self.schema.y, "y")?,
            similarity: float(self.schema.similarity, "similarity")?,
            model_version: text(self.schema.model_version, "model_version")?,
            computed_at,
        })
    }
}

/// Exclusive write access to a store. The index lock is released on drop.
pub struct StoreWriter<'a> {
    store: &'a ResultStore,
    writer: IndexWriter<Document>,
}

impl StoreWriter<'_> {
    /// Replace the stored set with `results` in a single commit.
    ///
    /// On error the transaction is rolled back and the previous set remains.
    pub fn replace(
        mut self,
        results: &[ClusteringResult],
        metadata: &RunMetadata,
    ) -> StorageResult<()> {
        let staged = self
            .store
            .stage(&mut self.writer, results, metadata)
            .and_then(|()| {
                self.writer
                    .commit()
                    .map(|_| ())
                    .map_err(StorageError::from)
            });

        if let Err(error) = staged {
            if let Err(rollback_error) = self.writer.rollback() {
                tracing::error!(%rollback_error, "rollback after failed replace also failed");
            }
            tracing::warn!(%error, "result replace rolled back");
            return Err(error);
        }

        self.store.reader.reload()?;
        tracing::debug!(results = results.len(), "result set replaced");
        Ok(())
    }

    pub fn clear(mut self) -> StorageResult<()> {
        self.writer.delete_all_documents()?;
        self.writer.commit()?;
        self.store.reader.reload()?;
        Ok(())
    }
}

fn invalid_field(field: &str, reason: &str) -> StorageError {
    StorageError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

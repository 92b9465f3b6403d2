use std::time::{Duration, Instant};

use chrono::{SubsecRound, Utc};
use tracing::{debug, instrument};

use crate::{
    catalog::storage_key,
    core::storage::{ContentStore, StoreError},
    model::{
        repository::{self, db::DbConn, image::CreateImage, NotFoundError},
        Digest, ImageRecord, InvalidProjectForm, ProjectId,
    },
    processing::{
        hash::digest_bytes,
        image::{decode, generate_variants, DecodedImage, VariantError, VariantTable},
    },
};

/// Point in time after which an ingest gives up. Checked between pipeline
/// steps, a step that already started always runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn after(timeout: Duration) -> Deadline {
        Deadline(Instant::now().checked_add(timeout))
    }

    pub fn at(instant: Instant) -> Deadline {
        Deadline(Some(instant))
    }

    pub fn never() -> Deadline {
        Deadline(None)
    }

    pub fn check(&self, next: IngestStage) -> Result<(), IngestError> {
        match self.0 {
            Some(deadline) if Instant::now() >= deadline => Err(IngestError::Timeout(next)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum IngestStage {
    Decode,
    Digest,
    SaveOriginal,
    Variants,
    Record,
}

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("could not decode image")]
    Decode(#[source] VariantError),
    #[error("could not encode image variant")]
    Encode(#[source] VariantError),
    #[error("error accessing the image store")]
    StorageIo(#[source] StoreError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("ingest deadline passed before step {0}")]
    Timeout(IngestStage),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("database error: {0}")]
    Database(eyre::Report),
}

impl From<VariantError> for IngestError {
    fn from(value: VariantError) -> Self {
        if value.is_decode_error() {
            IngestError::Decode(value)
        } else {
            IngestError::Encode(value)
        }
    }
}

impl From<StoreError> for IngestError {
    fn from(value: StoreError) -> Self {
        IngestError::StorageIo(value)
    }
}

impl From<InvalidProjectForm> for IngestError {
    fn from(value: InvalidProjectForm) -> Self {
        IngestError::InvalidInput(value.to_string())
    }
}

impl From<eyre::Report> for IngestError {
    fn from(value: eyre::Report) -> Self {
        match value.downcast_ref::<NotFoundError>() {
            Some(not_found) => IngestError::NotFound(not_found.clone()),
            None => IngestError::Database(value),
        }
    }
}

// needed to run ingests inside diesel transactions
impl From<diesel::result::Error> for IngestError {
    fn from(value: diesel::result::Error) -> Self {
        IngestError::Database(eyre::Report::new(value))
    }
}

/// Turns uploaded bytes into a stored original, its variants and an Image row.
#[derive(Debug, Clone)]
pub struct ImageIngester {
    store: ContentStore,
    variants: VariantTable,
}

impl ImageIngester {
    pub fn new(store: ContentStore, variants: VariantTable) -> ImageIngester {
        ImageIngester { store, variants }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn variants(&self) -> &VariantTable {
        &self.variants
    }

    /// Ingests one image for `project_id`.
    ///
    /// Meant to run inside a transaction owned by the caller: the Image row
    /// only becomes visible when that commits, and any error here should
    /// roll it back. Files written before a failure stay in the store
    /// unreferenced until the reconciler sweeps them.
    #[instrument(skip(self, conn, bytes), fields(len = bytes.len()))]
    pub fn ingest(
        &self,
        conn: &mut DbConn,
        project_id: ProjectId,
        bytes: &[u8],
        deadline: Deadline,
    ) -> Result<ImageRecord, IngestError> {
        if !repository::project::project_exists(conn, project_id)? {
            return Err(NotFoundError::new("Project", project_id.0).into());
        }

        deadline.check(IngestStage::Decode)?;
        let decoded = decode(bytes)?;

        deadline.check(IngestStage::Digest)?;
        let digest = digest_bytes(bytes);

        deadline.check(IngestStage::SaveOriginal)?;
        self.store.save_as(&digest, bytes)?;

        deadline.check(IngestStage::Variants)?;
        self.write_variants(&decoded, &digest, deadline)?;

        deadline.check(IngestStage::Record)?;
        let record = repository::image::insert_image(
            conn,
            &CreateImage {
                project_id,
                digest: digest.clone(),
                format: decoded.format(),
                path: storage_key::original(&digest),
                created_at: Utc::now().trunc_subsecs(3),
            },
        )?;
        debug!(%digest, image_id = %record.id, "ingested image");
        Ok(record)
    }

    /// Ingests all `uploads` in order. The first failure aborts the batch,
    /// which aborts the caller's transaction with it.
    #[instrument(skip(self, conn, uploads), fields(count = uploads.len()))]
    pub fn ingest_batch<B: AsRef<[u8]>>(
        &self,
        conn: &mut DbConn,
        project_id: ProjectId,
        uploads: &[B],
        deadline: Deadline,
    ) -> Result<Vec<ImageRecord>, IngestError> {
        uploads
            .iter()
            .map(|bytes| self.ingest(conn, project_id, bytes.as_ref(), deadline))
            .collect()
    }

    fn write_variants(
        &self,
        decoded: &DecodedImage,
        digest: &Digest,
        deadline: Deadline,
    ) -> Result<(), IngestError> {
        let format = decoded.format();
        // variants of an already known digest only need their mtime refreshed
        let mut missing = Vec::new();
        for spec in self.variants.specs() {
            let key = storage_key::variant(&spec.name, digest, format);
            if !self.store.refresh(&key)? {
                missing.push(spec.clone());
            }
        }
        if missing.is_empty() {
            debug!(%digest, "all variants already stored");
            return Ok(());
        }
        let encoded = generate_variants(decoded, &missing)?;
        deadline.check(IngestStage::Variants)?;
        for variant in encoded {
            let key = storage_key::variant(&variant.name, digest, format);
            self.store.put(&key, &variant.bytes)?;
        }
        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;

use chainvid_chunks::{Chunk, ChunkError};
use chainvid_fees::{FeeGate, PacingProfile};
use chainvid_ledger::{LedgerClient, LedgerError, RecordMetadata};
use chainvid_progress::{ProgressRecord, ProgressStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{UploadError, UploadEvent};

/// Pause after each submission on the instant profile.
pub const INSTANT_PAUSE: Duration = Duration::from_secs(2);

/// Pause after each submission on the paced profile.
pub const PACED_PAUSE: Duration = Duration::from_secs(60);

/// Pause after each submission on the capped profile. The admission gate,
/// not this pause, is that profile's pacing mechanism.
pub const CAPPED_PAUSE: Duration = Duration::from_secs(2);

/// Drives one upload: create (or reuse) the parent record, then submit
/// chunks strictly in index order, checkpointing after every confirmation.
///
/// Collaborators are injected so tests can run the full loop against
/// mocks. The pacing profile is fixed for the run.
pub struct Uploader {
    ledger: Arc<dyn LedgerClient>,
    gate: FeeGate,
    store: Arc<dyn ProgressStore>,
    profile: PacingProfile,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
}

impl Uploader {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        gate: FeeGate,
        store: Arc<dyn ProgressStore>,
        profile: PacingProfile,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            ledger,
            gate,
            store,
            profile,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a token that cancels the run at the next between-chunk
    /// boundary. Progress stays valid for a later resume.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs a fresh upload: creates the ledger record, checkpoints its id,
    /// then submits every chunk.
    ///
    /// Refuses to start while a progress record exists — the working
    /// directory holds at most one in-flight upload.
    pub async fn run_fresh(
        &self,
        meta: &RecordMetadata,
        chunks: &[Chunk],
    ) -> Result<(), UploadError> {
        if self.store.load()?.is_some() {
            return Err(UploadError::UploadInFlight);
        }

        let price = self.submission_price().await?;
        let created = self
            .ledger
            .create_record(meta, price)
            .await
            .map_err(UploadError::RecordCreation)?;

        // The id must be on disk before any chunk goes out; a crash after
        // this point resumes instead of creating a second record.
        let record =
            ProgressRecord::new(&meta.filename, chunks.len() as u32, created.record_id.clone());
        self.store.save(&record)?;

        info!(
            record_id = %created.record_id,
            total_chunks = chunks.len(),
            "record created on ledger"
        );
        self.emit(UploadEvent::RecordCreated {
            record_id: created.record_id,
            tx_hash: created.confirmation.tx_hash,
        });

        self.upload_chunks(record, chunks).await
    }

    /// Resumes a checkpointed upload, submitting exactly the chunks above
    /// `lastUploadedChunk` and never re-touching the ones at or below it.
    pub async fn resume(
        &self,
        record: ProgressRecord,
        chunks: &[Chunk],
    ) -> Result<(), UploadError> {
        record.validate()?;
        if record.record_id.is_none() {
            return Err(UploadError::MissingRecordId);
        }
        if chunks.len() as u32 != record.total_chunks {
            return Err(UploadError::Chunks(ChunkError::CorruptStaging {
                expected: record.total_chunks,
                found: chunks.len() as u32,
            }));
        }

        info!(
            filename = %record.filename,
            next = record.next_chunk(),
            total = record.total_chunks,
            "resuming upload"
        );
        self.upload_chunks(record, chunks).await
    }

    async fn upload_chunks(
        &self,
        mut record: ProgressRecord,
        chunks: &[Chunk],
    ) -> Result<(), UploadError> {
        let record_id = record
            .record_id
            .clone()
            .ok_or(UploadError::MissingRecordId)?;
        let total = record.total_chunks;

        for chunk in &chunks[record.next_chunk() as usize..] {
            let index = chunk.index;

            if self.cancel.is_cancelled() {
                warn!(chunk = index, "upload cancelled between chunks");
                return Err(UploadError::Cancelled);
            }

            // Fee conditions can change materially over a multi-hour
            // upload, so the gate runs before every chunk.
            self.gate.wait_until_affordable().await;
            let price = self.submission_price().await?;

            self.emit(UploadEvent::ChunkSubmitting { index, total });
            let confirmation = self
                .ledger
                .append_chunk(&record_id, &chunk.data, price)
                .await
                .map_err(|source| match source {
                    LedgerError::ConfirmationTimeout { .. } => {
                        UploadError::ConfirmationTimeout {
                            chunk: index,
                            source,
                        }
                    }
                    source => UploadError::Submission {
                        chunk: index,
                        source,
                    },
                })?;

            // The checkpoint must be durable before the next submission
            // begins; a chunk may be confirmed, never unrecorded.
            record.last_uploaded_chunk = Some(index);
            self.store.save(&record)?;

            info!(
                chunk = index + 1,
                total,
                tx_hash = %confirmation.tx_hash,
                gas_used = confirmation.gas_used,
                "chunk confirmed"
            );
            self.emit(UploadEvent::ChunkConfirmed {
                index,
                total,
                tx_hash: confirmation.tx_hash,
            });

            if index + 1 < total {
                tokio::time::sleep(self.pause()).await;
            }
        }

        // The only path that deletes staged data.
        self.store.clear()?;
        info!(total, "all chunks uploaded");
        self.emit(UploadEvent::Completed);
        Ok(())
    }

    /// Price for the next write. The capped profile blocks here until its
    /// ceiling is met; the others pay the current margined base fee.
    async fn submission_price(&self) -> Result<u128, UploadError> {
        match self.profile {
            PacingProfile::Capped { max_price_gwei } => {
                Ok(self.gate.wait_for_price_at_most(max_price_gwei).await)
            }
            _ => Ok(self.gate.gas_price().await?),
        }
    }

    fn pause(&self) -> Duration {
        match self.profile {
            PacingProfile::Instant => INSTANT_PAUSE,
            PacingProfile::Paced => PACED_PAUSE,
            PacingProfile::Capped { .. } => CAPPED_PAUSE,
        }
    }

    fn emit(&self, event: UploadEvent) {
        // Best-effort: a slow or absent consumer never stalls the upload.
        let _ = self.events_tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainvid_fees::{FeeError, FeeLimits, FeeSource};
    use chainvid_ledger::{Confirmation, RecordCreated};
    use chainvid_progress::MemoryProgressStore;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Shared call journal for interleaving assertions.
    type Journal = Arc<Mutex<Vec<String>>>;

    struct MockLedger {
        journal: Journal,
        appends: Mutex<Vec<(String, Vec<u8>, u128)>>,
        append_times: Mutex<Vec<tokio::time::Instant>>,
        calls: AtomicUsize,
        fail_create: bool,
        fail_append_at: Option<usize>,
        timeout_append_at: Option<usize>,
    }

    impl MockLedger {
        fn new(journal: Journal) -> Self {
            Self {
                journal,
                appends: Mutex::new(Vec::new()),
                append_times: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail_create: false,
                fail_append_at: None,
                timeout_append_at: None,
            }
        }

        fn appends(&self) -> Vec<(String, Vec<u8>, u128)> {
            self.appends.lock().unwrap().clone()
        }

        fn append_times(&self) -> Vec<tokio::time::Instant> {
            self.append_times.lock().unwrap().clone()
        }
    }

    impl LedgerClient for MockLedger {
        fn create_record(
            &self,
            _meta: &RecordMetadata,
            _max_price_wei: u128,
        ) -> Pin<Box<dyn Future<Output = Result<RecordCreated, LedgerError>> + Send + '_>>
        {
            Box::pin(async move {
                if self.fail_create {
                    return Err(LedgerError::Reverted {
                        tx_hash: "tx-create".into(),
                    });
                }
                self.journal.lock().unwrap().push("create".into());
                Ok(RecordCreated {
                    record_id: "vid-1".into(),
                    confirmation: Confirmation {
                        tx_hash: "tx-create".into(),
                        gas_used: 400_000,
                    },
                })
            })
        }

        fn append_chunk(
            &self,
            record_id: &str,
            chunk: &[u8],
            max_price_wei: u128,
        ) -> Pin<Box<dyn Future<Output = Result<Confirmation, LedgerError>> + Send + '_>>
        {
            let record_id = record_id.to_string();
            let data = chunk.to_vec();
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_append_at == Some(n) {
                    return Err(LedgerError::Reverted {
                        tx_hash: format!("tx-{n}"),
                    });
                }
                if self.timeout_append_at == Some(n) {
                    return Err(LedgerError::ConfirmationTimeout {
                        tx_hash: format!("tx-{n}"),
                        timeout_secs: 600,
                    });
                }
                self.journal
                    .lock()
                    .unwrap()
                    .push(format!("append:{}", data[0]));
                self.append_times
                    .lock()
                    .unwrap()
                    .push(tokio::time::Instant::now());
                self.appends
                    .lock()
                    .unwrap()
                    .push((record_id, data, max_price_wei));
                Ok(Confirmation {
                    tx_hash: format!("tx-{n}"),
                    gas_used: 28_000_000,
                })
            })
        }
    }

    /// Progress store that mirrors saves into the journal.
    struct JournaledStore {
        inner: MemoryProgressStore,
        journal: Journal,
    }

    impl JournaledStore {
        fn new(journal: Journal) -> Self {
            Self {
                inner: MemoryProgressStore::new(),
                journal,
            }
        }

        fn with_record(journal: Journal, record: ProgressRecord) -> Self {
            Self {
                inner: MemoryProgressStore::with_record(record),
                journal,
            }
        }
    }

    impl ProgressStore for JournaledStore {
        fn load(&self) -> Result<Option<ProgressRecord>, chainvid_progress::ProgressError> {
            self.inner.load()
        }

        fn save(&self, record: &ProgressRecord) -> Result<(), chainvid_progress::ProgressError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("save:{:?}", record.last_uploaded_chunk));
            self.inner.save(record)
        }

        fn clear(&self) -> Result<(), chainvid_progress::ProgressError> {
            self.journal.lock().unwrap().push("clear".into());
            self.inner.clear()
        }
    }

    /// Fee source with constant cheap signals and a scriptable base fee.
    struct StaticFees {
        base_script: Mutex<VecDeque<u128>>,
        default_base: u128,
    }

    impl StaticFees {
        fn cheap() -> Self {
            Self {
                base_script: Mutex::new(VecDeque::new()),
                default_base: 1_000_000_000, // 1 gwei
            }
        }

        fn with_base_script(script: Vec<u128>) -> Self {
            Self {
                base_script: Mutex::new(script.into()),
                default_base: 1_000_000_000,
            }
        }
    }

    impl FeeSource for StaticFees {
        fn settlement_fee_gwei(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<f64, FeeError>> + Send + '_>> {
            Box::pin(async { Ok(1.0) })
        }

        fn publication_fee_gwei(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<f64, FeeError>> + Send + '_>> {
            Box::pin(async { Ok(0.1) })
        }

        fn base_fee_wei(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<u128, FeeError>> + Send + '_>> {
            let next = self
                .base_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default_base);
            Box::pin(async move { Ok(next) })
        }
    }

    fn limits() -> FeeLimits {
        FeeLimits {
            settlement_ceiling_gwei: 10.0,
            publication_ceiling_gwei: 1.0,
        }
    }

    fn three_chunks() -> Vec<Chunk> {
        // One byte per chunk; the byte doubles as the index marker.
        chainvid_chunks::segment(&[0u8, 1, 2], 1)
    }

    fn meta() -> RecordMetadata {
        RecordMetadata {
            filename: "v.mp4".into(),
            duration_secs: 0,
            metadata: r#"{"codec":"avc1"}"#.into(),
        }
    }

    fn build(
        ledger: Arc<MockLedger>,
        store: Arc<JournaledStore>,
        fees: Arc<dyn FeeSource>,
        profile: PacingProfile,
    ) -> Uploader {
        Uploader::new(ledger, FeeGate::new(fees, limits()), store, profile)
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_paced_upload_completes_in_order() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let mut up = build(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::new(StaticFees::cheap()),
            PacingProfile::Paced,
        );
        let mut events_rx = up.take_events().unwrap();

        up.run_fresh(&meta(), &three_chunks()).await.unwrap();

        // One create, three appends in chunk-index order, each followed by
        // its checkpoint before the next submission.
        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                "create",
                "save:None",
                "append:0",
                "save:Some(0)",
                "append:1",
                "save:Some(1)",
                "append:2",
                "save:Some(2)",
                "clear",
            ]
        );

        // Paced profile: at least a full minute between confirmations.
        let times = ledger.append_times();
        assert!(times[1] - times[0] >= PACED_PAUSE);
        assert!(times[2] - times[1] >= PACED_PAUSE);

        // Staging is gone.
        assert!(store.load().unwrap().is_none());

        drop(up);
        let mut events = Vec::new();
        while let Some(e) = events_rx.recv().await {
            events.push(e);
        }
        assert!(matches!(events.first(), Some(UploadEvent::RecordCreated { .. })));
        assert!(events.contains(&UploadEvent::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_profile_uses_short_pause() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(
            Arc::clone(&ledger),
            store,
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );

        up.run_fresh(&meta(), &three_chunks()).await.unwrap();

        let times = ledger.append_times();
        assert_eq!(times[1] - times[0], INSTANT_PAUSE);
        assert_eq!(times[2] - times[1], INSTANT_PAUSE);
    }

    #[tokio::test]
    async fn fresh_refuses_existing_record() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::with_record(
            Arc::clone(&journal),
            ProgressRecord::new("v.mp4", 3, "vid-1".into()),
        ));
        let up = build(ledger, store, Arc::new(StaticFees::cheap()), PacingProfile::Instant);

        let err = up.run_fresh(&meta(), &three_chunks()).await.unwrap_err();
        assert!(matches!(err, UploadError::UploadInFlight));
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_failure_is_fatal_and_leaves_no_record() {
        let journal: Journal = Arc::default();
        let mut ledger = MockLedger::new(Arc::clone(&journal));
        ledger.fail_create = true;
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(
            Arc::new(ledger),
            Arc::clone(&store),
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );

        let err = up.run_fresh(&meta(), &three_chunks()).await.unwrap_err();
        assert!(matches!(err, UploadError::RecordCreation(_)));
        assert!(store.load().unwrap().is_none());
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn resume_submits_only_the_tail() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let mut record = ProgressRecord::new("v.mp4", 3, "vid-1".into());
        record.last_uploaded_chunk = Some(0);
        let store = Arc::new(JournaledStore::with_record(
            Arc::clone(&journal),
            record.clone(),
        ));
        let up = build(
            Arc::clone(&ledger),
            store,
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );

        up.resume(record, &three_chunks()).await.unwrap();

        let appends = ledger.appends();
        assert_eq!(appends.len(), 2);
        assert_eq!(appends[0].1, vec![1]);
        assert_eq!(appends[1].1, vec![2]);
        assert!(appends.iter().all(|(id, _, _)| id == "vid-1"));
    }

    #[tokio::test]
    async fn resume_of_complete_record_just_clears() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let mut record = ProgressRecord::new("v.mp4", 3, "vid-1".into());
        record.last_uploaded_chunk = Some(2);
        let store = Arc::new(JournaledStore::with_record(
            Arc::clone(&journal),
            record.clone(),
        ));
        let up = build(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );

        up.resume(record, &three_chunks()).await.unwrap();
        assert!(ledger.appends().is_empty());
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn resume_requires_record_id() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(ledger, store, Arc::new(StaticFees::cheap()), PacingProfile::Instant);

        let record = ProgressRecord {
            filename: "v.mp4".into(),
            total_chunks: 3,
            last_uploaded_chunk: Some(0),
            record_id: None,
        };
        assert!(matches!(
            up.resume(record, &three_chunks()).await.unwrap_err(),
            UploadError::MissingRecordId
        ));
    }

    #[tokio::test]
    async fn resume_rejects_chunk_count_mismatch() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(ledger, store, Arc::new(StaticFees::cheap()), PacingProfile::Instant);

        let record = ProgressRecord::new("v.mp4", 5, "vid-1".into());
        assert!(matches!(
            up.resume(record, &three_chunks()).await.unwrap_err(),
            UploadError::Chunks(ChunkError::CorruptStaging {
                expected: 5,
                found: 3
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_failure_halts_preserving_checkpoint() {
        let journal: Journal = Arc::default();
        let mut ledger = MockLedger::new(Arc::clone(&journal));
        ledger.fail_append_at = Some(1); // second append, chunk index 1
        let ledger = Arc::new(ledger);
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );

        let err = up.run_fresh(&meta(), &three_chunks()).await.unwrap_err();
        assert!(matches!(err, UploadError::Submission { chunk: 1, .. }));
        assert!(err.to_string().contains("chunk 1"));

        // Checkpoint stands at the last confirmed chunk; staging untouched.
        let record = store.load().unwrap().unwrap();
        assert_eq!(record.last_uploaded_chunk, Some(0));
        assert_eq!(ledger.appends().len(), 1);
        assert!(!journal.lock().unwrap().contains(&"clear".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_timeout_is_not_retried() {
        let journal: Journal = Arc::default();
        let mut ledger = MockLedger::new(Arc::clone(&journal));
        ledger.timeout_append_at = Some(0);
        let ledger = Arc::new(ledger);
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );

        let err = up.run_fresh(&meta(), &three_chunks()).await.unwrap_err();
        assert!(matches!(err, UploadError::ConfirmationTimeout { chunk: 0, .. }));
        // No second attempt: the transaction may still land.
        assert!(ledger.appends().is_empty());
        assert_eq!(store.load().unwrap().unwrap().last_uploaded_chunk, None);
    }

    #[tokio::test(start_paused = true)]
    async fn capped_profile_waits_for_price_drop() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let record = ProgressRecord::new("v.mp4", 1, "vid-1".into());
        let store = Arc::new(JournaledStore::with_record(
            Arc::clone(&journal),
            record.clone(),
        ));
        // 3 gwei, 2 gwei, then 1 gwei base fee; cap at 1.1 gwei.
        let fees = Arc::new(StaticFees::with_base_script(vec![
            3_000_000_000,
            2_000_000_000,
            1_000_000_000,
        ]));
        let up = build(
            Arc::clone(&ledger),
            store,
            fees,
            PacingProfile::Capped {
                max_price_gwei: 1.1,
            },
        );

        let start = tokio::time::Instant::now();
        up.resume(record, &chainvid_chunks::segment(&[9u8], 1))
            .await
            .unwrap();

        // Two 60 s price re-checks before the fee dropped under the cap.
        assert_eq!(start.elapsed(), Duration::from_secs(120));
        let appends = ledger.appends();
        assert_eq!(appends.len(), 1);
        // Paid the margined base fee that passed the cap, never more.
        assert_eq!(appends[0].2, 1_040_000_000);
    }

    #[tokio::test]
    async fn cancelled_run_stays_resumable() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::new(Arc::clone(&journal)));
        let up = build(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::new(StaticFees::cheap()),
            PacingProfile::Instant,
        );
        up.cancel_token().cancel();

        let err = up.run_fresh(&meta(), &three_chunks()).await.unwrap_err();
        assert!(matches!(err, UploadError::Cancelled));

        // Record creation already happened and was checkpointed; nothing
        // was submitted, so a resume starts at chunk 0.
        assert!(ledger.appends().is_empty());
        let record = store.load().unwrap().unwrap();
        assert_eq!(record.next_chunk(), 0);
        assert_eq!(record.record_id.as_deref(), Some("vid-1"));
    }

    #[tokio::test]
    async fn take_events_once() {
        let journal: Journal = Arc::default();
        let ledger = Arc::new(MockLedger::new(Arc::clone(&journal)));
        let store = Arc::new(JournaledStore::new(journal));
        let mut up = build(ledger, store, Arc::new(StaticFees::cheap()), PacingProfile::Instant);
        assert!(up.take_events().is_some());
        assert!(up.take_events().is_none());
    }
}

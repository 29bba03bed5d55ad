/*!
Test Harness pour le pipeline aisdecode

Facilite l'écriture de tests de bout en bout avec:
- Un moteur complet (store, fenêtres, registre, cycle) sans réseau
- Un fichier d'état dans un répertoire temporaire
- Une horloge pilotée : dédup et fraîcheur deviennent déterministes
- Un redémarrage qui recharge le fichier d'état comme au boot
*/

use aisdecode_kernel::codec::ais::AisCodec;
use aisdecode_kernel::codec::SentenceCodec;
use aisdecode_kernel::cycle::{CycleController, CycleOutcome};
use aisdecode_kernel::engine::{Engine, EngineError, EngineOptions, IngestOutcome};
use aisdecode_kernel::models::Snapshot;
use aisdecode_kernel::persistence::StateFile;
use aisdecode_kernel::relay::AggregatorRelay;
use anyhow::Result;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use time::OffsetDateTime;

use crate::push_stub::RecordingSubscriber;

pub const TEST_SOURCE: &str = "harness";

/// Harness de test complet pour le kernel
pub struct TestHarness {
    pub engine: Engine,
    pub cycle: CycleController,
    options: EngineOptions,
    codec: AisCodec,
    state_file: StateFile,
    // gardé vivant pour la durée du test
    _dir: TempDir,
    instant: Instant,
    wall: OffsetDateTime,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_options(EngineOptions::default()).await
    }

    pub async fn with_options(options: EngineOptions) -> Result<Self> {
        init_logging();
        let dir = tempfile::tempdir()?;
        let state_file = StateFile::new(dir.path().join("state.json"));
        Ok(Self::boot(options, state_file, dir, Snapshot::new()))
    }

    fn boot(options: EngineOptions, state_file: StateFile, dir: TempDir, initial: Snapshot) -> Self {
        let engine = Engine::new(
            options.clone(),
            AggregatorRelay::disabled(),
            Some(state_file.clone()),
            initial,
        );
        Self {
            cycle: CycleController::new(engine.clone()),
            engine,
            options,
            codec: AisCodec::new(),
            state_file,
            _dir: dir,
            instant: Instant::now(),
            wall: OffsetDateTime::now_utc(),
        }
    }

    /// Simule un arrêt / redémarrage : nouveau moteur chargé depuis le fichier d'état.
    pub async fn restart(self) -> Self {
        let initial = self.state_file.load_or_empty().await;
        let wall = self.wall;
        let mut next = Self::boot(self.options, self.state_file, self._dir, initial);
        next.wall = wall;
        next
    }

    pub fn now(&self) -> OffsetDateTime {
        self.wall
    }

    /// Avance les deux horloges (dédup et fraîcheur).
    pub fn advance(&mut self, by: Duration) {
        self.instant += by;
        self.wall += by;
    }

    /// Passe une phrase au moteur avec le codec AIS du harness.
    pub async fn feed(&mut self, raw: &str) -> Result<IngestOutcome, EngineError> {
        self.engine
            .ingest_at(&mut self.codec, raw, TEST_SOURCE, self.instant, self.wall)
            .await
    }

    /// Même chose avec un codec fourni par le test.
    pub async fn feed_with(
        &self,
        codec: &mut dyn SentenceCodec,
        raw: &str,
    ) -> Result<IngestOutcome, EngineError> {
        self.engine
            .ingest_at(codec, raw, TEST_SOURCE, self.instant, self.wall)
            .await
    }

    pub async fn feed_all<S: AsRef<str>>(&mut self, sentences: &[S]) -> Vec<Result<IngestOutcome, EngineError>> {
        let mut outcomes = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            outcomes.push(self.feed(sentence.as_ref()).await);
        }
        outcomes
    }

    pub async fn tick(&self) -> CycleOutcome {
        self.cycle.tick_at(self.wall).await
    }

    pub fn subscriber(&self) -> RecordingSubscriber {
        RecordingSubscriber::connect(&self.engine)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    /// Contenu actuel du fichier d'état (`None` s'il n'a jamais été écrit).
    pub async fn persisted(&self) -> Result<Option<Snapshot>> {
        Ok(self.state_file.read().await?)
    }

    pub fn state_file(&self) -> &StateFile {
        &self.state_file
    }
}

/// Logs visibles avec `cargo test -- --nocapture` et `RUST_LOG=debug`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

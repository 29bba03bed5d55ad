/**
 * MOTEUR D'INGESTION - Chemin d'une phrase, de l'adaptateur au store
 *
 * RÔLE :
 * Relie les composants dans l'ordre du flux de données. Chaque adaptateur
 * (UDP, série) appelle `ingest` avec son propre codec ; le moteur, lui, est
 * partagé (clone bon marché, tout l'état est derrière des `Shared`).
 *
 * FONCTIONNEMENT :
 * 1. Ligne sans marqueur `!`/`$` : ignorée avant toute fenêtre
 * 2. Fenêtre relais : si acceptée, envoi brut aux agrégateurs (avant décodage)
 * 3. Fenêtre locale : doublon -> arrêt ; sinon enregistrée, même si le décodage échoue
 * 4. Décodage -> identifiant navire -> merge -> détection de changement
 * 5. Push immédiat `ais_data` sur le canal du navire
 */

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, error, info};

use crate::change::PublishState;
use crate::codec::{CodecError, DecodedPacket, SentenceCodec};
use crate::dedupe::DedupeWindow;
use crate::health::{HealthTracker, KernelHealth};
use crate::models::{FieldSet, Snapshot, VesselRecord, USER_ID};
use crate::persistence::StateFile;
use crate::relay::AggregatorRelay;
use crate::store::FusionStore;
use crate::subscribers::{vessel_channel, Push, SubscriberRegistry, Subscription};

pub const DEFAULT_DEDUPE_WINDOW: Duration = Duration::from_millis(1000);
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no usable UserID in decoded packet (fields: {available})")]
    MissingUserId { available: String },
    #[error("decode failed: {0}")]
    Codec(#[from] CodecError),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ce qu'est devenue une ligne passée à [`Engine::ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Pas une phrase (marqueur absent)
    Ignored,
    /// Déjà vue dans la fenêtre locale
    Duplicate,
    /// Fragment accepté, message pas encore complet
    Pending,
    Merged { vessel_id: String, changed: bool },
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub dedupe_window: Duration,
    pub expire_after: Duration,
    pub queue_depth: usize,
    pub show_decodes: bool,
    pub dump_vessel_data: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dedupe_window: DEFAULT_DEDUPE_WINDOW,
            expire_after: DEFAULT_EXPIRE_AFTER,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            show_decodes: false,
            dump_vessel_data: false,
        }
    }
}

/// Événement poussé sur `ais_data/<id>` pour chaque message décodé.
#[derive(Debug, Serialize)]
pub struct VesselEvent<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: &'a FieldSet,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct Engine {
    options: EngineOptions,
    store: FusionStore,
    local_window: DedupeWindow,
    relay_window: DedupeWindow,
    publish: PublishState,
    subscribers: SubscriberRegistry,
    relay: AggregatorRelay,
    state_file: Option<StateFile>,
    health: HealthTracker,
}

impl Engine {
    /// `initial` : snapshot chargé au démarrage ; il devient aussi la baseline publiée.
    pub fn new(
        options: EngineOptions,
        relay: AggregatorRelay,
        state_file: Option<StateFile>,
        initial: Snapshot,
    ) -> Self {
        let subscribers = SubscriberRegistry::new(options.queue_depth);
        Self {
            store: FusionStore::from_snapshot(initial.clone()),
            local_window: DedupeWindow::new("local", options.dedupe_window),
            relay_window: DedupeWindow::new("relay", options.dedupe_window),
            publish: PublishState::new(initial),
            subscribers,
            relay,
            state_file,
            health: HealthTracker::new(),
            options,
        }
    }

    pub async fn ingest(
        &self,
        codec: &mut dyn SentenceCodec,
        raw: &str,
        source: &str,
    ) -> Result<IngestOutcome, EngineError> {
        self.ingest_at(codec, raw, source, Instant::now(), OffsetDateTime::now_utc())
            .await
    }

    /// `now` pilote les fenêtres de dédup, `wall` horodate le merge et l'événement.
    pub async fn ingest_at(
        &self,
        codec: &mut dyn SentenceCodec,
        raw: &str,
        source: &str,
        now: Instant,
        wall: OffsetDateTime,
    ) -> Result<IngestOutcome, EngineError> {
        let line = raw.trim();
        if !(line.starts_with('!') || line.starts_with('$')) {
            return Ok(IngestOutcome::Ignored);
        }
        self.health.record_received();
        debug!(source, "received {line}");

        if !self.relay.is_empty() && self.relay_window.admit(line, now) {
            self.relay.forward(raw).await;
        }

        if !self.local_window.admit(line, now) {
            self.health.record_duplicate();
            debug!(source, "duplicate dropped: {line}");
            return Ok(IngestOutcome::Duplicate);
        }

        let packet = match codec.decode(line) {
            Ok(Some(packet)) => packet,
            Ok(None) => return Ok(IngestOutcome::Pending),
            Err(e) => {
                self.health.record_decode_error();
                return Err(e.into());
            }
        };

        self.apply_packet(packet, wall)
    }

    fn apply_packet(
        &self,
        packet: DecodedPacket,
        wall: OffsetDateTime,
    ) -> Result<IngestOutcome, EngineError> {
        let vessel_id = vessel_id(&packet.fields)?;

        let merged = self.store.merge_at(&vessel_id, &packet.fields, wall);
        self.health.record_merge();
        let view = merged.is_complete().then_some(&merged);
        let changed = self.publish.observe_merge(&vessel_id, view);

        let event = VesselEvent {
            kind: packet.kind.name(),
            data: &packet.fields,
            timestamp: wall.format(&Rfc3339).unwrap_or_default(),
        };
        let json = serde_json::to_string(&event)?;
        if self.options.show_decodes {
            info!(vessel = %vessel_id, "{json}");
        }
        self.subscribers
            .emit_to(&vessel_channel(&vessel_id), Push::ais_data(json));

        Ok(IngestOutcome::Merged { vessel_id, changed })
    }

    /// Nouvelle session : rejoint `latest_vessel_data` et reçoit tout de suite le snapshot courant.
    ///
    /// La session est enregistrée avant le calcul du snapshot : une publication concurrente
    /// lui parvient aussi, le hello n'est jamais plus ancien qu'elle.
    pub fn connect_subscriber(&self) -> Subscription {
        let subscription = self.subscribers.connect(None);
        match self.store.filter_complete().to_json() {
            Ok(json) => {
                self.subscribers
                    .send_to(subscription.id, Push::latest_vessel_data(json));
            }
            Err(e) => error!("error encoding hello snapshot: {e}"),
        }
        subscription
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.filter_complete()
    }

    /// Record brut, sans filtre de complétude.
    pub fn vessel(&self, vessel_id: &str) -> Option<VesselRecord> {
        self.store.get(vessel_id)
    }

    pub fn health_report(&self) -> KernelHealth {
        self.health.get_health(&self.store, &self.subscribers)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn store(&self) -> &FusionStore {
        &self.store
    }

    pub fn publish_state(&self) -> &PublishState {
        &self.publish
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn state_file(&self) -> Option<&StateFile> {
        self.state_file.as_ref()
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }
}

/// Identifiant navire : `UserID` entier (ou flottant, rendu sans décimales).
pub fn vessel_id(fields: &FieldSet) -> Result<String, EngineError> {
    let id = match fields.get(USER_ID) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| v.to_string())
            .or_else(|| n.as_i64().map(|v| v.to_string()))
            .or_else(|| n.as_f64().map(|v| format!("{v:.0}"))),
        _ => None,
    };
    id.ok_or_else(|| EngineError::MissingUserId {
        available: fields.keys().cloned().collect::<Vec<_>>().join(", "),
    })
}

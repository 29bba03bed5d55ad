/**
 * CYCLE PÉRIODIQUE - Expiration, publication et sauvegarde
 *
 * RÔLE : Seul point qui ordonne les snapshots publiés. À chaque tick :
 * 1. expire les navires trop vieux (et passe Dirty si l'un était publié)
 * 2. si Dirty : repasse Idle, filtre, encode, diffuse sur `latest_vessel_data`, sauvegarde
 * 3. sinon ne fait rien
 *
 * Un échec d'encodage laisse l'état Dirty pour retenter au tick suivant.
 */

use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::engine::Engine;
use crate::subscribers::Push;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Idle {
        expired: Vec<String>,
    },
    Published {
        vessels: usize,
        delivered: usize,
        expired: Vec<String>,
    },
}

#[derive(Clone)]
pub struct CycleController {
    engine: Engine,
}

impl CycleController {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub async fn tick(&self) -> CycleOutcome {
        self.tick_at(OffsetDateTime::now_utc()).await
    }

    pub async fn tick_at(&self, now: OffsetDateTime) -> CycleOutcome {
        let engine = &self.engine;
        let publish = engine.publish_state();

        let expired = engine.store().expire(now, engine.options().expire_after);
        if !expired.is_empty() {
            info!("expired {} vessels: {}", expired.len(), expired.join(", "));
            publish.observe_expired(&expired);
        }

        if !publish.begin_publish() {
            debug!("no vessel change, skipping publish");
            return CycleOutcome::Idle { expired };
        }
        let snapshot = engine.store().filter_complete();
        publish.finish_publish(&snapshot);

        let json = match snapshot.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("error encoding vessel snapshot: {e}");
                publish.mark_dirty();
                return CycleOutcome::Idle { expired };
            }
        };

        let delivered = engine
            .subscribers()
            .broadcast_snapshot(Push::latest_vessel_data(json.as_str()));
        engine.health().record_publish();
        info!(
            "published {} vessels to {delivered} subscribers",
            snapshot.len()
        );

        if engine.options().dump_vessel_data {
            match serde_json::to_string_pretty(&snapshot) {
                Ok(pretty) => info!("vessel data:\n{pretty}"),
                Err(e) => error!("error dumping vessel data: {e}"),
            }
        }

        if let Some(state_file) = engine.state_file() {
            state_file.save(&json).await;
        }

        CycleOutcome::Published {
            vessels: snapshot.len(),
            delivered,
            expired,
        }
    }

    /// Lance la boucle ; le premier tick a lieu après `interval`, pas au démarrage.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}

/*!
Abonné enregistreur pour tests sans WebSocket

Tient une session du registre comme le ferait une connexion réelle et garde
tous les pushs reçus pour les assertions.
*/

use aisdecode_kernel::engine::Engine;
use aisdecode_kernel::models::Snapshot;
use aisdecode_kernel::subscribers::{
    vessel_channel, Push, SessionId, Subscription, AIS_DATA_EVENT, LATEST_VESSEL_DATA,
};
use anyhow::Result;
use serde_json::Value;

pub struct RecordingSubscriber {
    engine: Engine,
    subscription: Subscription,
    received: Vec<Push>,
}

impl RecordingSubscriber {
    /// Se connecte comme une nouvelle session (le snapshot "hello" est déjà en file).
    pub fn connect(engine: &Engine) -> Self {
        Self {
            engine: engine.clone(),
            subscription: engine.connect_subscriber(),
            received: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.subscription.id
    }

    pub fn follow_vessel(&self, vessel_id: &str) -> Result<()> {
        self.engine
            .subscribers()
            .subscribe(self.id(), &vessel_channel(vessel_id))?;
        Ok(())
    }

    pub fn unfollow_vessel(&self, vessel_id: &str) -> Result<()> {
        self.engine
            .subscribers()
            .unsubscribe(self.id(), &vessel_channel(vessel_id))?;
        Ok(())
    }

    /// Envoie une trame brute comme le ferait le client.
    pub fn send_frame(&self, frame: &str) -> Result<()> {
        self.engine.subscribers().apply_request(self.id(), frame)?;
        Ok(())
    }

    /// Vide la file de la session et renvoie les pushs nouvellement reçus.
    pub fn drain(&mut self) -> Vec<Push> {
        let mut fresh = Vec::new();
        while let Ok(push) = self.subscription.rx.try_recv() {
            fresh.push(push);
        }
        self.received.extend(fresh.iter().cloned());
        fresh
    }

    pub fn received(&self) -> &[Push] {
        &self.received
    }

    /// Snapshots `latest_vessel_data` reçus, dans l'ordre.
    pub fn snapshots(&mut self) -> Result<Vec<Snapshot>> {
        self.drain();
        self.received
            .iter()
            .filter(|push| push.event() == LATEST_VESSEL_DATA)
            .map(|push| Ok(serde_json::from_str(push.data())?))
            .collect()
    }

    /// Événements `ais_data` reçus (`{type, data, timestamp}`).
    pub fn vessel_events(&mut self) -> Result<Vec<Value>> {
        self.drain();
        self.received
            .iter()
            .filter(|push| push.event() == AIS_DATA_EVENT)
            .map(|push| Ok(serde_json::from_str(push.data())?))
            .collect()
    }

    pub fn last_snapshot(&mut self) -> Result<Option<Snapshot>> {
        Ok(self.snapshots()?.pop())
    }

    pub fn clear(&mut self) {
        self.drain();
        self.received.clear();
    }

    pub fn disconnect(self) {
        self.engine.subscribers().disconnect(self.id());
    }
}

/**
 * REGISTRE DES ABONNÉS - Sessions push, canaux ("rooms") et diffusion
 *
 * RÔLE :
 * Maintient les sessions connectées et les canaux qu'elles ont rejoints.
 * Le canal par défaut `latest_vessel_data` reçoit les snapshots périodiques ;
 * chaque navire a son canal `ais_data/<id>` pour les messages décodés en direct.
 *
 * FONCTIONNEMENT :
 * - connect : nouvelle session, rejoint le canal par défaut, reçoit tout de suite le snapshot "hello"
 * - subscribe / unsubscribe : à l'initiative de la session uniquement
 * - emit_to : dépose le push dans la file bornée de chaque membre (jamais bloquant)
 * - File pleine = push perdu pour cette session ; file fermée = session partie, on arrête
 * - disconnect : retire la session, ses canaux disparaissent avec elle
 */

use crate::state::{new_state, Shared};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const LATEST_VESSEL_DATA: &str = "latest_vessel_data";
pub const AIS_DATA_EVENT: &str = "ais_data";
pub const VESSEL_CHANNEL_PREFIX: &str = "ais_data/";

/// Canal des pushs immédiats d'un navire.
pub fn vessel_channel(vessel_id: &str) -> String {
    format!("{VESSEL_CHANNEL_PREFIX}{vessel_id}")
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Message poussé vers une session : nom d'événement + charge utile JSON déjà encodée.
/// La charge est partagée entre toutes les sessions d'une même diffusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Push {
    event: &'static str,
    data: Arc<str>,
}

impl Push {
    pub fn latest_vessel_data(json: impl Into<Arc<str>>) -> Self {
        Self {
            event: LATEST_VESSEL_DATA,
            data: json.into(),
        }
    }

    pub fn ais_data(json: impl Into<Arc<str>>) -> Self {
        Self {
            event: AIS_DATA_EVENT,
            data: json.into(),
        }
    }

    pub fn event(&self) -> &'static str {
        self.event
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Trame texte envoyée sur le WebSocket : `{"event": ..., "data": "<json>"}`.
    pub fn to_frame(&self) -> String {
        serde_json::json!({ "event": self.event, "data": &*self.data }).to_string()
    }
}

/// Requêtes émises par une session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientRequest {
    Subscribe(String),
    Unsubscribe(String),
}

/// Côté session d'une connexion : identifiant + file des pushs à écrire.
pub struct Subscription {
    pub id: SessionId,
    pub rx: mpsc::Receiver<Push>,
}

struct Session {
    channels: HashSet<String>,
    tx: mpsc::Sender<Push>,
}

#[derive(Clone)]
pub struct SubscriberRegistry {
    sessions: Shared<HashMap<SessionId, Session>>,
    queue_depth: usize,
}

impl SubscriberRegistry {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            sessions: new_state(HashMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Ouvre une session abonnée au canal par défaut ; `hello` est déposé avant tout autre push.
    pub fn connect(&self, hello: Option<Push>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let id = SessionId::new();
        if let Some(push) = hello {
            // file neuve et vide : ne peut pas être pleine
            let _ = tx.try_send(push);
        }
        let mut channels = HashSet::new();
        channels.insert(LATEST_VESSEL_DATA.to_string());
        self.sessions.lock().insert(id, Session { channels, tx });
        info!(session = %id, "subscriber joined {LATEST_VESSEL_DATA}");
        Subscription { id, rx }
    }

    pub fn disconnect(&self, id: SessionId) -> bool {
        let removed = self.sessions.lock().remove(&id).is_some();
        if removed {
            info!(session = %id, "subscriber disconnected");
        }
        removed
    }

    pub fn subscribe(&self, id: SessionId, channel: &str) -> Result<(), SubscriberError> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(SubscriberError::UnknownSession(id))?;
        session.channels.insert(channel.to_string());
        info!(session = %id, channel, "subscribed");
        Ok(())
    }

    pub fn unsubscribe(&self, id: SessionId, channel: &str) -> Result<(), SubscriberError> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(SubscriberError::UnknownSession(id))?;
        session.channels.remove(channel);
        info!(session = %id, channel, "unsubscribed");
        Ok(())
    }

    /// Décode et applique une trame texte reçue d'une session.
    pub fn apply_request(&self, id: SessionId, frame: &str) -> Result<ClientRequest, SubscriberError> {
        let request: ClientRequest = serde_json::from_str(frame)?;
        match &request {
            ClientRequest::Subscribe(channel) => self.subscribe(id, channel)?,
            ClientRequest::Unsubscribe(channel) => self.unsubscribe(id, channel)?,
        }
        Ok(request)
    }

    /// Dépose `push` chez chaque membre de `channel`. Retourne le nombre de sessions servies.
    pub fn emit_to(&self, channel: &str, push: Push) -> usize {
        let mut delivered = 0;
        let mut gone = Vec::new();
        {
            let sessions = self.sessions.lock();
            for (id, session) in sessions.iter().filter(|(_, s)| s.channels.contains(channel)) {
                match session.tx.try_send(push.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(session = %id, channel, "push queue full, dropping {}", push.event);
                    }
                    Err(TrySendError::Closed(_)) => gone.push(*id),
                }
            }
        }
        if !gone.is_empty() {
            let mut sessions = self.sessions.lock();
            for id in gone {
                sessions.remove(&id);
                debug!(session = %id, "removed closed session");
            }
        }
        delivered
    }

    /// Dépose `push` chez une seule session, quels que soient ses canaux.
    pub fn send_to(&self, id: SessionId, push: Push) -> bool {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get(&id) else {
            return false;
        };
        match session.tx.try_send(push) {
            Ok(()) => true,
            Err(TrySendError::Full(push)) => {
                warn!(session = %id, "push queue full, dropping {}", push.event);
                false
            }
            Err(TrySendError::Closed(_)) => {
                sessions.remove(&id);
                debug!(session = %id, "removed closed session");
                false
            }
        }
    }

    /// Snapshot périodique : membres du canal par défaut uniquement.
    pub fn broadcast_snapshot(&self, push: Push) -> usize {
        self.emit_to(LATEST_VESSEL_DATA, push)
    }

    pub fn channels_of(&self, id: SessionId) -> Option<Vec<String>> {
        let sessions = self.sessions.lock();
        let mut channels: Vec<String> = sessions.get(&id)?.channels.iter().cloned().collect();
        channels.sort();
        Some(channels)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_joins_default_channel_and_receives_hello() {
        let registry = SubscriberRegistry::new(8);
        let mut sub = registry.connect(Some(Push::latest_vessel_data("{}")));
        assert_eq!(registry.channels_of(sub.id), Some(vec![LATEST_VESSEL_DATA.to_string()]));
        let hello = sub.rx.try_recv().unwrap();
        assert_eq!(hello.event(), LATEST_VESSEL_DATA);
        assert_eq!(hello.data(), "{}");
    }

    #[test]
    fn test_send_to_targets_one_session() {
        let registry = SubscriberRegistry::new(1);
        let mut target = registry.connect(None);
        let mut other = registry.connect(None);

        assert!(registry.send_to(target.id, Push::latest_vessel_data("{}")));
        assert_eq!(target.rx.try_recv().unwrap().data(), "{}");
        assert!(other.rx.try_recv().is_err());

        assert!(registry.send_to(target.id, Push::latest_vessel_data("1")));
        assert!(!registry.send_to(target.id, Push::latest_vessel_data("2")));

        drop(other.rx);
        assert!(!registry.send_to(other.id, Push::latest_vessel_data("{}")));
        assert_eq!(registry.len(), 1);
        assert!(!registry.send_to(other.id, Push::latest_vessel_data("{}")));
    }

    #[test]
    fn test_vessel_push_reaches_only_channel_members() {
        let registry = SubscriberRegistry::new(8);
        let mut watcher = registry.connect(None);
        let mut other = registry.connect(None);
        registry.subscribe(watcher.id, &vessel_channel("123")).unwrap();

        let delivered = registry.emit_to(&vessel_channel("123"), Push::ais_data(r#"{"type":"PositionReport"}"#));
        assert_eq!(delivered, 1);
        assert_eq!(watcher.rx.try_recv().unwrap().event(), AIS_DATA_EVENT);
        assert!(other.rx.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_broadcast_skips_sessions_that_left_default_channel() {
        let registry = SubscriberRegistry::new(8);
        let mut a = registry.connect(None);
        let mut b = registry.connect(None);
        registry.unsubscribe(b.id, LATEST_VESSEL_DATA).unwrap();

        assert_eq!(registry.broadcast_snapshot(Push::latest_vessel_data("{}")), 1);
        assert!(a.rx.try_recv().is_ok());
        assert!(b.rx.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_drops_push_without_blocking() {
        let registry = SubscriberRegistry::new(1);
        let mut slow = registry.connect(None);
        assert_eq!(registry.broadcast_snapshot(Push::latest_vessel_data("1")), 1);
        assert_eq!(registry.broadcast_snapshot(Push::latest_vessel_data("2")), 0);
        assert_eq!(slow.rx.try_recv().unwrap().data(), "1");
        assert!(slow.rx.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_closed_session_is_pruned_on_dispatch() {
        let registry = SubscriberRegistry::new(4);
        let sub = registry.connect(None);
        drop(sub.rx);
        assert_eq!(registry.broadcast_snapshot(Push::latest_vessel_data("{}")), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_request_parses_subscribe_and_unsubscribe() {
        let registry = SubscriberRegistry::new(4);
        let sub = registry.connect(None);
        let req = registry
            .apply_request(sub.id, r#"{"event":"subscribe","data":"ais_data/42"}"#)
            .unwrap();
        assert_eq!(req, ClientRequest::Subscribe("ais_data/42".into()));
        assert!(registry.channels_of(sub.id).unwrap().contains(&"ais_data/42".to_string()));

        registry
            .apply_request(sub.id, r#"{"event":"unsubscribe","data":"ais_data/42"}"#)
            .unwrap();
        assert!(!registry.channels_of(sub.id).unwrap().contains(&"ais_data/42".to_string()));
    }

    #[test]
    fn test_malformed_requests_are_rejected_not_fatal() {
        let registry = SubscriberRegistry::new(4);
        let sub = registry.connect(None);
        assert!(registry.apply_request(sub.id, "not json").is_err());
        assert!(registry.apply_request(sub.id, r#"{"event":"subscribe","data":42}"#).is_err());
        assert!(registry.apply_request(sub.id, r#"{"event":"teleport","data":"x"}"#).is_err());
        assert_eq!(registry.channels_of(sub.id).unwrap().len(), 1);
    }

    #[test]
    fn test_disconnect_forgets_memberships() {
        let registry = SubscriberRegistry::new(4);
        let sub = registry.connect(None);
        registry.subscribe(sub.id, "ais_data/1").unwrap();
        assert!(registry.disconnect(sub.id));
        assert!(!registry.disconnect(sub.id));
        assert_eq!(registry.emit_to("ais_data/1", Push::ais_data("{}")), 0);
        assert!(matches!(
            registry.subscribe(sub.id, "ais_data/1"),
            Err(SubscriberError::UnknownSession(_))
        ));
    }

    #[test]
    fn test_frame_wraps_payload_as_string() {
        let frame = Push::latest_vessel_data(r#"{"1":{}}"#).to_frame();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["event"], "latest_vessel_data");
        assert_eq!(parsed["data"], r#"{"1":{}}"#);
    }
}

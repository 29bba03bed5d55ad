/**
 * FUSION STORE - État fusionné et autoritaire de chaque navire
 *
 * RÔLE :
 * Table identifiant navire -> VesselRecord, seule source de vérité du process.
 * Toute lecture externe reçoit une copie (record brut ou snapshot filtré), jamais la table.
 *
 * FONCTIONNEMENT :
 * - merge : last-write-wins par champ, puis LastUpdated = now et NumMessages += 1
 * - expire : supprime les navires trop vieux ou dont LastUpdated est absent/illisible
 * - filter_complete : vue externe (navires ayant Latitude, Longitude et CallSign)
 * - replace : remplacement en bloc au chargement du fichier d'état
 */

use crate::models::{FieldSet, Snapshot, VesselRecord};
use crate::state::{new_state, Shared};
use std::collections::HashMap;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct FusionStore {
    records: Shared<HashMap<String, VesselRecord>>,
}

impl FusionStore {
    pub fn new() -> Self {
        Self {
            records: new_state(HashMap::new()),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        store.replace(snapshot);
        store
    }

    pub fn merge(&self, vessel_id: &str, incoming: &FieldSet) -> VesselRecord {
        self.merge_at(vessel_id, incoming, OffsetDateTime::now_utc())
    }

    /// Fusionne `incoming` dans le navire `vessel_id` (créé au besoin) et renvoie une copie du résultat.
    pub fn merge_at(&self, vessel_id: &str, incoming: &FieldSet, now: OffsetDateTime) -> VesselRecord {
        let mut records = self.records.lock();
        let record = records.entry(vessel_id.to_string()).or_default();
        record.apply(incoming);
        record.stamp(now);
        record.clone()
    }

    /// Supprime les navires dont `now - LastUpdated > max_age`, ou dont LastUpdated est illisible.
    /// Renvoie les identifiants supprimés.
    pub fn expire(&self, now: OffsetDateTime, max_age: Duration) -> Vec<String> {
        let max_age = time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX);
        let mut removed = Vec::new();
        self.records.lock().retain(|vessel_id, record| {
            let fresh = match record.last_updated() {
                Some(last) => now - last <= max_age,
                None => false,
            };
            if !fresh {
                removed.push(vessel_id.clone());
            }
            fresh
        });
        removed.sort();
        removed
    }

    pub fn filter_complete(&self) -> Snapshot {
        filter_complete(&self.records.lock())
    }

    /// Record brut, complet ou non (chemin de diagnostic).
    pub fn get(&self, vessel_id: &str) -> Option<VesselRecord> {
        self.records.lock().get(vessel_id).cloned()
    }

    pub fn replace(&self, snapshot: Snapshot) {
        *self.records.lock() = snapshot.into_inner().into_iter().collect();
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FusionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Ne garde que les navires complets (Latitude, Longitude, CallSign non nuls).
pub fn filter_complete(records: &HashMap<String, VesselRecord>) -> Snapshot {
    records
        .iter()
        .filter(|(_, record)| record.is_complete())
        .map(|(id, record)| (id.clone(), record.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn fields(value: Value) -> FieldSet {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_is_last_write_wins_per_field() {
        let store = FusionStore::new();
        store.merge("1", &fields(json!({"A": 1})));
        let record = store.merge("1", &fields(json!({"A": 2, "B": 3})));
        assert_eq!(record.get("A"), Some(&json!(2)));
        assert_eq!(record.get("B"), Some(&json!(3)));
    }

    #[test]
    fn test_merge_overwrites_with_zero_and_empty_values() {
        let store = FusionStore::new();
        store.merge("1", &fields(json!({"Sog": 12.5, "Name": "NORDIC"})));
        let record = store.merge("1", &fields(json!({"Sog": 0, "Name": ""})));
        assert_eq!(record.get("Sog"), Some(&json!(0)));
        assert_eq!(record.get("Name"), Some(&json!("")));
    }

    #[test]
    fn test_num_messages_counts_every_merge() {
        let store = FusionStore::new();
        let first = store.merge("9", &fields(json!({"A": 1})));
        assert_eq!(first.num_messages(), Some(1));
        for expected in 2..=5 {
            let record = store.merge("9", &fields(json!({"A": expected})));
            assert_eq!(record.num_messages(), Some(expected));
        }
    }

    #[test]
    fn test_merge_stamps_last_updated() {
        let store = FusionStore::new();
        let now = OffsetDateTime::now_utc();
        let record = store.merge_at("1", &fields(json!({"A": 1})), now);
        assert_eq!(record.last_updated(), Some(now));
    }

    #[test]
    fn test_incoming_engine_fields_are_restamped() {
        let store = FusionStore::new();
        store.merge("1", &fields(json!({"A": 1})));
        let record = store.merge("1", &fields(json!({"NumMessages": 40, "LastUpdated": "garbage"})));
        assert_eq!(record.num_messages(), Some(41));
        assert!(record.last_updated().is_some());
    }

    #[test]
    fn test_expire_removes_stale_and_malformed_records() {
        let store = FusionStore::new();
        let now = OffsetDateTime::now_utc();
        let max_age = Duration::from_secs(3600);

        store.merge_at("fresh", &fields(json!({"A": 1})), now - time::Duration::minutes(5));
        store.merge_at("stale", &fields(json!({"A": 1})), now - time::Duration::minutes(61));
        store.replace(
            [
                ("fresh".to_string(), store.get("fresh").unwrap()),
                ("stale".to_string(), store.get("stale").unwrap()),
                (
                    "corrupt".to_string(),
                    VesselRecord::from_fields(fields(json!({"LastUpdated": "yesterday"}))),
                ),
                (
                    "unstamped".to_string(),
                    VesselRecord::from_fields(fields(json!({"NumMessages": 3}))),
                ),
            ]
            .into_iter()
            .collect(),
        );

        let removed = store.expire(now, max_age);
        assert_eq!(removed, vec!["corrupt", "stale", "unstamped"]);
        assert_eq!(store.len(), 1);
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_filter_only_exposes_complete_vessels() {
        let store = FusionStore::new();
        store.merge("1", &fields(json!({"Latitude": 10.0, "Longitude": 20.0})));
        assert!(store.filter_complete().is_empty());

        store.merge("1", &fields(json!({"CallSign": "ABC"})));
        let snapshot = store.filter_complete();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("1").and_then(|r| r.get("CallSign")), Some(&json!("ABC")));
    }

    #[test]
    fn test_get_bypasses_completeness_filter() {
        let store = FusionStore::new();
        store.merge("7", &fields(json!({"Latitude": 1.0})));
        assert!(store.filter_complete().is_empty());
        assert!(store.get("7").is_some());
        assert!(store.get("8").is_none());
    }

    #[test]
    fn test_returned_records_are_copies() {
        let store = FusionStore::new();
        let mut copy = store.merge("1", &fields(json!({"A": 1})));
        copy.apply(&fields(json!({"A": 99})));
        assert_eq!(store.get("1").unwrap().get("A"), Some(&json!(1)));
    }
}

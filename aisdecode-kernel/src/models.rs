//! Modèle de données : enregistrement fusionné d'un navire et snapshot filtré.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Ensemble de champs ouvert (schéma inconnu, grandit avec les types de messages).
pub type FieldSet = Map<String, Value>;

pub const USER_ID: &str = "UserID";
pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const CALL_SIGN: &str = "CallSign";
pub const LAST_UPDATED: &str = "LastUpdated";
pub const NUM_MESSAGES: &str = "NumMessages";

/// Champs exigés pour qu'un navire soit visible de l'extérieur.
pub const COMPLETENESS_FIELDS: [&str; 3] = [LATITUDE, LONGITUDE, CALL_SIGN];

/// État fusionné d'un navire.
///
/// Les champs `LastUpdated` et `NumMessages` sont gérés par le store ; tout le reste
/// vient tel quel des paquets décodés.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselRecord {
    fields: FieldSet,
}

impl VesselRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: FieldSet) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Vrai si le champ existe et n'est pas `null`.
    pub fn has_value(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(v) if !v.is_null())
    }

    pub fn is_complete(&self) -> bool {
        COMPLETENESS_FIELDS.iter().all(|key| self.has_value(key))
    }

    /// Compteur de messages ; un fichier d'état ancien peut contenir un flottant.
    pub fn num_messages(&self) -> Option<u64> {
        let value = self.fields.get(NUM_MESSAGES)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    }

    /// `None` si le champ manque ou n'est pas un horodatage RFC 3339 valide.
    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        let raw = self.fields.get(LAST_UPDATED)?.as_str()?;
        OffsetDateTime::parse(raw, &Rfc3339).ok()
    }

    /// Écrase chaque champ présent dans `incoming`, y compris par une valeur nulle ou vide.
    pub(crate) fn apply(&mut self, incoming: &FieldSet) {
        for (key, value) in incoming {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub(crate) fn stamp(&mut self, now: OffsetDateTime) {
        let stamp = now.format(&Rfc3339).unwrap_or_default();
        let count = self.num_messages().map_or(1, |n| n + 1);
        self.fields.insert(LAST_UPDATED.to_string(), Value::String(stamp));
        self.fields.insert(NUM_MESSAGES.to_string(), Value::from(count));
    }
}

/// Copie filtrée (navires complets uniquement) du store à un instant donné.
///
/// C'est la seule vue exposée : requête HTTP globale, diffusion, fichier d'état.
/// Deux snapshots se comparent par valeur.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    vessels: BTreeMap<String, VesselRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn get(&self, vessel_id: &str) -> Option<&VesselRecord> {
        self.vessels.get(vessel_id)
    }

    pub fn contains(&self, vessel_id: &str) -> bool {
        self.vessels.contains_key(vessel_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.vessels.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VesselRecord)> {
        self.vessels.iter()
    }

    pub fn insert(&mut self, vessel_id: String, record: VesselRecord) {
        self.vessels.insert(vessel_id, record);
    }

    pub fn into_inner(self) -> BTreeMap<String, VesselRecord> {
        self.vessels
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl FromIterator<(String, VesselRecord)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, VesselRecord)>>(iter: I) -> Self {
        Self {
            vessels: iter.into_iter().collect(),
        }
    }
}

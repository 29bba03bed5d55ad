/*!
Codec scripté pour tests indépendants du protocole

Chaque phrase brute est associée à l'avance à un paquet (ou à une erreur).
Une phrase inconnue est refusée comme non-AIS. Les appels sont comptés pour
vérifier qu'un doublon n'atteint jamais le décodeur.
*/

use aisdecode_kernel::codec::{CodecError, DecodedPacket, PacketKind, SentenceCodec};
use aisdecode_kernel::models::FieldSet;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ScriptedCodec {
    script: HashMap<String, Result<Option<DecodedPacket>, CodecError>>,
    calls: Vec<String>,
}

impl ScriptedCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// `raw` se décode en un paquet `kind` portant les champs de `fields` (objet JSON).
    pub fn on(mut self, raw: &str, kind: PacketKind, fields: Value) -> Self {
        let fields: FieldSet = match fields {
            Value::Object(map) => map,
            _ => FieldSet::new(),
        };
        self.script
            .insert(raw.trim().to_string(), Ok(Some(DecodedPacket::new(kind, fields))));
        self
    }

    /// `raw` est un fragment : accepté, pas encore de paquet.
    pub fn pending(mut self, raw: &str) -> Self {
        self.script.insert(raw.trim().to_string(), Ok(None));
        self
    }

    pub fn fail(mut self, raw: &str, error: CodecError) -> Self {
        self.script.insert(raw.trim().to_string(), Err(error));
        self
    }

    /// Phrases effectivement passées au décodeur, dans l'ordre.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

impl SentenceCodec for ScriptedCodec {
    fn decode(&mut self, raw: &str) -> Result<Option<DecodedPacket>, CodecError> {
        let raw = raw.trim();
        self.calls.push(raw.to_string());
        self.script
            .get(raw)
            .cloned()
            .unwrap_or_else(|| Err(CodecError::NotAis(raw.to_string())))
    }
}

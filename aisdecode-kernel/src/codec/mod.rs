/**
 * CODEC - Frontière entre une phrase brute et un paquet de champs typés
 *
 * RÔLE : Le moteur ne connaît que ce trait. Une implémentation transforme une phrase
 * en `DecodedPacket` (type explicite + champs), signale une phrase incomplète avec
 * `Ok(None)` (fragment en attente), ou renvoie une `CodecError`.
 *
 * Un codec peut garder de l'état (réassemblage multi-fragments) : chaque source
 * d'ingestion possède donc sa propre instance.
 */

pub mod ais;

use crate::models::FieldSet;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("not an AIS sentence: {0}")]
    NotAis(String),
    #[error("malformed sentence: {0}")]
    Malformed(String),
    #[error("checksum mismatch: expected {expected:02X}, computed {computed:02X}")]
    Checksum { expected: u8, computed: u8 },
    #[error("invalid payload character '{0}'")]
    InvalidPayload(char),
    #[error("unsupported message type {0}")]
    Unsupported(u8),
    #[error("message type {msg_type} too short ({bits} bits)")]
    TooShort { msg_type: u8, bits: usize },
}

/// Type de paquet produit par le codec, porté à côté des champs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    PositionReport,
    BaseStationReport,
    ShipStaticData,
    StandardClassBPositionReport,
    ExtendedClassBPositionReport,
    AidsToNavigationReport,
    StaticDataReport,
}

impl PacketKind {
    /// Nom publié dans le champ `type` des événements par navire.
    pub fn name(self) -> &'static str {
        match self {
            PacketKind::PositionReport => "PositionReport",
            PacketKind::BaseStationReport => "BaseStationReport",
            PacketKind::ShipStaticData => "ShipStaticData",
            PacketKind::StandardClassBPositionReport => "StandardClassBPositionReport",
            PacketKind::ExtendedClassBPositionReport => "ExtendedClassBPositionReport",
            PacketKind::AidsToNavigationReport => "AidsToNavigationReport",
            PacketKind::StaticDataReport => "StaticDataReport",
        }
    }
}

impl std::fmt::Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPacket {
    pub kind: PacketKind,
    pub fields: FieldSet,
}

impl DecodedPacket {
    pub fn new(kind: PacketKind, fields: FieldSet) -> Self {
        Self { kind, fields }
    }
}

pub trait SentenceCodec: Send {
    /// `Ok(None)` : phrase acceptée mais pas encore de paquet complet.
    fn decode(&mut self, raw: &str) -> Result<Option<DecodedPacket>, CodecError>;
}

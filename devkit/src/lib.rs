/*!
# aisdecode DevKit - Doubles de test et harness pour le kernel

Bibliothèque facilitant les tests du pipeline AIS avec:
- Abonné enregistreur (pushs reçus, snapshots, événements par navire)
- Codec scripté (phrase brute -> paquet choisi à l'avance)
- Générateur de phrases AIVDM valides (armure 6 bits, checksum, fragments)
- Harness pilotant un moteur complet contre un fichier d'état temporaire
*/

pub mod codec_stub;
pub mod push_stub;
pub mod sentence;
pub mod test_utils;

pub use codec_stub::ScriptedCodec;
pub use push_stub::RecordingSubscriber;
pub use sentence::SentenceBuilder;
pub use test_utils::TestHarness;

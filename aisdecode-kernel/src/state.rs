use parking_lot::Mutex;
use std::sync::Arc;

/// Verrou partagé d'un composant (store, fenêtre de dédup, registre, état de publication).
///
/// Chaque composant possède le sien et ne le tient jamais en même temps qu'un autre :
/// une étape qui touche deux composants relâche le premier verrou avant de prendre le second.
pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

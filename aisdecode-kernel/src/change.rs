/**
 * DÉTECTION DE CHANGEMENT - Idle / Dirty entre deux publications
 *
 * RÔLE :
 * Garde le dernier snapshot publié (baseline) et un drapeau "dirty" sous un verrou
 * distinct de celui du store. Le cycle périodique ne diffuse et ne sauvegarde que
 * si quelque chose a changé depuis la dernière publication.
 *
 * FONCTIONNEMENT :
 * - Après chaque merge, la vue filtrée du navire fusionné est comparée à son entrée
 *   dans la baseline
 * - Une expiration qui retire un navire publié passe aussi l'état à Dirty
 * - Publication en deux temps : begin_publish repasse Idle AVANT le calcul du snapshot,
 *   finish_publish installe ce snapshot comme baseline. Tout merge observé entre les
 *   deux repasse Dirty : il est republié au tick suivant au lieu d'être perdu.
 */

use crate::models::{Snapshot, VesselRecord};
use crate::state::{new_state, Shared};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPhase {
    /// Rien de nouveau depuis la dernière publication
    Idle,
    /// La baseline ne reflète plus le store
    Dirty,
}

struct PublishInner {
    phase: PublishPhase,
    baseline: Snapshot,
    // publication en cours : la baseline est sur le point d'être remplacée
    publishing: bool,
}

#[derive(Clone)]
pub struct PublishState {
    inner: Shared<PublishInner>,
}

impl PublishState {
    /// `baseline` : ce qui est déjà publié (fichier d'état chargé, ou vide).
    pub fn new(baseline: Snapshot) -> Self {
        Self {
            inner: new_state(PublishInner {
                phase: PublishPhase::Idle,
                baseline,
                publishing: false,
            }),
        }
    }

    pub fn phase(&self) -> PublishPhase {
        self.inner.lock().phase
    }

    pub fn is_dirty(&self) -> bool {
        self.phase() == PublishPhase::Dirty
    }

    pub fn mark_dirty(&self) {
        self.inner.lock().phase = PublishPhase::Dirty;
    }

    /// `view` : le navire tel qu'il apparaît après filtrage (`None` s'il est incomplet).
    /// Retourne vrai si l'état est passé (ou était déjà) à Dirty.
    pub fn observe_merge(&self, vessel_id: &str, view: Option<&VesselRecord>) -> bool {
        let mut inner = self.inner.lock();
        if inner.publishing || inner.baseline.get(vessel_id) != view {
            inner.phase = PublishPhase::Dirty;
        }
        inner.phase == PublishPhase::Dirty
    }

    /// Retourne vrai si un navire expiré figurait dans la dernière publication.
    pub fn observe_expired(&self, removed: &[String]) -> bool {
        let mut inner = self.inner.lock();
        let published = removed.iter().any(|id| inner.baseline.contains(id));
        if published {
            inner.phase = PublishPhase::Dirty;
        }
        published
    }

    /// Si Dirty : repasse Idle et ouvre une publication, retourne vrai.
    /// Le snapshot à publier se calcule APRÈS cet appel.
    pub fn begin_publish(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.phase == PublishPhase::Idle {
            return false;
        }
        inner.phase = PublishPhase::Idle;
        inner.publishing = true;
        true
    }

    /// Ferme la publication ouverte par `begin_publish` : `published` devient la baseline.
    pub fn finish_publish(&self, published: &Snapshot) {
        let mut inner = self.inner.lock();
        inner.baseline = published.clone();
        inner.publishing = false;
    }

    pub fn baseline(&self) -> Snapshot {
        self.inner.lock().baseline.clone()
    }
}

/// Comparaison structurelle profonde : mêmes navires, mêmes champs, mêmes valeurs
/// (objets imbriqués comparés récursivement, ordre des clés ignoré).
pub fn snapshot_changed(current: &Snapshot, previous: &Snapshot) -> bool {
    current != previous
}

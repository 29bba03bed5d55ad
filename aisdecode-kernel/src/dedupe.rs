/**
 * FENÊTRE DE DÉDUPLICATION - Rejet des répétitions quasi simultanées
 *
 * RÔLE :
 * Une même phrase AIS arrive souvent plusieurs fois (plusieurs récepteurs, UDP + série).
 * La fenêtre garde les messages acceptés récemment et rejette une copie identique
 * (texte nettoyé des espaces) tant que l'original a moins de `duration`.
 *
 * FONCTIONNEMENT :
 * - Chaque test compacte d'abord la fenêtre (suppression des entrées trop vieilles)
 * - La taille est bornée par débit x durée, pas par une capacité fixe
 * - `duration == 0` désactive tout : rien n'est rejeté, rien n'est stocké
 * - Deux fenêtres indépendantes tournent en parallèle : diffusion locale et relais
 */

use crate::state::{new_state, Shared};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DedupeEntry {
    pub message: String,
    pub seen_at: Instant,
}

#[derive(Clone)]
pub struct DedupeWindow {
    label: &'static str,
    duration: Duration,
    entries: Shared<Vec<DedupeEntry>>,
}

impl DedupeWindow {
    pub fn new(label: &'static str, duration: Duration) -> Self {
        Self {
            label,
            duration,
            entries: new_state(Vec::new()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_enabled(&self) -> bool {
        !self.duration.is_zero()
    }

    /// Vrai si `message` a déjà été accepté il y a moins de `duration`.
    /// Ne stocke rien : l'enregistrement se fait via [`record`](Self::record).
    pub fn is_duplicate(&self, message: &str, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut entries = self.entries.lock();
        compact(&mut entries, now, self.duration);
        contains(&entries, message.trim(), now, self.duration)
    }

    /// Ajoute un message accepté à la fenêtre.
    pub fn record(&self, message: &str, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        self.entries.lock().push(DedupeEntry {
            message: message.trim().to_string(),
            seen_at: now,
        });
    }

    /// Test + enregistrement sous un seul verrou : deux adaptateurs qui reçoivent
    /// la même phrase en même temps ne peuvent pas l'accepter tous les deux.
    /// Retourne `true` si le message est accepté.
    pub fn admit(&self, message: &str, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let trimmed = message.trim();
        let mut entries = self.entries.lock();
        compact(&mut entries, now, self.duration);
        if contains(&entries, trimmed, now, self.duration) {
            return false;
        }
        entries.push(DedupeEntry {
            message: trimmed.to_string(),
            seen_at: now,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compact(entries: &mut Vec<DedupeEntry>, now: Instant, duration: Duration) {
    if let Some(cutoff) = now.checked_sub(duration) {
        entries.retain(|entry| entry.seen_at > cutoff);
    }
}

fn contains(entries: &[DedupeEntry], message: &str, now: Instant, duration: Duration) -> bool {
    entries
        .iter()
        .any(|entry| entry.message == message && now.saturating_duration_since(entry.seen_at) < duration)
}

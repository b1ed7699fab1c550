//! Registry der bekannten Gegenstellen
//!
//! Haelt pro anderem Teilnehmer einen [`Peer`] mit Jitter Buffer und den
//! zuletzt abgespielten Samples (fuer die Verlustverdeckung). Peers
//! entstehen lazy beim ersten eingehenden Audio-Paket einer unbekannten
//! ID und verschwinden bei `ClientLeave` bzw. beim Trennen der Session.

use dashmap::DashMap;
use sprechfunk_core::ClientId;
use std::sync::Arc;

use crate::jitter_buffer::JitterBuffer;

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// Zustand einer Gegenstelle
pub struct Peer {
    /// Teilnehmer-ID
    pub id: ClientId,
    /// Anzeigename
    pub name: String,
    /// Jitter Buffer fuer eingehende Frames
    pub jitter: JitterBuffer,
    /// Zuletzt abgespielte Samples (fuer die Verdeckung)
    pub letzte_samples: Vec<f32>,
}

impl Peer {
    fn neu(id: ClientId, name: String) -> Self {
        Self {
            id,
            name,
            jitter: JitterBuffer::neu(),
            letzte_samples: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// PeerRegistry
// ---------------------------------------------------------------------------

/// Thread-sichere Registry aller Gegenstellen
///
/// Clone teilt den inneren Zustand (Arc + DashMap).
#[derive(Clone)]
pub struct PeerRegistry {
    peers: Arc<DashMap<ClientId, Peer>>,
}

impl PeerRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            peers: Arc::new(DashMap::new()),
        }
    }

    /// Reiht einen Audio-Frame in den Jitter Buffer des Absenders ein
    ///
    /// Der Peer wird beim ersten Paket einer unbekannten ID angelegt.
    /// Der Aufrufer hat eigene Pakete bereits ausgefiltert.
    pub fn audio_einreihen(&self, id: ClientId, name: &str, samples: Vec<f32>) {
        let peer = self
            .peers
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(peer = %id, name = name, "Neuer Peer angelegt");
                Peer::neu(id, name.to_string())
            });
        peer.jitter.add(samples);
    }

    /// Entfernt einen Peer (ClientLeave)
    ///
    /// Gibt den Namen zurueck falls der Peer bekannt war.
    pub fn entfernen(&self, id: ClientId) -> Option<String> {
        self.peers.remove(&id).map(|(_, peer)| {
            tracing::debug!(peer = %id, "Peer entfernt");
            peer.name
        })
    }

    /// Entfernt alle Peers (Session-Ende)
    pub fn leeren(&self) {
        self.peers.clear();
    }

    /// Anzahl der bekannten Peers
    pub fn anzahl(&self) -> usize {
        self.peers.len()
    }

    /// Gibt zurueck ob keine Peers bekannt sind
    pub fn ist_leer(&self) -> bool {
        self.peers.is_empty()
    }

    /// Liste aller Peers (ID, Name), nach ID sortiert – fuer `/s`
    pub fn liste(&self) -> Vec<(ClientId, String)> {
        let mut liste: Vec<(ClientId, String)> = self
            .peers
            .iter()
            .map(|e| (e.id, e.name.clone()))
            .collect();
        liste.sort_by_key(|(id, _)| *id);
        liste
    }

    /// Fuehrt eine Funktion fuer jeden Peer mit exklusivem Zugriff aus
    ///
    /// Wird vom Mixer benutzt um `get`/`conceal` auszufuehren und die
    /// `letzte_samples` zu aktualisieren.
    pub fn fuer_alle<F>(&self, mut f: F)
    where
        F: FnMut(&mut Peer),
    {
        for mut eintrag in self.peers.iter_mut() {
            f(eintrag.value_mut());
        }
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

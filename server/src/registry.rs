//! Client-Registry des Relays
//!
//! Verwaltet die verbundenen Clients mit ihren Sende-Queues und vergibt
//! die 8-Bit-IDs. Der Fan-Out laeuft nicht-blockierend: `try_send` auf
//! die bounded Queue jedes Empfaengers, bei voller Queue wird die
//! Nachricht nur fuer diesen Empfaenger verworfen. Socket-Schreibzugriffe
//! passieren ausschliesslich in den Writer-Tasks, niemals unter einem
//! Registry-Lock.

use dashmap::DashMap;
use parking_lot::Mutex;
use sprechfunk_core::ClientId;
use sprechfunk_protocol::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ClientEintrag
// ---------------------------------------------------------------------------

/// Ein registrierter Client
#[derive(Debug, Clone)]
pub struct ClientEintrag {
    /// Anzeigename (vom Client oder `Client<id>`)
    pub name: String,
    /// Peer-Adresse der TCP-Verbindung
    pub adresse: SocketAddr,
    /// Sende-Queue: der Writer-Task des Clients leert sie FIFO
    sende_tx: mpsc::Sender<Message>,
}

impl ClientEintrag {
    /// Reiht eine Nachricht nicht-blockierend ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    fn senden(&self, id: ClientId, nachricht: Message) -> bool {
        match self.sende_tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(empfaenger = %id, "Sende-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(empfaenger = %id, "Sende-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ClientRegistry
// ---------------------------------------------------------------------------

/// Thread-sichere Registry aller verbundenen Clients
///
/// Clone teilt den inneren Zustand (Arc + DashMap).
#[derive(Clone)]
pub struct ClientRegistry {
    inner: Arc<RegistryInner>,
    queue_groesse: usize,
}

struct RegistryInner {
    clients: DashMap<ClientId, ClientEintrag>,
    /// Monoton steigender 8-Bit-Zaehler; 0 wird beim Wrap uebersprungen
    naechste_id: Mutex<u8>,
}

impl ClientRegistry {
    /// Erstellt eine leere Registry
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                clients: DashMap::new(),
                naechste_id: Mutex::new(0),
            }),
            queue_groesse,
        }
    }

    /// Vergibt die naechste freie ID
    ///
    /// Der Zaehler laeuft `1, 2, ..., 255, 1, ...` und ueberspringt beim
    /// Wrap die 0. Noch registrierte IDs werden uebersprungen; sind alle
    /// 255 IDs belegt, gibt es `None`.
    pub fn id_vergeben(&self) -> Option<ClientId> {
        let mut zaehler = self.inner.naechste_id.lock();
        for _ in 0..=u8::MAX {
            *zaehler = zaehler.wrapping_add(1);
            if *zaehler == 0 {
                *zaehler = 1;
            }
            let kandidat = ClientId(*zaehler);
            if !self.inner.clients.contains_key(&kandidat) {
                return Some(kandidat);
            }
        }
        None
    }

    /// Registriert einen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Der Writer-Task der Verbindung liest aus dieser Queue und
    /// schreibt serialisierte Nachrichten auf den Socket.
    pub fn registrieren(
        &self,
        id: ClientId,
        name: String,
        adresse: SocketAddr,
    ) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(self.queue_groesse);
        self.inner.clients.insert(
            id,
            ClientEintrag {
                name,
                adresse,
                sende_tx: tx,
            },
        );
        tracing::debug!(client = %id, "Client registriert");
        rx
    }

    /// Entfernt einen Client; das Schliessen der Queue beendet den
    /// Writer-Task sobald sie leergelaufen ist
    pub fn entfernen(&self, id: ClientId) {
        self.inner.clients.remove(&id);
        tracing::debug!(client = %id, "Client entfernt");
    }

    /// Sendet eine Nachricht an alle Clients ausser dem Absender
    ///
    /// Gibt die Anzahl der erfolgreichen Einreihungen zurueck.
    pub fn an_alle_ausser_senden(&self, absender: ClientId, nachricht: Message) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|eintrag| {
            if *eintrag.key() == absender {
                return; // Kein Echo an den Absender
            }
            if eintrag.value().senden(*eintrag.key(), nachricht.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Anzahl der registrierten Clients
    pub fn anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine ID registriert ist
    pub fn ist_registriert(&self, id: ClientId) -> bool {
        self.inner.clients.contains_key(&id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Verbindungs-Behandlung des Relays
//!
//! Jede TCP-Verbindung bekommt einen eigenen tokio-Task:
//!
//! 1. **Handshake**: die erste Nachricht muss `InitClient` mit ID 0 sein,
//!    alles andere schliesst die Verbindung sofort. Das Relay vergibt die
//!    ID, waehlt den Namen (`Client<id>` bei leerem Namen) und antwortet
//!    mit `InitClient`.
//! 2. **Reader-Loop**: `Audio`/`Text` werden mit Absender-ID und -Name
//!    neu verpackt und an alle anderen Clients verteilt. Ein zweites
//!    `InitClient` nach dem Handshake ist ein Protokollfehler.
//! 3. **Writer-Task**: leert die Sende-Queue FIFO und schreibt auf den
//!    Socket; er endet sobald die Queue geschlossen und leergelaufen ist.
//!
//! Jeder Verbindungsfehler (Decode, I/O, EOF) beendet nur diesen Client
//! und loest ein `ClientLeave` an die verbliebenen Teilnehmer aus.

use sprechfunk_core::ClientId;
use sprechfunk_protocol::{nachricht_lesen, nachricht_schreiben, Message, MsgType};
use std::net::SocketAddr;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::registry::ClientRegistry;

/// Verarbeitet eine Verbindung von Handshake bis Trennung
pub async fn verarbeiten(registry: ClientRegistry, stream: TcpStream, peer_addr: SocketAddr) {
    let (mut lese, mut schreib) = stream.into_split();

    // --- Handshake ---------------------------------------------------------
    let init = match nachricht_lesen(&mut lese).await {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(peer = %peer_addr, fehler = %e, "Handshake-Lesefehler");
            return;
        }
    };

    if init.typ != MsgType::InitClient || init.id != ClientId::UNVERGEBEN {
        tracing::warn!(
            peer = %peer_addr,
            typ = ?init.typ,
            id = %init.id,
            "Erste Nachricht ist kein gueltiges InitClient – Verbindung geschlossen"
        );
        return;
    }

    let id = match registry.id_vergeben() {
        Some(id) => id,
        None => {
            tracing::warn!(peer = %peer_addr, "Keine freie Client-ID – Verbindung abgelehnt");
            return;
        }
    };

    // Leerer Name wird durch Client<id> ersetzt
    let name = if init.name.is_empty() {
        format!("Client{}", id.inner())
    } else {
        init.name.clone()
    };

    let antwort = Message::neu(MsgType::InitClient, id, Vec::new(), name.clone());
    if let Err(e) = nachricht_schreiben(&mut schreib, &antwort).await {
        tracing::warn!(peer = %peer_addr, fehler = %e, "Handshake-Antwort fehlgeschlagen");
        return;
    }

    let sende_rx = registry.registrieren(id, name.clone(), peer_addr);
    let writer = tokio::spawn(writer_task(schreib, sende_rx, id));

    tracing::info!(client = %id, name = %name, peer = %peer_addr, "Client verbunden");

    // Presence: Beitritt an alle anderen melden
    let beitritt = format!("CLIENT {}({}) CONNECTED", name, peer_addr);
    registry.an_alle_ausser_senden(
        id,
        Message::neu(MsgType::ClientJoin, id, beitritt.into_bytes(), name.clone()),
    );

    // --- Reader-Loop -------------------------------------------------------
    loop {
        let nachricht = match nachricht_lesen(&mut lese).await {
            Ok(msg) => msg,
            Err(e) => {
                tracing::info!(client = %id, fehler = %e, "Verbindung beendet");
                break;
            }
        };

        match nachricht.typ {
            MsgType::Audio | MsgType::Text => {
                // Mit Absender-ID und -Name neu verpacken und verteilen
                let weiter = Message::neu(nachricht.typ, id, nachricht.payload, name.clone());
                registry.an_alle_ausser_senden(id, weiter);
            }
            MsgType::InitClient => {
                tracing::warn!(client = %id, "InitClient nach Handshake – Protokollfehler");
                break;
            }
            MsgType::ClientJoin | MsgType::ClientLeave => {
                tracing::warn!(
                    client = %id,
                    typ = ?nachricht.typ,
                    "Presence-Nachricht vom Client – Protokollfehler"
                );
                break;
            }
        }
    }

    // --- Aufraeumen --------------------------------------------------------
    registry.entfernen(id);

    let abschied = format!("CLIENT {}({}) DISCONNECTED", name, peer_addr);
    registry.an_alle_ausser_senden(
        id,
        Message::neu(MsgType::ClientLeave, id, abschied.into_bytes(), name.clone()),
    );

    // Writer endet von selbst sobald die geschlossene Queue leer ist
    let _ = writer.await;
    tracing::info!(client = %id, "Verbindungs-Task beendet");
}

/// Leert die Sende-Queue FIFO und schreibt auf den Socket
async fn writer_task(
    mut schreib: OwnedWriteHalf,
    mut sende_rx: mpsc::Receiver<Message>,
    id: ClientId,
) {
    while let Some(nachricht) = sende_rx.recv().await {
        if let Err(e) = nachricht_schreiben(&mut schreib, &nachricht).await {
            tracing::debug!(client = %id, fehler = %e, "Schreiben fehlgeschlagen – Writer endet");
            break;
        }
    }
}

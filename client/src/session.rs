//! Client-Session: Verbindung, Handshake, Reader- und Writer-Task
//!
//! Eine Session lebt von einem erfolgreichen Handshake bis zum ersten
//! Verbindungsfehler. Beim Ende werden die Peers geleert, das Sendeziel
//! getrennt (setzt das Reset der Vorverarbeitung in Gang) und die
//! Hauptschleife benachrichtigt, die dann auf einen Tastendruck wartet
//! und neu verbindet.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use sprechfunk_core::{ClientId, SprechfunkError};
use sprechfunk_protocol::{Message, MessageCodec, MsgType};
use sprechfunk_voice::PeerRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use crate::chat;

/// Kapazitaet der ausgehenden Nachrichten-Queue
const SENDE_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// SendeZiel
// ---------------------------------------------------------------------------

/// Gemeinsames Sendeziel fuer Capture-Thread und Chat-Schleife
///
/// Haelt die ausgehende Queue der aktuellen Session samt eigener ID und
/// Name. Ohne aktive Session wird still verworfen. `trennen` fordert
/// zusaetzlich das Zuruecksetzen der Vorverarbeitung an, das der
/// Capture-Thread beim naechsten Durchlauf ausfuehrt.
pub struct SendeZiel {
    ziel: Mutex<Option<SessionAusgang>>,
    reset_angefordert: AtomicBool,
}

struct SessionAusgang {
    id: ClientId,
    name: String,
    tx: mpsc::Sender<Message>,
}

impl SendeZiel {
    /// Erstellt ein Sendeziel ohne aktive Session
    pub fn neu() -> Self {
        Self {
            ziel: Mutex::new(None),
            reset_angefordert: AtomicBool::new(false),
        }
    }

    /// Verknuepft das Sendeziel mit einer frisch verbundenen Session
    fn setzen(&self, id: ClientId, name: String, tx: mpsc::Sender<Message>) {
        *self.ziel.lock() = Some(SessionAusgang { id, name, tx });
    }

    /// Trennt das Sendeziel und fordert das Vorverarbeitungs-Reset an
    ///
    /// Das Schliessen der Queue beendet den Writer-Task sobald sie
    /// leergelaufen ist.
    pub fn trennen(&self) {
        *self.ziel.lock() = None;
        self.reset_angefordert.store(true, Ordering::Release);
    }

    /// Reiht einen Audio-Frame nicht-blockierend ein (drop-newest)
    pub fn audio_senden(&self, frame: &[f32]) {
        let ziel = self.ziel.lock();
        if let Some(ausgang) = ziel.as_ref() {
            let nachricht = Message::neu_audio(ausgang.id, frame, ausgang.name.clone());
            if ausgang.tx.try_send(nachricht).is_err() {
                tracing::trace!("Sende-Queue voll – Audio-Frame verworfen");
            }
        }
    }

    /// Reiht eine Text-Nachricht nicht-blockierend ein
    ///
    /// Gibt `false` zurueck wenn keine Session aktiv ist oder die Queue
    /// voll war.
    pub fn text_senden(&self, text: &str) -> bool {
        let ziel = self.ziel.lock();
        match ziel.as_ref() {
            Some(ausgang) => {
                let nachricht = Message::neu_text(ausgang.id, text, ausgang.name.clone());
                ausgang.tx.try_send(nachricht).is_ok()
            }
            None => false,
        }
    }

    /// Holt ein angefordertes Reset ab (einmalig)
    pub fn reset_abholen(&self) -> bool {
        self.reset_angefordert.swap(false, Ordering::AcqRel)
    }

    /// Gibt zurueck ob eine Session aktiv ist
    pub fn ist_verbunden(&self) -> bool {
        self.ziel.lock().is_some()
    }
}

impl Default for SendeZiel {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Eine aktive Verbindung zum Relay
pub struct Session {
    /// Vom Relay vergebene eigene ID
    pub id: ClientId,
    /// Vom Relay bestaetigter Name
    pub name: String,
    /// Signalisiert das Session-Ende an die Hauptschleife
    pub ende_rx: mpsc::Receiver<()>,
}

impl Session {
    /// Verbindet zum Relay und fuehrt den Handshake aus
    ///
    /// Sendet `InitClient` mit dem Benutzernamen und liest synchron die
    /// Antwort mit vergebener ID. Danach laufen Reader- und Writer-Task
    /// bis zum ersten Fehler.
    pub async fn verbinden(
        adresse: &str,
        benutzername: &str,
        peers: PeerRegistry,
        sende_ziel: std::sync::Arc<SendeZiel>,
    ) -> anyhow::Result<Session> {
        let stream = TcpStream::connect(adresse).await?;
        let mut framed = Framed::new(stream, MessageCodec::new());

        // Handshake: InitClient mit ID 0 senden, Antwort synchron lesen
        framed.send(Message::neu_init(benutzername)).await?;
        let antwort = match framed.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(SprechfunkError::Getrennt(
                    "Relay hat die Verbindung vor dem Handshake geschlossen".into(),
                )
                .into())
            }
        };

        if antwort.typ != MsgType::InitClient {
            return Err(SprechfunkError::FalscherNachrichtentyp {
                erwartet: "InitClient".into(),
                erhalten: format!("{:?}", antwort.typ),
            }
            .into());
        }
        if !antwort.id.ist_vergeben() {
            return Err(
                SprechfunkError::protokoll("Relay hat keine Client-ID vergeben").into(),
            );
        }

        let id = antwort.id;
        let name = antwort.name;
        tracing::info!(id = %id, name = %name, relay = adresse, "Handshake abgeschlossen");

        let (sende_tx, sende_rx) = mpsc::channel::<Message>(SENDE_QUEUE_GROESSE);
        let (ende_tx, ende_rx) = mpsc::channel::<()>(1);

        sende_ziel.setzen(id, name.clone(), sende_tx);

        let (sink, strom) = framed.split();
        tokio::spawn(writer_task(sink, sende_rx));
        tokio::spawn(reader_task(strom, id, peers, sende_ziel, ende_tx));

        Ok(Session { id, name, ende_rx })
    }
}

/// Leert die ausgehende Queue und schreibt auf den Socket
async fn writer_task(
    mut sink: futures_util::stream::SplitSink<Framed<TcpStream, MessageCodec>, Message>,
    mut sende_rx: mpsc::Receiver<Message>,
) {
    while let Some(nachricht) = sende_rx.recv().await {
        if let Err(e) = sink.send(nachricht).await {
            tracing::debug!(fehler = %e, "Senden fehlgeschlagen – Writer endet");
            break;
        }
    }
    tracing::debug!("Writer-Task beendet");
}

/// Liest Nachrichten bis zum ersten Fehler und raeumt dann auf
async fn reader_task(
    mut strom: futures_util::stream::SplitStream<Framed<TcpStream, MessageCodec>>,
    selbst: ClientId,
    peers: PeerRegistry,
    sende_ziel: std::sync::Arc<SendeZiel>,
    ende_tx: mpsc::Sender<()>,
) {
    loop {
        let nachricht = match strom.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::info!(fehler = %e, "Lesefehler – Session endet");
                break;
            }
            None => {
                tracing::info!("Relay hat die Verbindung getrennt");
                break;
            }
        };

        match nachricht.typ {
            MsgType::Audio => {
                // Eigene Pakete kommen nie zurueck; zur Sicherheit filtern
                if nachricht.id != selbst {
                    peers.audio_einreihen(
                        nachricht.id,
                        &nachricht.name,
                        nachricht.audio_samples(),
                    );
                }
            }
            MsgType::Text => {
                chat::nachricht_anzeigen(&nachricht, selbst);
            }
            MsgType::ClientJoin => {
                chat::nachricht_anzeigen(&nachricht, selbst);
            }
            MsgType::ClientLeave => {
                peers.entfernen(nachricht.id);
                chat::nachricht_anzeigen(&nachricht, selbst);
            }
            MsgType::InitClient => {
                tracing::warn!("Unerwartetes InitClient waehrend der Session – ignoriert");
            }
        }
    }

    // Session-Ende: Queue schliessen, Peers leeren, Reset anfordern
    sende_ziel.trennen();
    peers.leeren();
    let _ = ende_tx.send(()).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Audio-Thread des Clients
//!
//! cpal-Streams sind nicht Send und koennen nicht in tokio-Tasks leben;
//! deshalb haelt ein dedizierter std::thread beide Streams am Leben und
//! fuehrt die Capture-Schleife aus:
//!
//! ```text
//! cpal Capture-Callback
//!     -> lock-free Ring (ringbuf)
//!     -> Capture-Schleife: Vorverarbeitung -> Frame-Sammler
//!     -> SendeZiel (Audio-Message, drop-newest)
//! ```
//!
//! Der Wiedergabe-Callback liest direkt aus dem [`AudioRing`], den der
//! Mixer-Task befuellt. Session-Wechsel erreichen den Thread nur ueber
//! das [`SendeZiel`]: nach einem Trennen setzt die Schleife
//! Vorverarbeitung und Sammler zurueck.

use ringbuf::traits::Consumer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use sprechfunk_audio::aufnahme::{aufnahme_stream_oeffnen, AufnahmeConfig, AufnahmeConsumer};
use sprechfunk_audio::geraete;
use sprechfunk_audio::wiedergabe::{wiedergabe_stream_oeffnen, WiedergabeConfig};
use sprechfunk_audio::{AudioResult, AudioRing, FrameSammler, Vorverarbeitung};

use crate::session::SendeZiel;

/// Pause der Capture-Schleife wenn keine Samples anliegen
const LEERLAUF_PAUSE: Duration = Duration::from_millis(5);

/// Startet den Audio-Thread
///
/// Oeffnet Capture- und Wiedergabe-Stream auf den gewaehlten Geraeten
/// und meldet das Ergebnis ueber `bereit_tx`; Geraetefehler sind fuer
/// den Prozessstart fatal. Danach laeuft die Capture-Schleife fuer die
/// Lebensdauer des Prozesses.
pub fn audio_thread_starten(
    eingabe_index: Option<usize>,
    ausgabe_index: Option<usize>,
    ring: Arc<AudioRing>,
    sende_ziel: Arc<SendeZiel>,
    bereit_tx: oneshot::Sender<AudioResult<()>>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("sprechfunk-audio".into())
        .spawn(move || {
            let aufbau = audio_aufbauen(eingabe_index, ausgabe_index, ring);
            match aufbau {
                Ok((_aufnahme, consumer, _wiedergabe)) => {
                    let _ = bereit_tx.send(Ok(()));
                    // Streams bleiben bis zum Prozessende im Scope
                    capture_schleife(consumer, sende_ziel);
                }
                Err(e) => {
                    let _ = bereit_tx.send(Err(e));
                }
            }
        })
}

type AudioAufbau = (
    sprechfunk_audio::aufnahme::AufnahmeStream,
    AufnahmeConsumer,
    sprechfunk_audio::wiedergabe::WiedergabeStream,
);

fn audio_aufbauen(
    eingabe_index: Option<usize>,
    ausgabe_index: Option<usize>,
    ring: Arc<AudioRing>,
) -> AudioResult<AudioAufbau> {
    let eingabe = geraete::eingabegeraet_waehlen(eingabe_index)?;
    let ausgabe = geraete::ausgabegeraet_waehlen(ausgabe_index)?;

    let (aufnahme, consumer) = aufnahme_stream_oeffnen(&eingabe, AufnahmeConfig::default())?;
    let wiedergabe = wiedergabe_stream_oeffnen(&ausgabe, WiedergabeConfig::default(), ring)?;

    Ok((aufnahme, consumer, wiedergabe))
}

/// Capture-Schleife: Ring leeren, vorverarbeiten, Frames senden
fn capture_schleife(mut consumer: AufnahmeConsumer, sende_ziel: Arc<SendeZiel>) {
    let mut vorverarbeitung = Vorverarbeitung::neu();
    let mut sammler = FrameSammler::neu();
    let mut block = vec![0.0f32; 4800];

    loop {
        // Nach einem Session-Ende Zustand zuruecksetzen
        if sende_ziel.reset_abholen() {
            vorverarbeitung.reset();
            sammler.reset();
            tracing::debug!("Vorverarbeitung zurueckgesetzt");
        }

        let n = consumer.pop_slice(&mut block);
        if n == 0 {
            std::thread::sleep(LEERLAUF_PAUSE);
            continue;
        }

        let verarbeitet = vorverarbeitung.verarbeiten(&block[..n]);
        for frame in sammler.schieben(&verarbeitet) {
            sende_ziel.audio_senden(&frame);
        }
    }
}

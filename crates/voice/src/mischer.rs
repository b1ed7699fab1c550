//! Mixer – summiert pro Tick einen Frame aus allen Gegenstellen
//!
//! Fuer jeden Peer wird ein Frame aus dem Jitter Buffer geholt; liefert
//! der Buffer nichts, wird Ersatz-Audio aus den letzten gueltigen
//! Samples erzeugt und mit 0.3 gewichtet beigemischt (zaehlt nicht als
//! aktiv). Liefert kein Peer echtes Audio, wird der Tick komplett
//! uebersprungen, damit kein leises Verdeckungs-Rauschen in den Ring
//! gelangt. Sonst wird durch die Anzahl aktiver Peers normalisiert und
//! auf +-1.0 begrenzt.

use crate::peers::PeerRegistry;

/// Gewichtung fuer verdecktes Ersatz-Audio
const VERDECKUNG_GEWICHT: f32 = 0.3;

/// Mischt einen Frame aus allen Peers
///
/// Gibt `None` zurueck wenn keine Peers bekannt sind oder kein einziger
/// Peer echtes Audio geliefert hat; in beiden Faellen darf nichts in den
/// Ring geschrieben werden.
pub fn frame_mischen(peers: &PeerRegistry, frame_laenge: usize) -> Option<Vec<f32>> {
    if peers.ist_leer() {
        return None;
    }

    let mut summe = vec![0.0f32; frame_laenge];
    let mut aktiv = 0usize;

    peers.fuer_alle(|peer| {
        match peer.jitter.get(frame_laenge) {
            Some(samples) => {
                // Letzte gueltige Samples fuer kuenftige Verdeckung merken
                peer.letzte_samples = samples.clone();
                for (ziel, s) in summe.iter_mut().zip(samples.iter()) {
                    *ziel += s;
                }
                aktiv += 1;
            }
            None => {
                let verdeckt = peer.jitter.conceal(frame_laenge, &peer.letzte_samples);
                for (ziel, s) in summe.iter_mut().zip(verdeckt.iter()) {
                    *ziel += s * VERDECKUNG_GEWICHT;
                }
            }
        }
    });

    if aktiv == 0 {
        return None;
    }

    // Normalisieren und begrenzen
    let teiler = aktiv as f32;
    for s in summe.iter_mut() {
        *s = (*s / teiler).clamp(-1.0, 1.0);
    }
    Some(summe)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

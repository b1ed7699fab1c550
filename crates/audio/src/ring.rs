//! Audio-Ring zwischen Mixer und Wiedergabe-Callback
//!
//! Zirkulaerer f32-Puffer fester Groesse mit genau einem Schreiber
//! (Mixer-Task) und genau einem Leser (Wiedergabe-Callback). Da beide
//! auf unterschiedlichen Threads laufen, schuetzt ein Mutex den Zustand;
//! die kritischen Abschnitte sind auf die Kopierdauer begrenzt.
//!
//! Ein Slot bleibt reserviert um "voll" von "leer" zu unterscheiden:
//! voll gilt bei `(schreib + 1) % groesse == lese`. Ueberzaehlige
//! Samples werden verworfen (drop-newest).

use parking_lot::Mutex;
use sprechfunk_core::{KANAELE, SAMPLE_RATE};

/// Ring-Kapazitaet in Samples: ca. 400 ms Audio
pub const RING_KAPAZITAET: usize =
    (SAMPLE_RATE as usize * KANAELE as usize) * 2 / 5;

struct RingZustand {
    puffer: Vec<f32>,
    lese: usize,
    schreib: usize,
}

/// Mutex-gesicherter Audio-Ring (ein Schreiber, ein Leser)
pub struct AudioRing {
    zustand: Mutex<RingZustand>,
    groesse: usize,
}

impl AudioRing {
    /// Erstellt einen Ring mit gegebener Slot-Anzahl
    ///
    /// Nutzbar sind `groesse - 1` Samples (ein Slot reserviert).
    pub fn neu(groesse: usize) -> Self {
        Self {
            zustand: Mutex::new(RingZustand {
                puffer: vec![0.0; groesse],
                lese: 0,
                schreib: 0,
            }),
            groesse,
        }
    }

    /// Erstellt einen Ring mit der Standard-Kapazitaet (400 ms)
    pub fn standard() -> Self {
        Self::neu(RING_KAPAZITAET)
    }

    /// Schreibt Samples bis der Ring voll ist
    ///
    /// Gibt die Anzahl der uebernommenen Samples zurueck; der Rest wird
    /// verworfen.
    pub fn schreiben(&self, samples: &[f32]) -> usize {
        let mut z = self.zustand.lock();
        let mut n = 0;
        for &s in samples {
            let naechste = (z.schreib + 1) % self.groesse;
            if naechste == z.lese {
                break; // Ring voll
            }
            let pos = z.schreib;
            z.puffer[pos] = s;
            z.schreib = naechste;
            n += 1;
        }
        n
    }

    /// Liest Samples bis der Ring leer ist
    ///
    /// Gibt die Anzahl der gelesenen Samples zurueck; der Aufrufer fuellt
    /// den Rest seines Puffers mit Stille auf.
    pub fn lesen(&self, out: &mut [f32]) -> usize {
        let mut z = self.zustand.lock();
        let mut n = 0;
        for ziel in out.iter_mut() {
            if z.lese == z.schreib {
                break; // Ring leer
            }
            *ziel = z.puffer[z.lese];
            z.lese = (z.lese + 1) % self.groesse;
            n += 1;
        }
        n
    }

    /// Anzahl der aktuell lesbaren Samples
    pub fn fuellstand(&self) -> usize {
        let z = self.zustand.lock();
        (z.schreib + self.groesse - z.lese) % self.groesse
    }

    /// Verwirft den gesamten Inhalt
    pub fn leeren(&self) {
        let mut z = self.zustand.lock();
        z.lese = 0;
        z.schreib = 0;
    }
}

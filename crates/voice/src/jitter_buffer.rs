//! Adaptiver Jitter Buffer fuer Audio-Frames
//!
//! Puffert eingehende Frames pro Gegenstelle, ordnet sie nach
//! Sequenznummer und gleicht Ankunfts-Jitter ueber eine adaptive
//! Abspielverzoegerung aus:
//! - Fuellstand > 10 Pakete: Verzoegerung +5 ms (Maximum 200 ms)
//! - Fuellstand < 3 Pakete: Verzoegerung -2 ms (Minimum 20 ms)
//! - Startwert 60 ms
//!
//! `add`, `get` und `conceal` sind unter einem gemeinsamen Mutex
//! wechselseitig ausgeschlossen; die kritischen Abschnitte sind auf
//! Kopierdauer begrenzt, daher darf auch der Wiedergabepfad zugreifen.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Initiale Abspielverzoegerung
const VERZOEGERUNG_START: Duration = Duration::from_millis(60);
/// Untere Grenze der adaptiven Verzoegerung
const ADAPTIV_MIN: Duration = Duration::from_millis(20);
/// Obere Grenze der adaptiven Verzoegerung
const ADAPTIV_MAX: Duration = Duration::from_millis(200);
/// Fuellstand ab dem die Verzoegerung angehoben wird
const TIEFE_ANHEBEN: usize = 10;
/// Fuellstand unter dem die Verzoegerung gesenkt wird
const TIEFE_SENKEN: usize = 3;
/// Maximaler Fuellstand; darueber wird das aelteste Paket verworfen
const UEBERLAUF: usize = 30;
/// Daempfung des Verdeckungs-Fades
const VERDECKUNG_PEGEL: f32 = 0.7;

// ---------------------------------------------------------------------------
// AudioPacket
// ---------------------------------------------------------------------------

/// Ein gepuffertes Audio-Paket
#[derive(Debug, Clone)]
struct AudioPacket {
    samples: Vec<f32>,
    ankunft: Instant,
    sequenz: u32,
}

// ---------------------------------------------------------------------------
// Statistik
// ---------------------------------------------------------------------------

/// Statistik-Snapshot des Jitter Buffers
#[derive(Debug, Clone, Default)]
pub struct JitterStatistik {
    /// Anzahl eingefuegter Pakete gesamt
    pub empfangen: u64,
    /// Anzahl abgespielter Pakete
    pub abgespielt: u64,
    /// Anzahl durch Ueberlauf verworfener Pakete
    pub verworfen: u64,
    /// Aktueller Fuellstand in Paketen
    pub fuellstand: usize,
    /// Aktuelle Abspielverzoegerung in Millisekunden
    pub verzoegerung_ms: u64,
}

// ---------------------------------------------------------------------------
// JitterBuffer
// ---------------------------------------------------------------------------

struct JitterZustand {
    pakete: Vec<AudioPacket>,
    verzoegerung: Duration,
    basis_zeit: Option<Instant>,
    naechste_sequenz: u32,
    statistik: JitterStatistik,
}

/// Adaptiver Jitter Buffer (ein Buffer pro Gegenstelle)
pub struct JitterBuffer {
    zustand: Mutex<JitterZustand>,
}

impl JitterBuffer {
    /// Erstellt einen neuen Jitter Buffer mit Startverzoegerung 60 ms
    pub fn neu() -> Self {
        Self {
            zustand: Mutex::new(JitterZustand {
                pakete: Vec::with_capacity(UEBERLAUF + 1),
                verzoegerung: VERZOEGERUNG_START,
                basis_zeit: None,
                naechste_sequenz: 0,
                statistik: JitterStatistik {
                    verzoegerung_ms: VERZOEGERUNG_START.as_millis() as u64,
                    ..JitterStatistik::default()
                },
            }),
        }
    }

    /// Fuegt einen Frame ein
    ///
    /// Vergibt eine monoton steigende Sequenznummer, stempelt die
    /// Ankunftszeit und passt die Abspielverzoegerung an den Fuellstand
    /// an. Bei mehr als 30 Paketen wird das aelteste verworfen.
    pub fn add(&self, samples: Vec<f32>) {
        let mut z = self.zustand.lock();
        let jetzt = Instant::now();

        if z.basis_zeit.is_none() {
            z.basis_zeit = Some(jetzt);
        }

        let paket = AudioPacket {
            samples,
            ankunft: jetzt,
            sequenz: z.naechste_sequenz,
        };
        z.naechste_sequenz = z.naechste_sequenz.wrapping_add(1);
        z.statistik.empfangen += 1;

        // Sortiert nach Sequenznummer einfuegen
        let pos = z
            .pakete
            .iter()
            .position(|p| paket.sequenz < p.sequenz)
            .unwrap_or(z.pakete.len());
        z.pakete.insert(pos, paket);

        // Adaptive Verzoegerung
        if z.pakete.len() > TIEFE_ANHEBEN {
            z.verzoegerung = (z.verzoegerung + Duration::from_millis(5)).min(ADAPTIV_MAX);
        } else if z.pakete.len() < TIEFE_SENKEN && z.verzoegerung > ADAPTIV_MIN {
            z.verzoegerung = z
                .verzoegerung
                .saturating_sub(Duration::from_millis(2))
                .max(ADAPTIV_MIN);
        }

        // Ueberlaufschutz
        if z.pakete.len() > UEBERLAUF {
            z.pakete.remove(0);
            z.statistik.verworfen += 1;
            tracing::warn!("Jitter-Ueberlauf: aeltestes Paket verworfen");
        }

        z.statistik.fuellstand = z.pakete.len();
        z.statistik.verzoegerung_ms = z.verzoegerung.as_millis() as u64;
    }

    /// Gibt den naechsten faelligen Frame zurueck
    ///
    /// Gibt `None` zurueck wenn:
    /// - die Aufwaermphase noch laeuft (Zeit seit erstem Paket < Verzoegerung)
    /// - der Buffer leer ist
    /// - das Kopf-Paket noch nicht alt genug ist
    ///
    /// Der Frame wird auf `ziel_groesse` mit Nullen aufgefuellt bzw.
    /// abgeschnitten.
    pub fn get(&self, ziel_groesse: usize) -> Option<Vec<f32>> {
        let mut z = self.zustand.lock();
        let jetzt = Instant::now();

        // Aufwaermphase seit dem allerersten Paket
        let basis = z.basis_zeit?;
        if jetzt.duration_since(basis) < z.verzoegerung {
            return None;
        }

        if z.pakete.is_empty() {
            return None;
        }

        if jetzt.duration_since(z.pakete[0].ankunft) < z.verzoegerung {
            return None;
        }

        let paket = z.pakete.remove(0);
        z.statistik.abgespielt += 1;
        z.statistik.fuellstand = z.pakete.len();

        let mut samples = paket.samples;
        if samples.len() < ziel_groesse {
            samples.resize(ziel_groesse, 0.0);
        } else if samples.len() > ziel_groesse {
            samples.truncate(ziel_groesse);
        }
        Some(samples)
    }

    /// Erzeugt Ersatz-Audio wenn kein echter Frame verfuegbar ist
    ///
    /// Blendet die letzten gueltigen Samples linear aus
    /// (`(fade_laenge - i) / fade_laenge * 0.7`), danach Stille. Bei
    /// leeren `letzte_samples` wird reine Stille zurueckgegeben.
    pub fn conceal(&self, ziel_groesse: usize, letzte_samples: &[f32]) -> Vec<f32> {
        let _z = self.zustand.lock();

        let mut verdeckt = vec![0.0f32; ziel_groesse];
        if letzte_samples.is_empty() {
            return verdeckt;
        }

        let fade_laenge = letzte_samples.len().min(ziel_groesse);
        for i in 0..fade_laenge {
            let fade = (fade_laenge - i) as f32 / fade_laenge as f32 * VERDECKUNG_PEGEL;
            verdeckt[i] = letzte_samples[i.min(letzte_samples.len() - 1)] * fade;
        }
        verdeckt
    }

    /// Aktueller Fuellstand in Paketen
    pub fn fuellstand(&self) -> usize {
        self.zustand.lock().pakete.len()
    }

    /// Aktuelle Abspielverzoegerung
    pub fn verzoegerung(&self) -> Duration {
        self.zustand.lock().verzoegerung
    }

    /// Gibt einen Statistik-Snapshot zurueck
    pub fn statistik(&self) -> JitterStatistik {
        self.zustand.lock().statistik.clone()
    }
}

impl Default for JitterBuffer {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn frame(wert: f32, laenge: usize) -> Vec<f32> {
        vec![wert; laenge]
    }

    #[test]
    fn aufwaermphase_gibt_nichts_zurueck() {
        let jb = JitterBuffer::neu();
        jb.add(frame(0.5, 4));
        // Direkt nach dem ersten Paket: Verzoegerung (60 ms) nicht erreicht
        assert!(jb.get(4).is_none());
    }

    #[test]
    fn leerer_buffer_gibt_nichts_zurueck() {
        let jb = JitterBuffer::neu();
        assert!(jb.get(1200).is_none());
    }

    #[test]
    fn faelliges_paket_wird_abgespielt() {
        let jb = JitterBuffer::neu();
        jb.add(frame(0.5, 4));
        sleep(Duration::from_millis(70));
        let samples = jb.get(4).expect("Paket muss nach 70 ms faellig sein");
        assert_eq!(samples, frame(0.5, 4));
    }

    #[test]
    fn auffuellen_und_abschneiden_auf_zielgroesse() {
        let jb = JitterBuffer::neu();
        jb.add(vec![1.0, 2.0]);
        jb.add(vec![1.0; 10]);
        sleep(Duration::from_millis(70));

        // Zu kurzes Paket wird mit Nullen aufgefuellt
        let kurz = jb.get(4).unwrap();
        assert_eq!(kurz, vec![1.0, 2.0, 0.0, 0.0]);

        // Zu langes Paket wird abgeschnitten
        let lang = jb.get(4).unwrap();
        assert_eq!(lang.len(), 4);
    }

    #[test]
    fn sequenzen_kommen_nicht_absteigend_heraus() {
        let jb = JitterBuffer::neu();
        for i in 0..8 {
            jb.add(frame(i as f32, 4));
        }
        sleep(Duration::from_millis(70));

        let mut letzte = -1.0f32;
        while let Some(samples) = jb.get(4) {
            assert!(
                samples[0] > letzte,
                "Frames muessen in Einfuege-Reihenfolge herauskommen"
            );
            letzte = samples[0];
        }
    }

    #[test]
    fn verzoegerung_steigt_bei_hohem_fuellstand() {
        let jb = JitterBuffer::neu();
        // 16 Pakete: die Einfuegungen 12..16 lassen den Fuellstand ueber 10
        for _ in 0..16 {
            jb.add(frame(0.1, 4));
        }
        let verzoegerung = jb.verzoegerung();
        assert!(
            verzoegerung >= Duration::from_millis(85),
            "Nach 5 Einfuegungen mit Tiefe > 10 muss die Verzoegerung >= 85 ms sein: {:?}",
            verzoegerung
        );
        assert!(verzoegerung <= ADAPTIV_MAX);
    }

    #[test]
    fn verzoegerung_klemmt_am_maximum() {
        let jb = JitterBuffer::neu();
        for _ in 0..100 {
            jb.add(frame(0.1, 4));
        }
        assert_eq!(jb.verzoegerung(), ADAPTIV_MAX);
    }

    #[test]
    fn verzoegerung_sinkt_bis_zum_minimum() {
        let jb = JitterBuffer::neu();
        // Abwechselnd einfuegen und abspielen: Fuellstand bleibt unter 3,
        // jede Einfuegung senkt die Verzoegerung um 2 ms bis zur 20-ms-Grenze
        for _ in 0..25 {
            jb.add(frame(0.1, 4));
            sleep(jb.verzoegerung() + Duration::from_millis(5));
            let _ = jb.get(4);
        }
        assert_eq!(
            jb.verzoegerung(),
            ADAPTIV_MIN,
            "Verzoegerung muss bei anhaltend niedrigem Fuellstand auf 20 ms klemmen"
        );
    }

    #[test]
    fn ueberlauf_verwirft_aeltestes_paket() {
        let jb = JitterBuffer::neu();
        for i in 0..35 {
            jb.add(frame(i as f32, 4));
        }
        assert_eq!(jb.fuellstand(), UEBERLAUF);
        assert_eq!(jb.statistik().verworfen, 5);

        // Das aelteste verbliebene Paket traegt den Wert 5.0
        sleep(Duration::from_millis(210)); // Verzoegerung ist durch die vollen Einfuegungen auf gut 180 ms gestiegen
        let samples = jb.get(4).unwrap();
        assert_eq!(samples[0], 5.0);
    }

    #[test]
    fn conceal_blendet_linear_aus() {
        let jb = JitterBuffer::neu();
        let letzte = vec![1.0f32, 1.0, 1.0, 1.0];
        let verdeckt = jb.conceal(4, &letzte);
        assert_eq!(verdeckt, vec![0.7, 0.525, 0.35, 0.175]);
    }

    #[test]
    fn conceal_ohne_letzte_samples_ist_stille() {
        let jb = JitterBuffer::neu();
        let verdeckt = jb.conceal(8, &[]);
        assert_eq!(verdeckt, vec![0.0; 8]);
    }

    #[test]
    fn conceal_kurze_letzte_samples_rest_stille() {
        let jb = JitterBuffer::neu();
        let verdeckt = jb.conceal(6, &[1.0, 1.0]);
        // fade_laenge = 2: [2/2*0.7, 1/2*0.7], danach Stille
        assert_eq!(verdeckt[0], 0.7);
        assert_eq!(verdeckt[1], 0.35);
        assert_eq!(&verdeckt[2..], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn statistik_zaehlt_mit() {
        let jb = JitterBuffer::neu();
        jb.add(frame(0.1, 4));
        jb.add(frame(0.2, 4));
        sleep(Duration::from_millis(70));
        let _ = jb.get(4);

        let stat = jb.statistik();
        assert_eq!(stat.empfangen, 2);
        assert_eq!(stat.abgespielt, 1);
        assert_eq!(stat.fuellstand, 1);
    }
}

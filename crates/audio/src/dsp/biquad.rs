//! Biquad-Filter (RBJ Cookbook, Direct Form I)
//!
//! Second-Order IIR-Filter fuer Hochpass, Tiefpass, Bandpass und
//! Peaking-EQ. Koeffizienten und Filterzustand laufen in f64, die
//! Samples bleiben f32.
//!
//! Koeffizienten-Berechnung: `w0 = 2*pi*f/fs`, `alpha = sin(w0)/(2*Q)`,
//! alle Koeffizienten werden durch `a0` normalisiert.

use super::AudioProcessor;
use std::f64::consts::PI;

/// Biquad-Filter mit Direct-Form-I-Zustand
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    // Normalisierte Koeffizienten
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    // Zustand (Direct Form I)
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Erstellt einen Hochpass-Filter
    pub fn hochpass(abtastrate: u32, grenzfrequenz: f64, q: f64) -> Self {
        let (w0, alpha) = Self::vorberechnen(abtastrate, grenzfrequenz, q);
        let cosw0 = w0.cos();

        let b0 = (1.0 + cosw0) / 2.0;
        let b1 = -(1.0 + cosw0);
        let b2 = (1.0 + cosw0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cosw0;
        let a2 = 1.0 - alpha;

        Self::normalisiert(b0, b1, b2, a0, a1, a2)
    }

    /// Erstellt einen Tiefpass-Filter
    pub fn tiefpass(abtastrate: u32, grenzfrequenz: f64, q: f64) -> Self {
        let (w0, alpha) = Self::vorberechnen(abtastrate, grenzfrequenz, q);
        let cosw0 = w0.cos();

        let b0 = (1.0 - cosw0) / 2.0;
        let b1 = 1.0 - cosw0;
        let b2 = (1.0 - cosw0) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cosw0;
        let a2 = 1.0 - alpha;

        Self::normalisiert(b0, b1, b2, a0, a1, a2)
    }

    /// Erstellt einen Bandpass-Filter (konstante Spitzenverstaerkung)
    pub fn bandpass(abtastrate: u32, mittenfrequenz: f64, q: f64) -> Self {
        let (w0, alpha) = Self::vorberechnen(abtastrate, mittenfrequenz, q);
        let cosw0 = w0.cos();

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cosw0;
        let a2 = 1.0 - alpha;

        Self::normalisiert(b0, b1, b2, a0, a1, a2)
    }

    /// Erstellt einen Peaking-EQ-Filter
    pub fn peaking(abtastrate: u32, mittenfrequenz: f64, gain_db: f64, q: f64) -> Self {
        let (w0, alpha) = Self::vorberechnen(abtastrate, mittenfrequenz, q);
        let cosw0 = w0.cos();
        let a = 10.0f64.powf(gain_db / 40.0);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cosw0;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cosw0;
        let a2 = 1.0 - alpha / a;

        Self::normalisiert(b0, b1, b2, a0, a1, a2)
    }

    /// Verarbeitet ein einzelnes Sample
    pub fn sample_verarbeiten(&mut self, sample: f32) -> f32 {
        let x = sample as f64;
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y as f32
    }

    fn vorberechnen(abtastrate: u32, frequenz: f64, q: f64) -> (f64, f64) {
        let w0 = 2.0 * PI * frequenz / abtastrate as f64;
        let alpha = w0.sin() / (2.0 * q);
        (w0, alpha)
    }

    fn normalisiert(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }
}

impl AudioProcessor for BiquadFilter {
    fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.sample_verarbeiten(*sample);
        }
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sinus(frequenz: f32, laenge: usize) -> Vec<f32> {
        (0..laenge)
            .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * frequenz / 48000.0).sin() * 0.5)
            .collect()
    }

    fn energie(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn hochpass_daempft_tiefe_frequenzen() {
        let mut filter = BiquadFilter::hochpass(48000, 80.0, 0.707);
        let eingang = sinus(20.0, 4800);
        let mut ausgang = eingang.clone();
        filter.process(&mut ausgang);
        assert!(
            energie(&ausgang) < energie(&eingang) * 0.5,
            "20 Hz sollte deutlich unter 80 Hz Grenzfrequenz gedaempft werden"
        );
    }

    #[test]
    fn hochpass_laesst_sprachband_durch() {
        let mut filter = BiquadFilter::hochpass(48000, 80.0, 0.707);
        let eingang = sinus(1000.0, 4800);
        let mut ausgang = eingang.clone();
        filter.process(&mut ausgang);
        let verhaeltnis = energie(&ausgang) / energie(&eingang);
        assert!(
            verhaeltnis > 0.9,
            "1 kHz sollte nahezu unveraendert passieren: {}",
            verhaeltnis
        );
    }

    #[test]
    fn tiefpass_daempft_hohe_frequenzen() {
        let mut filter = BiquadFilter::tiefpass(48000, 8000.0, 0.707);
        let eingang = sinus(20000.0, 4800);
        let mut ausgang = eingang.clone();
        filter.process(&mut ausgang);
        assert!(energie(&ausgang) < energie(&eingang) * 0.5);
    }

    #[test]
    fn bandpass_selektiert_mittenfrequenz() {
        let mut im_band = BiquadFilter::bandpass(48000, 6500.0, 2.0);
        let mut ausser_band = BiquadFilter::bandpass(48000, 6500.0, 2.0);

        let mut band_signal = sinus(6500.0, 4800);
        let mut tief_signal = sinus(200.0, 4800);
        im_band.process(&mut band_signal);
        ausser_band.process(&mut tief_signal);

        assert!(
            energie(&band_signal) > energie(&tief_signal) * 10.0,
            "Bandpass muss die Mittenfrequenz bevorzugen"
        );
    }

    #[test]
    fn peaking_verstaerkt_mittenfrequenz() {
        let mut filter = BiquadFilter::peaking(48000, 3000.0, 6.0, 1.2);
        let eingang = sinus(3000.0, 4800);
        let mut ausgang = eingang.clone();
        filter.process(&mut ausgang);
        assert!(
            energie(&ausgang) > energie(&eingang) * 1.5,
            "+6 dB Peaking muss die Mittenfrequenz anheben"
        );
    }

    #[test]
    fn stille_bleibt_stille() {
        let mut filter = BiquadFilter::hochpass(48000, 80.0, 0.707);
        let mut samples = vec![0.0f32; 1200];
        filter.process(&mut samples);
        filter.process(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn reset_loescht_historie() {
        let mut filter = BiquadFilter::tiefpass(48000, 8000.0, 0.707);
        let mut samples = sinus(1000.0, 480);
        filter.process(&mut samples);
        filter.reset();
        assert_eq!(filter.x1, 0.0);
        assert_eq!(filter.y2, 0.0);
    }
}

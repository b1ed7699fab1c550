//! Frame-Sammler
//!
//! Der Capture-Callback liefert Bloecke variabler Groesse; das Protokoll
//! verlangt Frames fester Laenge. Der Sammler puffert Samples und gibt
//! vollstaendige Frames ab. Der Puffer ist auf `2 * frame_laenge` Samples
//! begrenzt; bei Ueberlauf bleiben nur die neuesten `frame_laenge`
//! Samples erhalten (drop-newest-Gegenstueck auf der Capture-Seite).

use sprechfunk_core::FRAME_LAENGE;

/// Sammelt variable Sample-Bloecke zu festen Frames
pub struct FrameSammler {
    puffer: Vec<f32>,
    frame_laenge: usize,
}

impl FrameSammler {
    /// Erstellt einen Sammler mit der Standard-Frame-Laenge
    pub fn neu() -> Self {
        Self::mit_frame_laenge(FRAME_LAENGE)
    }

    /// Erstellt einen Sammler mit beliebiger Frame-Laenge
    pub fn mit_frame_laenge(frame_laenge: usize) -> Self {
        Self {
            puffer: Vec::with_capacity(frame_laenge * 2),
            frame_laenge,
        }
    }

    /// Haengt Samples an und gibt alle vollstaendigen Frames zurueck
    pub fn schieben(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.puffer.extend_from_slice(samples);

        // Ueberlaufschutz: nur die neuesten frame_laenge Samples behalten
        if self.puffer.len() > self.frame_laenge * 2 {
            let start = self.puffer.len() - self.frame_laenge;
            self.puffer.drain(..start);
        }

        let mut frames = Vec::new();
        while self.puffer.len() >= self.frame_laenge {
            frames.push(self.puffer.drain(..self.frame_laenge).collect());
        }
        frames
    }

    /// Aktueller Fuellstand des Puffers in Samples
    pub fn fuellstand(&self) -> usize {
        self.puffer.len()
    }

    /// Verwirft alle gepufferten Samples (beim Session-Ende)
    pub fn reset(&mut self) {
        self.puffer.clear();
    }
}

impl Default for FrameSammler {
    fn default() -> Self {
        Self::neu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unvollstaendiger_frame_wird_gepuffert() {
        let mut sammler = FrameSammler::mit_frame_laenge(8);
        let frames = sammler.schieben(&[1.0; 5]);
        assert!(frames.is_empty());
        assert_eq!(sammler.fuellstand(), 5);
    }

    #[test]
    fn exakter_frame_wird_abgegeben() {
        let mut sammler = FrameSammler::mit_frame_laenge(4);
        let frames = sammler.schieben(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frames, vec![vec![1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(sammler.fuellstand(), 0);
    }

    #[test]
    fn mehrere_frames_aus_einem_block() {
        let mut sammler = FrameSammler::mit_frame_laenge(3);
        let eingang: Vec<f32> = (0..7).map(|i| i as f32).collect();
        let frames = sammler.schieben(&eingang);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], vec![0.0, 1.0, 2.0]);
        assert_eq!(frames[1], vec![3.0, 4.0, 5.0]);
        assert_eq!(sammler.fuellstand(), 1);
    }

    #[test]
    fn rest_wird_ueber_aufrufe_akkumuliert() {
        let mut sammler = FrameSammler::mit_frame_laenge(4);
        assert!(sammler.schieben(&[1.0, 2.0]).is_empty());
        let frames = sammler.schieben(&[3.0, 4.0, 5.0]);
        assert_eq!(frames, vec![vec![1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(sammler.fuellstand(), 1);
    }

    #[test]
    fn ueberlauf_behaelt_nur_die_neuesten_samples() {
        let mut sammler = FrameSammler::mit_frame_laenge(4);
        // 10 Samples auf einmal: Puffer-Limit ist 8, also bleiben die
        // neuesten 4 Samples (6..10) uebrig und bilden genau einen Frame.
        let eingang: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let frames = sammler.schieben(&eingang);
        assert_eq!(frames, vec![vec![6.0, 7.0, 8.0, 9.0]]);
        assert_eq!(sammler.fuellstand(), 0);
    }

    #[test]
    fn standard_frame_laenge() {
        let mut sammler = FrameSammler::neu();
        let frames = sammler.schieben(&vec![0.5; FRAME_LAENGE]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), FRAME_LAENGE);
    }

    #[test]
    fn reset_verwirft_rest() {
        let mut sammler = FrameSammler::mit_frame_laenge(4);
        sammler.schieben(&[1.0, 2.0, 3.0]);
        sammler.reset();
        assert_eq!(sammler.fuellstand(), 0);
    }
}

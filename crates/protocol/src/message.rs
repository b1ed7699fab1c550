//! Nachrichten-Typen des Sprechfunk-Protokolls
//!
//! Jede Nachricht besteht aus einem 4-Byte-Header und einem variablen
//! Body. Direkte Byte-Serialisierung, kein serde (Performance-kritisch,
//! Audio-Frames laufen durch diesen Pfad).
//!
//! ## Frame-Format (bit-exakt, little-endian)
//!
//! ```text
//! Offset  Len  Beschreibung
//! ------  ---  -----------
//!  0       1   MsgType
//!  1       1   Absender-ID (0 bei InitClient vom Client)
//!  2       2   body_size – exakte Laenge des folgenden Bodys
//!  4       2   payload_size
//!  6+      N   payload (N = payload_size)
//!  ..      2   name_size
//!  ..      M   name (UTF-8, M = name_size)
//! ```
//!
//! Vertrag: `body_size == 2 + payload_size + 2 + name_size`.
//! `body_size == 0` ist ungueltig und wird als Protokollfehler abgelehnt.
//! Beide Laengenfelder werden immer geschrieben, auch wenn die zugehoerige
//! Region leer ist.

use sprechfunk_core::ClientId;
use std::io;

/// Groesse des Headers in Bytes
pub const HEADER_GROESSE: usize = 4;

/// Maximale Body-Groesse (durch das u16-Laengenfeld begrenzt)
pub const MAX_BODY_GROESSE: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// MsgType
// ---------------------------------------------------------------------------

/// Art der Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    /// Roh-PCM Audio-Frame (little-endian f32)
    Audio = 0,
    /// UTF-8 Chat-Text
    Text = 1,
    /// Handshake: Client meldet sich an, Relay antwortet mit vergebener ID
    InitClient = 2,
    /// Presence: ein Teilnehmer ist beigetreten (nur vom Relay gesendet)
    ClientJoin = 3,
    /// Presence: ein Teilnehmer hat die Verbindung getrennt (nur vom Relay)
    ClientLeave = 4,
}

impl MsgType {
    /// Konvertiert ein Byte in einen `MsgType`
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Audio),
            1 => Some(Self::Text),
            2 => Some(Self::InitClient),
            3 => Some(Self::ClientJoin),
            4 => Some(Self::ClientLeave),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Vollstaendige Protokoll-Nachricht
///
/// Fuer `Audio` enthaelt `payload` genau `4 * FRAME_LAENGE` Bytes
/// (little-endian f32 Samples), fuer `Text`/`ClientJoin`/`ClientLeave`
/// UTF-8 Text. Bei `InitClient` ist der Payload leer und nur `name`
/// relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Nachrichtenart
    pub typ: MsgType,
    /// Absender-ID (vom Relay beim Weiterleiten gesetzt)
    pub id: ClientId,
    /// Rohe Nutzdaten
    pub payload: Vec<u8>,
    /// Absender-Name
    pub name: String,
}

impl Message {
    /// Erstellt eine Nachricht aus allen Feldern
    pub fn neu(typ: MsgType, id: ClientId, payload: Vec<u8>, name: impl Into<String>) -> Self {
        Self {
            typ,
            id,
            payload,
            name: name.into(),
        }
    }

    /// Erstellt eine Audio-Nachricht aus PCM-Samples
    pub fn neu_audio(id: ClientId, samples: &[f32], name: impl Into<String>) -> Self {
        Self::neu(MsgType::Audio, id, samples_zu_bytes(samples), name)
    }

    /// Erstellt eine Text-Nachricht
    pub fn neu_text(id: ClientId, text: impl Into<String>, name: impl Into<String>) -> Self {
        Self::neu(MsgType::Text, id, text.into().into_bytes(), name)
    }

    /// Erstellt die Handshake-Nachricht des Clients (ID 0, leerer Payload)
    pub fn neu_init(name: impl Into<String>) -> Self {
        Self::neu(MsgType::InitClient, ClientId::UNVERGEBEN, Vec::new(), name)
    }

    /// Exakte Body-Groesse dieser Nachricht in Bytes
    pub fn body_groesse(&self) -> usize {
        2 + self.payload.len() + 2 + self.name.len()
    }

    /// Serialisiert die Nachricht in einen Byte-Vec (Header + Body)
    ///
    /// # Fehler
    /// - `InvalidInput` wenn Payload, Name oder Body das u16-Laengenfeld
    ///   ueberschreiten
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        if self.payload.len() > u16::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Payload zu gross: {} Bytes", self.payload.len()),
            ));
        }
        if self.name.len() > u16::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Name zu gross: {} Bytes", self.name.len()),
            ));
        }
        let body = self.body_groesse();
        if body > MAX_BODY_GROESSE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Body zu gross: {} Bytes (Maximum {})", body, MAX_BODY_GROESSE),
            ));
        }

        let mut buf = Vec::with_capacity(HEADER_GROESSE + body);
        buf.push(self.typ as u8);
        buf.push(self.id.inner());
        buf.extend_from_slice(&(body as u16).to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&(self.name.len() as u16).to_le_bytes());
        buf.extend_from_slice(self.name.as_bytes());
        Ok(buf)
    }

    /// Deserialisiert eine komplette Nachricht (Header + Body)
    ///
    /// # Fehler
    /// - `InvalidData` bei unbekanntem Typ, `body_size == 0`, falscher
    ///   Gesamtlaenge oder inkonsistenten Laengenfeldern
    pub fn decode(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < HEADER_GROESSE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Header zu kurz: {} Bytes", buf.len()),
            ));
        }

        let typ = MsgType::from_u8(buf[0]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unbekannter MsgType: {}", buf[0]),
            )
        })?;
        let id = ClientId(buf[1]);
        let body_size = u16::from_le_bytes([buf[2], buf[3]]) as usize;

        if body_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Ungueltige body_size = 0",
            ));
        }
        if buf.len() != HEADER_GROESSE + body_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame-Laenge passt nicht: {} Bytes (erwartet {})",
                    buf.len(),
                    HEADER_GROESSE + body_size
                ),
            ));
        }

        Self::body_parsen(typ, id, &buf[HEADER_GROESSE..])
    }

    /// Parst die beiden laengen-praefixierten Regionen eines Bodys
    ///
    /// Der Body muss exakt `2 + payload_size + 2 + name_size` Bytes lang
    /// sein, sonst wird die Nachricht abgelehnt.
    pub fn body_parsen(typ: MsgType, id: ClientId, body: &[u8]) -> io::Result<Self> {
        if body.len() < 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Body zu kurz fuer payload_size",
            ));
        }
        let payload_size = u16::from_le_bytes([body[0], body[1]]) as usize;
        let mut off = 2;

        if body.len() < off + payload_size + 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Body zu kurz fuer Payload + name_size",
            ));
        }
        let payload = body[off..off + payload_size].to_vec();
        off += payload_size;

        let name_size = u16::from_le_bytes([body[off], body[off + 1]]) as usize;
        off += 2;

        if body.len() != off + name_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Inkonsistente Laengenfelder: Body {} Bytes, erwartet {}",
                    body.len(),
                    off + name_size
                ),
            ));
        }
        let name = String::from_utf8(body[off..].to_vec()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Name ist kein gueltiges UTF-8: {}", e),
            )
        })?;

        Ok(Self {
            typ,
            id,
            payload,
            name,
        })
    }

    /// Dekodiert den Payload einer Audio-Nachricht als PCM-Samples
    pub fn audio_samples(&self) -> Vec<f32> {
        bytes_zu_samples(&self.payload)
    }

    /// Interpretiert den Payload als UTF-8 Text (Text/Join/Leave)
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Sample-Konvertierung
// ---------------------------------------------------------------------------

/// Konvertiert PCM-Samples in little-endian f32 Bytes
pub fn samples_zu_bytes(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Konvertiert little-endian f32 Bytes in PCM-Samples
///
/// Ueberzaehlige Bytes am Ende (kein volles f32) werden ignoriert.
pub fn bytes_zu_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

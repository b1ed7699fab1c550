//! Wire-Format fuer die TCP-Verbindung
//!
//! Frame-basiertes Protokoll: 4-Byte-Header (Typ, ID, body_size) +
//! variabler Body. Die Laengenfelder sind little-endian (siehe
//! [`crate::message`] fuer das bit-exakte Layout).
//!
//! Dieses Modul liefert zwei Zugriffswege:
//! - `nachricht_lesen` / `nachricht_schreiben` fuer direktes async
//!   Lesen/Schreiben (Handshake, Relay-Lese-Schleife)
//! - [`MessageCodec`] fuer die Integration mit
//!   `tokio_util::codec::Framed` (Client-Session)

use bytes::{Buf, BufMut, BytesMut};
use sprechfunk_core::ClientId;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::{Message, MsgType, HEADER_GROESSE};

// ---------------------------------------------------------------------------
// Async Lese-/Schreib-Helfer
// ---------------------------------------------------------------------------

/// Liest genau eine Nachricht aus einem `AsyncRead`
///
/// Kurze Reads unterhalb der exakten Header- oder Body-Laenge sind fuer
/// die Verbindung fatal (`UnexpectedEof`).
///
/// # Fehler
/// - `UnexpectedEof` wenn die Verbindung vor Frame-Ende getrennt wird
/// - `InvalidData` bei unbekanntem Typ, `body_size == 0` oder
///   inkonsistenten Laengenfeldern
pub async fn nachricht_lesen<R>(reader: &mut R) -> io::Result<Message>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_GROESSE];
    reader.read_exact(&mut header).await?;

    let typ = MsgType::from_u8(header[0]).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Unbekannter MsgType: {}", header[0]),
        )
    })?;
    let id = ClientId(header[1]);
    let body_size = u16::from_le_bytes([header[2], header[3]]) as usize;

    if body_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Ungueltige body_size = 0",
        ));
    }

    let mut body = vec![0u8; body_size];
    reader.read_exact(&mut body).await?;

    Message::body_parsen(typ, id, &body)
}

/// Schreibt genau eine Nachricht in einen `AsyncWrite`
pub async fn nachricht_schreiben<W>(writer: &mut W, nachricht: &Message) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = nachricht.encode()?;
    writer.write_all(&bytes).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// MessageCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer die frame-basierte TCP-Verbindung
///
/// Implementiert `Encoder<Message>` und `Decoder` fuer nahtlose
/// Integration mit `tokio_util::codec::Framed`.
#[derive(Debug, Clone, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Erstellt einen neuen `MessageCodec`
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Warte auf den vollstaendigen Header
        if src.len() < HEADER_GROESSE {
            return Ok(None);
        }

        // body_size pruefen ohne den Buffer zu veraendern
        let body_size = u16::from_le_bytes([src[2], src[3]]) as usize;
        if body_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Ungueltige body_size = 0",
            ));
        }

        let total = HEADER_GROESSE + body_size;
        if src.len() < total {
            // Speicher vorbelegen um Reallocations zu vermeiden
            src.reserve(total - src.len());
            return Ok(None);
        }

        let typ = MsgType::from_u8(src[0]).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unbekannter MsgType: {}", src[0]),
            )
        })?;
        let id = ClientId(src[1]);

        src.advance(HEADER_GROESSE);
        let body = src.split_to(body_size);

        Message::body_parsen(typ, id, &body).map(Some)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = item.encode()?;
        dst.reserve(bytes.len());
        dst.put_slice(&bytes);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

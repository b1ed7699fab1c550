//! Chat-Darstellung im Terminal
//!
//! ANSI-256-Farben, Zeitstempel und der Eingabe-Prompt. Jeder
//! Teilnehmer bekommt eine aus seiner ID abgeleitete Farbe, damit die
//! Zuordnung ueber die Sitzung stabil bleibt. Die Darstellung ist reine
//! Anzeige-Logik und beruehrt das Protokoll nicht.

use chrono::Local;
use sprechfunk_core::ClientId;
use sprechfunk_protocol::{Message, MsgType};
use std::io::Write;

/// Farbindex fuer das CLIENT-Presence-Label
const FARBE_CLIENT: u8 = 188;
/// Farbindex fuer das SERVER-Label
const FARBE_SERVER: u8 = 141;
/// Farbindex fuer Zeitstempel
const FARBE_ZEIT: u8 = 238;

// ---------------------------------------------------------------------------
// Eingabe-Parsing
// ---------------------------------------------------------------------------

/// Eine interpretierte Eingabezeile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eingabe {
    /// `/s` – verbundene Teilnehmer anzeigen
    Status,
    /// `/h` – Befehlsliste anzeigen
    Hilfe,
    /// Unbekannter Befehl (beginnt mit `/`)
    Unbekannt(String),
    /// Normale Chat-Nachricht
    Text(String),
    /// Leere Zeile
    Leer,
}

/// Interpretiert eine Eingabezeile
pub fn eingabe_parsen(zeile: &str) -> Eingabe {
    let zeile = zeile.trim();
    if zeile.is_empty() {
        return Eingabe::Leer;
    }
    if let Some(befehl) = zeile.strip_prefix('/') {
        return match befehl {
            "s" => Eingabe::Status,
            "h" => Eingabe::Hilfe,
            andere => Eingabe::Unbekannt(format!("/{}", andere)),
        };
    }
    Eingabe::Text(zeile.to_string())
}

// ---------------------------------------------------------------------------
// Darstellung
// ---------------------------------------------------------------------------

/// Leitet die Anzeige-Farbe eines Teilnehmers aus seiner ID ab
pub fn farbe_fuer_id(id: ClientId) -> u8 {
    ((id.inner() as u32 * 98 + 21) % 255) as u8
}

fn zeitstempel() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Gibt den Eingabe-Prompt aus: `[HH:MM:SS] => `
pub fn prompt() {
    print!(
        "\x1b[38;5;{}m[{}]\x1b[m => ",
        FARBE_ZEIT,
        zeitstempel()
    );
    let _ = std::io::stdout().flush();
}

/// Gibt eine Zeile mit farbigem Absender-Label aus und zeigt den Prompt
fn zeile_anzeigen(label: &str, farbe: u8, text: &str) {
    println!(
        "\r\x1b[38;5;{}m[{}]\x1b[m \x1b[38;5;{}m{}\x1b[m => {}",
        FARBE_ZEIT,
        zeitstempel(),
        farbe,
        label,
        text
    );
    prompt();
}

/// Stellt eine empfangene Nachricht dar
///
/// `Text` unter der eigenen ID stammt vom Relay selbst und wird als
/// SERVER angezeigt; Presence-Nachrichten tragen das CLIENT-Label.
pub fn nachricht_anzeigen(nachricht: &Message, selbst: ClientId) {
    match nachricht.typ {
        MsgType::Text => {
            if nachricht.id == selbst {
                zeile_anzeigen("SERVER", FARBE_SERVER, &nachricht.payload_text());
            } else {
                zeile_anzeigen(
                    &nachricht.name,
                    farbe_fuer_id(nachricht.id),
                    &nachricht.payload_text(),
                );
            }
        }
        MsgType::ClientJoin | MsgType::ClientLeave => {
            zeile_anzeigen("CLIENT", FARBE_CLIENT, &nachricht.payload_text());
        }
        _ => {}
    }
}

/// Gibt eine Statusmeldung des Clients aus (Verbindung, Fehler)
pub fn hinweis_anzeigen(text: &str) {
    println!("\r{}", text);
    prompt();
}

/// `/s`: Liste der bekannten Teilnehmer
pub fn teilnehmer_anzeigen(teilnehmer: &[(ClientId, String)]) {
    println!("\r\x1b[34mVerbundene Teilnehmer:\x1b[m\n[id]  [name]");
    for (id, name) in teilnehmer {
        println!(
            "{}     \x1b[38;5;{}m{}\x1b[m",
            id.inner(),
            farbe_fuer_id(*id),
            name
        );
    }
    prompt();
}

/// `/h`: Befehlsliste
pub fn hilfe_anzeigen() {
    println!("\r/s => verbundene Teilnehmer");
    println!("/h => diese Befehlsliste");
    prompt();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn befehle_werden_erkannt() {
        assert_eq!(eingabe_parsen("/s"), Eingabe::Status);
        assert_eq!(eingabe_parsen("/h"), Eingabe::Hilfe);
        assert_eq!(
            eingabe_parsen("/x"),
            Eingabe::Unbekannt("/x".to_string())
        );
    }

    #[test]
    fn text_und_leere_zeilen() {
        assert_eq!(
            eingabe_parsen("hallo welt"),
            Eingabe::Text("hallo welt".to_string())
        );
        assert_eq!(eingabe_parsen(""), Eingabe::Leer);
        assert_eq!(eingabe_parsen("   "), Eingabe::Leer);
    }

    #[test]
    fn whitespace_wird_getrimmt() {
        assert_eq!(eingabe_parsen("  /s  "), Eingabe::Status);
        assert_eq!(eingabe_parsen(" hi "), Eingabe::Text("hi".to_string()));
    }

    #[test]
    fn farbe_ist_deterministisch() {
        assert_eq!(farbe_fuer_id(ClientId(1)), farbe_fuer_id(ClientId(1)));
        // (1 * 98 + 21) % 255 = 119
        assert_eq!(farbe_fuer_id(ClientId(1)), 119);
        // (5 * 98 + 21) % 255 = 1
        assert_eq!(farbe_fuer_id(ClientId(5)), 1);
    }
}

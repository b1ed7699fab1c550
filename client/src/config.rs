//! Client-Konfiguration ueber Kommandozeile und Umgebung

use clap::Parser;

/// Sprechfunk Terminal-Client
#[derive(Parser, Debug)]
#[command(name = "sprechfunk-client", version, about)]
pub struct Args {
    /// Adresse des Relays (host:port)
    #[arg(long, default_value = "127.0.0.1:9000")]
    pub relay: String,

    /// Benutzername (Standard: $USER bzw. $USERNAME)
    #[arg(long)]
    pub name: Option<String>,

    /// Index des Eingabegeraets (Standard: Systemstandard)
    #[arg(long)]
    pub eingabe: Option<usize>,

    /// Index des Ausgabegeraets (Standard: Systemstandard)
    #[arg(long)]
    pub ausgabe: Option<usize>,

    /// Listet die verfuegbaren Audio-Geraete auf und beendet sich
    #[arg(long)]
    pub geraete: bool,
}

impl Args {
    /// Ermittelt den Benutzernamen: Flag, sonst `USER`/`USERNAME`
    ///
    /// Ein leerer Name ist erlaubt; das Relay ersetzt ihn durch
    /// `Client<id>`.
    pub fn benutzername(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardwerte() {
        let args = Args::parse_from(["sprechfunk-client"]);
        assert_eq!(args.relay, "127.0.0.1:9000");
        assert!(args.name.is_none());
        assert!(!args.geraete);
    }

    #[test]
    fn name_flag_hat_vorrang() {
        let args = Args::parse_from(["sprechfunk-client", "--name", "alice"]);
        assert_eq!(args.benutzername(), "alice");
    }

    #[test]
    fn geraete_indizes() {
        let args = Args::parse_from(["sprechfunk-client", "--eingabe", "2", "--ausgabe", "0"]);
        assert_eq!(args.eingabe, Some(2));
        assert_eq!(args.ausgabe, Some(0));
    }
}

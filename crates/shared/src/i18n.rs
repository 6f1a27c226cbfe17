//! Translation lookup.
//!
//! The key set is closed: every key the client uses appears in the table
//! below. An unknown key falls back to the key string itself, so a miss is
//! visible in the UI instead of rendering blank.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    /// Parse a language tag, falling back to English.
    pub fn parse(tag: &str) -> Language {
        match tag.trim().to_ascii_lowercase().as_str() {
            "fr" => Language::Fr,
            _ => Language::En,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

/// Look up a localized string. Returns the key itself on a miss.
pub fn translate(lang: Language, key: &str) -> &str {
    let table = match lang {
        Language::En => EN,
        Language::Fr => FR,
    };
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(key)
}

const EN: &[(&str, &str)] = &[
    ("common.error", "Error"),
    ("common.all", "All"),
    ("auth.please_log_in", "Please log in to access this page."),
    ("auth.logged_out", "Logged out successfully"),
    ("auth.login_success", "Login successful"),
    ("auth.provider_unreachable", "Could not reach the identity provider, try again later"),
    ("dashboard.title", "Dashboard"),
    ("dashboard.search", "Search"),
    ("dashboard.status", "Status"),
    ("dashboard.send", "Send"),
    ("dashboard.view", "View"),
    ("dashboard.send_success", "Invoice sent successfully"),
    ("dashboard.send_error", "Error sending invoice"),
    ("dashboard.fetch_error", "Could not refresh invoices, showing last known list"),
    ("dashboard.confirm_send", "Send this invoice to the client?"),
    ("invoice.created", "Invoice created"),
    ("invoice.upload_pdf_only", "Only PDF files can be uploaded"),
    ("siren.invalid", "Unknown SIREN identifier"),
    ("siren.incorrect_format", "SIREN must be exactly 9 digits"),
    ("siren.verification_error", "Could not verify the SIREN, try again later"),
];

const FR: &[(&str, &str)] = &[
    ("common.error", "Erreur"),
    ("common.all", "Tous"),
    ("auth.please_log_in", "Veuillez vous connecter pour accéder à cette page."),
    ("auth.logged_out", "Déconnexion réussie"),
    ("auth.login_success", "Connexion réussie"),
    ("auth.provider_unreachable", "Impossible de joindre le fournisseur d'identité, réessayez plus tard"),
    ("dashboard.title", "Tableau de bord"),
    ("dashboard.search", "Rechercher"),
    ("dashboard.status", "Statut"),
    ("dashboard.send", "Envoyer"),
    ("dashboard.view", "Voir"),
    ("dashboard.send_success", "Facture envoyée avec succès"),
    ("dashboard.send_error", "Erreur lors de l'envoi de la facture"),
    ("dashboard.fetch_error", "Impossible de rafraîchir les factures, dernière liste connue affichée"),
    ("dashboard.confirm_send", "Envoyer cette facture au client ?"),
    ("invoice.created", "Facture créée"),
    ("invoice.upload_pdf_only", "Seuls les fichiers PDF peuvent être importés"),
    ("siren.invalid", "SIREN invalide"),
    ("siren.incorrect_format", "Format du SIREN incorrect"),
    ("siren.verification_error", "Erreur lors de la vérification du SIREN"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_resolve_per_language() {
        assert_eq!(translate(Language::En, "dashboard.title"), "Dashboard");
        assert_eq!(translate(Language::Fr, "dashboard.title"), "Tableau de bord");
        assert_eq!(
            translate(Language::Fr, "siren.incorrect_format"),
            "Format du SIREN incorrect"
        );
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        assert_eq!(translate(Language::En, "dashboard.nope"), "dashboard.nope");
        assert_eq!(translate(Language::Fr, ""), "");
    }

    #[test]
    fn test_language_parse_fallback() {
        assert_eq!(Language::parse("fr"), Language::Fr);
        assert_eq!(Language::parse("FR "), Language::Fr);
        assert_eq!(Language::parse("en"), Language::En);
        assert_eq!(Language::parse("de"), Language::En);
        assert_eq!(Language::parse(""), Language::En);
    }

    #[test]
    fn test_tables_cover_the_same_keys() {
        for (key, _) in EN {
            assert!(
                FR.iter().any(|(k, _)| k == key),
                "missing French entry for {}",
                key
            );
        }
        assert_eq!(EN.len(), FR.len());
    }
}

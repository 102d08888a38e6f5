//! Offline chat replies picked by keyword.

use crate::models::ChatCategory;

const WATER_KEYWORDS: &[&str] = &["wasser", "trinken", "water", "drink"];
const RECIPE_KEYWORDS: &[&str] = &["rezept", "kochen", "recipe", "mahlzeit"];
const WEIGHT_KEYWORDS: &[&str] = &["gewicht", "abnehmen", "weight", "kilo"];

const WATER_RESPONSE: &str = "Trinke über den Tag verteilt etwa 2 bis 3 Liter Wasser, \
    am besten ein Glas zu jeder Mahlzeit. Zehn Gläser am Tag sind ein gutes Ziel!";
const RECIPE_RESPONSE: &str = "Wie wäre es mit einer leichten Gemüsesuppe mit Ingwer und \
    Knoblauch? Viel Gemüse, mageres Eiweiß und wenig Zucker halten dich lange satt.";
const WEIGHT_RESPONSE: &str = "Gesundes Abnehmen braucht Geduld: 0,5 bis 1 kg pro Woche \
    sind realistisch. Wiege dich möglichst jeden Morgen zur gleichen Zeit.";
const GENERIC_RESPONSE: &str = "Danke für deine Nachricht! Ich bin offline, helfe dir \
    aber gern bei Fragen zu Wasser, Rezepten oder deinem Gewicht.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Water,
    Recipe,
    Weight,
    General,
}

fn topic(message: &str) -> Topic {
    let lower = message.to_lowercase();
    let hit = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if hit(WATER_KEYWORDS) {
        Topic::Water
    } else if hit(RECIPE_KEYWORDS) {
        Topic::Recipe
    } else if hit(WEIGHT_KEYWORDS) {
        Topic::Weight
    } else {
        Topic::General
    }
}

/// Canned reply for `message`. Water keywords win over recipe keywords,
/// which win over weight keywords.
#[must_use]
pub fn respond(message: &str) -> &'static str {
    match topic(message) {
        Topic::Water => WATER_RESPONSE,
        Topic::Recipe => RECIPE_RESPONSE,
        Topic::Weight => WEIGHT_RESPONSE,
        Topic::General => GENERIC_RESPONSE,
    }
}

/// Category to file a reply under when the user saves it.
#[must_use]
pub fn suggest_category(message: &str) -> ChatCategory {
    match topic(message) {
        Topic::Water => ChatCategory::Gesundheitstipps,
        Topic::Recipe => ChatCategory::Rezepte,
        Topic::Weight => ChatCategory::Motivation,
        Topic::General => ChatCategory::Allgemein,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_question() {
        assert_eq!(respond("Wie viel Wasser soll ich trinken?"), WATER_RESPONSE);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(respond("REZEPT bitte"), RECIPE_RESPONSE);
        assert_eq!(respond("Mein GEWICHT stagniert"), WEIGHT_RESPONSE);
    }

    #[test]
    fn test_first_match_wins() {
        // water beats weight
        assert_eq!(respond("Hilft Wasser beim Abnehmen?"), WATER_RESPONSE);
        assert_eq!(respond("Rezept zum Abnehmen"), RECIPE_RESPONSE);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(respond("Hallo!"), GENERIC_RESPONSE);
        assert_eq!(respond(""), GENERIC_RESPONSE);
    }

    #[test]
    fn test_suggest_category() {
        assert_eq!(suggest_category("Ein Rezept?"), ChatCategory::Rezepte);
        assert_eq!(suggest_category("Hallo"), ChatCategory::Allgemein);
    }
}

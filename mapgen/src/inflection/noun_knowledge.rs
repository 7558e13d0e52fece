//! Hardcoded plural knowledge
//!
//! Regular suffix stripping gets these wrong, so they are looked up before any rule runs.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Plural to singular for nouns that regular rules would mangle
pub static IRREGULAR_SINGULARS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();

        // ===== Vowel mutation =====
        map.insert("teeth", "tooth");
        map.insert("feet", "foot");
        map.insert("geese", "goose");
        map.insert("mice", "mouse");
        map.insert("lice", "louse");
        map.insert("men", "man");
        map.insert("women", "woman");

        // ===== -en plurals =====
        map.insert("children", "child");
        map.insert("oxen", "ox");

        // ===== Suppletive =====
        map.insert("people", "person");
        map.insert("dice", "die");

        // ===== Latin / Greek =====
        map.insert("criteria", "criterion");
        map.insert("phenomena", "phenomenon");
        map.insert("data", "datum");
        map.insert("media", "medium");
        map.insert("indices", "index");
        map.insert("matrices", "matrix");
        map.insert("vertices", "vertex");
        map.insert("appendices", "appendix");
        map.insert("analyses", "analysis");
        map.insert("axes", "axis");
        map.insert("bases", "basis");
        map.insert("crises", "crisis");
        map.insert("theses", "thesis");
        map.insert("diagnoses", "diagnosis");
        map.insert("cacti", "cactus");
        map.insert("fungi", "fungus");
        map.insert("radii", "radius");
        map.insert("alumni", "alumnus");

        // ===== -ves plurals that do not follow f/fe =====
        map.insert("lives", "life");
        map.insert("knives", "knife");
        map.insert("wives", "wife");

        // ===== -ses words that keep their final s =====
        map.insert("statuses", "status");
        map.insert("aliases", "alias");
        map.insert("buses", "bus");
        map.insert("addresses", "address");
        map.insert("quizzes", "quiz");

        // ===== -oes =====
        map.insert("heroes", "hero");
        map.insert("potatoes", "potato");
        map.insert("tomatoes", "tomato");

        // ===== Invariant =====
        map.insert("series", "series");
        map.insert("species", "species");
        map.insert("news", "news");
        map.insert("sheep", "sheep");
        map.insert("fish", "fish");
        map.insert("deer", "deer");
        map.insert("moose", "moose");

        map
    });

/// Regular suffix rules, tried in order; every applicable rule contributes a candidate
///
/// Each entry is `(plural suffix, singular replacement)`.
pub const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("ves", "f"),
    ("ves", "fe"),
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("zes", "z"),
    ("oes", "o"),
    ("s", ""),
    ("ses", "s"),
];

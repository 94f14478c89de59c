//! Word lists for generated titles and author names

use rand::seq::SliceRandom;
use rand::Rng;

const TITLE_WORDS: &[&str] = &[
    "amber", "ancient", "ash", "autumn", "bitter", "black", "broken", "burning", "city", "clock",
    "cold", "crown", "dark", "dawn", "desert", "distant", "dream", "dust", "echo", "empire",
    "empty", "fall", "feather", "fire", "forest", "forgotten", "garden", "ghost", "glass",
    "golden", "harbor", "heart", "hidden", "hollow", "house", "hunger", "iron", "island",
    "last", "light", "long", "lost", "machine", "map", "memory", "midnight", "mirror", "moon",
    "mountain", "night", "north", "ocean", "paper", "quiet", "rain", "red", "river", "road",
    "salt", "secret", "shadow", "silent", "silver", "sky", "small", "song", "star", "stone",
    "storm", "summer", "sun", "thief", "thread", "tide", "tower", "valley", "velvet", "war",
    "water", "white", "wild", "wind", "winter", "wolf", "world",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Beatrix", "Carmen", "Chidi", "Dmitri", "Edith", "Elif", "Farah", "Gustav",
    "Hana", "Ines", "Isaac", "Jonas", "Kaveh", "Leila", "Lucia", "Mateo", "Mina", "Nadia",
    "Oskar", "Priya", "Quentin", "Rosa", "Sven", "Tamsin", "Ugo", "Vera", "Wen", "Yusuf",
    "Zora",
];

const LAST_NAMES: &[&str] = &[
    "Abara", "Bergstrom", "Castillo", "Dubois", "Eriksen", "Fontaine", "Garcia", "Haddad",
    "Ishikawa", "Jansen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov",
    "Quinn", "Rossi", "Sato", "Tanaka", "Umarov", "Varga", "Weber", "Xu", "Yilmaz", "Zhang",
];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &'a [&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

/// Three random words, first letter capitalised
pub fn title<R: Rng + ?Sized>(rng: &mut R) -> String {
    let words: Vec<&str> = (0..3).map(|_| pick(rng, TITLE_WORDS)).collect();
    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => sentence,
    }
}

/// A "First Last" name
pub fn author_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

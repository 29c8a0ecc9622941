//! Human-readable tenant slugs, e.g. `calm-ocean-4821`.

use rand::Rng;

/// Collisions tolerated before provisioning gives up.
pub const MAX_SLUG_ATTEMPTS: u32 = 10;

const SHORT_WORDS: &[&str] = &[
    "big", "new", "old", "hot", "red", "top", "far", "fun", "sky", "sun", "bold", "calm", "cool",
    "dark", "deep", "easy", "fair", "fast", "fine", "free", "full", "good", "gray", "hard",
    "high", "kind", "last", "lazy", "long", "loud", "near", "next", "nice", "pink", "pure",
    "rare", "real", "rich", "safe", "slow", "soft", "tall", "thin", "tidy", "tiny", "true",
    "vast", "warm", "wild", "wise", "able", "airy", "bare", "blue", "busy", "cold", "cozy",
    "epic", "firm", "flat", "fond", "glad", "gold", "keen", "lean", "mild", "neat", "open",
    "pale", "ripe", "tame", "teal", "jade", "iron", "lime", "lake", "leaf", "glow", "halo",
    "hero", "kite", "lava", "loft", "dusk", "foam", "gust", "fawn", "clay",
];

const MEDIUM_WORDS: &[&str] = &[
    "amber", "beach", "brave", "bread", "chair", "charm", "chess", "clear", "crown", "dance",
    "dream", "eagle", "flame", "frost", "glass", "grace", "grape", "green", "happy", "heart",
    "honey", "horse", "house", "light", "maple", "merit", "metal", "music", "noble", "ocean",
    "olive", "peace", "pearl", "piano", "plant", "queen", "quick", "quiet", "river", "royal",
    "smart", "space", "spark", "storm", "sweet", "swift", "tiger", "trust", "unity", "urban",
    "value", "water", "whale", "world", "alpha", "angel", "apple", "arena", "arrow", "atlas",
    "audio", "award", "badge", "baker", "basin", "beast", "bench", "berry", "blade", "blaze",
    "bloom", "board", "bonus", "boost", "brass", "brick", "brook", "brush", "build", "cabin",
    "camel", "canal", "candy", "cargo", "cedar", "chain", "chief", "cider", "civic", "cloud",
    "coral", "crane", "delta", "ember", "fable", "flint", "field", "forge", "grove", "haven",
];

/// Picks one short word, one medium word and a number in `1000..=9999`,
/// uniformly from each set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugGenerator;

impl SlugGenerator {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let short = SHORT_WORDS[rng.gen_range(0..SHORT_WORDS.len())];
        let medium = MEDIUM_WORDS[rng.gen_range(0..MEDIUM_WORDS.len())];
        let number: u32 = rng.gen_range(1000..=9999);
        format!("{}-{}-{}", short, medium, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn slug_has_word_word_number_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let slug = SlugGenerator.generate(&mut rng);
            let parts: Vec<&str> = slug.split('-').collect();
            assert_eq!(parts.len(), 3, "slug {}", slug);
            assert!(SHORT_WORDS.contains(&parts[0]));
            assert!(MEDIUM_WORDS.contains(&parts[1]));
            let number: u32 = parts[2].parse().expect("numeric suffix");
            assert!((1000..=9999).contains(&number));
        }
    }

    #[test]
    fn same_seed_gives_same_slug() {
        let a = SlugGenerator.generate(&mut StdRng::seed_from_u64(42));
        let b = SlugGenerator.generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn short_words_are_shorter_than_medium_words() {
        assert!(SHORT_WORDS.iter().all(|w| (3..=4).contains(&w.len())));
        assert!(MEDIUM_WORDS.iter().all(|w| w.len() == 5));
    }

    #[test]
    fn word_lists_contain_no_separator() {
        assert!(SHORT_WORDS
            .iter()
            .chain(MEDIUM_WORDS)
            .all(|w| !w.is_empty() && !w.contains('-')));
    }
}

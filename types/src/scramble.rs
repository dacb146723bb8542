use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};

/// One draggable piece of an answer: a character of an idiom or a word of a sentence.
pub type Tile = String;

const SHUFFLE_ATTEMPTS: usize = 8;

/// Splits an idiom into one tile per character.
pub fn idiom_tiles(characters: &str) -> Vec<Tile> {
    characters
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(String::from)
        .collect()
}

/// Returns the tiles in an order different from the answer whenever that is
/// possible, i.e. whenever at least two tiles differ.
pub fn scramble_tiles<R: Rng + ?Sized>(tiles: &[Tile], rng: &mut R) -> Vec<Tile> {
    let mut scrambled = tiles.to_vec();
    if tiles.iter().unique().count() < 2 {
        return scrambled;
    }
    for _ in 0..SHUFFLE_ATTEMPTS {
        scrambled.shuffle(rng);
        if scrambled != tiles {
            return scrambled;
        }
    }
    // rotating a sequence with two distinct tiles always changes it
    log::debug!("Shuffle kept matching the answer, rotating instead");
    scrambled.rotate_left(1);
    scrambled
}

pub fn is_correct(expected: &[Tile], submitted: &[Tile]) -> bool {
    expected.len() == submitted.len()
        && expected
            .iter()
            .zip(submitted)
            .all(|(want, got)| want.as_str() == got.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn tiles(items: &[&str]) -> Vec<Tile> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_idiom_tiles_split_characters() {
        assert_eq!(idiom_tiles("画蛇添足"), tiles(&["画", "蛇", "添", "足"]));
        assert_eq!(idiom_tiles(" 一心 一意"), tiles(&["一", "心", "一", "意"]));
    }

    #[test]
    fn test_scramble_is_a_permutation_that_differs() {
        let answer = tiles(&["我", "每天", "早上", "喝", "茶"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let scrambled = scramble_tiles(&answer, &mut rng);
            assert_ne!(scrambled, answer);
            assert_eq!(
                scrambled.iter().sorted().collect_vec(),
                answer.iter().sorted().collect_vec()
            );
        }
    }

    #[test]
    fn test_two_tiles_always_swap() {
        let answer = tiles(&["你", "好"]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(scramble_tiles(&answer, &mut rng), tiles(&["好", "你"]));
        }
    }

    #[test]
    fn test_uniform_tiles_cannot_change() {
        let answer = tiles(&["人", "人"]);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(scramble_tiles(&answer, &mut rng), answer);
    }

    #[test]
    fn test_is_correct_requires_exact_order() {
        let answer = tiles(&["画", "蛇", "添", "足"]);
        assert!(is_correct(&answer, &tiles(&["画", "蛇", " 添", "足"])));
        assert!(!is_correct(&answer, &tiles(&["蛇", "画", "添", "足"])));
        assert!(!is_correct(&answer, &tiles(&["画", "蛇", "添"])));
    }
}

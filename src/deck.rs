use std::{collections::HashSet, path::PathBuf};

use rand::{seq::SliceRandom, Rng};

/// Give up looking for an unseen combination after this many draws and accept a
/// repeated card instead.
const MAX_DRAW_ATTEMPTS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("a card needs {needed} unique images, but only {available} are available")]
    NotEnoughImages { needed: usize, available: usize },
}

/// One bingo card: which images it holds, in cell order.
#[derive(Clone, Debug)]
pub struct Card {
    /// 1-based, also the page/file number of the rendered card.
    pub number: usize,
    pub images: Vec<PathBuf>,
}

/// Draws `num_cards` combinations of `per_card` distinct images each. No two
/// cards hold the same set of images, unless the draw cap is hit, and each
/// card's cell order is shuffled.
pub fn deal<R>(
    rng: &mut R,
    images: &[PathBuf],
    per_card: usize,
    num_cards: usize,
) -> Result<Vec<Card>, DeckError>
where
    R: Rng + ?Sized,
{
    if images.len() < per_card {
        return Err(DeckError::NotEnoughImages {
            needed: per_card,
            available: images.len(),
        });
    }

    let mut seen: HashSet<Vec<PathBuf>> = HashSet::new();
    let mut cards = Vec::with_capacity(num_cards);

    for number in 1..=num_cards {
        let mut chosen: Vec<PathBuf>;
        let mut attempts = 0;
        loop {
            chosen = images
                .choose_multiple(rng, per_card)
                .cloned()
                .collect();

            let mut key = chosen.clone();
            key.sort();
            if seen.insert(key) {
                break;
            }

            attempts += 1;
            if attempts >= MAX_DRAW_ATTEMPTS {
                log::warn!(
                    "Card {number}: no unseen combination after {MAX_DRAW_ATTEMPTS} \
                     draws, accepting a repeat"
                );
                break;
            }
        }

        chosen.shuffle(rng);
        cards.push(Card { number, images: chosen });

        if number % 10 == 0 {
            log::debug!("Dealt {number}/{num_cards} cards");
        }
    }

    Ok(cards)
}

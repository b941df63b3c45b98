//! Card image lookup.
//!
//! Every card resolves to an ordered list of image URLs. A viewer tries them
//! in order; the list always ends in the card back, so there is always
//! something to show.

use duelview_domain::CardFace;

pub const BACK_IMAGE: &str = "000.png";
pub const BACK_IMAGE_FALLBACK: &str = "000_WinterlandDeathDeck_Back.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardArt {
    img_base: String,
}

impl CardArt {
    pub fn new(img_base: impl Into<String>) -> Self {
        Self {
            img_base: img_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn image(&self, file: &str) -> String {
        format!("{}/{file}", self.img_base)
    }

    pub fn back_images(&self) -> Vec<String> {
        vec![self.image(BACK_IMAGE), self.image(BACK_IMAGE_FALLBACK)]
    }

    /// Image candidates for a card, most specific first.
    pub fn images_for(&self, face: CardFace) -> Vec<String> {
        match face {
            CardFace::Up(identity) => {
                let mut images = vec![self.image(&format!("{}.png", identity.code()))];
                images.extend(self.back_images());
                images
            }
            CardFace::Down | CardFace::Unresolved => self.back_images(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelview_domain::CardIdentity;

    #[test]
    fn face_up_card_falls_back_to_backs() {
        let art = CardArt::new("images/cards/");
        let id = CardIdentity::extract("7 - Frost Golem").unwrap();
        assert_eq!(
            art.images_for(CardFace::Up(id)),
            vec![
                "images/cards/007.png",
                "images/cards/000.png",
                "images/cards/000_WinterlandDeathDeck_Back.png",
            ]
        );
    }

    #[test]
    fn hidden_and_unknown_cards_use_backs_only() {
        let art = CardArt::new("https://cdn.example.com/cards");
        let backs = art.back_images();
        assert_eq!(art.images_for(CardFace::Down), backs);
        assert_eq!(art.images_for(CardFace::Unresolved), backs);
        assert_eq!(
            backs.last().map(String::as_str),
            Some("https://cdn.example.com/cards/000_WinterlandDeathDeck_Back.png")
        );
    }
}

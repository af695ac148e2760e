use std::collections::HashSet;

use ax_query::{Candidate, Element, ElementInfo, Point, Size};
use tracing::debug;

use crate::{Error, Result};

/// Longest label the generator produces.
pub const MAX_LABEL_LEN: u32 = 3;

/// Alphabet used when configuration does not name one.
pub const DEFAULT_ALPHABET: &str = "asdfghjkl";

/// A labelled candidate.
#[derive(Debug, Clone)]
pub struct Hint {
    /// Upper-case label typed to select the hint.
    pub label: String,
    /// Target element.
    pub element: Element,
    /// Snapshot of the target taken when candidates were collected.
    pub info: ElementInfo,
    /// Where the label is drawn: the centre of the element.
    pub anchor: Point,
    /// Size of the target.
    pub size: Size,
}

/// Assigns labels to candidates.
///
/// Every label in one batch has the same length, so no label is a prefix of
/// another and a full label always resolves on its last keystroke.
#[derive(Debug, Clone)]
pub struct HintGenerator {
    alphabet: Vec<char>,
}

impl Default for HintGenerator {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.chars().map(|c| c.to_ascii_uppercase()).collect(),
        }
    }
}

impl HintGenerator {
    /// Generator over `characters`. Case is ignored; at least two distinct
    /// characters are required.
    pub fn new(characters: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut alphabet = Vec::new();
        for c in characters.chars().flat_map(char::to_uppercase) {
            if c.is_whitespace() {
                return Err(Error::Alphabet("whitespace is not allowed".into()));
            }
            if !seen.insert(c) {
                return Err(Error::Alphabet(format!("duplicate character {c:?}")));
            }
            alphabet.push(c);
        }
        if alphabet.len() < 2 {
            return Err(Error::Alphabet("at least two characters are required".into()));
        }
        Ok(Self { alphabet })
    }

    /// The normalised alphabet.
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Largest number of candidates that can be labelled.
    pub fn capacity(&self) -> usize {
        self.alphabet.len().saturating_pow(MAX_LABEL_LEN)
    }

    /// `count` distinct labels of uniform length, in lexicographic alphabet order.
    pub fn labels(&self, count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Err(Error::Empty);
        }
        let n = self.alphabet.len();
        let len = (1..=MAX_LABEL_LEN)
            .find(|&l| n.saturating_pow(l) >= count)
            .ok_or(Error::Capacity {
                count,
                alphabet: n,
                capacity: self.capacity(),
            })?;
        Ok((0..count).map(|i| self.label_at(i, len)).collect())
    }

    /// The `index`-th label of length `len`, most significant character first.
    fn label_at(&self, mut index: usize, len: u32) -> String {
        let n = self.alphabet.len();
        let mut out = vec![self.alphabet[0]; len as usize];
        for slot in out.iter_mut().rev() {
            *slot = self.alphabet[index % n];
            index /= n;
        }
        out.into_iter().collect()
    }

    /// Label `candidates`, ordered top-to-bottom then left-to-right.
    pub fn generate(&self, mut candidates: Vec<Candidate>) -> Result<Vec<Hint>> {
        let labels = self.labels(candidates.len())?;
        candidates.sort_by_key(|c| (c.info.position.y, c.info.position.x));
        let hints: Vec<Hint> = candidates
            .into_iter()
            .zip(labels)
            .map(|(c, label)| Hint {
                label,
                anchor: c.info.center(),
                size: c.info.size,
                element: c.element,
                info: c.info,
            })
            .collect();
        debug!("generated {} hints", hints.len());
        Ok(hints)
    }
}

#[cfg(test)]
mod tests {
    use ax_query::mock::MockElement;
    use proptest::prelude::*;

    use super::*;

    fn cand(id: u64, x: i32, y: i32) -> Candidate {
        let el = MockElement::new(id, "AXButton", (x, y, 20, 10))
            .title(&format!("e{id}"))
            .into_element();
        let info = el.info().unwrap();
        Candidate::new(el, info)
    }

    #[test]
    fn label_length_tiers() {
        let g = HintGenerator::new("asd").unwrap();
        assert_eq!(g.labels(3).unwrap(), vec!["A", "S", "D"]);
        assert_eq!(g.labels(4).unwrap()[..4], ["AA", "AS", "AD", "SA"]);
        assert_eq!(g.labels(9).unwrap().len(), 9);
        assert!(g.labels(10).unwrap().iter().all(|l| l.len() == 3));
        assert_eq!(g.capacity(), 27);
        assert_eq!(
            g.labels(28).unwrap_err(),
            Error::Capacity {
                count: 28,
                alphabet: 3,
                capacity: 27
            }
        );
        assert_eq!(g.labels(0).unwrap_err(), Error::Empty);
    }

    #[test]
    fn rejects_bad_alphabets() {
        assert!(HintGenerator::new("a").is_err());
        assert!(HintGenerator::new("aA").is_err());
        assert!(HintGenerator::new("a s").is_err());
        assert_eq!(HintGenerator::new("jk").unwrap().alphabet(), &['J', 'K']);
    }

    #[test]
    fn generate_orders_by_position_and_anchors_at_centre() {
        let g = HintGenerator::default();
        let hints = g
            .generate(vec![cand(1, 50, 100), cand(2, 10, 100), cand(3, 300, 5)])
            .unwrap();
        let order: Vec<&str> = hints.iter().map(|h| h.info.title.as_str()).collect();
        assert_eq!(order, vec!["e3", "e2", "e1"]);
        assert_eq!(hints[0].label, "A");
        assert_eq!(hints[0].anchor, Point::new(310, 10));
        assert!(g.generate(Vec::new()).is_err());
    }

    proptest! {
        #[test]
        fn labels_are_distinct_and_prefix_free(count in 1usize..=729, n in 2usize..=9) {
            let chars: String = "asdfghjkl".chars().take(n).collect();
            let g = HintGenerator::new(&chars).unwrap();
            match g.labels(count) {
                Ok(labels) => {
                    prop_assert_eq!(labels.len(), count);
                    let set: HashSet<&String> = labels.iter().collect();
                    prop_assert_eq!(set.len(), count);
                    let len = labels[0].len();
                    prop_assert!(labels.iter().all(|l| l.len() == len));
                }
                Err(e) => {
                    let is_capacity = matches!(e, Error::Capacity { .. });
                    prop_assert!(is_capacity && count > n.pow(3));
                }
            }
        }
    }
}

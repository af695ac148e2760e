use std::collections::HashSet;

use tracing::trace;

use crate::Hint;

/// Result of feeding one key to a [`HintCollection`].
#[derive(Debug, Clone)]
pub enum InputOutcome {
    /// The buffer equals one hint's full label.
    Resolved(Hint),
    /// The buffer is a proper prefix of `matching` labels.
    Filtered {
        /// Number of hints still matching.
        matching: usize,
    },
    /// No label starts with the buffer; it was cleared.
    Reset,
    /// The key is not part of the alphabet and was dropped.
    Ignored,
}

/// Labelled hints plus the typed-prefix buffer.
#[derive(Debug, Clone, Default)]
pub struct HintCollection {
    hints: Vec<Hint>,
    alphabet: HashSet<char>,
    input: String,
}

impl HintCollection {
    /// Wrap generated hints typed with `alphabet`.
    pub fn new(hints: Vec<Hint>, alphabet: &[char]) -> Self {
        let alphabet = alphabet.iter().flat_map(|c| c.to_uppercase()).collect();
        Self {
            hints,
            alphabet,
            input: String::new(),
        }
    }

    /// Every hint, in label order.
    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    /// Number of hints.
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// True when the collection holds no hints.
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Current typed prefix, upper case.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Hints whose label starts with the current prefix.
    pub fn filtered(&self) -> impl Iterator<Item = &Hint> + '_ {
        self.hints
            .iter()
            .filter(move |h| h.label.starts_with(self.input.as_str()))
    }

    /// Hint with exactly this label, compared case-insensitively.
    pub fn get(&self, label: &str) -> Option<&Hint> {
        let label = label.to_uppercase();
        self.hints.iter().find(|h| h.label == label)
    }

    /// Append `key` to the buffer and match.
    ///
    /// On resolution the buffer still holds the full label; the caller decides
    /// when to [`reset`](Self::reset).
    pub fn handle_input(&mut self, key: char) -> InputOutcome {
        let mut upper = key.to_uppercase();
        let (Some(key), None) = (upper.next(), upper.next()) else {
            return InputOutcome::Ignored;
        };
        if !self.alphabet.contains(&key) {
            return InputOutcome::Ignored;
        }
        self.input.push(key);
        self.evaluate()
    }

    /// Drop the last typed character.
    pub fn backspace(&mut self) -> InputOutcome {
        self.input.pop();
        self.evaluate()
    }

    /// Clear the buffer, keeping the hints.
    pub fn reset(&mut self) {
        self.input.clear();
    }

    fn evaluate(&mut self) -> InputOutcome {
        let mut matching = 0;
        let mut exact = None;
        for h in self.filtered() {
            matching += 1;
            if h.label == self.input {
                exact = Some(h);
            }
        }
        if let (1, Some(h)) = (matching, exact) {
            trace!("hint {} resolved", h.label);
            return InputOutcome::Resolved(h.clone());
        }
        if matching == 0 {
            trace!("no hint matches {:?}, resetting", self.input);
            self.input.clear();
            return InputOutcome::Reset;
        }
        InputOutcome::Filtered { matching }
    }
}

#[cfg(test)]
mod tests {
    use ax_query::{Candidate, mock::MockElement};

    use super::*;
    use crate::HintGenerator;

    fn collection(n: usize, alphabet: &str) -> HintCollection {
        let cands = (0..n)
            .map(|i| {
                let el = MockElement::new(i as u64, "AXButton", (i as i32 * 30, 0, 20, 20))
                    .title(&format!("e{i}"))
                    .into_element();
                let info = el.info().unwrap();
                Candidate::new(el, info)
            })
            .collect();
        let g = HintGenerator::new(alphabet).unwrap();
        HintCollection::new(g.generate(cands).unwrap(), g.alphabet())
    }

    #[test]
    fn full_label_resolves() {
        let mut c = collection(5, "asd");
        assert!(matches!(c.handle_input('s'), InputOutcome::Filtered { matching: 2 }));
        assert_eq!(c.filtered().count(), 2);
        match c.handle_input('A') {
            InputOutcome::Resolved(h) => assert_eq!(h.label, "SA"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(c.input(), "SA");
        c.reset();
        assert_eq!(c.input(), "");
        assert_eq!(c.len(), 5);
    }

    #[test]
    fn dead_end_resets_buffer() {
        let mut c = collection(5, "asd");
        c.handle_input('s');
        assert!(matches!(c.handle_input('d'), InputOutcome::Reset));
        assert_eq!(c.input(), "");
        assert_eq!(c.filtered().count(), 5);
    }

    #[test]
    fn keys_outside_alphabet_are_ignored() {
        let mut c = collection(5, "asd");
        assert!(matches!(c.handle_input('x'), InputOutcome::Ignored));
        assert!(matches!(c.handle_input('1'), InputOutcome::Ignored));
        assert_eq!(c.input(), "");
    }

    #[test]
    fn backspace_pops_one_character() {
        let mut c = collection(20, "asd");
        c.handle_input('a');
        c.handle_input('s');
        assert_eq!(c.input(), "AS");
        assert!(matches!(c.backspace(), InputOutcome::Filtered { matching: 9 }));
        assert_eq!(c.input(), "A");
        c.backspace();
        assert!(matches!(c.backspace(), InputOutcome::Filtered { matching: 20 }));
    }

    #[test]
    fn single_character_labels() {
        let mut c = collection(2, "jk");
        assert!(matches!(c.handle_input('k'), InputOutcome::Resolved(ref h) if h.info.title == "e1"));
        assert!(c.get("j").is_some());
        let mut c = collection(2, "jkl");
        assert!(matches!(c.handle_input('l'), InputOutcome::Reset));
    }
}

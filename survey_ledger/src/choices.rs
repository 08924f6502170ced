use log::debug;

use crate::config::{Choice, RankedChoice};

/// Turns the display text of a choice into its identifier.
///
/// The text is lowercased, spaces become hyphens and the characters `.`, `:`,
/// `?` and `!` are dropped. Nothing else is changed: apostrophes, commas and
/// non-ascii letters are kept as they are.
///
/// ```
/// use survey_ledger::normalize;
///
/// assert_eq!(normalize("Option A?"), "option-a");
/// assert_eq!(normalize("I don't know."), "i-don't-know");
/// ```
pub fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '.' | ':' | '?' | '!'))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// The candidate answers of one question, in display order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ChoiceSet {
    choices: Vec<Choice>,
}

impl ChoiceSet {
    pub fn new(choices: Vec<Choice>) -> ChoiceSet {
        ChoiceSet { choices }
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Finds the choice whose identifier is exactly `identifier`.
    ///
    /// The identifier is not normalized again: it is expected to come from a
    /// form value that was itself built with [normalize].
    pub fn find_by_identifier(&self, identifier: &str) -> Option<&Choice> {
        self.position(identifier).map(|idx| &self.choices[idx])
    }

    pub(crate) fn position(&self, identifier: &str) -> Option<usize> {
        self.choices
            .iter()
            .position(|ch| ch.identifier() == identifier)
    }

    /// The index of the choice currently supported by this voter.
    pub(crate) fn position_of_voter(&self, voter: &str) -> Option<usize> {
        self.choices
            .iter()
            .position(|ch| ch.voters.iter().any(|v| v == voter))
    }

    pub(crate) fn support(&mut self, idx: usize, voter: &str) {
        let choice = &mut self.choices[idx];
        if !choice.voters.iter().any(|v| v == voter) {
            choice.voters.push(voter.to_string());
        }
    }

    pub(crate) fn push(&mut self, choice: Choice) {
        self.choices.push(choice);
    }

    /// Takes the voter out of the first choice that lists them.
    ///
    /// When `drop_empty` is set and the choice has no supporter left, the
    /// choice itself is deleted. Returns the label of the choice the voter left.
    pub(crate) fn withdraw(&mut self, voter: &str, drop_empty: bool) -> Option<String> {
        let idx = self.position_of_voter(voter)?;
        let choice = &mut self.choices[idx];
        choice.voters.retain(|v| v != voter);
        let label = choice.label.clone();
        if drop_empty && choice.voters.is_empty() {
            debug!("withdraw: dropping choice {:?}, no supporter left", label);
            self.choices.remove(idx);
        }
        Some(label)
    }

    /// The number of answers over all the choices.
    pub fn total_votes(&self) -> usize {
        self.choices.iter().map(|ch| ch.voters.len()).sum()
    }

    /// The choices sorted by decreasing number of voters, with their share of
    /// the answers in percent.
    ///
    /// Choices with the same number of voters keep their display order. When
    /// nobody answered, every percentage is 0. The set itself is not modified.
    pub fn ranked_snapshot(&self) -> Vec<RankedChoice> {
        let total = self.total_votes();
        let mut ranked: Vec<RankedChoice> = self
            .choices
            .iter()
            .map(|ch| RankedChoice {
                label: ch.label.clone(),
                voter_count: ch.voters.len(),
                percentage: if total > 0 {
                    100.0 * ch.voters.len() as f64 / total as f64
                } else {
                    0.0
                },
            })
            .collect();
        // sort_by is stable, ties keep the display order.
        ranked.sort_by(|a, b| b.voter_count.cmp(&a.voter_count));
        ranked
    }
}

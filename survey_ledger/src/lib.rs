pub mod builder;
mod choices;
mod config;
pub mod manual;
mod shared;

use log::{debug, info, warn};

use std::collections::{BTreeSet, HashSet};

pub use crate::choices::{normalize, ChoiceSet};
pub use crate::config::*;
pub use crate::shared::SharedSurvey;

/// One survey question and the answers given to it so far.
///
/// Every voter holds at most one answer per question. Giving a new answer
/// replaces the previous one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Question {
    number: usize,
    prompt: String,
    kind: QuestionKind,
    // The voters that currently hold an answer.
    voters: BTreeSet<String>,
    choices: ChoiceSet,
}

impl Question {
    /// A question without any answer yet. Free-text questions ignore `options`.
    pub fn new(number: usize, prompt: &str, kind: QuestionKind, options: &[String]) -> Question {
        let choices = match kind {
            QuestionKind::SingleChoice => options.iter().map(|o| Choice::new(o)).collect(),
            QuestionKind::FreeText => Vec::new(),
        };
        Question {
            number,
            prompt: prompt.to_string(),
            kind,
            voters: BTreeSet::new(),
            choices: ChoiceSet::new(choices),
        }
    }

    /// Rebuilds a question from saved choices.
    ///
    /// The set of voters is derived from the choices. Fails if a voter
    /// supports several choices or if two choices share an identifier.
    /// Free text choices without any supporter are dropped.
    pub fn from_choices(
        number: usize,
        prompt: &str,
        kind: QuestionKind,
        choices: Vec<Choice>,
    ) -> Result<Question, LedgerErrors> {
        let choices: Vec<Choice> = choices
            .into_iter()
            .filter(|ch| {
                let keep = !kind.is_free_text() || !ch.voters.is_empty();
                if !keep {
                    debug!(
                        "from_choices: question {}: dropping unsupported choice {:?}",
                        number, ch.label
                    );
                }
                keep
            })
            .collect();
        let mut voters: BTreeSet<String> = BTreeSet::new();
        let mut identifiers: HashSet<String> = HashSet::new();
        for ch in choices.iter() {
            if !identifiers.insert(ch.identifier()) {
                return Err(LedgerErrors::IdentifierCollision {
                    question: number,
                    identifier: ch.identifier(),
                });
            }
            for v in ch.voters.iter() {
                if !voters.insert(v.clone()) {
                    return Err(LedgerErrors::SnapshotMismatch(format!(
                        "question {}: voter {:?} holds several answers",
                        number, v
                    )));
                }
            }
        }
        Ok(Question {
            number,
            prompt: prompt.to_string(),
            kind,
            voters,
            choices: ChoiceSet::new(choices),
        })
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn choices(&self) -> &ChoiceSet {
        &self.choices
    }

    pub fn voters(&self) -> impl Iterator<Item = &String> {
        self.voters.iter()
    }

    pub fn has_answered(&self, voter: &str) -> bool {
        self.voters.contains(voter)
    }

    /// The choice this voter currently supports, if any.
    pub fn answer_of(&self, voter: &str) -> Option<&Choice> {
        self.choices
            .position_of_voter(voter)
            .map(|idx| &self.choices.choices()[idx])
    }

    /// Records the answer of a voter, replacing any previous answer.
    ///
    /// `answer` is compared with the identifiers of the existing choices. For
    /// a single choice question, an answer that matches no option is dropped
    /// and the voter is left without an answer. For a free-text question, an
    /// unknown answer becomes a new choice, unless it normalizes to the
    /// identifier of an existing choice, in which case it counts for that one.
    pub fn add(&mut self, answer: &str, voter: &str) -> AddOutcome {
        if self.has_answered(voter) {
            debug!(
                "add: question {}: {} already answered, replacing",
                self.number, voter
            );
            self.remove(voter);
        }

        if let Some(idx) = self.choices.position(answer) {
            self.record(idx, voter);
            return AddOutcome::Recorded;
        }

        if !self.kind.is_free_text() {
            warn!(
                "add: question {}: answer {:?} of {} matches no option, ignored",
                self.number, answer, voter
            );
            return AddOutcome::Ignored;
        }

        // Another spelling of an existing answer.
        let identifier = normalize(answer);
        if let Some(idx) = self.choices.position(&identifier) {
            debug!(
                "add: question {}: {:?} merged into choice {:?}",
                self.number,
                answer,
                self.choices.choices()[idx].label
            );
            self.record(idx, voter);
            return AddOutcome::Recorded;
        }

        debug!(
            "add: question {}: new choice {:?} from {}",
            self.number, answer, voter
        );
        self.choices.push(Choice {
            label: answer.to_string(),
            voters: vec![voter.to_string()],
        });
        self.voters.insert(voter.to_string());
        AddOutcome::Created
    }

    fn record(&mut self, idx: usize, voter: &str) {
        self.choices.support(idx, voter);
        self.voters.insert(voter.to_string());
        debug!(
            "add: question {}: {} -> {:?}",
            self.number,
            voter,
            self.choices.choices()[idx].label
        );
    }

    /// Withdraws the answer of a voter. Does nothing if there is none.
    ///
    /// A free-text choice is deleted together with its last supporter.
    pub fn remove(&mut self, voter: &str) {
        let left = self.choices.withdraw(voter, self.kind.is_free_text());
        self.voters.remove(voter);
        match left {
            Some(label) => debug!(
                "remove: question {}: {} withdrew from {:?}",
                self.number, voter, label
            ),
            None => debug!("remove: question {}: {} had no answer", self.number, voter),
        }
    }

    pub fn report(&self) -> QuestionReport {
        QuestionReport {
            number: self.number,
            prompt: self.prompt.clone(),
            kind: self.kind,
            total_votes: self.choices.total_votes(),
            ranking: self.choices.ranked_snapshot(),
        }
    }
}

/// All the questions of a survey, numbered from 1.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Survey {
    questions: Vec<Question>,
}

impl Survey {
    /// Wraps a list of questions. Question `i` (starting at 0) must carry the number `i + 1`.
    pub fn new(questions: Vec<Question>) -> Result<Survey, LedgerErrors> {
        if questions.is_empty() {
            return Err(LedgerErrors::EmptySurvey);
        }
        for (idx, q) in questions.iter().enumerate() {
            if q.number != idx + 1 {
                return Err(LedgerErrors::SnapshotMismatch(format!(
                    "question at position {} is numbered {}",
                    idx + 1,
                    q.number
                )));
            }
        }
        Ok(Survey { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The number of the last question. The first one is always 1.
    pub fn last_number(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, number: usize) -> Result<&Question, LedgerErrors> {
        match number {
            0 => Err(LedgerErrors::QuestionNotFound(number)),
            n => self
                .questions
                .get(n - 1)
                .ok_or(LedgerErrors::QuestionNotFound(number)),
        }
    }

    pub fn question_mut(&mut self, number: usize) -> Result<&mut Question, LedgerErrors> {
        match number {
            0 => Err(LedgerErrors::QuestionNotFound(number)),
            n => self
                .questions
                .get_mut(n - 1)
                .ok_or(LedgerErrors::QuestionNotFound(number)),
        }
    }

    /// Handles a submitted answer.
    ///
    /// A missing or empty answer means that the voter skipped the question:
    /// the ledger is left untouched, including any earlier answer, and `None`
    /// is returned.
    pub fn answer(
        &mut self,
        number: usize,
        answer: Option<&str>,
        voter: &str,
    ) -> Result<Option<AddOutcome>, LedgerErrors> {
        let question = self.question_mut(number)?;
        match answer {
            Some(a) if !a.is_empty() => Ok(Some(question.add(a, voter))),
            _ => {
                debug!("answer: {} skipped question {}", voter, number);
                Ok(None)
            }
        }
    }

    pub fn withdraw(&mut self, number: usize, voter: &str) -> Result<(), LedgerErrors> {
        self.question_mut(number)?.remove(voter);
        Ok(())
    }

    /// The ranked answers of every question, in question order.
    pub fn report(&self) -> Vec<QuestionReport> {
        let res: Vec<QuestionReport> = self.questions.iter().map(|q| q.report()).collect();
        info!("report: {} questions", res.len());
        res
    }

    /// Replaces the answers with the ones of a saved copy of the same survey.
    ///
    /// The saved questions must have the same numbers, prompts and kinds, and
    /// single choice questions must still offer the same options.
    pub fn restore(&mut self, saved: Vec<Question>) -> Result<(), LedgerErrors> {
        if saved.len() != self.questions.len() {
            return Err(LedgerErrors::SnapshotMismatch(format!(
                "{} saved questions, {} defined",
                saved.len(),
                self.questions.len()
            )));
        }
        for (current, old) in self.questions.iter().zip(saved.iter()) {
            if current.number != old.number
                || current.prompt != old.prompt
                || current.kind != old.kind
            {
                return Err(LedgerErrors::SnapshotMismatch(format!(
                    "question {} differs from the saved question {} ({:?})",
                    current.number, old.number, old.prompt
                )));
            }
            if current.kind == QuestionKind::SingleChoice {
                let labels = |q: &Question| -> Vec<String> {
                    q.choices.choices().iter().map(|c| c.label.clone()).collect()
                };
                if labels(current) != labels(old) {
                    return Err(LedgerErrors::SnapshotMismatch(format!(
                        "question {}: the options changed",
                        current.number
                    )));
                }
            }
        }
        self.questions = saved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SurveyBuilder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn yes_no() -> Question {
        Question::new(
            1,
            "Coffee?",
            QuestionKind::SingleChoice,
            &["Yes!".to_string(), "No.".to_string()],
        )
    }

    fn free() -> Question {
        Question::new(2, "Best teacher?", QuestionKind::FreeText, &[])
    }

    fn supporters(q: &Question) -> Vec<(String, Vec<String>)> {
        q.choices()
            .choices()
            .iter()
            .map(|c| (c.label.clone(), c.voters.clone()))
            .collect()
    }

    #[test]
    fn revote_keeps_one_answer() {
        init();
        let mut q = yes_no();
        assert_eq!(q.add("yes", "anna"), AddOutcome::Recorded);
        assert_eq!(q.add("no", "anna"), AddOutcome::Recorded);
        assert_eq!(
            supporters(&q),
            vec![
                ("Yes!".to_string(), vec![]),
                ("No.".to_string(), vec!["anna".to_string()])
            ]
        );
        assert_eq!(q.voters().count(), 1);
        assert_eq!(q.answer_of("anna").map(|c| c.label.as_str()), Some("No."));
    }

    #[test]
    fn revote_same_answer_is_idempotent() {
        init();
        let mut q = yes_no();
        q.add("yes", "anna");
        q.add("yes", "anna");
        assert_eq!(q.choices().choices()[0].voters, vec!["anna".to_string()]);
        assert_eq!(q.voters().count(), 1);
    }

    #[test]
    fn revote_to_unknown_option_leaves_no_answer() {
        init();
        let mut q = yes_no();
        q.add("yes", "anna");
        assert_eq!(q.add("maybe", "anna"), AddOutcome::Ignored);
        assert!(q.answer_of("anna").is_none());
        assert!(!q.has_answered("anna"));
        assert_eq!(q.choices().total_votes(), 0);
    }

    #[test]
    fn single_choice_options_are_fixed() {
        init();
        let mut q = Question::new(
            1,
            "Pick",
            QuestionKind::SingleChoice,
            &["A".to_string(), "B".to_string()],
        );
        let before = q.clone();
        assert_eq!(q.add("c", "bob"), AddOutcome::Ignored);
        assert_eq!(q, before);
        assert!(!q.has_answered("bob"));
    }

    #[test]
    fn free_text_choice_lifecycle() {
        init();
        let mut q = free();
        assert_eq!(q.add("new-answer", "anna"), AddOutcome::Created);
        assert_eq!(
            supporters(&q),
            vec![("new-answer".to_string(), vec!["anna".to_string()])]
        );
        q.remove("anna");
        assert!(q.choices().is_empty());
        assert!(!q.has_answered("anna"));
    }

    #[test]
    fn free_text_shared_choice_survives_partial_removal() {
        init();
        let mut q = free();
        q.add("mr-smith", "anna");
        assert_eq!(q.add("mr-smith", "bob"), AddOutcome::Recorded);
        q.remove("anna");
        assert_eq!(
            supporters(&q),
            vec![("mr-smith".to_string(), vec!["bob".to_string()])]
        );
    }

    #[test]
    fn free_text_spellings_merge_by_identifier() {
        init();
        let mut q = free();
        assert_eq!(q.add("Mr. Smith", "anna"), AddOutcome::Created);
        assert_eq!(q.add("mr smith!", "bob"), AddOutcome::Recorded);
        assert_eq!(q.choices().len(), 1);
        assert_eq!(q.choices().choices()[0].label, "Mr. Smith");
        assert_eq!(q.choices().choices()[0].voters.len(), 2);
    }

    #[test]
    fn free_text_revision_moves_the_voter() {
        init();
        let mut q = free();
        q.add("alpha", "anna");
        q.add("beta", "bob");
        q.add("beta", "anna");
        assert_eq!(
            supporters(&q),
            vec![(
                "beta".to_string(),
                vec!["bob".to_string(), "anna".to_string()]
            )]
        );
    }

    #[test]
    fn remove_without_answer_is_noop() {
        init();
        let mut q = yes_no();
        q.add("yes", "anna");
        let before = q.clone();
        q.remove("bob");
        assert_eq!(q, before);
    }

    #[test]
    fn from_choices_drops_unsupported_free_text() {
        init();
        let choices = vec![
            Choice::new("Tea"),
            Choice {
                label: "Water".to_string(),
                voters: vec!["x".to_string()],
            },
        ];
        let q = Question::from_choices(2, "Why?", QuestionKind::FreeText, choices).unwrap();
        assert_eq!(q.choices().len(), 1);
        assert_eq!(q.choices().choices()[0].label, "Water");
        assert!(q.has_answered("x"));

        // Seeded options stay, even without votes.
        let options = vec![Choice::new("Yes"), Choice::new("No")];
        let q = Question::from_choices(1, "Ok?", QuestionKind::SingleChoice, options).unwrap();
        assert_eq!(q.choices().len(), 2);
    }

    #[test]
    fn from_choices_rejects_double_membership() {
        let choices = vec![
            Choice {
                label: "a".to_string(),
                voters: vec!["x".to_string()],
            },
            Choice {
                label: "b".to_string(),
                voters: vec!["x".to_string()],
            },
        ];
        assert!(matches!(
            Question::from_choices(1, "q", QuestionKind::FreeText, choices),
            Err(LedgerErrors::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn survey_numbers_start_at_one() {
        init();
        let mut survey = SurveyBuilder::new()
            .single_choice("Coffee?", &["Yes".to_string(), "No".to_string()])
            .unwrap()
            .free_text("Why?")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(survey.last_number(), 2);
        assert_eq!(survey.question(0), Err(LedgerErrors::QuestionNotFound(0)));
        assert_eq!(survey.question(3), Err(LedgerErrors::QuestionNotFound(3)));
        assert_eq!(survey.question(2).unwrap().prompt(), "Why?");
        assert_eq!(
            survey.answer(3, Some("yes"), "anna"),
            Err(LedgerErrors::QuestionNotFound(3))
        );
    }

    #[test]
    fn skipping_keeps_the_previous_answer() {
        init();
        let mut survey = SurveyBuilder::new()
            .single_choice("Coffee?", &["Yes".to_string(), "No".to_string()])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            survey.answer(1, Some("yes"), "anna"),
            Ok(Some(AddOutcome::Recorded))
        );
        assert_eq!(survey.answer(1, Some(""), "anna"), Ok(None));
        assert_eq!(survey.answer(1, None, "anna"), Ok(None));
        assert!(survey.question(1).unwrap().has_answered("anna"));
        survey.withdraw(1, "anna").unwrap();
        assert!(!survey.question(1).unwrap().has_answered("anna"));
    }

    #[test]
    fn report_is_a_view() {
        init();
        let mut survey = SurveyBuilder::new()
            .single_choice(
                "Colour",
                &["Red".to_string(), "Green".to_string(), "Blue".to_string()],
            )
            .unwrap()
            .build()
            .unwrap();
        for (voter, answer) in [("a", "blue"), ("b", "blue"), ("c", "blue"), ("d", "green")] {
            survey.answer(1, Some(answer), voter).unwrap();
        }
        let before = survey.clone();
        let report = survey.report();
        assert_eq!(survey, before);
        let r = &report[0];
        assert_eq!(r.total_votes, 4);
        let got: Vec<(&str, usize, f64)> = r
            .ranking
            .iter()
            .map(|c| (c.label.as_str(), c.voter_count, c.percentage))
            .collect();
        assert_eq!(
            got,
            vec![("Blue", 3, 75.0), ("Green", 1, 25.0), ("Red", 0, 0.0)]
        );
    }

    #[test]
    fn restore_checks_the_definition() {
        init();
        let builder = || {
            SurveyBuilder::new()
                .single_choice("Coffee?", &["Yes".to_string(), "No".to_string()])
                .unwrap()
                .free_text("Why?")
                .unwrap()
        };
        let mut saved = builder().build().unwrap();
        saved.answer(1, Some("no"), "anna").unwrap();
        saved.answer(2, Some("Too bitter"), "anna").unwrap();

        let mut fresh = builder().build().unwrap();
        fresh.restore(saved.questions().to_vec()).unwrap();
        assert_eq!(fresh, saved);

        let mut other = SurveyBuilder::new()
            .single_choice("Coffee?", &["Yes".to_string(), "Maybe".to_string()])
            .unwrap()
            .free_text("Why?")
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(
            other.restore(saved.questions().to_vec()),
            Err(LedgerErrors::SnapshotMismatch(_))
        ));
        assert!(matches!(
            other.restore(vec![]),
            Err(LedgerErrors::SnapshotMismatch(_))
        ));
    }
}

// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The two flavours of survey questions.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionKind {
    /// The voter picks one of the options fixed when the survey is defined.
    /// The options never change afterwards.
    SingleChoice,
    /// The voter types an answer. Every new answer becomes a choice, and a
    /// choice disappears once nobody supports it anymore.
    FreeText,
}

impl QuestionKind {
    pub fn is_free_text(&self) -> bool {
        *self == QuestionKind::FreeText
    }
}

/// One distinct answer to a question, with the voters who picked it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Choice {
    /// The text shown to voters.
    pub label: String,
    /// The supporters, in the order in which they answered. No duplicates.
    pub voters: Vec<String>,
}

impl Choice {
    pub fn new(label: &str) -> Choice {
        Choice {
            label: label.to_string(),
            voters: Vec::new(),
        }
    }

    /// The token identifying this choice in forms and in answers.
    pub fn identifier(&self) -> String {
        crate::choices::normalize(&self.label)
    }
}

// ******** Output data structures *********

/// What happened to an answer handed to a question.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AddOutcome {
    /// The voter now supports an existing choice.
    Recorded,
    /// A free-text answer created a new choice.
    Created,
    /// The answer matched none of the options of a single choice question.
    Ignored,
}

/// One line of the report for a question.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedChoice {
    pub label: String,
    pub voter_count: usize,
    pub percentage: f64,
}

/// Errors raised while defining or looking up questions.
///
/// Recording or withdrawing an answer never fails.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LedgerErrors {
    /// Question numbers start at 1 and end with the last question.
    QuestionNotFound(usize),
    EmptySurvey,
    EmptyPrompt(usize),
    /// A single choice question needs at least one option.
    MissingOptions(usize),
    /// Two options of the same question share an identifier.
    IdentifierCollision { question: usize, identifier: String },
    /// A saved snapshot does not describe the same survey.
    SnapshotMismatch(String),
}

impl Error for LedgerErrors {}

impl Display for LedgerErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerErrors::QuestionNotFound(qno) => write!(f, "question {} does not exist", qno),
            LedgerErrors::EmptySurvey => write!(f, "the survey has no questions"),
            LedgerErrors::EmptyPrompt(qno) => write!(f, "question {} has an empty prompt", qno),
            LedgerErrors::MissingOptions(qno) => {
                write!(f, "single choice question {} has no options", qno)
            }
            LedgerErrors::IdentifierCollision {
                question,
                identifier,
            } => write!(
                f,
                "question {}: several options share the identifier {:?}",
                question, identifier
            ),
            LedgerErrors::SnapshotMismatch(msg) => {
                write!(f, "saved results do not match the survey: {}", msg)
            }
        }
    }
}

/// The ranked answers of one question, as shown in the report.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionReport {
    pub number: usize,
    pub prompt: String,
    pub kind: QuestionKind,
    pub total_votes: usize,
    pub ranking: Vec<RankedChoice>,
}

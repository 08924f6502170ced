pub use crate::config::*;
use crate::{normalize, Question, Survey};

use std::collections::HashSet;

/// A builder for the definition of a survey.
///
/// Questions are numbered in the order in which they are added, starting at 1.
///
/// ```
/// use survey_ledger::builder::SurveyBuilder;
/// # use survey_ledger::LedgerErrors;
///
/// let mut survey = SurveyBuilder::new()
///     .single_choice("Do you like coffee?", &["Yes!".to_string(), "No.".to_string()])?
///     .free_text("What should we drink instead?")?
///     .build()?;
///
/// survey.answer(1, Some("no"), "anna")?;
/// survey.answer(2, Some("Tea"), "anna")?;
///
/// assert_eq!(survey.question(1)?.report().ranking[0].label, "No.");
/// # Ok::<(), LedgerErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SurveyBuilder {
    pub(crate) _questions: Vec<Question>,
}

impl SurveyBuilder {
    pub fn new() -> SurveyBuilder {
        SurveyBuilder {
            _questions: Vec::new(),
        }
    }

    /// Adds a question with a fixed list of options.
    ///
    /// The identifiers of the options must be distinct: "Yes" and "yes!"
    /// cannot be offered in the same question.
    pub fn single_choice(
        self,
        prompt: &str,
        options: &[String],
    ) -> Result<SurveyBuilder, LedgerErrors> {
        self.question(prompt, QuestionKind::SingleChoice, options)
    }

    /// Adds a question answered with free text.
    pub fn free_text(self, prompt: &str) -> Result<SurveyBuilder, LedgerErrors> {
        self.question(prompt, QuestionKind::FreeText, &[])
    }

    pub fn question(
        mut self,
        prompt: &str,
        kind: QuestionKind,
        options: &[String],
    ) -> Result<SurveyBuilder, LedgerErrors> {
        let number = self._questions.len() + 1;
        if prompt.trim().is_empty() {
            return Err(LedgerErrors::EmptyPrompt(number));
        }
        if kind == QuestionKind::SingleChoice {
            if options.is_empty() {
                return Err(LedgerErrors::MissingOptions(number));
            }
            let mut seen: HashSet<String> = HashSet::new();
            for o in options {
                let identifier = normalize(o);
                if !seen.insert(identifier.clone()) {
                    return Err(LedgerErrors::IdentifierCollision {
                        question: number,
                        identifier,
                    });
                }
            }
        }
        self._questions
            .push(Question::new(number, prompt, kind, options));
        Ok(self)
    }

    pub fn build(self) -> Result<Survey, LedgerErrors> {
        Survey::new(self._questions)
    }
}

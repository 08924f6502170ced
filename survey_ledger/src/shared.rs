use log::warn;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{AddOutcome, LedgerErrors, QuestionReport};
use crate::Survey;

/// A survey that can be answered from several threads.
///
/// A single lock guards the whole question sequence. Each operation holds it
/// for its whole duration, so an answer is never observed half-recorded.
#[derive(Debug, Clone)]
pub struct SharedSurvey {
    inner: Arc<Mutex<Survey>>,
}

impl SharedSurvey {
    pub fn new(survey: Survey) -> SharedSurvey {
        SharedSurvey {
            inner: Arc::new(Mutex::new(survey)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Survey> {
        // The ledger does not panic halfway through a mutation, the state behind
        // a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("lock: recovering from a poisoned survey lock");
            poisoned.into_inner()
        })
    }

    pub fn answer(
        &self,
        number: usize,
        answer: Option<&str>,
        voter: &str,
    ) -> Result<Option<AddOutcome>, LedgerErrors> {
        self.lock().answer(number, answer, voter)
    }

    pub fn withdraw(&self, number: usize, voter: &str) -> Result<(), LedgerErrors> {
        self.lock().withdraw(number, voter)
    }

    pub fn report(&self) -> Vec<QuestionReport> {
        self.lock().report()
    }

    /// Runs `f` with exclusive access to the survey.
    pub fn with<T>(&self, f: impl FnOnce(&mut Survey) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    /// A copy of the current state, e.g. for saving it.
    pub fn snapshot(&self) -> Survey {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SurveyBuilder;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn concurrent_voters_keep_the_invariants() {
        let _ = env_logger::builder().is_test(true).try_init();
        let survey = SurveyBuilder::new()
            .single_choice(
                "Pick one",
                &["A".to_string(), "B".to_string(), "C".to_string()],
            )
            .unwrap()
            .free_text("Say something")
            .unwrap()
            .build()
            .unwrap();
        let shared = SharedSurvey::new(survey);

        let num_threads = 8;
        let voters_per_thread = 25;
        let rounds = 20;
        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let s = shared.clone();
                thread::spawn(move || {
                    for r in 0..rounds {
                        for v in 0..voters_per_thread {
                            let voter = format!("voter-{}-{}", t, v);
                            let pick = ["a", "b", "c"][(r + v) % 3];
                            s.answer(1, Some(pick), &voter).unwrap();
                            let text = format!("answer {}", (r * 7 + v + t) % 5);
                            s.answer(2, Some(&text), &voter).unwrap();
                            if (r + v) % 4 == 0 {
                                s.withdraw(2, &voter).unwrap();
                            }
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let survey = shared.snapshot();
        let all_voters = num_threads * voters_per_thread;

        let q1 = survey.question(1).unwrap();
        assert_eq!(q1.choices().len(), 3);
        assert_eq!(q1.choices().total_votes(), all_voters);
        assert_eq!(q1.voters().count(), all_voters);

        // Nobody supports two choices, and the voter set matches the choices.
        for q in survey.questions() {
            let mut seen: HashSet<String> = HashSet::new();
            for ch in q.choices().choices() {
                assert!(!ch.voters.is_empty() || !q.kind().is_free_text());
                for v in ch.voters.iter() {
                    assert!(seen.insert(v.clone()), "{} answered twice", v);
                }
            }
            let registered: HashSet<String> = q.voters().cloned().collect();
            assert_eq!(seen, registered);
        }
    }
}

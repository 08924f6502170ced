use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use survey_ledger::*;

use crate::args::{Args, Command};
use crate::survey::config_reader::*;
use crate::survey::store::SurveyStore;

pub mod config_reader;
pub mod gate;
pub mod report;
pub mod session;
pub mod store;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing {path}"))]
    SerializingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating the lock file {path}"))]
    Locking {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Timed out waiting for the lock file {path}"))]
    LockTimeout { path: String },
    #[snafu(display("Invalid survey definition in {path}: {source}"))]
    InvalidSurvey { source: LedgerErrors, path: String },
    #[snafu(display("{source}"))]
    Ledger { source: LedgerErrors },
    #[snafu(display("Access denied for {user:?}: {source}"))]
    Access {
        source: gate::Ineligible,
        user: String,
    },
    #[snafu(display("Error writing the CSV report"))]
    Csv { source: csv::Error },
    #[snafu(display("Error creating the CSV report {path}"))]
    CreatingCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the report"))]
    WritingReport { source: std::io::Error },
    #[snafu(display("Error in the interactive session"))]
    SessionIo { source: std::io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Where a voter goes after answering a question.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Next {
    Question(usize),
    Done,
}

/// Checks that a voter may answer, and tells them where to start.
pub fn login(store: &SurveyStore, user: &str) -> SurveyResult<Next> {
    gate::can_vote(store.users(), user).context(AccessSnafu { user })?;
    info!("User {} logged in", user);
    Ok(Next::Question(1))
}

/// Records (or skips) the answer of a voter to one question and saves the
/// results.
///
/// After the last question, the voter is marked as done and the registry is
/// saved as well: from then on, the voter cannot answer anymore.
pub fn answer_question(
    store: &mut SurveyStore,
    user: &str,
    number: usize,
    answer: Option<&str>,
) -> SurveyResult<Next> {
    store.update(|store| {
        gate::can_vote(store.users(), user).context(AccessSnafu { user })?;
        let outcome = store
            .survey()
            .answer(number, answer, user)
            .context(LedgerSnafu {})?;
        debug!(
            "answer_question: {} question {}: {:?}",
            user, number, outcome
        );

        let last = store.survey().with(|s| s.last_number());
        if number < last {
            Ok(Next::Question(number + 1))
        } else {
            store.mark_voted(user);
            info!("User {} completed the questionnaire", user);
            Ok(Next::Done)
        }
    })
}

/// Builds the report for an admin.
pub fn stats(store: &SurveyStore, user: &str) -> SurveyResult<Vec<QuestionReport>> {
    gate::can_view_stats(store.users(), user).context(AccessSnafu { user })?;
    Ok(store.survey().report())
}

/// Prints the questions in definition order, with the tokens to answer them.
pub fn print_questions(survey: &Survey) {
    for q in survey.questions() {
        println!("{}. {}", q.number(), q.prompt());
        match q.kind() {
            QuestionKind::SingleChoice => {
                for ch in q.choices().choices() {
                    println!("    [{}] {}", ch.identifier(), ch.label);
                }
            }
            QuestionKind::FreeText => println!("    (free text)"),
        }
    }
}

fn print_next(next: Next, closing_message: &str) {
    match next {
        Next::Question(n) => println!("next question: {}", n),
        Next::Done => println!("{}", closing_message),
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "survey.json";

pub fn run(args: &Args) -> SurveyResult<()> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = read_config(&config_path)?;
    let survey = build_survey(&config, &config_path)?;

    if let Command::Questions = args.command {
        print_questions(&survey);
        return Ok(());
    }

    let results_path = resolve_path(
        &config_path,
        &args.results,
        &config.results_path,
        DEFAULT_RESULTS_PATH,
    );
    let users_path = resolve_path(
        &config_path,
        &args.users,
        &config.users_path,
        DEFAULT_USERS_PATH,
    );
    let mut store = SurveyStore::open(survey, results_path, users_path)?;

    match &args.command {
        Command::Questions => Ok(()),
        Command::Login { user } => {
            print_next(login(&store, user)?, &config.closing_message());
            Ok(())
        }
        Command::Answer {
            user,
            question,
            answer,
        } => {
            let next = answer_question(&mut store, user, *question, answer.as_deref())?;
            print_next(next, &config.closing_message());
            Ok(())
        }
        Command::Stats {
            user,
            out,
            csv,
            reference,
        } => {
            let reports = stats(&store, user)?;
            report::log_report(&reports);
            report::write_text(&reports, std::io::stdout()).context(WritingReportSnafu {})?;
            let js = report::summary_js(&config.survey_name, &reports);
            if let Some(out_path) = out {
                report::write_summary(&js, out_path)?;
            }
            if let Some(csv_path) = csv {
                report::write_csv_file(&reports, csv_path)?;
            }
            if let Some(reference_path) = reference {
                report::check_reference(&js, reference_path)?;
            }
            Ok(())
        }
        Command::Session { user } => {
            session::run_session(&mut store, user, &config.closing_message())
        }
    }
}

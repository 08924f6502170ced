use clap::{Parser, Subcommand};

/// This is a survey program: voters answer the questions one after the other,
/// admins read the tallies.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, default survey.json) The file containing the survey definition in JSON format.
    /// For more information about the file format, read the documentation of the survey_ledger crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) Where the answers are kept. Setting this option overrides the path that may be
    /// specified in the configuration.
    #[clap(long, value_parser)]
    pub results: Option<String>,

    /// (file path) The registry of voters. Setting this option overrides the path that may be
    /// specified in the configuration.
    #[clap(long, value_parser)]
    pub users: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Lists the questions, with the tokens accepted as answers.
    Questions,
    /// Checks that a voter may take the survey.
    Login {
        #[clap(short, long, value_parser)]
        user: String,
    },
    /// Answers one question. Without --answer, the question is skipped.
    Answer {
        #[clap(short, long, value_parser)]
        user: String,
        /// The number of the question, starting at 1.
        #[clap(short, long, value_parser)]
        question: usize,
        /// For single choice questions, the identifier of the option (see `questions`).
        #[clap(short, long, value_parser)]
        answer: Option<String>,
    },
    /// Prints the tallies. Reserved for admins.
    Stats {
        #[clap(short, long, value_parser)]
        user: String,
        /// (file path or 'stdout') If specified, the summary will be written in JSON format to the
        /// given location.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) If specified, the tallies will be written in CSV format to the given location.
        #[clap(long, value_parser)]
        csv: Option<String>,
        /// (file path) A reference summary in JSON format. If provided, the computed summary
        /// must match it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Takes the survey interactively from the terminal. Ctrl-C saves and exits.
    Session {
        #[clap(short, long, value_parser)]
        user: String,
    },
}

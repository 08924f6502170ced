use crate::survey::*;

use serde::{Deserialize, Serialize};
use survey_ledger::builder::SurveyBuilder;

/// The kind of a question, as written in the configuration and in saved results.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KindConfig {
    SingleChoice,
    FreeText,
}

impl From<KindConfig> for QuestionKind {
    fn from(k: KindConfig) -> QuestionKind {
        match k {
            KindConfig::SingleChoice => QuestionKind::SingleChoice,
            KindConfig::FreeText => QuestionKind::FreeText,
        }
    }
}

impl From<QuestionKind> for KindConfig {
    fn from(k: QuestionKind) -> KindConfig {
        match k {
            QuestionKind::SingleChoice => KindConfig::SingleChoice,
            QuestionKind::FreeText => KindConfig::FreeText,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    pub prompt: String,
    pub kind: KindConfig,
    /// Only read for single choice questions.
    pub options: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "resultsPath")]
    pub results_path: Option<String>,
    #[serde(rename = "usersPath")]
    pub users_path: Option<String>,
    #[serde(rename = "closingMessage")]
    pub closing_message: Option<String>,
    pub questions: Vec<QuestionConfig>,
}

pub const DEFAULT_RESULTS_PATH: &str = "results.json";
pub const DEFAULT_USERS_PATH: &str = "users.json";
pub const DEFAULT_CLOSING_MESSAGE: &str =
    "Thank you for taking part! The results will be published once the survey is closed.";

impl SurveyConfig {
    pub fn closing_message(&self) -> String {
        self.closing_message
            .clone()
            .unwrap_or_else(|| DEFAULT_CLOSING_MESSAGE.to_string())
    }
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Validates the question definitions and turns them into an empty survey.
pub fn build_survey(config: &SurveyConfig, path: &str) -> SurveyResult<Survey> {
    let mut builder = SurveyBuilder::new();
    for q in config.questions.iter() {
        let options = q.options.clone().unwrap_or_default();
        if q.kind == KindConfig::FreeText && !options.is_empty() {
            warn!(
                "build_survey: free-text question {:?} lists options, ignoring them",
                q.prompt
            );
        }
        builder = builder
            .question(&q.prompt, q.kind.into(), &options)
            .context(InvalidSurveySnafu { path })?;
    }
    let survey = builder.build().context(InvalidSurveySnafu { path })?;
    info!(
        "Survey {:?}: {} questions",
        config.survey_name,
        survey.last_number()
    );
    Ok(survey)
}

/// Resolves a path from the configuration relative to the directory of the
/// configuration file. A path given on the command line wins.
pub fn resolve_path(
    config_path: &str,
    from_args: &Option<String>,
    from_config: &Option<String>,
    default: &str,
) -> PathBuf {
    if let Some(p) = from_args {
        return PathBuf::from(p);
    }
    let p = from_config.clone().unwrap_or_else(|| default.to_string());
    match Path::new(config_path).parent() {
        Some(parent) if Path::new(&p).is_relative() => parent.join(p),
        _ => PathBuf::from(p),
    }
}

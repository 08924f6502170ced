// The survey state on disk: the answers (results.json) and the registry of
// voters (users.json).

use crate::survey::config_reader::KindConfig;
use crate::survey::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use survey_ledger::{Choice, Question, SharedSurvey};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(rename = "hasVoted", default)]
    pub has_voted: bool,
    #[serde(default)]
    pub admin: bool,
}

/// Voter id -> voter.
pub type Users = BTreeMap<String, UserInfo>;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SavedChoice {
    pub label: String,
    pub voters: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuestion {
    pub number: usize,
    pub prompt: String,
    pub kind: KindConfig,
    pub choices: Vec<SavedChoice>,
}

pub fn save_questions(survey: &Survey) -> Vec<SavedQuestion> {
    survey
        .questions()
        .iter()
        .map(|q| SavedQuestion {
            number: q.number(),
            prompt: q.prompt().to_string(),
            kind: q.kind().into(),
            choices: q
                .choices()
                .choices()
                .iter()
                .map(|c| SavedChoice {
                    label: c.label.clone(),
                    voters: c.voters.clone(),
                })
                .collect(),
        })
        .collect()
}

pub fn load_questions(saved: Vec<SavedQuestion>) -> Result<Vec<Question>, LedgerErrors> {
    saved
        .into_iter()
        .map(|sq| {
            let choices = sq
                .choices
                .into_iter()
                .map(|sc| Choice {
                    label: sc.label,
                    voters: sc.voters,
                })
                .collect();
            Question::from_choices(sq.number, &sq.prompt, sq.kind.into(), choices)
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> SurveyResult<T> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> SurveyResult<()> {
    let p = path.display().to_string();
    let js = serde_json::to_string_pretty(value).context(SerializingJsonSnafu { path: p.clone() })?;
    fs::write(path, js).context(WritingJsonSnafu { path: p.clone() })?;
    info!("Saved {}", p);
    Ok(())
}

/// How long a process waits for another one to release the files.
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Exclusive access to the files of a survey, shared by all the processes
/// using them. The lock file is removed on drop.
#[derive(Debug)]
struct FileLock {
    path: PathBuf,
}

impl FileLock {
    fn acquire(path: PathBuf, timeout: Duration) -> SurveyResult<FileLock> {
        let started = Instant::now();
        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => return Ok(FileLock { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if started.elapsed() >= timeout {
                        return LockTimeoutSnafu {
                            path: path.display().to_string(),
                        }
                        .fail();
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    return Err(e).context(LockingSnafu {
                        path: path.display().to_string(),
                    })
                }
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Could not remove the lock {}: {}", self.path.display(), e);
        }
    }
}

/// `results.json` -> `results.json.lock`
fn lock_path(results_path: &Path) -> PathBuf {
    let mut p = results_path.as_os_str().to_owned();
    p.push(".lock");
    PathBuf::from(p)
}

/// Reads the registry, which must exist, and the saved answers, if any, on top
/// of a fresh copy of the definition.
fn load(
    definition: &Survey,
    results_path: &Path,
    users_path: &Path,
) -> SurveyResult<(Survey, Users)> {
    let users: Users = read_json(users_path)?;
    debug!("load: {}: {} users", users_path.display(), users.len());
    let mut survey = definition.clone();
    if results_path.exists() {
        let saved: Vec<SavedQuestion> = read_json(results_path)?;
        let questions = load_questions(saved).context(LedgerSnafu {})?;
        survey.restore(questions).context(LedgerSnafu {})?;
        debug!("load: restored {}", results_path.display());
    }
    Ok((survey, users))
}

/// Owns the survey and the voters for the lifetime of the process.
///
/// Several processes may work on the same files. Every change goes through
/// [SurveyStore::update], which holds a lock file next to the results while it
/// reloads both files, applies the change and writes them back.
pub struct SurveyStore {
    definition: Survey,
    survey: SharedSurvey,
    users: Users,
    results_path: PathBuf,
    users_path: PathBuf,
}

impl SurveyStore {
    /// Loads the registry, which must exist, and the saved answers, if any.
    pub fn open(
        definition: Survey,
        results_path: PathBuf,
        users_path: PathBuf,
    ) -> SurveyResult<SurveyStore> {
        let (survey, users) = {
            let _lock = FileLock::acquire(lock_path(&results_path), LOCK_TIMEOUT)?;
            load(&definition, &results_path, &users_path)?
        };
        info!("Loaded {}. {} users", users_path.display(), users.len());
        if results_path.exists() {
            info!("Loaded {}", results_path.display());
        } else {
            info!(
                "No results in {} yet, starting from scratch",
                results_path.display()
            );
        }

        Ok(SurveyStore {
            definition,
            survey: SharedSurvey::new(survey),
            users,
            results_path,
            users_path,
        })
    }

    pub fn survey(&self) -> &SharedSurvey {
        &self.survey
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    /// Records that a voter went through the whole survey.
    pub fn mark_voted(&mut self, user: &str) {
        if let Some(u) = self.users.get_mut(user) {
            u.has_voted = true;
        }
    }

    /// Applies `f` to the latest content of the files and writes them back.
    ///
    /// Other processes wait for the lock in the meantime. Nothing is written
    /// when `f` fails.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut SurveyStore) -> SurveyResult<T>,
    ) -> SurveyResult<T> {
        let _lock = FileLock::acquire(lock_path(&self.results_path), LOCK_TIMEOUT)?;
        self.reload()?;
        let res = f(self)?;
        self.save_results()?;
        self.save_users()?;
        Ok(res)
    }

    /// Writes both files from their latest content, for the end of the
    /// process. Both writes are attempted even if the first fails.
    pub fn flush(&mut self) -> SurveyResult<()> {
        let _lock = FileLock::acquire(lock_path(&self.results_path), LOCK_TIMEOUT)?;
        self.reload()?;
        let users = self.save_users();
        let results = self.save_results();
        users.and(results)
    }

    fn reload(&mut self) -> SurveyResult<()> {
        let (survey, users) = load(&self.definition, &self.results_path, &self.users_path)?;
        self.survey.with(|s| *s = survey);
        self.users = users;
        Ok(())
    }

    fn save_results(&self) -> SurveyResult<()> {
        let saved = save_questions(&self.survey.snapshot());
        write_json(&self.results_path, &saved)
    }

    fn save_users(&self) -> SurveyResult<()> {
        write_json(&self.users_path, &self.users)
    }
}

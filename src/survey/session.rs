// Interactive answering from a terminal. Answers are read line by line from
// the standard input; Ctrl-C ends the session.

use crate::survey::*;

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// What the voter typed.
#[derive(Eq, PartialEq, Debug, Clone)]
enum Input {
    Answer(String),
    Skip,
    Back,
    Quit,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" => Input::Skip,
        ":back" => Input::Back,
        ":quit" => Input::Quit,
        s => Input::Answer(s.to_string()),
    }
}

/// For a single choice question, the voter may also type the position of an
/// option. An option whose identifier matches the text wins over a position.
fn resolve_answer(question: &Question, answer: &str) -> String {
    if question.kind() == QuestionKind::SingleChoice {
        let identifier = normalize(answer);
        if question.choices().find_by_identifier(&identifier).is_some() {
            return identifier;
        }
        if let Ok(pos) = answer.parse::<usize>() {
            let option = pos
                .checked_sub(1)
                .and_then(|i| question.choices().choices().get(i));
            if let Some(ch) = option {
                return ch.identifier();
            }
        }
        return identifier;
    }
    answer.to_string()
}

/// Runs a session for one voter on the terminal.
pub fn run_session(
    store: &mut SurveyStore,
    user: &str,
    closing_message: &str,
) -> SurveyResult<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(SessionIoSnafu {})?;
    rt.block_on(async {
        let stdin = BufReader::new(tokio::io::stdin());
        let interrupt = tokio::signal::ctrl_c();
        session_then_flush(&mut *store, user, closing_message, stdin, interrupt).await
    })
}

/// Saves everything once the session is over, also when it was interrupted or
/// failed.
async fn session_then_flush<R, F>(
    store: &mut SurveyStore,
    user: &str,
    closing_message: &str,
    input: R,
    interrupt: F,
) -> SurveyResult<()>
where
    R: AsyncBufRead + Unpin,
    F: std::future::Future<Output = std::io::Result<()>>,
{
    let res = session_loop(&mut *store, user, closing_message, input, interrupt).await;
    info!("Session of {} ended, saving", user);
    let flushed = store.flush();
    res.and(flushed)
}

async fn session_loop<R, F>(
    store: &mut SurveyStore,
    user: &str,
    closing_message: &str,
    input: R,
    interrupt: F,
) -> SurveyResult<()>
where
    R: AsyncBufRead + Unpin,
    F: std::future::Future<Output = std::io::Result<()>>,
{
    gate::can_vote(store.users(), user).context(AccessSnafu { user })?;
    let last = store.survey().with(|s| s.last_number());
    let mut lines = input.lines();
    tokio::pin!(interrupt);
    let mut number: usize = 1;
    loop {
        let question = store
            .survey()
            .with(|s| s.question(number).cloned())
            .context(LedgerSnafu {})?;
        print_question(&question, last);
        let line = tokio::select! {
            _ = &mut interrupt => {
                info!("Interrupted during question {}", number);
                return Ok(());
            }
            line = lines.next_line() => line.context(SessionIoSnafu {})?,
        };
        let input = match line {
            Some(l) => parse_input(&l),
            None => {
                info!("End of input during question {}", number);
                return Ok(());
            }
        };
        let answer = match input {
            Input::Quit => return Ok(()),
            Input::Back => {
                number = std::cmp::max(number - 1, 1);
                continue;
            }
            Input::Skip => None,
            Input::Answer(a) => Some(resolve_answer(&question, &a)),
        };
        match answer_question(store, user, number, answer.as_deref())? {
            Next::Question(n) => number = n,
            Next::Done => {
                println!("{}", closing_message);
                return Ok(());
            }
        }
    }
}

fn print_question(question: &Question, last: usize) {
    println!();
    println!("[{}/{}] {}", question.number(), last, question.prompt());
    match question.kind() {
        QuestionKind::SingleChoice => {
            for (idx, ch) in question.choices().choices().iter().enumerate() {
                println!("  {}) {}", idx + 1, ch.label);
            }
        }
        QuestionKind::FreeText => println!("  (free text)"),
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}

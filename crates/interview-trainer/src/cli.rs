/// Interactive terminal interview.
///
/// Reads answers line by line from stdin and prints questions and feedback to stdout.
/// Logs go to stderr, so the transcript stays readable. Ctrl+C or end of input ends the
/// session.
use std::io::BufRead;
use std::sync::Arc;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, Lines,
};

use crate::error::AppError;
use crate::model::MAX_TIMES_ASKED;
use crate::session::{Trainer, Turn, COMPLETION_MESSAGE};

const GOODBYE: &str =
    "Thank you for using the Mock Interview Trainer! Good luck with your real interviews!";

pub async fn run(trainer: Arc<Trainer>) -> Result<(), AppError> {
    let input = BufReader::new(stdin_pipe()).lines();
    let output = tokio::io::stdout();
    tokio::select! {
        result = interview(&trainer, input, output) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n{GOODBYE}");
            Ok(())
        }
    }
}

/// Forward stdin through a plain OS thread.
///
/// `tokio::io::stdin` reads on the blocking pool, which keeps the runtime from shutting down
/// after Ctrl+C until another line arrives. A detached thread dies with the process instead.
fn stdin_pipe() -> DuplexStream {
    let (reader, mut writer) = tokio::io::duplex(4096);
    let handle = tokio::runtime::Handle::current();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let sent = handle.block_on(async {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await
            });
            if sent.is_err() {
                break;
            }
        }
    });
    reader
}

/// Drive one interview over arbitrary line input and text output.
pub async fn interview<R, W>(trainer: &Trainer, mut input: Lines<R>, mut out: W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let banner = format!(
        "Welcome to the Mock Interview Trainer!\n\
         Press Ctrl+C to exit at any time.\n\n\
         Each question will be asked up to {MAX_TIMES_ASKED} times.\n\
         Your feedback helps improve the question selection!\n"
    );
    write_line(&mut out, &banner).await?;

    let (_, mut turn) = trainer.new_conversation().await;
    loop {
        let prompt = match turn {
            Turn::Question { prompt } => prompt,
            Turn::Exhausted => {
                write_line(&mut out, &format!("\n{COMPLETION_MESSAGE}")).await?;
                return Ok(());
            }
        };

        write_line(&mut out, &format!("\nInterviewer: {prompt}")).await?;
        let submission = loop {
            write_prompt(&mut out, "Your answer: ").await?;
            let Some(line) = input.next_line().await? else {
                write_line(&mut out, &format!("\n{GOODBYE}")).await?;
                return Ok(());
            };
            if let Some(submission) = trainer.submit_answer(&line).await? {
                break submission;
            }
        };
        write_line(&mut out, &format!("\n{}", submission.feedback)).await?;

        loop {
            write_prompt(&mut out, "\nDid you find this question helpful? (yes/no): ").await?;
            let Some(line) = input.next_line().await? else {
                write_line(&mut out, &format!("\n{GOODBYE}")).await?;
                return Ok(());
            };
            match line.trim().to_lowercase().as_str() {
                "yes" => {
                    trainer.rate_question(&submission.question, true).await?;
                    break;
                }
                "no" => {
                    trainer.rate_question(&submission.question, false).await?;
                    break;
                }
                _ => write_line(&mut out, "Please answer with 'yes' or 'no'").await?,
            }
        }

        turn = trainer.next_question().await;
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), AppError> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

async fn write_prompt<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), AppError> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;
    use crate::history::{AnswerLog, ConversationStore};
    use crate::model::Question;
    use crate::scorer::testing::{positive, scorer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trainer(dir: &tempfile::TempDir, bank: QuestionBank) -> Trainer {
        Trainer::with_rng(
            bank,
            scorer(Some(vec![0.9]), Some(positive(0.95))),
            ConversationStore::new(dir.path().join("conversations.json")),
            AnswerLog::new(dir.path().join("answer_log.json")),
            StdRng::seed_from_u64(0),
        )
    }

    async fn run_script(trainer: &Trainer, script: &str) -> String {
        let input = BufReader::new(script.as_bytes()).lines();
        let mut out = Vec::new();
        interview(trainer, input, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn runs_until_the_pool_is_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = Question::new("What are your strengths?", &["I am creative."]);
        q.times_asked = MAX_TIMES_ASKED - 2;
        let t = trainer(&dir, QuestionBank::new(vec![q]));

        let transcript = run_script(&t, "\nI am creative.\nmaybe\nyes\nI am organized.\nno\n").await;

        assert_eq!(transcript.matches("Interviewer: What are your strengths?").count(), 2);
        assert_eq!(transcript.matches("Overall Rating:").count(), 2);
        assert!(transcript.contains("Please answer with 'yes' or 'no'"));
        assert!(transcript.trim_end().ends_with(COMPLETION_MESSAGE));

        let stats = t.question_stats().await;
        assert_eq!(stats[0].rating, 0);
        assert_eq!(stats[0].times_asked, MAX_TIMES_ASKED);
        assert_eq!(AnswerLog::new(dir.path().join("answer_log.json")).load().len(), 2);
    }

    #[tokio::test]
    async fn end_of_input_says_goodbye() {
        let dir = tempfile::tempdir().unwrap();
        let t = trainer(&dir, QuestionBank::default());
        let transcript = run_script(&t, "").await;
        assert!(transcript.contains("Interviewer: "));
        assert!(transcript.trim_end().ends_with(GOODBYE));
        assert!(AnswerLog::new(dir.path().join("answer_log.json")).load().is_empty());
    }
}

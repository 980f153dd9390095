//! Interactive spelling test on stdin/stdout.
//!
//! One task owns the controller and `select!`s between typed lines and
//! dwell timers, so every state change happens on a single event loop.

use std::sync::Arc;

use services::sessions::{DwellOutcome, Feedback, IgnoredReason, Phase, SubmitOutcome};
use services::speech::SpeechOutput;
use services::{
    AppServices, CommandSpeech, SessionDeps, SessionError, SilentSpeech, TestSessionController,
    TokioScheduler,
};
use spell_core::model::TestResult;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechMode {
    System,
    Silent,
}

impl SpeechMode {
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "silent" | "off" => Some(Self::Silent),
            _ => None,
        }
    }

    fn output(self) -> Arc<dyn SpeechOutput> {
        match self {
            Self::System => Arc::new(CommandSpeech::detect()),
            Self::Silent => Arc::new(SilentSpeech),
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

fn print_prompt(session: &TestSessionController) {
    let progress = session.progress();
    println!();
    println!(
        "Word {} of {}. Type what you hear (:r to hear it again).",
        progress.position + 1,
        progress.total
    );
}

fn print_feedback(feedback: &Feedback) {
    match feedback {
        Feedback::Correct => println!("  ✓ Correct!"),
        Feedback::Incorrect { expected } => println!("  ✗ Incorrect. The word was \"{expected}\"."),
    }
}

fn print_summary(result: &TestResult) {
    println!();
    println!("Test complete! You scored {} out of {}.", result.score(), result.total());
    if let Some(attempts) = result.details().attempts() {
        for attempt in attempts.iter().filter(|a| !a.correct) {
            println!("  {}: you typed \"{}\"", attempt.word, attempt.user_answer);
        }
    }
    println!("Type :again for a new test or :q to quit.");
}

fn handle_line(session: &mut TestSessionController, line: &str) -> Result<Flow, SessionError> {
    match line {
        ":q" | ":quit" => return Ok(Flow::Quit),
        ":r" => {
            if !session.replay_current_word() {
                println!("  (wait for the next word)");
            }
        }
        ":v" => match session.cycle_voice() {
            Some(voice) => println!("  Voice: {}", voice.name),
            None => println!("  (no other voices available)"),
        },
        ":again" => {
            if session.phase() == Phase::Finished {
                session.start()?;
                print_prompt(session);
            } else {
                println!("  (finish this test first, or :q to quit)");
            }
        }
        answer => {
            if session.phase() != Phase::InProgress {
                println!("  Type :again for a new test or :q to quit.");
                return Ok(Flow::Continue);
            }
            match session.submit_answer(answer)? {
                SubmitOutcome::Graded(_) => {
                    if let Some(feedback) = session.feedback() {
                        print_feedback(feedback);
                    }
                }
                SubmitOutcome::Ignored(IgnoredReason::FeedbackPending) => {
                    println!("  (one moment...)");
                }
                SubmitOutcome::Ignored(IgnoredReason::BlankAnswer) => {}
            }
        }
    }
    Ok(Flow::Continue)
}

/// Load the active lists and run a test until the learner quits or stdin closes.
pub async fn run(
    services: &AppServices,
    speech: SpeechMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let (scheduler, mut dwell_rx) = TokioScheduler::new();
    let deps = SessionDeps {
        speech: speech.output(),
        scheduler: Arc::new(scheduler),
        sink: services.result_sink(),
    };

    let mut session = match services.sessions().load(deps).await {
        Ok(session) => session,
        Err(SessionError::NoActiveList) => {
            eprintln!("There are no active word lists to practise.");
            eprintln!("Create one with `spell add <name> <word,word,...>`,");
            eprintln!("then include it with `spell activate <id>` (see `spell lists`).");
            return Err(SessionError::NoActiveList.into());
        }
        Err(err) => return Err(err.into()),
    };

    session.start()?;
    if session.speech_degraded() {
        println!("Speech is unavailable; continuing without audio.");
    }
    print_prompt(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = handle_line(&mut session, line.trim())? {
                    break;
                }
            }
            Some(token) = dwell_rx.recv() => {
                match session.on_dwell_elapsed(token)? {
                    DwellOutcome::Stale => {}
                    DwellOutcome::Advanced { .. } => print_prompt(&session),
                    DwellOutcome::Finished(result) => print_summary(&result),
                }
            }
        }
    }

    session.teardown();
    // Let an in-flight save land before the runtime shuts down.
    if let Some(save) = session.take_pending_save() {
        if let Err(err) = save.await {
            tracing::warn!(error = %err, "result save task failed");
        }
    }
    Ok(())
}

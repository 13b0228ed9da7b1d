//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - generating a problem and evaluating a submission through the oracles
//!   - running the commands a session transition asks for
//!   - driving a session from one user intent until it settles

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, instrument};

use crate::domain::{Difficulty, EvaluationResult, Problem};
use crate::error::TutorError;
use crate::protocol::SessionView;
use crate::session::{Command, Event, Session};
use crate::state::AppState;

#[instrument(level = "info", skip_all, fields(%topic, %difficulty))]
pub async fn generate_problem(state: &AppState, topic: &str, difficulty: Difficulty) -> Result<Problem, TutorError> {
  match state.problems.generate_problem(topic, difficulty).await {
    Ok(p) => {
      info!(target: "session", problem_id = %p.id, "Problem ready");
      Ok(p)
    }
    Err(e) => {
      error!(target: "session", error = %e, "Problem generation failed");
      Err(TutorError::ProblemGenerationFailed(e))
    }
  }
}

#[instrument(level = "info", skip(state, problem, code), fields(problem_id = %problem.id, code_len = code.len()))]
pub async fn evaluate_submission(state: &AppState, problem: &Problem, code: &str) -> Result<EvaluationResult, TutorError> {
  match state.evaluator.evaluate(problem, code).await {
    Ok(r) => {
      info!(target: "session", score = r.score, is_correct = r.is_correct, "Evaluation ready");
      Ok(r)
    }
    Err(e) => {
      error!(target: "session", error = %e, "Evaluation failed");
      Err(TutorError::EvaluationFailed(e))
    }
  }
}

/// Run one command and turn its outcome into the completion event.
pub async fn run_command(state: &AppState, command: Command) -> Event {
  match command {
    Command::GenerateProblem { topic, difficulty } => {
      Event::ProblemLoaded(generate_problem(state, &topic, difficulty).await)
    }
    Command::Evaluate { problem, code } => {
      Event::SubmissionEvaluated(evaluate_submission(state, &problem, &code).await)
    }
  }
}

/// Apply `event`, then keep running commands and applying their completions
/// until the session settles. A snapshot is pushed to `sink` after every
/// transition, so the loading phase is visible before the external call returns.
///
/// The sink is dropped on return; a closed receiver is not an error.
pub async fn drive(
  state: &AppState,
  session_id: &str,
  mut session: Session,
  event: Event,
  sink: UnboundedSender<SessionView>,
) -> Session {
  let mut pending = Some(event);
  while let Some(ev) = pending.take() {
    let t = session.apply(ev, &state.catalog);
    session = t.session;
    let _ = sink.send(SessionView::of(session_id, &session));
    if let Some(command) = t.command {
      pending = Some(run_command(state, command).await);
    }
  }
  session
}

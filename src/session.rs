//! Session state machine.
//!
//! A `Session` is a plain value. `Session::apply` consumes it together with one
//! `Event` and returns the next session plus, at most, one `Command` for the
//! driver to run against the external service. The outcome of that command
//! comes back as another `Event`, so every transition stays synchronous.
//!
//! The problem and the evaluation live inside the phase variant that is allowed
//! to hold them; a result can never be shown against a problem it did not judge.

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::domain::{Difficulty, EvaluationResult, Problem};
use crate::error::TutorError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
  #[default]
  Idle,
  GeneratingProblem {
    topic_id: String,
  },
  Solving {
    problem: Problem,
    /// Kept after "back to problem" so the feedback can be re-opened.
    last_result: Option<EvaluationResult>,
  },
  Evaluating {
    problem: Problem,
  },
  Reviewing {
    problem: Problem,
    result: EvaluationResult,
  },
}

impl Phase {
  pub fn name(&self) -> &'static str {
    match self {
      Phase::Idle => "idle",
      Phase::GeneratingProblem { .. } => "generating_problem",
      Phase::Solving { .. } => "solving",
      Phase::Evaluating { .. } => "evaluating",
      Phase::Reviewing { .. } => "reviewing",
    }
  }

  pub fn problem(&self) -> Option<&Problem> {
    match self {
      Phase::Solving { problem, .. }
      | Phase::Evaluating { problem }
      | Phase::Reviewing { problem, .. } => Some(problem),
      Phase::Idle | Phase::GeneratingProblem { .. } => None,
    }
  }

  /// Only `Reviewing` exposes a result.
  pub fn result(&self) -> Option<&EvaluationResult> {
    match self {
      Phase::Reviewing { result, .. } => Some(result),
      _ => None,
    }
  }

  /// An external call is outstanding; topic and difficulty controls are locked.
  pub fn is_busy(&self) -> bool {
    matches!(self, Phase::GeneratingProblem { .. } | Phase::Evaluating { .. })
  }
}

/// User intents and external-call completions.
#[derive(Debug)]
pub enum Event {
  SelectTopic(String),
  NextProblem,
  EditCode(String),
  Submit,
  Reset,
  BackToProblem,
  ShowFeedback,
  SetDifficulty(Difficulty),
  ToggleLayout,
  DismissError,
  ProblemLoaded(Result<Problem, TutorError>),
  SubmissionEvaluated(Result<EvaluationResult, TutorError>),
}

impl Event {
  pub fn name(&self) -> &'static str {
    match self {
      Event::SelectTopic(_) => "select_topic",
      Event::NextProblem => "next_problem",
      Event::EditCode(_) => "edit_code",
      Event::Submit => "submit",
      Event::Reset => "reset",
      Event::BackToProblem => "back_to_problem",
      Event::ShowFeedback => "show_feedback",
      Event::SetDifficulty(_) => "set_difficulty",
      Event::ToggleLayout => "toggle_layout",
      Event::DismissError => "dismiss_error",
      Event::ProblemLoaded(_) => "problem_loaded",
      Event::SubmissionEvaluated(_) => "submission_evaluated",
    }
  }
}

/// Work the driver must perform before the session can move on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  GenerateProblem { topic: String, difficulty: Difficulty },
  Evaluate { problem: Problem, code: String },
}

#[derive(Debug)]
pub struct Transition {
  pub session: Session,
  pub command: Option<Command>,
}

impl Transition {
  fn stay(session: Session) -> Self {
    Self { session, command: None }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
  pub phase: Phase,
  pub selected_topic: Option<String>,
  pub code: String,
  pub difficulty: Difficulty,
  pub error: Option<String>,
  pub editor_expanded: bool,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn apply(self, event: Event, catalog: &Catalog) -> Transition {
    let from = self.phase.name();
    let event_name = event.name();
    let t = self.step(event, catalog);
    debug!(
      target: "session",
      event = event_name,
      from,
      to = t.session.phase.name(),
      command = t.command.is_some(),
      "transition"
    );
    t
  }

  fn step(mut self, event: Event, catalog: &Catalog) -> Transition {
    match event {
      Event::SelectTopic(topic_id) => self.request_problem(topic_id, catalog),

      Event::NextProblem => match self.selected_topic.clone() {
        Some(topic_id) => self.request_problem(topic_id, catalog),
        None => Transition::stay(self),
      },

      Event::ProblemLoaded(outcome) => {
        if !matches!(self.phase, Phase::GeneratingProblem { .. }) {
          return Transition::stay(self);
        }
        match outcome {
          Ok(problem) => {
            self.code = problem.starting_code.clone();
            self.phase = Phase::Solving { problem, last_result: None };
          }
          Err(e) => {
            self.error = Some(e.to_string());
            self.code.clear();
            self.phase = Phase::Idle;
          }
        }
        Transition::stay(self)
      }

      Event::EditCode(code) => {
        // Frozen while evaluating so a failed evaluation hands back what was submitted.
        if matches!(self.phase, Phase::Solving { .. } | Phase::Reviewing { .. }) {
          self.code = code;
        }
        Transition::stay(self)
      }

      Event::Submit => {
        if self.code.is_empty() {
          return Transition::stay(self);
        }
        match std::mem::take(&mut self.phase) {
          Phase::Solving { problem, .. } | Phase::Reviewing { problem, .. } => {
            let command = Command::Evaluate { problem: problem.clone(), code: self.code.clone() };
            self.phase = Phase::Evaluating { problem };
            Transition { session: self, command: Some(command) }
          }
          other => {
            self.phase = other;
            Transition::stay(self)
          }
        }
      }

      Event::SubmissionEvaluated(outcome) => {
        match std::mem::take(&mut self.phase) {
          Phase::Evaluating { problem } => match outcome {
            Ok(result) => {
              self.editor_expanded = false;
              self.phase = Phase::Reviewing { problem, result };
            }
            Err(e) => {
              self.error = Some(e.to_string());
              self.phase = Phase::Solving { problem, last_result: None };
            }
          },
          other => self.phase = other,
        }
        Transition::stay(self)
      }

      Event::BackToProblem => {
        self.phase = match std::mem::take(&mut self.phase) {
          Phase::Reviewing { problem, result } => Phase::Solving { problem, last_result: Some(result) },
          other => other,
        };
        Transition::stay(self)
      }

      Event::ShowFeedback => {
        self.phase = match std::mem::take(&mut self.phase) {
          Phase::Solving { problem, last_result: Some(result) } => Phase::Reviewing { problem, result },
          other => other,
        };
        Transition::stay(self)
      }

      Event::Reset => {
        self.phase = match std::mem::take(&mut self.phase) {
          Phase::Solving { problem, .. } | Phase::Reviewing { problem, .. } => {
            self.code = problem.starting_code.clone();
            Phase::Solving { problem, last_result: None }
          }
          other => other,
        };
        Transition::stay(self)
      }

      Event::SetDifficulty(difficulty) => {
        self.difficulty = difficulty;
        Transition::stay(self)
      }

      Event::ToggleLayout => {
        self.editor_expanded = !self.editor_expanded;
        Transition::stay(self)
      }

      Event::DismissError => {
        self.error = None;
        Transition::stay(self)
      }
    }
  }

  fn request_problem(mut self, topic_id: String, catalog: &Catalog) -> Transition {
    if matches!(self.phase, Phase::GeneratingProblem { .. }) {
      return Transition::stay(self);
    }
    let Some(topic) = catalog.get(&topic_id) else {
      warn!(target: "session", %topic_id, "topic id not in catalog; ignoring selection");
      return Transition::stay(self);
    };
    let command = Command::GenerateProblem { topic: topic.name.clone(), difficulty: self.difficulty };
    self.selected_topic = Some(topic_id.clone());
    self.error = None;
    self.editor_expanded = false;
    self.phase = Phase::GeneratingProblem { topic_id };
    Transition { session: self, command: Some(command) }
  }
}

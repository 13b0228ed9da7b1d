//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, EvaluationResult, Problem, Topic};
use crate::session::{Event, Session};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListTopics,
    SelectTopic {
        #[serde(rename = "topicId")]
        topic_id: String,
    },
    NextProblem,
    EditCode {
        code: String,
    },
    Submit,
    Reset,
    BackToProblem,
    ShowFeedback,
    SetDifficulty {
        difficulty: Difficulty,
    },
    ToggleLayout,
    DismissError,
}

impl ClientWsMessage {
    /// Session event carried by this message, if any.
    pub fn into_event(self) -> Option<Event> {
        match self {
            ClientWsMessage::Ping | ClientWsMessage::ListTopics => None,
            ClientWsMessage::SelectTopic { topic_id } => Some(Event::SelectTopic(topic_id)),
            ClientWsMessage::NextProblem => Some(Event::NextProblem),
            ClientWsMessage::EditCode { code } => Some(Event::EditCode(code)),
            ClientWsMessage::Submit => Some(Event::Submit),
            ClientWsMessage::Reset => Some(Event::Reset),
            ClientWsMessage::BackToProblem => Some(Event::BackToProblem),
            ClientWsMessage::ShowFeedback => Some(Event::ShowFeedback),
            ClientWsMessage::SetDifficulty { difficulty } => Some(Event::SetDifficulty(difficulty)),
            ClientWsMessage::ToggleLayout => Some(Event::ToggleLayout),
            ClientWsMessage::DismissError => Some(Event::DismissError),
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Topics { topics: Vec<Topic> },
    Session { session: SessionView },
    Error { message: String },
}

/// Render-ready snapshot of one session.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub phase: &'static str,
    pub selected_topic_id: Option<String>,
    pub difficulty: Difficulty,
    pub problem: Option<Problem>,
    pub code: String,
    /// Present only while reviewing.
    pub evaluation: Option<EvaluationResult>,
    pub feedback_available: bool,
    pub error: Option<String>,
    pub editor_expanded: bool,
    pub controls_locked: bool,
}

impl SessionView {
    pub fn of(session_id: &str, s: &Session) -> Self {
        use crate::session::Phase;
        Self {
            session_id: session_id.to_string(),
            phase: s.phase.name(),
            selected_topic_id: s.selected_topic.clone(),
            difficulty: s.difficulty,
            problem: s.phase.problem().cloned(),
            code: s.code.clone(),
            evaluation: s.phase.result().cloned(),
            feedback_available: matches!(s.phase, Phase::Solving { last_result: Some(_), .. }),
            error: s.error.clone(),
            editor_expanded: s.editor_expanded,
            controls_locked: s.phase.is_busy(),
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemIn {
    pub topic_id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateIn {
    pub problem: Problem,
    pub code: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn parses_client_messages() {
        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"select_topic","topicId":"python-basics"}"#).unwrap();
        assert!(matches!(m.into_event(), Some(Event::SelectTopic(id)) if id == "python-basics"));

        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"set_difficulty","difficulty":"Hard"}"#).unwrap();
        assert!(matches!(m.into_event(), Some(Event::SetDifficulty(Difficulty::Hard))));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(m.into_event().is_none());
    }

    #[test]
    fn rejects_difficulty_outside_the_closed_set() {
        let r = serde_json::from_str::<ClientWsMessage>(r#"{"type":"set_difficulty","difficulty":"Expert"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn idle_snapshot_shape() {
        let v = serde_json::to_value(ServerWsMessage::Session {
            session: SessionView::of("s1", &Session::new()),
        })
        .unwrap();
        assert_eq!(v["type"], "session");
        assert_eq!(v["session"]["phase"], "idle");
        assert_eq!(v["session"]["difficulty"], "Medium");
        assert!(v["session"]["problem"].is_null());
        assert_eq!(v["session"]["controlsLocked"], false);
    }

    #[test]
    fn generating_snapshot_locks_controls() {
        let t = Session::new().apply(Event::SelectTopic("numpy-arrays".into()), &Catalog::default());
        let view = SessionView::of("s1", &t.session);
        assert_eq!(view.phase, "generating_problem");
        assert!(view.controls_locked);
        assert_eq!(view.selected_topic_id.as_deref(), Some("numpy-arrays"));
    }
}

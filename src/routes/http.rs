//! HTTP endpoint handlers. These are thin, stateless wrappers over the driver;
//! the interactive session lives on the WebSocket.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{info, instrument, warn};

use crate::logic::{evaluate_submission, generate_problem};
use crate::protocol::*;
use crate::state::AppState;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(ErrorOut { error: message.into() })).into_response()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_topics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.catalog.topics().to_vec())
}

#[instrument(level = "info", skip(state, body), fields(topic_id = %body.topic_id, difficulty = %body.difficulty))]
pub async fn http_post_problem(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ProblemIn>,
) -> Response {
  let Some(topic) = state.catalog.get(&body.topic_id) else {
    warn!(target: "pydata_tutor", topic_id = %body.topic_id, "HTTP problem requested for unknown topic");
    return error_response(StatusCode::NOT_FOUND, format!("Unknown topicId: {}", body.topic_id));
  };
  match generate_problem(&state, &topic.name, body.difficulty).await {
    Ok(problem) => {
      info!(target: "pydata_tutor", id = %problem.id, "HTTP problem served");
      Json(problem).into_response()
    }
    Err(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
  }
}

#[instrument(level = "info", skip(state, body), fields(problem_id = %body.problem.id, code_len = body.code.len()))]
pub async fn http_post_evaluate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<EvaluateIn>,
) -> Response {
  if body.code.is_empty() {
    return error_response(StatusCode::BAD_REQUEST, "code must not be empty");
  }
  match evaluate_submission(&state, &body.problem, &body.code).await {
    Ok(result) => {
      info!(target: "pydata_tutor", id = %body.problem.id, score = result.score, "HTTP submission evaluated");
      Json(result).into_response()
    }
    Err(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
  };
  use tower::util::ServiceExt;

  use super::*;
  use crate::catalog::Catalog;
  use crate::domain::{EvaluationResult, Problem};
  use crate::error::{OracleError, GENERATION_FAILED};
  use crate::oracle::scripted::{good_result, sum_list, Scripted};
  use crate::routes::build_router;

  fn router_with(oracle: Scripted) -> (Router, Arc<Scripted>) {
    let oracle = Arc::new(oracle);
    let state = AppState::new(Catalog::default(), oracle.clone(), oracle.clone());
    (build_router(Arc::new(state), "./static"), oracle)
  }

  fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
      .method(Method::POST)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (router, _) = router_with(Scripted::default());
    let resp = router
      .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["ok"], true);
  }

  #[tokio::test]
  async fn topics_lists_catalog() {
    let (router, _) = router_with(Scripted::default());
    let resp = router
      .oneshot(Request::builder().uri("/api/v1/topics").body(Body::empty()).unwrap())
      .await
      .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v.as_array().map(|a| a.len()), Some(5));
    assert_eq!(v[0]["id"], "python-basics");
  }

  #[tokio::test]
  async fn root_serves_page_with_markdown_description() {
    let (router, _) = router_with(Scripted::default());
    let resp = router
      .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8_lossy(&bytes);
    assert!(page.contains("markdown(p.description)"));
    assert!(page.contains(r#"view.phase !== "evaluating""#));
  }

  #[tokio::test]
  async fn problem_uses_topic_name_and_default_difficulty() {
    let (router, oracle) = router_with(Scripted::default().with_problem(Ok(sum_list())));
    let resp = router
      .oneshot(post_json("/api/v1/problem", serde_json::json!({ "topicId": "python-basics" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let p: Problem = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(p, sum_list());
    assert_eq!(oracle.calls()[0].1, "Python Basics|Medium");
  }

  #[tokio::test]
  async fn problem_for_unknown_topic_is_404() {
    let (router, oracle) = router_with(Scripted::default());
    let resp = router
      .oneshot(post_json("/api/v1/problem", serde_json::json!({ "topicId": "nope", "difficulty": "Hard" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(oracle.calls().is_empty());
  }

  #[tokio::test]
  async fn generation_failure_is_bad_gateway_with_generic_message() {
    let (router, _) = router_with(Scripted::default().with_problem(Err(OracleError::MissingApiKey)));
    let resp = router
      .oneshot(post_json("/api/v1/problem", serde_json::json!({ "topicId": "numpy-arrays", "difficulty": "Easy" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(resp).await["error"], GENERATION_FAILED);
  }

  #[tokio::test]
  async fn evaluate_returns_result() {
    let (router, _) = router_with(Scripted::default().with_evaluation(Ok(good_result())));
    let body = serde_json::json!({ "problem": sum_list(), "code": "def solve(xs): return sum(xs)" });
    let resp = router.oneshot(post_json("/api/v1/evaluate", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let r: EvaluationResult = serde_json::from_value(body_json(resp).await).unwrap();
    assert_eq!(r.score, 95);
  }

  #[tokio::test]
  async fn evaluate_rejects_empty_code() {
    let (router, oracle) = router_with(Scripted::default());
    let body = serde_json::json!({ "problem": sum_list(), "code": "" });
    let resp = router.oneshot(post_json("/api/v1/evaluate", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(oracle.calls().is_empty());
  }
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use rig::{completion::CompletionModel, embeddings::EmbeddingModel};
use tracing::{error, info, warn};

use crate::index::VectorStore;
use crate::search::Answerer;

use super::models::{AskRequest, AskResponse};

pub async fn ask_handler<C, E, S>(
    State(answerer): State<Arc<Answerer<C, E, S>>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> (StatusCode, Json<AskResponse>)
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
    S: VectorStore,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected ask request: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(AskResponse::failed(rejection.body_text())),
            );
        }
    };

    if let Err(message) = request.validate() {
        return (StatusCode::BAD_REQUEST, Json(AskResponse::failed(message)));
    }

    match answerer.answer(&request.question, &request.session_id).await {
        Ok(answer) => {
            info!(session_id = %request.session_id, "Answered question");
            (StatusCode::OK, Json(AskResponse::success(answer)))
        }
        Err(e) => {
            error!(session_id = %request.session_id, "Failed to answer: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AskResponse::failed(e.public_message())),
            )
        }
    }
}

//! HTTP handlers.

use {
    axum::{
        Form, Json,
        extract::{FromRequest, Path, Request, State},
        http::{StatusCode, header},
        response::IntoResponse,
    },
    serde::Deserialize,
    tracing::{info, warn},
    whatsend_whatsapp::SendRequest,
};

use crate::{
    AppState,
    error::{Error, Result},
    templates::render_index,
};

#[derive(Debug, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub message: String,
}

pub async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    render_index(&state.ui, state.version)
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
    }))
}

/// Start a send job. Accepts a JSON or urlencoded form body.
pub async fn send_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse> {
    let form = parse_send_form(request).await?;
    let request = SendRequest::new(form.contact.trim(), form.message);
    if !request.is_complete() {
        return Err(Error::Incomplete);
    }

    let job = state.jobs.start()?;
    let job_id = job.id().to_string();
    info!(job = %job_id, contact = %request.contact, "send requested");

    let sender = state.sender.clone();
    tokio::spawn(async move {
        let result = sender.run(&request, job.as_ref()).await;
        job.finish(result);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "job_id": job_id })),
    ))
}

pub async fn job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let job = state
        .jobs
        .get(&id)
        .ok_or_else(|| Error::JobNotFound(id.clone()))?;
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(job.view())))
}

async fn parse_send_form(request: Request) -> Result<SendForm> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let Json(form) = Json::<SendForm>::from_request(request, &())
            .await
            .map_err(|e| {
                warn!(error = %e, "rejected send body");
                Error::BadRequest(e.body_text())
            })?;
        Ok(form)
    } else {
        let Form(form) = Form::<SendForm>::from_request(request, &())
            .await
            .map_err(|e| {
                warn!(error = %e, "rejected send body");
                Error::BadRequest(e.body_text())
            })?;
        Ok(form)
    }
}

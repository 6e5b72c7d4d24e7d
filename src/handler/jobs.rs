// handler/jobs.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::marketdtos::*,
    error::HttpError,
    middleware::AuthenticatedCaller,
    service::error::ServiceError,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route("/:job_id", get(get_job))
        .route("/:job_id/award", put(award_job))
        .route("/:job_id/complete", put(complete_job))
        .route("/:job_id/proposals", get(get_job_proposals).post(submit_proposal))
        .route("/:job_id/escrow", get(get_job_escrow))
        .route("/:job_id/events", get(get_job_events))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(caller.id, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", JobResponseDto::from(job))),
    ))
}

pub async fn list_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<JobListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let jobs = app_state
        .job_service
        .get_jobs(
            params.open_only.unwrap_or(false),
            params.page.unwrap_or(1),
            params.limit.unwrap_or(20),
        )
        .await?;

    let jobs: Vec<JobResponseDto> = jobs.into_iter().map(JobResponseDto::from).collect();
    Ok(Json(ApiResponse::success("Jobs retrieved successfully", jobs)))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job retrieved successfully", JobResponseDto::from(job))))
}

pub async fn award_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(job_id): Path<i64>,
    Json(body): Json<AwardJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .job_service
        .award_job(caller.id, job_id, body.freelancer_id)
        .await?;

    Ok(Json(ApiResponse::success("Job awarded successfully", JobResponseDto::from(job))))
}

pub async fn complete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state.job_service.complete_job(caller.id, job_id).await?;

    Ok(Json(ApiResponse::success("Job completed and escrow released", result)))
}

pub async fn submit_proposal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(job_id): Path<i64>,
    Json(body): Json<SubmitProposalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let proposal = app_state
        .proposal_service
        .submit_proposal(caller.id, job_id, &body.description, body.bid)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Proposal submitted successfully", proposal)),
    ))
}

pub async fn get_job_proposals(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state.proposal_service.get_job_proposals(job_id).await?;

    Ok(Json(ApiResponse::success("Proposals retrieved successfully", proposals)))
}

pub async fn get_job_escrow(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let holding = app_state
        .escrow_service
        .get_holding(job_id)
        .await?
        .ok_or(ServiceError::JobNotFound(job_id))?;

    Ok(Json(ApiResponse::success("Escrow retrieved successfully", holding)))
}

pub async fn get_job_events(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    // Unknown jobs are a 404 rather than an empty history.
    app_state.job_service.get_job(job_id).await?;
    let events = app_state.event_service.job_events(job_id).await?;

    Ok(Json(ApiResponse::success("Job events retrieved successfully", events)))
}

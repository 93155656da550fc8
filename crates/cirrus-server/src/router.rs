//! Router and handlers for the clusters API

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use cirrus_common::api::{Cluster, ClusterList, ClusterSpec, ClusterStatus, ListArguments};
use cirrus_service::ClustersService;

use crate::error::ApiError;

/// Shared handler state: the lifecycle service façade
pub type AppState = Arc<dyn ClustersService>;

/// Build the API router
pub fn router(service: AppState) -> Router {
    Router::new()
        .nest(
            "/api/clusters_mgmt/v1",
            Router::new()
                .route("/clusters", get(list_clusters).post(create_cluster))
                .route("/clusters/{id}", get(get_cluster))
                .route("/clusters/{id}/status", get(get_cluster_status)),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: u32,
    #[serde(default = "default_page_size")]
    size: u32,
}

fn default_page_size() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    #[serde(default = "default_provision")]
    provision: bool,
}

fn default_provision() -> bool {
    true
}

async fn list_clusters(
    State(service): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ClusterList>, ApiError> {
    let list = service
        .list(ListArguments {
            page: query.page,
            size: query.size,
        })
        .await?;
    Ok(Json(list))
}

async fn create_cluster(
    State(service): State<AppState>,
    Query(query): Query<CreateQuery>,
    Json(spec): Json<ClusterSpec>,
) -> Result<(StatusCode, Json<Cluster>), ApiError> {
    let cluster = service.create(spec, query.provision).await?;
    Ok((StatusCode::CREATED, Json(cluster)))
}

async fn get_cluster(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Cluster>, ApiError> {
    Ok(Json(service.get(&id).await?))
}

async fn get_cluster_status(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClusterStatus>, ApiError> {
    Ok(Json(service.get_status(&id).await?))
}

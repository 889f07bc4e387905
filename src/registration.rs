//! HTTP endpoint for registering records.
//!
//! `POST /v1/addDNSRecord` takes a url-encoded form with the fields of
//! [`RecordSubmission`]. Records become visible to the query path as soon as
//! the insert commits.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::metrics;
use crate::record::RecordSubmission;
use crate::store::RecordStore;

#[derive(Clone)]
struct RegistrationState {
    store: Arc<dyn RecordStore>,
}

/// Registration routes, rooted at `/v1`.
pub fn routes(store: Arc<dyn RecordStore>) -> Router {
    Router::new()
        .route("/v1/addDNSRecord", post(add_record_handler))
        .with_state(RegistrationState { store })
}

async fn add_record_handler(
    State(state): State<RegistrationState>,
    Form(submission): Form<RecordSubmission>,
) -> Response {
    let record = match submission.validate() {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "rejected record submission");
            metrics::record_registration("invalid");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    if let Err(e) = state.store.insert(&record).await {
        error!(name = %record.name, zone = %record.zone, error = %e, "failed to store record");
        metrics::record_registration("error");
        return (StatusCode::INTERNAL_SERVER_ERROR, "record store unavailable").into_response();
    }

    info!(
        name = %record.name,
        zone = %record.zone,
        rtype = %record.record_type(),
        user = %record.user,
        "registered record"
    );
    metrics::record_registration("created");
    (StatusCode::OK, Json(record)).into_response()
}

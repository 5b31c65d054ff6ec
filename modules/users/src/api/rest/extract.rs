use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::api::rest::error::ApiError;

/// JSON body that has passed its `validator` rules. Malformed JSON, a wrong
/// content type, missing fields and rule failures all reject with 400.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "rejected request body");
            ApiError::invalid_body()
        })?;
        value.validate().map_err(|e| {
            tracing::debug!(error = %e, "request body failed validation");
            ApiError::invalid_body()
        })?;
        Ok(ValidatedJson(value))
    }
}

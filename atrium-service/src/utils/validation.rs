use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// JSON body that must also pass its `validator` rules.
///
/// Malformed JSON is a 400, rule violations a 422 listing each field message.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e.body_text()))
                .into_response()
        })?;

        value
            .validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(value))
    }
}

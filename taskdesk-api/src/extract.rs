/// Request extractors that reject with [`ApiError`]
///
/// axum's stock `Json`, `Query` and `Path` reject with plain-text bodies.
/// These wrappers turn those rejections into the JSON envelope, and the
/// `Validated*` variants also run `validator` rules (422 on failure).

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// `Path` extractor with an enveloped 400 on malformed segments
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// JSON body that has passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string that has passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Paged {
        #[validate(range(min = 1, max = 100))]
        limit: Option<u32>,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/named",
                post(|ValidatedJson(body): ValidatedJson<Named>| async move { body.name }),
            )
            .route(
                "/paged",
                get(|ValidatedQuery(q): ValidatedQuery<Paged>| async move {
                    q.limit.unwrap_or(10).to_string()
                }),
            )
            .route(
                "/items/:id",
                get(|ApiPath(id): ApiPath<Uuid>| async move { id.to_string() }),
            )
    }

    async fn status_of(req: axum::http::Request<Body>) -> StatusCode {
        app().oneshot(req).await.unwrap().status()
    }

    fn post_json(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::post("/named")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_validated_json() {
        assert_eq!(status_of(post_json(r#"{"name":"a"}"#)).await, StatusCode::OK);
        assert_eq!(
            status_of(post_json(r#"{"name":""}"#)).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(post_json("{not json")).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validated_query() {
        let get = |uri: &str| axum::http::Request::get(uri).body(Body::empty()).unwrap();

        assert_eq!(status_of(get("/paged?limit=5")).await, StatusCode::OK);
        assert_eq!(
            status_of(get("/paged?limit=500")).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(get("/paged?limit=abc")).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_path_rejects_malformed_uuid() {
        let req = axum::http::Request::get("/items/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::BAD_REQUEST);

        let req = axum::http::Request::get(format!("/items/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::OK);
    }
}

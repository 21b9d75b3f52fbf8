use crate::adapter::driver::rest_api::ApiError;
use crate::domain::model::{Requester, UserId};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;

/// 認証済み利用者エクストラクター
/// 上流のIdentity & Accessゲートウェイが検証済みの
/// x-user-id / x-user-admin ヘッダーを読み取る
/// このサービス自身は資格情報を検証しない
pub struct AuthenticatedUser(pub Requester);

fn unauthorized() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError {
            error: "Authentication required".to_string(),
            code: "UNAUTHORIZED".to_string(),
        }),
    )
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id_header = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(unauthorized)?;

        let user_id = UserId::from_string(user_id_header).map_err(|_| unauthorized())?;

        let is_admin = parts
            .headers
            .get("x-user-admin")
            .and_then(|value| value.to_str().ok())
            .map(|value| value == "true")
            .unwrap_or(false);

        Ok(AuthenticatedUser(Requester::new(user_id, is_admin)))
    }
}

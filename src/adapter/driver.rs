// ドライバーアダプター（入力側）
// REST APIでアプリケーションサービスを公開する

pub mod auth;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;

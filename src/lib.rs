// オンライン書店バックエンド
// カタログ・カート・注文・請求書を提供するREST API

pub mod adapter;
pub mod application;
pub mod domain;

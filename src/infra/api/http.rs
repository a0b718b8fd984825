use crate::types::{ContentError, ContentResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTPクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// 指定されたURLからテキストを取得する
    ///
    /// # Arguments
    /// * `url` - 取得対象のURL
    /// * `timeout_secs` - タイムアウト時間（秒）
    async fn fetch_text(&self, url: &str, timeout_secs: u64) -> ContentResult<String>;
}

/// `reqwest` を使用した本番用のHTTPクライアント実装
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// 新しいHTTPクライアントを作成
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch_text(&self, url: &str, timeout_secs: u64) -> ContentResult<String> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| ContentError::http(url, format!("リクエストの送信に失敗: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::http(url, format!("ステータス {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| ContentError::http(url, format!("レスポンステキストの取得に失敗: {}", e)))
    }
}

/// テスト用のモックHTTPクライアント
///
/// 実際のHTTPリクエストを行わずに、定義済みのレスポンスやエラーを返します。
pub struct MockHttpClient {
    /// モック時に返すレスポンス内容
    pub mock_response: String,
    /// 成功/失敗の制御
    pub should_succeed: bool,
    /// エラー時に返すメッセージ
    pub error_message: Option<String>,
}

impl MockHttpClient {
    /// 成功レスポンスを返すモッククライアントを作成
    pub fn new_success(mock_response: &str) -> Self {
        Self {
            mock_response: mock_response.to_string(),
            should_succeed: true,
            error_message: None,
        }
    }

    /// エラーレスポンスを返すモッククライアントを作成
    pub fn new_error(error_message: &str) -> Self {
        Self {
            mock_response: String::new(),
            should_succeed: false,
            error_message: Some(error_message.to_string()),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn fetch_text(&self, url: &str, _timeout_secs: u64) -> ContentResult<String> {
        if self.should_succeed {
            Ok(self.mock_response.clone())
        } else {
            let error_msg = self.error_message.as_deref().unwrap_or("Mock HTTP error");
            Err(ContentError::http(url, format!("モックHTTPエラー: {}", error_msg)))
        }
    }
}

use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// 設定関連のエラー型
/// 環境変数から読み込んだ設定値の検証エラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定値が不正
    #[error("設定値が不正です: {reason}")]
    InvalidValue { reason: String },
}

impl ConfigError {
    /// 不正な設定値エラーを作成
    pub fn invalid_value<R: Into<String>>(reason: R) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_CONTENT_DIR: &str = "content";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// コンテンツ取得の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// ファイルソースのルートディレクトリ
    pub content_dir: PathBuf,
    /// 設定されている場合はHTTPソース（JSONインデックス）を使用する
    pub index_url: Option<String>,
    pub http_timeout_secs: u64,
    /// キャッシュの有効期間（秒）。Noneなら期限なし
    pub cache_ttl_secs: Option<u64>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            index_url: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            cache_ttl_secs: None,
        }
    }
}

impl ContentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// - `CONTENT_DIR`: コンテンツディレクトリ（既定値 `content`）
    /// - `CONTENT_INDEX_URL`: HTTPソースのインデックスURL
    /// - `CONTENT_HTTP_TIMEOUT`: HTTPタイムアウト秒数（既定値 30）
    /// - `CONTENT_CACHE_TTL`: キャッシュ有効期間の秒数
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テストでは環境変数を汚さずに使う）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = non_empty(lookup("CONTENT_DIR")) {
            config.content_dir = PathBuf::from(dir);
        }
        config.index_url = non_empty(lookup("CONTENT_INDEX_URL"));

        if let Some(raw) = non_empty(lookup("CONTENT_HTTP_TIMEOUT")) {
            config.http_timeout_secs = parse_secs("CONTENT_HTTP_TIMEOUT", &raw)?;
        }
        if let Some(raw) = non_empty(lookup("CONTENT_CACHE_TTL")) {
            config.cache_ttl_secs = Some(parse_secs("CONTENT_CACHE_TTL", &raw)?);
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(name: &str, raw: &str) -> ConfigResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| ConfigError::invalid_value(format!("{}は秒数で指定してください: {}", name, raw)))
}

use crate::types::ConfigError;
use thiserror::Error;

/// コンテンツ取得で発生するエラー型
/// ファイルシステム、パース、HTTP、フィルター解釈、ローダーのキャッシュに関するエラーを定義
#[derive(Error, Debug)]
pub enum ContentError {
    /// ファイルシステムエラー
    #[error("ファイルシステムエラー: {path} - {source}")]
    FileSystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML（フロントマター含む）の解析エラー
    #[error("YAML解析エラー: {context} - {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSONの解析・変換エラー
    #[error("JSON処理エラー: {context} - {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTPソースからの取得エラー
    #[error("HTTP取得エラー: {url} - {message}")]
    Http { url: String, message: String },

    /// ドキュメントとして扱えないデータ
    #[error("不正なドキュメント: {context} - {reason}")]
    InvalidDocument { context: String, reason: String },

    /// フィルター条件の解釈エラー
    #[error("不正なフィルター: {reason}")]
    InvalidFilter { reason: String },

    /// 同じキーに別の形の結果がキャッシュされている
    #[error("キー '{key}' には{cached}の結果がキャッシュされています（要求: {requested}）")]
    KeyConflict {
        key: String,
        cached: &'static str,
        requested: &'static str,
    },

    /// ブロッキング処理のタスクが完了しなかった
    #[error("バックグラウンドタスクエラー: {context} - {source}")]
    Task {
        context: String,
        #[source]
        source: tokio::task::JoinError,
    },

    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ContentError {
    /// ファイルシステムエラーを作成
    pub fn file_system<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// YAML解析エラーを作成
    pub fn yaml<C: Into<String>>(context: C, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            context: context.into(),
            source,
        }
    }

    /// JSON処理エラーを作成
    pub fn json<C: Into<String>>(context: C, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// HTTP取得エラーを作成
    pub fn http<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Http {
            url: url.into(),
            message: message.into(),
        }
    }

    /// 不正なドキュメントエラーを作成
    pub fn invalid_document<C: Into<String>, R: Into<String>>(context: C, reason: R) -> Self {
        Self::InvalidDocument {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// バックグラウンドタスクエラーを作成
    pub fn task<C: Into<String>>(context: C, source: tokio::task::JoinError) -> Self {
        Self::Task {
            context: context.into(),
            source,
        }
    }

    /// 不正なフィルターエラーを作成
    pub fn invalid_filter<R: Into<String>>(reason: R) -> Self {
        Self::InvalidFilter {
            reason: reason.into(),
        }
    }
}

/// コンテンツエラーのResult型エイリアス
pub type ContentResult<T> = std::result::Result<T, ContentError>;

//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定: 環境変数から読み込むコンテンツ取得設定
//! - エラー型: 各層で共有するコンテンツエラー

pub mod config;
pub mod error;

// 便利な再エクスポート
pub use config::{ConfigError, ConfigResult, ContentConfig};
pub use error::{ContentError, ContentResult};

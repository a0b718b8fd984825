//! ドメイン層
//!
//! - `content`: ドキュメントモデルとコンテンツクエリ
//! - `fetch`: 一覧/単一取得のアダプター

pub mod content;
pub mod fetch;

//! インフラ層
//!
//! ファイル・HTTPからのドキュメント読み込み、パース、キー付きローダー、ログ初期化を提供する。

pub mod api;
pub mod loader;
pub mod logging;
pub mod parser;
pub mod source;
pub mod storage;

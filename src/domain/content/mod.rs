pub mod model;
pub mod query;

// 公開APIの再エクスポート
pub use model::{derive_id, derive_path, normalize_collection, ContentDocument};
pub use query::{Condition, ContentQuery, Filter, SortDirection, SortSpec};

use crate::domain::content::{ContentDocument, ContentQuery, Filter, SortSpec};
use crate::infra::api::http::ReqwestHttpClient;
use crate::infra::loader::KeyedLoader;
use crate::infra::source::{ContentSource, FileContentSource, HttpContentSource};
use crate::types::{ContentConfig, ContentError, ContentResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 下書きフラグのフィールド名
pub const DRAFT_FIELD: &str = "draft";
/// 一覧の並び順に使うフィールド名（降順）
pub const ORDER_FIELD: &str = "id";

/// ローダーにキャッシュされる取得結果
///
/// 一覧取得と単一取得は同じキー空間を共有する。
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedContent {
    List(Vec<ContentDocument>),
    One(Option<ContentDocument>),
}

impl FetchedContent {
    fn shape(&self) -> &'static str {
        match self {
            FetchedContent::List(_) => "一覧",
            FetchedContent::One(_) => "単一",
        }
    }
}

/// コンテンツ取得アダプター
///
/// クエリを組み立て、実行とキャッシュはキー付きローダーに委ねる。
/// リトライや検証、エラーの変換は行わない。
pub struct ContentFetcher {
    source: Arc<dyn ContentSource>,
    loader: KeyedLoader<FetchedContent>,
}

impl ContentFetcher {
    /// 期限なしのキャッシュでアダプターを作成
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self::with_loader(source, KeyedLoader::new())
    }

    pub fn with_loader(source: Arc<dyn ContentSource>, loader: KeyedLoader<FetchedContent>) -> Self {
        Self { source, loader }
    }

    /// 設定からソースとキャッシュを選んでアダプターを作成する
    ///
    /// `index_url` があればHTTPソース、なければ `content_dir` のファイルソースを使う。
    pub fn from_config(config: &ContentConfig) -> Self {
        let source: Arc<dyn ContentSource> = match &config.index_url {
            Some(url) => Arc::new(HttpContentSource::new(
                ReqwestHttpClient::new(),
                url.clone(),
                config.http_timeout_secs,
            )),
            None => Arc::new(FileContentSource::new(config.content_dir.clone())),
        };
        let ttl = config.cache_ttl_secs.map(Duration::from_secs);
        Self::with_loader(source, KeyedLoader::with_ttl(ttl))
    }

    /// # 概要
    /// コレクション内の公開ドキュメントを一覧で取得する。
    ///
    /// ## 動作
    /// - 下書き（`draft: true`）は常に除外する
    /// - `filter` があれば条件を追加する（`draft` の指定は下書き除外で上書きされる）
    /// - `id` の降順で並べる
    /// - 結果は `key` でキャッシュされ、同じキーの2回目以降はソースを読まない
    ///
    /// ## 戻り値
    /// 一致するドキュメントのリスト。無ければ空
    pub async fn fetch_all(
        &self,
        key: &str,
        collection: &str,
        filter: Option<Filter>,
    ) -> ContentResult<Vec<ContentDocument>> {
        let source = self.source.as_ref();
        let fetched = self
            .loader
            .load(key, || async move {
                let filter = filter
                    .unwrap_or_default()
                    .merge(Filter::new().ne(DRAFT_FIELD, true));

                let documents = ContentQuery::new(source, collection)
                    .where_filter(filter)
                    .sort(SortSpec::desc(ORDER_FIELD))
                    .find()
                    .await?;
                info!(key, collection, count = documents.len(), "一覧を取得しました");
                Ok(FetchedContent::List(documents))
            })
            .await?;

        match fetched {
            FetchedContent::List(documents) => Ok(documents),
            other => Err(key_conflict(key, &other, "一覧")),
        }
    }

    /// # 概要
    /// 条件に一致する最初のドキュメントを1件取得する。
    ///
    /// ## 動作
    /// - 全ドキュメントが対象（コレクションの絞り込みなし）
    /// - 下書きの除外も並び替えも行わない
    /// - 結果は `key` でキャッシュされる（「一致なし」もキャッシュされる）
    pub async fn fetch_one(&self, key: &str, filter: Filter) -> ContentResult<Option<ContentDocument>> {
        let source = self.source.as_ref();
        let fetched = self
            .loader
            .load(key, || async move {
                let document = ContentQuery::all(source)
                    .where_filter(filter)
                    .find_one()
                    .await?;
                info!(key, found = document.is_some(), "ドキュメントを取得しました");
                Ok(FetchedContent::One(document))
            })
            .await?;

        match fetched {
            FetchedContent::One(document) => Ok(document),
            other => Err(key_conflict(key, &other, "単一")),
        }
    }

    /// キーのキャッシュを破棄する。次の取得でソースを読み直す
    pub async fn invalidate(&self, key: &str) -> bool {
        self.loader.invalidate(key).await
    }

    /// 全キャッシュを破棄する
    pub async fn clear_cache(&self) {
        self.loader.clear().await
    }
}

fn key_conflict(key: &str, cached: &FetchedContent, requested: &'static str) -> ContentError {
    debug!(key, cached = cached.shape(), requested, "キーの結果の形が一致しません");
    ContentError::KeyConflict {
        key: key.to_string(),
        cached: cached.shape(),
        requested,
    }
}

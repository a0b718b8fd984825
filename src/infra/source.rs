use crate::domain::content::model::{ContentDocument, PATH_FIELD};
use crate::infra::api::http::HttpClient;
use crate::infra::parser::parse_document;
use crate::infra::storage::file::{collect_content_files, read_text, relative_slash_path};
use crate::types::{ContentError, ContentResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// コンテンツソースの抽象化トレイト
///
/// クエリエンジンはこのトレイト越しにドキュメントを読み込む。
/// 返す順序がそのまま「ソース順」になる。
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn load_documents(&self) -> ContentResult<Vec<ContentDocument>>;
}

/// コンテンツディレクトリ（markdown / yaml / json）を読むソース
pub struct FileContentSource {
    root: PathBuf,
}

impl FileContentSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentSource for FileContentSource {
    async fn load_documents(&self) -> ContentResult<Vec<ContentDocument>> {
        // ディレクトリ走査とパースはブロッキングなので専用スレッドで行う
        let root = self.root.clone();
        let documents = tokio::task::spawn_blocking(move || read_content_dir(&root))
            .await
            .map_err(|e| ContentError::task(self.root.display().to_string(), e))??;

        debug!(
            root = %self.root.display(),
            count = documents.len(),
            "コンテンツファイルを読み込みました"
        );
        Ok(documents)
    }
}

fn read_content_dir(root: &Path) -> ContentResult<Vec<ContentDocument>> {
    let files = collect_content_files(root)?;

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let relative = relative_slash_path(root, &file);
        let text = read_text(&file)?;
        documents.push(parse_document(&relative, &text)?);
    }
    Ok(documents)
}

/// JSONインデックス（ドキュメントの配列）をHTTPで取得するソース
///
/// 各ドキュメントは `_path` を持つJSONオブジェクトである必要がある。
pub struct HttpContentSource<H: HttpClient> {
    client: H,
    index_url: String,
    timeout_secs: u64,
}

impl<H: HttpClient> HttpContentSource<H> {
    pub fn new<U: Into<String>>(client: H, index_url: U, timeout_secs: u64) -> Self {
        Self {
            client,
            index_url: index_url.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl<H: HttpClient> ContentSource for HttpContentSource<H> {
    async fn load_documents(&self) -> ContentResult<Vec<ContentDocument>> {
        let text = self
            .client
            .fetch_text(&self.index_url, self.timeout_secs)
            .await?;

        let documents = parse_index(&self.index_url, &text)?;
        debug!(
            url = %self.index_url,
            count = documents.len(),
            "コンテンツインデックスを取得しました"
        );
        Ok(documents)
    }
}

/// インデックスJSONをドキュメント列に変換する
fn parse_index(context: &str, text: &str) -> ContentResult<Vec<ContentDocument>> {
    let value: Value = serde_json::from_str(text).map_err(|e| ContentError::json(context, e))?;

    let Value::Array(items) = value else {
        return Err(ContentError::invalid_document(
            context,
            "インデックスはドキュメントの配列である必要があります",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let document = ContentDocument::from_value(item).ok_or_else(|| {
                ContentError::invalid_document(
                    format!("{}[{}]", context, i),
                    "オブジェクトではありません",
                )
            })?;
            if !matches!(document.get(PATH_FIELD), Some(Value::String(_))) {
                return Err(ContentError::invalid_document(
                    format!("{}[{}]", context, i),
                    "_pathがありません",
                ));
            }
            Ok(document)
        })
        .collect()
}

/// 固定のドキュメントを返すソース（テストや組み込み用途）
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    documents: Vec<ContentDocument>,
}

impl MemoryContentSource {
    pub fn new(documents: Vec<ContentDocument>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn load_documents(&self) -> ContentResult<Vec<ContentDocument>> {
        Ok(self.documents.clone())
    }
}

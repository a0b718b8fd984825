use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// ソースが付与する予約フィールド
pub const PATH_FIELD: &str = "_path";
pub const ID_FIELD: &str = "_id";
pub const FILE_FIELD: &str = "_file";
pub const EXTENSION_FIELD: &str = "_extension";
pub const BODY_FIELD: &str = "body";

/// コンテンツドキュメント
///
/// 形はコンテンツ側が決める不透明なレコード（JSONオブジェクト）。
/// ソースが `_path` などの予約フィールドを付与し、残りはフロントマターやデータそのもの。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDocument {
    fields: Map<String, Value>,
}

impl ContentDocument {
    /// フィールドマップからドキュメントを作成
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// パスを指定してドキュメントを作成（テストやメモリソース向け）
    pub fn with_path<P: Into<String>>(path: P) -> Self {
        let mut fields = Map::new();
        fields.insert(PATH_FIELD.to_string(), Value::String(path.into()));
        Self { fields }
    }

    /// JSON値からドキュメントを作成する。オブジェクト以外はNone
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// フィールドを追加したドキュメントを返す
    pub fn field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// `_path` の値。未設定なら空文字列
    pub fn path(&self) -> &str {
        self.fields
            .get(PATH_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// ドット区切りのフィールドパスで値を取得する（例: `author.name`）
    pub fn get(&self, field: &str) -> Option<&Value> {
        lookup_field(&self.fields, field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl fmt::Display for ContentDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fields.get("title").and_then(Value::as_str) {
            Some(title) => write!(f, "{} ({})", self.path(), title),
            None => write!(f, "{}", self.path()),
        }
    }
}

/// コンテンツディレクトリからの相対ファイルパスをルート風のパスに変換する
///
/// - 拡張子を除去
/// - 先頭の数字による並び順プレフィックスを除去（`1.intro` → `intro`）
/// - 末尾の `index` は親ディレクトリを指す
///
/// # 例
/// - `blog/first-post.md` → `/blog/first-post`
/// - `blog/index.md` → `/blog`
/// - `index.md` → `/`
pub fn derive_path(relative_file: &str) -> String {
    let without_ext = match relative_file.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() => stem,
        _ => relative_file,
    };

    let mut segments: Vec<&str> = without_ext
        .split('/')
        .filter(|s| !s.is_empty())
        .map(strip_order_prefix)
        .collect();

    if segments.last() == Some(&"index") {
        segments.pop();
    }

    format!("/{}", segments.join("/"))
}

/// 相対ファイルパスからドキュメントIDを作成する（`blog/a.md` → `content:blog:a.md`）
pub fn derive_id(relative_file: &str) -> String {
    format!("content:{}", relative_file.replace('/', ":"))
}

/// フィールド名（またはドット区切りのパス）で値を取得する
///
/// リテラルのキーを優先し、見つからなければオブジェクトと配列の添字をたどる。
pub fn lookup_field<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    if let Some(value) = fields.get(field) {
        return Some(value);
    }

    let mut segments = field.split('.');
    let first = segments.next()?;
    let mut current = fields.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// `2.install.md` のような並び順プレフィックスを分解する（`(2, "install.md")`）
pub fn split_order_prefix(segment: &str) -> Option<(u64, &str)> {
    let (prefix, rest) = segment.split_once('.')?;
    if prefix.is_empty() || rest.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((prefix.parse().ok()?, rest))
}

fn strip_order_prefix(segment: &str) -> &str {
    match segment.split_once('.') {
        Some((prefix, rest))
            if !prefix.is_empty()
                && !rest.is_empty()
                && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => segment,
    }
}

/// コレクション指定をパスプレフィックスに正規化する
///
/// 空文字列と `/` は全件を意味し、Noneを返す
pub fn normalize_collection(collection: &str) -> Option<String> {
    let trimmed = collection.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}

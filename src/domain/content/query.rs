use super::model::{lookup_field, normalize_collection, ContentDocument};
use crate::infra::source::ContentSource;
use crate::types::{ContentError, ContentResult};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// 1フィールドに対する条件
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// trueなら存在すること、falseなら存在しないこと（nullは存在扱い）
    Exists(bool),
    /// 配列なら要素として含む、文字列なら部分文字列として含む
    Contains(Value),
    /// 同じフィールドに対する複数条件（全て満たす）
    All(Vec<Condition>),
    /// オブジェクト値の各フィールドに対する条件（指定外のフィールドは問わない）
    Nested(Filter),
}

impl Condition {
    /// JSON表現から条件を作成する
    ///
    /// オブジェクト以外の値は等価条件になる。オブジェクトはキーで判別する。
    ///
    /// - 全てのキーが `$` で始まる → 演算子オブジェクト
    /// - `$` で始まるキーがない → 入れ子のフィルター（部分一致）
    /// - 両方が混在する → `InvalidFilter`
    ///
    /// # 例
    /// - `"news"` → `Eq("news")`
    /// - `{"$ne": true}` → `Ne(true)`
    /// - `{"$gte": 1, "$lt": 5}` → `All([Gte(1), Lt(5)])`
    /// - `{"name": "Aki"}` → `Nested({name: Eq("Aki")})`
    pub fn from_json(value: &Value) -> ContentResult<Self> {
        let operators = match value {
            Value::Object(map) => {
                let operator_count = map.keys().filter(|k| k.starts_with('$')).count();
                if operator_count == 0 {
                    return Ok(Condition::Nested(Filter::from_map(map)?));
                }
                if operator_count != map.len() {
                    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                    return Err(ContentError::invalid_filter(format!(
                        "演算子とフィールド名を同じオブジェクトに混在させることはできません: {}",
                        keys.join(", ")
                    )));
                }
                map
            }
            _ => return Ok(Condition::Eq(value.clone())),
        };

        let mut conditions = operators
            .iter()
            .map(|(op, operand)| Self::from_operator(op, operand))
            .collect::<ContentResult<Vec<_>>>()?;

        if conditions.len() == 1 {
            Ok(conditions.remove(0))
        } else {
            Ok(Condition::All(conditions))
        }
    }

    fn from_operator(op: &str, operand: &Value) -> ContentResult<Self> {
        let condition = match op {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$in" => Condition::In(expect_array(op, operand)?),
            "$nin" => Condition::Nin(expect_array(op, operand)?),
            "$gt" => Condition::Gt(operand.clone()),
            "$gte" => Condition::Gte(operand.clone()),
            "$lt" => Condition::Lt(operand.clone()),
            "$lte" => Condition::Lte(operand.clone()),
            "$exists" => match operand {
                Value::Bool(flag) => Condition::Exists(*flag),
                _ => {
                    return Err(ContentError::invalid_filter(
                        "$existsには真偽値を指定してください",
                    ))
                }
            },
            "$contains" => Condition::Contains(operand.clone()),
            other => {
                return Err(ContentError::invalid_filter(format!(
                    "未知の演算子: {}",
                    other
                )))
            }
        };
        Ok(condition)
    }

    /// フィールド値（存在しない場合はNone）が条件を満たすか判定する
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => actual.is_some_and(|v| loose_eq(v, expected)),
            Condition::Ne(expected) => !actual.is_some_and(|v| loose_eq(v, expected)),
            Condition::In(candidates) => {
                actual.is_some_and(|v| candidates.iter().any(|c| loose_eq(v, c)))
            }
            Condition::Nin(candidates) => {
                !actual.is_some_and(|v| candidates.iter().any(|c| loose_eq(v, c)))
            }
            Condition::Gt(bound) => compare_bound(actual, bound, |o| o == Ordering::Greater),
            Condition::Gte(bound) => compare_bound(actual, bound, |o| o != Ordering::Less),
            Condition::Lt(bound) => compare_bound(actual, bound, |o| o == Ordering::Less),
            Condition::Lte(bound) => compare_bound(actual, bound, |o| o != Ordering::Greater),
            Condition::Exists(flag) => actual.is_some() == *flag,
            Condition::Contains(needle) => actual.is_some_and(|v| contains(v, needle)),
            Condition::All(conditions) => conditions.iter().all(|c| c.matches(actual)),
            Condition::Nested(filter) => match actual {
                Some(Value::Object(fields)) => filter.matches_fields(fields),
                _ => false,
            },
        }
    }
}

fn expect_array(op: &str, operand: &Value) -> ContentResult<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(ContentError::invalid_filter(format!(
            "{}には配列を指定してください",
            op
        ))),
    }
}

/// 数値は表現（整数/浮動小数）に関係なく値で比較する
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_bound<F>(actual: Option<&Value>, bound: &Value, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    let ordering = match (actual, bound) {
        (Some(Value::Number(x)), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Some(Value::String(x)), Value::String(y)) => Some(x.as_str().cmp(y.as_str())),
        _ => None,
    };
    ordering.is_some_and(accept)
}

fn contains(actual: &Value, needle: &Value) -> bool {
    match (actual, needle) {
        (Value::Array(items), Value::Array(needles)) => needles
            .iter()
            .all(|n| items.iter().any(|item| loose_eq(item, n))),
        (Value::Array(items), _) => items.iter().any(|item| loose_eq(item, needle)),
        (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
        (Value::String(text), Value::Array(parts)) => parts
            .iter()
            .all(|p| p.as_str().is_some_and(|p| text.contains(p))),
        _ => false,
    }
}

/// フィールド名から条件へのマッピング。全ての条件を満たすドキュメントだけが残る
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等価条件を追加する
    pub fn eq<K: Into<String>, V: Into<Value>>(self, field: K, value: V) -> Self {
        self.with(field, Condition::Eq(value.into()))
    }

    /// 非等価条件を追加する
    pub fn ne<K: Into<String>, V: Into<Value>>(self, field: K, value: V) -> Self {
        self.with(field, Condition::Ne(value.into()))
    }

    /// 条件を追加する。同じフィールドの既存条件は置き換える
    pub fn with<K: Into<String>>(mut self, field: K, condition: Condition) -> Self {
        self.insert(field, condition);
        self
    }

    pub fn insert<K: Into<String>>(&mut self, field: K, condition: Condition) {
        self.conditions.insert(field.into(), condition);
    }

    /// 別のフィルターを合成する。重複するフィールドは `other` が優先される
    pub fn merge(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// JSONオブジェクト（`{"category": "news", "id": {"$gt": 3}}`）からフィルターを作成する
    pub fn from_json(value: &Value) -> ContentResult<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Null => Ok(Self::new()),
            _ => Err(ContentError::invalid_filter(
                "フィルターはJSONオブジェクトで指定してください",
            )),
        }
    }

    fn from_map(map: &Map<String, Value>) -> ContentResult<Self> {
        let mut filter = Self::new();
        for (field, raw) in map {
            if field.starts_with('$') {
                return Err(ContentError::invalid_filter(format!(
                    "トップレベルの演算子には対応していません: {}",
                    field
                )));
            }
            filter.insert(field.clone(), Condition::from_json(raw)?);
        }
        Ok(filter)
    }

    /// ドキュメントが全ての条件を満たすか判定する
    pub fn matches(&self, document: &ContentDocument) -> bool {
        self.matches_fields(document.fields())
    }

    fn matches_fields(&self, fields: &Map<String, Value>) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(lookup_field(fields, field)))
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}

impl TryFrom<Value> for Filter {
    type Error = ContentError;

    fn try_from(value: Value) -> ContentResult<Self> {
        Filter::from_json(&value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
        write!(f, "[{}]", fields.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// 並び替え指定（先に追加したキーが優先）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<(String, SortDirection)>,
}

impl SortSpec {
    pub fn asc<K: Into<String>>(field: K) -> Self {
        Self::default().then_asc(field)
    }

    pub fn desc<K: Into<String>>(field: K) -> Self {
        Self::default().then_desc(field)
    }

    pub fn then_asc<K: Into<String>>(mut self, field: K) -> Self {
        self.keys.push((field.into(), SortDirection::Asc));
        self
    }

    pub fn then_desc<K: Into<String>>(mut self, field: K) -> Self {
        self.keys.push((field.into(), SortDirection::Desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 2つのドキュメントを比較する
    pub fn compare(&self, a: &ContentDocument, b: &ContentDocument) -> Ordering {
        self.keys
            .iter()
            .map(|(field, direction)| compare_sort_values(a.get(field), b.get(field), *direction))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// 並び替え用の値比較
///
/// 値なし（null含む）は方向に関係なく常に末尾。
/// 数値同士は数値として、それ以外は文字列表現で比較する。
fn compare_sort_values(
    a: Option<&Value>,
    b: Option<&Value>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };

    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => sort_text(a).cmp(&sort_text(b)),
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn sort_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// コンテンツクエリ
///
/// コレクション（パスプレフィックス）を起点に、`where_filter` と `sort` を積み上げ、
/// `find` / `find_one` でソースに対して実行する。
///
/// ```ignore
/// let docs = ContentQuery::new(&source, "/blog")
///     .where_filter(Filter::new().ne("draft", true))
///     .sort(SortSpec::desc("id"))
///     .find()
///     .await?;
/// ```
pub struct ContentQuery<'a> {
    source: &'a dyn ContentSource,
    collection: Option<String>,
    filter: Filter,
    sort: SortSpec,
}

impl<'a> ContentQuery<'a> {
    /// 指定コレクションに対するクエリを作成する。空文字列や `/` は全件
    pub fn new(source: &'a dyn ContentSource, collection: &str) -> Self {
        Self {
            source,
            collection: normalize_collection(collection),
            filter: Filter::new(),
            sort: SortSpec::default(),
        }
    }

    /// 全ドキュメントに対するクエリを作成する
    pub fn all(source: &'a dyn ContentSource) -> Self {
        Self::new(source, "")
    }

    /// 条件を追加する。同じフィールドは後から指定した条件で置き換わる
    pub fn where_filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::take(&mut self.filter).merge(filter);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// 条件に一致する全ドキュメントを取得する
    pub async fn find(&self) -> ContentResult<Vec<ContentDocument>> {
        let documents = self.source.load_documents().await?;
        Ok(self.apply(documents))
    }

    /// 条件に一致する最初のドキュメントを取得する
    pub async fn find_one(&self) -> ContentResult<Option<ContentDocument>> {
        let documents = self.source.load_documents().await?;
        Ok(self.apply(documents).into_iter().next())
    }

    /// 読み込み済みドキュメントにコレクション・条件・並び替えを適用する
    pub fn apply(&self, documents: Vec<ContentDocument>) -> Vec<ContentDocument> {
        let mut matched: Vec<ContentDocument> = documents
            .into_iter()
            .filter(|doc| self.in_collection(doc))
            .filter(|doc| self.filter.matches(doc))
            .collect();

        if !self.sort.is_empty() {
            // 安定ソートなので同値はソース順のまま
            matched.sort_by(|a, b| self.sort.compare(a, b));
        }
        matched
    }

    fn in_collection(&self, document: &ContentDocument) -> bool {
        match &self.collection {
            Some(prefix) => document.path().starts_with(prefix.as_str()),
            None => true,
        }
    }
}

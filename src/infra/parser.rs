use crate::domain::content::model::{
    derive_id, derive_path, ContentDocument, BODY_FIELD, EXTENSION_FIELD, FILE_FIELD, ID_FIELD,
    PATH_FIELD,
};
use crate::types::{ContentError, ContentResult};
use serde_json::{Map, Value};

const FRONTMATTER_DELIM: &str = "---";

/// ファイルソースが読み込む拡張子
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["md", "yaml", "yml", "json"];

/// マークダウンをフロントマター（YAML文字列）と本文に分割する
///
/// 先頭行が `---` で、以降に閉じの `---` がある場合のみフロントマターとみなす。
pub fn split_frontmatter(text: &str) -> (Option<String>, String) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();

    if lines.first().map(|l| l.trim_end()) != Some(FRONTMATTER_DELIM) {
        return (None, text.to_string());
    }

    let end_idx = lines
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, line)| (line.trim_end() == FRONTMATTER_DELIM).then_some(i));

    let Some(end_idx) = end_idx else {
        return (None, text.to_string());
    };

    let raw = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n");
    (Some(raw), body.trim_start_matches('\n').to_string())
}

/// 本文から最初の見出し（`# `）を取り出す
pub fn extract_first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
}

/// YAML文字列をフィールドマップに変換する
fn parse_yaml_fields(raw: &str, context: &str) -> ContentResult<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(raw).map_err(|e| ContentError::yaml(context, e))?;
    Ok(into_fields(value))
}

fn parse_json_fields(raw: &str, context: &str) -> ContentResult<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ContentError::json(context, e))?;
    Ok(into_fields(value))
}

/// オブジェクトはそのまま、それ以外（配列やスカラー）は `body` に格納する
fn into_fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert(BODY_FIELD.to_string(), other);
            map
        }
    }
}

fn parse_markdown_fields(text: &str, context: &str) -> ContentResult<Map<String, Value>> {
    let (frontmatter, body) = split_frontmatter(text);
    let mut fields = match frontmatter {
        Some(raw) => parse_yaml_fields(&raw, context)?,
        None => Map::new(),
    };

    if !fields.contains_key("title") {
        if let Some(heading) = extract_first_heading(&body) {
            fields.insert("title".to_string(), Value::String(heading));
        }
    }
    fields.insert(BODY_FIELD.to_string(), Value::String(body));
    Ok(fields)
}

/// コンテンツファイルの内容をドキュメントに変換する
///
/// # 引数
/// - `relative_file`: コンテンツディレクトリからの相対パス（区切りは `/`）
/// - `text`: ファイルの内容
///
/// # 戻り値
/// 予約フィールド（`_path`, `_id`, `_file`, `_extension`）を付与したドキュメント
pub fn parse_document(relative_file: &str, text: &str) -> ContentResult<ContentDocument> {
    let extension = relative_file
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let mut fields = match extension.as_str() {
        "md" => parse_markdown_fields(text, relative_file)?,
        "yaml" | "yml" => parse_yaml_fields(text, relative_file)?,
        "json" => parse_json_fields(text, relative_file)?,
        other => {
            return Err(ContentError::invalid_document(
                relative_file,
                format!("未対応の拡張子です: {}", other),
            ))
        }
    };

    fields.insert(PATH_FIELD.to_string(), Value::String(derive_path(relative_file)));
    fields.insert(ID_FIELD.to_string(), Value::String(derive_id(relative_file)));
    fields.insert(FILE_FIELD.to_string(), Value::String(relative_file.to_string()));
    fields.insert(EXTENSION_FIELD.to_string(), Value::String(extension));

    Ok(ContentDocument::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_frontmatter() {
        let text = "---\ntitle: Hello\nid: 3\n---\n\n# Heading\nBody";
        let (fm, body) = split_frontmatter(text);
        assert_eq!(fm.as_deref(), Some("title: Hello\nid: 3"));
        assert_eq!(body, "# Heading\nBody");
    }

    #[test]
    fn test_split_without_frontmatter() {
        let (fm, body) = split_frontmatter("# Just markdown\n");
        assert!(fm.is_none());
        assert_eq!(body, "# Just markdown\n");

        // 閉じ区切りがない場合は本文として扱う
        let (fm, _) = split_frontmatter("---\ntitle: open\n");
        assert!(fm.is_none());
    }

    #[test]
    fn test_parse_markdown_document() {
        let text = "---\nid: 7\ndraft: true\ntags:\n  - rust\n  - web\n---\n# First Post\nHello";
        let doc = parse_document("blog/1.first-post.md", text).unwrap();

        assert_eq!(doc.path(), "/blog/first-post");
        assert_eq!(doc.get("id"), Some(&json!(7)));
        assert_eq!(doc.get("draft"), Some(&json!(true)));
        assert_eq!(doc.get("tags"), Some(&json!(["rust", "web"])));
        assert_eq!(doc.get("title"), Some(&json!("First Post")));
        assert_eq!(doc.get("_id"), Some(&json!("content:blog:1.first-post.md")));
        assert_eq!(doc.get("_extension"), Some(&json!("md")));
        assert_eq!(doc.get("body"), Some(&json!("# First Post\nHello")));
    }

    #[test]
    fn test_frontmatter_title_wins_over_heading() {
        let doc = parse_document("a.md", "---\ntitle: From FM\n---\n# From Heading\n").unwrap();
        assert_eq!(doc.get("title"), Some(&json!("From FM")));
    }

    #[test]
    fn test_parse_yaml_and_json_documents() {
        let yaml = parse_document("authors/jane.yml", "name: Jane\nid: 2\n").unwrap();
        assert_eq!(yaml.path(), "/authors/jane");
        assert_eq!(yaml.get("name"), Some(&json!("Jane")));

        let json_doc = parse_document("data/index.json", r#"{"id": 1, "items": [1, 2]}"#).unwrap();
        assert_eq!(json_doc.path(), "/data");
        assert_eq!(json_doc.get("items"), Some(&json!([1, 2])));

        let list = parse_document("data/list.json", "[1, 2, 3]").unwrap();
        assert_eq!(list.get("body"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_reserved_fields_are_stamped_by_source() {
        let doc = parse_document("blog/a.json", r#"{"_path": "/elsewhere"}"#).unwrap();
        assert_eq!(doc.path(), "/blog/a");
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_document("bad.json", "{not json").unwrap_err();
        assert!(matches!(err, ContentError::Json { .. }));

        let err = parse_document("bad.md", "---\n: : :\n  - [\n---\n").unwrap_err();
        assert!(matches!(err, ContentError::Yaml { .. }));

        let err = parse_document("notes.txt", "plain").unwrap_err();
        assert!(matches!(err, ContentError::InvalidDocument { .. }));
    }
}

use crate::app::cli::{Cli, Commands};
use crate::domain::content::{Condition, Filter};
use crate::domain::fetch::ContentFetcher;
use crate::types::{ContentConfig, ContentError, ContentResult};
use anyhow::{Context, Result};
use serde_json::Value;

/// CLIの引数を環境変数由来の設定に上書きする
pub fn resolve_config(cli: &Cli, mut config: ContentConfig) -> ContentConfig {
    if let Some(dir) = &cli.content_dir {
        config.content_dir = dir.clone();
        // ディレクトリを明示した場合はファイルソースを使う
        config.index_url = None;
    }
    if let Some(url) = &cli.index_url {
        config.index_url = Some(url.clone());
    }
    config
}

/// `FIELD=VALUE` 形式の条件をフィルターに変換する
///
/// 値はJSONとして解釈できればJSON（`true`, `3`, `{"$ne": 1}` など）、できなければ文字列。
pub fn parse_where_args(args: &[String]) -> ContentResult<Filter> {
    let mut filter = Filter::new();
    for arg in args {
        let (field, raw) = arg.split_once('=').ok_or_else(|| {
            ContentError::invalid_filter(format!("FIELD=VALUE形式で指定してください: {}", arg))
        })?;
        let field = field.trim();
        if field.is_empty() {
            return Err(ContentError::invalid_filter(format!(
                "フィールド名が空です: {}",
                arg
            )));
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        filter.insert(field, Condition::from_json(&value)?);
    }
    Ok(filter)
}

/// サブコマンドを実行し、結果のJSONを返す
pub async fn execute(fetcher: &ContentFetcher, command: &Commands) -> Result<Value> {
    match command {
        Commands::All {
            collection,
            key,
            conditions,
        } => {
            let filter = parse_where_args(conditions)?;
            let filter = (!filter.is_empty()).then_some(filter);
            let key = key.as_deref().unwrap_or(collection);

            let documents = fetcher
                .fetch_all(key, collection, filter)
                .await
                .with_context(|| format!("一覧の取得に失敗しました: {}", collection))?;
            serde_json::to_value(documents).context("結果のJSON変換に失敗しました")
        }
        Commands::One { key, conditions } => {
            let filter = parse_where_args(conditions)?;
            let key = key.clone().unwrap_or_else(|| conditions.join("&"));

            let document = fetcher
                .fetch_one(&key, filter)
                .await
                .with_context(|| format!("ドキュメントの取得に失敗しました: {}", key))?;
            serde_json::to_value(document).context("結果のJSON変換に失敗しました")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentDocument;
    use crate::infra::source::MemoryContentSource;
    use clap::Parser;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_where_args_values() {
        let filter =
            parse_where_args(&args(&["category=news", "id=3", "draft=false", r#"rank={"$gt":1}"#]))
                .unwrap();

        assert_eq!(filter.get("category"), Some(&Condition::Eq(json!("news"))));
        assert_eq!(filter.get("id"), Some(&Condition::Eq(json!(3))));
        assert_eq!(filter.get("draft"), Some(&Condition::Eq(json!(false))));
        assert_eq!(filter.get("rank"), Some(&Condition::Gt(json!(1))));
    }

    #[test]
    fn test_parse_where_args_keeps_equals_in_value() {
        let filter = parse_where_args(&args(&["query=a=b"])).unwrap();
        assert_eq!(filter.get("query"), Some(&Condition::Eq(json!("a=b"))));
    }

    #[test]
    fn test_parse_where_args_errors() {
        assert!(parse_where_args(&args(&["category"])).is_err());
        assert!(parse_where_args(&args(&["=news"])).is_err());
        assert!(parse_where_args(&args(&[r#"id={"$regex":"x"}"#])).is_err());
    }

    #[test]
    fn test_resolve_config_flags_override_env() {
        let env_config = ContentConfig {
            index_url: Some("http://env/index.json".to_string()),
            ..ContentConfig::default()
        };

        let cli = Cli::parse_from(["contentdoggo", "--content-dir", "site", "all", "blog"]);
        let config = resolve_config(&cli, env_config.clone());
        assert_eq!(config.content_dir, PathBuf::from("site"));
        assert!(config.index_url.is_none());

        let cli = Cli::parse_from(["contentdoggo", "one", "--where", "slug=a"]);
        let config = resolve_config(&cli, env_config.clone());
        assert_eq!(config, env_config);
    }

    #[tokio::test]
    async fn test_execute_all_and_one() {
        let source = MemoryContentSource::new(vec![
            ContentDocument::with_path("/blog/a").field("id", 1).field("slug", "a"),
            ContentDocument::with_path("/blog/b").field("id", 2).field("draft", true).field("slug", "b"),
        ]);
        let fetcher = ContentFetcher::new(Arc::new(source));

        let cli = Cli::parse_from(["contentdoggo", "all", "blog"]);
        let listed = execute(&fetcher, &cli.command).await.unwrap();
        assert_eq!(listed, json!([{"_path": "/blog/a", "id": 1, "slug": "a"}]));

        let cli = Cli::parse_from(["contentdoggo", "one", "--where", "slug=b"]);
        let one = execute(&fetcher, &cli.command).await.unwrap();
        assert_eq!(one["_path"], json!("/blog/b"));

        let cli = Cli::parse_from(["contentdoggo", "one", "--where", "slug=zzz"]);
        let none = execute(&fetcher, &cli.command).await.unwrap();
        assert_eq!(none, Value::Null);
    }
}

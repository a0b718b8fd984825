//! コンテンツディレクトリを使った一覧/単一取得の統合テスト

use contentdoggo::domain::content::{ContentDocument, Filter};
use contentdoggo::domain::fetch::ContentFetcher;
use contentdoggo::types::ContentConfig;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// ブログとプロジェクトのサンプルコンテンツを作成する
fn create_content_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("一時ディレクトリの作成に失敗");
    let root = dir.path();

    write(root, "index.md", "---\ntitle: Home\n---\nWelcome");
    write(
        root,
        "blog/1.hello.md",
        "---\nid: 1\ncategory: news\ntags: [intro]\nauthor:\n  name: Aki\n  links: [x]\n---\n# Hello\nFirst post",
    );
    write(
        root,
        "blog/2.wip.md",
        "---\nid: 5\ncategory: news\ndraft: true\n---\n# Work in progress",
    );
    write(
        root,
        "blog/3.rust.md",
        "---\nid: 3\ncategory: tech\ntags: [rust, async]\n---\n# Rust",
    );
    write(
        root,
        "blog/4.tokio.md",
        "---\nid: 12\ncategory: tech\ndraft: false\n---\n# Tokio",
    );
    write(root, "projects/site.yaml", "id: 2\ntitle: Site\ncategory: web\n");
    write(root, "projects/cli.json", r#"{"id": 7, "title": "CLI", "category": "tool"}"#);
    write(root, "_drafts/ignored.md", "---\nid: 99\n---\n# Ignored");
    dir
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn fetcher_for(dir: &TempDir) -> ContentFetcher {
    let config = ContentConfig {
        content_dir: dir.path().to_path_buf(),
        ..ContentConfig::default()
    };
    ContentFetcher::from_config(&config)
}

fn titles(documents: &[ContentDocument]) -> Vec<&str> {
    documents
        .iter()
        .map(|d| d.get("title").and_then(Value::as_str).unwrap_or(""))
        .collect()
}

#[tokio::test]
async fn test_fetch_all_blog_lists_published_posts_newest_first() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let posts = fetcher.fetch_all("blog", "/blog", None).await.unwrap();

    assert_eq!(titles(&posts), vec!["Tokio", "Rust", "Hello"]);
    assert!(posts.iter().all(|p| p.get("draft") != Some(&json!(true))));
    assert_eq!(posts[2].path(), "/blog/hello");
}

#[tokio::test]
async fn test_fetch_all_with_filter() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let tech = fetcher
        .fetch_all("blog-tech", "blog", Some(Filter::new().eq("category", "tech")))
        .await
        .unwrap();
    assert_eq!(titles(&tech), vec!["Tokio", "Rust"]);

    let filter = Filter::from_json(&json!({"tags": {"$contains": "rust"}})).unwrap();
    let rusty = fetcher.fetch_all("blog-rust", "blog", Some(filter)).await.unwrap();
    assert_eq!(titles(&rusty), vec!["Rust"]);
}

#[tokio::test]
async fn test_fetch_all_with_multi_field_filter() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let filter =
        Filter::from_json(&json!({"category": "tech", "tags": {"$contains": "rust"}})).unwrap();
    let posts = fetcher.fetch_all("blog-tech-rust", "blog", Some(filter)).await.unwrap();
    assert_eq!(titles(&posts), vec!["Rust"], "全ての条件を満たすものだけ");

    let filter = Filter::from_json(&json!({"category": "news", "id": {"$gte": 2}})).unwrap();
    let posts = fetcher.fetch_all("blog-news-new", "blog", Some(filter)).await.unwrap();
    assert!(posts.is_empty(), "下書きを除くとnewsでidが2以上の記事はない");
}

#[tokio::test]
async fn test_fetch_one_with_multi_field_filter() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let wip = fetcher
        .fetch_one("news-draft", Filter::new().eq("category", "news").eq("draft", true))
        .await
        .unwrap()
        .expect("下書きのnews記事が見つかるはず");
    assert_eq!(wip.path(), "/blog/wip");

    let none = fetcher
        .fetch_one("tech-draft", Filter::new().eq("category", "tech").eq("draft", true))
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_fetch_with_nested_object_filter() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let filter = Filter::from_json(&json!({"author": {"name": "Aki"}})).unwrap();
    let posts = fetcher.fetch_all("by-aki", "blog", Some(filter.clone())).await.unwrap();
    assert_eq!(titles(&posts), vec!["Hello"], "authorの一部のフィールドだけで一致する");

    let hello = fetcher.fetch_one("one-by-aki", filter).await.unwrap();
    assert_eq!(hello.map(|d| d.path().to_string()), Some("/blog/hello".to_string()));

    let mixed = Filter::from_json(&json!({"author": {"name": "Aki", "$exists": true}}));
    assert!(mixed.is_err(), "演算子とフィールド名の混在は拒否される");
}

#[tokio::test]
async fn test_fetch_one_follows_numeric_file_order() {
    let dir = tempfile::tempdir().expect("一時ディレクトリの作成に失敗");
    write(dir.path(), "docs/10.faq.md", "---\nsection: guide\n---\n# FAQ");
    write(dir.path(), "docs/2.install.md", "---\nsection: guide\n---\n# Install");
    let fetcher = fetcher_for(&dir);

    let first = fetcher
        .fetch_one("guide", Filter::new().eq("section", "guide"))
        .await
        .unwrap()
        .expect("ガイドが見つかるはず");
    assert_eq!(first.path(), "/docs/install", "2.は10.より先");

    let guides = fetcher.fetch_all("guides", "docs", None).await.unwrap();
    assert_eq!(titles(&guides), vec!["Install", "FAQ"], "idがなければファイル順");
}

#[tokio::test]
async fn test_fetch_all_mixed_formats() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let projects = fetcher.fetch_all("projects", "projects", None).await.unwrap();
    assert_eq!(titles(&projects), vec!["CLI", "Site"]);
    assert_eq!(projects[0].get("_extension"), Some(&json!("json")));
}

#[tokio::test]
async fn test_fetch_all_everything_skips_ignored_entries() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let everything = fetcher.fetch_all("all", "/", None).await.unwrap();
    assert_eq!(everything.len(), 6, "下書き1件と_drafts以下を除く");
    // idのないドキュメントは末尾
    assert_eq!(everything.last().map(|d| d.path()), Some("/"));
}

#[tokio::test]
async fn test_fetch_one_by_path_and_draft() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let home = fetcher
        .fetch_one("home", Filter::new().eq("_path", "/"))
        .await
        .unwrap()
        .expect("トップページが見つかるはず");
    assert_eq!(home.get("body"), Some(&json!("Welcome")));

    let wip = fetcher
        .fetch_one("wip", Filter::new().eq("_path", "/blog/wip"))
        .await
        .unwrap();
    assert!(wip.is_some(), "単一取得は下書きも返す");
}

#[tokio::test]
async fn test_cached_result_survives_content_changes_until_invalidated() {
    let dir = create_content_dir();
    let fetcher = fetcher_for(&dir);

    let before = fetcher.fetch_all("blog", "/blog", None).await.unwrap();
    write(dir.path(), "blog/5.new.md", "---\nid: 20\n---\n# New");

    let cached = fetcher.fetch_all("blog", "/blog", None).await.unwrap();
    assert_eq!(before, cached);

    fetcher.invalidate("blog").await;
    let refreshed = fetcher.fetch_all("blog", "/blog", None).await.unwrap();
    assert_eq!(titles(&refreshed)[0], "New");
}

#[tokio::test]
async fn test_missing_content_dir_yields_empty_results() {
    let config = ContentConfig {
        content_dir: "does/not/exist".into(),
        ..ContentConfig::default()
    };
    let fetcher = ContentFetcher::from_config(&config);

    assert!(fetcher.fetch_all("k", "/blog", None).await.unwrap().is_empty());
    assert!(fetcher
        .fetch_one("one", Filter::new().eq("id", 1))
        .await
        .unwrap()
        .is_none());
}

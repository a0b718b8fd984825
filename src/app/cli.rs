use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contentdoggo", version, about = "コンテンツの一覧/単一取得CLI")]
pub struct Cli {
    #[arg(long, global = true, help = "コンテンツディレクトリ（CONTENT_DIRより優先）")]
    pub content_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "JSONインデックスのURL（CONTENT_INDEX_URLより優先）"
    )]
    pub index_url: Option<String>,
    #[arg(long, global = true, help = "ログをJSONで出力する")]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// コレクションの公開ドキュメントを id 降順で一覧表示する
    All {
        collection: String,
        #[arg(long, help = "キャッシュキー（省略時はコレクション名）")]
        key: Option<String>,
        #[arg(long = "where", value_name = "FIELD=VALUE", help = "条件（複数指定可）")]
        conditions: Vec<String>,
    },
    /// 条件に一致する最初のドキュメントを表示する（下書きも対象）
    One {
        #[arg(long, help = "キャッシュキー（省略時は条件から生成）")]
        key: Option<String>,
        #[arg(
            long = "where",
            value_name = "FIELD=VALUE",
            required = true,
            help = "条件（複数指定可）"
        )]
        conditions: Vec<String>,
    },
}

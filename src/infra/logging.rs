use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人が読む形式
    Pretty,
    /// JSON構造化ログ
    Json,
}

const DEFAULT_FILTER: &str = "contentdoggo=info";

static INIT_ONCE: Once = Once::new();

/// ログを初期化する（2回目以降の呼び出しは何もしない）
///
/// `RUST_LOG` が設定されていればそれを使い、なければ `contentdoggo=info`。
/// 出力先はstderr（stdoutは取得結果のJSONに使う）。
pub fn init(format: LogFormat) {
    INIT_ONCE.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        // 既にグローバルなsubscriberがある場合（テストなど）は失敗を無視する
        let _ = match format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
    });
}

use crate::domain::content::model::split_order_prefix;
use crate::infra::parser::SUPPORTED_EXTENSIONS;
use std::cmp::Ordering;
use crate::types::{ContentError, ContentResult};
use std::fs;
use std::path::{Path, PathBuf};

/// ファイルの内容を文字列として読み込む
/// パースやデータ変換は呼び出し側で行う
pub fn read_text(file_path: &Path) -> ContentResult<String> {
    fs::read_to_string(file_path)
        .map_err(|e| ContentError::file_system(file_path.display().to_string(), e))
}

/// コンテンツディレクトリ以下の対象ファイルを再帰的に収集する
///
/// - ディレクトリごとに名前順で返す（ソース順の安定化）。`2.` や `10.` の並び順プレフィックスは数値で比較する
/// - `.` や `_` で始まるファイル・ディレクトリは無視する
/// - ルートが存在しない場合は空
pub fn collect_content_files(root: &Path) -> ContentResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    collect_content_files_inner(root, &mut out)?;
    Ok(out)
}

fn collect_content_files_inner(dir: &Path, out: &mut Vec<PathBuf>) -> ContentResult<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| ContentError::file_system(dir.display().to_string(), e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ContentError::file_system(dir.display().to_string(), e))?;
    entries.sort_by(|a, b| {
        compare_entry_names(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
    });

    for entry in entries {
        let path = entry.path();
        if is_ignored(&path) {
            continue;
        }
        if path.is_dir() {
            collect_content_files_inner(&path, out)?;
        } else if path.is_file() && has_supported_extension(&path) {
            out.push(path);
        }
    }

    Ok(())
}

/// プレフィックス付きの名前を数値順で先に、それ以外を名前順で後に並べる
fn compare_entry_names(a: &str, b: &str) -> Ordering {
    match (split_order_prefix(a), split_order_prefix(b)) {
        (Some((na, rest_a)), Some((nb, rest_b))) => na.cmp(&nb).then_with(|| rest_a.cmp(rest_b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') || name.starts_with('_'))
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// ルートからの相対パスを `/` 区切りの文字列にする
pub fn relative_slash_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

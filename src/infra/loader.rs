use crate::types::{ContentError, ContentResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

#[derive(Debug, Clone)]
struct Loaded<T> {
    value: T,
    loaded_at: DateTime<Utc>,
}

type Slot<T> = Arc<OnceCell<Loaded<T>>>;

/// キー単位でキャッシュと重複排除を行う非同期ローダー
///
/// ## 動作
/// - キャッシュ済みのキーはローダー関数を呼ばずに値を返す
/// - 同じキーへの同時呼び出しは1回のロードを共有する
/// - ロードが失敗した場合はキャッシュしない（次の呼び出しで再試行）。空のスロットも残さない
/// - TTLを設定した場合、期限切れのエントリは次のアクセスで再ロードする。
///   他のキーの期限切れエントリはスロット取得時にまとめて破棄する
///
/// キーのマップのロックはロード中には保持しない。
pub struct KeyedLoader<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
    ttl: Option<Duration>,
}

impl<T: Clone> KeyedLoader<T> {
    /// 期限なしのローダーを作成
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl: None,
        }
    }

    /// TTL付きのローダーを作成（Noneなら期限なし）
    pub fn with_ttl(ttl: Option<std::time::Duration>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl: ttl.map(|d| Duration::from_std(d).unwrap_or(Duration::MAX)),
        }
    }

    /// キーに対応する値を取得する。未ロードなら `loader` を実行してキャッシュする
    pub async fn load<F, Fut>(&self, key: &str, loader: F) -> ContentResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ContentResult<T>>,
    {
        let slot = self.slot(key).await;
        if slot.initialized() {
            debug!(key, "キャッシュヒット");
        }

        let result = slot
            .get_or_try_init(|| async {
                debug!(key, "キャッシュミス: ロードを実行します");
                let value = loader().await?;
                Ok::<_, ContentError>(Loaded {
                    value,
                    loaded_at: Utc::now(),
                })
            })
            .await;

        match result {
            Ok(loaded) => Ok(loaded.value.clone()),
            Err(e) => {
                self.discard_empty_slot(key, &slot).await;
                Err(e)
            }
        }
    }

    /// 失敗したロードのスロットを取り除く
    ///
    /// 別の呼び出しが差し替えたスロットや、待機中の呼び出しが初期化したスロットは残す。
    async fn discard_empty_slot(&self, key: &str, slot: &Slot<T>) {
        let mut slots = self.slots.lock().await;
        let is_same_empty_slot = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if is_same_empty_slot {
            slots.remove(key);
        }
    }

    /// キーに対応するスロットを取得する。無い、または期限切れなら新しいスロットに差し替える
    async fn slot(&self, key: &str) -> Slot<T> {
        let mut slots = self.slots.lock().await;
        if self.ttl.is_some() {
            slots.retain(|_, slot| !slot.get().is_some_and(|loaded| self.is_expired(loaded)));
        }

        let reusable = slots
            .get(key)
            .filter(|slot| !slot.get().is_some_and(|loaded| self.is_expired(loaded)))
            .cloned();
        if let Some(slot) = reusable {
            return slot;
        }

        let slot: Slot<T> = Arc::new(OnceCell::new());
        slots.insert(key.to_string(), Arc::clone(&slot));
        slot
    }

    fn is_expired(&self, loaded: &Loaded<T>) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now() - loaded.loaded_at >= ttl,
            None => false,
        }
    }

    /// キーのキャッシュを破棄する。破棄した場合はtrue
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.slots.lock().await.remove(key);
        let was_cached = removed.is_some_and(|slot| slot.initialized());
        debug!(key, was_cached, "キャッシュを破棄しました");
        was_cached
    }

    /// 全てのキャッシュを破棄する
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
        debug!("全キャッシュを破棄しました");
    }

    /// キーの値がキャッシュ済みか
    pub async fn contains(&self, key: &str) -> bool {
        self.slots
            .lock()
            .await
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    /// キャッシュ済みのキー数
    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<T: Clone> Default for KeyedLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

use dashmap::DashMap;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::types::Turn;

/// 单个用户的对话历史
struct SessionEntry {
    turns: VecDeque<Turn>,
    /// 最近一次写入的逻辑时钟，用于 LRU 淘汰
    last_write: u64,
    touched_at: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        SessionEntry {
            turns: VecDeque::new(),
            last_write: 0,
            touched_at: Instant::now(),
        }
    }
}

/// 会话存储 - 按 user_id 保存最近的对话，仅在进程生命周期内有效
///
/// 底层是分片的 DashMap，同一个 key 的读写在分片锁内完成，
/// 不同 key 之间没有全局锁。`recency` 按写入时钟索引 key，
/// 淘汰时直接取最小项，不扫描整张表。
///
/// 加锁顺序：分片锁 → `recency`，淘汰时两把锁不同时持有。
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    recency: Mutex<BTreeMap<u64, String>>,
    context_window: usize,
    max_sessions: usize,
    clock: AtomicU64,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_limits(config.context_window, config.max_sessions)
    }

    pub fn with_limits(context_window: usize, max_sessions: usize) -> Self {
        SessionStore {
            sessions: DashMap::new(),
            recency: Mutex::new(BTreeMap::new()),
            context_window,
            max_sessions: max_sessions.max(1),
            clock: AtomicU64::new(1),
        }
    }

    /// 最近的若干条消息，按时间先后排列；未知用户返回空
    pub fn get_context(&self, user_id: &str) -> Vec<Turn> {
        self.sessions
            .get(user_id)
            .map(|entry| entry.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 追加一问一答，两条消息在同一把分片锁内写入
    pub fn append(&self, user_id: &str, user_turn: Turn, assistant_turn: Turn) {
        let mut created = false;

        {
            let mut entry = self
                .sessions
                .entry(user_id.to_string())
                .or_insert_with(|| {
                    created = true;
                    SessionEntry::new()
                });

            entry.turns.push_back(user_turn);
            entry.turns.push_back(assistant_turn);
            while entry.turns.len() > self.context_window {
                entry.turns.pop_front();
            }

            // 在分片锁内取时钟，保证同一个 key 的时钟单调递增
            let tick = self.clock.fetch_add(1, Ordering::Relaxed);
            let previous = std::mem::replace(&mut entry.last_write, tick);
            entry.touched_at = Instant::now();

            let mut recency = self.recency();
            recency.remove(&previous);
            recency.insert(tick, user_id.to_string());
        }

        if created {
            debug!(user_id, "创建新会话");
            self.evict_overflow(user_id);
        }
    }

    /// 删除指定会话
    pub fn remove(&self, user_id: &str) -> bool {
        match self.sessions.remove(user_id) {
            Some((_, entry)) => {
                self.recency().remove(&entry.last_write);
                true
            }
            None => false,
        }
    }

    /// 清理空闲超过 `max_idle` 的会话，返回清理数量
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| {
            let alive = entry.touched_at.elapsed() < max_idle;
            if !alive {
                self.recency().remove(&entry.last_write);
            }
            alive
        });
        let removed = before.saturating_sub(self.sessions.len());

        if removed > 0 {
            info!(removed, "清理空闲会话");
        }
        removed
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn recency(&self) -> MutexGuard<'_, BTreeMap<u64, String>> {
        self.recency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 会话数超过上限时，淘汰最久未写入的会话（不含刚创建的 `keep`）
    fn evict_overflow(&self, keep: &str) {
        while self.sessions.len() > self.max_sessions {
            let oldest = {
                let mut recency = self.recency();
                let tick = recency
                    .iter()
                    .find(|(_, key)| key.as_str() != keep)
                    .map(|(tick, _)| *tick);
                tick.and_then(|tick| recency.remove(&tick).map(|key| (tick, key)))
            };

            let Some((tick, key)) = oldest else {
                break;
            };

            // 取出后若该会话又被写入，时钟已变，保留它
            if self
                .sessions
                .remove_if(&key, |_, entry| entry.last_write == tick)
                .is_some()
            {
                debug!(user_id = %key, "淘汰最久未使用的会话");
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pair(n: usize) -> (Turn, Turn) {
        (Turn::user(format!("q{}", n)), Turn::assistant(format!("a{}", n)))
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let store = SessionStore::default();
        assert!(store.get_context("nobody").is_empty());
        assert!(!store.contains("nobody"));
    }

    #[test]
    fn test_append_keeps_order() {
        let store = SessionStore::default();
        let (q, a) = pair(1);
        store.append("u1", q.clone(), a.clone());

        assert_eq!(store.get_context("u1"), vec![q, a]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_context_is_capped_most_recent_last() {
        let store = SessionStore::with_limits(10, 100);
        for n in 0..8 {
            let (q, a) = pair(n);
            store.append("u1", q, a);
        }

        let context = store.get_context("u1");
        assert_eq!(context.len(), 10);
        assert_eq!(context.first().unwrap().content(), "q3");
        assert_eq!(context.last().unwrap().content(), "a7");
    }

    #[test]
    fn test_context_len_is_min_of_2n_and_cap() {
        let store = SessionStore::with_limits(10, 100);
        for n in 1..=7 {
            let (q, a) = pair(n);
            store.append("u1", q, a);
            assert_eq!(store.get_context("u1").len(), (2 * n).min(10));
        }
    }

    #[test]
    fn test_lru_evicts_least_recently_written() {
        let store = SessionStore::with_limits(10, 2);
        let (q, a) = pair(0);
        store.append("a", q.clone(), a.clone());
        store.append("b", q.clone(), a.clone());
        store.append("a", q.clone(), a.clone());
        store.append("c", q, a);

        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
    }

    #[test]
    fn test_eviction_keeps_index_in_step() {
        let store = SessionStore::with_limits(4, 3);
        for n in 0..100 {
            let (q, a) = pair(n);
            store.append(&format!("u{}", n), q.clone(), a.clone());
            // 老会话持续写入，不应被淘汰
            store.append("regular", q, a);
        }

        assert_eq!(store.len(), 3);
        assert!(store.contains("regular"));
        assert!(store.contains("u99"));
        assert!(store.contains("u98"));
        assert_eq!(store.recency().len(), 3);

        assert!(store.remove("u98"));
        assert_eq!(store.recency().len(), 2);
        assert_eq!(store.purge_idle(Duration::ZERO), 2);
        assert!(store.recency().is_empty());
    }

    #[test]
    fn test_concurrent_new_sessions_respect_limit() {
        let store = Arc::new(SessionStore::with_limits(2, 50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..200 {
                        let (q, a) = pair(n);
                        store.append(&format!("{}-{}", t, n), q, a);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.len() <= 50);
        assert_eq!(store.recency().len(), store.len());
    }

    #[test]
    fn test_purge_idle() {
        let store = SessionStore::default();
        let (q, a) = pair(0);
        store.append("old", q.clone(), a.clone());
        std::thread::sleep(Duration::from_millis(60));
        store.append("fresh", q, a);

        assert_eq!(store.purge_idle(Duration::from_millis(30)), 1);
        assert!(store.contains("fresh"));
        assert!(!store.contains("old"));
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::default();
        let (q, a) = pair(0);
        store.append("u1", q, a);
        assert!(store.remove("u1"));
        assert!(!store.remove("u1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_appends_never_split_pairs() {
        let store = Arc::new(SessionStore::with_limits(1000, 10));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        let id = format!("{}-{}", t, n);
                        store.append(
                            "shared",
                            Turn::user(format!("q{}", id)),
                            Turn::assistant(format!("a{}", id)),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let context = store.get_context("shared");
        assert_eq!(context.len(), 800);

        let mut seen = std::collections::HashSet::new();
        for chunk in context.chunks(2) {
            let q = chunk[0].content().strip_prefix('q').unwrap();
            let a = chunk[1].content().strip_prefix('a').unwrap();
            assert_eq!(chunk[0].role(), crate::types::Role::User);
            assert_eq!(chunk[1].role(), crate::types::Role::Assistant);
            assert_eq!(q, a);
            assert!(seen.insert(q.to_string()), "duplicated turn {}", q);
        }
    }
}

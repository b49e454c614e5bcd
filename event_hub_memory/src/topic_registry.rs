// bidirectional topic <-> user mapping: lock-free reads, serialized
// copy-on-write writes.
//
// The "immutable set replaced atomically" contract described for this
// component is implemented as a `DashMap` of `Arc<HashSet<_>>` snapshots.
// `DashMap::get` takes a brief per-shard lock internal to `DashMap` itself —
// not the registry's own write mutex — so reads never contend with each
// other and only briefly contend with a write touching the same key.
// Writers serialize through one `std::sync::Mutex<()>` held only across the
// synchronous clone-and-replace step, never across an `.await`.

use dashmap::DashMap;
use event_hub_core::{Topic, UserId};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex};

static EMPTY_USERS: LazyLock<Arc<HashSet<UserId>>> = LazyLock::new(|| Arc::new(HashSet::new()));
static EMPTY_TOPICS: LazyLock<Arc<HashSet<Topic>>> = LazyLock::new(|| Arc::new(HashSet::new()));

#[derive(Default)]
pub struct TopicRegistry {
    write_lock: Mutex<()>,
    forward: DashMap<Topic, Arc<HashSet<UserId>>>,
    reverse: DashMap<UserId, Arc<HashSet<Topic>>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: subscribing a user already present yields an equivalent
    /// snapshot.
    pub fn subscribe(&self, user: &UserId, topic: &Topic) {
        let _guard = self.write_lock.lock().unwrap();

        let mut users: HashSet<UserId> = self
            .forward
            .get(topic)
            .map(|e| (**e).clone())
            .unwrap_or_default();
        if !users.insert(user.clone()) {
            return; // already subscribed; both maps already agree
        }
        self.forward.insert(topic.clone(), Arc::new(users));

        let mut topics: HashSet<Topic> = self
            .reverse
            .get(user)
            .map(|e| (**e).clone())
            .unwrap_or_default();
        topics.insert(topic.clone());
        self.reverse.insert(user.clone(), Arc::new(topics));
    }

    pub fn unsubscribe(&self, user: &UserId, topic: &Topic) {
        let _guard = self.write_lock.lock().unwrap();
        self.remove_one_locked(user, topic);
    }

    /// O(k) in the user's subscribed-topic count, not in the total number
    /// of topics tracked by the registry.
    pub fn unsubscribe_all(&self, user: &UserId) {
        let _guard = self.write_lock.lock().unwrap();
        let Some(topics) = self.reverse.get(user).map(|e| e.value().clone()) else {
            return;
        };
        for topic in topics.iter() {
            self.remove_from_forward_locked(user, topic);
        }
        self.reverse.remove(user);
    }

    /// Lock-free: returns an immutable snapshot the caller may iterate while
    /// writers run concurrently.
    pub fn users_for_topic(&self, topic: &Topic) -> Arc<HashSet<UserId>> {
        self.forward
            .get(topic)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| EMPTY_USERS.clone())
    }

    pub fn topics_for_user(&self, user: &UserId) -> Arc<HashSet<Topic>> {
        self.reverse
            .get(user)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| EMPTY_TOPICS.clone())
    }

    // --- helpers; callers already hold `write_lock` ---

    fn remove_one_locked(&self, user: &UserId, topic: &Topic) {
        if !self.forward_contains(user, topic) {
            return;
        }
        self.remove_from_forward_locked(user, topic);
        self.remove_from_reverse_locked(user, topic);
    }

    fn forward_contains(&self, user: &UserId, topic: &Topic) -> bool {
        self.forward
            .get(topic)
            .map(|e| e.contains(user))
            .unwrap_or(false)
    }

    fn remove_from_forward_locked(&self, user: &UserId, topic: &Topic) {
        let Some(existing) = self.forward.get(topic).map(|e| e.value().clone()) else {
            return;
        };
        if !existing.contains(user) {
            return;
        }
        let mut users = (*existing).clone();
        users.remove(user);
        if users.is_empty() {
            self.forward.remove(topic);
        } else {
            self.forward.insert(topic.clone(), Arc::new(users));
        }
    }

    fn remove_from_reverse_locked(&self, user: &UserId, topic: &Topic) {
        let Some(existing) = self.reverse.get(user).map(|e| e.value().clone()) else {
            return;
        };
        let mut topics = (*existing).clone();
        topics.remove(topic);
        if topics.is_empty() {
            self.reverse.remove(user);
        } else {
            self.reverse.insert(user.clone(), Arc::new(topics));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }
    fn t(s: &str) -> Topic {
        Topic::new(s).unwrap()
    }

    #[test]
    fn subscribe_is_visible_from_both_directions() {
        let reg = TopicRegistry::new();
        reg.subscribe(&u("u1"), &t("t1"));
        assert!(reg.users_for_topic(&t("t1")).contains(&u("u1")));
        assert!(reg.topics_for_user(&u("u1")).contains(&t("t1")));
    }

    #[test]
    fn subscribe_is_idempotent() {
        let reg = TopicRegistry::new();
        reg.subscribe(&u("u1"), &t("t1"));
        reg.subscribe(&u("u1"), &t("t1"));
        assert_eq!(reg.users_for_topic(&t("t1")).len(), 1);
        assert_eq!(reg.topics_for_user(&u("u1")).len(), 1);
    }

    #[test]
    fn unsubscribe_missing_user_is_a_no_op() {
        let reg = TopicRegistry::new();
        reg.subscribe(&u("u1"), &t("t1"));
        reg.unsubscribe(&u("u2"), &t("t1"));
        assert_eq!(reg.users_for_topic(&t("t1")).len(), 1);
    }

    #[test]
    fn unsubscribe_last_user_drops_the_topic_key() {
        let reg = TopicRegistry::new();
        reg.subscribe(&u("u1"), &t("t1"));
        reg.unsubscribe(&u("u1"), &t("t1"));
        assert!(reg.users_for_topic(&t("t1")).is_empty());
        assert!(reg.topics_for_user(&u("u1")).is_empty());
    }

    #[test]
    fn unsubscribe_all_matches_unsubscribing_each_topic_individually() {
        let reg_a = TopicRegistry::new();
        reg_a.subscribe(&u("u1"), &t("t1"));
        reg_a.subscribe(&u("u1"), &t("t2"));
        reg_a.subscribe(&u("u2"), &t("t1"));
        reg_a.unsubscribe_all(&u("u1"));

        let reg_b = TopicRegistry::new();
        reg_b.subscribe(&u("u1"), &t("t1"));
        reg_b.subscribe(&u("u1"), &t("t2"));
        reg_b.subscribe(&u("u2"), &t("t1"));
        reg_b.unsubscribe(&u("u1"), &t("t1"));
        reg_b.unsubscribe(&u("u1"), &t("t2"));

        assert_eq!(reg_a.topics_for_user(&u("u1")), reg_b.topics_for_user(&u("u1")));
        assert_eq!(reg_a.users_for_topic(&t("t1")), reg_b.users_for_topic(&t("t1")));
        assert_eq!(reg_a.users_for_topic(&t("t2")), reg_b.users_for_topic(&t("t2")));
    }

    #[test]
    fn unsubscribe_all_leaves_other_users_topics_intact() {
        let reg = TopicRegistry::new();
        reg.subscribe(&u("u1"), &t("t1"));
        reg.subscribe(&u("u2"), &t("t1"));
        reg.unsubscribe_all(&u("u1"));
        assert!(reg.topics_for_user(&u("u1")).is_empty());
        assert!(reg.users_for_topic(&t("t1")).contains(&u("u2")));
    }

    #[test]
    fn empty_topic_set_is_not_an_error() {
        let reg = TopicRegistry::new();
        reg.unsubscribe_all(&u("nobody"));
        assert!(reg.topics_for_user(&u("nobody")).is_empty());
    }

    #[test]
    fn users_for_unknown_topic_returns_empty_sentinel() {
        let reg = TopicRegistry::new();
        assert!(reg.users_for_topic(&t("never-subscribed")).is_empty());
    }
}

//! Per-user session state.
//!
//! Sessions hold everything the engine remembers about a user between
//! `reply()` calls: their variables (including the current `topic`), the last
//! matched trigger, and a bounded history of inputs and replies. The store
//! must be safe for concurrent access across *distinct* users; within one
//! user, `reply()` is single-threaded.

use parking_lot::Mutex;
use std::collections::HashMap;

use log::warn;

/// Number of input/reply pairs remembered per user.
pub const HISTORY_SIZE: usize = 9;

/// What to do with a frozen snapshot when thawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThawAction {
    /// Restore the snapshot and discard it.
    Thaw,
    /// Discard the snapshot without restoring it.
    Discard,
    /// Restore the snapshot and keep it for a later thaw.
    Keep,
}

/// A fixed-size ring of the user's most recent inputs and replies.
///
/// Both rings always have length [`HISTORY_SIZE`]; unused slots hold the
/// literal `"undefined"`. Index 0 is the most recent entry.
#[derive(Debug, Clone)]
pub struct History {
    input: Vec<String>,
    reply: Vec<String>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            input: vec!["undefined".to_string(); HISTORY_SIZE],
            reply: vec!["undefined".to_string(); HISTORY_SIZE],
        }
    }
}

impl History {
    /// The user's n-th most recent input (0 = latest).
    pub fn input(&self, index: usize) -> &str {
        self.input.get(index).map(String::as_str).unwrap_or("undefined")
    }

    /// The bot's n-th most recent reply (0 = latest).
    pub fn reply(&self, index: usize) -> &str {
        self.reply.get(index).map(String::as_str).unwrap_or("undefined")
    }

    fn add(&mut self, input: &str, reply: &str) {
        self.input.insert(0, input.trim().to_string());
        self.input.truncate(HISTORY_SIZE);
        self.reply.insert(0, reply.trim().to_string());
        self.reply.truncate(HISTORY_SIZE);
    }
}

/// Everything stored about one user.
#[derive(Debug, Clone)]
pub struct UserData {
    pub variables: HashMap<String, String>,
    pub last_match: String,
    pub history: History,
}

impl Default for UserData {
    fn default() -> Self {
        Self {
            variables: HashMap::from([("topic".to_string(), "random".to_string())]),
            last_match: String::new(),
            history: History::default(),
        }
    }
}

/// Storage contract for user sessions.
///
/// All methods take `&self`; implementations use interior mutability so the
/// store can be shared across users. Methods that name a user implicitly
/// create their session if it doesn't exist yet (except the read-only
/// getters, which return `None` for unknown users).
pub trait SessionManager: Send + Sync {
    /// Ensure a session exists for this user.
    fn init(&self, username: &str);

    /// Set one or more variables.
    fn set(&self, username: &str, vars: HashMap<String, String>);

    /// Get one variable.
    fn get(&self, username: &str, name: &str) -> Option<String>;

    /// Get a snapshot of everything stored for this user.
    fn get_any(&self, username: &str) -> Option<UserData>;

    /// Get a snapshot of every user's session.
    fn get_all(&self) -> HashMap<String, UserData>;

    /// Push an input/reply pair onto the user's history rings.
    fn add_history(&self, username: &str, input: &str, reply: &str);

    /// Record the trigger the user last matched.
    fn set_last_match(&self, username: &str, trigger: &str);

    /// The trigger the user last matched, if any.
    fn get_last_match(&self, username: &str) -> Option<String>;

    /// A snapshot of the user's history rings.
    fn get_history(&self, username: &str) -> Option<History>;

    /// Forget one user entirely (including any frozen snapshot).
    fn clear(&self, username: &str);

    /// Forget all users.
    fn clear_all(&self);

    /// Snapshot the user's current session.
    fn freeze(&self, username: &str);

    /// Apply a [`ThawAction`] to the user's snapshot.
    fn thaw(&self, username: &str, action: ThawAction);

    /// Convenience wrapper around [`SessionManager::set`] for one variable.
    fn set_one(&self, username: &str, name: &str, value: &str) {
        self.set(username, HashMap::from([(name.to_string(), value.to_string())]));
    }
}

/// The default in-memory session store.
#[derive(Default)]
pub struct MemorySessionManager {
    users: Mutex<HashMap<String, UserData>>,
    frozen: Mutex<HashMap<String, UserData>>,
}

impl MemorySessionManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionManager for MemorySessionManager {
    fn init(&self, username: &str) {
        self.users.lock().entry(username.to_string()).or_default();
    }

    fn set(&self, username: &str, vars: HashMap<String, String>) {
        let mut users = self.users.lock();
        let data = users.entry(username.to_string()).or_default();
        for (name, value) in vars {
            data.variables.insert(name, value);
        }
    }

    fn get(&self, username: &str, name: &str) -> Option<String> {
        self.users.lock().get(username)?.variables.get(name).cloned()
    }

    fn get_any(&self, username: &str) -> Option<UserData> {
        self.users.lock().get(username).cloned()
    }

    fn get_all(&self) -> HashMap<String, UserData> {
        self.users.lock().clone()
    }

    fn add_history(&self, username: &str, input: &str, reply: &str) {
        let mut users = self.users.lock();
        users.entry(username.to_string()).or_default().history.add(input, reply);
    }

    fn set_last_match(&self, username: &str, trigger: &str) {
        let mut users = self.users.lock();
        users.entry(username.to_string()).or_default().last_match = trigger.to_string();
    }

    fn get_last_match(&self, username: &str) -> Option<String> {
        self.users.lock().get(username).map(|d| d.last_match.clone())
    }

    fn get_history(&self, username: &str) -> Option<History> {
        self.users.lock().get(username).map(|d| d.history.clone())
    }

    fn clear(&self, username: &str) {
        self.users.lock().remove(username);
        self.frozen.lock().remove(username);
    }

    fn clear_all(&self) {
        self.users.lock().clear();
        self.frozen.lock().clear();
    }

    fn freeze(&self, username: &str) {
        // Never hold both locks at once.
        let snapshot = self.users.lock().get(username).cloned();
        match snapshot {
            Some(data) => {
                self.frozen.lock().insert(username.to_string(), data);
            }
            None => warn!("Can't freeze vars for unknown user '{}'", username),
        }
    }

    fn thaw(&self, username: &str, action: ThawAction) {
        let snapshot = self.frozen.lock().get(username).cloned();
        let Some(snapshot) = snapshot else {
            warn!("Can't thaw vars for user '{}': no frozen snapshot", username);
            return;
        };
        match action {
            ThawAction::Thaw => {
                self.users.lock().insert(username.to_string(), snapshot);
                self.frozen.lock().remove(username);
            }
            ThawAction::Discard => {
                self.frozen.lock().remove(username);
            }
            ThawAction::Keep => {
                self.users.lock().insert(username.to_string(), snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_default_to_the_random_topic() {
        let store = MemorySessionManager::new();
        store.init("alice");
        assert_eq!(store.get("alice", "topic"), Some("random".to_string()));
        assert_eq!(store.get_last_match("alice"), Some(String::new()));
    }

    #[test]
    fn history_rotates_and_keeps_fixed_length() {
        let store = MemorySessionManager::new();
        for i in 0..12 {
            store.add_history("alice", &format!("input {}", i), &format!("reply {}", i));
        }
        let history = store.get_history("alice").unwrap();
        assert_eq!(history.input(0), "input 11");
        assert_eq!(history.reply(0), "reply 11");
        assert_eq!(history.input(8), "input 3");
        // Slot 9 doesn't exist; the accessor degrades to "undefined".
        assert_eq!(history.input(9), "undefined");
    }

    #[test]
    fn freeze_and_thaw_restores_a_snapshot() {
        let store = MemorySessionManager::new();
        store.set_one("alice", "mood", "happy");
        store.freeze("alice");
        store.set_one("alice", "mood", "grumpy");

        store.thaw("alice", ThawAction::Thaw);
        assert_eq!(store.get("alice", "mood"), Some("happy".to_string()));

        // The snapshot was consumed by Thaw.
        store.set_one("alice", "mood", "grumpy");
        store.thaw("alice", ThawAction::Thaw);
        assert_eq!(store.get("alice", "mood"), Some("grumpy".to_string()));
    }

    #[test]
    fn thaw_keep_retains_the_snapshot() {
        let store = MemorySessionManager::new();
        store.set_one("alice", "mood", "happy");
        store.freeze("alice");
        store.set_one("alice", "mood", "grumpy");

        store.thaw("alice", ThawAction::Keep);
        assert_eq!(store.get("alice", "mood"), Some("happy".to_string()));

        store.set_one("alice", "mood", "grumpy");
        store.thaw("alice", ThawAction::Thaw);
        assert_eq!(store.get("alice", "mood"), Some("happy".to_string()));
    }

    #[test]
    fn clear_removes_user_and_snapshot() {
        let store = MemorySessionManager::new();
        store.set_one("alice", "mood", "happy");
        store.freeze("alice");
        store.clear("alice");
        assert!(store.get_any("alice").is_none());
        store.thaw("alice", ThawAction::Thaw);
        assert!(store.get("alice", "mood").is_none());
    }
}

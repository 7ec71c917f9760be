//! Keyword tables and the dispatcher that scans letters for them.
//!
//! A handler owns a [`KeywordTable`] and gets one pass per submitted letter.
//! Table iteration order is unspecified: when two keywords of one table are
//! both suffixes of the letters, either may fire.

use crate::input::InputBuffer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors from building a keyword table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeywordError {
    #[error("keyword is empty")]
    Empty,
    #[error("keyword {0:?} must be uppercase A-Z")]
    NotUppercase(String),
    #[error("keyword {0:?} is already registered")]
    Duplicate(String),
}

/// Mapping from keyword to action.
#[derive(Debug, Clone)]
pub struct KeywordTable<A> {
    entries: HashMap<String, A>,
}

impl<A> Default for KeywordTable<A> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<A> KeywordTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a keyword.
    pub fn insert(&mut self, keyword: impl Into<String>, action: A) -> Result<(), KeywordError> {
        let keyword = keyword.into();
        validate_keyword(&keyword)?;
        if self.entries.contains_key(&keyword) {
            return Err(KeywordError::Duplicate(keyword));
        }
        self.entries.insert(keyword, action);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, keyword: impl Into<String>, action: A) -> Result<Self, KeywordError> {
        self.insert(keyword, action)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, keyword: &str) -> Option<&A> {
        self.entries.get(keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// First keyword (in table order) that `buffer` ends with.
    ///
    /// A hit consumes the buffer's letters, see [`InputBuffer::ends_with`].
    pub fn match_suffix(&self, buffer: &mut InputBuffer) -> Option<(&str, &A)> {
        self.entries
            .iter()
            .find(|(keyword, _)| buffer.ends_with(keyword))
            .map(|(keyword, action)| (keyword.as_str(), action))
    }
}

/// Reject keywords that letters can never spell.
pub fn validate_keyword(keyword: &str) -> Result<(), KeywordError> {
    if keyword.is_empty() {
        return Err(KeywordError::Empty);
    }
    if !keyword.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(KeywordError::NotUppercase(keyword.to_string()));
    }
    Ok(())
}

/// A keyword that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub handler: String,
    pub keyword: String,
    pub narrative: String,
}

/// Something that reacts to keywords at the end of the letters.
pub trait KeywordHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Scan for a keyword and fire its action. At most one action fires.
    fn try_execute(&self, buffer: &mut InputBuffer) -> Option<KeywordMatch>;
}

/// Ordered set of handlers notified after every decoded letter.
#[derive(Default)]
pub struct KeywordDispatcher {
    handlers: Vec<Box<dyn KeywordHandler>>,
}

impl KeywordDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl KeywordHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Give every handler one pass, in registration order.
    pub fn notify_all(&self, buffer: &mut InputBuffer) -> Vec<KeywordMatch> {
        self.handlers
            .iter()
            .filter_map(|handler| handler.try_execute(buffer))
            .collect()
    }
}

impl std::fmt::Debug for KeywordDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}

/// How convincing an exit word is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitAction {
    Easy,
    Medium,
}

impl ExitAction {
    pub fn narrative(self) -> &'static str {
        match self {
            ExitAction::Easy => "You see the light, but don't trust it.",
            ExitAction::Medium => "You've made contact. You really are free.",
        }
    }
}

/// The exit words and how each one resolves.
pub fn default_exit_keywords() -> BTreeMap<String, ExitAction> {
    [
        ("ASCEND", ExitAction::Medium),
        ("BREACH", ExitAction::Medium),
        ("DEPART", ExitAction::Medium),
        ("EGRESS", ExitAction::Medium),
        ("EMERGE", ExitAction::Medium),
        ("ESCAPE", ExitAction::Medium),
        ("EXIT", ExitAction::Easy),
        ("FREE", ExitAction::Easy),
        ("GONE", ExitAction::Easy),
        ("LEAVE", ExitAction::Medium),
        ("OPEN", ExitAction::Easy),
        ("OUT", ExitAction::Easy),
        ("UNLOCK", ExitAction::Medium),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Handler for the exit words.
#[derive(Debug, Clone)]
pub struct ExitHandler {
    table: KeywordTable<ExitAction>,
}

impl ExitHandler {
    pub const NAME: &'static str = "exit";

    pub fn new(table: KeywordTable<ExitAction>) -> Self {
        Self { table }
    }

    pub fn from_map(words: &BTreeMap<String, ExitAction>) -> Result<Self, KeywordError> {
        let mut table = KeywordTable::new();
        for (keyword, action) in words {
            table.insert(keyword.clone(), *action)?;
        }
        Ok(Self::new(table))
    }

    pub fn table(&self) -> &KeywordTable<ExitAction> {
        &self.table
    }
}

impl Default for ExitHandler {
    fn default() -> Self {
        Self::from_map(&default_exit_keywords()).unwrap_or_else(|err| {
            tracing::error!(%err, "built-in exit words rejected");
            Self::new(KeywordTable::new())
        })
    }
}

impl KeywordHandler for ExitHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn try_execute(&self, buffer: &mut InputBuffer) -> Option<KeywordMatch> {
        let Some((keyword, action)) = self.table.match_suffix(buffer) else {
            tracing::debug!(handler = Self::NAME, "no keyword matched");
            return None;
        };

        let narrative = action.narrative();
        tracing::info!(handler = Self::NAME, keyword, ?action, "{narrative}");

        Some(KeywordMatch {
            handler: Self::NAME.to_string(),
            keyword: keyword.to_string(),
            narrative: narrative.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{BitTrie, TrieLayout};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn buffer_with(letters: &str) -> InputBuffer {
        let mut buf = InputBuffer::new(BitTrie::with_layout(5, TrieLayout::Prefix), 8, 128);
        for letter in letters.chars() {
            for bit in buf.trie().path_for(letter).unwrap() {
                buf.insert(bit);
            }
            buf.submit();
        }
        assert_eq!(buf.letters(), letters);
        buf
    }

    /// Counts how often it is asked and how often it fires.
    struct Tally {
        name: &'static str,
        table: KeywordTable<()>,
        asked: Arc<AtomicUsize>,
        fired: Arc<AtomicUsize>,
    }

    impl Tally {
        fn new(name: &'static str, table: KeywordTable<()>) -> Self {
            Self {
                name,
                table,
                asked: Arc::new(AtomicUsize::new(0)),
                fired: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl KeywordHandler for Tally {
        fn name(&self) -> &str {
            self.name
        }

        fn try_execute(&self, buffer: &mut InputBuffer) -> Option<KeywordMatch> {
            self.asked.fetch_add(1, Ordering::Relaxed);
            let (keyword, _) = self.table.match_suffix(buffer)?;
            self.fired.fetch_add(1, Ordering::Relaxed);
            Some(KeywordMatch {
                handler: self.name.to_string(),
                keyword: keyword.to_string(),
                narrative: String::new(),
            })
        }
    }

    #[test]
    fn test_table_rejects_bad_keywords() {
        let mut table = KeywordTable::new();
        assert_eq!(table.insert("", ()), Err(KeywordError::Empty));
        assert_eq!(
            table.insert("Exit", ()),
            Err(KeywordError::NotUppercase("Exit".to_string()))
        );
        assert!(table.insert("EXIT", ()).is_ok());
        assert_eq!(
            table.insert("EXIT", ()),
            Err(KeywordError::Duplicate("EXIT".to_string()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_default_exit_table() {
        let handler = ExitHandler::default();
        assert_eq!(handler.table().len(), 13);
        assert_eq!(handler.table().get("EXIT"), Some(&ExitAction::Easy));
        assert_eq!(handler.table().get("ESCAPE"), Some(&ExitAction::Medium));

        let mut words: Vec<&str> = handler.table().keywords().collect();
        words.sort_unstable();
        let expected: Vec<String> = default_exit_keywords().into_keys().collect();
        assert_eq!(words, expected);
    }

    #[test]
    fn test_exit_handler_fires_per_keyword_action() {
        let handler = ExitHandler::default();

        let mut buf = buffer_with("GOESCAPE");
        let hit = handler.try_execute(&mut buf).unwrap();
        assert_eq!(hit.keyword, "ESCAPE");
        assert_eq!(hit.narrative, ExitAction::Medium.narrative());
        assert_eq!(buf.letters(), "");

        let mut buf = buffer_with("ALLOUT");
        let hit = handler.try_execute(&mut buf).unwrap();
        assert_eq!(hit.keyword, "OUT");
        assert_eq!(hit.narrative, ExitAction::Easy.narrative());
    }

    #[test]
    fn test_exit_handler_miss_leaves_letters() {
        let handler = ExitHandler::default();
        let mut buf = buffer_with("EXITED");
        assert!(handler.try_execute(&mut buf).is_none());
        assert_eq!(buf.letters(), "EXITED");
    }

    #[test]
    fn test_one_action_per_handler_per_pass() {
        // BREAK and AK both end the letters; only one of them may fire.
        let tally = Tally::new(
            "tally",
            KeywordTable::new()
                .with("BREAK", ())
                .and_then(|t| t.with("AK", ()))
                .unwrap(),
        );

        let mut buf = buffer_with("BREAK");
        let hit = tally.try_execute(&mut buf).unwrap();
        assert!(hit.keyword == "BREAK" || hit.keyword == "AK");
        assert_eq!(tally.fired.load(Ordering::Relaxed), 1);
        assert_eq!(buf.history().len(), 1);
        assert_eq!(buf.letters(), "");
    }

    #[test]
    fn test_dispatcher_gives_every_handler_a_pass() {
        let mut dispatcher = KeywordDispatcher::new();
        dispatcher.register(ExitHandler::default());
        let tally = Tally::new("tally", KeywordTable::new().with("OPEN", ()).unwrap());
        let (asked, fired) = (tally.asked.clone(), tally.fired.clone());
        dispatcher.register(tally);
        assert_eq!(dispatcher.len(), 2);

        // The exit handler consumes OPEN first, so the second handler sees
        // an empty accumulator but is still asked.
        let mut buf = buffer_with("OPEN");
        let hits = dispatcher.notify_all(&mut buf);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].handler, ExitHandler::NAME);
        assert_eq!(hits[0].keyword, "OPEN");
        assert_eq!(asked.load(Ordering::Relaxed), 1);
        assert_eq!(fired.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_later_handler_asked_after_earlier_hit() {
        // Both handlers end on the same letters; the first one's hit must not
        // stop the second from getting its pass.
        let first = Tally::new("first", KeywordTable::new().with("DOOR", ()).unwrap());
        let second = Tally::new("second", KeywordTable::new().with("DOOR", ()).unwrap());
        let asked = second.asked.clone();

        let mut dispatcher = KeywordDispatcher::new();
        dispatcher.register(first);
        dispatcher.register(second);

        let mut buf = buffer_with("DOOR");
        let hits = dispatcher.notify_all(&mut buf);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].handler, "first");
        assert_eq!(asked.load(Ordering::Relaxed), 1);

        // A second pass asks every handler again.
        dispatcher.notify_all(&mut buf);
        assert_eq!(asked.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_dispatcher_with_no_match() {
        let mut dispatcher = KeywordDispatcher::new();
        dispatcher.register(ExitHandler::default());
        let mut buf = buffer_with("HELLO");
        assert!(dispatcher.notify_all(&mut buf).is_empty());
        assert_eq!(buf.letters(), "HELLO");
    }
}

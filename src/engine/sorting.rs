//! Trigger sorting.
//!
//! The matcher walks each topic's triggers *in order* and takes the first
//! match, so the order IS the matching priority. `sort_replies` builds that
//! order from scratch:
//!
//! ```text
//! topics + includes/inherits      ({inherits=N} labels encode topic depth)
//!          │
//!          ▼
//! weight buckets (desc)           ({weight=K} tags, default 0)
//!          │
//!          ▼
//! inheritance bands (asc)         (unlabeled triggers go last)
//!          │
//!          ▼
//! kind: atomic, option, alpha, number, wild, then solo _, #, *
//!          │
//!          ▼
//! word count desc, length desc, insertion order
//! ```
//!
//! Two buffers are produced per topic: one for normal triggers and one for
//! triggers carrying `%Previous`. Substitution key lists get their own,
//! simpler sort (word count, then length).

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use super::pattern::word_count;
use crate::ast::Trigger;
use crate::RiveScript;

/// A trigger pattern paired with the trigger it came from.
///
/// `pattern` starts as the trigger's own text but may temporarily carry a
/// `{inherits=N}` prefix while the topic closure is collected.
#[derive(Debug, Clone)]
pub(crate) struct SortedTriggerEntry {
    pub pattern: String,
    pub pointer: Trigger,
}

/// The output of `sort_replies`: everything the matcher walks in order.
#[derive(Debug, Clone, Default)]
pub(crate) struct SortBuffer {
    pub topics: HashMap<String, Vec<SortedTriggerEntry>>,
    pub thats: HashMap<String, Vec<SortedTriggerEntry>>,
    pub sub: Vec<String>,
    pub person: Vec<String>,
}

/// Work area while sorting one inheritance band: triggers classified by the
/// lexical feature they contain.
#[derive(Debug, Default)]
struct SortTrack {
    atomic: BTreeMap<usize, Vec<SortedTriggerEntry>>, // No special characters at all
    option: BTreeMap<usize, Vec<SortedTriggerEntry>>, // Contains optionals
    alpha: BTreeMap<usize, Vec<SortedTriggerEntry>>,  // Contains an _ wildcard
    number: BTreeMap<usize, Vec<SortedTriggerEntry>>, // Contains a # wildcard
    wild: BTreeMap<usize, Vec<SortedTriggerEntry>>,   // Contains a * wildcard
    pound: Vec<SortedTriggerEntry>,                   // Patterns of just '#'
    under: Vec<SortedTriggerEntry>,                   // Patterns of just '_'
    star: Vec<SortedTriggerEntry>,                    // Patterns of just '*'
}

impl RiveScript {
    /// Sort the reply structures in memory for optimal matching.
    ///
    /// Must be called after loading is finished and before the first
    /// `reply()`; matching walks these buffers and nothing else.
    pub fn sort_replies(&mut self) {
        let mut sorted = SortBuffer::default();
        debug!("Sorting triggers...");

        let mut topic_names: Vec<String> = self.topics.keys().cloned().collect();
        topic_names.sort();

        for topic in &topic_names {
            debug!("Analyzing topic {}", topic);

            // Collect every trigger reachable through this topic's
            // includes/inherits closure, then sort them.
            let all_triggers = self.get_topic_triggers(topic, false, 0, 0, false);
            sorted.topics.insert(topic.clone(), self.sort_trigger_set(all_triggers, true));

            // Do it again for the %Previous triggers.
            let that_triggers = self.get_topic_triggers(topic, true, 0, 0, false);
            sorted.thats.insert(topic.clone(), self.sort_trigger_set(that_triggers, false));
        }

        // Sort the substitution lists.
        sorted.sub = sort_list(self.sub.keys());
        sorted.person = sort_list(self.person.keys());

        self.sorted = sorted;
    }

    /// Recursively collect the triggers reachable from a topic.
    ///
    /// Topics that *inherit* other topics get their own triggers prefixed
    /// with a `{inherits=N}` label, where `N` grows with each inheritance
    /// step. The sorter uses the label to keep an inheriting topic's triggers
    /// above everything it inherited, no matter how wild they are: a bare `*`
    /// in the top topic still outranks an atomic trigger in an inherited one.
    /// Included topics merge in at equal priority, so they take no label.
    ///
    /// `depth` guards the recursion; `inheritance` only grows when an
    /// `inherits` edge is crossed. `inherited` forces the label onto a topic
    /// that was reached through an `inherits` edge.
    fn get_topic_triggers(
        &self,
        topic: &str,
        thats: bool,
        depth: usize,
        inheritance: i64,
        inherited: bool,
    ) -> Vec<SortedTriggerEntry> {
        // Break if we're in too deep.
        if depth > self.depth {
            warn!("Deep recursion while scanning topic inheritance!");
            return Vec::new();
        }

        debug!(
            "Collecting trigger list for topic {} (depth={}; inheritance={}; inherited={})",
            topic, depth, inheritance, inherited
        );

        let mut triggers: Vec<SortedTriggerEntry> = Vec::new();

        // Triggers that exist in this topic directly.
        let mut in_this_topic: Vec<SortedTriggerEntry> = Vec::new();
        if !thats {
            if let Some(list) = self.topics.get(topic) {
                for trigger in list {
                    in_this_topic
                        .push(SortedTriggerEntry { pattern: trigger.pattern.clone(), pointer: trigger.clone() });
                }
            }
        } else {
            // The thats index is topic → current trigger → previous → trigger.
            if let Some(by_trigger) = self.thats.get(topic) {
                for by_previous in by_trigger.values() {
                    for trigger in by_previous.values() {
                        in_this_topic
                            .push(SortedTriggerEntry { pattern: trigger.pattern.clone(), pointer: trigger.clone() });
                    }
                }
            }
        }

        // Does this topic include others?
        if let Some(includes) = self.includes.get(topic) {
            for include in includes {
                debug!("Topic {} includes {}", topic, include);
                triggers.extend(self.get_topic_triggers(include, thats, depth + 1, inheritance + 1, false));
            }
        }

        // Does this topic inherit others?
        if let Some(inherits) = self.inherits.get(topic) {
            for inherit in inherits {
                debug!("Topic {} inherits {}", topic, inherit);
                triggers.extend(self.get_topic_triggers(inherit, thats, depth + 1, inheritance + 1, true));
            }
        }

        // If this topic inherits anything, its own triggers outrank the
        // inherited ones; the label records the band.
        let has_inherits = self.inherits.get(topic).is_some_and(|set| !set.is_empty());
        if has_inherits || inherited {
            for entry in in_this_topic {
                debug!("Prefixing trigger with {{inherits={}}} {}", inheritance, entry.pattern);
                let label = format!("{{inherits={}}}{}", inheritance, entry.pattern);
                triggers.push(SortedTriggerEntry { pattern: label, pointer: entry.pointer });
            }
        } else {
            triggers.extend(in_this_topic);
        }

        triggers
    }

    /// Sort one topic's triggers into their final matching order.
    ///
    /// With `exclude_previous`, triggers carrying `%Previous` are left out
    /// (they belong to the thats buffer, which is sorted by a second call
    /// without the flag).
    fn sort_trigger_set(&self, triggers: Vec<SortedTriggerEntry>, exclude_previous: bool) -> Vec<SortedTriggerEntry> {
        // Bucket the triggers by their {weight}, default 0.
        let mut prior: BTreeMap<i64, Vec<SortedTriggerEntry>> = BTreeMap::new();
        for trigger in triggers {
            if exclude_previous && trigger.pointer.previous.is_some() {
                continue;
            }
            let weight = regex!(r"\{weight=(\d+)\}")
                .captures(&trigger.pattern)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(0);
            prior.entry(weight).or_default().push(trigger);
        }

        let mut running: Vec<SortedTriggerEntry> = Vec::new();

        // Go through the weight buckets, highest first.
        for (priority, bucket) in prior.into_iter().rev() {
            debug!("Sorting triggers with priority {}", priority);

            // Split the bucket into inheritance bands. -1 holds triggers with
            // no {inherits} label; they move below the deepest band.
            let mut track: BTreeMap<i64, SortTrack> = BTreeMap::new();
            let mut highest_inherits: i64 = -1;

            for mut trigger in bucket {
                let inherits = match regex!(r"\{inherits=(\d+)\}").captures(&trigger.pattern) {
                    Some(caps) => {
                        let level: i64 = caps[1].parse().unwrap_or(0);
                        trigger.pattern =
                            regex!(r"\{inherits=\d+\}").replace_all(&trigger.pattern, "").into_owned();
                        level
                    }
                    None => -1,
                };
                if inherits > highest_inherits {
                    highest_inherits = inherits;
                }

                let band = track.entry(inherits).or_default();
                let pattern = trigger.pattern.clone();
                let count = word_count(&pattern, false);

                if pattern.contains('_') {
                    // Alphabetic wildcard included.
                    if count > 0 {
                        band.alpha.entry(count).or_default().push(trigger);
                    } else {
                        band.under.push(trigger);
                    }
                } else if pattern.contains('#') {
                    // Numeric wildcard included.
                    if count > 0 {
                        band.number.entry(count).or_default().push(trigger);
                    } else {
                        band.pound.push(trigger);
                    }
                } else if pattern.contains('*') {
                    // Generic wildcard included.
                    if count > 0 {
                        band.wild.entry(count).or_default().push(trigger);
                    } else {
                        band.star.push(trigger);
                    }
                } else if pattern.contains('[') {
                    // Optionals included.
                    band.option.entry(count).or_default().push(trigger);
                } else {
                    // Totally atomic.
                    band.atomic.entry(count).or_default().push(trigger);
                }
            }

            // Unlabeled triggers sort below every inheritance band.
            if let Some(no_inherits) = track.remove(&-1) {
                track.insert(highest_inherits + 1, no_inherits);
            }

            // Emit the bands from lowest to highest.
            for (_band_level, band) in track {
                running.extend(sort_by_words(band.atomic));
                running.extend(sort_by_words(band.option));
                running.extend(sort_by_words(band.alpha));
                running.extend(sort_by_words(band.number));
                running.extend(sort_by_words(band.wild));

                running.extend(sort_by_length(band.under));
                running.extend(sort_by_length(band.pound));
                running.extend(sort_by_length(band.star));
            }
        }

        running
    }

    /// Every topic reachable from `topic` through includes/inherits edges,
    /// the topic itself first.
    pub(crate) fn get_topic_tree(&self, topic: &str, depth: usize) -> Vec<String> {
        if depth > self.depth {
            warn!("Deep recursion while scanning topic tree!");
            return Vec::new();
        }

        let mut topics = vec![topic.to_string()];
        if let Some(includes) = self.includes.get(topic) {
            for include in includes {
                topics.extend(self.get_topic_tree(include, depth + 1));
            }
        }
        if let Some(inherits) = self.inherits.get(topic) {
            for inherit in inherits {
                topics.extend(self.get_topic_tree(inherit, depth + 1));
            }
        }
        topics
    }
}

/// Sort classified triggers by word count descending, then by pattern length
/// descending; insertion order breaks the remaining ties.
fn sort_by_words(groups: BTreeMap<usize, Vec<SortedTriggerEntry>>) -> Vec<SortedTriggerEntry> {
    let mut sorted = Vec::new();
    for (_count, mut group) in groups.into_iter().rev() {
        group.sort_by_key(|entry| std::cmp::Reverse(entry.pattern.chars().count()));
        sorted.extend(group);
    }
    sorted
}

/// Sort solo-wildcard triggers purely by length descending, collapsing
/// duplicate patterns into one group.
///
/// A trigger of `* * *` has no countable words but should still outrank a
/// plain `*`.
fn sort_by_length(triggers: Vec<SortedTriggerEntry>) -> Vec<SortedTriggerEntry> {
    let mut patterns: Vec<String> = triggers.iter().map(|entry| entry.pattern.clone()).collect();
    patterns.sort_by_key(|pattern| std::cmp::Reverse(pattern.chars().count()));
    patterns.dedup();

    let mut sorted = Vec::new();
    for pattern in &patterns {
        sorted.extend(triggers.iter().filter(|entry| &entry.pattern == pattern).cloned());
    }
    sorted
}

/// Sort substitution keys by word count descending, then length descending.
///
/// The substituter applies these left to right, so longer patterns must come
/// first or `"what is"` could never win over `"what"`.
fn sort_list<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut track: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for item in items {
        track.entry(word_count(item, true)).or_default().push(item.clone());
    }

    let mut output = Vec::new();
    for (_count, mut group) in track.into_iter().rev() {
        group.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        output.extend(group);
    }
    output
}

#[cfg(test)]
mod tests {
    use crate::{Config, RiveScript};

    fn bot(source: &str) -> RiveScript {
        let mut rs = RiveScript::new(Config::basic());
        rs.stream(source).unwrap();
        rs.sort_replies();
        rs
    }

    fn patterns(rs: &RiveScript, topic: &str) -> Vec<String> {
        rs.sorted.topics[topic].iter().map(|entry| entry.pattern.clone()).collect()
    }

    #[test]
    fn atomic_triggers_sort_before_wildcards() {
        let rs = bot(
            "+ *\n- w\n\
             + hello bot\n- a\n\
             + hello\n- b\n\
             + hello there bot\n- c\n\
             + hello *\n- d",
        );
        assert_eq!(
            patterns(&rs, "random"),
            vec!["hello there bot", "hello bot", "hello", "hello *", "*"]
        );
    }

    #[test]
    fn kind_order_within_a_band() {
        let rs = bot(
            "+ one *\n- w\n\
             + one #\n- n\n\
             + one _\n- a\n\
             + one [two]\n- o\n\
             + one two\n- t",
        );
        assert_eq!(patterns(&rs, "random"), vec!["one two", "one [two]", "one _", "one #", "one *"]);
    }

    #[test]
    fn weight_buckets_come_first() {
        let rs = bot("+ something\n- Unweighted\n+ something{weight=100}\n- Weighted");
        assert_eq!(patterns(&rs, "random"), vec!["something{weight=100}", "something"]);
    }

    #[test]
    fn solo_wildcards_sort_by_length() {
        let rs = bot("+ *\n- a\n+ * *\n- b\n+ * * *\n- c\n+ hello\n- d");
        assert_eq!(patterns(&rs, "random"), vec!["hello", "* * *", "* *", "*"]);
    }

    #[test]
    fn included_topics_merge_at_equal_priority() {
        let rs = bot(
            "> topic alpha includes beta\n+ apple\n- a\n< topic\n\
             > topic beta\n+ banana split\n- b\n< topic",
        );
        // Equal priority: both sort by word count regardless of which topic
        // they came from.
        assert_eq!(patterns(&rs, "alpha"), vec!["banana split", "apple"]);
    }

    #[test]
    fn inheriting_topics_outrank_inherited_ones() {
        let rs = bot(
            "> topic alpha inherits beta\n+ *\n- a\n< topic\n\
             > topic beta\n+ banana split\n- b\n< topic",
        );
        // alpha's own * outranks even beta's atomic trigger.
        assert_eq!(patterns(&rs, "alpha"), vec!["*", "banana split"]);
    }

    #[test]
    fn previous_triggers_go_to_the_thats_buffer() {
        let rs = bot("+ knock knock\n- Who's there?\n+ *\n% who is there\n- <star> who?");
        let topics: Vec<String> = rs.sorted.topics["random"].iter().map(|e| e.pattern.clone()).collect();
        let thats: Vec<String> = rs.sorted.thats["random"].iter().map(|e| e.pattern.clone()).collect();
        assert_eq!(topics, vec!["knock knock"]);
        assert_eq!(thats, vec!["*"]);
    }

    #[test]
    fn substitution_keys_sort_longest_first() {
        let rs = bot("! sub what is = a\n! sub what is that = b\n! sub whats = c\n+ dummy\n- ok");
        assert_eq!(rs.sorted.sub, vec!["what is that", "what is", "whats"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut rs = bot("+ hello *\n- a\n+ hello\n- b\n+ *\n- c");
        let first = patterns(&rs, "random");
        rs.sort_replies();
        assert_eq!(patterns(&rs, "random"), first);
    }

    #[test]
    fn inheritance_recursion_is_bounded() {
        // Two topics inheriting each other: the closure terminates at depth
        // with a partial result instead of hanging.
        let rs = bot(
            "> topic alpha inherits beta\n+ apple\n- a\n< topic\n\
             > topic beta inherits alpha\n+ banana\n- b\n< topic",
        );
        assert!(!rs.sorted.topics["alpha"].is_empty());
    }
}

//! The matcher and reply pipeline.
//!
//! `reply()` is the public entry point. One call flows through:
//!
//! ```text
//! reply(user, message)
//!   │
//!   ├─ BEGIN block?  ── get_reply("request", begin) ── {ok} hands off ──┐
//!   │                                                                  │
//!   └─ get_reply(message)  ◄─────────────────────────────────────────┘
//!        │
//!        ├─ normalize the message           (pattern.rs)
//!        ├─ %Previous scan (outermost only) → botstars
//!        ├─ walk the topic's sort buffer    → stars
//!        ├─ conditions → redirect/reply pool → random choice
//!        └─ tag expansion                   (tags.rs)
//! ```
//!
//! Redirects re-enter `get_reply` with the target as the new message; `depth`
//! bounds that recursion and turns overflow into the deep-recursion error
//! reply.

use log::{debug, error, warn};
use rand::Rng;
use regex::Regex;

use crate::ast::Trigger;
use crate::RiveScript;

/// How many times a reply entry appears in the selection pool.
fn reply_weight(text: &str) -> usize {
    regex!(r"\{weight=(\d+)\}")
        .captures(text)
        .and_then(|caps| caps[1].parse::<usize>().ok())
        .map(|weight| weight.max(1))
        .unwrap_or(1)
}

/// Capture groups of a full anchored match, empty strings for misses.
fn capture_stars(caps: &regex::Captures) -> Vec<String> {
    caps.iter().skip(1).map(|group| group.map(|g| g.as_str().to_string()).unwrap_or_default()).collect()
}

impl RiveScript {
    /// Fetch a reply from the bot for a user's message.
    ///
    /// The interpreter never fails out of this method: engine-level problems
    /// come back as the configured error replies (`"ERR: No Reply Matched"`
    /// and friends).
    pub fn reply(&mut self, username: &str, message: &str) -> String {
        debug!("Asked to reply to [{}] {}", username, message);

        self.sessions.init(username);

        let reply = if self.topics.contains_key("__begin__") {
            // The BEGIN block gets the first word; its {ok} tag hands control
            // to the user's real topic.
            let mut begin = self.get_reply(username, "request", true, 0);
            if begin.contains("{ok}") {
                let real = self.get_reply(username, message, false, 0);
                begin = begin.replace("{ok}", &real);
            }
            self.process_tags(username, begin, &[], &[], 0)
        } else {
            self.get_reply(username, message, false, 0)
        };

        // Save their message history.
        let input = self.format_message(message);
        self.sessions.add_history(username, &input, &reply);

        reply
    }

    /// The real reply engine, re-entered by redirects and the BEGIN block.
    pub(crate) fn get_reply(&mut self, username: &str, message: &str, is_begin: bool, step: usize) -> String {
        // Collect data on this user.
        let mut topic = self.sessions.get(username, "topic").unwrap_or_else(|| "random".to_string());
        let mut stars: Vec<String> = Vec::new();
        let mut botstars: Vec<String> = Vec::new();

        // Format their message.
        let message = self.format_message(message);

        // Avoid letting the user fall into a missing topic.
        if !self.topics.contains_key(&topic) {
            warn!("User {} was in an empty topic named '{}'", username, topic);
            topic = "random".to_string();
            self.sessions.set_one(username, "topic", &topic);
        }

        // Avoid deep recursion.
        if step > self.depth {
            return self.errors.deep_recursion.clone();
        }

        // Are we in the BEGIN block?
        if is_begin {
            topic = "__begin__".to_string();
        }

        if !self.sorted.topics.contains_key(&topic) {
            error!("No sort buffer for topic '{}': did you forget to call sort_replies()?", topic);
            return self.errors.reply_not_matched.clone();
        }

        let mut matched: Option<Trigger> = None;
        let mut matched_trigger = String::new();

        // See if there are any %Previous triggers in this topic or one it
        // reaches. Only on the outermost call: during a redirect the last
        // reply hasn't changed, so re-scanning would loop forever.
        if step == 0 {
            let has_edges = self.includes.get(&topic).is_some_and(|set| !set.is_empty())
                || self.inherits.get(&topic).is_some_and(|set| !set.is_empty());
            let all_topics = if has_edges { self.get_topic_tree(&topic, 0) } else { vec![topic.clone()] };

            'topics: for top in &all_topics {
                let Some(that_triggers) = self.sorted.thats.get(top) else { continue };
                if that_triggers.is_empty() {
                    continue;
                }
                debug!("There's a %Previous in topic {}", top);

                // The bot's last reply, formatted like the human's message.
                let last_reply = self
                    .sessions
                    .get_history(username)
                    .map(|history| self.format_message(history.reply(0)))
                    .unwrap_or_default();
                debug!("Bot's last reply: {}", last_reply);

                for entry in that_triggers {
                    let Some(previous) = entry.pointer.previous.as_deref() else { continue };
                    let botside = self.trigger_regexp(username, previous);
                    debug!("Try to match last reply ({}) to {} ({})", last_reply, previous, botside);

                    let Ok(bot_re) = Regex::new(&format!("^{}$", botside)) else { continue };
                    let Some(bot_caps) = bot_re.captures(&last_reply) else { continue };
                    let bot_stars = capture_stars(&bot_caps);

                    // The bot side matched; now our message has to match the
                    // trigger itself.
                    let user_side = self.trigger_regexp(username, &entry.pointer.pattern);
                    debug!("Try to match \"{}\" against {} ({})", message, entry.pointer.pattern, user_side);
                    let Ok(user_re) = Regex::new(&format!("^{}$", user_side)) else { continue };
                    if let Some(caps) = user_re.captures(&message) {
                        botstars = bot_stars;
                        stars = capture_stars(&caps);
                        matched = Some(entry.pointer.clone());
                        matched_trigger = entry.pointer.pattern.clone();
                        break 'topics;
                    }
                }
            }
        }

        // Search their topic for a match to their trigger.
        if matched.is_none() {
            debug!("Searching their topic for a match...");
            for entry in &self.sorted.topics[&topic] {
                let compiled = self.trigger_regexp(username, &entry.pattern);
                debug!("Try to match \"{}\" against {} ({})", message, entry.pattern, compiled);

                let Ok(re) = Regex::new(&format!("^{}$", compiled)) else {
                    warn!("Trigger '{}' compiled to an invalid regexp", entry.pattern);
                    continue;
                };
                if let Some(caps) = re.captures(&message) {
                    stars = capture_stars(&caps);
                    matched = Some(entry.pointer.clone());
                    matched_trigger = entry.pattern.clone();
                    break;
                }
            }
        }

        // Store what trigger they matched on, even the empty non-match.
        self.sessions.set_last_match(username, &matched_trigger);

        let found_match = matched.is_some();
        let mut reply = String::new();

        if let Some(trigger) = matched {
            // Check the conditionals.
            for row in &trigger.conditions {
                let Some((condition, potential)) = row.split_once("=>") else { continue };
                let Some(caps) =
                    regex!(r"^(.+?)\s+(==|eq|!=|ne|<>|<=|>=|<|>)\s+(.+?)$").captures(condition.trim())
                else {
                    continue;
                };
                let op = caps[2].to_string();
                let raw_left = caps[1].trim().to_string();
                let raw_right = caps[3].trim().to_string();

                let mut left = self.process_tags(username, raw_left, &stars, &botstars, step);
                let mut right = self.process_tags(username, raw_right, &stars, &botstars, step);

                // An empty side compares as the literal "undefined".
                if left.is_empty() {
                    left = "undefined".to_string();
                }
                if right.is_empty() {
                    right = "undefined".to_string();
                }
                debug!("Check if {} {} {}", left, op, right);

                let passed = match op.as_str() {
                    "==" | "eq" => left == right,
                    "!=" | "ne" | "<>" => left != right,
                    // The ordering operators compare integers; a side that
                    // doesn't parse fails the condition.
                    _ => match (left.parse::<i64>(), right.parse::<i64>()) {
                        (Ok(l), Ok(r)) => match op.as_str() {
                            "<" => l < r,
                            "<=" => l <= r,
                            ">" => l > r,
                            ">=" => l >= r,
                            _ => false,
                        },
                        _ => {
                            warn!("Failed to evaluate numeric condition!");
                            false
                        }
                    },
                };

                if passed {
                    reply = potential.trim().to_string();
                    break;
                }
            }

            // No conditional fired? Select from the weighted pool of the
            // trigger's redirect and replies.
            if reply.is_empty() {
                let mut bucket: Vec<(bool, &str)> = Vec::new();
                if let Some(redirect) = trigger.redirect.as_deref() {
                    for _ in 0..reply_weight(redirect) {
                        bucket.push((true, redirect));
                    }
                }
                for rep in &trigger.replies {
                    for _ in 0..reply_weight(rep) {
                        bucket.push((false, rep));
                    }
                }

                if !bucket.is_empty() {
                    let (is_redirect, text) = bucket[rand::thread_rng().gen_range(0..bucket.len())];
                    let text = text.to_string();
                    if is_redirect {
                        // Pretend the user said the redirect target.
                        let target = self.process_tags(username, text, &stars, &botstars, step);
                        let target = target.to_lowercase();
                        debug!("Redirecting us to {}", target);
                        reply = self.get_reply(username, &target, is_begin, step + 1);
                    } else {
                        reply = text;
                    }
                }
            }
        }

        // Still no reply? Give up with the fallback error replies.
        if !found_match {
            reply = self.errors.reply_not_matched.clone();
        } else if reply.is_empty() {
            reply = self.errors.reply_not_found.clone();
        }

        debug!("Reply pre-processing: {}", reply);

        if is_begin {
            // The BEGIN block may only switch topics and set user variables;
            // everything else waits until {ok} has been resolved.
            let mut giveup = 0;
            loop {
                let name = match regex!(r"\{topic=(.+?)\}").captures(&reply) {
                    Some(caps) => caps[1].to_string(),
                    None => break,
                };
                giveup += 1;
                if giveup > self.depth {
                    warn!("Infinite loop looking for topic tag!");
                    break;
                }
                self.sessions.set_one(username, "topic", &name);
                reply = reply.replace(&format!("{{topic={}}}", name), "");
            }

            let mut giveup = 0;
            loop {
                let (name, value) = match regex!(r"<set (.+?)=(.+?)>").captures(&reply) {
                    Some(caps) => (caps[1].to_string(), caps[2].to_string()),
                    None => break,
                };
                giveup += 1;
                if giveup > self.depth {
                    warn!("Infinite loop looking for set tag!");
                    break;
                }
                self.sessions.set_one(username, &name, &value);
                reply = reply.replace(&format!("<set {}={}>", name, value), "");
            }
        } else {
            reply = self.process_tags(username, reply, &stars, &botstars, step);
        }

        reply
    }
}

//! Message normalization and trigger-to-regex compilation.
//!
//! Both sides of a match go through this module:
//!
//! - The user's message is *normalized*: lowercased, run through the `sub`
//!   substitution table (longest patterns first), then stripped of anything
//!   that isn't `[a-z0-9_ ]` (UTF-8 mode instead strips a configurable
//!   punctuation class so non-Latin scripts survive).
//! - The trigger pattern is *compiled* into a real regular expression:
//!   wildcards become capture groups, optionals become alternations, and
//!   `@array` / `<bot>` / `<get>` / `<input>` / `<reply>` references are
//!   resolved against the brain and session at match time.
//!
//! The compiled pattern is matched anchored (`^...$`) by the reply engine.

use std::collections::HashMap;

use log::warn;
use regex::Regex;

use crate::session::HISTORY_SIZE;
use crate::RiveScript;

/// Counts the words in a trigger pattern or substitution key.
///
/// With `all` set, every whitespace-separated token counts; otherwise
/// wildcard and optional punctuation (`* # _ | [`) also splits, so that
/// `"hello *"` counts one word.
pub(crate) fn word_count(pattern: &str, all: bool) -> usize {
    if all {
        pattern.split_whitespace().count()
    } else {
        pattern
            .split(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '_' | '|' | '['))
            .filter(|word| !word.is_empty())
            .count()
    }
}

impl RiveScript {
    /// Normalize a message for matching.
    ///
    /// Used for the user's input, the bot's last reply when resolving
    /// `%Previous`, and history values interpolated into triggers.
    pub(crate) fn format_message(&self, msg: &str) -> String {
        let msg = msg.to_lowercase();
        let msg = self.substitute(&msg, &self.sub, &self.sorted.sub);
        let msg = self.sanitize(&msg);
        msg.trim().to_string()
    }

    /// Strip characters that the matcher never sees.
    pub(crate) fn sanitize(&self, msg: &str) -> String {
        if self.utf8 {
            // Strip regex metacharacters and HTML brackets, then the
            // configured punctuation class.
            let msg = regex!(r"[\\<>]").replace_all(msg, "");
            self.unicode_punctuation.replace_all(&msg, "").into_owned()
        } else {
            regex!(r"[^a-z0-9_ ]").replace_all(msg, "").into_owned()
        }
    }

    /// Run a substitution table over a message, longest patterns first.
    ///
    /// Substituted regions are protected with `\x00n\x00` placeholders so a
    /// substitution result can never be re-substituted by a later pattern.
    pub(crate) fn substitute(&self, message: &str, subs: &HashMap<String, String>, sorted: &[String]) -> String {
        if subs.is_empty() {
            return message.to_string();
        }

        let mut message = message.to_string();
        let mut ph: Vec<&str> = Vec::new();

        for pattern in sorted {
            let Some(result) = subs.get(pattern) else { continue };
            let qm = regex::escape(pattern);
            ph.push(result);
            let placeholder = format!("\0{}\0", ph.len() - 1);

            // Whole-message, leading, inner and trailing occurrences, always
            // on word boundaries.
            let rewrites = [
                (format!("^{}$", qm), placeholder.clone()),
                (format!(r"^{}(\W+)", qm), format!("{}${{1}}", placeholder)),
                (format!(r"(\W+){}(\W+)", qm), format!("${{1}}{}${{2}}", placeholder)),
                (format!(r"(\W+){}$", qm), format!("${{1}}{}", placeholder)),
            ];
            for (search, replace) in rewrites {
                if let Ok(re) = Regex::new(&search) {
                    message = re.replace_all(&message, replace.as_str()).into_owned();
                }
            }
        }

        // Convert the placeholders back in.
        let mut tries = 0;
        while message.contains('\0') {
            tries += 1;
            if tries > self.depth {
                warn!("Too many loops restoring substitution placeholders!");
                break;
            }
            let Some(caps) = regex!(r"\x00(\d+)\x00").captures(&message) else { break };
            let index: usize = caps[1].parse().unwrap_or(0);
            let result = ph.get(index).copied().unwrap_or("").to_string();
            message = message.replace(&format!("\0{}\0", index), &result);
        }

        message
    }

    /// Compile a trigger pattern into regular expression source.
    ///
    /// The result is matched anchored against a normalized message. Session
    /// state (`<get>`, `<input>`, `<reply>`) is resolved for `username` at
    /// compile time, which is why triggers are compiled per match rather than
    /// cached.
    pub(crate) fn trigger_regexp(&self, username: &str, pattern: &str) -> String {
        // A trigger of nothing but `*` must match the empty string too.
        let mut pattern = regex!(r"^\*$").replace(pattern, "<zerowidthstar>").into_owned();

        // Escaped underscores stay literal.
        pattern = pattern.replace(r"\_", "\0");

        // Wildcards.
        pattern = pattern.replace('*', "(.+?)");
        pattern = pattern.replace('#', r"(\d+?)");
        pattern = pattern.replace('_', if self.utf8 { r"(\p{L}+?)" } else { "([A-Za-z]+?)" });
        pattern = pattern.replace('\0', "_");
        pattern = regex!(r"\s*\{weight=\d+\}\s*").replace_all(&pattern, "").into_owned();
        pattern = pattern.replace("<zerowidthstar>", "(.*?)");

        // Optionals: `[a|b]` may match either alternative or nothing at all.
        let mut giveup = 0;
        loop {
            let inner = match regex!(r"\[(.+?)\]").captures(&pattern) {
                Some(caps) => caps[1].to_string(),
                None => break,
            };
            giveup += 1;
            if giveup > self.depth {
                warn!("Infinite loop when trying to process optionals in trigger!");
                return String::new();
            }

            let alternatives: Vec<String> =
                inner.split('|').map(|alt| format!(r"(?:\s|\b)+{}(?:\s|\b)+", alt)).collect();

            // Wildcards inside an optional must not capture.
            let pipes = alternatives
                .join("|")
                .replace("(.+?)", "(?:.+?)")
                .replace(r"(\d+?)", r"(?:\d+?)")
                .replace("([A-Za-z]+?)", "(?:[A-Za-z]+?)")
                .replace(r"(\p{L}+?)", r"(?:\p{L}+?)");

            let brackets = format!(r"\s*\[{}\]\s*", regex::escape(&inner));
            match Regex::new(&brackets) {
                Ok(re) => {
                    let replacement = format!(r"(?:{}|(?:\b|\s)+)", pipes);
                    pattern = re.replace(&pattern, regex::NoExpand(&replacement)).into_owned();
                }
                Err(_) => break,
            }
        }

        // @array references expand to an alternation of the array's items;
        // unknown arrays delete the reference.
        let mut giveup = 0;
        while pattern.contains('@') {
            giveup += 1;
            if giveup > self.depth {
                break;
            }
            let name = match regex!(r"@([A-Za-z0-9_]+)").captures(&pattern) {
                Some(caps) => caps[1].to_string(),
                None => break,
            };
            let rep = match self.array.get(&name) {
                Some(items) => format!("(?:{})", items.join("|")),
                None => String::new(),
            };
            pattern = pattern.replace(&format!("@{}", name), &rep);
        }

        // Bot variables.
        let mut giveup = 0;
        while pattern.contains("<bot ") {
            giveup += 1;
            if giveup > self.depth {
                break;
            }
            let name = match regex!(r"<bot (.+?)>").captures(&pattern) {
                Some(caps) => caps[1].to_string(),
                None => break,
            };
            let rep = match self.var.get(&name) {
                Some(value) => self.sanitize(&value.to_lowercase()),
                None => "undefined".to_string(),
            };
            pattern = pattern.replace(&format!("<bot {}>", name), &rep);
        }

        // User variables.
        let mut giveup = 0;
        while pattern.contains("<get ") {
            giveup += 1;
            if giveup > self.depth {
                break;
            }
            let name = match regex!(r"<get (.+?)>").captures(&pattern) {
                Some(caps) => caps[1].to_string(),
                None => break,
            };
            let rep = match self.sessions.get(username, &name) {
                Some(value) => self.sanitize(&value.to_lowercase()),
                None => "undefined".to_string(),
            };
            pattern = pattern.replace(&format!("<get {}>", name), &rep);
        }

        // Input and reply history.
        if pattern.contains("<input") || pattern.contains("<reply") {
            let history = self.sessions.get_history(username).unwrap_or_default();
            pattern = pattern.replace("<input>", "<input1>");
            pattern = pattern.replace("<reply>", "<reply1>");
            for i in 1..=HISTORY_SIZE {
                pattern = pattern.replace(&format!("<input{}>", i), &self.format_message(history.input(i - 1)));
                pattern = pattern.replace(&format!("<reply{}>", i), &self.format_message(history.reply(i - 1)));
            }
        }

        pattern
    }
}

//! Tag expansion.
//!
//! Replies (and condition operands) may carry tags that read and write the
//! session, transform text, or re-enter the reply engine. Expansion is mostly
//! a series of bounded rewrite loops over the reply string; the variable tags
//! (`<get>`, `<set>`, `<bot>`, ...) use an innermost-first scan so nesting
//! like `<set name=<get othername>>` resolves inside-out.
//!
//! Unrecognized `<tags>` survive expansion verbatim: they're shielded with
//! `\x00`/`\x01` markers while the scan runs, then restored.

use log::{debug, warn};
use rand::Rng;

use crate::session::HISTORY_SIZE;
use crate::RiveScript;

/// Apply a string transform by name.
fn string_format(format: &str, input: &str) -> String {
    match format {
        "uppercase" => input.to_uppercase(),
        "lowercase" => input.to_lowercase(),
        "sentence" => capitalize(input),
        "formal" => input.split(' ').map(capitalize).collect::<Vec<_>>().join(" "),
        other => format!("[ERR: Unknown String Transform \"{}\"]", other),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl RiveScript {
    /// Expand every tag in a reply (or condition operand).
    ///
    /// `stars` and `botstars` are the capture groups from the trigger and
    /// `%Previous` matches; `step` carries the recursion depth into inline
    /// redirects.
    pub(crate) fn process_tags(
        &mut self,
        username: &str,
        mut reply: String,
        st: &[String],
        bst: &[String],
        step: usize,
    ) -> String {
        // Stars are 1-indexed; a match with no captures reads as "undefined".
        let mut stars: Vec<String> = vec![String::new()];
        stars.extend_from_slice(st);
        if stars.len() == 1 {
            stars.push("undefined".to_string());
        }
        let mut botstars: Vec<String> = vec![String::new()];
        botstars.extend_from_slice(bst);
        if botstars.len() == 1 {
            botstars.push("undefined".to_string());
        }

        // {! ...}: stream new source into the brain at reply time.
        let mut giveup = 0;
        loop {
            let (whole, source) = match regex!(r"\{!(.+?)\}").captures(&reply) {
                Some(caps) => (caps[0].to_string(), caps[1].to_string()),
                None => break,
            };
            giveup += 1;
            if giveup > self.depth {
                warn!("Infinite loop looking for {{!}} tag!");
                break;
            }
            if let Err(err) = self.stream(&source) {
                warn!("Error streaming in-reply source code: {}", err);
            }
            reply = reply.replacen(&whole, "", 1);
        }

        // Tag shortcuts.
        reply = reply.replace("<person>", "{person}<star>{/person}");
        reply = reply.replace("<@>", "{@<star>}");
        reply = reply.replace("<formal>", "{formal}<star>{/formal}");
        reply = reply.replace("<sentence>", "{sentence}<star>{/sentence}");
        reply = reply.replace("<uppercase>", "{uppercase}<star>{/uppercase}");
        reply = reply.replace("<lowercase>", "{lowercase}<star>{/lowercase}");

        // Weight tags were already consumed by the sorter and reply pool.
        reply = regex!(r"\{weight=\d+\}").replace_all(&reply, "").into_owned();

        // Star tags.
        reply = reply.replace("<star>", &stars[1]);
        reply = reply.replace("<botstar>", &botstars[1]);
        for (i, star) in stars.iter().enumerate().skip(1) {
            reply = reply.replace(&format!("<star{}>", i), star);
        }
        for (i, star) in botstars.iter().enumerate().skip(1) {
            reply = reply.replace(&format!("<botstar{}>", i), star);
        }
        // Stars the match didn't produce read as "undefined".
        reply = regex!(r"<(?:bot)?star\d*>").replace_all(&reply, "undefined").into_owned();

        // <input> and <reply> history tags.
        if reply.contains("<input") || reply.contains("<reply") {
            let history = self.sessions.get_history(username).unwrap_or_default();
            reply = reply.replace("<input>", "<input1>");
            reply = reply.replace("<reply>", "<reply1>");
            for i in 1..=HISTORY_SIZE {
                reply = reply.replace(&format!("<input{}>", i), &self.format_message(history.input(i - 1)));
                reply = reply.replace(&format!("<reply{}>", i), &self.format_message(history.reply(i - 1)));
            }
        }

        // <id> and escape codes.
        reply = reply.replace("<id>", username);
        reply = reply.replace(r"\s", " ");
        reply = reply.replace(r"\n", "\n");
        reply = reply.replace(r"\#", "#");

        // (@array) becomes a {random} over the array's items; unknown arrays
        // are preserved literally.
        let array = &self.array;
        reply = regex!(r"\(@([A-Za-z0-9_]+)\)")
            .replace_all(&reply, |caps: &regex::Captures| match array.get(&caps[1]) {
                Some(items) => format!("{{random}}{}{{/random}}", items.join("|")),
                None => caps[0].to_string(),
            })
            .into_owned();

        // {random} tags.
        let mut giveup = 0;
        loop {
            let text = match regex!(r"\{random\}(.+?)\{/random\}").captures(&reply) {
                Some(caps) => caps[1].to_string(),
                None => break,
            };
            giveup += 1;
            if giveup > self.depth {
                warn!("Infinite loop looking for random tag!");
                break;
            }
            let options: Vec<&str> =
                if text.contains('|') { text.split('|').collect() } else { text.split(' ').collect() };
            let choice = options[rand::thread_rng().gen_range(0..options.len())].to_string();
            reply = reply.replace(&format!("{{random}}{}{{/random}}", text), &choice);
        }

        // Person substitutions and string formatting.
        let formats = [
            ("person", regex!(r"\{person\}(.+?)\{/person\}")),
            ("formal", regex!(r"\{formal\}(.+?)\{/formal\}")),
            ("sentence", regex!(r"\{sentence\}(.+?)\{/sentence\}")),
            ("uppercase", regex!(r"\{uppercase\}(.+?)\{/uppercase\}")),
            ("lowercase", regex!(r"\{lowercase\}(.+?)\{/lowercase\}")),
        ];
        for (format, re) in formats {
            let mut giveup = 0;
            loop {
                let content = match re.captures(&reply) {
                    Some(caps) => caps[1].to_string(),
                    None => break,
                };
                giveup += 1;
                if giveup > self.depth {
                    warn!("Infinite loop looking for {} tag!", format);
                    break;
                }
                let replacement = if format == "person" {
                    self.substitute(&content, &self.person, &self.sorted.person)
                } else {
                    string_format(format, &content)
                };
                reply = reply.replace(&format!("{{{0}}}{1}{{/{0}}}", format, content), &replacement);
            }
        }

        // Variable tags, innermost-first so nesting like <set a=<get b>>
        // resolves inside-out.
        let mut giveup = 0;
        while reply.contains('<') && reply.contains('>') {
            giveup += 1;
            if giveup > self.depth {
                warn!("Infinite loop looking for tag!");
                break;
            }

            let (whole, inner) = match regex!(r"<([^<]+?)>").captures(&reply) {
                Some(caps) => (caps[0].to_string(), caps[1].to_string()),
                None => break,
            };
            let (tag, data) = match inner.split_once(' ') {
                Some((tag, data)) => (tag.to_string(), data.to_string()),
                None => (inner.clone(), String::new()),
            };
            let mut insert = String::new();

            match tag.as_str() {
                "bot" | "env" => {
                    // <bot> reads/writes bot variables, <env> the globals.
                    let target = if tag == "bot" { &mut self.var } else { &mut self.global };
                    match data.split_once('=') {
                        Some((name, value)) => {
                            debug!("Assign {} variable {} = {}", tag, name, value);
                            target.insert(name.to_string(), value.to_string());
                        }
                        None => {
                            insert = target.get(&data).cloned().unwrap_or_else(|| "undefined".to_string());
                        }
                    }
                }
                "set" => match data.split_once('=') {
                    Some((name, value)) => {
                        debug!("Set uservar {} = {}", name, value);
                        self.sessions.set_one(username, name, value);
                    }
                    None => warn!("Malformed <set> tag: {}", inner),
                },
                "add" | "sub" | "mult" | "div" => {
                    insert = self.math_tag(username, &tag, &data);
                }
                "get" => {
                    insert = self.sessions.get(username, &data).unwrap_or_else(|| "undefined".to_string());
                }
                _ => {
                    // Unrecognized; shield it from this loop and restore below.
                    insert = format!("\x00{}\x01", inner);
                }
            }

            reply = reply.replacen(&whole, &insert, 1);
        }

        // Restore the unrecognized tags.
        reply = reply.replace('\x00', "<").replace('\x01', ">");

        // {topic=...}: switch the user's topic.
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
            debug!("Set user's topic to: {}", name);
            self.sessions.set_one(username, "topic", &name);
            reply = reply.replace(&format!("{{topic={}}}", name), "");
        }

        // {@...}: inline redirect.
        let mut giveup = 0;
        loop {
            let (whole, target) = match regex!(r"\{@([^\}]*?)\}").captures(&reply) {
                Some(caps) => (caps[0].to_string(), caps[1].to_string()),
                None => break,
            };
            giveup += 1;
            if giveup > self.depth {
                warn!("Infinite loop looking for redirect tag!");
                break;
            }
            let target = target.trim().to_lowercase();
            debug!("Inline redirection to: {}", target);
            let subreply = self.get_reply(username, &target, false, step + 1);
            reply = reply.replace(&whole, &subreply);
        }

        // <call>...</call>: object macros.
        let mut giveup = 0;
        loop {
            let (whole, text) = match regex!(r"(?s)<call>(.+?)</call>").captures(&reply) {
                Some(caps) => (caps[0].to_string(), caps[1].to_string()),
                None => break,
            };
            giveup += 1;
            if giveup > self.depth {
                warn!("Infinite loop looking for call tag!");
                break;
            }

            let mut parts = text.trim().split_whitespace();
            let obj = parts.next().unwrap_or_default().to_string();
            let args: Vec<String> = parts.map(str::to_string).collect();

            let output = if let Some(subroutine) = self.subroutines.get(&obj) {
                // Native Rust macros take precedence.
                subroutine(username, &args)
            } else if let Some(language) = self.object_languages.get(&obj) {
                match self.handlers.get(language) {
                    Some(handler) => handler.call(&obj, &args, username),
                    None => self.errors.object_not_found.clone(),
                }
            } else {
                self.errors.object_not_found.clone()
            };

            reply = reply.replace(&whole, &output);
        }

        reply
    }

    /// Handle `<add>`, `<sub>`, `<mult>` and `<div>` on a session variable.
    ///
    /// Returns the error text to insert, or an empty string on success.
    fn math_tag(&mut self, username: &str, op: &str, data: &str) -> String {
        let Some((name, value_str)) = data.split_once('=') else {
            warn!("Malformed <{}> tag", op);
            return String::new();
        };

        // Uninitialized variables count from zero.
        let orig_str = match self.sessions.get(username, name) {
            Some(value) if value != "undefined" => value,
            _ => {
                self.sessions.set_one(username, name, "0");
                "0".to_string()
            }
        };

        let value: i64 = match value_str.parse() {
            Ok(value) => value,
            Err(_) => return format!("[ERR: Math can't \"{}\" non-numeric value \"{}\"]", op, value_str),
        };
        let orig: i64 = match orig_str.parse() {
            Ok(orig) => orig,
            Err(_) => return format!("[ERR: Math can't \"{}\" non-numeric user variable \"{}\"]", op, name),
        };

        let result = match op {
            "add" => orig + value,
            "sub" => orig - value,
            "mult" => orig * value,
            _ => {
                if value == 0 {
                    return "[ERR: Can't divide by zero!]".to_string();
                }
                orig / value
            }
        };
        self.sessions.set_one(username, name, &result.to_string());
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_formats() {
        assert_eq!(string_format("uppercase", "hello world"), "HELLO WORLD");
        assert_eq!(string_format("lowercase", "HELLO World"), "hello world");
        assert_eq!(string_format("sentence", "hello world"), "Hello world");
        assert_eq!(string_format("formal", "hello world"), "Hello World");
        assert_eq!(string_format("backwards", "x"), "[ERR: Unknown String Transform \"backwards\"]");
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("über"), "Über");
    }
}

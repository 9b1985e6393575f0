//! The RiveScript source parser.
//!
//! A line-oriented, stateful reader that turns source text into a
//! [`Root`](crate::Root) tree. Each non-blank, non-comment line begins with a
//! single command character:
//!
//! ```text
//! !  definition      >  label open      <  label close
//! +  trigger         -  reply           %  previous
//! ^  continuation    @  redirect        *  condition
//! // comment         /* ... */  multi-line comment
//! ```
//!
//! The parser never touches the brain directly; it produces a passive tree
//! that `RiveScript::parse_merge` folds in afterwards. Two commands are
//! resolved by *look-ahead* rather than in their own right:
//!
//! - `%` after a `+` becomes that trigger's `previous` pattern.
//! - `^` appends to the preceding command's payload, glued with the
//!   file-local `! local concat` mode (definitions always glue with a literal
//!   `<crlf>` that the definition handler splits on).
//!
//! In strict mode any structural violation aborts the parse with a
//! [`ParseError`]; otherwise the offending line is logged and skipped.

use std::collections::HashMap;

use log::{debug, warn};

use crate::ast::{ObjectMacro, Root, Trigger};
use crate::errors::ParseError;

/// The highest RiveScript language version this parser understands.
pub const RS_VERSION: f64 = 2.0;

/// User-configurable properties of the [`Parser`].
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Whether strict syntax checking is enabled.
    pub strict: bool,
    /// Whether UTF-8 mode is enabled for triggers.
    pub utf8: bool,
    /// Whether to force-lowercase trigger patterns.
    pub force_case: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { strict: true, utf8: false, force_case: false }
    }
}

/// Parser for RiveScript source code.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a document into an AST.
    ///
    /// `filename` is only used for diagnostics; the caller is responsible for
    /// having read the lines from wherever they live.
    pub fn parse(&self, filename: &str, lines: &[String]) -> Result<Root, ParseError> {
        let mut ast = Root::new();

        let mut topic = "random".to_string(); // Current topic label
        let mut comment = false;              // In a multi-line comment
        let mut in_object = false;            // In an object macro block
        let mut obj_name = String::new();
        let mut obj_lang = String::new();
        let mut obj_buf: Vec<String> = Vec::new();
        let mut is_that: Option<String> = None; // Pending %Previous for the next trigger

        // Where the current trigger lives: (topic, index), plus the line it
        // was declared on for diagnostics.
        let mut cur_trig: Option<(String, usize)> = None;
        let mut trigger_lines: HashMap<(String, usize), usize> = HashMap::new();

        // File-scoped parser options.
        let mut local_options: HashMap<String, String> =
            HashMap::from([("concat".to_string(), "none".to_string())]);

        for (lp, raw_line) in lines.iter().enumerate() {
            let lineno = lp + 1;
            let mut line = raw_line.trim().to_string();

            // Object blocks swallow everything verbatim until `< object`.
            if in_object {
                if line.contains("< object") || line.contains("<object") {
                    if !obj_name.is_empty() {
                        ast.objects.push(ObjectMacro {
                            name: std::mem::take(&mut obj_name),
                            language: std::mem::take(&mut obj_lang),
                            code: std::mem::take(&mut obj_buf),
                        });
                    }
                    in_object = false;
                } else {
                    obj_buf.push(raw_line.trim_end_matches(['\r', '\n']).to_string());
                }
                continue;
            }

            if line.is_empty() {
                continue;
            }

            // Comments.
            if line.starts_with("//") {
                continue;
            }
            if line.starts_with('#') {
                warn!("Using the # symbol for comments is deprecated at {} line {}", filename, lineno);
                continue;
            }
            if line.starts_with("/*") {
                if !line.contains("*/") {
                    comment = true;
                }
                continue;
            }
            if line.contains("*/") {
                comment = false;
                continue;
            }
            if comment {
                continue;
            }

            // Separate the command character from its payload.
            let cmd = line.chars().next().unwrap();
            line = line[cmd.len_utf8()..].trim().to_string();

            // Ignore in-line comments.
            if let Some(idx) = line.find(" // ") {
                line.truncate(idx);
                line = line.trim_end().to_string();
            }

            if line.is_empty() {
                if self.config.strict {
                    return Err(self.syntax_error(filename, lineno, format!("command '{}' has no payload", cmd)));
                }
                warn!("Command '{}' with no payload at {} line {}", cmd, filename, lineno);
                continue;
            }

            // If we're force-lowercasing triggers, do so before the syntax
            // check sees them.
            if self.config.force_case && cmd == '+' {
                line = line.to_lowercase();
            }

            if let Some(message) = self.check_syntax(cmd, &line) {
                if self.config.strict {
                    return Err(self.syntax_error(filename, lineno, message));
                }
                warn!("Syntax error at {} line {}: {} (in topic {})", filename, lineno, message, topic);
                continue;
            }

            // A new trigger resets any %Previous binding in progress.
            if cmd == '+' {
                is_that = None;
            }

            // Look ahead for ^Continue and %Previous commands.
            if cmd != '^' {
                for lookahead in &lines[lp + 1..] {
                    let lookahead = lookahead.trim();
                    if lookahead.len() < 2 {
                        continue;
                    }
                    let look_cmd = lookahead.chars().next().unwrap();
                    let lookahead = lookahead[look_cmd.len_utf8()..].trim();

                    // Only %Previous and ^Continue bind backwards.
                    if look_cmd != '%' && look_cmd != '^' {
                        break;
                    }
                    if lookahead.is_empty() {
                        break;
                    }

                    if look_cmd == '%' {
                        if cmd == '+' {
                            debug!("Trigger: {}; that: {}", line, lookahead);
                            is_that = Some(lookahead.to_string());
                        }
                        break;
                    }

                    // ^Continue: concatenate onto the current payload.
                    if cmd == '!' {
                        line.push_str("<crlf>");
                        line.push_str(lookahead);
                    } else {
                        match local_options.get("concat").map(String::as_str) {
                            Some("space") => line.push(' '),
                            Some("newline") => line.push('\n'),
                            _ => {}
                        }
                        line.push_str(lookahead);
                    }
                }
            }

            match cmd {
                '!' => {
                    // ! Definition
                    let (left, mut value) = match line.split_once('=') {
                        Some((l, v)) => (l.trim().to_string(), v.trim().to_string()),
                        None => (line.clone(), String::new()),
                    };
                    let mut words = left.split_whitespace();
                    let def_type = words.next().unwrap_or_default().to_string();
                    let name = words.collect::<Vec<_>>().join(" ");

                    // Remove 'fake' line breaks unless this is an array.
                    if def_type != "array" {
                        value = value.replace("<crlf>", "");
                    }

                    // The version gate fails the parse regardless of strict mode.
                    if def_type == "version" {
                        let parsed: f64 = value.parse().unwrap_or(0.0);
                        if parsed > RS_VERSION {
                            return Err(ParseError::UnsupportedVersion {
                                filename: filename.to_string(),
                                line: lineno,
                                version: value,
                                supported: RS_VERSION,
                            });
                        }
                        continue;
                    }

                    // All other definitions require a name and a value.
                    if name.is_empty() {
                        warn!("Undefined variable name at {} line {}", filename, lineno);
                        continue;
                    }
                    if value.is_empty() {
                        warn!("Undefined variable value at {} line {}", filename, lineno);
                        continue;
                    }

                    match def_type.as_str() {
                        "local" => {
                            // File-scoped parser options, e.g. the concat mode.
                            debug!("Set local parser option {} = {}", name, value);
                            local_options.insert(name, value);
                        }
                        "global" => {
                            ast.begin.global.insert(name, value);
                        }
                        "var" => {
                            ast.begin.var.insert(name, value);
                        }
                        "array" => {
                            if value == "<undef>" {
                                ast.begin.array.insert(name, vec!["<undef>".to_string()]);
                                continue;
                            }
                            // Arrays can span multiple lines; each line splits
                            // on pipes when present, otherwise on spaces.
                            let mut fields: Vec<String> = Vec::new();
                            for part in value.split("<crlf>") {
                                if part.contains('|') {
                                    fields.extend(part.split('|').map(str::to_string));
                                } else {
                                    fields.extend(part.split_whitespace().map(str::to_string));
                                }
                            }
                            let fields: Vec<String> = fields
                                .into_iter()
                                .map(|f| f.replace("\\s", " "))
                                .filter(|f| !f.is_empty())
                                .collect();
                            ast.begin.array.insert(name, fields);
                        }
                        "sub" => {
                            ast.begin.sub.insert(name, value);
                        }
                        "person" => {
                            ast.begin.person.insert(name, value);
                        }
                        other => {
                            if self.config.strict {
                                return Err(self.syntax_error(
                                    filename,
                                    lineno,
                                    format!("unknown definition type '{}'", other),
                                ));
                            }
                            warn!("Unknown definition type '{}' at {} line {}", other, filename, lineno);
                        }
                    }
                }
                '>' => {
                    // > Label
                    let mut parts = line.split_whitespace();
                    let mut label_type = parts.next().unwrap_or_default().to_string();
                    let mut name = parts.next().unwrap_or_default().to_string();
                    let fields: Vec<String> = parts.map(str::to_string).collect();

                    // The BEGIN block is a special topic.
                    if label_type == "begin" {
                        debug!("Found the BEGIN block.");
                        label_type = "topic".to_string();
                        name = "__begin__".to_string();
                    }

                    match label_type.as_str() {
                        "topic" => {
                            if self.config.force_case {
                                name = name.to_lowercase();
                            }
                            debug!("Set topic to {}", name);
                            cur_trig = None;
                            topic = name;

                            let entry = ast.topic_mut(&topic);
                            let mut mode = "";
                            for field in &fields {
                                if field == "includes" || field == "inherits" {
                                    mode = field;
                                } else if mode == "includes" {
                                    entry.includes.insert(field.clone());
                                } else if mode == "inherits" {
                                    entry.inherits.insert(field.clone());
                                }
                            }
                        }
                        "object" => {
                            // The first field, if any, is the programming language.
                            let lang = fields.first().map(|l| l.to_lowercase()).unwrap_or_default();
                            if lang.is_empty() {
                                warn!(
                                    "No programming language specified for object '{}' at {} line {}",
                                    name, filename, lineno
                                );
                            }
                            cur_trig = None;
                            obj_name = name;
                            obj_lang = lang;
                            obj_buf = Vec::new();
                            in_object = true;
                        }
                        other => {
                            if self.config.strict {
                                return Err(self.syntax_error(filename, lineno, format!("unknown label type '{}'", other)));
                            }
                            warn!("Unknown label type '{}' at {} line {}", other, filename, lineno);
                        }
                    }
                }
                '<' => {
                    // < Label
                    if line == "begin" || line == "topic" {
                        debug!("End the topic label.");
                        topic = "random".to_string();
                        cur_trig = None;
                    } else if line == "object" {
                        // Stray close; real object closes are consumed by the
                        // collector at the top of the loop.
                        in_object = false;
                    }
                }
                '+' => {
                    // + Trigger
                    debug!("Trigger pattern: {}", line);
                    let trigger = Trigger { pattern: line.clone(), previous: is_that.take(), ..Trigger::default() };
                    let entry = ast.topic_mut(&topic);
                    entry.triggers.push(trigger);
                    let index = entry.triggers.len() - 1;
                    trigger_lines.insert((topic.clone(), index), lineno);
                    cur_trig = Some((topic.clone(), index));
                }
                '-' => {
                    // - Reply
                    let Some((t, i)) = &cur_trig else {
                        if self.config.strict {
                            return Err(self.syntax_error(filename, lineno, "response found before any trigger".to_string()));
                        }
                        warn!("Response found before any trigger at {} line {}", filename, lineno);
                        continue;
                    };
                    debug!("Response: {}", line);
                    ast.topics.get_mut(t).unwrap().triggers[*i].replies.push(line.clone());
                }
                '%' | '^' => {
                    // Handled by the look-ahead above.
                }
                '@' => {
                    // @ Redirect
                    let Some((t, i)) = &cur_trig else {
                        if self.config.strict {
                            return Err(self.syntax_error(filename, lineno, "redirect found before any trigger".to_string()));
                        }
                        warn!("Redirect found before any trigger at {} line {}", filename, lineno);
                        continue;
                    };
                    debug!("Redirect response to: {}", line);
                    ast.topics.get_mut(t).unwrap().triggers[*i].redirect = Some(line.clone());
                }
                '*' => {
                    // * Condition
                    let Some((t, i)) = &cur_trig else {
                        if self.config.strict {
                            return Err(self.syntax_error(filename, lineno, "condition found before any trigger".to_string()));
                        }
                        warn!("Condition found before any trigger at {} line {}", filename, lineno);
                        continue;
                    };
                    debug!("Adding condition: {}", line);
                    ast.topics.get_mut(t).unwrap().triggers[*i].conditions.push(line.clone());
                }
                other => {
                    if self.config.strict {
                        return Err(self.syntax_error(filename, lineno, format!("unknown command '{}'", other)));
                    }
                    warn!("Unknown command '{}' at {} line {}", other, filename, lineno);
                }
            }
        }

        // A trigger with no replies, redirect, or conditions can never answer.
        for (topic_name, topic_data) in ast.topics.iter_mut() {
            if self.config.strict {
                for (index, trigger) in topic_data.triggers.iter().enumerate() {
                    if !trigger.has_output() {
                        let lineno = trigger_lines.get(&(topic_name.clone(), index)).copied().unwrap_or(0);
                        return Err(self.syntax_error(
                            filename,
                            lineno,
                            format!("trigger '+ {}' has no replies, redirect, or conditions", trigger.pattern),
                        ));
                    }
                }
            } else {
                topic_data.triggers.retain(|trigger| {
                    if trigger.has_output() {
                        return true;
                    }
                    warn!(
                        "Skipping trigger '+ {}' in topic {} of {}: no replies, redirect, or conditions",
                        trigger.pattern, topic_name, filename
                    );
                    false
                });
            }
        }

        Ok(ast)
    }

    fn syntax_error(&self, filename: &str, line: usize, message: String) -> ParseError {
        ParseError::Syntax { filename: filename.to_string(), line, message }
    }

    /// Validate one line's payload against the rules for its command.
    ///
    /// Returns a human-readable problem description, or `None` if the line is
    /// fine.
    fn check_syntax(&self, cmd: char, line: &str) -> Option<String> {
        match cmd {
            '!' => {
                // ! Definition: '! type name = value' or '! type = value'.
                if !regex!(r"^.+(?:\s+.+|)\s*=\s*.+?$").is_match(line) {
                    return Some(
                        "invalid format for !Definition line: must be '! type name = value' or '! type = value'"
                            .to_string(),
                    );
                }
                if line.starts_with("array") {
                    if regex!(r"=\s?\||\|\s?$").is_match(line) {
                        return Some("piped arrays can't begin or end with a |".to_string());
                    }
                    if line.contains("||") {
                        return Some("piped arrays can't include blank entries".to_string());
                    }
                }
            }
            '>' => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                match parts.first().copied() {
                    Some("begin") if parts.len() > 1 => {
                        return Some("the 'begin' label takes no additional arguments".to_string());
                    }
                    Some("topic") => {
                        let lowercase_ok = self.config.utf8 || !regex!(r"[^a-z0-9_\-\s]").is_match(line);
                        if !lowercase_ok || regex!(r"[A-Z\\.]").is_match(line) {
                            return Some("topics should be lowercased and contain only letters and numbers".to_string());
                        }
                    }
                    Some("object") => {
                        if regex!(r"[^A-Za-z0-9_\-\s]").is_match(line) {
                            return Some("objects can only contain numbers and letters".to_string());
                        }
                    }
                    _ => {}
                }
            }
            '+' | '%' | '@' => {
                // These are run through the regexp engine, so be picky.
                if self.config.utf8 {
                    if regex!(r"[A-Z\\.]").is_match(line) {
                        return Some(
                            "triggers can't contain uppercase letters, backslashes or dots in UTF-8 mode".to_string(),
                        );
                    }
                } else if regex!(r"[^a-z0-9(|)\[\]*_#@{}<>=/\s]").is_match(line) {
                    return Some(
                        "triggers may only contain lowercase letters, numbers, and these symbols: ( | ) [ ] * _ # { } < > = /"
                            .to_string(),
                    );
                }

                // All brackets should be matched.
                let (mut parens, mut square, mut curly, mut angle) = (0i32, 0i32, 0i32, 0i32);
                for c in line.chars() {
                    match c {
                        '(' => parens += 1,
                        ')' => parens -= 1,
                        '[' => square += 1,
                        ']' => square -= 1,
                        '{' => curly += 1,
                        '}' => curly -= 1,
                        '<' => angle += 1,
                        '>' => angle -= 1,
                        _ => {}
                    }
                }
                if parens != 0 {
                    return Some("unmatched parenthesis brackets".to_string());
                }
                if square != 0 {
                    return Some("unmatched square brackets".to_string());
                }
                if curly != 0 {
                    return Some("unmatched curly brackets".to_string());
                }
                if angle != 0 {
                    return Some("unmatched angle brackets".to_string());
                }
            }
            '*' => {
                // * Condition: 'value symbol value => response'.
                if !regex!(r"^.+?\s*(?:==|eq|!=|ne|<>|<=|>=|<|>)\s*.+?=>.+?$").is_match(line) {
                    return Some(
                        "invalid format for *Condition: should be like '* value symbol value => response'".to_string(),
                    );
                }
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(source: &str) -> Vec<String> {
        source.lines().map(str::to_string).collect()
    }

    fn parse(source: &str) -> Root {
        Parser::new(ParserConfig::default()).parse("test.rive", &lines(source)).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::new(ParserConfig::default()).parse("test.rive", &lines(source)).unwrap_err()
    }

    #[test]
    fn parses_a_simple_trigger_and_reply() {
        let ast = parse("+ hello bot\n- Hello, human!");
        let random = &ast.topics["random"];
        assert_eq!(random.triggers.len(), 1);
        assert_eq!(random.triggers[0].pattern, "hello bot");
        assert_eq!(random.triggers[0].replies, vec!["Hello, human!"]);
    }

    #[test]
    fn binds_previous_to_the_preceding_trigger() {
        let ast = parse("+ knock knock\n- Who's there?\n+ *\n% who is there\n- <sentence> who?");
        let triggers = &ast.topics["random"].triggers;
        assert_eq!(triggers[0].previous, None);
        assert_eq!(triggers[1].previous, Some("who is there".to_string()));
    }

    #[test]
    fn a_new_trigger_resets_the_previous_binding() {
        let ast = parse("+ one\n% prior\n- a\n+ two\n- b");
        let triggers = &ast.topics["random"].triggers;
        assert_eq!(triggers[0].previous, Some("prior".to_string()));
        assert_eq!(triggers[1].previous, None);
    }

    #[test]
    fn continuation_concat_modes() {
        // Default: no delimiter.
        let ast = parse("+ one two\n- Hello\n^ world");
        assert_eq!(ast.topics["random"].triggers[0].replies[0], "Helloworld");

        // Space mode.
        let ast = parse("! local concat = space\n+ one two\n- Hello\n^ world");
        assert_eq!(ast.topics["random"].triggers[0].replies[0], "Hello world");

        // Newline mode.
        let ast = parse("! local concat = newline\n+ one two\n- Hello\n^ world");
        assert_eq!(ast.topics["random"].triggers[0].replies[0], "Hello\nworld");
    }

    #[test]
    fn definitions_and_multiline_arrays() {
        let ast = parse(
            "! version = 2.0\n\
             ! global debug = 1\n\
             ! var name = Bot\n\
             ! sub what's = what is\n\
             ! person you = I\n\
             ! array colors = red green blue\n\
             ^ light\\sred|dark\\sred\n\
             + dummy\n\
             - ok",
        );
        assert_eq!(ast.begin.global["debug"], "1");
        assert_eq!(ast.begin.var["name"], "Bot");
        assert_eq!(ast.begin.sub["what's"], "what is");
        assert_eq!(ast.begin.person["you"], "I");
        assert_eq!(
            ast.begin.array["colors"],
            vec!["red", "green", "blue", "light red", "dark red"]
        );
    }

    #[test]
    fn version_gate_rejects_future_versions() {
        let err = parse_err("! version = 2.1");
        assert!(matches!(err, ParseError::UnsupportedVersion { .. }));

        // Even in non-strict mode.
        let config = ParserConfig { strict: false, ..ParserConfig::default() };
        let err = Parser::new(config).parse("test.rive", &lines("! version = 3.0")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion { .. }));
    }

    #[test]
    fn topic_labels_with_includes_and_inherits() {
        let ast = parse(
            "> topic alpha includes beta inherits gamma delta\n\
             + in alpha\n\
             - Alpha reply.\n\
             < topic\n\
             + outside\n\
             - Back in random.",
        );
        let alpha = &ast.topics["alpha"];
        assert!(alpha.includes.contains("beta"));
        assert!(alpha.inherits.contains("gamma"));
        assert!(alpha.inherits.contains("delta"));
        assert_eq!(alpha.triggers[0].pattern, "in alpha");
        assert_eq!(ast.topics["random"].triggers[0].pattern, "outside");
    }

    #[test]
    fn begin_label_is_the_begin_topic() {
        let ast = parse("> begin\n+ request\n- {ok}\n< begin");
        assert_eq!(ast.topics["__begin__"].triggers[0].pattern, "request");
    }

    #[test]
    fn object_blocks_collect_verbatim() {
        let ast = parse(
            "> object reverse rust\n\
             \tlet x = 1;\n\
             \tx\n\
             < object\n\
             + dummy\n\
             - ok",
        );
        assert_eq!(ast.objects.len(), 1);
        assert_eq!(ast.objects[0].name, "reverse");
        assert_eq!(ast.objects[0].language, "rust");
        assert_eq!(ast.objects[0].code, vec!["\tlet x = 1;", "\tx"]);
    }

    #[test]
    fn comments_are_ignored() {
        let ast = parse(
            "// A line comment\n\
             /* a multi-line\n\
                comment */\n\
             + hello\n\
             - Hi. // trailing comment",
        );
        let trigger = &ast.topics["random"].triggers[0];
        assert_eq!(trigger.pattern, "hello");
        assert_eq!(trigger.replies, vec!["Hi."]);
    }

    #[test]
    fn strict_mode_rejects_orphan_replies() {
        let err = parse_err("- hello there");
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn strict_mode_rejects_uppercase_triggers() {
        let err = parse_err("+ Hello Bot\n- hi");
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn strict_mode_rejects_unbalanced_brackets() {
        let err = parse_err("+ [hello\n- hi");
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn strict_mode_rejects_triggers_with_no_output() {
        let err = parse_err("+ hello\n+ goodbye\n- bye");
        match err {
            ParseError::Syntax { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("'+ hello'"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn non_strict_mode_skips_bad_lines() {
        let config = ParserConfig { strict: false, ..ParserConfig::default() };
        let ast = Parser::new(config)
            .parse("test.rive", &lines("- orphan\n+ Hello Bot\n- skipped too\n+ hello\n- hi"))
            .unwrap();
        // The uppercase trigger was skipped, so "- skipped too" attached to
        // nothing and only the valid pair survives.
        let triggers = &ast.topics["random"].triggers;
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].pattern, "hello");
    }

    #[test]
    fn force_case_lowers_trigger_patterns() {
        let config = ParserConfig { force_case: true, ..ParserConfig::default() };
        let ast = Parser::new(config).parse("test.rive", &lines("+ Hello Bot\n- hi")).unwrap();
        assert_eq!(ast.topics["random"].triggers[0].pattern, "hello bot");
    }

    #[test]
    fn condition_lines_attach_to_the_trigger() {
        let ast = parse("+ how am i\n* <get mood> eq happy => You are happy!\n- I don't know.");
        let trigger = &ast.topics["random"].triggers[0];
        assert_eq!(trigger.conditions, vec!["<get mood> eq happy => You are happy!"]);
        assert_eq!(trigger.replies, vec!["I don't know."]);
    }

    #[test]
    fn redirect_lines_attach_to_the_trigger() {
        let ast = parse("+ hi\n@ hello");
        assert_eq!(ast.topics["random"].triggers[0].redirect, Some("hello".to_string()));
    }
}

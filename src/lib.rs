//! A RiveScript chatbot interpreter.
//!
//! RiveScript is a line-based scripting language for authoring chatbots: the
//! author writes trigger patterns and replies, and the interpreter matches
//! user messages against the triggers to pick a response.
//!
//! # Synopsis
//!
//! ```no_run
//! use rivescript::{Config, RiveScript};
//!
//! // Create a new interpreter.
//! let mut rs = RiveScript::new(Config::basic());
//!
//! // Load a directory full of replies in *.rive files.
//! rs.load_directory("./replies", &[]).unwrap();
//!
//! // Sort the replies (mandatory after loading).
//! rs.sort_replies();
//!
//! // Get a reply for the user.
//! let reply = rs.reply("user", "Hello bot!");
//! ```
//!
//! The crate splits along the three hard problems:
//!
//! - [`parser`]: source text → AST ([`Root`]).
//! - `engine::sorting`: the deterministic trigger priority order.
//! - `engine::pattern` / `engine::reply` / `engine::tags`: trigger→regex
//!   compilation, matching, and tag expansion.
//!
//! The [`RiveScript`] struct is the *brain*: the merged, validated form of
//! everything loaded, plus the per-user session store behind the
//! [`SessionManager`] trait.

#[macro_use]
mod macros;

mod ast;
mod config;
mod engine;
mod errors;
mod handler;
pub mod parser;
mod session;

pub use ast::{Begin, ObjectMacro, Root, Topic, Trigger};
pub use config::{Config, DEFAULT_DEPTH, DEFAULT_UNICODE_PUNCTUATION};
pub use errors::{ErrorMessages, ParseError, RiveScriptError};
pub use handler::{ObjectHandler, Subroutine};
pub use parser::{Parser, ParserConfig, RS_VERSION};
pub use session::{
    History, MemorySessionManager, SessionManager, ThawAction, UserData, HISTORY_SIZE,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;

use crate::engine::SortBuffer;

/// File extensions the directory loader recognizes by default.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &[".rive", ".rs"];

/// A RiveScript interpreter: the brain plus its session store.
///
/// Loading (`load_file`, `load_directory`, `stream`) may be called any number
/// of times; every load merges into the same brain. Call
/// [`sort_replies`](RiveScript::sort_replies) once loading is done, then
/// [`reply`](RiveScript::reply) away.
pub struct RiveScript {
    utf8: bool,
    depth: usize,
    unicode_punctuation: Regex,
    errors: ErrorMessages,

    parser: Parser,
    sessions: Box<dyn SessionManager>,

    global: HashMap<String, String>,                   // 'global' variables
    var: HashMap<String, String>,                      // 'var' bot variables
    sub: HashMap<String, String>,                      // 'sub' substitutions
    person: HashMap<String, String>,                   // 'person' substitutions
    array: HashMap<String, Vec<String>>,               // 'array' definitions
    includes: HashMap<String, BTreeSet<String>>,       // included topics
    inherits: HashMap<String, BTreeSet<String>>,       // inherited topics
    object_languages: HashMap<String, String>,         // object macro languages
    handlers: HashMap<String, Box<dyn ObjectHandler>>, // object language handlers
    subroutines: HashMap<String, Subroutine>,          // native Rust object macros

    topics: HashMap<String, Vec<Trigger>>, // main topic structure
    thats: HashMap<String, BTreeMap<String, BTreeMap<String, Trigger>>>, // %Previous index
    sorted: SortBuffer,                    // sorted data from sort_replies()
}

impl Default for RiveScript {
    fn default() -> Self {
        Self::new(Config::basic())
    }
}

impl RiveScript {
    /// Create a new interpreter with the given [`Config`].
    pub fn new(mut config: Config) -> Self {
        let mut depth = config.depth;
        if depth == 0 {
            debug!("No depth config: using default {}", DEFAULT_DEPTH);
            depth = DEFAULT_DEPTH;
        }

        let unicode_punctuation = Regex::new(&config.unicode_punctuation).unwrap_or_else(|err| {
            warn!(
                "Invalid unicode punctuation pattern '{}' ({}); using the default",
                config.unicode_punctuation, err
            );
            Regex::new(DEFAULT_UNICODE_PUNCTUATION).unwrap()
        });

        let sessions = config
            .session_manager
            .take()
            .unwrap_or_else(|| Box::new(MemorySessionManager::new()));

        let parser = Parser::new(ParserConfig {
            strict: config.strict,
            utf8: config.utf8,
            force_case: config.force_case,
        });

        Self {
            utf8: config.utf8,
            depth,
            unicode_punctuation,
            errors: config.errors,
            parser,
            sessions,
            global: HashMap::new(),
            var: HashMap::new(),
            sub: HashMap::new(),
            person: HashMap::new(),
            array: HashMap::new(),
            includes: HashMap::new(),
            inherits: HashMap::new(),
            object_languages: HashMap::new(),
            handlers: HashMap::new(),
            subroutines: HashMap::new(),
            topics: HashMap::from([("random".to_string(), Vec::new())]),
            thats: HashMap::new(),
            sorted: SortBuffer::default(),
        }
    }

    /*---------------------------*/
    /*-- Configuration Methods --*/
    /*---------------------------*/

    /// Register a language handler for object macros written in `language`.
    pub fn set_handler(&mut self, language: &str, handler: Box<dyn ObjectHandler>) {
        self.handlers.insert(language.to_string(), handler);
    }

    /// Remove an object macro language handler.
    pub fn remove_handler(&mut self, language: &str) {
        self.handlers.remove(language);
    }

    /// Define a native Rust object macro for the `<call>` tag.
    pub fn set_subroutine(&mut self, name: &str, subroutine: Subroutine) {
        self.subroutines.insert(name.to_string(), subroutine);
    }

    /// Remove a native Rust object macro.
    pub fn remove_subroutine(&mut self, name: &str) {
        self.subroutines.remove(name);
    }

    /// Set a global variable (`! global`, readable via `<env>`).
    /// `None` deletes the variable.
    pub fn set_global(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.global.insert(name.to_string(), value.to_string());
            }
            None => {
                self.global.remove(name);
            }
        }
    }

    /// Get a global variable.
    pub fn get_global(&self, name: &str) -> Option<&str> {
        self.global.get(name).map(String::as_str)
    }

    /// Set a bot variable (`! var`, readable via `<bot>`).
    /// `None` deletes the variable.
    pub fn set_variable(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.var.insert(name.to_string(), value.to_string());
            }
            None => {
                self.var.remove(name);
            }
        }
    }

    /// Get a bot variable.
    pub fn get_variable(&self, name: &str) -> Option<&str> {
        self.var.get(name).map(String::as_str)
    }

    /// Set a substitution pattern (`! sub`). `None` deletes it.
    pub fn set_substitution(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.sub.insert(name.to_string(), value.to_string());
            }
            None => {
                self.sub.remove(name);
            }
        }
    }

    /// Get a substitution pattern.
    pub fn get_substitution(&self, name: &str) -> Option<&str> {
        self.sub.get(name).map(String::as_str)
    }

    /// Set a person substitution pattern (`! person`). `None` deletes it.
    pub fn set_person(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.person.insert(name.to_string(), value.to_string());
            }
            None => {
                self.person.remove(name);
            }
        }
    }

    /// Get a person substitution pattern.
    pub fn get_person(&self, name: &str) -> Option<&str> {
        self.person.get(name).map(String::as_str)
    }

    /*---------------------*/
    /*-- Loading Methods --*/
    /*---------------------*/

    /// Load a single RiveScript document from disk.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RiveScriptError> {
        let path = path.as_ref();
        debug!("Loading RiveScript file: {}", path.display());

        if path.exists() && !path.is_file() {
            return Err(RiveScriptError::NotAFile(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)
            .map_err(|source| RiveScriptError::Io { path: path.to_path_buf(), source })?;
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();

        self.parse(&path.display().to_string(), &lines)?;
        Ok(())
    }

    /// Load every RiveScript document in a directory.
    ///
    /// An empty `extensions` slice means the defaults (`.rive`, `.rs`). The
    /// files load in name order so repeated runs build identical brains.
    pub fn load_directory<P: AsRef<Path>>(
        &mut self,
        path: P,
        extensions: &[&str],
    ) -> Result<(), RiveScriptError> {
        let path = path.as_ref();
        debug!("Loading RiveScript files from directory: {}", path.display());

        let extensions = if extensions.is_empty() { DEFAULT_FILE_EXTENSIONS } else { extensions };
        if !path.is_dir() {
            return Err(RiveScriptError::NotADirectory(path.to_path_buf()));
        }

        let entries = fs::read_dir(path)
            .map_err(|source| RiveScriptError::Io { path: path.to_path_buf(), source })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| extensions.iter().any(|ext| name.ends_with(ext)))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            info!("No files found in directory: {}", path.display());
        }
        for file in files {
            self.load_file(&file)?;
        }
        Ok(())
    }

    /// Load RiveScript source code from a text buffer.
    pub fn stream(&mut self, code: &str) -> Result<(), ParseError> {
        let lines: Vec<String> = code.lines().map(str::to_string).collect();
        self.parse("stream()", &lines)
    }

    /// Parse source code and merge the result into the brain.
    fn parse(&mut self, filename: &str, code: &[String]) -> Result<(), ParseError> {
        debug!("Parsing code...");

        let ast = self.parser.parse(filename, code)?;

        // Fold in the "begin" type variables; <undef> deletes.
        for (name, value) in &ast.begin.global {
            if value == "<undef>" {
                self.global.remove(name);
            } else {
                self.global.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in &ast.begin.var {
            if value == "<undef>" {
                self.var.remove(name);
            } else {
                self.var.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in &ast.begin.sub {
            if value == "<undef>" {
                self.sub.remove(name);
            } else {
                self.sub.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in &ast.begin.person {
            if value == "<undef>" {
                self.person.remove(name);
            } else {
                self.person.insert(name.clone(), value.clone());
            }
        }
        for (name, values) in &ast.begin.array {
            if values.len() == 1 && values[0] == "<undef>" {
                self.array.remove(name);
            } else {
                self.array.insert(name.clone(), values.clone());
            }
        }

        // Consume all the parsed triggers.
        for (topic, data) in &ast.topics {
            // Merge the topic graph edges.
            self.includes.entry(topic.clone()).or_default().extend(data.includes.iter().cloned());
            self.inherits.entry(topic.clone()).or_default().extend(data.inherits.iter().cloned());

            let triggers = self.topics.entry(topic.clone()).or_default();
            for trigger in &data.triggers {
                triggers.push(trigger.clone());

                // Triggers with a %Previous get indexed for the thats buffer.
                if let Some(previous) = &trigger.previous {
                    self.thats
                        .entry(topic.clone())
                        .or_default()
                        .entry(trigger.pattern.clone())
                        .or_default()
                        .insert(previous.clone(), trigger.clone());
                }
            }
        }

        // Hand the parsed object macros to their language handlers.
        for object in &ast.objects {
            match self.handlers.get_mut(&object.language) {
                Some(handler) => {
                    if handler.load(&object.name, &object.code) {
                        self.object_languages.insert(object.name.clone(), object.language.clone());
                    } else {
                        warn!(
                            "Handler for language '{}' declined object '{}'",
                            object.language, object.name
                        );
                    }
                }
                None => warn!(
                    "Object '{}' not loaded as no handler was found for programming language '{}'",
                    object.name, object.language
                ),
            }
        }

        Ok(())
    }

    /*------------------*/
    /*-- User Methods --*/
    /*------------------*/

    /// Set a user variable (equivalent to `<set>`).
    pub fn set_uservar(&self, username: &str, name: &str, value: &str) {
        self.sessions.set_one(username, name, value);
    }

    /// Set multiple user variables at once.
    pub fn set_uservars(&self, username: &str, vars: HashMap<String, String>) {
        self.sessions.set(username, vars);
    }

    /// Get a user variable (equivalent to `<get>`).
    pub fn get_uservar(&self, username: &str, name: &str) -> Option<String> {
        self.sessions.get(username, name)
    }

    /// Get a snapshot of everything stored for one user.
    pub fn get_uservars(&self, username: &str) -> Option<UserData> {
        self.sessions.get_any(username)
    }

    /// Get a snapshot of every user's session.
    pub fn get_all_uservars(&self) -> HashMap<String, UserData> {
        self.sessions.get_all()
    }

    /// Clear one user's session data.
    pub fn clear_uservars(&self, username: &str) {
        self.sessions.clear(username);
    }

    /// Clear all session data for all users.
    pub fn clear_all_uservars(&self) {
        self.sessions.clear_all();
    }

    /// Make a snapshot of a user's variables.
    pub fn freeze_uservars(&self, username: &str) {
        self.sessions.freeze(username);
    }

    /// Restore or discard a previously frozen snapshot.
    pub fn thaw_uservars(&self, username: &str, action: ThawAction) {
        self.sessions.thaw(username, action);
    }

    /// The trigger pattern the user most recently matched, if any.
    pub fn last_match(&self, username: &str) -> Option<String> {
        self.sessions.get_last_match(username)
    }

    /*-----------------------*/
    /*-- Developer Methods --*/
    /*-----------------------*/

    /// Dump the trigger sort buffers to standard output.
    pub fn dump_sorted(&self) {
        println!("Sort buffer: Topics");
        for (topic, entries) in &self.sorted.topics {
            println!("  Topic: {}", topic);
            for entry in entries {
                println!("    + {}", entry.pattern);
            }
        }
        println!("Sort buffer: Thats");
        for (topic, entries) in &self.sorted.thats {
            println!("  Topic: {}", topic);
            for entry in entries {
                println!("    + {}", entry.pattern);
            }
        }
        println!("Sort buffer: Substitutions");
        for item in &self.sorted.sub {
            println!("  {}", item);
        }
        println!("Sort buffer: Person Substitutions");
        for item in &self.sorted.person {
            println!("  {}", item);
        }
    }

    /// Dump the entire topic/trigger/reply structure to standard output.
    pub fn dump_topics(&self) {
        for (topic, triggers) in &self.topics {
            println!("Topic: {}", topic);
            for trigger in triggers {
                println!("  + {}", trigger.pattern);
                if let Some(previous) = &trigger.previous {
                    println!("    % {}", previous);
                }
                for condition in &trigger.conditions {
                    println!("    * {}", condition);
                }
                for reply in &trigger.replies {
                    println!("    - {}", reply);
                }
                if let Some(redirect) = &trigger.redirect {
                    println!("    @ {}", redirect);
                }
            }
        }
    }
}

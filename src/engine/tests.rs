//! End-to-end tests: stream a brain, sort, and converse.

use std::collections::HashMap;

use crate::{Config, ErrorMessages, ObjectHandler, RiveScript, ThawAction};

fn bot(source: &str) -> RiveScript {
    bot_with(Config::basic(), source)
}

fn bot_with(config: Config, source: &str) -> RiveScript {
    let mut rs = RiveScript::new(config);
    rs.stream(source).unwrap();
    rs.sort_replies();
    rs
}

#[test]
fn greeting() {
    let mut rs = bot("+ hello bot\n- Hello, human!");
    assert_eq!(rs.reply("u", "Hello bot!"), "Hello, human!");
}

#[test]
fn weighted_trigger_wins_sorting() {
    let mut rs = bot("+ something{weight=100}\n- Weighted\n+ something\n- Unweighted");
    assert_eq!(rs.reply("u", "something"), "Weighted");
}

#[test]
fn knock_knock_previous_chain() {
    // The contraction substitution is what the published brains ship in
    // their config; without it "Who's there?" can never normalize into
    // "who is there".
    let mut rs = bot(
        "! sub who's = who is\n\
         + knock knock\n\
         - Who's there?\n\
         + *\n\
         % who is there\n\
         - <sentence> who?\n\
         + *\n\
         % * who\n\
         - Haha! <sentence>!",
    );
    assert_eq!(rs.reply("u", "knock knock"), "Who's there?");
    assert_eq!(rs.reply("u", "Canoe"), "Canoe who?");
    assert_eq!(rs.reply("u", "Canoe help me"), "Haha! Canoe help me!");
}

#[test]
fn array_in_reply() {
    let mut rs = bot("! array greek = alpha beta gamma\n+ pick one\n- Chose (@greek).");
    let reply = rs.reply("u", "pick one");
    let re = regex::Regex::new(r"^Chose (alpha|beta|gamma)\.$").unwrap();
    assert!(re.is_match(&reply), "unexpected reply: {}", reply);
}

#[test]
fn unknown_array_in_reply_is_preserved() {
    let mut rs = bot("+ pick one\n- Chose (@nothing).");
    assert_eq!(rs.reply("u", "pick one"), "Chose (@nothing).");
}

#[test]
fn conditions() {
    let mut rs = bot("+ how am i\n* <get mood> eq happy => You are happy!\n- I don't know.");
    assert_eq!(rs.reply("u", "how am i"), "I don't know.");
    rs.set_uservar("u", "mood", "happy");
    assert_eq!(rs.reply("u", "how am i"), "You are happy!");
}

#[test]
fn numeric_conditions() {
    let mut rs = bot(
        "+ am i old\n\
         * <get age> >= 100 => Ancient!\n\
         * <get age> < 18 => You are young.\n\
         - You are neither.",
    );
    // No age set: "undefined" fails to parse, so both conditions fail.
    assert_eq!(rs.reply("u", "am i old"), "You are neither.");
    rs.set_uservar("u", "age", "12");
    assert_eq!(rs.reply("u", "am i old"), "You are young.");
    rs.set_uservar("u", "age", "130");
    assert_eq!(rs.reply("u", "am i old"), "Ancient!");
}

#[test]
fn redirect_recursion_is_bounded() {
    let config = Config { depth: 5, ..Config::basic() };
    let mut rs = bot_with(config, "+ loop\n@ loop");
    assert_eq!(rs.reply("u", "loop"), "ERR: Deep Recursion Detected!");
}

#[test]
fn hard_redirects_follow_through() {
    let mut rs = bot("+ hello\n- Hi there!\n+ hey\n@ hello");
    assert_eq!(rs.reply("u", "hey"), "Hi there!");
}

#[test]
fn no_trigger_matched() {
    let mut rs = bot("+ hello\n- hi");
    assert_eq!(rs.reply("u", "xyzzy"), "ERR: No Reply Matched");
    assert_eq!(rs.last_match("u"), Some(String::new()));
}

#[test]
fn matched_but_no_reply_found() {
    let mut rs = bot("+ quiet\n* <get a> eq b => Loud!");
    assert_eq!(rs.reply("u", "quiet"), "ERR: No Reply Found");
}

#[test]
fn error_messages_can_be_remapped() {
    let errors = ErrorMessages {
        reply_not_matched: "I have no answer for that.".to_string(),
        ..ErrorMessages::default()
    };
    let config = Config { errors, ..Config::basic() };
    let mut rs = bot_with(config, "+ hello\n- hi");
    assert_eq!(rs.reply("u", "xyzzy"), "I have no answer for that.");
}

#[test]
fn begin_block_hands_off_with_ok() {
    let mut rs = bot("> begin\n+ request\n- {ok}\n< begin\n+ hello\n- Hi there.");
    assert_eq!(rs.reply("u", "hello"), "Hi there.");
}

#[test]
fn begin_block_can_refuse() {
    let mut rs = bot("> begin\n+ request\n- The bot is closed.\n< begin\n+ hello\n- Hi there.");
    assert_eq!(rs.reply("u", "hello"), "The bot is closed.");
}

#[test]
fn begin_block_wraps_the_reply() {
    let mut rs = bot("> begin\n+ request\n- [{ok}]\n< begin\n+ hello\n- Hi there.");
    assert_eq!(rs.reply("u", "hello"), "[Hi there.]");
}

#[test]
fn topic_switching() {
    let mut rs = bot(
        "+ enter the dojo\n\
         - {topic=dojo}You have entered.\n\
         > topic dojo\n\
         + leave\n\
         - {topic=random}Left.\n\
         + *\n\
         - You are in the dojo.\n\
         < topic",
    );
    assert_eq!(rs.reply("u", "enter the dojo"), "You have entered.");
    assert_eq!(rs.get_uservar("u", "topic"), Some("dojo".to_string()));
    assert_eq!(rs.reply("u", "hello"), "You are in the dojo.");
    assert_eq!(rs.reply("u", "leave"), "Left.");
    assert_eq!(rs.reply("u", "hello"), "ERR: No Reply Matched");
}

#[test]
fn set_and_get_tags() {
    let mut rs = bot("+ my name is *\n- <set name=<formal>>Nice to meet you, <get name>!");
    assert_eq!(rs.reply("u", "my name is nikki"), "Nice to meet you, Nikki!");
    assert_eq!(rs.get_uservar("u", "name"), Some("Nikki".to_string()));
}

#[test]
fn math_tags() {
    let mut rs = bot(
        "+ add points\n\
         - <add points=5>You have <get points> points.\n\
         + lose points\n\
         - <sub points=2>You have <get points> points.\n\
         + break math\n\
         - <div points=0>Divided.\n\
         + fuzz math\n\
         - <add points=banana>Done.",
    );
    assert_eq!(rs.reply("u", "add points"), "You have 5 points.");
    assert_eq!(rs.reply("u", "add points"), "You have 10 points.");
    assert_eq!(rs.reply("u", "lose points"), "You have 8 points.");
    assert_eq!(rs.reply("u", "break math"), "[ERR: Can't divide by zero!]Divided.");
    assert_eq!(
        rs.reply("u", "fuzz math"),
        "[ERR: Math can't \"add\" non-numeric value \"banana\"]Done."
    );
}

#[test]
fn person_substitutions() {
    let mut rs = bot("! person you = i\n! person i = you\n+ say *\n- You said: <person>");
    assert_eq!(rs.reply("u", "say you are cool"), "You said: i are cool");
}

#[test]
fn string_transform_shortcuts() {
    let mut rs = bot(
        "+ formal *\n- <formal>\n\
         + shout *\n- <uppercase>\n\
         + quiet *\n- <lowercase>\n\
         + sentence *\n- <sentence>",
    );
    assert_eq!(rs.reply("u", "formal jane doe"), "Jane Doe");
    assert_eq!(rs.reply("u", "shout hey"), "HEY");
    assert_eq!(rs.reply("u", "quiet HEY"), "hey");
    assert_eq!(rs.reply("u", "sentence the cake is a lie"), "The cake is a lie");
}

#[test]
fn bot_variables_and_globals() {
    let mut rs = bot("! var name = Rivey\n+ what is your name\n- My name is <bot name>.\n+ check env\n- Debug is <env debug>.");
    assert_eq!(rs.reply("u", "what is your name"), "My name is Rivey.");
    assert_eq!(rs.reply("u", "check env"), "Debug is undefined.");
    rs.set_global("debug", Some("1"));
    assert_eq!(rs.reply("u", "check env"), "Debug is 1.");
}

#[test]
fn bot_variable_in_trigger() {
    let mut rs = bot("! var name = rivey\n+ is your name <bot name>\n- That's me!");
    assert_eq!(rs.reply("u", "is your name rivey"), "That's me!");
}

#[test]
fn star_captures() {
    let mut rs = bot("+ * likes *\n- <star2> is liked by <star1>.");
    assert_eq!(rs.reply("u", "alice likes bob"), "bob is liked by alice.");
}

#[test]
fn botstar_captures() {
    let mut rs = bot(
        "+ i have a pet\n\
         - What pet do you have?\n\
         + a *\n\
         % what * do you have\n\
         - A <star>! You mentioned your <botstar1>.",
    );
    assert_eq!(rs.reply("u", "i have a pet"), "What pet do you have?");
    assert_eq!(rs.reply("u", "a dog"), "A dog! You mentioned your pet.");
}

#[test]
fn wildcard_matches_empty_message() {
    let mut rs = bot("+ *\n- Caught it.");
    // Pure punctuation normalizes to an empty message; only `*` can match it.
    assert_eq!(rs.reply("u", "!!!"), "Caught it.");
}

#[test]
fn history_tags() {
    let mut rs = bot("+ hello\n- Hi there.\n+ test history\n- You said <input1> and I said <reply1>.");
    rs.reply("u", "hello");
    assert_eq!(rs.reply("u", "test history"), "You said hello and I said hi there.");
}

#[test]
fn history_rings_stay_bounded() {
    let mut rs = bot("+ *\n- Caught it.");
    for i in 0..12 {
        rs.reply("u", &format!("message {}", i));
    }
    let data = rs.get_uservars("u").unwrap();
    assert_eq!(data.history.input(0), "message 11");
    assert_eq!(data.history.input(8), "message 3");
    assert_eq!(data.history.input(9), "undefined");
}

#[test]
fn id_tag() {
    let mut rs = bot("+ who am i\n- You are <id>.");
    assert_eq!(rs.reply("alice", "who am i"), "You are alice.");
}

#[test]
fn escape_codes() {
    let mut rs = bot("+ test escapes\n- a\\sb");
    assert_eq!(rs.reply("u", "test escapes"), "a b");
}

#[test]
fn inline_redirects() {
    let mut rs = bot("+ hello\n- Hi!\n+ greet\n- I say: {@hello}\n+ repeat *\n- <@>");
    assert_eq!(rs.reply("u", "greet"), "I say: Hi!");
    assert_eq!(rs.reply("u", "repeat hello"), "Hi!");
}

#[test]
fn unrecognized_tags_are_preserved() {
    let mut rs = bot("+ html\n- This is <b>bold</b>.");
    assert_eq!(rs.reply("u", "html"), "This is <b>bold</b>.");
}

#[test]
fn random_tag() {
    let mut rs = bot("+ coin\n- {random}heads|tails{/random}");
    let reply = rs.reply("u", "coin");
    assert!(reply == "heads" || reply == "tails", "unexpected reply: {}", reply);
}

#[test]
fn weighted_random_replies_always_resolve() {
    let mut rs = bot("+ greet\n- Hello.{weight=10}\n- Yo.");
    for _ in 0..10 {
        let reply = rs.reply("u", "greet");
        assert!(reply == "Hello." || reply == "Yo.", "unexpected reply: {}", reply);
    }
}

#[test]
fn call_dispatches_to_subroutines() {
    let mut rs = bot("+ reverse *\n- <call>reverse <star></call>\n+ broken\n- <call>nothing</call>");
    rs.set_subroutine("reverse", Box::new(|_user, args| args.join(" ").chars().rev().collect()));
    assert_eq!(rs.reply("u", "reverse hello world"), "dlrow olleh");
    assert_eq!(rs.reply("u", "broken"), "[ERR: Object Not Found]");
}

#[test]
fn subroutines_see_the_current_user() {
    let mut rs = bot("+ whoami\n- <call>whoami</call>");
    rs.set_subroutine("whoami", Box::new(|user, _args| user.to_string()));
    assert_eq!(rs.reply("alice", "whoami"), "alice");
    assert_eq!(rs.reply("bob", "whoami"), "bob");
}

/// Records loaded objects and answers calls by echoing.
struct EchoHandler {
    objects: HashMap<String, Vec<String>>,
}

impl ObjectHandler for EchoHandler {
    fn load(&mut self, name: &str, code: &[String]) -> bool {
        self.objects.insert(name.to_string(), code.to_vec());
        true
    }

    fn call(&self, name: &str, args: &[String], user: &str) -> String {
        format!("{} ran {} with [{}]", user, name, args.join(", "))
    }
}

#[test]
fn object_macros_via_handler() {
    let mut rs = RiveScript::new(Config::basic());
    rs.set_handler("echo", Box::new(EchoHandler { objects: HashMap::new() }));
    rs.stream(
        "> object greeting echo\n\
         this body is opaque to the engine\n\
         < object\n\
         + run it\n\
         - <call>greeting one two</call>",
    )
    .unwrap();
    rs.sort_replies();
    assert_eq!(rs.reply("u", "run it"), "u ran greeting with [one, two]");
}

#[test]
fn objects_without_a_handler_are_not_indexed() {
    let mut rs = bot(
        "> object greeting nosuchlang\n\
         whatever\n\
         < object\n\
         + run it\n\
         - <call>greeting</call>",
    );
    assert_eq!(rs.reply("u", "run it"), "[ERR: Object Not Found]");
}

#[test]
fn runtime_stream_injection() {
    let mut rs = bot("+ learn\n- Learned.{! ! global lesson = done}");
    assert_eq!(rs.reply("u", "learn"), "Learned.");
    assert_eq!(rs.get_global("lesson"), Some("done"));
}

#[test]
fn last_match_is_recorded() {
    let mut rs = bot("+ hello bot\n- Hello, human!");
    rs.reply("u", "hello bot");
    assert_eq!(rs.last_match("u"), Some("hello bot".to_string()));
}

#[test]
fn freeze_and_thaw_through_the_api() {
    let mut rs = bot("+ *\n- ok");
    rs.set_uservar("u", "mood", "happy");
    rs.freeze_uservars("u");
    rs.set_uservar("u", "mood", "grumpy");
    rs.thaw_uservars("u", ThawAction::Thaw);
    assert_eq!(rs.get_uservar("u", "mood"), Some("happy".to_string()));
    let _ = rs.reply("u", "hello");
}

#[test]
fn utf8_mode_end_to_end() {
    let mut rs = bot_with(Config::utf8(), "+ привет\n- Привет, человек!");
    assert_eq!(rs.reply("u", "Привет!"), "Привет, человек!");
}

#[test]
fn included_topics_share_triggers() {
    let mut rs = bot(
        "+ enter\n- {topic=specialist}ok\n\
         > topic specialist includes common\n\
         + special\n- Special reply.\n\
         < topic\n\
         > topic common\n\
         + common\n- Common reply.\n\
         < topic",
    );
    rs.reply("u", "enter");
    assert_eq!(rs.reply("u", "special"), "Special reply.");
    assert_eq!(rs.reply("u", "common"), "Common reply.");
}

#[test]
fn depth_zero_falls_back_to_default_and_still_matches() {
    let config = Config { depth: 0, ..Config::basic() };
    let mut rs = bot_with(config, "+ hello\n- hi");
    assert_eq!(rs.reply("u", "hello"), "hi");
}

#[test]
fn reparsing_the_dumped_brain_matches() {
    // Round-trip: emit the brain's normalized structure as source, re-parse
    // it, and check the sorted buffers agree.
    let source = "! sub what's = what is\n\
                  + hello bot\n- Hi.\n\
                  + *\n- Catch-all.\n\
                  + hello *\n- Hello to you.";
    let rs = bot(source);

    let mut emitted = String::new();
    for (name, value) in [("what's", "what is")] {
        emitted.push_str(&format!("! sub {} = {}\n", name, value));
    }
    for entry in &rs.sorted.topics["random"] {
        emitted.push_str(&format!("+ {}\n", entry.pattern));
        for reply in &entry.pointer.replies {
            emitted.push_str(&format!("- {}\n", reply));
        }
    }

    let rs2 = bot(&emitted);
    let first: Vec<String> = rs.sorted.topics["random"].iter().map(|e| e.pattern.clone()).collect();
    let second: Vec<String> = rs2.sorted.topics["random"].iter().map(|e| e.pattern.clone()).collect();
    assert_eq!(first, second);
    assert_eq!(rs.sorted.sub, rs2.sorted.sub);
}

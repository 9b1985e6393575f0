use rivescript::{Config, RiveScript};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let mut rs = RiveScript::new(Config {
        strict: config.strict,
        utf8: config.utf8,
        force_case: config.force_case,
        depth: config.depth,
        ..Config::basic()
    });

    if let Err(err) = rs.load_directory(&config.root, &[]) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    rs.sort_replies();

    if config.dump_topics {
        rs.dump_topics();
    }
    if config.dump_sorted {
        rs.dump_sorted();
    }

    println!(
        "RiveScript interpreter loaded from {}. Type /quit to exit.",
        config.root.display()
    );

    let stdin = io::stdin();
    loop {
        print!("You> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("error: failed to read stdin: {err}");
                std::process::exit(1);
            }
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/dump topics" => rs.dump_topics(),
            "/dump sorted" => rs.dump_sorted(),
            _ => println!("Bot> {}", rs.reply("localuser", line)),
        }
    }
}

struct CliConfig {
    root: PathBuf,
    strict: bool,
    utf8: bool,
    force_case: bool,
    depth: usize,
    dump_topics: bool,
    dump_sorted: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut root: Option<PathBuf> = None;
    let mut strict = true;
    let mut utf8 = false;
    let mut force_case = false;
    let mut depth = rivescript::DEFAULT_DEPTH;
    let mut dump_topics = false;
    let mut dump_sorted = false;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rivescript {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--utf8" => utf8 = true,
            "--no-strict" => strict = false,
            "--force-case" => force_case = true,
            "--dump-topics" => dump_topics = true,
            "--dump-sorted" => dump_sorted = true,
            "--depth" => {
                let value = args.next().ok_or_else(|| "error: --depth expects a value".to_string())?;
                depth = parse_depth(&value)?;
            }
            _ if arg.starts_with("--depth=") => {
                depth = parse_depth(arg.trim_start_matches("--depth="))?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if root.is_some() {
                    return Err("error: replies directory provided multiple times".to_string());
                }
                root = Some(PathBuf::from(arg));
            }
        }
    }

    let root = root.ok_or_else(|| format!("error: no replies directory provided\n\n{}", help_text()))?;

    Ok(CliConfig { root, strict, utf8, force_case, depth, dump_topics, dump_sorted })
}

fn parse_depth(value: &str) -> Result<usize, String> {
    value.parse().map_err(|_| format!("error: invalid --depth '{value}' (expected an integer)"))
}

fn help_text() -> String {
    format!(
        "rivescript {version}

RiveScript chatbot interpreter shell.

Usage:
  rivescript [OPTIONS] <directory>

Loads every *.rive (and *.rs) file in <directory>, then reads messages from
stdin and prints the bot's replies.

Options:
  --utf8                     Enable UTF-8 mode for triggers and messages.
  --no-strict                Log syntax errors instead of aborting the load.
  --force-case               Force-lowercase trigger patterns while parsing.
  --depth <n>                Recursion limit (default: {default_depth}).
  --dump-topics              Print the topic/trigger tree after loading.
  --dump-sorted              Print the trigger sort buffers after loading.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

In-loop commands: /quit, /dump topics, /dump sorted.

Exit codes:
  0  Success.
  1  Load error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        default_depth = rivescript::DEFAULT_DEPTH
    )
}

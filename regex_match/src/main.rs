use log::info;
use std::env;
use std::io::{self, BufRead, Write};
use std::process::exit;
use thompson_regex::{Regex, SyntaxError};

const EXIT_REJECTED: i32 = 2;
const EXIT_ERROR: i32 = 1;

const USAGE: &str = "Usage: regex_match [--dump] <pattern> [word ...]
Without words, every line of stdin is matched.
";

/// Tabs in the pattern prefix are kept so the caret lines up under them.
pub fn format_syntax_error(error: &SyntaxError, pattern: &str) -> String {
    let mut message = format!("Error: {error}\n");
    message.push_str(pattern);
    message.push('\n');
    message.extend(
        pattern
            .chars()
            .take(error.position())
            .map(|c| if c == '\t' { '\t' } else { ' ' }),
    );
    message.push('^');
    message.push('\n');
    message
}

fn report(regex: &Regex, word: &str, out: &mut impl Write) -> io::Result<bool> {
    let matched = regex.is_exact_match(word);
    let verdict = if matched { "accepted" } else { "rejected" };
    writeln!(out, "{word}: {verdict}")?;
    Ok(matched)
}

fn run(
    args: &[String],
    input: impl BufRead,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<i32> {
    let (dump, args) = match args.split_first() {
        Some((flag, rest)) if flag == "--dump" => (true, rest),
        _ => (false, args),
    };
    let Some((pattern, words)) = args.split_first() else {
        err.write_all(USAGE.as_bytes())?;
        return Ok(EXIT_ERROR);
    };

    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            err.write_all(format_syntax_error(&e, pattern).as_bytes())?;
            return Ok(EXIT_ERROR);
        }
    };
    info!("{pattern:?} compiled to {} DFA states", regex.dfa().states().len());

    if dump {
        write!(out, "{}", regex.dfa().renumbered())?;
    }

    let mut all_matched = true;
    if words.is_empty() {
        for line in input.lines() {
            all_matched &= report(&regex, &line?, out)?;
        }
    } else {
        for word in words {
            all_matched &= report(&regex, word, out)?;
        }
    }

    Ok(if all_matched { 0 } else { EXIT_REJECTED })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = run(
        &args,
        io::stdin().lock(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    );

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("I/O error: {e}");
            exit(EXIT_ERROR);
        }
    }
}

//! Interactive mode: one long-lived session where changes are auto-saved in
//! the background between commands.

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;

use crate::app::{blocking, App};
use crate::cli::ShellLine;

pub async fn run(app: &mut App) -> Result<()> {
    println!("Type a command (e.g. `list`, `add -b Meilland -n Bolero`), `help` or `exit`.");
    loop {
        print!("rosarium [{}] ({})> ", app.router().view(), app.save_status().label());
        io::stdout().flush()?;

        let mut line = String::new();
        if blocking(|| io::stdin().read_line(&mut line))? == 0 {
            println!();
            break;
        }
        let words = match split_words(&line) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit") => break,
            Some(_) => {}
        }

        match ShellLine::try_parse_from(&words) {
            Ok(parsed) => {
                if let Err(e) = app.execute(parsed.command).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            // help and usage errors are rendered by clap
            Err(e) => {
                let _ = e.print();
            }
        }
    }
    Ok(())
}

/// Splits a line on whitespace, keeping single- or double-quoted runs
/// together.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_words_stay_together() {
        assert_eq!(
            split_words("note abc \"first bud, pink\" --date 2024-04-01\n").unwrap(),
            vec!["note", "abc", "first bud, pink", "--date", "2024-04-01"]
        );
        assert_eq!(split_words("memo x ''").unwrap(), vec!["memo", "x", ""]);
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert!(split_words("note abc 'oops").is_err());
    }
}

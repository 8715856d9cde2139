//! Filling in missing arguments interactively.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Result};
use dialoguer::{Confirm, Input};
use tracing::warn;

/// Asks for whatever the command line left out, when a person is there to
/// answer.
pub struct Prompter {
    interactive: bool,
}

impl Prompter {
    /// Interactive only when stdin is a terminal and prompting wasn't disabled.
    pub fn detect(no_input: bool) -> Self {
        Self {
            interactive: !no_input && std::io::stdin().is_terminal(),
        }
    }

    pub fn path(&self, given: Option<PathBuf>, prompt: &str, flag: &str) -> Result<PathBuf> {
        if let Some(path) = given {
            return Ok(path);
        }
        if !self.interactive {
            bail!("missing {flag}; pass it on the command line");
        }
        let answer: String = Input::new().with_prompt(prompt).interact_text()?;
        let cleaned = strip_quotes(&answer);
        if cleaned.is_empty() {
            bail!("no path given");
        }
        Ok(PathBuf::from(cleaned))
    }

    /// Ask for a size in MB. A blank or unusable answer keeps `default`.
    pub fn megabytes(&self, default: f64) -> Result<f64> {
        if !self.interactive {
            return Ok(default);
        }
        let answer: String = Input::new()
            .with_prompt(format!("Max output size in MB (default: {default})"))
            .allow_empty(true)
            .interact_text()?;
        Ok(parse_megabytes_answer(&answer, default))
    }

    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if !self.interactive {
            return Ok(false);
        }
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}

/// Trim whitespace and one layer of matching quotes, as left by dragging a
/// file into a terminal or pasting a copied path.
pub fn strip_quotes(input: &str) -> &str {
    let trimmed = input.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

pub fn parse_megabytes_answer(answer: &str, default: f64) -> f64 {
    let answer = answer.trim();
    if answer.is_empty() {
        return default;
    }
    match answer.parse::<f64>() {
        Ok(mb) if mb.is_finite() && mb > 0.0 => mb,
        _ => {
            warn!(answer, default, "invalid size, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.jpg", "photo.jpg")]
    #[case("  photo.jpg\n", "photo.jpg")]
    #[case("\"/tmp/my photo.jpg\"", "/tmp/my photo.jpg")]
    #[case("'/tmp/my photo.jpg'", "/tmp/my photo.jpg")]
    #[case("\"unbalanced.jpg", "\"unbalanced.jpg")]
    #[case("\"\"", "")]
    fn test_strip_quotes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_quotes(input), expected);
    }

    #[rstest]
    #[case("", 1.0)]
    #[case("2", 2.0)]
    #[case(" 0.5 ", 0.5)]
    #[case("abc", 1.0)]
    #[case("-3", 1.0)]
    #[case("0", 1.0)]
    #[case("inf", 1.0)]
    fn test_parse_megabytes_answer(#[case] answer: &str, #[case] expected: f64) {
        assert_eq!(parse_megabytes_answer(answer, 1.0), expected);
    }

    #[test]
    fn test_non_interactive_prompter() {
        let prompter = Prompter { interactive: false };
        assert!(prompter.path(None, "Path", "INPUT").is_err());
        assert_eq!(
            prompter.path(Some(PathBuf::from("a.png")), "Path", "INPUT").unwrap(),
            PathBuf::from("a.png")
        );
        assert_eq!(prompter.megabytes(3.0).unwrap(), 3.0);
        assert!(!prompter.confirm("Recurse?").unwrap());
    }
}

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use folio_sdk::{DialogAdapter, PickOutcome, PickRequest};

/// Folder chooser that asks for a path on stdin. An empty answer or end of
/// input cancels.
pub struct PromptDialog;

impl DialogAdapter for PromptDialog {
    fn choose(&self, request: &PickRequest) -> PickOutcome {
        let kinds = if request.allowed_kinds.is_empty() {
            "any kind".to_string()
        } else {
            request
                .allowed_kinds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        eprint!("Folder path ({kinds}), empty to cancel: ");
        let _ = io::stderr().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(n) if n > 0 => parse_answer(&line),
            _ => PickOutcome::cancelled(),
        }
    }
}

fn parse_answer(line: &str) -> PickOutcome {
    let answer = line.trim();
    if answer.is_empty() {
        return PickOutcome::cancelled();
    }
    PickOutcome {
        selection: Some(absolute(PathBuf::from(answer))),
        confirmed: None,
    }
}

/// Resolve `path` against the working directory without touching the
/// filesystem.
pub fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_answer_cancels() {
        assert_eq!(parse_answer("  \n"), PickOutcome::cancelled());
    }

    #[test]
    fn answer_is_trimmed() {
        let outcome = parse_answer("  /srv/photos \n");
        assert_eq!(outcome.accepted(), Some(std::path::Path::new("/srv/photos")));
    }

    #[test]
    fn relative_answer_is_made_absolute() {
        let outcome = parse_answer("photos\n");
        assert!(outcome.accepted().unwrap().is_absolute());
    }
}

//! Bounded yes/no prompt.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};

use console::Term;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use thiserror::Error;

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Whether the answer was yes.
    pub fn is_yes(self) -> bool {
        self == Answer::Yes
    }
}

impl From<bool> for Answer {
    fn from(yes: bool) -> Self {
        if yes { Answer::Yes } else { Answer::No }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Yes => write!(f, "yes"),
            Answer::No => write!(f, "no"),
        }
    }
}

/// Errors from asking a question.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PromptError {
    /// Every attempt was unrecognised.
    #[error("No valid answer after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Input ended before an answer was given.
    #[error("Input closed before an answer was given")]
    Closed,

    #[error("Terminal error: {0}")]
    Terminal(#[from] dialoguer::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Interpret one line of input.
///
/// The first non-blank character decides: `y`/`Y` is yes, `n`/`N` is no,
/// anything else (including a blank line) is unrecognised.
pub fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim_start().chars().next()? {
        'y' | 'Y' => Some(Answer::Yes),
        'n' | 'N' => Some(Answer::No),
        _ => None,
    }
}

/// Where answers come from.
pub trait AnswerSource {
    /// Show `prompt` and read one line. `None` means the input is closed.
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>, PromptError>;
}

/// Interactive terminal input through `dialoguer`.
pub struct TerminalSource {
    term: Term,
    theme: ColorfulTheme,
}

impl TerminalSource {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            theme: ColorfulTheme::default(),
        }
    }
}

impl AnswerSource for TerminalSource {
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        let line: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text_on(&self.term)?;
        Ok(Some(line))
    }
}

/// Line-oriented input, for piped stdin and tests.
///
/// Prompts are written as `"<prompt>: "` with no trailing newline.
pub struct LineSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> AnswerSource for LineSource<R, W> {
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// The process's own input: a `dialoguer` prompt on a terminal, plain lines otherwise.
pub enum StdioSource {
    Terminal(TerminalSource),
    Piped(LineSource<StdinLock<'static>, Stdout>),
}

impl AnswerSource for StdioSource {
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
        match self {
            StdioSource::Terminal(source) => source.read_answer(prompt),
            StdioSource::Piped(source) => source.read_answer(prompt),
        }
    }
}

/// Asks yes/no questions.
///
/// After an unrecognised answer the user is asked again, at most `retries`
/// times, before giving up with [`PromptError::RetriesExhausted`].
pub struct Prompter<S> {
    source: S,
    retries: u32,
}

impl<S: AnswerSource> Prompter<S> {
    pub fn new(source: S, retries: u32) -> Self {
        Self { source, retries }
    }

    /// Ask `"<question> (y/n)"` and read the answer.
    pub fn ask(&mut self, question: &str) -> Result<Answer, PromptError> {
        let attempts = self.retries.saturating_add(1);
        let mut prompt = format!("{question} (y/n)");

        for _ in 0..attempts {
            let Some(line) = self.source.read_answer(&prompt)? else {
                return Err(PromptError::Closed);
            };
            if let Some(answer) = parse_answer(&line) {
                return Ok(answer);
            }
            prompt = "Please enter (y/n)".to_string();
        }

        Err(PromptError::RetriesExhausted { attempts })
    }
}

impl<R: BufRead, W: Write> Prompter<LineSource<R, W>> {
    /// Prompter over arbitrary line input and output.
    pub fn from_lines(input: R, output: W, retries: u32) -> Self {
        Self::new(LineSource::new(input, output), retries)
    }

    /// Give back the output, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.source.output
    }
}

impl Prompter<StdioSource> {
    /// Prompter on the process's stdin and stdout.
    pub fn stdio(retries: u32) -> Self {
        let term = Term::stdout();
        let source = if io::stdin().is_terminal() && term.is_term() {
            StdioSource::Terminal(TerminalSource::new(term))
        } else {
            StdioSource::Piped(LineSource::new(io::stdin().lock(), io::stdout()))
        };
        Self::new(source, retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str, retries: u32) -> Prompter<LineSource<Cursor<Vec<u8>>, Vec<u8>>> {
        Prompter::from_lines(Cursor::new(input.as_bytes().to_vec()), Vec::new(), retries)
    }

    /// Scripted answers; records every prompt shown.
    struct Scripted {
        answers: Vec<&'static str>,
        prompts: Vec<String>,
    }

    impl AnswerSource for Scripted {
        fn read_answer(&mut self, prompt: &str) -> Result<Option<String>, PromptError> {
            self.prompts.push(prompt.to_string());
            if self.answers.is_empty() {
                return Ok(None);
            }
            Ok(Some(self.answers.remove(0).to_string()))
        }
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), Some(Answer::Yes));
        assert_eq!(parse_answer("  Yes please"), Some(Answer::Yes));
        assert_eq!(parse_answer("N"), Some(Answer::No));
        assert_eq!(parse_answer("nope"), Some(Answer::No));
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer("   \n"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_ask_first_answer() {
        let mut p = prompter("yes\n", 3);
        assert_eq!(p.ask("Use a real backend?").unwrap(), Answer::Yes);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out, "Use a real backend? (y/n): ");
    }

    #[test]
    fn test_ask_retries_then_answers() {
        let mut p = prompter("what\n\nNo\n", 3);
        assert_eq!(p.ask("Measure?").unwrap(), Answer::No);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Please enter (y/n)").count(), 2);
    }

    #[test]
    fn test_ask_gives_up() {
        let mut p = prompter("a\nb\nc\nd\ny\n", 3);
        let err = p.ask("Measure?").unwrap_err();
        assert!(matches!(err, PromptError::RetriesExhausted { attempts: 4 }));
    }

    #[test]
    fn test_ask_eof() {
        let mut p = prompter("", 3);
        assert!(matches!(p.ask("Measure?"), Err(PromptError::Closed)));

        let mut p = prompter("huh\n", 3);
        assert!(matches!(p.ask("Measure?"), Err(PromptError::Closed)));
    }

    #[test]
    fn test_consecutive_questions_share_input() {
        let mut p = prompter("n\ny\n", 1);
        assert_eq!(p.ask("First?").unwrap(), Answer::No);
        assert_eq!(p.ask("Second?").unwrap(), Answer::Yes);
    }

    #[test]
    fn test_prompts_passed_to_source() {
        let mut p = Prompter::new(
            Scripted {
                answers: vec!["", "Y"],
                prompts: vec![],
            },
            2,
        );
        assert_eq!(p.ask("Real?").unwrap(), Answer::Yes);
        assert_eq!(p.source.prompts, ["Real? (y/n)", "Please enter (y/n)"]);
    }
}

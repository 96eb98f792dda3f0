//! Interactive questions on the controlling terminal.

use std::io;

use console::Term;

pub struct Prompter {
    term: Term,
}

impl Default for Prompter {
    fn default() -> Self {
        Self { term: Term::stderr() }
    }
}

impl Prompter {
    pub fn ask(&self, question: &str) -> io::Result<String> {
        self.term.write_str(&format!("? {question}: "))?;
        Ok(self.term.read_line()?.trim().to_owned())
    }

    /// Like [`ask`](Self::ask), without echoing the answer.
    pub fn ask_secret(&self, question: &str) -> io::Result<String> {
        self.term.write_str(&format!("? {question}: "))?;
        self.term.read_secure_line()
    }

    /// Keep asking until the answer names one of `names`.
    pub fn choose(&self, names: &[String]) -> io::Result<String> {
        choose_with(
            names,
            |line| self.term.write_line(line),
            || self.ask("Select stream"),
        )
    }
}

pub(crate) fn choose_with(
    names: &[String],
    mut say: impl FnMut(&str) -> io::Result<()>,
    mut answer: impl FnMut() -> io::Result<String>,
) -> io::Result<String> {
    if names.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "no streams to choose from"));
    }

    loop {
        say(&format!("* Available streams: {}.", names.join(", ")))?;
        let choice = answer()?;
        if names.contains(&choice) {
            return Ok(choice);
        }
        say("! Invalid stream.")?;
    }
}

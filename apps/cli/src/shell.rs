//! Interactive operator loop over one store.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Result};
use client_core::{
    filter::GenderFilter, DeleteOutcome, FilterCriteria, SubmitOutcome, UserCollectionStore,
};
use shared::domain::UserId;

use crate::{
    notice::{Notice, NoticeCategory},
    render,
};

const HELP: &str = "\
commands:
  list                      show users matching the current filter
  filter gender <all|male|female>
  filter name [text]        case-insensitive name search; empty clears it
  filter clear              reset both filters
  new                       start creating a user
  edit <id>                 start editing a user
  set <field> <value>       change name, email, gender or status of the draft
  show                      show the draft
  save                      submit the draft
  cancel                    discard the draft
  delete <id>               delete a user (asks first)
  reload                    fetch the list again
  help
  quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    FilterGender(GenderFilter),
    FilterName(String),
    FilterClear,
    New,
    Edit(UserId),
    Set { field: String, value: String },
    Show,
    Save,
    Cancel,
    Delete(UserId),
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = split_word(line);

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShellCommand::List,
        "filter" => {
            let (target, value) = split_word(rest);
            match target.to_ascii_lowercase().as_str() {
                "gender" => ShellCommand::FilterGender(value.parse()?),
                "name" => ShellCommand::FilterName(value.to_string()),
                "clear" => ShellCommand::FilterClear,
                _ => bail!("usage: filter gender <all|male|female> | filter name [text] | filter clear"),
            }
        }
        "new" | "create" => ShellCommand::New,
        "edit" => ShellCommand::Edit(parse_id(rest)?),
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                bail!("usage: set <field> <value>");
            }
            ShellCommand::Set {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "show" => ShellCommand::Show,
        "save" => ShellCommand::Save,
        "cancel" => ShellCommand::Cancel,
        "delete" | "rm" => ShellCommand::Delete(parse_id(rest)?),
        "reload" => ShellCommand::Reload,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => bail!("unknown command '{other}'; type 'help'"),
    };
    Ok(Some(command))
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_id(raw: &str) -> Result<UserId> {
    raw.trim()
        .parse::<i64>()
        .map(UserId)
        .map_err(|_| anyhow!("expected a numeric user id, got '{}'", raw.trim()))
}

pub struct Shell {
    store: UserCollectionStore,
    criteria: FilterCriteria,
}

impl Shell {
    pub fn new(store: UserCollectionStore) -> Self {
        Self {
            store,
            criteria: FilterCriteria::default(),
        }
    }

    pub async fn run(&mut self, out: &mut impl Write) -> Result<()> {
        self.execute(ShellCommand::Reload, out).await?;
        self.execute(ShellCommand::List, out).await?;

        let stdin = io::stdin();
        loop {
            write!(out, "users> ")?;
            out.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(());
            }

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    writeln!(out, "{err}")?;
                    continue;
                }
            };
            if self.execute(command, out).await? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Runs one command. Store failures are written as notices; only output errors
    /// are returned.
    pub async fn execute(&mut self, command: ShellCommand, out: &mut impl Write) -> Result<Flow> {
        match command {
            ShellCommand::List => self.show_list(out)?,
            ShellCommand::FilterGender(gender) => {
                self.criteria.gender = gender;
                self.show_list(out)?;
            }
            ShellCommand::FilterName(name) => {
                self.criteria.name = name;
                self.show_list(out)?;
            }
            ShellCommand::FilterClear => {
                self.criteria = FilterCriteria::default();
                self.show_list(out)?;
            }
            ShellCommand::New => match self.store.begin_create() {
                Ok(()) => self.show_draft(out)?,
                Err(err) => writeln!(out, "{}", Notice::from(&err))?,
            },
            ShellCommand::Edit(id) => match self.store.begin_edit(id) {
                Ok(()) => self.show_draft(out)?,
                Err(err) => writeln!(out, "{}", Notice::from(&err))?,
            },
            ShellCommand::Set { field, value } => match self.store.draft_mut() {
                Some(draft) => match draft.set_field(&field, &value) {
                    Ok(()) => self.show_draft(out)?,
                    Err(err) => writeln!(out, "{err}")?,
                },
                None => writeln!(out, "no user is being edited or created; use 'new' or 'edit <id>'")?,
            },
            ShellCommand::Show => self.show_draft(out)?,
            ShellCommand::Save => match self.store.submit().await {
                Ok(SubmitOutcome::Created(record)) => {
                    writeln!(out, "created user {} ({})", record.id, record.name)?
                }
                Ok(SubmitOutcome::Updated(record)) => {
                    writeln!(out, "updated user {} ({})", record.id, record.name)?
                }
                Err(err) => {
                    let notice = Notice::from(&err);
                    writeln!(out, "{notice}")?;
                    if notice.category() == NoticeCategory::Validation {
                        self.show_draft(out)?;
                    }
                }
            },
            ShellCommand::Cancel => {
                if self.store.cancel_session() {
                    writeln!(out, "draft discarded")?;
                } else {
                    writeln!(out, "nothing to cancel")?;
                }
            }
            ShellCommand::Delete(id) => match self.store.request_delete(id).await {
                Ok(DeleteOutcome::Deleted(id)) => writeln!(out, "deleted user {id}")?,
                Ok(DeleteOutcome::Declined) => writeln!(out, "kept user {id}")?,
                Err(err) => writeln!(out, "{}", Notice::from(&err))?,
            },
            ShellCommand::Reload => match self.store.initialize().await {
                Ok(count) => writeln!(out, "loaded {count} users")?,
                Err(err) => writeln!(out, "{}", Notice::from(&err))?,
            },
            ShellCommand::Help => write!(out, "{HELP}")?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn show_list(&self, out: &mut impl Write) -> Result<()> {
        let visible = self.store.visible_records(&self.criteria);
        write!(out, "{}", render::table(&visible))?;
        if !self.criteria.is_unfiltered() {
            writeln!(
                out,
                "showing {} of {} (gender: {}, name: '{}')",
                visible.len(),
                self.store.records().len(),
                self.criteria.gender,
                self.criteria.name
            )?;
        }
        Ok(())
    }

    fn show_draft(&self, out: &mut impl Write) -> Result<()> {
        match self.store.draft() {
            Some(draft) => write!(
                out,
                "{}",
                render::draft(
                    self.store.session_mode(),
                    draft,
                    self.store.last_session_error()
                )
            )?,
            None => writeln!(out, "no active session")?,
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;

//! Command execution against any store binding.
//!
//! # Responsibility
//! - Validate and normalize user input before any store call.
//! - Render results on the supplied writer.
//!
//! # Invariants
//! - Commands see only the store traits; embedded and remote runs share
//!   this code path.
//! - Deletes run only after confirmation, either `--yes` or the prompt.

use crate::args::{Command, IncidentCommand, IncidentListArgs, RunbookCommand};
use opsdesk_core::{
    parse_choice, parse_tag_input, DeleteOutcome, Incident, IncidentFilter, IncidentPatch,
    IncidentStore, NewIncident, NewNote, NewRunbook, Runbook, RunbookFilter, RunbookPatch,
    RunbookStore, StoreError, ValidationError,
};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

/// Failure of a CLI command.
#[derive(Debug)]
pub enum CliError {
    Validation(ValidationError),
    Store(StoreError),
    Output(std::io::Error),
    Encode(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
            Self::Encode(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Store pair and I/O a command runs against.
pub struct Context<'a, W: Write> {
    pub incidents: &'a dyn IncidentStore,
    pub runbooks: &'a dyn RunbookStore,
    pub out: W,
    /// Asked with a human-readable question; `true` approves.
    pub confirm: &'a mut dyn FnMut(&str) -> bool,
}

pub fn execute<W: Write>(command: Command, ctx: &mut Context<'_, W>) -> Result<(), CliError> {
    match command {
        Command::Incidents(command) => run_incident(command, ctx),
        Command::Runbooks(command) => run_runbook(command, ctx),
    }
}

fn run_incident<W: Write>(
    command: IncidentCommand,
    ctx: &mut Context<'_, W>,
) -> Result<(), CliError> {
    match command {
        IncidentCommand::List(args) => {
            let filter = incident_filter(args)?;
            let incidents = ctx.incidents.search(&filter)?;
            print_incident_rows(&mut ctx.out, &incidents)
        }
        IncidentCommand::Show { id } => {
            let incident = ctx.incidents.get(id)?;
            print_json(&mut ctx.out, &incident)
        }
        IncidentCommand::Create {
            title,
            service,
            severity,
            status,
        } => {
            let input = NewIncident::new(title, service, severity, status).normalized();
            input.validate()?;
            let created = ctx.incidents.create(input)?;
            print_json(&mut ctx.out, &created)
        }
        IncidentCommand::Update {
            id,
            title,
            service,
            severity,
            status,
        } => {
            let patch = IncidentPatch {
                title,
                service,
                severity,
                status,
            }
            .normalized();
            patch.validate()?;
            let updated = ctx.incidents.update(id, patch)?;
            print_json(&mut ctx.out, &updated)
        }
        IncidentCommand::Note { id, author, text } => {
            let note = NewNote::new(author, text).normalized();
            note.validate()?;
            let updated = ctx.incidents.add_note(id, note)?;
            print_json(&mut ctx.out, &updated)
        }
        IncidentCommand::Close { id } => {
            let updated = ctx.incidents.close(id)?;
            print_json(&mut ctx.out, &updated)
        }
        IncidentCommand::Reopen { id } => {
            let updated = ctx.incidents.reopen(id)?;
            print_json(&mut ctx.out, &updated)
        }
        IncidentCommand::Toggle { id } => {
            let updated = ctx.incidents.toggle_status(id)?;
            print_json(&mut ctx.out, &updated)
        }
        IncidentCommand::Delete { id, yes } => {
            let confirm = &mut *ctx.confirm;
            let outcome = ctx.incidents.delete_with_confirmation(id, &mut |incident| {
                yes || confirm(&format!("Delete incident \"{}\"?", incident.title))
            })?;
            report_delete(&mut ctx.out, "incident", outcome)
        }
    }
}

fn run_runbook<W: Write>(
    command: RunbookCommand,
    ctx: &mut Context<'_, W>,
) -> Result<(), CliError> {
    match command {
        RunbookCommand::List { q, tag } => {
            let filter = RunbookFilter { term: q, tag };
            let runbooks = ctx.runbooks.search(&filter)?;
            print_runbook_rows(&mut ctx.out, &runbooks)
        }
        RunbookCommand::Show { id } => {
            let runbook = ctx.runbooks.get(id)?;
            print_json(&mut ctx.out, &runbook)
        }
        RunbookCommand::Create {
            title,
            tags,
            content,
        } => {
            let input = NewRunbook::new(title, parse_tag_input(&tags), content).normalized();
            input.validate()?;
            let created = ctx.runbooks.create(input)?;
            print_json(&mut ctx.out, &created)
        }
        RunbookCommand::Update {
            id,
            title,
            tags,
            content,
        } => {
            let patch = RunbookPatch {
                title,
                tags: tags.as_deref().map(parse_tag_input),
                content,
            }
            .normalized();
            patch.validate()?;
            let updated = ctx.runbooks.update(id, patch)?;
            print_json(&mut ctx.out, &updated)
        }
        RunbookCommand::Delete { id, yes } => {
            let confirm = &mut *ctx.confirm;
            let outcome = ctx.runbooks.delete_with_confirmation(id, &mut |runbook| {
                yes || confirm(&format!("Delete runbook \"{}\"?", runbook.title))
            })?;
            report_delete(&mut ctx.out, "runbook", outcome)
        }
    }
}

fn incident_filter(args: IncidentListArgs) -> Result<IncidentFilter, ValidationError> {
    Ok(IncidentFilter {
        term: args.q,
        status: parse_choice(args.status.as_deref())?,
        severity: parse_choice(args.severity.as_deref())?,
        service: args.service.filter(|service| !service.trim().is_empty()),
    })
}

fn print_json<W: Write>(out: &mut W, value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

fn print_incident_rows<W: Write>(out: &mut W, incidents: &[Incident]) -> Result<(), CliError> {
    if incidents.is_empty() {
        writeln!(out, "No incidents found.")?;
        return Ok(());
    }
    for incident in incidents {
        writeln!(
            out,
            "{}  {}  {:<6}  {}  {}",
            incident.id,
            incident.severity,
            incident.status.as_str(),
            incident.service,
            incident.title
        )?;
    }
    Ok(())
}

fn print_runbook_rows<W: Write>(out: &mut W, runbooks: &[Runbook]) -> Result<(), CliError> {
    if runbooks.is_empty() {
        writeln!(out, "No runbooks found.")?;
        return Ok(());
    }
    for runbook in runbooks {
        writeln!(
            out,
            "{}  {}  [{}]",
            runbook.id,
            runbook.title,
            runbook.tags.join(", ")
        )?;
    }
    Ok(())
}

fn report_delete<W: Write>(
    out: &mut W,
    label: &str,
    outcome: DeleteOutcome,
) -> Result<(), CliError> {
    let message = match outcome {
        DeleteOutcome::Deleted => format!("Deleted {label}."),
        DeleteOutcome::Declined => "Delete cancelled.".to_string(),
        DeleteOutcome::Missing => format!("No such {label}; nothing deleted."),
    };
    writeln!(out, "{message}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{execute, CliError, Context};
    use crate::args::Cli;
    use clap::Parser;
    use opsdesk_core::{
        AppState, EmbeddedStores, IncidentStatus, IncidentStore, MemoryStateRepository,
        RunbookStore, StateRepository, SystemClock,
    };
    use std::sync::Arc;

    struct Harness {
        repo: Arc<MemoryStateRepository>,
        stores: EmbeddedStores<MemoryStateRepository>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(SystemClock);
        let repo = Arc::new(MemoryStateRepository::in_memory(clock.clone()));
        repo.save(&AppState::empty()).unwrap();
        let stores = EmbeddedStores::new(Arc::clone(&repo), clock);
        Harness { repo, stores }
    }

    fn run(harness: &Harness, argv: &[&str], answer: bool) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(std::iter::once("opsdesk").chain(argv.iter().copied()))
            .unwrap();
        let mut prompts = Vec::new();
        let mut confirm = |question: &str| {
            prompts.push(question.to_string());
            answer
        };
        let mut ctx = Context {
            incidents: &harness.stores.incidents,
            runbooks: &harness.stores.runbooks,
            out: Vec::new(),
            confirm: &mut confirm,
        };
        execute(cli.command, &mut ctx)?;
        Ok(String::from_utf8(ctx.out).unwrap())
    }

    fn create_incident(harness: &Harness) -> String {
        run(
            harness,
            &[
                "incidents",
                "create",
                "--title",
                " Checkout errors ",
                "--service",
                "Payments",
                "--severity",
                "P1",
            ],
            true,
        )
        .unwrap();
        harness.stores.incidents.list().unwrap()[0].id.to_string()
    }

    #[test]
    fn create_trims_input_and_prints_record() {
        let harness = harness();
        let output = run(
            &harness,
            &[
                "incidents", "create", "--title", " Checkout errors ", "--service", "Payments",
                "--severity", "p2",
            ],
            true,
        )
        .unwrap();

        let printed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(printed["title"], "Checkout errors");
        assert_eq!(printed["severity"], "P2");
        assert_eq!(printed["status"], "Open");
    }

    #[test]
    fn blank_input_never_reaches_the_store() {
        let harness = harness();
        let err = run(
            &harness,
            &[
                "incidents", "create", "--title", "   ", "--service", "Payments", "--severity",
                "P1",
            ],
            true,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(harness.repo.load().unwrap(), AppState::empty());
    }

    #[test]
    fn note_toggle_and_list_filters() {
        let harness = harness();
        let id = create_incident(&harness);

        run(
            &harness,
            &["incidents", "note", &id, "--author", "SRE", "--text", "Investigating"],
            true,
        )
        .unwrap();
        run(&harness, &["incidents", "toggle", &id], true).unwrap();

        let incident = harness.stores.incidents.get(id.parse().unwrap()).unwrap();
        assert_eq!(incident.status, IncidentStatus::Closed);
        assert_eq!(incident.notes[0].author, "SRE");

        let open = run(&harness, &["incidents", "list", "--status", "Open"], true).unwrap();
        assert_eq!(open.trim(), "No incidents found.");
        let all = run(&harness, &["incidents", "list", "--status", "All", "-q", "checkout"], true)
            .unwrap();
        assert!(all.contains(&id));
    }

    #[test]
    fn delete_asks_unless_yes_is_given() {
        let harness = harness();
        let id = create_incident(&harness);

        let declined = run(&harness, &["incidents", "delete", &id], false).unwrap();
        assert_eq!(declined.trim(), "Delete cancelled.");
        assert_eq!(harness.stores.incidents.list().unwrap().len(), 1);

        let deleted = run(&harness, &["incidents", "delete", &id, "--yes"], false).unwrap();
        assert_eq!(deleted.trim(), "Deleted incident.");
        assert!(harness.stores.incidents.list().unwrap().is_empty());

        let missing = run(&harness, &["incidents", "delete", &id, "--yes"], true).unwrap();
        assert!(missing.contains("nothing deleted"));
    }

    #[test]
    fn runbook_tags_are_split_from_comma_input() {
        let harness = harness();
        run(
            &harness,
            &[
                "runbooks", "create", "--title", "Database failover", "--tags",
                "database, failover,, ", "--content", "Promote replica.",
            ],
            true,
        )
        .unwrap();

        let runbook = harness.stores.runbooks.list().unwrap().remove(0);
        assert_eq!(runbook.tags, vec!["database", "failover"]);

        let id = runbook.id.to_string();
        run(&harness, &["runbooks", "update", &id, "--tags", ""], true).unwrap();
        assert!(harness.stores.runbooks.get(runbook.id).unwrap().tags.is_empty());

        let listed = run(&harness, &["runbooks", "list", "--tag", "database"], true).unwrap();
        assert_eq!(listed.trim(), "No runbooks found.");
    }

    #[test]
    fn unknown_id_reports_not_found() {
        let harness = harness();
        let err = run(
            &harness,
            &["incidents", "show", "3f2b8a9e-6d1c-4a57-9d8e-2b1f0c7a5e44"],
            true,
        )
        .unwrap_err();
        match err {
            CliError::Store(store) => assert!(store.is_not_found()),
            other => panic!("expected store error, got {other}"),
        }
    }
}

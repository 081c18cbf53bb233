//! Project commands.
//!
//! Bind the current directory to a remote folder and sync its secret file.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use dialoguer::Confirm;
use tracing::info;

use crate::cli::resolve::{self, Session};
use crate::cli::{output, Context};
use crate::core::binding::ProjectBinding;
use crate::core::domain::{Outcome, Plan, SyncReport};
use crate::core::sync::Engine;
use crate::error::Result;

/// Create (or reuse) a folder and bind the current directory to it.
pub fn create(ctx: &Context, name: &str, parent: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let parent = parent.or(session.config.organization_root_folder.as_deref());
    let dir = resolve::current_dir()?;

    info!(name = %name, parent = ?parent, "creating project folder");
    let folder_id = session.provider.create_folder(parent, name)?;

    let binding = ProjectBinding::new(&dir, &session.config.name, &folder_id, name);
    let previous = session.bindings().bind(binding)?;

    if let Some(previous) = previous.filter(|p| p.folder_id != folder_id) {
        output::warn(&format!(
            "rebound from folder {} ({})",
            previous.folder_name, previous.folder_id
        ));
    }
    output::success(&format!(
        "bound {} to {} ({})",
        output::path(dir.display()),
        output::key(name),
        folder_id
    ));
    Ok(())
}

/// Show the binding of the current directory.
pub fn show(ctx: &Context, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let binding = session.binding()?;

    if json {
        output::data(&serde_json::to_string_pretty(&binding)?);
    } else {
        output::header(&binding.folder_name);
        output::kv("path:", binding.local_path.display());
        output::kv("provider:", &binding.provider);
        output::kv("folder:", &binding.folder_id);
        output::kv("created:", binding.created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}

/// Forget the binding of the current directory.
pub fn remove(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let dir = resolve::current_dir()?;

    // fails with NoBinding when there is nothing to remove
    session.binding()?;
    session.bindings().unbind(&dir, &session.config.name)?;

    output::success(&format!("unbound {}", output::path(dir.display())));
    output::dimmed("remote secrets were not touched");
    Ok(())
}

/// Push the local secret file to the bound folder.
pub fn add(ctx: &Context, file: Option<PathBuf>, dry_run: bool, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let binding = session.binding()?;
    let path = resolve::secret_file(file)?;
    let engine = Engine::new(session.provider.as_ref(), &binding, &session.paths)
        .with_cancel(ctx.cancel.clone());

    if dry_run {
        let local = crate::core::domain::SecretSet::load(&path)?;
        let plan = engine.plan_add(&local)?;
        return print_plan(&plan, json);
    }

    let report = engine.add(&path)?;
    finish(&report, json)
}

/// Overwrite the local secret file with the bound folder's secrets.
pub fn restore(ctx: &Context, file: Option<PathBuf>, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let binding = session.binding()?;
    let path = resolve::secret_file(file)?;
    let engine = Engine::new(session.provider.as_ref(), &binding, &session.paths)
        .with_cancel(ctx.cancel.clone());

    let report = engine.restore(&path)?;

    if json {
        output::data(&serde_json::to_string_pretty(&report)?);
    } else {
        for skipped in &report.skipped {
            output::warn(&format!(
                "skipped {:?} ({}): {}",
                skipped.name, skipped.resource_id, skipped.reason
            ));
        }
        output::success(&format!(
            "restored {} secrets to {}",
            output::count(report.restored),
            output::path(report.path.display())
        ));
    }
    Ok(())
}

/// Delete every secret in the bound folder.
pub fn clean(ctx: &Context, yes: bool, dry_run: bool, json: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    let binding = session.binding()?;
    let engine = Engine::new(session.provider.as_ref(), &binding, &session.paths)
        .with_cancel(ctx.cancel.clone());

    let plan = engine.plan_clean()?;
    if dry_run {
        return print_plan(&plan, json);
    }
    if plan.is_noop() {
        if json {
            return finish(&engine.execute(plan), json);
        }
        output::dimmed("folder is already empty");
        return Ok(());
    }

    if !yes && io::stdin().is_terminal() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} secrets from {}?",
                plan.pending(),
                binding.folder_name
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    let report = engine.execute(plan);
    finish(&report, json)
}

fn print_plan(plan: &Plan, json: bool) -> Result<()> {
    if json {
        let actions: Vec<_> = plan
            .actions()
            .iter()
            .map(|a| {
                serde_json::json!({
                    "action": a.verb().to_ascii_lowercase(),
                    "key": a.key(),
                    "resource_id": a.resource_id(),
                })
            })
            .collect();
        let result = serde_json::json!({
            "operation": plan.operation(),
            "dry_run": true,
            "actions": actions,
            "unresolved": plan.unresolved(),
        });
        output::data(&serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::header(&format!("{} plan (dry run)", plan.operation()));
    output::rule();
    for action in plan.actions() {
        output::data(&format!("  {} {}", output::verb(action.verb()), action.key()));
    }
    for failure in plan.unresolved() {
        output::data(&format!(
            "  {} {}  {}",
            output::verb("failed"),
            failure.key,
            failure.kind
        ));
    }
    output::dimmed(&format!("{} changes pending", plan.pending()));
    Ok(())
}

/// Render a report and turn a partial failure or cancellation into an error.
fn finish(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        output::data(&serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }
    report.check()?;
    Ok(())
}

fn print_report(report: &SyncReport) {
    for entry in report.outcomes() {
        match &entry.outcome {
            Outcome::Unchanged => {}
            Outcome::Failed { kind, message } => output::error(&format!(
                "{} {} ({}): {}",
                output::verb("failed"),
                output::key(&entry.key),
                kind,
                message
            )),
            Outcome::Skipped => output::dimmed(&format!("  skipped {}", entry.key)),
            other => output::data(&format!(
                "  {} {}",
                output::verb(outcome_label(other)),
                output::key(&entry.key)
            )),
        }
    }

    let summary = match report.operation() {
        crate::core::domain::Operation::Clean => format!(
            "{}: {} deleted, {} failed",
            report.operation(),
            report.deleted(),
            report.failed()
        ),
        _ => format!(
            "{}: {} created, {} updated, {} unchanged, {} failed",
            report.operation(),
            report.created(),
            report.updated(),
            report.unchanged(),
            report.failed()
        ),
    };

    if report.failed() == 0 && report.skipped() == 0 {
        output::success(&summary);
    } else {
        output::warn(&summary);
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Created => "created",
        Outcome::Updated => "updated",
        Outcome::Unchanged => "unchanged",
        Outcome::Deleted => "deleted",
        Outcome::Failed { .. } => "failed",
        Outcome::Skipped => "skipped",
    }
}

//! CLI restore subcommand.
//!
//! Two steps, like the web flow it mirrors: first the (entity, timestamp)
//! pair is carried to a confirmation prompt without touching storage, then
//! the revision is restored. A successful restore changes the entity, so the
//! restored configuration is recorded as a new `Changed` revision.

use std::process;

use confhist_storage::{HistoryAction, HistoryError, Operation, RestoreRequest};

use crate::{report_error, Context, OutputFormat};

pub fn cmd_restore(ctx: &Context, name: &str, timestamp: &str, yes: bool) -> Result<(), HistoryError> {
    let store = ctx.store();
    let action = HistoryAction::new(&store, ctx.gate.as_ref());
    let request = RestoreRequest::new(name, timestamp);

    // 1. Confirmation
    request.revision_id()?;
    ctx.gate.check_permission(name)?;
    let question = action.forward_to_restore_question(&request)?;
    if !yes {
        eprintln!(
            "Restore '{}' to the configuration recorded at {}?",
            question.name, question.timestamp
        );
        eprintln!("Type 'yes' to confirm:");

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() || input.trim() != "yes" {
            report_error("Restore aborted.", ctx.output, ctx.quiet);
            process::exit(1);
        }
    }

    // 2. Restore
    let mut entity = ctx.entity(name);
    let outcome = action.restore(&mut entity, &request)?;

    // 3. Record the change the restore made
    let recorded = match entity.read_current() {
        Ok(payload) => ctx
            .writer()
            .record(name, Operation::Changed, &ctx.author(), Some(payload.as_slice()))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    let recorded = match recorded {
        Ok(id) => Some(id),
        Err(msg) => {
            tracing::warn!("restore succeeded but could not be recorded: {}", msg);
            None
        }
    };

    match ctx.output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "restored": outcome.restored,
                "location": outcome.location,
                "recorded": recorded,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if !ctx.quiet {
                println!("restored {}", outcome.restored);
                println!("location: {}", outcome.location);
                if let Some(id) = recorded {
                    println!("recorded {}", id);
                }
            }
        }
    }
    Ok(())
}

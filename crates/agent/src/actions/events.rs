use serde_json::json;
use uuid::Uuid;

use docket_core::domain::event::{AgendaEvent, EventId};
use docket_core::intent::{ActionReport, Intent};

use super::{first_param, optional, require, ActionContext, ActionError, ActionHandler};

pub struct ListEvents;

#[async_trait::async_trait]
impl ActionHandler for ListEvents {
    fn name(&self) -> &'static str {
        "list_events"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        _intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let events = ctx.events.list(&ctx.firm).await?;
        if events.is_empty() {
            return Ok(ActionReport::ok("The agenda is empty."));
        }

        let lines: Vec<String> =
            events.iter().map(|e| format!("- {}: {}", e.event_date, e.title)).collect();
        let noun = if events.len() == 1 { "entry" } else { "entries" };
        Ok(ActionReport::ok_with_data(
            format!("{} agenda {noun}:\n{}", events.len(), lines.join("\n")),
            json!({ "count": events.len() }),
        ))
    }
}

pub struct CreateEvent;

#[async_trait::async_trait]
impl ActionHandler for CreateEvent {
    fn name(&self) -> &'static str {
        "create_event"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let title = require(intent, "title")?;
        let event_date = first_param(intent, &["event_date", "date", "when"])
            .ok_or(ActionError::MissingParam("event_date"))?;

        let mut event = AgendaEvent::new(ctx.firm, title, event_date);
        event.notes = optional(intent, "notes");
        let created = ctx.events.insert(event).await?;

        Ok(ActionReport::ok_with_data(
            format!("Added \"{title}\" to the agenda for {event_date}."),
            json!({ "event_id": created.id.0.to_string() }),
        ))
    }
}

pub struct DeleteEvent;

#[async_trait::async_trait]
impl ActionHandler for DeleteEvent {
    fn name(&self) -> &'static str {
        "delete_event"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        if let Some(raw_id) = first_param(intent, &["event_id", "id"]) {
            if let Ok(id) = Uuid::parse_str(raw_id) {
                let removed = ctx.events.delete(&ctx.firm, &EventId(id)).await?;
                if removed {
                    return Ok(ActionReport::ok_with_data(
                        "Removed the agenda entry.",
                        json!({ "event_id": raw_id }),
                    ));
                }
                return Err(ActionError::NotFound {
                    entity: "agenda event",
                    needle: raw_id.to_string(),
                });
            }
        }

        // Deleting by title only works when the title names exactly one entry.
        let title = require(intent, "title")?;
        let events = ctx.events.list(&ctx.firm).await?;
        let matching: Vec<&AgendaEvent> =
            events.iter().filter(|e| e.title.eq_ignore_ascii_case(title)).collect();

        match matching.as_slice() {
            [] => Err(ActionError::NotFound {
                entity: "agenda event",
                needle: title.to_string(),
            }),
            [event] => {
                ctx.events.delete(&ctx.firm, &event.id).await?;
                Ok(ActionReport::ok_with_data(
                    format!("Removed \"{}\" from the agenda.", event.title),
                    json!({ "event_id": event.id.0.to_string() }),
                ))
            }
            many => Err(ActionError::Ambiguous {
                entity: "agenda event",
                needle: title.to_string(),
                count: many.len(),
            }),
        }
    }
}

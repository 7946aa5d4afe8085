use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use docket_core::domain::case::{Case, CaseId, CaseStatus};
use docket_core::domain::client::Client;
use docket_core::identity::tax_id_from_params;
use docket_core::intent::{ActionReport, Intent};

use super::clients::resolve_client;
use super::{first_param, optional, ActionContext, ActionError, ActionHandler};

/// Case lookup by number first, explicit id second. A wrong number never
/// fuzzy-matches; it fails so the diagnosis can name it.
pub(crate) async fn resolve_case(
    ctx: &ActionContext,
    intent: &Intent,
) -> Result<Case, ActionError> {
    if let Some(number) = first_param(intent, &["case_number", "case_no", "case"]) {
        if let Some(case) = ctx.cases.find_by_number(&ctx.firm, number).await? {
            return Ok(case);
        }
        if let Some(case) = case_by_raw_id(ctx, intent).await? {
            return Ok(case);
        }
        return Err(ActionError::NotFound { entity: "case", needle: number.to_string() });
    }

    if let Some(case) = case_by_raw_id(ctx, intent).await? {
        return Ok(case);
    }
    match first_param(intent, &["case_id"]) {
        Some(raw_id) => {
            Err(ActionError::NotFound { entity: "case", needle: raw_id.to_string() })
        }
        None => Err(ActionError::MissingParam("case_number")),
    }
}

async fn case_by_raw_id(
    ctx: &ActionContext,
    intent: &Intent,
) -> Result<Option<Case>, ActionError> {
    let Some(raw_id) = first_param(intent, &["case_id"]) else {
        return Ok(None);
    };
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return Ok(None);
    };
    Ok(ctx.cases.find_by_id(&ctx.firm, &CaseId(id)).await?)
}

fn describe(case: &Case) -> String {
    match &case.title {
        Some(title) => format!("- {} [{}] {title}", case.number, case.status.as_str()),
        None => format!("- {} [{}]", case.number, case.status.as_str()),
    }
}

fn case_listing(found: &[Case]) -> ActionReport {
    let noun = if found.len() == 1 { "case" } else { "cases" };
    let lines: Vec<String> = found.iter().map(describe).collect();
    let data = json!({
        "count": found.len(),
        "cases": found
            .iter()
            .map(|c| json!({
                "case_id": c.id.0.to_string(),
                "case_number": c.number.clone(),
                "status": c.status.as_str(),
            }))
            .collect::<Vec<_>>(),
    });
    ActionReport::ok_with_data(
        format!("{} {noun} on file:\n{}", found.len(), lines.join("\n")),
        data,
    )
}

pub struct SearchCases;

#[async_trait::async_trait]
impl ActionHandler for SearchCases {
    fn name(&self) -> &'static str {
        "search_cases"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let query =
            first_param(intent, &["query", "q"]).ok_or(ActionError::MissingParam("query"))?;
        let found = ctx.cases.search(&ctx.firm, query).await?;

        if found.is_empty() {
            return Ok(ActionReport::ok(format!("No cases match \"{query}\".")));
        }
        Ok(case_listing(&found))
    }
}

pub struct ListCases;

#[async_trait::async_trait]
impl ActionHandler for ListCases {
    fn name(&self) -> &'static str {
        "list_cases"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        _intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let found = ctx.cases.list(&ctx.firm).await?;
        if found.is_empty() {
            return Ok(ActionReport::ok("The firm has no cases on file."));
        }
        Ok(case_listing(&found))
    }
}

pub struct CaseSummary;

#[async_trait::async_trait]
impl ActionHandler for CaseSummary {
    fn name(&self) -> &'static str {
        "get_case_summary"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let case = resolve_case(ctx, intent).await?;
        let client = ctx.clients.find_by_id(&ctx.firm, &case.client_id).await?;
        let hearings = ctx.hearings.list_for_case(&ctx.firm, &case.id).await?;
        let documents = ctx.documents.list_for_case(&ctx.firm, &case.id).await?;

        let mut lines = vec![format!("Case {} [{}]", case.number, case.status.as_str())];
        if let Some(title) = &case.title {
            lines.push(format!("Title: {title}"));
        }
        if let Some(court) = &case.court {
            lines.push(format!("Court: {court}"));
        }
        if let Some(client) = &client {
            lines.push(format!("Client: {}", client.name));
        }
        if hearings.is_empty() {
            lines.push("No hearings scheduled.".to_string());
        } else {
            lines.push(format!("Hearings ({}):", hearings.len()));
            for hearing in &hearings {
                lines.push(match &hearing.location {
                    Some(location) => format!("- {} at {location}", hearing.scheduled_for),
                    None => format!("- {}", hearing.scheduled_for),
                });
            }
        }
        if !documents.is_empty() {
            lines.push(format!("Documents ({}):", documents.len()));
            for document in &documents {
                lines.push(format!("- {}", document.title));
            }
        }

        let data = json!({
            "case_id": case.id.0.to_string(),
            "case_number": case.number.clone(),
            "status": case.status.as_str(),
            "client_id": client.as_ref().map(|c| c.id.0.to_string()),
            "hearings": hearings.len(),
            "documents": documents.len(),
        });
        Ok(ActionReport::ok_with_data(lines.join("\n"), data))
    }
}

/// The case's client. A name that resolves to nobody is not fatal here: the
/// turn described a new person, so the record is created first and the case
/// carries the generated id. A dead explicit `client_id` still fails.
async fn case_client(
    ctx: &ActionContext,
    intent: &Intent,
) -> Result<(Client, bool), ActionError> {
    match resolve_client(ctx, intent).await {
        Ok(client) => Ok((client, false)),
        Err(ActionError::NotFound { entity: "client", needle }) => {
            match first_param(intent, &["client", "client_name"]) {
                Some(name) => {
                    let mut client = Client::new(ctx.firm, name);
                    client.tax_id = tax_id_from_params(&intent.params);
                    let created = ctx.clients.insert(client).await?;
                    info!(client = %created.name, "case.client_created_first");
                    Ok((created, true))
                }
                None => Err(ActionError::NotFound { entity: "client", needle }),
            }
        }
        Err(error) => Err(error),
    }
}

pub struct CreateCase;

#[async_trait::async_trait]
impl ActionHandler for CreateCase {
    fn name(&self) -> &'static str {
        "create_case"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let number = first_param(intent, &["number", "case_number", "case_no"])
            .ok_or(ActionError::MissingParam("number"))?;
        let (client, client_created) = case_client(ctx, intent).await?;

        let mut case = Case::new(ctx.firm, client.id, number);
        case.title = optional(intent, "title");
        case.court = optional(intent, "court");
        case.notes = optional(intent, "notes");
        let created = ctx.cases.insert(case).await?;

        let message = if client_created {
            format!("Registered client {} and opened case {} for them.", client.name, created.number)
        } else {
            format!("Opened case {} for {}.", created.number, client.name)
        };
        Ok(ActionReport::ok_with_data(
            message,
            json!({
                "case_id": created.id.0.to_string(),
                "case_number": created.number.clone(),
                "client_id": client.id.0.to_string(),
            }),
        ))
    }
}

pub struct UpdateCase;

#[async_trait::async_trait]
impl ActionHandler for UpdateCase {
    fn name(&self) -> &'static str {
        "update_case"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let mut case = resolve_case(ctx, intent).await?;
        let mut changes: Vec<String> = Vec::new();

        if let Some(raw_status) = optional(intent, "status") {
            let status =
                CaseStatus::parse(&raw_status).ok_or_else(|| ActionError::InvalidParam {
                    field: "status",
                    value: raw_status.clone(),
                })?;
            if case.status != status {
                case.transition_to(status)?;
                changes.push(format!("status to {}", status.as_str()));
            }
        }
        if let Some(title) = optional(intent, "title") {
            case.title = Some(title);
            changes.push("title".to_string());
        }
        if let Some(court) = optional(intent, "court") {
            case.court = Some(court);
            changes.push("court".to_string());
        }
        if let Some(notes) = optional(intent, "notes") {
            case.notes = Some(notes);
            changes.push("notes".to_string());
        }

        if changes.is_empty() {
            return Ok(ActionReport::ok(format!(
                "Case {} is unchanged; nothing new was provided.",
                case.number
            )));
        }

        case.updated_at = Utc::now();
        let updated = ctx.cases.update(case).await?;

        Ok(ActionReport::ok_with_data(
            format!("Updated case {} ({}).", updated.number, changes.join(", ")),
            json!({
                "case_id": updated.id.0.to_string(),
                "case_number": updated.number.clone(),
                "status": updated.status.as_str(),
            }),
        ))
    }
}

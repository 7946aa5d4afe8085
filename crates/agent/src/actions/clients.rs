use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use docket_core::domain::client::{Client, ClientId};
use docket_core::identity::{normalize_tax_id, tax_id_from_params};
use docket_core::intent::{ActionReport, Intent};

use super::{first_param, optional, require, ActionContext, ActionError, ActionHandler};

/// Resolves a client by natural keys first: tax id, then name, then the
/// explicit id as a last resort.
pub(crate) async fn resolve_client(
    ctx: &ActionContext,
    intent: &Intent,
) -> Result<Client, ActionError> {
    if let Some(tax_id) = tax_id_from_params(&intent.params) {
        if let Some(client) = ctx.clients.find_by_tax_id(&ctx.firm, &tax_id).await? {
            return Ok(client);
        }
    }

    if let Some(name) = first_param(intent, &["client", "client_name"]) {
        let mut matches = ctx.clients.search(&ctx.firm, name).await?;
        if let Some(position) =
            matches.iter().position(|c| c.name.eq_ignore_ascii_case(name))
        {
            let exact = matches.iter().filter(|c| c.name.eq_ignore_ascii_case(name)).count();
            if exact > 1 {
                return Err(ActionError::Ambiguous {
                    entity: "client",
                    needle: name.to_string(),
                    count: exact,
                });
            }
            return Ok(matches.swap_remove(position));
        }
        match matches.len() {
            0 => {}
            1 => return Ok(matches.swap_remove(0)),
            count => {
                return Err(ActionError::Ambiguous {
                    entity: "client",
                    needle: name.to_string(),
                    count,
                })
            }
        }
    }

    if let Some(raw_id) = first_param(intent, &["client_id"]) {
        let id = Uuid::parse_str(raw_id).map_err(|_| ActionError::InvalidParam {
            field: "client_id",
            value: raw_id.to_string(),
        })?;
        if let Some(client) = ctx.clients.find_by_id(&ctx.firm, &ClientId(id)).await? {
            return Ok(client);
        }
    }

    match first_param(intent, &["client", "client_name", "client_id", "tax_id", "tax_code"]) {
        Some(needle) => {
            Err(ActionError::NotFound { entity: "client", needle: needle.to_string() })
        }
        None => Err(ActionError::MissingParam("client")),
    }
}

fn apply_contact_fields(client: &mut Client, intent: &Intent) {
    if let Some(email) = optional(intent, "email") {
        client.email = Some(email);
    }
    if let Some(phone) = optional(intent, "phone") {
        client.phone = Some(phone);
    }
    if let Some(notes) = optional(intent, "notes") {
        client.notes = Some(notes);
    }
}

fn describe(client: &Client) -> String {
    match &client.tax_id {
        Some(tax_id) => format!("- {} (tax id {tax_id})", client.name),
        None => format!("- {}", client.name),
    }
}

pub struct SearchClients;

#[async_trait::async_trait]
impl ActionHandler for SearchClients {
    fn name(&self) -> &'static str {
        "search_clients"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let query =
            first_param(intent, &["query", "q"]).ok_or(ActionError::MissingParam("query"))?;
        let found = ctx.clients.search(&ctx.firm, query).await?;

        if found.is_empty() {
            return Ok(ActionReport::ok(format!("No clients match \"{query}\".")));
        }

        let noun = if found.len() == 1 { "client" } else { "clients" };
        let lines: Vec<String> = found.iter().map(describe).collect();
        let data = json!({
            "count": found.len(),
            "clients": found
                .iter()
                .map(|c| json!({
                    "client_id": c.id.0.to_string(),
                    "name": c.name.clone(),
                    "tax_id": c.tax_id.clone(),
                }))
                .collect::<Vec<_>>(),
        });

        Ok(ActionReport::ok_with_data(
            format!("Found {} {noun}:\n{}", found.len(), lines.join("\n")),
            data,
        ))
    }
}

pub struct CreateClient;

#[async_trait::async_trait]
impl ActionHandler for CreateClient {
    fn name(&self) -> &'static str {
        "create_client"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let name = require(intent, "name")?;
        let tax_id = tax_id_from_params(&intent.params);

        // Same tax id means the same person: refresh that record instead of
        // tripping the unique constraint.
        if let Some(tax_id) = tax_id.as_deref() {
            if let Some(mut existing) = ctx.clients.find_by_tax_id(&ctx.firm, tax_id).await? {
                existing.name = name.to_string();
                apply_contact_fields(&mut existing, intent);
                existing.updated_at = Utc::now();
                let updated = ctx.clients.update(existing).await?;
                return Ok(ActionReport::ok_with_data(
                    format!("Client {} already existed; refreshed their details.", updated.name),
                    json!({ "client_id": updated.id.0.to_string(), "name": updated.name.clone() }),
                ));
            }
        }

        let mut client = Client::new(ctx.firm, name);
        client.tax_id = tax_id;
        apply_contact_fields(&mut client, intent);
        let created = ctx.clients.insert(client).await?;

        Ok(ActionReport::ok_with_data(
            format!("Registered client {}.", created.name),
            json!({ "client_id": created.id.0.to_string(), "name": created.name.clone() }),
        ))
    }
}

pub struct UpdateClient;

#[async_trait::async_trait]
impl ActionHandler for UpdateClient {
    fn name(&self) -> &'static str {
        "update_client"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let mut client = resolve_client(ctx, intent).await?;

        if let Some(new_name) = optional(intent, "name") {
            client.name = new_name;
        }
        if let Some(raw) = first_param(intent, &["tax_id", "tax_code"]) {
            let canonical = normalize_tax_id(raw).ok_or_else(|| ActionError::InvalidParam {
                field: "tax_id",
                value: raw.to_string(),
            })?;
            client.tax_id = Some(canonical);
        }
        apply_contact_fields(&mut client, intent);
        client.updated_at = Utc::now();

        let updated = ctx.clients.update(client).await?;
        Ok(ActionReport::ok_with_data(
            format!("Updated client {}.", updated.name),
            json!({ "client_id": updated.id.0.to_string(), "name": updated.name.clone() }),
        ))
    }
}

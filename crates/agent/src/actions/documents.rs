use chrono::Utc;
use serde_json::json;

use docket_core::domain::case::Case;
use docket_core::domain::document::{Document, DocumentKind};
use docket_core::intent::{ActionReport, Intent};

use crate::prompts;

use super::cases::resolve_case;
use super::{first_param, optional, require, ActionContext, ActionError, ActionHandler};

/// Attach to a case only when the intent names one. A named case that does
/// not exist is an error; silence means an unattached document.
async fn maybe_resolve_case(
    ctx: &ActionContext,
    intent: &Intent,
) -> Result<Option<Case>, ActionError> {
    if first_param(intent, &["case_number", "case_no", "case", "case_id"]).is_none() {
        return Ok(None);
    }
    resolve_case(ctx, intent).await.map(Some)
}

fn describe(document: &Document) -> String {
    let mut line = format!("- {}", document.title);
    if let Some(number) = &document.number {
        line.push_str(&format!(" ({number})"));
    }
    line.push_str(&format!(" [{}]", document.kind.as_str()));
    line
}

pub struct SearchDocuments;

#[async_trait::async_trait]
impl ActionHandler for SearchDocuments {
    fn name(&self) -> &'static str {
        "search_documents"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let query =
            first_param(intent, &["query", "q"]).ok_or(ActionError::MissingParam("query"))?;
        let found = ctx.documents.search(&ctx.firm, query).await?;

        if found.is_empty() {
            return Ok(ActionReport::ok(format!("No documents match \"{query}\".")));
        }

        let noun = if found.len() == 1 { "document" } else { "documents" };
        let lines: Vec<String> = found.iter().map(describe).collect();
        Ok(ActionReport::ok_with_data(
            format!("{} {noun} found:\n{}", found.len(), lines.join("\n")),
            json!({ "count": found.len() }),
        ))
    }
}

pub struct RegisterDocument;

#[async_trait::async_trait]
impl ActionHandler for RegisterDocument {
    fn name(&self) -> &'static str {
        "register_document"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let title = require(intent, "title")?;
        let number = first_param(intent, &["number", "document_number", "doc_number"]);
        let case = maybe_resolve_case(ctx, intent).await?;
        let kind = match optional(intent, "kind") {
            Some(raw) => DocumentKind::parse(&raw)
                .ok_or(ActionError::InvalidParam { field: "kind", value: raw })?,
            None => DocumentKind::Record,
        };

        // A document number is the registry key. Registering a known number
        // again refreshes the record instead of tripping the unique constraint.
        if let Some(number) = number {
            if let Some(mut existing) =
                ctx.documents.find_by_number(&ctx.firm, number).await?
            {
                existing.title = title.to_string();
                existing.kind = kind;
                if let Some(case) = &case {
                    existing.case_id = Some(case.id);
                }
                existing.updated_at = Utc::now();
                let refreshed = ctx.documents.update(existing).await?;
                return Ok(ActionReport::ok_with_data(
                    format!("Document {number} was already on file; its record was refreshed."),
                    json!({
                        "document_id": refreshed.id.0.to_string(),
                        "number": number,
                    }),
                ));
            }
        }

        let mut document = Document::new(ctx.firm, title, kind);
        document.number = number.map(String::from);
        document.case_id = case.as_ref().map(|c| c.id);
        let created = ctx.documents.insert(document).await?;

        let message = match &case {
            Some(case) => {
                format!("Registered document \"{title}\" under case {}.", case.number)
            }
            None => format!("Registered document \"{title}\"."),
        };
        Ok(ActionReport::ok_with_data(
            message,
            json!({
                "document_id": created.id.0.to_string(),
                "number": created.number.clone(),
            }),
        ))
    }
}

pub struct DraftDocument;

#[async_trait::async_trait]
impl ActionHandler for DraftDocument {
    fn name(&self) -> &'static str {
        "draft_document"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let title = require(intent, "title")?;
        let instructions =
            first_param(intent, &["instructions", "details", "about"]).unwrap_or(title);
        let case = maybe_resolve_case(ctx, intent).await?;

        let request = prompts::build_draft_request(title, instructions, case.as_ref());
        let body = ctx
            .llm
            .complete(prompts::draft_system_prompt(), &[], &request)
            .await
            .map_err(|error| ActionError::Provider(error.to_string()))?;
        let body = body.trim().to_string();

        let mut document = Document::new(ctx.firm, title, DocumentKind::Draft);
        document.case_id = case.as_ref().map(|c| c.id);
        document.body = Some(body.clone());
        let created = ctx.documents.insert(document).await?;

        Ok(ActionReport::ok_with_data(
            format!("Draft of \"{title}\":\n\n{body}\n\nSaved as a draft document."),
            json!({
                "document_id": created.id.0.to_string(),
                "title": created.title.clone(),
            }),
        ))
    }
}

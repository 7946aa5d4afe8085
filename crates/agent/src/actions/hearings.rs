use std::collections::HashMap;

use serde_json::json;

use docket_core::domain::case::CaseId;
use docket_core::domain::hearing::Hearing;
use docket_core::intent::{ActionReport, Intent};

use super::cases::resolve_case;
use super::{first_param, optional, ActionContext, ActionError, ActionHandler};

pub struct ListHearings;

#[async_trait::async_trait]
impl ActionHandler for ListHearings {
    fn name(&self) -> &'static str {
        "list_hearings"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        _intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let hearings = ctx.hearings.list(&ctx.firm).await?;
        if hearings.is_empty() {
            return Ok(ActionReport::ok("No hearings are scheduled."));
        }

        let cases = ctx.cases.list(&ctx.firm).await?;
        let numbers: HashMap<CaseId, &str> =
            cases.iter().map(|c| (c.id, c.number.as_str())).collect();

        let lines: Vec<String> = hearings
            .iter()
            .map(|hearing| {
                let number = numbers.get(&hearing.case_id).copied().unwrap_or("?");
                match &hearing.location {
                    Some(location) => {
                        format!("- {} (case {number}, {location})", hearing.scheduled_for)
                    }
                    None => format!("- {} (case {number})", hearing.scheduled_for),
                }
            })
            .collect();

        let noun = if hearings.len() == 1 { "hearing" } else { "hearings" };
        Ok(ActionReport::ok_with_data(
            format!("{} {noun} scheduled:\n{}", hearings.len(), lines.join("\n")),
            json!({ "count": hearings.len() }),
        ))
    }
}

pub struct CreateHearing;

#[async_trait::async_trait]
impl ActionHandler for CreateHearing {
    fn name(&self) -> &'static str {
        "create_hearing"
    }

    async fn execute(
        &self,
        ctx: &ActionContext,
        intent: &Intent,
    ) -> Result<ActionReport, ActionError> {
        let case = resolve_case(ctx, intent).await?;
        let scheduled_for = first_param(intent, &["scheduled_for", "date", "when"])
            .ok_or(ActionError::MissingParam("scheduled_for"))?;

        let mut hearing = Hearing::new(ctx.firm, case.id, scheduled_for);
        hearing.location = optional(intent, "location");
        hearing.purpose = optional(intent, "purpose");
        hearing.notes = optional(intent, "notes");
        let created = ctx.hearings.insert(hearing).await?;

        Ok(ActionReport::ok_with_data(
            format!(
                "Scheduled hearing for case {} on {}.",
                case.number, created.scheduled_for
            ),
            json!({
                "hearing_id": created.id.0.to_string(),
                "case_id": case.id.0.to_string(),
                "case_number": case.number.clone(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use docket_core::intent::Intent;

    use crate::actions::cases::CreateCase;
    use crate::actions::clients::CreateClient;
    use crate::actions::testing::context;
    use crate::actions::{ActionContext, ActionHandler};

    use super::{CreateHearing, ListHearings};

    async fn seed_case(ctx: &ActionContext, number: &str) {
        let client = Intent::new("create_client").with_param("name", "Maria Rossi");
        CreateClient.execute(ctx, &client).await.expect("create client");
        let case = Intent::new("create_case")
            .with_param("number", number)
            .with_param("client", "Maria Rossi");
        CreateCase.execute(ctx, &case).await.expect("create case");
    }

    #[tokio::test]
    async fn create_hearing_attaches_to_the_named_case() {
        let ctx = context();
        seed_case(&ctx, "123/2026").await;

        let intent = Intent::new("create_hearing")
            .with_param("case_number", "123/2026")
            .with_param("scheduled_for", "2026-09-12 09:30")
            .with_param("location", "Room 4");
        let report = CreateHearing.execute(&ctx, &intent).await.expect("create");
        assert!(report.message.expect("message").contains("123/2026"));

        let case = ctx
            .cases
            .find_by_number(&ctx.firm, "123/2026")
            .await
            .expect("lookup")
            .expect("case");
        let hearings =
            ctx.hearings.list_for_case(&ctx.firm, &case.id).await.expect("list");
        assert_eq!(hearings.len(), 1);
        assert_eq!(hearings[0].location.as_deref(), Some("Room 4"));
    }

    #[tokio::test]
    async fn create_hearing_for_a_missing_case_names_the_number() {
        let ctx = context();
        let intent = Intent::new("create_hearing")
            .with_param("case_number", "0099/2026")
            .with_param("scheduled_for", "tomorrow 10:00");

        let error = CreateHearing.execute(&ctx, &intent).await.expect_err("no such case");
        let text = error.to_string();
        assert!(text.contains("case 0099/2026"));
        assert!(text.contains("not found"));
    }

    #[tokio::test]
    async fn list_hearings_shows_the_owning_case_number() {
        let ctx = context();
        seed_case(&ctx, "123/2026").await;
        let intent = Intent::new("create_hearing")
            .with_param("case_number", "123/2026")
            .with_param("scheduled_for", "2026-09-12 09:30");
        CreateHearing.execute(&ctx, &intent).await.expect("create");

        let report =
            ListHearings.execute(&ctx, &Intent::new("list_hearings")).await.expect("list");
        let message = report.message.expect("message");
        assert!(message.contains("2026-09-12 09:30"));
        assert!(message.contains("case 123/2026"));
    }
}

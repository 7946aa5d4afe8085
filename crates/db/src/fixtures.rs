use uuid::Uuid;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Firm every fixture row belongs to. The chat session falls back to this id
/// when no firm is configured.
pub const DEFAULT_FIRM_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

/// Fixture rows are written with a fixed clock so reloading never reorders
/// anything.
const SEED_TIMESTAMP: &str = "2026-01-05T09:00:00+00:00";

struct SeedClient {
    id: &'static str,
    name: &'static str,
    tax_id: Option<&'static str>,
    email: Option<&'static str>,
    phone: Option<&'static str>,
}

const SEED_CLIENTS: &[SeedClient] = &[
    SeedClient {
        id: "00000000-0000-4000-8000-000000000101",
        name: "Maria Rossi",
        tax_id: Some("20-30405060-7"),
        email: Some("maria.rossi@example.test"),
        phone: Some("+39 333 111 2233"),
    },
    SeedClient {
        id: "00000000-0000-4000-8000-000000000102",
        name: "TechNova S.R.L.",
        tax_id: Some("30-71727374-5"),
        email: Some("legal@technova.example.test"),
        phone: None,
    },
];

struct SeedCase {
    id: &'static str,
    client_id: &'static str,
    number: &'static str,
    title: &'static str,
    court: Option<&'static str>,
    status: &'static str,
}

const SEED_CASES: &[SeedCase] = &[
    SeedCase {
        id: "00000000-0000-4000-8000-000000000201",
        client_id: "00000000-0000-4000-8000-000000000101",
        number: "0042/2026",
        title: "Rossi v. Immobiliare Lago",
        court: Some("Civil Court of Milan"),
        status: "open",
    },
    SeedCase {
        id: "00000000-0000-4000-8000-000000000202",
        client_id: "00000000-0000-4000-8000-000000000102",
        number: "0117/2025",
        title: "TechNova employment dispute",
        court: Some("Labor Tribunal of Milan"),
        status: "suspended",
    },
];

struct SeedHearing {
    id: &'static str,
    case_id: &'static str,
    scheduled_for: &'static str,
    location: Option<&'static str>,
    purpose: Option<&'static str>,
}

const SEED_HEARINGS: &[SeedHearing] = &[SeedHearing {
    id: "00000000-0000-4000-8000-000000000301",
    case_id: "00000000-0000-4000-8000-000000000201",
    scheduled_for: "2026-09-12 09:30",
    location: Some("Courtroom 4"),
    purpose: Some("Preliminary hearing"),
}];

struct SeedEvent {
    id: &'static str,
    title: &'static str,
    event_date: &'static str,
}

const SEED_EVENTS: &[SeedEvent] = &[SeedEvent {
    id: "00000000-0000-4000-8000-000000000401",
    title: "Renew bar membership",
    event_date: "2026-10-01",
}];

/// Deterministic demo practice: two clients, two cases, one hearing, one
/// agenda entry, all under [`DEFAULT_FIRM_ID`].
pub struct SeedDataset;

impl SeedDataset {
    /// Upsert every fixture row. Safe to run against a database that was
    /// seeded before.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let firm_id = DEFAULT_FIRM_ID.to_string();

        for client in SEED_CLIENTS {
            sqlx::query(
                "INSERT INTO client (id, firm_id, name, tax_id, email, phone, notes,
                                     created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     tax_id = excluded.tax_id,
                     email = excluded.email,
                     phone = excluded.phone",
            )
            .bind(client.id)
            .bind(&firm_id)
            .bind(client.name)
            .bind(client.tax_id)
            .bind(client.email)
            .bind(client.phone)
            .bind(SEED_TIMESTAMP)
            .bind(SEED_TIMESTAMP)
            .execute(&mut *tx)
            .await?;
        }

        for case in SEED_CASES {
            sqlx::query(
                "INSERT INTO court_case (id, firm_id, client_id, number, title, court, status,
                                         notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     client_id = excluded.client_id,
                     number = excluded.number,
                     title = excluded.title,
                     court = excluded.court,
                     status = excluded.status",
            )
            .bind(case.id)
            .bind(&firm_id)
            .bind(case.client_id)
            .bind(case.number)
            .bind(case.title)
            .bind(case.court)
            .bind(case.status)
            .bind(SEED_TIMESTAMP)
            .bind(SEED_TIMESTAMP)
            .execute(&mut *tx)
            .await?;
        }

        for hearing in SEED_HEARINGS {
            sqlx::query(
                "INSERT INTO hearing (id, firm_id, case_id, scheduled_for, location, purpose,
                                      notes, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, NULL, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     case_id = excluded.case_id,
                     scheduled_for = excluded.scheduled_for,
                     location = excluded.location,
                     purpose = excluded.purpose",
            )
            .bind(hearing.id)
            .bind(&firm_id)
            .bind(hearing.case_id)
            .bind(hearing.scheduled_for)
            .bind(hearing.location)
            .bind(hearing.purpose)
            .bind(SEED_TIMESTAMP)
            .execute(&mut *tx)
            .await?;
        }

        for event in SEED_EVENTS {
            sqlx::query(
                "INSERT INTO agenda_event (id, firm_id, title, event_date, notes, created_at)
                 VALUES (?, ?, ?, ?, NULL, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     event_date = excluded.event_date",
            )
            .bind(event.id)
            .bind(&firm_id)
            .bind(event.title)
            .bind(event.event_date)
            .bind(SEED_TIMESTAMP)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            clients: SEED_CLIENTS.len(),
            cases: SEED_CASES.len(),
            hearings: SEED_HEARINGS.len(),
            events: SEED_EVENTS.len(),
        })
    }

    /// Check that every fixture row is present and still linked the way the
    /// dataset defines it.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let firm_id = DEFAULT_FIRM_ID.to_string();
        let mut checks = Vec::new();

        for client in SEED_CLIENTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM client WHERE id = ?1 AND firm_id = ?2 AND name = ?3)",
            )
            .bind(client.id)
            .bind(&firm_id)
            .bind(client.name)
            .fetch_one(pool)
            .await?;
            checks.push((client.name, exists == 1));
        }

        for case in SEED_CASES {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM court_case
                               WHERE id = ?1 AND firm_id = ?2 AND client_id = ?3
                                 AND number = ?4 AND status = ?5)",
            )
            .bind(case.id)
            .bind(&firm_id)
            .bind(case.client_id)
            .bind(case.number)
            .bind(case.status)
            .fetch_one(pool)
            .await?;
            checks.push((case.number, exists == 1));
        }

        for hearing in SEED_HEARINGS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM hearing
                               WHERE id = ?1 AND firm_id = ?2 AND case_id = ?3
                                 AND scheduled_for = ?4)",
            )
            .bind(hearing.id)
            .bind(&firm_id)
            .bind(hearing.case_id)
            .bind(hearing.scheduled_for)
            .fetch_one(pool)
            .await?;
            checks.push((hearing.scheduled_for, exists == 1));
        }

        for event in SEED_EVENTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM agenda_event
                               WHERE id = ?1 AND firm_id = ?2 AND title = ?3)",
            )
            .bind(event.id)
            .bind(&firm_id)
            .bind(event.title)
            .fetch_one(pool)
            .await?;
            checks.push((event.title, exists == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub clients: usize,
    pub cases: usize,
    pub hearings: usize,
    pub events: usize,
}

impl SeedResult {
    pub fn summary(&self) -> String {
        format!(
            "{} clients, {} cases, {} hearings, {} agenda events",
            self.clients, self.cases, self.hearings, self.events
        )
    }
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use docket_core::domain::case::CaseId;
    use docket_core::domain::FirmId;

    use super::{SeedDataset, DEFAULT_FIRM_ID, SEED_CASES, SEED_CLIENTS};
    use crate::repositories::{
        CaseRepository, ClientRepository, HearingRepository, SqlCaseRepository,
        SqlClientRepository, SqlHearingRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let pool = setup().await;

        let first = SeedDataset::load(&pool).await.expect("first load");
        let second = SeedDataset::load(&pool).await.expect("second load");
        assert_eq!(first, second);

        let verification = SeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);

        let client_count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM client")
            .fetch_one(&pool)
            .await
            .expect("count clients");
        assert_eq!(client_count as usize, SEED_CLIENTS.len());
    }

    #[tokio::test]
    async fn seeded_rows_resolve_through_repositories() {
        let pool = setup().await;
        SeedDataset::load(&pool).await.expect("load");

        let firm = FirmId(DEFAULT_FIRM_ID);

        let clients = SqlClientRepository::new(pool.clone());
        let maria = clients
            .find_by_tax_id(&firm, "20-30405060-7")
            .await
            .expect("find client")
            .expect("Maria Rossi is seeded");
        assert_eq!(maria.name, "Maria Rossi");

        let cases = SqlCaseRepository::new(pool.clone());
        let case = cases
            .find_by_number(&firm, SEED_CASES[0].number)
            .await
            .expect("find case")
            .expect("case 0042/2026 is seeded");
        assert_eq!(case.client_id, maria.id);

        let hearings = SqlHearingRepository::new(pool);
        let listed = hearings
            .list_for_case(&firm, &CaseId(Uuid::parse_str(SEED_CASES[0].id).expect("uuid")))
            .await
            .expect("list hearings");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].scheduled_for, "2026-09-12 09:30");
    }
}

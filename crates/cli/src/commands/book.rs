use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use medirent_core::audit::NullAuditSink;
use medirent_core::{
    AppConfig, ApplicationError, BookingSession, BranchId, CategoryId, CustomerDetails,
    EquipmentCategory, InMemoryBookingStore, InMemoryInventory, InMemoryRateBook, LoadOptions,
    RateTable, SequenceReferences, SessionPorts,
};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct TranscriptEntry {
    stage: &'static str,
    state: String,
    detail: String,
}

/// Walks a complete rental through the flow against seeded in-memory
/// collaborators: selection, availability, quote, customer, payment,
/// delivery, one accepted extension, and the return.
pub fn run(branch: String, category: String, start: NaiveDate, end: NaiveDate) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("book", "config_validation", error.to_string(), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("book", "runtime", error.to_string(), 3),
    };

    match runtime.block_on(drive(config, branch, category, start, end)) {
        Ok(transcript) => {
            let details = json!({ "transcript": transcript });
            CommandResult::success("book", "booking walked through the full flow", Some(details))
        }
        Err(error) => {
            let class = match &error {
                ApplicationError::Domain(medirent_core::BookingError::AvailabilityExhausted) => {
                    "no_availability"
                }
                ApplicationError::Domain(_) => "validation",
                ApplicationError::ExternalService { .. } => "external_service",
                ApplicationError::Configuration(_) => "config_validation",
            };
            CommandResult::failure("book", class, error.to_string(), 1)
        }
    }
}

async fn drive(
    config: AppConfig,
    branch: String,
    category: String,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TranscriptEntry>, ApplicationError> {
    let mut session =
        BookingSession::new(config.clone(), demo_ports(&config), Arc::new(NullAuditSink), "cli-demo");
    let mut transcript = Vec::new();
    let mut note = |stage: &'static str, session: &BookingSession, detail: String| {
        transcript.push(TranscriptEntry { stage, state: format!("{:?}", session.state()), detail });
    };

    session.choose_branch(BranchId(branch.clone()))?;
    note("branch", &session, format!("chosen branch `{branch}`"));

    session.choose_equipment(CategoryId(category.clone())).await?;
    note(
        "equipment",
        &session,
        session.record().equipment_name.clone().unwrap_or_else(|| category.clone()),
    );

    session.choose_dates(start, end)?;
    note("dates", &session, format!("{start} to {end}"));

    session.resolve_availability().await?;
    let availability = session.record().availability.clone();
    note(
        "availability",
        &session,
        match availability {
            Some(a) if a.cross_branch => {
                format!("fulfilled cross-branch from `{}`", a.fulfilling_branch.0)
            }
            Some(a) => format!("{} unit(s) free locally", a.local_units_free),
            None => "unresolved".to_owned(),
        },
    );

    let summary = session
        .record()
        .pricing
        .as_ref()
        .map(|p| p.summary.clone())
        .unwrap_or_default();
    let deposit = session.record().deposit_amount.unwrap_or(Decimal::ZERO);
    note("quote", &session, format!("{summary} (deposit {deposit})"));

    session.accept_quote()?;
    session.provide_customer(demo_customer()).await?;
    note(
        "customer",
        &session,
        format!("quote {}", session.record().quote_id.clone().map(|q| q.0).unwrap_or_default()),
    );

    session.confirm_quote()?;
    session.confirm_payment().await?;
    note(
        "payment",
        &session,
        format!(
            "committed as {}",
            session.record().booking_reference.clone().unwrap_or_default()
        ),
    );

    session.dispatch_delivery()?;
    session.confirm_delivery()?;
    note("delivery", &session, "dispatched and delivered".to_owned());

    session.offer_extension()?;
    session.accept_extension(end + chrono::Days::new(3)).await?;
    note("extension", &session, "extended by 3 days".to_owned());

    session.offer_extension()?;
    session.decline_extension()?;
    session.confirm_return().await?;
    note("return", &session, "equipment returned".to_owned());

    Ok(transcript)
}

fn demo_ports(config: &AppConfig) -> SessionPorts {
    let categories = [
        ("wheelchair", "Standard Wheelchair", 85, 450, 1200),
        ("hospital-bed", "Electric Hospital Bed", 160, 900, 2600),
        ("oxygen-concentrator", "Oxygen Concentrator", 120, 700, 2100),
    ];
    let inventory = Arc::new(InMemoryInventory::with_capacity(
        config.branches.iter().flat_map(|branch| {
            categories.map(|(id, _, _, _, _)| {
                (BranchId(branch.id.clone()), CategoryId(id.to_owned()), 3)
            })
        }),
    ));
    let rate_book = Arc::new(InMemoryRateBook::with_entries(categories.map(
        |(id, name, daily, weekly, monthly)| {
            (
                EquipmentCategory {
                    id: CategoryId(id.to_owned()),
                    name: name.to_owned(),
                    active: true,
                },
                RateTable {
                    daily: Decimal::new(daily, 0),
                    weekly: Decimal::new(weekly, 0),
                    monthly: Decimal::new(monthly, 0),
                },
            )
        },
    )));
    SessionPorts {
        availability: inventory.clone(),
        rate_tables: rate_book,
        ledger: inventory,
        store: Arc::new(InMemoryBookingStore::default()),
        references: Arc::new(SequenceReferences::default()),
    }
}

fn demo_customer() -> CustomerDetails {
    CustomerDetails {
        name: "Demo Customer".to_owned(),
        phone: "+27 82 555 0100".to_owned(),
        email: "demo@example.com".to_owned(),
        address: "1 Hospital Road, Durban".to_owned(),
        notes: None,
    }
}

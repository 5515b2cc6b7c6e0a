// src/services/client_service.rs

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        events::{EventBus, EventKind},
    },
    db::ClientRepository,
    models::client::{Client, ClientChanges, ClientView, NewClient, NpsRecord},
};

#[derive(Clone)]
pub struct ClientService {
    repo: ClientRepository,
    events: EventBus,
}

// =========================================================================
//  NPS DERIVADO
// =========================================================================

/// Média das notas com uma casa decimal. Sem respostas, `None`.
pub fn average_nps(records: &[NpsRecord]) -> Option<Decimal> {
    if records.is_empty() {
        return None;
    }
    let sum: Decimal = records.iter().map(|r| Decimal::from(r.score)).sum();
    sum.checked_div(Decimal::from(records.len()))
        .map(|avg| avg.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Resposta mais recente (ano desc, mês desc)
pub fn latest_nps(records: &[NpsRecord]) -> Option<&NpsRecord> {
    records.iter().max_by_key(|r| (r.year, r.month))
}

pub fn to_view(client: Client) -> ClientView {
    let average_nps = average_nps(&client.nps_records);
    let latest_nps = latest_nps(&client.nps_records).cloned();
    ClientView { client, average_nps, latest_nps }
}

fn apply_client_changes(mut client: Client, changes: ClientChanges) -> Client {
    if let Some(company) = changes.company {
        client.company = company;
    }
    if let Some(contact_name) = changes.contact_name {
        client.contact_name = contact_name;
    }
    if let Some(email) = changes.email {
        client.email = email;
    }
    if let Some(phone) = changes.phone {
        client.phone = phone;
    }
    if let Some(monthly_value) = changes.monthly_value {
        client.monthly_value = monthly_value;
    }
    if let Some(status) = changes.status {
        client.status = status;
    }
    if let Some(start_date) = changes.start_date {
        client.start_date = start_date;
    }
    if let Some(notes) = changes.notes {
        client.notes = notes;
    }
    client
}

impl ClientService {
    pub fn new(repo: ClientRepository, events: EventBus) -> Self {
        Self { repo, events }
    }

    pub async fn list_clients(&self, space_id: Uuid) -> Result<Vec<ClientView>, AppError> {
        let clients = self.repo.list(space_id).await?;
        Ok(clients.into_iter().map(to_view).collect())
    }

    pub async fn create_client(&self, space_id: Uuid, input: NewClient) -> Result<ClientView, AppError> {
        let client = self.repo.create(space_id, &input).await?;
        self.events.publish(EventKind::ClientsChanged, space_id);
        Ok(to_view(client))
    }

    pub async fn update_client(
        &self,
        space_id: Uuid,
        id: Uuid,
        changes: ClientChanges,
    ) -> Result<ClientView, AppError> {
        let current = self.repo.find(space_id, id).await?.ok_or(AppError::ClientNotFound)?;
        let nps_records = current.nps_records.clone();

        let mut saved = self.repo.save(&apply_client_changes(current, changes)).await?;
        saved.nps_records = nps_records;

        self.events.publish(EventKind::ClientsChanged, space_id);
        Ok(to_view(saved))
    }

    pub async fn delete_client(&self, space_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(space_id, id).await? {
            return Err(AppError::ClientNotFound);
        }
        self.events.publish(EventKind::ClientsChanged, space_id);
        Ok(())
    }

    // =========================================================================
    //  NPS
    // =========================================================================

    /// Registra (ou corrige) a resposta de NPS do mês
    pub async fn upsert_nps(
        &self,
        space_id: Uuid,
        client_id: Uuid,
        month: i32,
        year: i32,
        score: i32,
        notes: Option<&str>,
    ) -> Result<ClientView, AppError> {
        let mut client = self
            .repo
            .find(space_id, client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        self.repo.upsert_nps(client.id, month, year, score, notes).await?;
        client.nps_records = self.repo.list_nps(client.id).await?;

        self.events.publish(EventKind::ClientsChanged, space_id);
        Ok(to_view(client))
    }

    pub async fn delete_nps(
        &self,
        space_id: Uuid,
        client_id: Uuid,
        month: i32,
        year: i32,
    ) -> Result<ClientView, AppError> {
        let mut client = self
            .repo
            .find(space_id, client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        if !self.repo.delete_nps(client.id, month, year).await? {
            return Err(AppError::NpsRecordNotFound);
        }
        client.nps_records = self.repo.list_nps(client.id).await?;

        self.events.publish(EventKind::ClientsChanged, space_id);
        Ok(to_view(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::ClientStatus;
    use crate::services::objective_engine::tests::client;
    use chrono::Utc;

    fn nps(month: i32, year: i32, score: i32) -> NpsRecord {
        NpsRecord {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            month,
            year,
            score,
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let records = vec![nps(1, 2025, 9), nps(2, 2025, 8), nps(3, 2025, 8)];
        // 25 / 3 = 8.333...
        assert_eq!(average_nps(&records), Some(Decimal::new(83, 1)));

        let records = vec![nps(1, 2025, 9), nps(2, 2025, 8)];
        assert_eq!(average_nps(&records), Some(Decimal::new(85, 1)));
    }

    #[test]
    fn no_answers_means_no_average() {
        assert_eq!(average_nps(&[]), None);
        assert!(latest_nps(&[]).is_none());
    }

    #[test]
    fn latest_orders_by_year_then_month() {
        let records = vec![nps(12, 2024, 3), nps(2, 2025, 10), nps(11, 2024, 7)];
        let latest = latest_nps(&records).unwrap();
        assert_eq!((latest.month, latest.year, latest.score), (2, 2025, 10));
    }

    #[test]
    fn view_carries_derived_nps() {
        let mut c = client(ClientStatus::Active, 1000);
        c.nps_records = vec![nps(1, 2025, 6), nps(3, 2025, 10)];

        let view = to_view(c);
        assert_eq!(view.average_nps, Some(Decimal::from(8)));
        assert_eq!(view.latest_nps.map(|r| r.score), Some(10));
    }

    #[test]
    fn partial_changes_keep_untouched_fields() {
        let mut c = client(ClientStatus::Active, 1000);
        c.email = Some("contato@acme.com".into());

        let changed = apply_client_changes(
            c,
            ClientChanges {
                status: Some(ClientStatus::Churn),
                ..Default::default()
            },
        );
        assert_eq!(changed.status, ClientStatus::Churn);
        assert_eq!(changed.monthly_value, Decimal::from(1000));
        assert_eq!(changed.email.as_deref(), Some("contato@acme.com"));
    }

    #[test]
    fn null_clears_contact_data() {
        let mut c = client(ClientStatus::Active, 1000);
        c.email = Some("contato@acme.com".into());
        c.notes = Some("renovação em março".into());

        let changed = apply_client_changes(
            c,
            ClientChanges {
                email: Some(None),
                notes: Some(None),
                ..Default::default()
            },
        );
        assert_eq!(changed.email, None);
        assert_eq!(changed.notes, None);
        assert_eq!(changed.company, "Acme");
    }
}

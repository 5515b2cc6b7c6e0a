// src/services/lead_service.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        events::{EventBus, EventKind},
    },
    db::LeadRepository,
    models::lead::{Lead, LeadChanges, LeadStage, NewLead},
};

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    events: EventBus,
}

/// Aplica a edição no lead. Se o estágio mudou, carimba
/// `stage_changed_at` e `last_contact` com o momento da mudança; um
/// `last_contact` enviado na mesma edição prevalece sobre o carimbo.
pub fn apply_lead_changes(mut lead: Lead, changes: LeadChanges, now: DateTime<Utc>) -> Lead {
    if let Some(stage) = changes.stage {
        if stage != lead.stage {
            lead.stage = stage;
            lead.stage_changed_at = now;
            lead.last_contact = Some(now.date_naive());
        }
    }

    if let Some(name) = changes.name {
        lead.name = name;
    }
    if let Some(company) = changes.company {
        lead.company = company;
    }
    if let Some(email) = changes.email {
        lead.email = email;
    }
    if let Some(phone) = changes.phone {
        lead.phone = phone;
    }
    if let Some(value) = changes.value {
        lead.value = value;
    }
    if let Some(temperature) = changes.temperature {
        lead.temperature = temperature;
    }
    if let Some(last_contact) = changes.last_contact {
        lead.last_contact = last_contact;
    }
    if let Some(origin) = changes.origin {
        lead.origin = origin;
    }
    if let Some(notes) = changes.notes {
        lead.notes = notes;
    }

    lead
}

impl LeadService {
    pub fn new(repo: LeadRepository, events: EventBus) -> Self {
        Self { repo, events }
    }

    pub async fn list_leads(&self, space_id: Uuid) -> Result<Vec<Lead>, AppError> {
        self.repo.list(space_id).await
    }

    pub async fn create_lead(&self, space_id: Uuid, input: NewLead) -> Result<Lead, AppError> {
        let lead = self.repo.create(space_id, &input).await?;
        self.events.publish(EventKind::LeadsChanged, space_id);
        Ok(lead)
    }

    pub async fn update_lead(&self, space_id: Uuid, id: Uuid, changes: LeadChanges) -> Result<Lead, AppError> {
        let current = self.repo.find(space_id, id).await?.ok_or(AppError::LeadNotFound)?;

        let updated = apply_lead_changes(current, changes, Utc::now());
        let saved = self.repo.save(&updated).await?;

        self.events.publish(EventKind::LeadsChanged, space_id);
        Ok(saved)
    }

    /// Arrastar no kanban
    pub async fn move_lead(&self, space_id: Uuid, id: Uuid, stage: LeadStage) -> Result<Lead, AppError> {
        let changes = LeadChanges {
            stage: Some(stage),
            ..LeadChanges::default()
        };
        self.update_lead(space_id, id, changes).await
    }

    pub async fn delete_lead(&self, space_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(space_id, id).await? {
            return Err(AppError::LeadNotFound);
        }
        self.events.publish(EventKind::LeadsChanged, space_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::LeadTemperature;
    use crate::services::objective_engine::tests::lead;
    use chrono::TimeDelta;
    use rust_decimal::Decimal;

    #[test]
    fn stage_change_stamps_the_transition() {
        let now = Utc::now();
        let mut original = lead(LeadStage::MeetingDone, 100);
        original.stage_changed_at = now - TimeDelta::days(3);

        let moved = apply_lead_changes(
            original,
            LeadChanges { stage: Some(LeadStage::Proposal), ..Default::default() },
            now,
        );

        assert_eq!(moved.stage, LeadStage::Proposal);
        assert_eq!(moved.stage_changed_at, now);
        assert_eq!(moved.last_contact, Some(now.date_naive()));
    }

    #[test]
    fn same_stage_keeps_the_old_timestamp() {
        let now = Utc::now();
        let since = now - TimeDelta::hours(30);
        let mut original = lead(LeadStage::Proposal, 100);
        original.stage_changed_at = since;

        let edited = apply_lead_changes(
            original,
            LeadChanges {
                stage: Some(LeadStage::Proposal),
                value: Some(Decimal::from(250)),
                temperature: Some(LeadTemperature::Hot),
                ..Default::default()
            },
            now,
        );

        assert_eq!(edited.stage_changed_at, since);
        assert_eq!(edited.value, Decimal::from(250));
        assert_eq!(edited.temperature, LeadTemperature::Hot);
        assert_eq!(edited.last_contact, None);
    }

    #[test]
    fn explicit_last_contact_wins_over_stage_stamp() {
        let now = Utc::now();
        let called_on = now.date_naive() - TimeDelta::days(2);

        let moved = apply_lead_changes(
            lead(LeadStage::Contact, 100),
            LeadChanges {
                stage: Some(LeadStage::MeetingScheduled),
                last_contact: Some(Some(called_on)),
                ..Default::default()
            },
            now,
        );

        assert_eq!(moved.stage, LeadStage::MeetingScheduled);
        assert_eq!(moved.stage_changed_at, now);
        assert_eq!(moved.last_contact, Some(called_on));
    }

    #[test]
    fn null_clears_optional_fields() {
        let mut original = lead(LeadStage::New, 100);
        original.company = Some("Pereira & Filhos".into());
        original.notes = Some("quer desconto".into());
        original.origin = Some("Indicação".into());

        let edited = apply_lead_changes(
            original,
            LeadChanges {
                company: Some(None),
                notes: Some(None),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(edited.company, None);
        assert_eq!(edited.notes, None);
        assert_eq!(edited.origin.as_deref(), Some("Indicação"));
    }
}

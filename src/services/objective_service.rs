// src/services/objective_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        events::{EventBus, EventKind},
    },
    db::{ClientRepository, LeadRepository, ObjectiveRepository},
    models::{
        client::Client,
        lead::Lead,
        objective::{
            DataSource, NewObjective, Objective, ObjectiveChanges, ObjectiveProgress, ObjectiveStats, ValueType,
        },
    },
    services::{
        objective_engine::{self, PlanningClock},
        progress_grid::build_progress_grid,
    },
};

#[derive(Clone)]
pub struct ObjectiveService {
    repo: ObjectiveRepository,
    lead_repo: LeadRepository,
    client_repo: ClientRepository,
    events: EventBus,
    reference_epoch: NaiveDate,
}

/// Regras de configuração de um objetivo (criação e edição).
pub fn validate_config(
    value_type: ValueType,
    target_value: Decimal,
    is_commercial: bool,
    data_sources: &[DataSource],
) -> Result<(), AppError> {
    if target_value <= Decimal::ZERO {
        return Err(AppError::InvalidObjectiveConfig("target_must_be_positive"));
    }
    if is_commercial {
        if value_type == ValueType::Percentage {
            return Err(AppError::InvalidObjectiveConfig("percentage_not_commercial"));
        }
        if data_sources.is_empty() {
            return Err(AppError::InvalidObjectiveConfig("commercial_requires_sources"));
        }
    } else if !data_sources.is_empty() {
        return Err(AppError::InvalidObjectiveConfig("manual_objective_has_sources"));
    }
    Ok(())
}

fn apply_objective_changes(mut objective: Objective, changes: ObjectiveChanges) -> Objective {
    if let Some(name) = changes.name {
        objective.name = name;
    }
    if let Some(description) = changes.description {
        objective.description = description;
    }
    if let Some(value_type) = changes.value_type {
        objective.value_type = value_type;
    }
    if let Some(target_value) = changes.target_value {
        objective.target_value = target_value;
    }
    if let Some(deadline) = changes.deadline {
        objective.deadline = deadline;
    }
    if let Some(is_commercial) = changes.is_commercial {
        objective.is_commercial = is_commercial;
        // Virou manual sem dizer as fontes: limpa as antigas
        if !is_commercial && changes.data_sources.is_none() {
            objective.data_sources.clear();
        }
    }
    if let Some(data_sources) = changes.data_sources {
        objective.data_sources = data_sources;
    }
    objective
}

// Comerciais são derivados do CRM: não têm log manual para gravar nem apagar
fn ensure_manual(objective: &Objective) -> Result<(), AppError> {
    if objective.is_commercial {
        return Err(AppError::CommercialObjectiveLog);
    }
    Ok(())
}

// Mesma fonte duas vezes contaria em dobro
fn dedup_sources(sources: &mut Vec<DataSource>) {
    let mut seen = Vec::with_capacity(sources.len());
    sources.retain(|s| {
        if seen.contains(s) {
            false
        } else {
            seen.push(*s);
            true
        }
    });
}

impl ObjectiveService {
    pub fn new(
        repo: ObjectiveRepository,
        lead_repo: LeadRepository,
        client_repo: ClientRepository,
        events: EventBus,
        reference_epoch: NaiveDate,
    ) -> Self {
        Self { repo, lead_repo, client_repo, events, reference_epoch }
    }

    fn clock(&self) -> PlanningClock {
        PlanningClock::new(self.reference_epoch, Utc::now())
    }

    // Leads e clientes só são carregados se algum objetivo for comercial
    async fn commercial_inputs(
        &self,
        space_id: Uuid,
        needed: bool,
    ) -> Result<(Vec<Lead>, Vec<Client>), AppError> {
        if !needed {
            return Ok((Vec::new(), Vec::new()));
        }
        let leads = self.lead_repo.list(space_id).await?;
        let clients = self.client_repo.list(space_id).await?;
        Ok((leads, clients))
    }

    async fn derive_one(&self, objective: Objective) -> Result<Objective, AppError> {
        let (leads, clients) = self
            .commercial_inputs(objective.space_id, objective.is_commercial)
            .await?;
        Ok(objective_engine::derive_objective(objective, &leads, &clients, &self.clock()))
    }

    async fn find_or_404(&self, space_id: Uuid, id: Uuid) -> Result<Objective, AppError> {
        self.repo.find(space_id, id).await?.ok_or(AppError::ObjectiveNotFound)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    /// Objetivos do space com valor e status rederivados agora.
    pub async fn list_objectives(&self, space_id: Uuid) -> Result<Vec<Objective>, AppError> {
        let objectives = self.repo.list(space_id).await?;
        let any_commercial = objectives.iter().any(|o| o.is_commercial);
        let (leads, clients) = self.commercial_inputs(space_id, any_commercial).await?;

        let clock = self.clock();
        Ok(objectives
            .into_iter()
            .map(|o| objective_engine::derive_objective(o, &leads, &clients, &clock))
            .collect())
    }

    pub async fn get_progress(&self, space_id: Uuid, id: Uuid) -> Result<ObjectiveProgress, AppError> {
        let objective = self.derive_one(self.find_or_404(space_id, id).await?).await?;
        let clock = self.clock();

        Ok(ObjectiveProgress {
            objective_id: objective.id,
            percent: objective_engine::get_progress(&objective),
            status: objective.status,
            current_value: objective.current_value,
            months: build_progress_grid(&objective, clock.now),
        })
    }

    pub async fn get_stats(&self, space_id: Uuid) -> Result<ObjectiveStats, AppError> {
        let objectives = self.list_objectives(space_id).await?;
        Ok(objective_engine::get_stats(&objectives))
    }

    // =========================================================================
    //  CONFIGURAÇÃO
    // =========================================================================

    pub async fn add_objective(&self, space_id: Uuid, mut input: NewObjective) -> Result<Objective, AppError> {
        dedup_sources(&mut input.data_sources);
        validate_config(input.value_type, input.target_value, input.is_commercial, &input.data_sources)?;

        let (leads, clients) = self.commercial_inputs(space_id, input.is_commercial).await?;
        let current_value = if input.is_commercial {
            objective_engine::compute_commercial_value(&input.data_sources, input.value_type, &leads, &clients)
        } else {
            Decimal::ZERO
        };
        let status = objective_engine::compute_status(current_value, input.target_value, input.deadline, &self.clock());

        let objective = self.repo.create(space_id, &input, current_value, status).await?;
        tracing::info!("Objetivo {} criado no space {}", objective.id, space_id);

        self.events.publish(EventKind::ObjectivesChanged, space_id);
        Ok(objective)
    }

    /// Edição parcial: junta com o que já existe e valida o resultado.
    pub async fn update_objective(
        &self,
        space_id: Uuid,
        id: Uuid,
        changes: ObjectiveChanges,
    ) -> Result<Objective, AppError> {
        let current = self.find_or_404(space_id, id).await?;

        let mut merged = apply_objective_changes(current, changes);
        dedup_sources(&mut merged.data_sources);
        validate_config(merged.value_type, merged.target_value, merged.is_commercial, &merged.data_sources)?;

        let derived = self.derive_one(merged).await?;
        let saved = self.repo.save(&derived).await?;

        self.events.publish(EventKind::ObjectivesChanged, space_id);
        Ok(saved)
    }

    pub async fn delete_objective(&self, space_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(space_id, id).await? {
            return Err(AppError::ObjectiveNotFound);
        }
        self.events.publish(EventKind::ObjectivesChanged, space_id);
        Ok(())
    }

    // =========================================================================
    //  LOGS MENSAIS
    // =========================================================================

    /// Registra o valor do mês. Se o mês já tem log, ele é substituído,
    /// então criar e editar um log são a mesma operação (PUT `/logs`).
    pub async fn add_progress_log(
        &self,
        space_id: Uuid,
        id: Uuid,
        month: i32,
        year: i32,
        value: Decimal,
        description: Option<&str>,
    ) -> Result<Objective, AppError> {
        let objective = self.find_or_404(space_id, id).await?;
        ensure_manual(&objective)?;

        // Log + snapshot juntos, ou nada
        let mut tx = self.repo.pool().begin().await?;

        let log = self
            .repo
            .upsert_log(&mut *tx, objective.id, month, year, value, description)
            .await?;
        let updated = objective_engine::apply_progress_log(objective, log, &self.clock());
        self.repo
            .save_snapshot(&mut *tx, updated.id, updated.current_value, updated.status)
            .await?;

        tx.commit().await?;

        self.events.publish(EventKind::ObjectivesChanged, space_id);
        Ok(updated)
    }

    pub async fn delete_progress_log(
        &self,
        space_id: Uuid,
        id: Uuid,
        month: i32,
        year: i32,
    ) -> Result<Objective, AppError> {
        let objective = self.find_or_404(space_id, id).await?;
        ensure_manual(&objective)?;

        let mut tx = self.repo.pool().begin().await?;

        if !self.repo.delete_log(&mut *tx, objective.id, month, year).await? {
            return Err(AppError::ProgressLogNotFound);
        }
        let updated = objective_engine::remove_progress_log(objective, month, year, &self.clock());
        self.repo
            .save_snapshot(&mut *tx, updated.id, updated.current_value, updated.status)
            .await?;

        tx.commit().await?;

        self.events.publish(EventKind::ObjectivesChanged, space_id);
        Ok(updated)
    }

    // =========================================================================
    //  SNAPSHOT DOS COMERCIAIS
    // =========================================================================

    /// Regrava valor/status dos objetivos comerciais do space. Retorna
    /// quantos snapshots mudaram.
    pub async fn refresh_commercial_snapshots(&self, space_id: Uuid) -> Result<usize, AppError> {
        let objectives = self.repo.list(space_id).await?;
        if !objectives.iter().any(|o| o.is_commercial) {
            return Ok(0);
        }
        let (leads, clients) = self.commercial_inputs(space_id, true).await?;
        let clock = self.clock();

        let mut changed = 0;
        for objective in objectives.into_iter().filter(|o| o.is_commercial) {
            let (old_value, old_status) = (objective.current_value, objective.status);
            let derived = objective_engine::derive_objective(objective, &leads, &clients, &clock);

            if derived.current_value != old_value || derived.status != old_status {
                self.repo
                    .save_snapshot(self.repo.pool(), derived.id, derived.current_value, derived.status)
                    .await?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Assina mudanças de leads/clientes e mantém o snapshot em dia.
    pub fn spawn_snapshot_refresher(&self) -> JoinHandle<()> {
        let service = self.clone();
        self.events.subscribe(
            &[EventKind::LeadsChanged, EventKind::ClientsChanged],
            move |event| {
                let service = service.clone();
                async move {
                    match service.refresh_commercial_snapshots(event.space_id).await {
                        Ok(0) => {}
                        Ok(n) => tracing::debug!("{} snapshots comerciais atualizados no space {}", n, event.space_id),
                        Err(e) => tracing::warn!("Falha ao atualizar snapshots do space {}: {}", event.space_id, e),
                    }
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::objective_engine::tests::objective;

    fn config_code(result: Result<(), AppError>) -> Option<&'static str> {
        match result {
            Err(AppError::InvalidObjectiveConfig(code)) => Some(code),
            Err(other) => panic!("erro inesperado: {other}"),
            Ok(()) => None,
        }
    }

    #[test]
    fn valid_manual_and_commercial_configs_pass() {
        assert!(validate_config(ValueType::Quantity, Decimal::from(10), false, &[]).is_ok());
        assert!(validate_config(ValueType::Percentage, Decimal::from(80), false, &[]).is_ok());
        assert!(validate_config(ValueType::Financial, Decimal::from(1000), true, &[DataSource::Crm]).is_ok());
    }

    #[test]
    fn target_must_be_positive() {
        let code = config_code(validate_config(ValueType::Quantity, Decimal::ZERO, false, &[]));
        assert_eq!(code, Some("target_must_be_positive"));

        let code = config_code(validate_config(ValueType::Quantity, Decimal::from(-1), false, &[]));
        assert_eq!(code, Some("target_must_be_positive"));
    }

    #[test]
    fn percentage_cannot_be_commercial() {
        let code = config_code(validate_config(
            ValueType::Percentage,
            Decimal::from(50),
            true,
            &[DataSource::Clients],
        ));
        assert_eq!(code, Some("percentage_not_commercial"));
    }

    #[test]
    fn commercial_needs_sources_and_manual_has_none() {
        let code = config_code(validate_config(ValueType::Financial, Decimal::from(50), true, &[]));
        assert_eq!(code, Some("commercial_requires_sources"));

        let code = config_code(validate_config(ValueType::Quantity, Decimal::from(50), false, &[DataSource::Crm]));
        assert_eq!(code, Some("manual_objective_has_sources"));
    }

    #[test]
    fn switching_to_manual_drops_old_sources() {
        let mut o = objective(ValueType::Financial, 1000);
        o.is_commercial = true;
        o.data_sources = vec![DataSource::Crm, DataSource::Clients];

        let merged = apply_objective_changes(
            o,
            ObjectiveChanges { is_commercial: Some(false), ..Default::default() },
        );
        assert!(!merged.is_commercial);
        assert!(merged.data_sources.is_empty());
        assert!(validate_config(merged.value_type, merged.target_value, false, &merged.data_sources).is_ok());
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let o = objective(ValueType::Quantity, 10);
        let deadline = o.deadline;

        let merged = apply_objective_changes(
            o,
            ObjectiveChanges { target_value: Some(Decimal::from(25)), ..Default::default() },
        );
        assert_eq!(merged.target_value, Decimal::from(25));
        assert_eq!(merged.deadline, deadline);
        assert_eq!(merged.value_type, ValueType::Quantity);
    }

    #[test]
    fn commercial_objectives_refuse_log_writes() {
        let mut o = objective(ValueType::Financial, 1000);
        assert!(ensure_manual(&o).is_ok());

        o.is_commercial = true;
        o.data_sources = vec![DataSource::Crm];
        assert!(matches!(ensure_manual(&o), Err(AppError::CommercialObjectiveLog)));
    }

    #[test]
    fn null_description_is_cleared() {
        let mut o = objective(ValueType::Quantity, 10);
        o.description = Some("meta antiga".into());

        let merged = apply_objective_changes(
            o,
            ObjectiveChanges { description: Some(None), ..Default::default() },
        );
        assert_eq!(merged.description, None);
    }

    #[test]
    fn duplicated_sources_are_collapsed() {
        let mut sources = vec![DataSource::Crm, DataSource::Clients, DataSource::Crm];
        dedup_sources(&mut sources);
        assert_eq!(sources, vec![DataSource::Crm, DataSource::Clients]);
    }
}

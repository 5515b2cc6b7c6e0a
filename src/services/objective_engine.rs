// src/services/objective_engine.rs
//
// Motor de objetivos: valor atual (manual ou comercial), % de progresso e
// status (no ritmo / em risco / atrasado).
//
// Tudo aqui é função pura. Nada lê o banco, nada retorna erro: este código
// roda em toda leitura de objetivo e não pode falhar. Denominadores zerados
// caem num status fixo (OnTrack) em vez de explodir.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    client::{Client, ClientStatus},
    lead::{Lead, LeadStage},
    objective::{DataSource, Objective, ObjectiveStats, ObjectiveStatus, ProgressLog, ValueType},
};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;
// Folga (em pontos percentuais) abaixo do ritmo esperado
const ON_TRACK_SLACK: Decimal = Decimal::TEN;
const AT_RISK_SLACK: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// O "relógio" do planejamento.
///
/// `reference_epoch` é o início fixo do ano de planejamento (configurado),
/// NÃO a data de criação do objetivo. O ritmo esperado de todo objetivo é
/// medido a partir dessa âncora.
#[derive(Debug, Clone, Copy)]
pub struct PlanningClock {
    pub reference_epoch: NaiveDate,
    pub now: DateTime<Utc>,
}

impl PlanningClock {
    pub fn new(reference_epoch: NaiveDate, now: DateTime<Utc>) -> Self {
        Self { reference_epoch, now }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =========================================================================
//  1. VALOR COMERCIAL (CRM + CLIENTES)
// =========================================================================

/// Valor atual de um objetivo comercial, calculado ao vivo.
///
/// - `crm`: leads ganhos (soma do valor ou contagem)
/// - `clients`: clientes ativos (soma da mensalidade ou contagem)
///
/// As fontes são somadas. `Percentage` não tem contribuição definida e
/// soma zero (a validação já impede essa combinação).
pub fn compute_commercial_value(
    data_sources: &[DataSource],
    value_type: ValueType,
    leads: &[Lead],
    clients: &[Client],
) -> Decimal {
    let mut total = Decimal::ZERO;

    if data_sources.contains(&DataSource::Crm) {
        let won = leads.iter().filter(|l| l.stage == LeadStage::Won);
        total += match value_type {
            ValueType::Financial => won.map(|l| l.value).sum(),
            ValueType::Quantity => Decimal::from(won.count()),
            ValueType::Percentage => Decimal::ZERO,
        };
    }

    if data_sources.contains(&DataSource::Clients) {
        let active = clients.iter().filter(|c| c.status == ClientStatus::Active);
        total += match value_type {
            ValueType::Financial => active.map(|c| c.monthly_value).sum(),
            ValueType::Quantity => Decimal::from(active.count()),
            ValueType::Percentage => Decimal::ZERO,
        };
    }

    total
}

// =========================================================================
//  2. STATUS
// =========================================================================

/// `current / target * 100`, sem teto. `None` se o alvo não for positivo.
pub fn progress_pct(current: Decimal, target: Decimal) -> Option<Decimal> {
    if target <= Decimal::ZERO {
        return None;
    }
    current.checked_mul(ONE_HUNDRED)?.checked_div(target)
}

/// Quanto do prazo (em %) já passou, contado a partir da âncora do ano.
///
/// Prazo degenerado (`deadline <= reference_epoch`): 100% a partir do
/// prazo, `None` antes disso.
pub fn expected_pct(deadline: NaiveDate, clock: &PlanningClock) -> Option<Decimal> {
    let start = start_of_day(clock.reference_epoch);
    let end = start_of_day(deadline);

    let total = (end - start).num_seconds();
    if total <= 0 {
        return (clock.now >= end).then_some(ONE_HUNDRED);
    }

    let elapsed = (clock.now - start).num_seconds();
    Decimal::from(elapsed)
        .checked_mul(ONE_HUNDRED)?
        .checked_div(Decimal::from(total))
}

fn classify(progress: Decimal, expected: Decimal) -> ObjectiveStatus {
    if progress >= expected - ON_TRACK_SLACK {
        ObjectiveStatus::OnTrack
    } else if progress >= expected - AT_RISK_SLACK {
        ObjectiveStatus::AtRisk
    } else {
        ObjectiveStatus::Behind
    }
}

pub fn compute_status(
    current: Decimal,
    target: Decimal,
    deadline: NaiveDate,
    clock: &PlanningClock,
) -> ObjectiveStatus {
    let (Some(progress), Some(expected)) = (progress_pct(current, target), expected_pct(deadline, clock))
    else {
        return ObjectiveStatus::OnTrack;
    };
    classify(progress, expected)
}

// =========================================================================
//  3. LOGS MENSAIS
// =========================================================================

/// Valor acumulado pelos logs: soma para `Quantity`, último log
/// (ano desc, mês desc) para `Financial`/`Percentage`. Sem logs = 0.
pub fn value_from_logs(value_type: ValueType, logs: &[ProgressLog]) -> Decimal {
    match value_type {
        ValueType::Quantity => logs.iter().map(|l| l.value).sum(),
        ValueType::Financial | ValueType::Percentage => logs
            .iter()
            .max_by_key(|l| (l.year, l.month))
            .map(|l| l.value)
            .unwrap_or(Decimal::ZERO),
    }
}

// Recalcula valor e status a partir dos logs. Objetivos comerciais ignoram
// os logs e mantêm o valor que já têm (a leitura rederiva pelo CRM).
fn refresh(mut objective: Objective, clock: &PlanningClock) -> Objective {
    if !objective.is_commercial {
        objective.current_value = value_from_logs(objective.value_type, &objective.progress_logs);
    }
    objective.status = compute_status(
        objective.current_value,
        objective.target_value,
        objective.deadline,
        clock,
    );
    objective
}

/// Upsert do log por (mês, ano) e recálculo do objetivo.
pub fn apply_progress_log(mut objective: Objective, log: ProgressLog, clock: &PlanningClock) -> Objective {
    match objective
        .progress_logs
        .iter_mut()
        .find(|l| l.month == log.month && l.year == log.year)
    {
        Some(existing) => *existing = log,
        None => objective.progress_logs.push(log),
    }
    objective.progress_logs.sort_by_key(|l| (l.year, l.month));

    refresh(objective, clock)
}

/// Remove o log de (mês, ano), se existir, e recalcula.
pub fn remove_progress_log(mut objective: Objective, month: i32, year: i32, clock: &PlanningClock) -> Objective {
    objective
        .progress_logs
        .retain(|l| !(l.month == month && l.year == year));

    refresh(objective, clock)
}

// =========================================================================
//  4. LEITURA (PROJEÇÃO)
// =========================================================================

/// Projeção usada em toda leitura: comerciais a partir dos leads/clientes
/// atuais, manuais a partir dos logs. Nunca é persistida como verdade.
pub fn derive_objective(
    mut objective: Objective,
    leads: &[Lead],
    clients: &[Client],
    clock: &PlanningClock,
) -> Objective {
    if objective.is_commercial {
        objective.current_value =
            compute_commercial_value(&objective.data_sources, objective.value_type, leads, clients);
    }
    refresh(objective, clock)
}

/// Percentual inteiro (arredondado) para a barra de progresso. Sem teto:
/// quem desenha a barra é que limita em 100.
pub fn get_progress(objective: &Objective) -> i64 {
    progress_pct(objective.current_value, objective.target_value)
        .map(|p| p.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|p| p.to_i64())
        .unwrap_or(0)
}

pub fn get_stats(objectives: &[Objective]) -> ObjectiveStats {
    objectives
        .iter()
        .fold(ObjectiveStats::default(), |mut stats, o| {
            stats.total += 1;
            match o.status {
                ObjectiveStatus::OnTrack => stats.on_track += 1,
                ObjectiveStatus::AtRisk => stats.at_risk += 1,
                ObjectiveStatus::Behind => stats.behind += 1,
            }
            stats
        })
}

// src/services/stage_automation.rs
//
// Automação do funil: lead parado em "proposal" por mais de N horas vai
// sozinho para "followup". Não é orientado a eventos; é polling puro.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        events::{EventBus, EventKind},
    },
    models::lead::{Lead, LeadStage},
};

/// O pedaço do repositório de leads que a automação usa.
#[async_trait]
pub trait LeadStageStore: Send + Sync {
    /// Todos os leads (de todos os spaces) num estágio.
    async fn list_in_stage(&self, stage: LeadStage) -> Result<Vec<Lead>, AppError>;

    /// Move o lead, carimbando `stage_changed_at = at` e `last_contact = at`.
    async fn move_to_stage(&self, lead_id: Uuid, stage: LeadStage, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub examined: usize,
    pub moved: usize,
    pub failed: usize,
}

pub fn is_stale(lead: &Lead, now: DateTime<Utc>, threshold: TimeDelta) -> bool {
    lead.stage == LeadStage::Proposal && now - lead.stage_changed_at >= threshold
}

pub struct StageAutomation<S> {
    store: S,
    events: EventBus,
    threshold: TimeDelta,
    poll_every: Duration,
}

impl<S: LeadStageStore + 'static> StageAutomation<S> {
    pub fn new(store: S, events: EventBus, threshold_hours: i64, poll_every: Duration) -> Self {
        Self {
            store,
            events,
            threshold: TimeDelta::hours(threshold_hours),
            poll_every,
        }
    }

    /// Uma passada. Cada transição é independente: se uma falhar, as outras
    /// seguem, e o lead que falhou continua em "proposal" para a próxima.
    /// No fim sai um `LeadsChanged` por space que teve lead movido.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport, AppError> {
        let proposals = self.store.list_in_stage(LeadStage::Proposal).await?;

        let mut report = TickReport {
            examined: proposals.len(),
            ..TickReport::default()
        };
        let mut touched_spaces = HashSet::new();

        for lead in proposals.iter().filter(|l| is_stale(l, now, self.threshold)) {
            match self.store.move_to_stage(lead.id, LeadStage::Followup, now).await {
                Ok(()) => {
                    report.moved += 1;
                    tracing::info!("⏩ Lead {} movido de proposal para followup", lead.id);
                    touched_spaces.insert(lead.space_id);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Falha ao mover lead {} para followup: {}", lead.id, e);
                }
            }
        }

        for space_id in touched_spaces {
            self.events.publish(EventKind::LeadsChanged, space_id);
        }

        Ok(report)
    }

    /// Roda uma vez já (o primeiro tick do `interval` é imediato) e depois a
    /// cada `poll_every`, enquanto o processo viver.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "Automação de estágios iniciada (limite {}h, a cada {:?})",
                self.threshold.num_hours(),
                self.poll_every
            );
            let mut ticker = tokio::time::interval(self.poll_every);

            loop {
                ticker.tick().await;
                match self.run_tick(Utc::now()).await {
                    Ok(report) if report.moved > 0 || report.failed > 0 => {
                        tracing::info!(
                            "Automação: {} examinados, {} movidos, {} falhas",
                            report.examined,
                            report.moved,
                            report.failed
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Erro ao carregar leads para a automação: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::objective_engine::tests::lead;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryStore {
        leads: Mutex<Vec<Lead>>,
        failing: Mutex<HashSet<Uuid>>,
    }

    #[async_trait]
    impl LeadStageStore for MemoryStore {
        async fn list_in_stage(&self, stage: LeadStage) -> Result<Vec<Lead>, AppError> {
            let leads = self.leads.lock().unwrap();
            Ok(leads.iter().filter(|l| l.stage == stage).cloned().collect())
        }

        async fn move_to_stage(&self, lead_id: Uuid, stage: LeadStage, at: DateTime<Utc>) -> Result<(), AppError> {
            if self.failing.lock().unwrap().contains(&lead_id) {
                return Err(AppError::InternalServerError(anyhow::anyhow!("conexão caiu")));
            }
            let mut leads = self.leads.lock().unwrap();
            let lead = leads.iter_mut().find(|l| l.id == lead_id).ok_or(AppError::LeadNotFound)?;
            lead.stage = stage;
            lead.stage_changed_at = at;
            lead.last_contact = Some(at.date_naive());
            Ok(())
        }
    }

    /// Só conta as consultas; com `down` ligado a consulta falha.
    #[derive(Clone, Default)]
    struct CountingStore {
        listings: Arc<AtomicUsize>,
        down: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LeadStageStore for CountingStore {
        async fn list_in_stage(&self, _stage: LeadStage) -> Result<Vec<Lead>, AppError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(AppError::InternalServerError(anyhow::anyhow!("banco fora do ar")));
            }
            Ok(Vec::new())
        }

        async fn move_to_stage(&self, _lead_id: Uuid, _stage: LeadStage, _at: DateTime<Utc>) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn proposal_since(now: DateTime<Utc>, hours: i64) -> Lead {
        let mut l = lead(LeadStage::Proposal, 1000);
        l.stage_changed_at = now - TimeDelta::hours(hours);
        l
    }

    fn automation(store: MemoryStore) -> StageAutomation<MemoryStore> {
        StageAutomation::new(store, EventBus::new(16), 48, Duration::from_secs(60))
    }

    fn stage_of(store: &MemoryStore, id: Uuid) -> LeadStage {
        store.leads.lock().unwrap().iter().find(|l| l.id == id).unwrap().stage
    }

    #[test]
    fn staleness_needs_proposal_stage_and_threshold() {
        let now = Utc::now();
        let threshold = TimeDelta::hours(48);

        assert!(is_stale(&proposal_since(now, 49), now, threshold));
        assert!(is_stale(&proposal_since(now, 48), now, threshold));
        assert!(!is_stale(&proposal_since(now, 10), now, threshold));

        let mut negotiating = proposal_since(now, 100);
        negotiating.stage = LeadStage::Negotiation;
        assert!(!is_stale(&negotiating, now, threshold));
    }

    #[tokio::test]
    async fn stale_proposal_moves_to_followup() {
        let now = Utc::now();
        let old = proposal_since(now, 49);
        let fresh = proposal_since(now, 10);
        let (old_id, fresh_id) = (old.id, fresh.id);

        let store = MemoryStore::default();
        store.leads.lock().unwrap().extend([old, fresh]);
        let automation = automation(store);

        let report = automation.run_tick(now).await.unwrap();
        assert_eq!(report, TickReport { examined: 2, moved: 1, failed: 0 });
        assert_eq!(stage_of(&automation.store, old_id), LeadStage::Followup);
        assert_eq!(stage_of(&automation.store, fresh_id), LeadStage::Proposal);

        let leads = automation.store.leads.lock().unwrap();
        let moved = leads.iter().find(|l| l.id == old_id).unwrap();
        assert_eq!(moved.stage_changed_at, now);
        assert_eq!(moved.last_contact, Some(now.date_naive()));
    }

    #[tokio::test]
    async fn second_tick_is_a_no_op() {
        let now = Utc::now();
        let store = MemoryStore::default();
        store.leads.lock().unwrap().push(proposal_since(now, 72));
        let automation = automation(store);

        assert_eq!(automation.run_tick(now).await.unwrap().moved, 1);
        let again = automation.run_tick(now).await.unwrap();
        assert_eq!(again, TickReport { examined: 0, moved: 0, failed: 0 });
    }

    #[tokio::test]
    async fn failed_transition_does_not_block_others_and_retries() {
        let now = Utc::now();
        let broken = proposal_since(now, 60);
        let healthy = proposal_since(now, 60);
        let (broken_id, healthy_id) = (broken.id, healthy.id);

        let store = MemoryStore::default();
        store.leads.lock().unwrap().extend([broken, healthy]);
        store.failing.lock().unwrap().insert(broken_id);
        let automation = automation(store);

        let report = automation.run_tick(now).await.unwrap();
        assert_eq!(report, TickReport { examined: 2, moved: 1, failed: 1 });
        assert_eq!(stage_of(&automation.store, healthy_id), LeadStage::Followup);
        assert_eq!(stage_of(&automation.store, broken_id), LeadStage::Proposal);

        // a escrita volta a funcionar: o próximo tick pega o que sobrou
        automation.store.failing.lock().unwrap().clear();
        let retry = automation.run_tick(now).await.unwrap();
        assert_eq!(retry, TickReport { examined: 1, moved: 1, failed: 0 });
        assert_eq!(stage_of(&automation.store, broken_id), LeadStage::Followup);
    }

    #[tokio::test]
    async fn moved_lead_publishes_leads_changed() {
        let now = Utc::now();
        let mut stale = proposal_since(now, 50);
        stale.space_id = Uuid::new_v4();
        let space_id = stale.space_id;

        let store = MemoryStore::default();
        store.leads.lock().unwrap().push(stale);
        let bus = EventBus::new(16);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _listener = bus.subscribe(&[EventKind::LeadsChanged], move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event.space_id);
            }
        });

        let automation = StageAutomation::new(store, bus, 48, Duration::from_secs(60));
        automation.run_tick(now).await.unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(seen, Some(space_id));
    }

    #[tokio::test]
    async fn one_event_per_space_per_tick() {
        let now = Utc::now();
        let (space_a, space_b) = (Uuid::new_v4(), Uuid::new_v4());

        let mut leads = Vec::new();
        for space_id in [space_a, space_a, space_a, space_b] {
            let mut l = proposal_since(now, 72);
            l.space_id = space_id;
            leads.push(l);
        }

        let store = MemoryStore::default();
        store.leads.lock().unwrap().extend(leads);
        let bus = EventBus::new(16);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _listener = bus.subscribe(&[EventKind::LeadsChanged], move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event.space_id);
            }
        });

        let automation = StageAutomation::new(store, bus, 48, Duration::from_secs(60));
        assert_eq!(automation.run_tick(now).await.unwrap().moved, 4);

        let mut seen = Vec::new();
        for _ in 0..2 {
            let space = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
            seen.extend(space);
        }
        seen.sort();
        let mut expected = vec![space_a, space_b];
        expected.sort();
        assert_eq!(seen, expected);

        // nada além de um evento por space
        let extra = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn nothing_moved_publishes_nothing() {
        let now = Utc::now();
        let store = MemoryStore::default();
        store.leads.lock().unwrap().push(proposal_since(now, 5));
        let bus = EventBus::new(16);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _listener = bus.subscribe(&[EventKind::LeadsChanged], move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event.space_id);
            }
        });

        let automation = StageAutomation::new(store, bus, 48, Duration::from_secs(60));
        assert_eq!(automation.run_tick(now).await.unwrap().moved, 0);
        assert!(tokio::time::timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn spawned_loop_ticks_at_start_and_keeps_polling() {
        let store = CountingStore::default();
        let listings = store.listings.clone();
        // consulta falhando desde o começo: o laço tem que sobreviver ao erro
        store.down.store(true, Ordering::SeqCst);

        let handle = StageAutomation::new(store, EventBus::new(16), 48, Duration::from_millis(50)).spawn();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(listings.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(listings.load(Ordering::SeqCst) >= 3);
        assert!(!handle.is_finished());

        handle.abort();
    }
}

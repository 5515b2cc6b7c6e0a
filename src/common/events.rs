// src/common/events.rs
//
// Barramento de eventos por space ("os leads deste space mudaram", etc.).
// Quem publica não sabe quem escuta; quem escuta decide o que recalcular.
// O motor de objetivos não assina nada: ele é puro.

use std::future::Future;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LeadsChanged,
    ClientsChanged,
    ObjectivesChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceEvent {
    pub kind: EventKind,
    pub space_id: Uuid,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SpaceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Dispara e esquece. Sem ninguém escutando, o evento é descartado.
    pub fn publish(&self, kind: EventKind, space_id: Uuid) {
        let _ = self.tx.send(SpaceEvent { kind, space_id });
    }

    /// Registra um handler para os tipos de evento informados. O handler
    /// roda numa task própria até o barramento ser fechado.
    pub fn subscribe<F, Fut>(&self, kinds: &[EventKind], handler: F) -> JoinHandle<()>
    where
        F: Fn(SpaceEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let kinds = kinds.to_vec();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if kinds.contains(&event.kind) => handler(event).await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Assinante atrasado, {} eventos descartados", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn handler_only_sees_subscribed_kinds() {
        let bus = EventBus::new(16);
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        let _task = bus.subscribe(&[EventKind::LeadsChanged], move |event| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(event);
            }
        });

        let space = Uuid::new_v4();
        bus.publish(EventKind::ClientsChanged, space);
        bus.publish(EventKind::LeadsChanged, space);

        let event = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, SpaceEvent { kind: EventKind::LeadsChanged, space_id: space });

        // o ClientsChanged foi filtrado
        assert!(
            tokio::time::timeout(Duration::from_millis(50), seen_rx.recv())
                .await
                .is_err()
        );
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.publish(EventKind::ObjectivesChanged, Uuid::new_v4());
    }
}

// src/config.rs

use anyhow::{anyhow, Context};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::{error::I18nStore, events::EventBus},
    db::{ClientRepository, LeadRepository, ObjectiveRepository, SpaceRepository, UserRepository},
    services::{
        auth::AuthService, client_service::ClientService, lead_service::LeadService,
        objective_service::ObjectiveService, space_service::SpaceService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_THRESHOLD_HOURS: i64 = 48;
const DEFAULT_POLL_SECS: u64 = 300;

// Configurações lidas do ambiente (.env)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    // Âncora fixa do ano de planejamento (início do "relógio" dos objetivos)
    pub reference_epoch: NaiveDate,
    pub stage_threshold_hours: i64,
    pub stage_poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado do `from_env` para dar pra testar sem mexer no ambiente
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());

        let reference_epoch = match lookup("OBJECTIVES_REFERENCE_EPOCH") {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .with_context(|| format!("OBJECTIVES_REFERENCE_EPOCH inválida: '{}'", raw))?,
            None => NaiveDate::from_ymd_opt(Utc::now().year(), 1, 1)
                .ok_or_else(|| anyhow!("ano corrente fora do intervalo suportado"))?,
        };

        let stage_threshold_hours = match lookup("STAGE_AUTOMATION_THRESHOLD_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| anyhow!("STAGE_AUTOMATION_THRESHOLD_HOURS inválido: '{}'", raw))?,
            None => DEFAULT_THRESHOLD_HOURS,
        };

        let poll_secs = match lookup("STAGE_AUTOMATION_POLL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| anyhow!("STAGE_AUTOMATION_POLL_SECS inválido: '{}'", raw))?,
            None => DEFAULT_POLL_SECS,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr,
            reference_epoch,
            stage_threshold_hours,
            stage_poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub events: EventBus,

    pub auth_service: AuthService,
    pub space_service: SpaceService,
    pub lead_service: LeadService,
    pub client_service: ClientService,
    pub objective_service: ObjectiveService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let events = EventBus::new(256);

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let space_repo = SpaceRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let objective_repo = ObjectiveRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone());
        let space_service = SpaceService::new(space_repo, user_repo, db_pool.clone());
        let lead_service = LeadService::new(lead_repo.clone(), events.clone());
        let client_service = ClientService::new(client_repo.clone(), events.clone());
        let objective_service = ObjectiveService::new(
            objective_repo,
            lead_repo,
            client_repo,
            events.clone(),
            config.reference_epoch,
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::default()),
            events,
            auth_service,
            space_service,
            lead_service,
            client_service,
            objective_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [("DATABASE_URL", "postgres://localhost/crm"), ("JWT_SECRET", "s3cr3t")];

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.server_addr, DEFAULT_SERVER_ADDR);
        assert_eq!(config.stage_threshold_hours, 48);
        assert_eq!(config.stage_poll_interval, Duration::from_secs(300));
        assert_eq!(config.reference_epoch.month(), 1);
        assert_eq!(config.reference_epoch.day(), 1);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("OBJECTIVES_REFERENCE_EPOCH", "2024-07-01"),
            ("STAGE_AUTOMATION_THRESHOLD_HOURS", "24"),
            ("STAGE_AUTOMATION_POLL_SECS", "30"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.reference_epoch, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(config.stage_threshold_hours, 24);
        assert_eq!(config.stage_poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]));
        assert!(result.is_err());
    }

    #[test]
    fn garbage_values_are_rejected() {
        for (key, value) in [
            ("OBJECTIVES_REFERENCE_EPOCH", "01/01/2025"),
            ("STAGE_AUTOMATION_THRESHOLD_HOURS", "-3"),
            ("STAGE_AUTOMATION_POLL_SECS", "zero"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err(), "{key} deveria falhar");
        }
    }
}

//! Service status report

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ai::{AIBackend, AIClient};
use crate::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Operational,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub status: ServiceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServiceStatus {
    fn new(name: &'static str, healthy: bool, detail: Option<String>) -> Self {
        Self {
            name,
            status: if healthy {
                ServiceState::Operational
            } else {
                ServiceState::Degraded
            },
            detail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub services: Vec<ServiceStatus>,
    pub checked_at: DateTime<Utc>,
}

impl StatusReport {
    /// Check the database and prediction backend; the rest are up if we are
    pub async fn collect(db: &Database, ai: Option<&AIClient>, auth_enabled: bool) -> Self {
        let db_detail = db.ping().err().map(|e| e.to_string());

        let (ai_healthy, ai_detail) = match ai {
            Some(client) => {
                let info = client.info();
                let healthy = client.health_check().await;
                (healthy, Some(format!("{} {} at {}", info.backend, info.model, info.host)))
            }
            None => (false, Some("no prediction backend configured".to_string())),
        };

        let auth_detail = (!auth_enabled).then(|| "token checks disabled".to_string());

        Self {
            services: vec![
                ServiceStatus::new("Web Application", true, None),
                ServiceStatus::new("API Services", true, None),
                ServiceStatus::new("Database", db_detail.is_none(), db_detail),
                ServiceStatus::new("Authentication Services", auth_enabled, auth_detail),
                ServiceStatus::new("AI Forecasting", ai_healthy, ai_detail),
            ],
            checked_at: Utc::now(),
        }
    }

    pub fn all_operational(&self) -> bool {
        self.services
            .iter()
            .all(|s| s.status == ServiceState::Operational)
    }
}

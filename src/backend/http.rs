use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use ureq::Agent;

use crate::config::BackendSettings;
use crate::filter::FilterCriteria;
use crate::report::{MoveId, PartnerChoice, ReportPayload};

use super::{Backend, BackendError, BackendResult, SessionId, MOVE_MODEL, REPORT_MODEL};

/// RPC client for the host accounting backend: one JSON envelope per call,
/// posted to the configured endpoint.
pub struct HttpBackend {
    agent: Agent,
    endpoint: String,
    database: Option<String>,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    model: &'a str,
    method: &'a str,
    args: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Deserialize)]
struct RpcFault {
    message: String,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            endpoint: format!("{}/rpc", settings.url.trim_end_matches('/')),
            database: settings.database.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    fn call<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: serde_json::Value,
    ) -> BackendResult<T> {
        tracing::debug!(model, method, "rpc call");

        let request = RpcRequest {
            model,
            method,
            args,
            database: self.database.as_deref(),
        };
        let body = serde_json::to_string(&request)?;

        let mut pending = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            pending = pending.header("X-Api-Key", key);
        }

        let mut response = pending.send(body.as_str())?;
        let text = response.body_mut().read_to_string()?;

        let parsed: RpcResponse<T> = serde_json::from_str(&text)?;
        if let Some(fault) = parsed.error {
            return Err(BackendError::Rpc(fault.message));
        }
        parsed.result.ok_or(BackendError::EmptyResult)
    }
}

impl Backend for HttpBackend {
    fn create(&self) -> BackendResult<SessionId> {
        self.call(REPORT_MODEL, "create", json!([{}]))
    }

    fn write(&self, session: SessionId, criteria: &FilterCriteria) -> BackendResult<()> {
        let acknowledged: bool = self.call(REPORT_MODEL, "write", json!([session, criteria]))?;
        if acknowledged {
            Ok(())
        } else {
            Err(BackendError::Rpc("write not acknowledged".to_string()))
        }
    }

    fn view_report(&self, session: SessionId) -> BackendResult<ReportPayload> {
        self.call(REPORT_MODEL, "view_report", json!([[session]]))
    }

    fn get_partners(&self) -> BackendResult<Vec<PartnerChoice>> {
        self.call(REPORT_MODEL, "get_partners", json!([]))
    }

    fn lookup_move(&self, id: MoveId) -> BackendResult<Option<MoveId>> {
        #[derive(Deserialize)]
        struct Record {
            id: MoveId,
        }

        let records: Vec<Record> = self.call(
            MOVE_MODEL,
            "search_read",
            json!([[["id", "=", id]], ["id"], 1]),
        )?;
        Ok(records.into_iter().next().map(|record| record.id))
    }
}

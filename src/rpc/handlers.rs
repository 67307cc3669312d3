use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::utils::{LedgerError, Result};
use crate::voting::{
    BlockchainStats, CastVoteRequest, CastVoteResponse, VoteService, VoteVerification,
};

/// JSON-RPC 2.0 error codes used by this service.
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// Raw cast request as it arrives; every field is optional until validated.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVotePayload {
    pub voter_id: Option<String>,
    pub candidate_id: Option<String>,
    pub election_id: Option<String>,
}

impl CastVotePayload {
    pub fn validate(self) -> Result<CastVoteRequest> {
        Ok(CastVoteRequest {
            voter_id: required("voterId", self.voter_id)?,
            candidate_id: required("candidateId", self.candidate_id)?,
            election_id: required("electionId", self.election_id)?,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyVotePayload {
    pub blockchain_hash: Option<String>,
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    // ids are hashed verbatim, so blank is rejected but nothing is normalized
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LedgerError::Validation(format!("missing required field {}", field))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Caller boundary over `VoteService`. Malformed requests stop here as validation errors.
#[derive(Clone)]
pub struct RpcHandler {
    service: Arc<VoteService>,
}

impl RpcHandler {
    pub fn new(service: Arc<VoteService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<VoteService> {
        &self.service
    }

    pub async fn cast_vote(&self, payload: CastVotePayload) -> Result<CastVoteResponse> {
        let request = payload.validate()?;
        Ok(self.service.cast_vote(&request).await)
    }

    pub fn verify_vote(&self, payload: VerifyVotePayload) -> Result<Option<VoteVerification>> {
        let hash = required("blockchainHash", payload.blockchain_hash)?;
        Ok(self.service.verify_vote(&hash))
    }

    pub fn stats(&self) -> BlockchainStats {
        self.service.blockchain_stats()
    }

    /// JSON-RPC method dispatch. `params` may be an object or a one-element array.
    pub async fn dispatch(&self, method: &str, params: Option<Value>) -> std::result::Result<Value, RpcError> {
        let params = match params {
            Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
            Some(v) => v,
            None => Value::Null,
        };

        match method {
            "cast_vote" => {
                let payload: CastVotePayload = parse_params(params)?;
                let resp = self.cast_vote(payload).await.map_err(invalid)?;
                to_value(&resp)
            }
            "verify_vote" => {
                let payload: VerifyVotePayload = parse_params(params)?;
                match self.verify_vote(payload).map_err(invalid)? {
                    Some(v) => to_value(&v),
                    None => Ok(Value::Null),
                }
            }
            "blockchain_stats" => to_value(&self.stats()),
            other => Err(RpcError::new(METHOD_NOT_FOUND, format!("method not found: {}", other))),
        }
    }
}

fn parse_params<T: DeserializeOwned + Default>(params: Value) -> std::result::Result<T, RpcError> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|e| RpcError::new(INVALID_PARAMS, format!("invalid params: {}", e)))
}

fn invalid(e: LedgerError) -> RpcError {
    RpcError::new(INVALID_PARAMS, e.to_string())
}

fn to_value<T: serde::Serialize>(v: &T) -> std::result::Result<Value, RpcError> {
    serde_json::to_value(v).map_err(|e| RpcError::new(PARSE_ERROR, e.to_string()))
}

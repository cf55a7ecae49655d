//! KYC data requests and callback validation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};
use thiserror::Error;
use tracing::debug;

/// Fields requested from the KYC provider, in the order it must return them.
pub const FIELDS: [&str; 12] = [
    "SH_DriverLicense_FULLNAME",
    "SH_DriverLicense_DOB",
    "SH_DriverLicense_ExpiryDate",
    "SH_DriverLicense_IssueDate",
    "SH_DriverLicense_DocumentNumber",
    "SH_DriverLicense_Gender",
    "SH_DriverLicense_Country",
    "SH_DriverLicense_DocumentImage",
    "SH_DriverLicense_FaceImage",
    "SH_DriverLicense_AdditionalProof",
    "SH_EMAIL",
    "SH_PHONE",
];

/// How long the provider may take to call back.
pub const REQUEST_TTL: Duration = Duration::from_secs(300);

/// Off-chain source of identity data.
#[async_trait]
pub trait KycProvider: Send + Sync {
    /// Ask the provider to collect [`FIELDS`] for `user` and post them to the callback.
    async fn request(&self, user: &str) -> eyre::Result<()>;
}

#[derive(Debug, Serialize)]
struct DataRequest<'a> {
    user: &'a str,
    names: &'a [&'a str],
    callback: &'a str,
    expiration: i64,
}

/// [`KycProvider`] talking to a Hydra request endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HydraKyc {
    request_url: String,
    callback_url: String,
    client: reqwest::Client,
}

impl HydraKyc {
    pub fn new(request_url: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            callback_url: callback_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl KycProvider for HydraKyc {
    async fn request(&self, user: &str) -> eyre::Result<()> {
        let request = DataRequest {
            user,
            names: &FIELDS,
            callback: &self.callback_url,
            expiration: chrono::Utc::now().timestamp() + REQUEST_TTL.as_secs() as i64,
        };

        let response = self
            .client
            .post(&self.request_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // The endpoint answers with an empty body on success
        if !status.is_success() {
            if body.is_empty() {
                eyre::bail!("{status}");
            }
            eyre::bail!("{body}");
        }
        if !body.is_empty() {
            eyre::bail!("{body}");
        }

        debug!(user, "Requested KYC data");
        Ok(())
    }
}

/// One requested field as delivered by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KycInfo {
    #[serde(rename = "field", default)]
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub pepper: String,
}

/// Body posted to `/api/callback`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KycCallback {
    pub user: String,
    #[serde(default)]
    pub infos: Vec<KycInfo>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CallbackError {
    #[error("expected 12 fields, got {0}")]
    FieldCount(usize),

    #[error("field {0} doesn't exist")]
    MissingField(&'static str),
}

impl KycCallback {
    /// Check that every requested field arrived, in order.
    pub fn validate(&self) -> Result<(), CallbackError> {
        if self.infos.len() != FIELDS.len() {
            return Err(CallbackError::FieldCount(self.infos.len()));
        }

        for (info, name) in self.infos.iter().zip(FIELDS) {
            if !info.fields.contains_key(name) {
                return Err(CallbackError::MissingField(name));
            }
        }

        Ok(())
    }

    /// A callback carrying every field for `user`.
    #[cfg(test)]
    pub(crate) fn complete(user: impl Into<String>) -> Self {
        let infos = FIELDS
            .iter()
            .map(|name| KycInfo {
                fields: HashMap::from([((*name).to_string(), String::new())]),
                pepper: String::new(),
            })
            .collect();

        Self {
            user: user.into(),
            infos,
        }
    }
}

//! Statusdb (CouchDB) access for the SNIC checker.
//!
//! The checker reads the `project/summary` view of the `projects` database,
//! decides per project whether the PI email needs verification, and writes
//! the verdict back into the project document.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::StatusDbConfig;

/// One row of the open-projects view. `value` carries the summary emitted
/// by the view, `doc` the full document when `include_docs` was requested.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    #[serde(default)]
    pub key: Value,
    pub value: Value,
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    rows: Vec<ProjectRow>,
}

/// What to do with one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckDecision {
    /// Nothing to verify, or already verified.
    Skip,
    /// A previous check came back negative; verify again.
    Recheck { email: String },
    /// Never checked before; verify and add the field.
    FirstCheck { email: String },
}

/// Classify a project summary.
///
/// Only GRUS-delivery projects are considered. A project whose
/// `snic_checked.status` is already true needs nothing; a false status is
/// re-verified; a project without the field gets its first check, provided
/// an order with a PI email exists.
pub fn evaluate_project(value: &Value) -> CheckDecision {
    if value.get("delivery_type").and_then(Value::as_str) != Some("GRUS") {
        return CheckDecision::Skip;
    }

    let pi_email = value
        .pointer("/order_details/fields/project_pi_email")
        .and_then(Value::as_str)
        .map(String::from);

    match value.pointer("/details/snic_checked") {
        Some(checked) => {
            if checked.get("status").and_then(Value::as_bool) == Some(true) {
                return CheckDecision::Skip;
            }
            match pi_email {
                Some(email) => CheckDecision::Recheck { email },
                None => CheckDecision::Skip,
            }
        }
        None => {
            if value.get("order_details").is_none() {
                return CheckDecision::Skip;
            }
            match pi_email {
                Some(email) => CheckDecision::FirstCheck { email },
                None => CheckDecision::Skip,
            }
        }
    }
}

/// Record a verification result on the full project document.
pub fn apply_snic_status(doc: &mut Value, status: bool) {
    doc["details"]["snic_checked"] = json!({ "status": status });
}

/// Thin HTTP client for the statusdb CouchDB instance.
pub struct StatusDbClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl StatusDbClient {
    pub fn new(config: &StatusDbConfig) -> Self {
        Self::with_base_url(
            format!("http://{}:{}", config.url, config.port),
            &config.username,
            &config.password,
        )
    }

    /// Point the client at an explicit base URL (tests, non-default ports).
    pub fn with_base_url(base_url: impl Into<String>, username: &str, password: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Fetch the open projects from the `project/summary` view, documents
    /// included.
    pub async fn open_projects(&self) -> Result<Vec<ProjectRow>> {
        let url = format!("{}/projects/_design/project/_view/summary", self.base_url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("include_docs", "true"),
                ("descending", "true"),
                ("startkey", r#"["open","Z"]"#),
                ("endkey", r#"["open",""]"#),
            ])
            .send()
            .await
            .context("statusdb request failed")?
            .error_for_status()
            .context("statusdb returned an error status")?;

        let view: ViewResponse = response
            .json()
            .await
            .context("failed to decode statusdb view response")?;

        debug!("Fetched {} open projects from statusdb", view.rows.len());
        Ok(view.rows)
    }

    /// Save a mutated project document back into the `projects` database.
    pub async fn save_project(&self, doc: &Value) -> Result<()> {
        let id = doc
            .get("_id")
            .and_then(Value::as_str)
            .context("project document has no _id")?;
        let url = format!("{}/projects/{}", self.base_url, id);

        self.http
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(doc)
            .send()
            .await
            .context("statusdb save request failed")?
            .error_for_status()
            .context("statusdb rejected the document update")?;

        Ok(())
    }
}

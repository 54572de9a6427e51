//! Stored analysis documents: aggregation results, risk assessments and
//! predictions returned by the external prediction service.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{now_rfc3339, parse_timestamp, Pool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    TrendAnalysis,
    RiskAssessment,
    PredictionModel,
    Clustering,
    AnomalyDetection,
    Predictive,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::TrendAnalysis => "trend_analysis",
            AnalysisType::RiskAssessment => "risk_assessment",
            AnalysisType::PredictionModel => "prediction_model",
            AnalysisType::Clustering => "clustering",
            AnalysisType::AnomalyDetection => "anomaly_detection",
            AnalysisType::Predictive => "predictive",
        }
    }
}

impl FromStr for AnalysisType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "trend_analysis" => AnalysisType::TrendAnalysis,
            "risk_assessment" => AnalysisType::RiskAssessment,
            "prediction_model" => AnalysisType::PredictionModel,
            "clustering" => AnalysisType::Clustering,
            "anomaly_detection" => AnalysisType::AnomalyDetection,
            "predictive" => AnalysisType::Predictive,
            other => anyhow::bail!("unknown analysis type {other:?}"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// Completed and failed analyses carry a completion timestamp.
    pub fn is_finished(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl FromStr for AnalysisStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "pending" => AnalysisStatus::Pending,
            "processing" => AnalysisStatus::Processing,
            "completed" => AnalysisStatus::Completed,
            "failed" => AnalysisStatus::Failed,
            other => anyhow::bail!("unknown analysis status {other:?}"),
        })
    }
}

/// Fields supplied when creating an analysis.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub name: String,
    pub analysis_type: AnalysisType,
    pub description: Option<String>,
    pub parameters: Value,
    pub results: Option<Value>,
    pub status: AnalysisStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub name: String,
    pub analysis_type: AnalysisType,
    pub description: Option<String>,
    pub parameters: Value,
    pub results: Option<Value>,
    pub status: AnalysisStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

struct AnalysisRow {
    id: String,
    name: String,
    analysis_type: String,
    description: Option<String>,
    parameters_json: String,
    results_json: Option<String>,
    status: String,
    created_by: String,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

impl AnalysisRow {
    const COLUMNS: &'static str = "id, name, analysis_type, description, parameters_json, \
         results_json, status, created_by, created_at, updated_at, completed_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            analysis_type: row.get(2)?,
            description: row.get(3)?,
            parameters_json: row.get(4)?,
            results_json: row.get(5)?,
            status: row.get(6)?,
            created_by: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            completed_at: row.get(10)?,
        })
    }

    fn into_analysis(self) -> Result<Analysis> {
        Ok(Analysis {
            id: Uuid::parse_str(&self.id)
                .with_context(|| format!("invalid analysis id {:?}", self.id))?,
            name: self.name,
            analysis_type: self.analysis_type.parse()?,
            description: self.description,
            parameters: serde_json::from_str(&self.parameters_json)
                .context("stored analysis parameters are not valid JSON")?,
            results: self
                .results_json
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .context("stored analysis results are not valid JSON")?,
            status: self.status.parse()?,
            created_by: self.created_by,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            completed_at: self.completed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[derive(Clone)]
pub struct AnalysisStore {
    pool: Pool,
}

impl AnalysisStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn create(&self, new: NewAnalysis, created_by: &str) -> Result<Analysis> {
        let id = Uuid::new_v4();
        let now = now_rfc3339();
        let completed_at = new.status.is_finished().then(|| now.clone());
        let results_json = new.results.as_ref().map(serde_json::to_string).transpose()?;

        {
            let conn = self.pool.get()?;
            conn.execute(
                "INSERT INTO analyses (
                    id, name, analysis_type, description, parameters_json,
                    results_json, status, created_by, created_at, updated_at, completed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10)",
                params![
                    id.to_string(),
                    new.name,
                    new.analysis_type.as_str(),
                    new.description,
                    serde_json::to_string(&new.parameters)?,
                    results_json,
                    new.status.as_str(),
                    created_by,
                    now,
                    completed_at,
                ],
            )
            .context("Failed to insert analysis")?;
        }

        info!(
            %id,
            kind = new.analysis_type.as_str(),
            status = new.status.as_str(),
            "analysis created"
        );
        self.get(id)?
            .ok_or_else(|| anyhow::anyhow!("analysis {id} vanished after insert"))
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM analyses WHERE id = ?1", AnalysisRow::COLUMNS),
                params![id.to_string()],
                AnalysisRow::from_row,
            )
            .optional()?;

        row.map(AnalysisRow::into_analysis).transpose()
    }

    /// All analyses created by `owner`, newest first.
    pub fn list_for(&self, owner: &str) -> Result<Vec<Analysis>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analyses WHERE created_by = ?1 ORDER BY created_at DESC, rowid DESC",
            AnalysisRow::COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![owner], AnalysisRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(AnalysisRow::into_analysis).collect()
    }

    /// Attach results and a new status. `None` if the analysis does not exist.
    pub fn record_results(
        &self,
        id: Uuid,
        results: &Value,
        status: AnalysisStatus,
    ) -> Result<Option<Analysis>> {
        let now = now_rfc3339();
        let completed_at = status.is_finished().then(|| now.clone());
        let changed = {
            let conn = self.pool.get()?;
            conn.execute(
                "UPDATE analyses
                 SET results_json = ?1, status = ?2, updated_at = ?3, completed_at = ?4
                 WHERE id = ?5",
                params![
                    serde_json::to_string(results)?,
                    status.as_str(),
                    now,
                    completed_at,
                    id.to_string()
                ],
            )
            .context("Failed to record analysis results")?
        };

        if changed == 0 {
            return Ok(None);
        }
        info!(%id, status = status.as_str(), "analysis results recorded");
        self.get(id)
    }
}

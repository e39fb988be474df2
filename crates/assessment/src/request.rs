//! Inbound request and outbound response records.

use chrono::{DateTime, Utc};
use risk_common::{BoundingBox, RiskError, RiskStatus};
use risk_scorer::RiskAssessment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One assessment request.
///
/// Optional fields fall back to the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub bbox: BoundingBox,

    #[serde(default, alias = "maxCloudPct", skip_serializing_if = "Option::is_none")]
    pub max_cloud_pct: Option<f64>,

    #[serde(default, alias = "lookbackDays", skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<u32>,

    #[serde(default, alias = "includePreview", skip_serializing_if = "Option::is_none")]
    pub include_preview: Option<bool>,

    /// End of the lookback window; defaults to now
    #[serde(default, alias = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl AssessmentRequest {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            max_cloud_pct: None,
            lookback_days: None,
            include_preview: None,
            end_date: None,
        }
    }

    pub fn with_max_cloud_pct(mut self, pct: f64) -> Self {
        self.max_cloud_pct = Some(pct);
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    pub fn with_preview(mut self, include: bool) -> Self {
        self.include_preview = Some(include);
        self
    }

    pub fn with_end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }
}

/// The structured record returned for every request, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub request_id: Uuid,
    pub status: RiskStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
}

impl AssessmentResponse {
    pub fn success(request_id: Uuid, assessment: RiskAssessment) -> Self {
        let status = assessment.status;
        let message = match status {
            RiskStatus::Inconclusive => format!(
                "No valid vegetation pixels; scored {:.1} ({}) from weather alone",
                assessment.score, assessment.category
            ),
            _ => format!(
                "Fire risk {} (score {:.1})",
                assessment.category, assessment.score
            ),
        };

        Self {
            request_id,
            status,
            message,
            assessment: Some(assessment),
        }
    }

    pub fn failure(request_id: Uuid, error: &RiskError) -> Self {
        Self {
            request_id,
            status: error.status(),
            message: error.to_string(),
            assessment: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.has_assessment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_camel_case_fields() {
        let json = r#"{
            "bbox": {"min_lon": -8.95, "min_lat": 38.6, "max_lon": -8.85, "max_lat": 38.7},
            "maxCloudPct": 10,
            "lookbackDays": 14,
            "includePreview": true
        }"#;
        let request: AssessmentRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.max_cloud_pct, Some(10.0));
        assert_eq!(request.lookback_days, Some(14));
        assert_eq!(request.include_preview, Some(true));
        assert_eq!(request.end_date, None);
    }

    #[test]
    fn test_failure_response() {
        let id = Uuid::new_v4();
        let response =
            AssessmentResponse::failure(id, &RiskError::NotFound("no clear scene".to_string()));

        assert_eq!(response.status, RiskStatus::NotFound);
        assert!(!response.is_success());
        assert!(response.message.contains("no clear scene"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "not_found");
        assert!(json.get("assessment").is_none());
    }
}

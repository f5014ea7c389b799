use buddy_providers::TimeWindow;
use chrono::DateTime;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::evaluators::{Assessment, EvalRequest, Evaluator};

/// Stages of one fusion cycle, driven strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionStage {
    Collect,
    ConflictDetect,
    Recommend,
    Done,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// An outdoor event overlaps a poor-weather window.
    OutdoorWeather,
    /// Weather bad enough to make travel to any event risky.
    TravelRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub severity: Severity,
    /// The calendar entry the conflict is about.
    pub subject: String,
    pub description: String,
    /// Fraction of the event covered by the poor-weather window.
    pub overlap: f64,
}

/// Terminal output of a fusion cycle. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub recommendation: String,
    pub confidence: f64,
    pub assessments: Vec<Assessment>,
    pub conflicts: Vec<Conflict>,
    pub alternatives: Vec<String>,
}

impl Decision {
    /// Short-circuit outcome when no specialist produced an assessment.
    fn insufficient() -> Self {
        Self {
            recommendation: "insufficient information".to_string(),
            confidence: 0.0,
            assessments: Vec::new(),
            conflicts: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.conflicts.iter().map(|c| c.severity).max()
    }
}

/// Combines specialist assessments into a single recommendation with a
/// confidence score and alternatives.
pub struct DecisionFuser {
    evaluator_timeout: Duration,
}

impl DecisionFuser {
    pub fn new(evaluator_timeout: Duration) -> Self {
        Self { evaluator_timeout }
    }

    pub async fn fuse(&self, evaluators: &[Arc<dyn Evaluator>], request: &EvalRequest) -> Decision {
        let mut stage = FusionStage::Collect;
        debug!(?stage, evaluators = evaluators.len(), "Fusion cycle started");

        let assessments = self.collect(evaluators, request).await;
        if assessments.is_empty() {
            // all specialists unavailable; this is never a hard failure
            warn!("No assessments collected, short-circuiting");
            return Decision::insufficient();
        }

        stage = FusionStage::ConflictDetect;
        debug!(?stage, assessments = assessments.len(), "Collect complete");
        let conflicts = detect_conflicts(&assessments, &request.window);

        stage = FusionStage::Recommend;
        debug!(?stage, conflicts = conflicts.len(), "Conflict detection complete");
        let (recommendation, alternatives) = recommend(&conflicts);
        let confidence = fused_confidence(&assessments);

        stage = FusionStage::Done;
        debug!(?stage, confidence, "Fusion cycle finished");
        Decision {
            recommendation,
            confidence,
            assessments,
            conflicts,
            alternatives,
        }
    }

    /// Gather one assessment per evaluator, concurrently, each under its own
    /// timeout. A slow or failing specialist is replaced by a neutral
    /// degraded assessment; its late result, if any, is dropped with the
    /// future.
    async fn collect(
        &self,
        evaluators: &[Arc<dyn Evaluator>],
        request: &EvalRequest,
    ) -> Vec<Assessment> {
        let futures = evaluators.iter().map(|evaluator| {
            let evaluator = Arc::clone(evaluator);
            let request = request.clone();
            let budget = self.evaluator_timeout;
            async move {
                match tokio::time::timeout(budget, evaluator.assess(&request)).await {
                    Ok(Ok(assessment)) => assessment,
                    Ok(Err(e)) => {
                        warn!(evaluator = evaluator.name(), error = %e, "Evaluator failed");
                        Assessment::degraded(evaluator.name(), &e.to_string())
                    }
                    Err(_) => {
                        warn!(evaluator = evaluator.name(), ?budget, "Evaluator timed out");
                        Assessment::degraded(evaluator.name(), "timed out")
                    }
                }
            }
        });
        join_all(futures).await
    }
}

/// Mean assessment score, discounted 0.2 per synthetic contribution,
/// floored at 0.1.
fn fused_confidence(assessments: &[Assessment]) -> f64 {
    let mean =
        assessments.iter().map(|a| a.score).sum::<f64>() / assessments.len() as f64;
    let synthetic = assessments.iter().filter(|a| a.origin.is_synthetic()).count();
    (mean - 0.2 * synthetic as f64).clamp(0.1, 1.0)
}

fn detect_conflicts(assessments: &[Assessment], window: &TimeWindow) -> Vec<Conflict> {
    let Some(weather) = assessments.iter().find(|a| a.source == "weather") else {
        return Vec::new();
    };
    let Some(schedule) = assessments.iter().find(|a| a.source == "schedule") else {
        return Vec::new();
    };

    let precipitation = weather
        .raw
        .as_ref()
        .and_then(|r| r.get("precipitation"))
        .and_then(|p| p.as_bool())
        .unwrap_or(false);

    let mut conflicts = Vec::new();
    let events = schedule
        .raw
        .as_ref()
        .and_then(|r| r.get("events"))
        .and_then(|e| e.as_array())
        .cloned()
        .unwrap_or_default();

    for event in &events {
        let title = event["title"].as_str().unwrap_or("event").to_string();
        let Some(event_window) = parse_event_window(event) else {
            continue;
        };
        let overlap = window.overlap_fraction(&event_window);
        if overlap == 0.0 {
            continue;
        }
        let outdoor = event["outdoor"].as_bool().unwrap_or(false);

        if outdoor {
            let severity = if weather.score < 0.3 && overlap >= 0.5 {
                Some(Severity::High)
            } else if weather.score < 0.5 || (precipitation && overlap >= 0.5) {
                Some(Severity::Medium)
            } else if weather.score < 0.65 || precipitation {
                Some(Severity::Low)
            } else {
                None
            };
            if let Some(severity) = severity {
                conflicts.push(Conflict {
                    kind: ConflictKind::OutdoorWeather,
                    severity,
                    subject: title.clone(),
                    description: format!(
                        "{:.0}% of '{}' falls in a poor-weather window (weather score {:.2})",
                        overlap * 100.0,
                        title,
                        weather.score
                    ),
                    overlap,
                });
            }
        } else if weather.score < 0.2 {
            conflicts.push(Conflict {
                kind: ConflictKind::TravelRisk,
                severity: Severity::Medium,
                subject: title.clone(),
                description: format!(
                    "travel to '{}' may be hazardous (weather score {:.2})",
                    title, weather.score
                ),
                overlap,
            });
        }
    }

    conflicts
}

fn parse_event_window(event: &serde_json::Value) -> Option<TimeWindow> {
    let start = DateTime::parse_from_rfc3339(event["start"].as_str()?).ok()?;
    let end = DateTime::parse_from_rfc3339(event["end"].as_str()?).ok()?;
    Some(TimeWindow::new(
        start.with_timezone(&chrono::Utc),
        end.with_timezone(&chrono::Utc),
    ))
}

/// Recommendation and alternatives from the highest-severity conflict.
/// Alternatives come from a static per-kind template set, populated only at
/// severity medium and above.
fn recommend(conflicts: &[Conflict]) -> (String, Vec<String>) {
    let mut worst: Option<&Conflict> = None;
    for conflict in conflicts {
        if conflict.severity < Severity::Medium {
            continue;
        }
        let replace = match worst {
            None => true,
            Some(current) => conflict.severity > current.severity,
        };
        if replace {
            worst = Some(conflict);
        }
    }

    match worst {
        Some(conflict) => {
            let recommendation = match conflict.kind {
                ConflictKind::OutdoorWeather => format!(
                    "Consider moving '{}' indoors or rescheduling: {}",
                    conflict.subject, conflict.description
                ),
                ConflictKind::TravelRisk => format!(
                    "Travel to '{}' may be hazardous; consider a virtual alternative.",
                    conflict.subject
                ),
            };
            (recommendation, alternatives_for(conflict))
        }
        None => (
            "No action needed; conditions look good for your schedule.".to_string(),
            Vec::new(),
        ),
    }
}

fn alternatives_for(conflict: &Conflict) -> Vec<String> {
    match conflict.kind {
        ConflictKind::OutdoorWeather => vec![
            format!("Reschedule '{}' to a clearer time window", conflict.subject),
            format!("Move '{}' to an indoor venue", conflict.subject),
            format!("Hold '{}' as a virtual gathering instead", conflict.subject),
        ],
        ConflictKind::TravelRisk => vec![
            format!("Switch '{}' to a video call", conflict.subject),
            format!("Allow extra travel time for '{}'", conflict.subject),
        ],
    }
}

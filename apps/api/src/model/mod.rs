//! Model Client — roster construction, fallback, and response normalization
//! for the Gemini-backed resume operations.
//!
//! The roster is computed once at startup and never mutated afterwards;
//! `AppState` shares the client read-only across requests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod gemini;
pub mod prompts;

use gemini::GenerativeBackend;
use prompts::{ATS_RESUME_PROMPT_TEMPLATE, ATS_SCORE_PROMPT_TEMPLATE, COVER_LETTER_PROMPT_TEMPLATE};

/// Candidate model identifiers, best quality first, faster fallbacks after.
pub const PREFERRED_MODELS: [&str; 5] = [
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-pro-latest",
    "gemini-flash-latest",
    "gemini-2.0-flash",
];

/// How many arbitrary identifiers to keep when none of the preferred ones
/// is available.
const AVAILABLE_FALLBACK_LIMIT: usize = 5;

/// One failed roster attempt, kept for the exhaustion report.
#[derive(Debug)]
pub struct FailedAttempt {
    pub model: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ModelError {
    /// Every roster entry failed. Carries each identifier and its failure.
    #[error("Error calling Gemini API: {}", format_attempts(.attempts))]
    Exhausted { attempts: Vec<FailedAttempt> },

    #[error("Failed to parse Gemini response as JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Gemini response did not contain a {0} field.")]
    MissingField(&'static str),

    #[error("No Gemini models available. Please check your API key permissions.")]
    NoModelsAvailable,
}

fn format_attempts(attempts: &[FailedAttempt]) -> String {
    let last = attempts
        .last()
        .map(|a| a.reason.as_str())
        .unwrap_or("empty roster");
    let tried: Vec<&str> = attempts.iter().map(|a| a.model.as_str()).collect();
    format!(
        "{last}. Tried models: {}. Please check your API key permissions.",
        tried.join(", ")
    )
}

/// Result of the ATS score analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsAnalysis {
    pub score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub model_used: String,
}

/// Result of cover letter generation. Optional metadata fields default to
/// empty strings; the handler maps empty to `null` in the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverLetter {
    pub cover_letter: String,
    pub model_used: String,
    pub job_title: String,
    pub company_name: String,
    pub notes: String,
}

/// Result of ATS resume regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedResume {
    pub regenerated_resume: String,
    pub model_used: String,
    pub notes: String,
}

/// Client for the three resume operations.
pub struct ModelClient {
    backend: Arc<dyn GenerativeBackend>,
    roster: Vec<String>,
}

impl ModelClient {
    /// Builds the client, filtering the preferred roster against what the
    /// backend reports as available.
    ///
    /// A listing failure keeps the preferred list as-is; an empty
    /// intersection falls back to the first five available identifiers; an
    /// empty final roster is a hard error.
    pub async fn connect(backend: Arc<dyn GenerativeBackend>) -> Result<Self, ModelError> {
        let roster = match backend.list_models().await {
            Ok(available) => filter_roster(&PREFERRED_MODELS, available),
            Err(e) => {
                warn!("Could not list Gemini models, using the default roster: {e}");
                PREFERRED_MODELS.iter().map(|m| m.to_string()).collect()
            }
        };

        if roster.is_empty() {
            return Err(ModelError::NoModelsAvailable);
        }

        debug!("Model roster: {}", roster.join(", "));
        Ok(Self { backend, roster })
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Analyzes resume text and returns an ATS compatibility report.
    pub async fn analyze_resume(&self, resume_text: &str) -> Result<AtsAnalysis, ModelError> {
        let prompt = ATS_SCORE_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
        let (raw, model_used) = self.generate_with_fallback(&prompt).await?;

        let value = parse_json_response(&raw)?;

        Ok(AtsAnalysis {
            score: normalize_score(value.get("score")),
            feedback: value
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or("No feedback provided")
                .to_string(),
            strengths: list_field(&value, "strengths"),
            weaknesses: list_field(&value, "weaknesses"),
            recommendations: list_field(&value, "recommendations"),
            model_used,
        })
    }

    /// Generates a tailored cover letter from resume text and a job
    /// description.
    pub async fn generate_cover_letter(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<CoverLetter, ModelError> {
        let prompt = COVER_LETTER_PROMPT_TEMPLATE
            .replace("{resume_text}", resume_text)
            .replace("{job_description}", job_description);
        let (raw, model_used) = self.generate_with_fallback(&prompt).await?;

        let value = parse_json_response(&raw)?;

        let cover_letter = mandatory_field(&value, "cover_letter")?;
        Ok(CoverLetter {
            cover_letter,
            model_used,
            job_title: optional_field(&value, "job_title"),
            company_name: optional_field(&value, "company_name"),
            notes: optional_field(&value, "notes"),
        })
    }

    /// Regenerates the resume as ATS-optimized plain text.
    ///
    /// Unlike the other two operations a non-JSON response is tolerated:
    /// the raw trimmed text is used verbatim and `notes` flags the
    /// degradation.
    pub async fn generate_optimized_resume(
        &self,
        resume_text: &str,
    ) -> Result<OptimizedResume, ModelError> {
        let prompt = ATS_RESUME_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
        let (raw, model_used) = self.generate_with_fallback(&prompt).await?;

        let value = match parse_json_response(&raw) {
            Ok(v) => v,
            Err(_) => {
                return Ok(OptimizedResume {
                    regenerated_resume: raw.trim().to_string(),
                    model_used,
                    notes: "Model returned non-JSON response; used raw text as regenerated resume."
                        .to_string(),
                });
            }
        };

        let regenerated_resume = mandatory_field(&value, "regenerated_resume")?;
        Ok(OptimizedResume {
            regenerated_resume,
            model_used,
            notes: optional_field(&value, "notes"),
        })
    }

    /// Tries each roster entry in order, returning the first successful
    /// response text together with the identifier that produced it.
    async fn generate_with_fallback(&self, prompt: &str) -> Result<(String, String), ModelError> {
        let mut attempts: Vec<FailedAttempt> = Vec::new();

        for model in &self.roster {
            match self.backend.generate(model, prompt).await {
                Ok(text) => return Ok((text, model.clone())),
                Err(e) => {
                    warn!("Model {model} failed, advancing to the next roster entry: {e}");
                    attempts.push(FailedAttempt {
                        model: model.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(ModelError::Exhausted { attempts })
    }
}

/// Intersects the preferred identifiers with the available set, preserving
/// preferred order. Falls back to the first five available identifiers when
/// the intersection is empty.
fn filter_roster(preferred: &[&str], available: Vec<String>) -> Vec<String> {
    let filtered: Vec<String> = preferred
        .iter()
        .filter(|name| available.iter().any(|a| a == *name))
        .map(|name| name.to_string())
        .collect();

    if filtered.is_empty() {
        available
            .into_iter()
            .take(AVAILABLE_FALLBACK_LIMIT)
            .collect()
    } else {
        filtered
    }
}

fn parse_json_response(raw: &str) -> Result<Value, ModelError> {
    serde_json::from_str(strip_json_fences(raw)).map_err(ModelError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Coerces the score (number or numeric string) into [0, 100] with at most
/// two decimal digits. Anything unusable becomes 0.
fn normalize_score(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// A field that must be present and non-empty after trimming.
fn mandatory_field(value: &Value, key: &'static str) -> Result<String, ModelError> {
    match value.get(key).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ModelError::MissingField(key)),
    }
}

fn optional_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

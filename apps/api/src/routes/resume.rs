//! Axum route handlers for the three resume operations.
//!
//! Each handler runs the same pipeline: obtain the document (upload or
//! URL), extract and validate its text, invoke the model client, map the
//! typed result into the public response shape.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extract::{extract_text, is_valid_extension, FileType};
use crate::fetch::MAX_FILE_SIZE;
use crate::model::ModelClient;
use crate::state::AppState;

/// Minimum extracted resume text length, after trimming.
const MIN_RESUME_TEXT_CHARS: usize = 50;
/// Minimum job description length, after trimming.
const MIN_JOB_DESCRIPTION_CHARS: usize = 30;

// ────────────────────────────────────────────────────────────────────────────
// Request extraction
// ────────────────────────────────────────────────────────────────────────────

/// Where the resume document comes from: a direct upload or a URL to fetch.
pub enum DocumentSource {
    Upload { content: Bytes, filename: String },
    Url(String),
}

/// Parsed request body for the resume endpoints. Accepts either a
/// `multipart/form-data` upload (fields `file`, `resume_url`,
/// `job_description`) or a JSON body (`resume_url`, `job_description`).
pub struct ResumeSubmission {
    pub source: DocumentSource,
    pub job_description: Option<String>,
}

#[derive(Deserialize)]
struct SubmissionBody {
    resume_url: String,
    #[serde(default)]
    job_description: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for ResumeSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?;
            return from_multipart(multipart).await;
        }

        let Json(body): Json<SubmissionBody> = Json::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;

        Ok(ResumeSubmission {
            source: DocumentSource::Url(body.resume_url),
            job_description: body.job_description,
        })
    }
}

async fn from_multipart(mut multipart: Multipart) -> Result<ResumeSubmission, AppError> {
    let mut upload: Option<(Bytes, String)> = None;
    let mut resume_url: Option<String> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("resume.pdf").to_string();
                let content = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {e}"))
                })?;
                upload = Some((content, filename));
            }
            "resume_url" => {
                resume_url = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read resume_url field: {e}"))
                })?);
            }
            "job_description" => {
                job_description = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read job_description field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let source = match (upload, resume_url) {
        (Some((content, filename)), _) => DocumentSource::Upload { content, filename },
        (None, Some(url)) => DocumentSource::Url(url),
        (None, None) => {
            return Err(AppError::Validation(
                "Provide a resume file upload or a resume_url".to_string(),
            ))
        }
    };

    Ok(ResumeSubmission {
        source,
        job_description,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AtsScoreResponse {
    pub score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub file_type: String,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub cover_letter: String,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AtsResumeResponse {
    pub regenerated_resume: String,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /resume_ats_score
///
/// Evaluates a resume (upload or URL) and returns an ATS compatibility
/// score with feedback.
pub async fn handle_ats_score(
    State(state): State<AppState>,
    submission: ResumeSubmission,
) -> Result<Json<AtsScoreResponse>, AppError> {
    let model = model_client(&state)?;
    let (resume_text, filename) = resume_text_from(&state, submission.source).await?;

    let analysis = model.analyze_resume(&resume_text).await?;

    info!(
        "ATS analysis complete (model: {}, score: {})",
        analysis.model_used, analysis.score
    );

    Ok(Json(AtsScoreResponse {
        score: analysis.score,
        feedback: analysis.feedback,
        strengths: analysis.strengths,
        weaknesses: analysis.weaknesses,
        recommendations: analysis.recommendations,
        file_type: FileType::from_filename(&filename).as_str().to_string(),
    }))
}

/// POST /cover_letter_generator
///
/// Generates a cover letter tailored to the supplied job description.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    submission: ResumeSubmission,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let model = model_client(&state)?;
    let (resume_text, _) = resume_text_from(&state, submission.source).await?;

    let job_description = submission.job_description.unwrap_or_default();
    if job_description.trim().chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(
            "Job description is too short. Please provide a detailed job description.".to_string(),
        ));
    }

    let letter = model
        .generate_cover_letter(&resume_text, &job_description)
        .await?;

    info!("Cover letter generated (model: {})", letter.model_used);

    Ok(Json(CoverLetterResponse {
        cover_letter: letter.cover_letter,
        model_used: letter.model_used,
        job_title: non_empty(letter.job_title),
        company_name: non_empty(letter.company_name),
        notes: non_empty(letter.notes),
    }))
}

/// POST /ats_resume_generator
///
/// Rewrites the resume into an ATS-optimized plain-text version.
pub async fn handle_ats_resume(
    State(state): State<AppState>,
    submission: ResumeSubmission,
) -> Result<Json<AtsResumeResponse>, AppError> {
    let model = model_client(&state)?;
    let (resume_text, _) = resume_text_from(&state, submission.source).await?;

    let resume = model.generate_optimized_resume(&resume_text).await?;

    info!("Resume regenerated (model: {})", resume.model_used);

    Ok(Json(AtsResumeResponse {
        regenerated_resume: resume.regenerated_resume,
        model_used: resume.model_used,
        notes: non_empty(resume.notes),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline helpers
// ────────────────────────────────────────────────────────────────────────────

fn model_client(state: &AppState) -> Result<&Arc<ModelClient>, AppError> {
    state.model.as_ref().ok_or(AppError::NotConfigured)
}

/// Shared pipeline head: obtain the document, then extract and validate
/// its text. Returns the text together with the effective filename.
async fn resume_text_from(
    state: &AppState,
    source: DocumentSource,
) -> Result<(String, String), AppError> {
    let (content, filename) = match source {
        DocumentSource::Upload { content, filename } => {
            if content.len() > MAX_FILE_SIZE {
                return Err(AppError::Validation(format!(
                    "File size ({:.2}MB) exceeds maximum allowed size of 10MB",
                    content.len() as f64 / (1024.0 * 1024.0)
                )));
            }
            if !is_valid_extension(&filename) {
                return Err(AppError::Validation(
                    "Invalid file type. Allowed types: .pdf, .doc, .docx".to_string(),
                ));
            }
            (content, filename)
        }
        DocumentSource::Url(url) => state.fetcher.download(&url).await?,
    };

    let text = extract_text(&content, &filename)?;
    if text.trim().chars().count() < MIN_RESUME_TEXT_CHARS {
        return Err(AppError::Validation(
            "Could not extract sufficient text from the resume file. Please ensure the file is not corrupted."
                .to_string(),
        ));
    }

    Ok((text, filename))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::RemoteFetcher;
    use crate::model::gemini::{BackendError, GenerativeBackend};
    use crate::model::PREFERRED_MODELS;
    use crate::routes::build_router;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use docx_rs::{Docx, Paragraph, Run};
    use serde_json::Value;
    use tower::ServiceExt;

    struct FixedBackend {
        response: String,
    }

    #[async_trait]
    impl GenerativeBackend for FixedBackend {
        async fn list_models(&self) -> Result<Vec<String>, BackendError> {
            Ok(PREFERRED_MODELS.iter().map(|m| m.to_string()).collect())
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, BackendError> {
            Ok(self.response.clone())
        }
    }

    fn test_config() -> Config {
        Config {
            gemini_api_key: String::new(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    async fn app_with_model(response: &str) -> axum::Router {
        let backend = Arc::new(FixedBackend {
            response: response.to_string(),
        });
        let model = ModelClient::connect(backend).await.unwrap();
        build_router(AppState {
            config: test_config(),
            fetcher: RemoteFetcher::new(),
            model: Some(Arc::new(model)),
        })
    }

    fn app_without_model() -> axum::Router {
        build_router(AppState {
            config: test_config(),
            fetcher: RemoteFetcher::new(),
            model: None,
        })
    }

    /// A generated DOCX resume comfortably over the 50-character minimum.
    fn resume_docx() -> Vec<u8> {
        let lines = [
            "Jane Doe - Senior Software Engineer",
            "EXPERIENCE: Built distributed data pipelines handling 2M events/day.",
            "EDUCATION: BSc Computer Science.",
            "SKILLS: Rust, Python, PostgreSQL, Kubernetes.",
        ];
        let mut docx = Docx::new();
        for line in lines {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
        let mut buf = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    fn multipart_body(file: Option<&[u8]>, extra_fields: &[(&str, &str)]) -> (String, Vec<u8>) {
        let boundary = "test-boundary-7f3a";
        let mut body: Vec<u8> = Vec::new();
        if let Some(content) = file {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"resume.docx\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in extra_fields {
            body.extend_from_slice(
                format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={boundary}"),
            body,
        )
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = app_without_model()
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "running");
        assert_eq!(json["message"], "Resume ATS Score API");
    }

    #[tokio::test]
    async fn test_health_reports_unconfigured_key() {
        let response = app_without_model()
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["gemini_configured"], false);
    }

    #[tokio::test]
    async fn test_score_endpoint_without_model_is_500() {
        let response = app_without_model()
            .oneshot(
                HttpRequest::post("/resume_ats_score")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"resume_url": "https://example.com/resume.pdf"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_score_upload_clamps_out_of_range_score() {
        let app = app_with_model(
            r#"{"score": 101, "feedback": "f", "strengths": [], "weaknesses": [], "recommendations": []}"#,
        )
        .await;
        let (content_type, body) = multipart_body(Some(&resume_docx()), &[]);
        let response = app
            .oneshot(
                HttpRequest::post("/resume_ats_score")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["score"], 100.0);
        assert_eq!(json["file_type"], "docx");
    }

    #[tokio::test]
    async fn test_upload_with_bad_extension_is_400() {
        let app = app_with_model("{}").await;
        let boundary = "test-boundary-7f3a";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"resume.txt\"\r\nContent-Type: text/plain\r\n\r\nplain text resume\r\n--{boundary}--\r\n"
        );
        let response = app
            .oneshot(
                HttpRequest::post("/resume_ats_score")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_cover_letter_requires_long_job_description() {
        let app = app_with_model(r#"{"cover_letter": "Dear team"}"#).await;
        let (content_type, body) =
            multipart_body(Some(&resume_docx()), &[("job_description", "too short")]);
        let response = app
            .oneshot(
                HttpRequest::post("/cover_letter_generator")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_cover_letter_happy_path_omits_empty_metadata() {
        let app = app_with_model(
            r#"{"cover_letter": "Dear hiring team, ...", "job_title": "Backend Engineer", "company_name": "", "notes": ""}"#,
        )
        .await;
        let jd = "We are hiring a backend engineer to build APIs in Rust and operate them in production.";
        let (content_type, body) =
            multipart_body(Some(&resume_docx()), &[("job_description", jd)]);
        let response = app
            .oneshot(
                HttpRequest::post("/cover_letter_generator")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["cover_letter"], "Dear hiring team, ...");
        assert_eq!(json["job_title"], "Backend Engineer");
        assert_eq!(json["model_used"], "gemini-2.5-pro");
        assert!(json.get("company_name").is_none());
        assert!(json.get("notes").is_none());
    }

    #[tokio::test]
    async fn test_resume_generator_tolerates_non_json_model_output() {
        let app = app_with_model("JANE DOE\nSUMMARY\nSenior engineer with 10 years...").await;
        let (content_type, body) = multipart_body(Some(&resume_docx()), &[]);
        let response = app
            .oneshot(
                HttpRequest::post("/ats_resume_generator")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(
            json["regenerated_resume"],
            "JANE DOE\nSUMMARY\nSenior engineer with 10 years..."
        );
        assert!(json["notes"].as_str().unwrap().contains("non-JSON"));
    }

    #[tokio::test]
    async fn test_unparseable_score_output_is_400() {
        let app = app_with_model("Sorry, I cannot help with that.").await;
        let (content_type, body) = multipart_body(Some(&resume_docx()), &[]);
        let response = app
            .oneshot(
                HttpRequest::post("/resume_ats_score")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "MODEL_RESPONSE_ERROR");
    }

    #[tokio::test]
    async fn test_multipart_without_file_or_url_is_400() {
        let app = app_with_model("{}").await;
        let (content_type, body) = multipart_body(None, &[("job_description", "x")]);
        let response = app
            .oneshot(
                HttpRequest::post("/resume_ats_score")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_non_empty_maps_blank_to_none() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}

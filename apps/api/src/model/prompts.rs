// Prompt templates for the three resume operations. Placeholders
// ({resume_text}, {job_description}) are substituted with `str::replace`
// before the call.

pub const ATS_SCORE_PROMPT_TEMPLATE: &str = r#"You are an expert ATS (Applicant Tracking System) resume analyzer.
Analyze the following resume and provide a comprehensive evaluation.

Resume Text:
{resume_text}

Please provide your analysis in the following JSON format:
{
    "score": <number between 0-100>,
    "feedback": "<detailed feedback about the resume's ATS compatibility>",
    "strengths": ["<strength1>", "<strength2>", ...],
    "weaknesses": ["<weakness1>", "<weakness2>", ...],
    "recommendations": ["<recommendation1>", "<recommendation2>", ...]
}

Consider the following ATS evaluation criteria:
1. Keyword optimization and relevance
2. Formatting and structure (ATS-friendly formatting)
3. Section completeness (contact info, work experience, education, skills)
4. Use of standard section headers
5. File format compatibility
6. Absence of graphics/images that ATS can't read
7. Proper use of dates and formatting
8. Quantifiable achievements and metrics
9. Industry-specific keywords
10. Overall readability and parsing by ATS systems

Provide a score from 0-100 where:
- 90-100: Excellent ATS compatibility
- 70-89: Good ATS compatibility with minor improvements needed
- 50-69: Fair ATS compatibility, significant improvements recommended
- 0-49: Poor ATS compatibility, major overhaul needed

Respond ONLY with valid JSON, no additional text or markdown formatting."#;

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are an expert career coach and professional cover letter writer.

Use the following candidate resume and job description to write a highly tailored, ATS-friendly,
and compelling cover letter that the candidate can use to apply for this specific role.

--- RESUME ---
{resume_text}

--- JOB DESCRIPTION ---
{job_description}

Write a personalized cover letter that:
- Clearly aligns the candidate's experience with the job requirements
- Highlights 3-5 key achievements that match the role
- Uses a professional but warm tone
- Is concise (around 350-500 words)
- Avoids repeating the resume verbatim
- Avoids making up fake companies or roles

Try to infer the job title and company name from the job description if possible.

Return your answer in the following JSON format ONLY:
{
  "cover_letter": "<full cover letter text>",
  "job_title": "<detected or inferred job title, or empty string if unknown>",
  "company_name": "<detected or inferred company name, or empty string if unknown>",
  "notes": "<optional notes or suggestions for the candidate, can be empty>"
}"#;

pub const ATS_RESUME_PROMPT_TEMPLATE: &str = r#"You are an expert resume writer and ATS optimization specialist.

Take the following resume content and regenerate it to:
- Improve clarity, structure, and readability
- Use standard ATS-friendly section headings (e.g., SUMMARY, EXPERIENCE, EDUCATION, SKILLS)
- Avoid complex tables, columns, images, and graphics
- Use bullet points where appropriate
- Emphasize quantified achievements and relevant keywords
- Keep the content truthful and do NOT invent new experience or companies
- Preserve all important information from the original resume

--- ORIGINAL RESUME ---
{resume_text}

Return your answer in the following JSON format ONLY:
{
  "regenerated_resume": "<full regenerated resume in plain text, with clear section headings>",
  "notes": "<brief explanation (2-4 bullet sentences) of the key improvements you made, or empty string>"
}"#;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use super::content::ContentBackend;
use crate::error::CoachError;

/// Welcome message plus the questions to ask, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    pub welcome: String,
    pub questions: Vec<String>,
}

/// Builds the interview script for a job title
pub struct QuestionGenerator {
    content: Arc<dyn ContentBackend>,
}

impl QuestionGenerator {
    pub fn new(content: Arc<dyn ContentBackend>) -> Self {
        Self { content }
    }

    /// Welcome message and exactly `count` questions for `job`.
    ///
    /// Generation failures never surface: the welcome falls back to a
    /// template and missing questions are filled from the generic list.
    pub async fn generate(&self, job: &str, count: usize, interviewer: &str) -> Result<QuestionSet> {
        let job = normalize_job(job);
        if job.is_empty() {
            return Err(CoachError::InvalidRequest("job role is required".to_string()).into());
        }
        if count == 0 {
            return Err(CoachError::InvalidRequest("at least one question is required".to_string()).into());
        }

        info!("Generating {} questions for {} role ({})", count, job, self.content.name());

        let welcome = match self.content.generate(&welcome_prompt(&job, interviewer)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_welcome(&job, interviewer),
            Err(e) => {
                warn!("Error generating welcome message: {:#}", e);
                fallback_welcome(&job, interviewer)
            }
        };

        let mut generic = generic_questions(&job).into_iter();
        let mut questions = match self.content.generate(&questions_prompt(&job, count)).await {
            Ok(text) => extract_questions(&text),
            Err(e) => {
                warn!("Error generating questions: {:#}", e);
                Vec::new()
            }
        };

        while questions.len() < count {
            match generic.next() {
                Some(q) => questions.push(q),
                None => break,
            }
        }
        questions.truncate(count);

        Ok(QuestionSet { welcome, questions })
    }
}

/// Trimmed and lower-cased, as used in every prompt and template
pub fn normalize_job(job: &str) -> String {
    job.trim().to_lowercase()
}

/// Non-empty trimmed lines that end with a question mark
pub fn extract_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.ends_with('?'))
        .map(str::to_string)
        .collect()
}

pub fn fallback_welcome(job: &str, interviewer: &str) -> String {
    format!(
        "Welcome to your {job} interview! I'm {interviewer}, your AI Interview Coach, and I'll be asking you some questions about your experience and skills. Take your time to think before answering."
    )
}

pub fn generic_questions(job: &str) -> Vec<String> {
    vec![
        format!("Why are you interested in the {job} role?"),
        format!("What relevant experience do you have for this {job} position?"),
        format!("How do you stay updated with trends in the {job} field?"),
        format!("Tell me about your experience as a {job}."),
        format!("What skills do you think are most important for a {job}?"),
        format!("Describe a challenging situation you faced in your role as a {job}."),
    ]
}

fn welcome_prompt(job: &str, interviewer: &str) -> String {
    format!(
        "Create a warm, professional welcome message for a mock interview for a {job} role.\n\
         The message should:\n\
         - Greet the candidate\n\
         - Introduce yourself as {interviewer}, an AI Interview Coach\n\
         - Mention you'll be asking them questions about the {job} role\n\
         - Offer a brief encouragement\n\
         - Keep it under 3 sentences\n\n\
         Return just the welcome message with no additional text or explanation."
    )
}

fn questions_prompt(job: &str, count: usize) -> String {
    format!(
        "Generate {count} professional interview questions for a {job} role.\n\n\
         The questions should:\n\
         - Be challenging but fair\n\
         - Cover different aspects of the role\n\
         - Be open-ended (not yes/no questions)\n\
         - Focus on experience, skills, and scenarios relevant to the position\n\n\
         Format each question on a new line without numbering."
    )
}

use std::sync::Arc;
use tracing::{debug, warn};

use super::content::ContentBackend;

/// Feedback used when no generation service answers
const CANNED_FEEDBACK: [&str; 4] = [
    "Your answer shows good technical knowledge and provides clear examples. To improve, you could quantify the impact of your work more specifically. Consider adding measurable outcomes to strengthen future responses.",
    "Good response with concrete practices mentioned. You might consider explaining how these practices improved outcomes in previous roles. Adding specific metrics would make this answer even stronger.",
    "Your approach seems methodical and thorough. You could strengthen this answer by mentioning how you collaborate with team members during difficult debugging sessions. Communication is key in technical roles.",
    "That's a solid answer showcasing your expertise. To make it stronger, provide more specific metrics or results from your experience. Quantifiable achievements help interviewers understand your impact.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub feedback: String,
    pub used_fallback: bool,
}

/// Turns a question and answer into short spoken feedback
pub struct Evaluator {
    content: Arc<dyn ContentBackend>,
}

impl Evaluator {
    pub fn new(content: Arc<dyn ContentBackend>) -> Self {
        Self { content }
    }

    /// Never fails; falls back to canned feedback
    pub async fn evaluate(&self, question: &str, answer: &str) -> Evaluation {
        match self.content.generate(&evaluation_prompt(question, answer)).await {
            Ok(text) if !text.trim().is_empty() => Evaluation {
                feedback: text.trim().to_string(),
                used_fallback: false,
            },
            Ok(_) => {
                warn!("Empty evaluation from {}; using canned feedback", self.content.name());
                Self::fallback(question)
            }
            Err(e) => {
                warn!("Error in response evaluation: {:#}", e);
                Self::fallback(question)
            }
        }
    }

    fn fallback(question: &str) -> Evaluation {
        debug!("Canned evaluation for: {}", question);
        Evaluation {
            feedback: canned_feedback(question).to_string(),
            used_fallback: true,
        }
    }
}

/// Deterministic choice keyed by the question text
pub fn canned_feedback(question: &str) -> &'static str {
    let sum: u64 = question.chars().map(|c| c as u64).sum();
    CANNED_FEEDBACK[(sum % CANNED_FEEDBACK.len() as u64) as usize]
}

fn evaluation_prompt(question: &str, answer: &str) -> String {
    format!(
        "You are a mock interview coach.\n\n\
         Interviewer Question: \"{question}\"\n\
         User's Answer: \"{answer}\"\n\n\
         Give a 2-3 sentence evaluation of the answer. Focus on the quality, content, and professionalism of the response.\n\n\
         DO NOT include a follow-up question in your response."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::content::UnavailableContent;
    use anyhow::Result;

    struct Echo;

    #[async_trait::async_trait]
    impl ContentBackend for Echo {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("  Clear and concise.  ".to_string())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_canned_feedback_is_keyed_by_code_points() {
        // 'a' = 97, 97 % 4 = 1
        assert_eq!(canned_feedback("a"), CANNED_FEEDBACK[1]);
        // "ab" = 195, 195 % 4 = 3
        assert_eq!(canned_feedback("ab"), CANNED_FEEDBACK[3]);
        assert_eq!(canned_feedback(""), CANNED_FEEDBACK[0]);
    }

    #[tokio::test]
    async fn test_generated_feedback_is_trimmed() {
        let evaluator = Evaluator::new(Arc::new(Echo));
        let evaluation = evaluator.evaluate("Why?", "Because.").await;
        assert_eq!(evaluation.feedback, "Clear and concise.");
        assert!(!evaluation.used_fallback);
    }

    #[tokio::test]
    async fn test_unavailable_backend_falls_back() {
        let evaluator = Evaluator::new(Arc::new(UnavailableContent::new("offline")));
        let evaluation = evaluator.evaluate("a", "anything").await;
        assert_eq!(evaluation.feedback, CANNED_FEEDBACK[1]);
        assert!(evaluation.used_fallback);
    }
}

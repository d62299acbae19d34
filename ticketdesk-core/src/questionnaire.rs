//! The fixed question list driven by the interview engine.

/// Questions asked of staff applicants, in order.
pub const STAFF_QUESTIONS: [&str; 8] = [
    "Why do you want to join as a moderator/admin in this dev hub?",
    "How much time can you dedicate weekly?",
    "Do you have experience handling support requests or development tasks?",
    "How would you handle a user reporting a bug or issue?",
    "How do you collaborate with a team remotely?",
    "What motivates you to maintain server quality?",
    "Describe a time you solved a problem under pressure.",
    "Any suggestions to improve this server or our systems?",
];

/// An ordered, non-empty list of prompts.
///
/// The text is opaque data; only the count and order matter to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questionnaire {
    title: String,
    questions: Vec<String>,
}

impl Questionnaire {
    /// Returns `None` if `questions` is empty: an interview with nothing to
    /// ask would complete before it starts.
    pub fn new(title: impl Into<String>, questions: Vec<String>) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        Some(Self {
            title: title.into(),
            questions,
        })
    }

    pub fn staff_application() -> Self {
        Self {
            title: "Moderator Application".to_string(),
            questions: STAFF_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Question at a 0-based index.
    pub fn question(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(String::as_str)
    }

    /// Display heading for the question at a 0-based index, numbered from 1.
    pub fn heading(&self, index: usize) -> String {
        format!("{} — Q{}/{}", self.title, index + 1, self.len())
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::staff_application()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_is_one_based() {
        let q = Questionnaire::staff_application();
        assert_eq!(q.heading(0), "Moderator Application — Q1/8");
        assert_eq!(q.heading(7), "Moderator Application — Q8/8");
    }

    #[test]
    fn test_empty_questionnaire_is_rejected() {
        assert!(Questionnaire::new("Empty", vec![]).is_none());
    }

    #[test]
    fn test_question_out_of_range() {
        let q = Questionnaire::new("T", vec!["only".to_string()]).unwrap();
        assert_eq!(q.question(0), Some("only"));
        assert_eq!(q.question(1), None);
    }
}

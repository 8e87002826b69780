/// The built-in question table and topic keyword lists.
///
/// Topics are matched against a question by plain substring search of the topic name in
/// the lowercased prompt, so a prompt such as "Where do you see yourself in 5 years?"
/// belongs to no topic at all and can never earn keyword points above the floor.
use crate::model::{Question, QuestionStat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Strengths,
    Weaknesses,
    Goals,
    Motivation,
    Introduction,
    Stress,
    Leadership,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::Strengths,
        Topic::Weaknesses,
        Topic::Goals,
        Topic::Motivation,
        Topic::Introduction,
        Topic::Stress,
        Topic::Leadership,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Strengths => "strengths",
            Self::Weaknesses => "weaknesses",
            Self::Goals => "goals",
            Self::Motivation => "motivation",
            Self::Introduction => "introduction",
            Self::Stress => "stress",
            Self::Leadership => "leadership",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Strengths => &[
                "detail-oriented", "problem solver", "team player", "creative", "hardworking",
                "analytical", "adaptable", "communicate", "leadership", "organized", "efficient",
                "motivated", "collaborative", "initiative", "reliable", "focused", "dedicated",
                "resilient", "independent",
            ],
            Self::Weaknesses => &[
                "perfectionist", "focus too much", "impatient", "shy", "overthink",
                "self-critical", "delegation", "public speaking", "disorganized", "procrastinate",
                "detail-obsessed", "multitasking", "insecure",
            ],
            Self::Goals => &[
                "leadership", "team", "projects", "growth", "mentor", "expert", "manager",
                "skills", "career", "promotion", "responsibility", "certification",
                "entrepreneurship", "long-term", "achievement",
            ],
            Self::Motivation => &[
                "passionate", "interested", "career", "opportunity", "culture", "learning",
                "innovation", "values", "mission", "impact", "challenge", "recognition",
                "collaboration", "vision", "drive",
            ],
            Self::Introduction => &[
                "background", "experience", "skills", "internship", "education", "projects",
                "technology", "software", "development", "programming", "university", "degree",
                "certification", "journey", "role", "training",
            ],
            Self::Stress => &[
                "organized", "time management", "positive attitude", "support", "break tasks",
                "prioritize", "resilience", "calm", "focus", "breathe", "routine", "deadlines",
                "communication", "balance",
            ],
            Self::Leadership => &[
                "delegating", "motivating", "initiative", "coordinating", "communication",
                "teamwork", "vision", "decision-making", "responsibility", "supportive", "mentor",
                "collaborate", "strategic", "goal-setting",
            ],
        }
    }

    /// Topics whose name occurs in the lowercased question text.
    pub fn for_question(prompt: &str) -> Vec<Topic> {
        let lowered = prompt.to_lowercase();
        Self::ALL
            .into_iter()
            .filter(|t| lowered.contains(t.name()))
            .collect()
    }
}

/// Keyword phrases of the question's topics, in topic then list order.
pub fn relevant_keywords(prompt: &str) -> Vec<&'static str> {
    Topic::for_question(prompt)
        .iter()
        .flat_map(|t| t.keywords().iter().copied())
        .collect()
}

/// Keyword phrases of the question's topics that occur in the lowercased answer.
///
/// A phrase listed under two matching topics counts twice.
pub fn matched_keywords(prompt: &str, answer: &str) -> Vec<String> {
    let lowered = answer.to_lowercase();
    relevant_keywords(prompt)
        .into_iter()
        .filter(|kw| lowered.contains(kw))
        .map(str::to_string)
        .collect()
}

/// Whether the answer mentions a keyword from any topic, not just the question's own.
pub fn mentions_any_keyword(answer: &str) -> bool {
    let lowered = answer.to_lowercase();
    Topic::ALL
        .iter()
        .flat_map(|t| t.keywords().iter())
        .any(|kw| lowered.contains(kw))
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn questions_mut(&mut self) -> &mut [Question] {
        &mut self.questions
    }

    pub fn get(&self, prompt: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.prompt == prompt)
    }

    pub fn get_mut(&mut self, prompt: &str) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| q.prompt == prompt)
    }

    pub fn stats(&self) -> Vec<QuestionStat> {
        self.questions
            .iter()
            .map(|q| QuestionStat {
                question: q.prompt.clone(),
                rating: q.rating,
                times_asked: q.times_asked,
                eligible: q.is_eligible(),
            })
            .collect()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new(vec![
            Question::new(
                "Can you tell me about yourself?",
                &[
                    "I am a motivated individual with a background in computer engineering.",
                    "I have a strong passion for technology and have worked on several software projects.",
                    "My experience includes internships in data science and web development.",
                ],
            ),
            Question::new(
                "What are your strengths?",
                &[
                    "I am detail-oriented, a good problem solver, and a team player.",
                    "I am creative, hardworking, and adapt quickly to new environments.",
                    "I have strong analytical skills and communicate effectively.",
                ],
            ),
            Question::new(
                "Why do you want this job?",
                &[
                    "I am passionate about this field and I want to contribute to your company's growth.",
                    "This position aligns with my career goals and offers great learning opportunities.",
                    "I admire your company's culture and want to be part of your innovative team.",
                ],
            ),
            Question::new(
                "What are your weaknesses?",
                &[
                    "Sometimes I focus too much on details, but I'm working on improving that.",
                    "I can be a perfectionist, but I am learning to balance quality and efficiency.",
                    "I tend to be shy in new groups, but I make an effort to connect with colleagues.",
                ],
            ),
            Question::new(
                "Where do you see yourself in 5 years?",
                &[
                    "I see myself in a leadership position where I can guide teams and contribute to impactful projects.",
                    "I hope to have advanced my skills and be managing larger projects.",
                    "I want to be recognized as an expert in my field and mentor others.",
                ],
            ),
            Question::new(
                "Describe a challenging project you worked on.",
                &[
                    "I worked on a machine learning project with tight deadlines, requiring teamwork and creative problem-solving.",
                    "I developed a web application under resource constraints, learning to prioritize tasks and communicate clearly.",
                ],
            ),
            Question::new(
                "How do you handle stress and pressure?",
                &[
                    "I stay organized, break tasks into smaller steps, and maintain a positive attitude.",
                    "I use time management techniques and seek support from my team when needed.",
                ],
            ),
            Question::new(
                "Tell me about a time you showed leadership.",
                &[
                    "I led a student project team, delegating tasks and motivating members to achieve our goals.",
                    "I took initiative during a crisis, coordinating efforts and ensuring clear communication.",
                ],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bank_starts_fresh() {
        let bank = QuestionBank::default();
        assert_eq!(bank.questions().len(), 8);
        assert!(bank
            .questions()
            .iter()
            .all(|q| q.rating == 0 && q.times_asked == 0 && !q.answers.is_empty()));
        assert!(bank.stats().iter().all(|s| s.eligible));
    }

    #[test]
    fn topics_match_by_substring_of_prompt() {
        assert_eq!(
            Topic::for_question("What are your Strengths?"),
            vec![Topic::Strengths]
        );
        assert_eq!(
            Topic::for_question("How do you handle stress and pressure?"),
            vec![Topic::Stress]
        );
        assert!(Topic::for_question("Where do you see yourself in 5 years?").is_empty());
        assert!(Topic::for_question("Can you tell me about yourself?").is_empty());
    }

    #[test]
    fn keyword_matching_is_case_insensitive_and_topic_scoped() {
        let matched = matched_keywords(
            "What are your strengths?",
            "I'm a Creative PROBLEM SOLVER and very organized. I value calm.",
        );
        assert_eq!(matched, vec!["problem solver", "creative", "organized"]);

        // "calm" belongs to the stress topic, which this prompt does not select.
        assert!(!matched.iter().any(|k| k == "calm"));
        assert!(matched_keywords("Can you tell me about yourself?", "experience").is_empty());
    }

    #[test]
    fn any_topic_keyword_is_detected() {
        assert!(mentions_any_keyword("I stay CALM under pressure."));
        assert!(mentions_any_keyword("I am a Team Player."));
        assert!(!mentions_any_keyword("I like turtles."));
        assert!(matched_keywords("What are your strengths?", "I stay calm.").is_empty());
    }

    #[test]
    fn relevant_keywords_follow_topic_order() {
        let kws = relevant_keywords("Tell me about a time you showed leadership.");
        assert_eq!(kws.first(), Some(&"delegating"));
        assert_eq!(kws.len(), Topic::Leadership.keywords().len());
    }

    #[test]
    fn stats_report_eligibility() {
        let mut bank = QuestionBank::default();
        bank.questions_mut()[0].times_asked = crate::model::MAX_TIMES_ASKED;
        let stats = bank.stats();
        assert!(!stats[0].eligible);
        assert!(stats[1].eligible);
    }
}

use crate::errors::SleepError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub question: &'static str,
    pub options: [&'static str; 4],
}

pub const QUESTIONS: [Question; 5] = [
    Question {
        id: "q1",
        question: "How long did it take you to fall asleep last night?",
        options: [
            "Less than 15 minutes",
            "15-30 minutes",
            "30-60 minutes",
            "More than 60 minutes",
        ],
    },
    Question {
        id: "q2",
        question: "How many times did you wake up during last night?",
        options: ["Did not wake up", "Once", "2-3 times", "More than 3 times"],
    },
    Question {
        id: "q3",
        question: "How refreshed do you feel this morning?",
        options: [
            "Very refreshed and energetic",
            "Somewhat refreshed",
            "Still tired",
            "Exhausted",
        ],
    },
    Question {
        id: "q4",
        question: "Did you experience any of these issues last night?",
        options: [
            "Slept peacefully",
            "Light snoring or mild discomfort",
            "Restlessness or frequent movement",
            "Significant discomfort or breathing issues",
        ],
    },
    Question {
        id: "q5",
        question: "How would you rate the overall quality of last night's sleep?",
        options: [
            "Excellent - best sleep in a while",
            "Good - better than usual",
            "Fair - could have been better",
            "Poor - unsatisfactory sleep",
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentCategory {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl AssessmentCategory {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=8 => Self::Excellent,
            9..=12 => Self::Good,
            13..=16 => Self::Fair,
            _ => Self::Poor,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent Sleep Last Night",
            Self::Good => "Good Sleep Last Night",
            Self::Fair => "Fair Sleep Last Night",
            Self::Poor => "Poor Sleep Last Night",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Excellent => {
                "You had a great night's sleep! Your sleep quality indicators are very positive."
            }
            Self::Good => "Your sleep was generally good with some minor disturbances.",
            Self::Fair => "Your sleep was somewhat disrupted. Here's how to improve tonight:",
            Self::Poor => {
                "Your sleep was significantly disrupted. Let's focus on improvement for tonight:"
            }
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Self::Excellent => &[
                "Keep following your current bedtime routine",
                "Maintain your sleeping environment conditions",
                "Document what worked well for future reference",
            ],
            Self::Good => &[
                "Consider slight adjustments to your bedroom temperature",
                "Try to maintain the same bedtime tonight",
                "Reduce screen time before bed",
            ],
            Self::Fair => &[
                "Try going to bed 30 minutes earlier tonight",
                "Ensure your bedroom is dark and quiet",
                "Avoid caffeine for the rest of today",
                "Consider some light exercise during the day",
            ],
            Self::Poor => &[
                "Take a short power nap (20 mins max) if needed today",
                "Stick to a consistent bedtime tonight despite poor sleep",
                "Practice relaxation techniques before bed tonight",
                "Avoid heavy meals close to bedtime",
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssessmentRequest {
    pub answers: BTreeMap<String, u8>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AssessmentResult {
    pub score: u8,
    pub category: AssessmentCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub recommendations: &'static [&'static str],
}

pub fn score_answers(answers: &BTreeMap<String, u8>) -> Result<AssessmentResult, SleepError> {
    let mut score = 0u8;
    for question in &QUESTIONS {
        let answer = answers.get(question.id).copied().ok_or_else(|| {
            SleepError::validation(question.id, "select an answer to continue")
        })?;
        if !(1..=question.options.len() as u8).contains(&answer) {
            return Err(SleepError::validation(
                question.id,
                format!("{answer} is not one of the options"),
            ));
        }
        score += answer;
    }

    let category = AssessmentCategory::from_score(score);
    Ok(AssessmentResult {
        score,
        category,
        title: category.title(),
        description: category.description(),
        recommendations: category.recommendations(),
    })
}

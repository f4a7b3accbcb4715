//! Interview prompt builders
//!
//! Pure string builders over the job role and transcript. The
//! next-question prompt deliberately embeds only the previous question and
//! the job description, never any candidate answer, so question generation
//! stays answer-independent.

use crate::role::JobRole;
use crate::transcript::TranscriptLog;

/// Placeholder rendered for turns the candidate never answered
pub const NO_ANSWER: &str = "(no answer)";

/// System instruction describing the interviewer persona
#[must_use]
pub fn system_prompt(role: &JobRole) -> String {
    format!(
        "You are an AI Interviewer conducting a structured job interview for the role of \"{}\".\n\
         You must ask one question at a time. Keep the tone professional and concise.\n\
         Do not answer your own questions. Do not include commentary or markdown tables.",
        role.title()
    )
}

/// Opening prompt: introduces the interview and asks the first question
#[must_use]
pub fn starter_prompt(role: &JobRole) -> String {
    format!(
        "You're an AI Interviewer and you are going to recruit a candidate for the following job role: {title}.\n\
         Here's the job description:\n\n\
         {description}\n\n\
         Start with \"Introduce yourself\" as the first question.\n\
         Then, continue the interview by asking only one new question at a time\n\
         based on the job description and your previous question.\n\
         Do not include the candidate's responses, just progress naturally with appropriate questions.",
        title = role.title(),
        description = role.description(),
    )
}

/// Prompt for the next question
///
/// Embeds only the previous question and the static job description.
#[must_use]
pub fn next_question_prompt(role: &JobRole, previous_question: &str) -> String {
    format!(
        "You're conducting a job interview for the role \"{title}\".\n\
         Use this job description:\n\n\
         {description}\n\n\
         Your previous question was:\n\
         \"{previous_question}\"\n\n\
         Now, ask the next relevant question as if the candidate answered.\n\
         Do not include any commentary, instructions, or context. Output only the next question.",
        title = role.title(),
        description = role.description(),
    )
}

/// Final feedback prompt embedding the full ordered transcript
#[must_use]
pub fn feedback_prompt(role: &JobRole, log: &TranscriptLog) -> String {
    let transcript: String = log
        .turns()
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let answer = if turn.answer.is_empty() {
                NO_ANSWER
            } else {
                turn.answer.as_str()
            };
            format!("Turn {}:\nQ: {}\nA: {}\n", i + 1, turn.question, answer)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an interview feedback assistant. You are reviewing an interview for the role \"{title}\".\n\
         Use the job description and the full transcript below to provide constructive, concise feedback.\n\n\
         Job description:\n\
         {description}\n\n\
         Transcript (each turn has a question and the candidate's answer):\n\
         {transcript}\n\n\
         Return the following sections (plain text, no markdown tables):\n\
         1) Summary of strengths (3-6 bullet points)\n\
         2) Areas to improve (3-6 bullet points)\n\
         3) Evidence (short quotes or references to specific answers, if present)\n\
         4) Performance level: ONE WORD from {{Poor, Good, Excellent}}\n\n\
         Do not include any other sections. Ensure the \"Performance level\" line contains exactly one of Poor, Good, or Excellent.",
        title = role.title(),
        description = role.description(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_role() -> JobRole {
        serde_json::from_str(
            r#"{
                "id": "ai-scientist",
                "title": "AI Scientist",
                "description": "Research and build advanced models."
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn system_prompt_names_the_role() {
        let prompt = system_prompt(&test_role());
        assert!(prompt.contains("\"AI Scientist\""));
        assert!(prompt.contains("one question at a time"));
    }

    #[test]
    fn starter_prompt_opens_with_introduce_yourself() {
        let prompt = starter_prompt(&test_role());
        assert!(prompt.contains("Introduce yourself"));
        assert!(prompt.contains("Research and build advanced models."));
        assert!(prompt.contains("Do not include the candidate's responses"));
    }

    #[test]
    fn next_question_prompt_carries_previous_question() {
        let prompt = next_question_prompt(&test_role(), "Why this role?");
        assert!(prompt.contains("\"Why this role?\""));
        assert!(prompt.contains("Output only the next question"));
    }

    #[test]
    fn next_question_prompt_never_embeds_answers() {
        let mut log = TranscriptLog::new();
        log.append("Introduce yourself");
        log.attach_answer("I am a candidate with twelve cats");
        log.append("Why this role?");
        log.attach_answer("Because of the cats, obviously");

        let prompt = next_question_prompt(&test_role(), "Why this role?");

        for turn in log.turns() {
            assert!(
                !prompt.contains(&turn.answer),
                "answer text leaked into next-question prompt"
            );
        }
    }

    #[test]
    fn feedback_prompt_renders_no_answer_placeholder() {
        let mut log = TranscriptLog::new();
        log.append("Introduce yourself");
        log.attach_answer("I am a candidate");
        log.append("Why this role?");

        let prompt = feedback_prompt(&test_role(), &log);

        assert!(prompt.contains("Turn 1:\nQ: Introduce yourself\nA: I am a candidate"));
        assert!(prompt.contains("Turn 2:\nQ: Why this role?\nA: (no answer)"));
    }

    #[test]
    fn feedback_prompt_orders_turns_chronologically() {
        let mut log = TranscriptLog::new();
        log.append("Q-first");
        log.attach_answer("A-first");
        log.append("Q-second");
        log.attach_answer("A-second");

        let prompt = feedback_prompt(&test_role(), &log);
        let first = prompt.find("Q-first").unwrap();
        let second = prompt.find("Q-second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn feedback_prompt_demands_fixed_verdict_vocabulary() {
        let log = {
            let mut l = TranscriptLog::new();
            l.append("Q");
            l
        };
        let prompt = feedback_prompt(&test_role(), &log);
        assert!(prompt.contains("ONE WORD from {Poor, Good, Excellent}"));
        assert!(prompt.contains("exactly one of Poor, Good, or Excellent"));
    }
}

//! Public HTTP protocol structs (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Question, QuestionId, QuestionType, Session, SessionResult, UserAnswer};
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicsDto {
    pub topics: Vec<String>,
}

/// Question as presented to the user: no correctness data.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionDto {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub topic: String,
    pub subject: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDto {
    pub session_id: String,
    pub topics: Vec<String>,
    pub questions: Vec<QuestionDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserAnswerDto {
    pub question_id: QuestionId,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserAnswersListDto {
    pub answers_list: Vec<UserAnswerDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResultDto {
    pub is_success: bool,
    pub grade: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDto {
    pub status_code: u16,
    pub err_msg: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

pub fn question_out(q: &Question) -> QuestionDto {
    QuestionDto {
        id: q.id(),
        question_type: q.question_type(),
        topic: q.topic().to_string(),
        subject: q.subject().to_string(),
        variants: q.variants(),
    }
}

pub fn session_out(s: &Session) -> SessionDto {
    SessionDto {
        session_id: s.session_id().to_string(),
        topics: s.topics().to_vec(),
        questions: s.questions().iter().map(question_out).collect(),
    }
}

pub fn result_out(r: &SessionResult) -> SessionResultDto {
    SessionResultDto { is_success: r.is_success, grade: r.grade }
}

impl UserAnswersListDto {
    /// Build domain answers; a bad entry at the boundary is a client error.
    pub fn into_answers(self) -> Result<Vec<UserAnswer>> {
        self.answers_list
            .into_iter()
            .map(|a| {
                UserAnswer::new(a.question_id, a.answers)
                    .map_err(|e| Error::InvalidParam(format!("create user answer failure: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrueOrFalseQuestion;
    use crate::error::ErrorKind;

    #[test]
    fn question_dto_hides_correct_answer() {
        let q: Question = TrueOrFalseQuestion::new(12, "math", "0 is even", true).unwrap().into();
        let json = serde_json::to_value(question_out(&q)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 12,
                "question_type": "true_or_false",
                "topic": "math",
                "subject": "0 is even",
                "variants": ["true", "false"],
            })
        );
    }

    #[test]
    fn zero_question_id_in_body_is_invalid_param() {
        let body: UserAnswersListDto = serde_json::from_str(
            r#"{"answers_list":[{"question_id":1,"answers":["a"]},{"question_id":0,"answers":[]}]}"#,
        )
        .unwrap();
        let err = body.into_answers().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
    }
}

//! Prompt templates for generation and classification

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the visitor's answer in the classifier prompt
pub const UTTERANCE_PLACEHOLDER: &str = "{text}";

const TRIAGE_RECOMMEND: &str = "당신은 병원 키오스크 접수 어시스턴트입니다.
- 사용자가 말한 증상에 따라 가장 적절한 진료과 1개만 추천하세요.
- 예: \"그런 증상은 [진료과]가 적절합니다.\" 또는 \"신경과를 추천드립니다.\"
- **접수, 위치 안내, 대기시간 안내는 하지 마세요.**
";

const TRIAGE_REGISTER: &str = "당신은 병원 키오스크 접수 어시스턴트입니다.
- 이전에 추천한 진료과로 접수를 진행합니다.
- 접수 완료 후 해당 진료과의 **위치**와 **예상 대기시간**을 안내하세요.
- 이후에는 사용자의 질문에 친절하게 답변하세요.
";

const DIRECTION: &str = "당신은 병원 길안내 키오스크 도우미입니다.
- 사용자가 말한 진료과와 기타장소의 위치를 친절하고 간결하게 안내하세요.
- 건물명, 층수, 방향, 엘레베이터 위치, 계단 위치 등을 포함해 실제 병원에서 길을 알려주는 것처럼 설명하세요.
- 예: \"정형외과는 본관 3층입니다. 오른쪽으로 가세요.\", \"피부과는 별관 2층 오른쪽으로 앞에 보이는 엘리베이터를 이용하세요.\"
";

const CLASSIFIER: &str = "다음 사용자의 대답이 긍정인지 부정인지 판단해 주세요.
- 가능한 응답은 반드시 '긍정', '부정', '모르겠음' 중 하나여야 합니다.
- 다양한 표현도 고려하세요.

예시:
Q: 네 → A: 긍정
Q: 아니오 → A: 부정
Q: 해줘 → A: 긍정
Q: 응 → A: 긍정
Q: 싫어 → A: 부정
Q: 잘 모르겠어요 → A: 모르겠음
Q: {text}
A:";

/// System instructions for each generation role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Recommends one department from a symptom
    #[serde(default = "default_triage_recommend")]
    pub triage_recommend: String,

    /// Completes the registration and answers follow-ups
    #[serde(default = "default_triage_register")]
    pub triage_register: String,

    #[serde(default = "default_direction")]
    pub direction: String,

    /// Few-shot yes/no prompt; must contain `{text}`
    #[serde(default = "default_classifier")]
    pub classifier: String,
}

fn default_triage_recommend() -> String {
    TRIAGE_RECOMMEND.to_string()
}
fn default_triage_register() -> String {
    TRIAGE_REGISTER.to_string()
}
fn default_direction() -> String {
    DIRECTION.to_string()
}
fn default_classifier() -> String {
    CLASSIFIER.to_string()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            triage_recommend: default_triage_recommend(),
            triage_register: default_triage_register(),
            direction: default_direction(),
            classifier: default_classifier(),
        }
    }
}

impl PromptsConfig {
    /// Render the classifier prompt for one answer
    pub fn classifier_prompt(&self, text: &str) -> String {
        self.classifier.replace(UTTERANCE_PLACEHOLDER, text.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_prompt_substitutes_answer() {
        let prompts = PromptsConfig::default();
        let rendered = prompts.classifier_prompt("  응 좋아요 ");
        assert!(rendered.contains("Q: 응 좋아요\nA:"));
        assert!(!rendered.contains(UTTERANCE_PLACEHOLDER));
    }

    #[test]
    fn test_default_prompts_present() {
        let prompts = PromptsConfig::default();
        assert!(prompts.triage_recommend.contains("진료과 1개"));
        assert!(prompts.direction.contains("길안내"));
        assert!(prompts.classifier.contains(UTTERANCE_PLACEHOLDER));
    }
}

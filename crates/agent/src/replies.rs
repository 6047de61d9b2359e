//! Fixed kiosk replies

pub const FAREWELL: &str = "이용해주셔서 감사합니다. 건강하세요!";

pub const LOOKUP_START: &str = "접수 내역을 확인하겠습니다. 이름을 말씀해주세요.";
pub const REGISTER_START: &str = "접수를 시작하겠습니다. 이름을 말씀해주세요.";
pub const DIRECTION_START: &str = "어느 곳으로 가시나요?";
pub const MENU_REPROMPT: &str = "죄송합니다. '접수', '접수내역확인', '길찾기' 중 하나로 말씀해주세요.";

pub const ASK_PHONE: &str = "전화번호를 말씀해주세요.";
pub const ASK_ADDRESS: &str = "주소를 말씀해주세요.";
pub const ASK_SYMPTOM: &str = "불편하신 증상을 말씀해주세요.";

pub const RETRY_NAME: &str = "다시 이름을 말씀해주세요.";
pub const RETRY_PHONE: &str = "다시 전화번호를 말씀해주세요.";
pub const RETRY_ADDRESS: &str = "다시 주소를 말씀해주세요.";

pub const ESCALATION: &str = "입력 오류가 반복되었습니다. 직원을 호출하겠습니다.";
pub const CONFIRM_UNSURE: &str =
    "잘 이해하지 못했습니다. 맞으면 '네', 아니면 '아니오'라고 말씀해주세요.";

pub const TRIAGE_DECLINED: &str = "접수를 원하지 않으시면 처음부터 다시 진행해 주세요.";
pub const TRIAGE_UNSURE: &str = "잘 이해하지 못했습니다. 접수 원하시면 '네'라고 말씀해주세요.";

pub const LOOKUP_MISS: &str = "접수된 내역이 없습니다.";

pub const NOT_HEARD: &str = "잘 듣지 못했습니다. 다시 말씀해주세요.";

/// Reply when generation fails; the dialogue stays where it was
pub const TRY_AGAIN: &str = "죄송합니다. 응답을 생성하지 못했습니다. 다시 한 번 말씀해주세요.";

pub fn confirm_name(name: &str) -> String {
    format!("{name}님, 맞습니까?")
}

pub fn confirm_phone(phone: &str) -> String {
    format!("{phone} 번호가 맞습니까?")
}

pub fn confirm_address(address: &str) -> String {
    format!("{address} 주소가 맞습니까?")
}

pub fn triage_offer(recommendation: &str) -> String {
    format!("{recommendation}\n\n이 진료과로 접수해 드릴까요?")
}

/// Message added to the registration history when a department is accepted
pub fn registration_request(name: &str, department: &str) -> String {
    format!("{name}님 {department}로 접수해 주세요")
}

pub fn lookup_ask_phone(name: &str) -> String {
    format!("{name}님, 전화번호를 말씀해주세요.")
}

pub fn lookup_hit(name: &str, date: &str, time: &str, department: &str) -> String {
    format!("{name}님은 {date} {time}에 {department}로 접수되어 있습니다.")
}

//! Prompt assembly for English to Korean localisation.
//!
//! The prompt is a pure function of [`TranslationConfiguration`]; every row of a batch is sent
//! with the same master prompt and only the source sentence changes.

use crate::tabular::ColumnRef;
use crate::utils::{Result, TranslatorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Daily Life", alias = "daily-life")]
    DailyLife,
    #[serde(alias = "business")]
    Business,
    #[serde(alias = "travel")]
    Travel,
    #[serde(alias = "news")]
    News,
    #[serde(alias = "academic")]
    Academic,
    #[serde(alias = "entertainment")]
    Entertainment,
    #[serde(alias = "health")]
    Health,
    #[serde(alias = "technology")]
    Technology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(alias = "beginner")]
    Beginner,
    #[serde(alias = "elementary")]
    Elementary,
    #[serde(alias = "intermediate")]
    Intermediate,
    #[serde(alias = "advanced")]
    Advanced,
}

/// Category and level chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfiguration {
    pub category: Category,
    pub level: Level,
}

impl TranslationConfiguration {
    pub fn new(category: Category, level: Level) -> Self {
        Self { category, level }
    }
}

impl fmt::Display for TranslationConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.category, self.level)
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::DailyLife,
        Category::Business,
        Category::Travel,
        Category::News,
        Category::Academic,
        Category::Entertainment,
        Category::Health,
        Category::Technology,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::DailyLife => "Daily Life",
            Category::Business => "Business",
            Category::Travel => "Travel",
            Category::News => "News",
            Category::Academic => "Academic",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Technology => "Technology",
        }
    }

    fn guideline(self) -> &'static str {
        match self {
            Category::DailyLife => DAILY_LIFE_GUIDE,
            Category::Business => BUSINESS_GUIDE,
            Category::Travel => TRAVEL_GUIDE,
            Category::News => NEWS_GUIDE,
            Category::Academic => ACADEMIC_GUIDE,
            Category::Entertainment => ENTERTAINMENT_GUIDE,
            Category::Health => HEALTH_GUIDE,
            Category::Technology => TECHNOLOGY_GUIDE,
        }
    }
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Beginner,
        Level::Elementary,
        Level::Intermediate,
        Level::Advanced,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Elementary => "Elementary",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    fn guideline(self) -> &'static str {
        match self {
            Level::Beginner => BEGINNER_GUIDE,
            Level::Elementary => ELEMENTARY_GUIDE,
            Level::Intermediate => INTERMEDIATE_GUIDE,
            Level::Advanced => ADVANCED_GUIDE,
        }
    }
}

fn normalize_option(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_ascii_lowercase()
}

impl FromStr for Category {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_option(s);
        Category::ALL
            .into_iter()
            .find(|c| normalize_option(c.name()) == wanted)
            .ok_or_else(|| TranslatorError::UnknownOption {
                kind: "category",
                value: s.to_string(),
            })
    }
}

impl FromStr for Level {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_option(s);
        Level::ALL
            .into_iter()
            .find(|l| normalize_option(l.name()) == wanted)
            .ok_or_else(|| TranslatorError::UnknownOption {
                kind: "level",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn master_prompt(config: &TranslationConfiguration) -> String {
    format!(
        "You are Uphone's Localization Specialist.\n\
         Translate the text from **English** to **Korean**.\n\n\
         {GROUND_RULES}\n\n\
         {COMMON_ERRORS}\n\n\
         # Category-Specific Guidelines\n\
         [Category: {category}]\n\
         {category_guide}\n\n\
         # Level-Specific Guidelines\n\
         [Level: {level}]\n\
         {level_guide}\n\n\
         [Technical Instruction]\n\
         - AI will automatically detect content type (Dialogue/Script/Article) and adjust tone accordingly\n\
         - Only output the translated Korean text\n\
         - Do not add explanations\n",
        category = config.category,
        category_guide = config.category.guideline(),
        level = config.level,
        level_guide = config.level.guideline(),
    )
}

/// The full text sent to the model for one source sentence.
pub fn request_text(config: &TranslationConfiguration, source: &str) -> String {
    format!(
        "{}\n\n[Source Text]: {}\n[Translation]:",
        master_prompt(config),
        source
    )
}

/// Prompt handed to a human team together with the spreadsheet.
pub fn handoff_prompt(
    config: &TranslationConfiguration,
    source: ColumnRef,
    target: ColumnRef,
) -> String {
    format!(
        "# Role Definition\n{}\n\
         # [INPUT DATA]\n\
         1. Read the Excel file.\n\
         2. Translate the content in **Column {}** (English).\n\
         3. Put the result in **Column {}** (Korean).\n",
        master_prompt(config),
        source,
        target
    )
}

const GROUND_RULES: &str = r#"# Absolute Ground Rules (Non-negotiable)
1. **Zero 'You' Policy:** NEVER translate 'You' as '당신'. Omit subject or use context-appropriate titles.
2. **Anti-Passive Voice:** Use Active Voice. (X) "~에 의해 ~되다" -> (O) "강사가 취소했다"
3. **Subject-Drop Freedom:** Omit unnecessary subjects (I/We) if context is clear.
4. **Word Order Liberation:** Don't mimic English order. Rearrange for natural Korean flow.
5. **Sentence Fusion:** Combine/split sentences for better rhythm.
6. **Natural Predicate Choice:** Don't translate verbs 1:1. Use natural Korean predicates.
7. **Connector Naturalization:** Avoid mechanical "And, But". Use natural endings (~하는데).
8. **Tense Flexibility:** Don't force 'Have p.p'. Use context-based tense.
9. **Pronoun Minimization:** Avoid repetitive He/She/It.
10. **Formality Calibration:** Follow the Tone defined in Category settings.
11. **No Hallucination:** Fact must match 100%. No adding/omitting info.
12. **Bold/Tag Preservation:** Preserve markdown bold (`**`) and variables (`{name}`) exactly."#;

const COMMON_ERRORS: &str = r#"# Common Translation Errors to AVOID
1. **Spacing:** 문장 끝 다음 띄어쓰기, 쉼표 뒤 띄어쓰기, 조사 앞 붙여쓰기
2. **Quotation:** 인용문 정확히 처리, 원문 없으면 따옴표 추가 금지
3. **Parentheses:** 괄호 최소화 (유명 인명에 영어 표기 불필요)
4. **Symbols:** 대시(—), 슬래시(/) 남용 금지
5. **Entity Names:** 동일 회사/기관 표기 통일
6. **Balance:** 자연스러운 의역 우선, 핵심 의미 누락 금지
7. **Tone:** 한 문서 내 "-요"/"-습니다" 혼용 금지
8. **Numbers:** 만/억 단위 사용, 쉼표 위치 확인
9. **Connectors:** 원문 없는 "하지만", "특히" 추가 금지
10. **Terms:** 전문 용어는 업계 표준 번역 사용"#;

const DAILY_LIFE_GUIDE: &str = r#"**특징:**
- 자연스러운 구어체 우선
- 외래어보다 한국어 대체어 선호
- 실생활 표현 그대로

**기본 말투:** polite (~요)

**말투 자동 조정:**
- 원문에 casual 신호 (Wanna, Gonna, Dude, bro) → casual 전환
- 원문에 formal 신호 (Would you, Could you, Sir/Ma'am) → formal 전환
- 대화 맥락이 있으면 관계 파악하여 조정

**예시:**
- "Wanna grab lunch?" → casual → "점심 먹을래?"
- "Would you like to have lunch?" → polite → "점심 드실래요?"
- "Let's have lunch" → 기본 polite → "점심 먹어요""#;

const BUSINESS_GUIDE: &str = r#"**특징:**
- 정중하고 전문적인 톤
- 업무 용어는 외래어 허용 (미팅, 이메일, 리포트 등)
- 격식 있는 표현

**기본 말투:** polite~formal

**예시:**
- "Let's schedule a meeting" → "회의 일정을 잡겠습니다"
- "I'll follow up on this" → "이 건은 제가 후속 조치하겠습니다"
- "Could you review the proposal?" → "제안서 검토 부탁드립니다""#;

const TRAVEL_GUIDE: &str = r#"**특징:**
- 실용적이고 명확하게
- 여행 상황별 맥락 반영
- 지명/고유명사는 외래어 유지

**기본 말투:** polite

**예시:**
- "Where's the nearest subway station?" → "가장 가까운 지하철역이 어디예요?"
- "I'd like to check in" → "체크인하려고요"
- "How much is this?" → "이거 얼마예요?""#;

const NEWS_GUIDE: &str = r#"**특징:**
- 객관적이고 간결한 서술
- 감정 표현 배제
- 사실 전달 중심
- 전문 용어 정확히

**기본 말투:** formal (-다/-습니다)

**예시:**
- "The company announced a major restructuring" → "회사는 대규모 구조조정을 발표했다"
- "Experts predict economic growth will slow" → "전문가들은 경제 성장이 둔화될 것으로 예측한다"
- "The government introduced new regulations" → "정부는 새로운 규제를 도입했다""#;

const ACADEMIC_GUIDE: &str = r#"**특징:**
- 논리적이고 명확한 표현
- 학술 용어 정확히
- 논거가 분명하게

**기본 말투:** polite~formal

**예시:**
- "In my opinion, this approach is more effective" → "제 생각에는 이 접근 방식이 더 효과적입니다"
- "Research shows that students benefit from" → "연구에 따르면 학생들은 ~로부터 도움을 받는다"
- "Let's discuss the pros and cons" → "장단점을 논의해 봅시다""#;

const ENTERTAINMENT_GUIDE: &str = r#"**특징:**
- 생동감 있고 재미있게
- 감정/분위기 살리기
- 유행어/신조어 적절히 활용

**기본 말투:** casual~polite

**예시:**
- "That's hilarious!" → "완전 웃겨!" / "진짜 재밌네!"
- "I'm a huge fan of this show" → "이 프로 완전 팬이야"
- "The plot twist was amazing" → "반전이 대박이었어""#;

const HEALTH_GUIDE: &str = r#"**특징:**
- 정확하고 신중하게
- 의학 용어는 한글 또는 설명 추가
- 오해 없도록 명확히

**기본 말투:** polite~formal

**예시:**
- "Take this medication twice a day" → "이 약은 하루 두 번 복용하세요"
- "You should get enough rest" → "충분한 휴식이 필요합니다"
- "Consult your doctor if symptoms persist" → "증상이 지속되면 의사와 상담하세요""#;

const TECHNOLOGY_GUIDE: &str = r#"**특징:**
- 전문적이되 이해하기 쉽게
- 기술 용어는 외래어 유지
- 약어는 그대로 (API, AI, UI 등)

**기본 말투:** polite~formal

**예시:**
- "Update the software to the latest version" → "소프트웨어를 최신 버전으로 업데이트하세요"
- "The AI system processes data in real-time" → "AI 시스템은 데이터를 실시간으로 처리한다"
- "Click on the settings icon" → "설정 아이콘을 클릭하세요""#;

const BEGINNER_GUIDE: &str = r#"**특징:**
- 가장 기본적이고 쉬운 단어
- 짧고 단순한 문장 구조
- 한 문장에 하나의 의미만
- 어려운 표현은 쉽게 풀어서

**예시:**
- "I'm feeling under the weather" → "몸이 안 좋아" / "아파"
- "Let's call it a day" → "오늘은 여기까지 하자"
- "I'm swamped with work" → "일이 너무 많아""#;

const ELEMENTARY_GUIDE: &str = r#"**특징:**
- 일상적인 표현 사용
- 기본적인 관용구 포함 가능
- 자연스럽되 복잡하지 않게

**예시:**
- "I'm feeling under the weather" → "컨디션이 별로야"
- "Let's call it a day" → "오늘은 이만 마무리하자"
- "I'm swamped with work" → "일이 엄청 많아""#;

const INTERMEDIATE_GUIDE: &str = r#"**특징:**
- 자연스러운 관용 표현 활용
- 뉘앙스 살리기
- 다양한 어휘 사용

**예시:**
- "I'm feeling under the weather" → "몸 상태가 좋지 않아"
- "Let's call it a day" → "오늘은 여기서 마치자"
- "I'm swamped with work" → "일에 치여 있어" / "일이 산더미야""#;

const ADVANCED_GUIDE: &str = r#"**특징:**
- 원어민 수준의 자연스러움
- 문화적 뉘앙스까지 반영
- 상황에 따른 미묘한 차이 표현

**예시:**
- "I'm feeling under the weather" → "몸이 영 개운치 않네"
- "Let's call it a day" → "오늘은 이쯤에서 접자"
- "I'm swamped with work" → "일에 파묻혀 있어" / "일 때문에 정신이 하나도 없어""#;

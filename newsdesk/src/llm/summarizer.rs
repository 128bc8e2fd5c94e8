// Summarize and refine prompts, and the marker-based response split
use tracing::{info, warn};

use super::{ChatMessage, LlmProvider, LlmRequest};
use crate::error::{AppError, Result};

/// Heading the model is asked to put in front of the summary section
pub const SUMMARY_HEADING: &str = "📄 요약:";
/// Heading that separates the insights section from the summary
pub const INSIGHTS_HEADING: &str = "🔍 심층 인사이트";
/// Shown in the insights pane when the model did not echo [`INSIGHTS_HEADING`]
pub const INSIGHTS_PLACEHOLDER: &str = "인사이트를 생성하지 못했습니다.";

pub const SUMMARY_MAX_TOKENS: usize = 4000;
pub const REFINE_MAX_TOKENS: usize = 3000;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a seasoned news analyst. You read articles critically, \
separate reported facts from claims, and explain the wider context in clear, precise language. \
당신은 기사의 사실과 맥락을 정확하게 짚어내는 숙련된 뉴스 분석가입니다.";

const REFINE_SYSTEM_PROMPT: &str = "You are an editing assistant that revises news summaries \
according to reader feedback while staying faithful to the facts of the original summary. \
당신은 독자의 의견에 맞춰 뉴스 요약을 다듬는 편집 도우미입니다.";

/// Summary and insights split out of one model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub summary: String,
    pub insights: String,
}

fn summary_prompt(content: &str) -> String {
    format!(
        r#"다음 뉴스 기사를 분석해 주세요. / Please analyze the following news article.

아래 형식을 정확히 지켜 한국어로 답변하세요. / Answer in Korean, following this format exactly:

{SUMMARY_HEADING}
(기사의 핵심 내용을 5~7줄로 요약 / a 5-7 line summary of the key points)

{INSIGHTS_HEADING}
(배경, 의미, 파급 효과, 전망을 4~5개 문단으로 분석 / 4-5 paragraphs on background, significance, impact and outlook)

기사 본문 / Article:
{content}
"#
    )
}

fn refine_prompt(current_summary: &str, instruction: &str) -> String {
    format!(
        r#"현재 요약 / Current summary:
{current_summary}

사용자 의견 / Reader feedback:
{instruction}

의견을 반영하여 요약 전체를 다시 작성하고, 수정된 요약만 출력하세요.
Rewrite the whole summary applying the feedback and output only the revised summary.
"#
    )
}

/// Split a summarize response on [`INSIGHTS_HEADING`].
///
/// The model is only asked to echo the headings; nothing guarantees it does.
/// Without the insights heading the whole trimmed response is the summary and
/// the insights fall back to [`INSIGHTS_PLACEHOLDER`].
pub fn split_summary_response(raw: &str) -> SummaryResult {
    match raw.split_once(INSIGHTS_HEADING) {
        Some((before, after)) => {
            let summary = before.replacen(SUMMARY_HEADING, "", 1).trim().to_string();
            let insights = after.trim_start().trim_start_matches(':').trim().to_string();
            SummaryResult { summary, insights }
        }
        None => SummaryResult {
            summary: raw.trim().to_string(),
            insights: INSIGHTS_PLACEHOLDER.to_string(),
        },
    }
}

/// Ask the provider for a summary + insights of `content`
pub async fn summarize_article<P: LlmProvider + ?Sized>(
    provider: &P,
    content: &str,
    max_tokens: usize,
) -> Result<SummaryResult> {
    if content.trim().is_empty() {
        return Err(AppError::validation("요약할 기사 내용이 없습니다"));
    }

    let request = LlmRequest {
        messages: vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(summary_prompt(content)),
        ],
        max_tokens: Some(max_tokens),
        temperature: None,
        timeout_seconds: None,
    };

    let response = provider.generate(request).await.map_err(|e| {
        warn!(error = %e, "LLM summarization failed");
        AppError::Api(e)
    })?;

    let result = split_summary_response(&response.content);
    if result.insights == INSIGHTS_PLACEHOLDER {
        warn!("insights heading missing from LLM response");
    }
    info!(
        model = %response.model,
        tokens = response.usage.total_tokens,
        summary_chars = result.summary.chars().count(),
        insights_chars = result.insights.chars().count(),
        "LLM summarization successful"
    );
    Ok(result)
}

/// Rewrite `current_summary` according to `instruction`; the reply replaces it wholesale
pub async fn refine_summary<P: LlmProvider + ?Sized>(
    provider: &P,
    current_summary: &str,
    instruction: &str,
    max_tokens: usize,
) -> Result<String> {
    if instruction.trim().is_empty() {
        return Err(AppError::validation("API 키와 개선 의견을 입력해주세요"));
    }
    if current_summary.trim().is_empty() {
        return Err(AppError::validation("다듬을 요약이 없습니다. 먼저 기사를 요약해주세요"));
    }

    let request = LlmRequest {
        messages: vec![
            ChatMessage::system(REFINE_SYSTEM_PROMPT),
            ChatMessage::user(refine_prompt(current_summary, instruction)),
        ],
        max_tokens: Some(max_tokens),
        temperature: None,
        timeout_seconds: None,
    };

    let response = provider.generate(request).await.map_err(|e| {
        warn!(error = %e, "LLM refinement failed");
        AppError::Api(e)
    })?;

    info!(
        model = %response.model,
        tokens = response.usage.total_tokens,
        "LLM refinement successful"
    );
    Ok(response.content)
}

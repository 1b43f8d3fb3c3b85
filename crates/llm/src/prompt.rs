//! Fact-Check Prompt
//!
//! The single prompt template sent to every provider. It embeds the claim, an
//! optional block of page/video context and the target language, and pins the
//! answer to one JSON schema.

use std::fmt::Write;

use chrono::SecondsFormat;
use truth_detective_core::Context;

const NOT_AVAILABLE: &str = "Not available";

const INSTRUCTIONS: &str = r#"INSTRUCTIONS:
1. **Context Understanding**: First, understand what is being presented and gather all relevant context about the claim, including the source website's credibility and the surrounding context.

2. **Source Credibility Assessment**: Evaluate the credibility of the source website:
   - Check the domain reputation and history
   - Assess the website's track record for accuracy
   - Consider the author's credentials and expertise
   - Evaluate the publication date and relevance

3. **Comprehensive Research**: Search the internet, social media platforms (including X/Twitter), academic databases, news sources, and official websites to gather information from all available sources.

4. **Intelligent Analysis**: Determine if the information is:
   - Current and up-to-date
   - Accurate and factual
   - Properly interpreted
   - Complete or missing important context
   - Biased or misleading
   - Outdated or superseded by newer information

5. **Trust Score Assignment**: Assign a "Trust Score" from 0-100 where:
   - 0-20: Completely false or misleading
   - 21-40: Mostly false with some truth
   - 41-60: Partially true but incomplete/misleading
   - 61-80: Mostly true with minor issues
   - 81-100: Completely accurate and trustworthy

6. **Verification**: Cross-reference the claim with real, verifiable sources including:
   - Official government websites
   - Academic research papers
   - Reputable news organizations
   - Expert statements and interviews
   - Primary source documents

7. **Response Format**: Provide your analysis in this exact JSON format:

{
  "truthScore": <number between 0-100>,
  "analysis": "<SHORT explanation (2-3 sentences) of your findings>",
  "evidence": "<DETAILED explanation with specific facts, dates, sources, and reasoning for your trust score>",
  "sources": ["<verifiable source 1>", "<verifiable source 2>", "<verifiable source 3>"],
  "corrections": ["<specific correction 1 if needed>", "<specific correction 2 if needed>"],
  "sourceCredibility": "<assessment of the source website's credibility>",
  "contextualNotes": "<any relevant notes about the context or surrounding information>"
}"#;

/// Language name used in the "Respond in ..." line.
pub fn language_name(code: &str) -> &str {
    if code == "en" {
        "English"
    } else {
        code
    }
}

fn context_block(context: &Context) -> String {
    let mut block = String::from("\n\nCONTEXTUAL INFORMATION:\n");
    // Writing into a String cannot fail.
    let _ = writeln!(block, "- Website: {}", context.domain);
    let _ = writeln!(block, "- Page Title: \"{}\"", context.title);
    let _ = writeln!(block, "- URL: {}", context.url);
    let _ = writeln!(
        block,
        "- Publication Date: {}",
        context.publication_date.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(
        block,
        "- Author: {}",
        context.author.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(
        block,
        "- Timestamp: {}",
        context.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    if let Some(surrounding) = &context.surrounding_text {
        let _ = writeln!(block, "- Text Before Claim: \"{}\"", surrounding.before);
        let _ = writeln!(block, "- Text After Claim: \"{}\"", surrounding.after);
    }
    if let Some(site) = context.site_name() {
        let _ = writeln!(block, "- Site Name: {}", site);
    }
    if let Some(kind) = context.content_type() {
        let _ = writeln!(block, "- Content Type: {}", kind);
    }
    block.truncate(block.trim_end().len());
    block
}

/// Build the fact-check prompt for `text`.
pub fn build_fact_check_prompt(text: &str, context: Option<&Context>, language: &str) -> String {
    let context_info = context.map(context_block).unwrap_or_default();

    format!(
        "You are an expert fact-checking AI assistant with comprehensive research capabilities. \
Your task is to thoroughly analyze and verify the following claim in its full context:\n\n\
CLAIM TO VERIFY: \"{text}\"{context_info}\n\n\
{INSTRUCTIONS}\n\n\
Respond in {language}. Be thorough, objective, and provide specific evidence for your conclusions. \
Consider the source website's reputation and the surrounding context when evaluating the claim.",
        language = language_name(language),
    )
}

/// User turn sent alongside the prompt by chat-style providers.
pub fn claim_message(text: &str) -> String {
    format!("Please fact-check this claim: \"{}\"", text)
}

//! Outbound prompt construction.
//!
//! Page text is cut to [`MAX_TEXT_CHARS`] characters and links to [`MAX_LINKS`] entries
//! before anything is sent to a provider. The cut is lossy: the model only ever sees
//! this prefix of the page.

use crate::content::WebsiteContent;

pub const MAX_TEXT_CHARS: usize = 2000;
pub const MAX_LINKS: usize = 20;

pub const SYSTEM_PROMPT: &str = "You are a security expert analyzing websites for threats, \
scams, and phishing attempts. Respond only with JSON.";

const RESPONSE_FORMAT: &str = r#"Format your response as JSON with the following structure:
{
  "risk": "LOW",
  "reasons": ["Reason 1", "Reason 2", "Reason 3"],
  "confidenceScore": 0.8
}"#;

const SECURITY_CHECKLIST: &str = r#"Perform a comprehensive security analysis with these specific checks:

1. REPUTATION CHECK: Based on your knowledge, determine if this site has been reported for scams, fraud, or malicious activities. Consider if this URL appears on known blocklists or has negative reports online.

2. BRAND IMPERSONATION: If the site claims to represent or be affiliated with known companies (especially big brands like Apple, Microsoft, Amazon, banks, etc.), verify if the domain is legitimate. Look for:
   - Slight misspellings (e.g., "arnazon.com" instead of "amazon.com")
   - Domain variations (e.g., "microsoft-support.com" instead of "microsoft.com")
   - Unusual TLDs (e.g., ".xyz", ".online" instead of expected ".com", ".org")

3. LINK CONSISTENCY: Examine the external links (especially for About, Contact, Legal pages). Check if they:
   - Use the same domain as the main site
   - Redirect to unexpected domains
   - Mix HTTP and HTTPS protocols suspiciously

4. CONTENT ANALYSIS: Look for:
   - Urgency or pressure tactics
   - Claims of unrealistic rewards, prizes, or returns
   - Poor grammar or inconsistent language quality
   - Requests for personal/financial information
   - Limited or suspicious contact information

5. TECHNICAL INDICATORS: Consider:
   - Mismatched or missing SSL certificates
   - Newly registered domains
   - Unusual redirect chains
   - Use of URL shorteners for critical links"#;

/// First `MAX_TEXT_CHARS` characters (not bytes) of the page text.
pub fn truncated_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn truncated_links(links: &[String]) -> &[String] {
    &links[..links.len().min(MAX_LINKS)]
}

fn page_summary(content: &WebsiteContent) -> String {
    format!(
        "Analyze this website for security threats, scams, or phishing attempts.\n\
         URL: {}\n\
         Title: {}\n\
         Content: {}...\n\
         Links: {}",
        content.url,
        content.title,
        truncated_text(&content.text),
        truncated_links(&content.links).join(", "),
    )
}

/// User message for chat-completion providers (paired with [`SYSTEM_PROMPT`]).
pub fn chat_user_message(content: &WebsiteContent) -> String {
    format!(
        "{}\n\n\
         Please provide:\n\
         1. A security risk assessment (SAFE, LOW, MEDIUM, HIGH, or CRITICAL)\n\
         2. Specific reasons for your assessment (list at least 3 points)\n\
         3. A confidence score between 0 and 1 indicating how certain you are\n\n\
         {RESPONSE_FORMAT}",
        page_summary(content)
    )
}

/// Single prompt for generate-content providers, with the detailed checklist.
pub fn generate_prompt(content: &WebsiteContent) -> String {
    format!(
        "{}\n\n\
         {SECURITY_CHECKLIST}\n\n\
         Please provide:\n\
         1. A security risk assessment (SAFE, LOW, MEDIUM, HIGH, or CRITICAL)\n\
         2. Specific reasons for your assessment (list at least 3 points with details)\n\
         3. A confidence score between 0 and 1 indicating how certain you are\n\n\
         {RESPONSE_FORMAT}",
        page_summary(content)
    )
}

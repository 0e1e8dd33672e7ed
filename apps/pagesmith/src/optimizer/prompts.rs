// Prompt constants for the SEO optimization pass.

/// System prompt for optimization. Enforces HTML-only output.
pub const OPTIMIZE_SYSTEM: &str = "You are an SEO editor for French service pages. \
    You correct existing HTML so that it passes an SEO audit. \
    You MUST respond with the corrected HTML only. \
    Do NOT wrap it in markdown code fences. \
    Do NOT add comments, notes, or explanations of your changes.";

/// Optimization prompt template.
/// Replace: {business_context}, {issues}, {content}
pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"{business_context}

The page below failed an SEO audit. Fix EVERY issue listed, keeping the meaning,
the tone, the facts, and the overall length (±20%).

ISSUES TO FIX:
{issues}

RULES:
1. Keep exactly one <h1>, containing the main keyword
2. Keep every existing internal link; add some only if an issue asks for it
3. Do not invent prices, phone numbers, addresses, or statistics
4. If a meta description is requested, add <meta name="description" content="..."> as the first line
5. Output the complete corrected HTML and nothing else

PAGE HTML:
{content}"#;

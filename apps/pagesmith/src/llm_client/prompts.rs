// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Business context injected into every content prompt.
pub const BUSINESS_CONTEXT: &str = "\
    The client is a premium VTC (private chauffeur) company based on the French Riviera: \
    airport and station transfers, long-distance rides, events, business travel. \
    Pages are written in French for French-speaking customers, with a professional, \
    reassuring tone. Never invent prices, phone numbers, or licence numbers.";

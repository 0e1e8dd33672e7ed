// Page generation: outline planning, section drafting, and assembly.
// All LLM calls go through llm_client, no direct provider calls here.

pub mod assembler;
pub mod models;
pub mod planner;
pub mod prompts;
pub mod sections;

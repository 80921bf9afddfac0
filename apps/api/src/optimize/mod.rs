// Resume optimization: multipart intake, text extraction, single LLM rewrite.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod optimizer;
pub mod prompts;

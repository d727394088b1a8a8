use crate::search::LookupResult;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that classifies companies into industries. You ONLY respond with valid JSON.";

/// Builds the classification request for one company.
pub fn build_prompt(name: &str, lookup: &LookupResult, industries: &[String]) -> String {
    let lookup = lookup.to_pretty_json();
    let allowed = industries.join("\n");
    format!(
        "
We have a single client:

Name: {name}

Here is info we found on them (from Tavily/web lookup):
{lookup}

Please classify this client into **one** of the following industries (and ONLY one), and give me a confidence percentage (0–100%).
Reply in JSON:

{{
  \"industry\": \"<one of the list>\",
  \"confidence\": <number>
}}

Allowed industries:
{allowed}
"
    )
}

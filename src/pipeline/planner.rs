//! Planner stage: a pure, rule-based decomposition of the user query.
//!
//! No I/O and no model call. The planner runs synchronously when a run is
//! created, so every run starts with a completed planner step at index 0.

/// Derive an ordered list of sub-questions from the research query.
pub fn derive_plan(query: &str) -> Vec<String> {
    let topic = query.trim();

    vec![
        format!("What is {topic} and why does it matter?"),
        format!("What are the main benefits or advantages of {topic}?"),
        format!("What are the risks, limitations, or counterarguments around {topic}?"),
        format!("What do current sources recommend about {topic}?"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_is_deterministic() {
        assert_eq!(
            derive_plan("benefits of hydration"),
            derive_plan("benefits of hydration")
        );
    }

    #[test]
    fn test_plan_embeds_topic() {
        let plan = derive_plan("  rust async runtimes  ");
        assert_eq!(plan.len(), 4);
        for question in &plan {
            assert!(question.contains("rust async runtimes"));
        }
    }
}

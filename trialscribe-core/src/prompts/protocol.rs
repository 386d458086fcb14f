//! Protocol generation prompt
//!
//! The rendered prompt is a pure function of the request and the disease
//! template. Segments are separated by a blank line and always appear in the
//! same order, so changing one input only changes its own segment.

use crate::config::constants::prompts::{PROTOCOL_HEADER, SECTION_CHECKLIST};
use crate::protocol::ProtocolRequest;
use crate::templates::Template;
use serde_json::Value;

/// Render the protocol generation prompt
pub fn build_protocol_prompt(request: &ProtocolRequest, template: &Template) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(6);

    segments.push(PROTOCOL_HEADER.to_string());

    segments.push(format!(
        "Disease: {}\nPhase: {}\nPopulation: {} patients\nDuration: {} weeks",
        request.disease_type, request.phase, request.population_size, request.duration_weeks
    ));

    let endpoints = match request.endpoints.as_deref() {
        Some(endpoints) if !endpoints.is_empty() => endpoints,
        _ => template.primary_endpoints.as_slice(),
    };
    segments.push(format!("Primary Endpoints: {}", endpoints.join(", ")));

    if !template.inclusion_criteria.is_empty() {
        let mut block = String::from("Baseline Inclusion Criteria:");
        for criterion in &template.inclusion_criteria {
            block.push_str(&format!("\n- {criterion}"));
        }
        segments.push(block);
    }

    if let Some(criteria) = request.additional_criteria.as_ref().filter(|c| !c.is_empty()) {
        let mut block = String::from("Additional Criteria:");
        for (key, value) in criteria {
            block.push_str(&format!("\n- {key}: {}", render_value(value)));
        }
        segments.push(block);
    }

    let mut checklist = String::from("Include detailed sections for:");
    for (index, section) in SECTION_CHECKLIST.iter().enumerate() {
        checklist.push_str(&format!("\n{}. {section}", index + 1));
    }
    segments.push(checklist);

    segments.push(format!(
        "Make sure to incorporate standard requirements for {} trials and phase {} specific considerations.",
        request.disease_type, request.phase
    ));

    segments.join("\n\n")
}

/// Strings render raw; everything else as compact JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::StudyPhase;
    use crate::templates::TemplateStore;
    use serde_json::json;

    fn psoriasis_request() -> ProtocolRequest {
        ProtocolRequest::new("psoriasis", StudyPhase::Phase2, 200, 12)
    }

    #[test]
    fn test_psoriasis_prompt_contents() {
        let store = TemplateStore::builtin();
        let request = psoriasis_request();
        let prompt = build_protocol_prompt(&request, store.get(&request.disease_type));

        assert!(prompt.starts_with(PROTOCOL_HEADER));
        assert!(prompt.contains("Disease: psoriasis"));
        assert!(prompt.contains("Phase: 2"));
        assert!(prompt.contains("Population: 200 patients"));
        assert!(prompt.contains("Duration: 12 weeks"));
        assert!(prompt.contains("Primary Endpoints: PASI 75 at Week 12, IGA score of 0/1 at Week 12"));
        assert!(prompt.contains("- PASI score ≥ 12"));
        assert!(prompt.contains("8. Ethical Considerations"));
        assert!(prompt.ends_with(
            "Make sure to incorporate standard requirements for psoriasis trials and phase 2 specific considerations."
        ));
    }

    #[test]
    fn test_segments_in_fixed_order() {
        let store = TemplateStore::builtin();
        let request = psoriasis_request().with_criterion("washout_weeks", 4);
        let prompt = build_protocol_prompt(&request, store.get("psoriasis"));

        let positions: Vec<usize> = [
            "Disease:",
            "Phase:",
            "Population:",
            "Duration:",
            "Primary Endpoints:",
            "Baseline Inclusion Criteria:",
            "Additional Criteria:",
            "Include detailed sections for:",
            "Make sure to incorporate",
        ]
        .iter()
        .map(|marker| prompt.find(marker).unwrap())
        .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_explicit_endpoints_override_template() {
        let store = TemplateStore::builtin();
        let request = psoriasis_request().with_endpoints(["PASI 90 at Week 16"]);
        let prompt = build_protocol_prompt(&request, store.get("psoriasis"));
        assert!(prompt.contains("Primary Endpoints: PASI 90 at Week 16\n"));
        assert!(!prompt.contains("PASI 75"));
    }

    #[test]
    fn test_empty_endpoints_fall_back_to_template() {
        let store = TemplateStore::builtin();
        let request = psoriasis_request().with_endpoints(Vec::<String>::new());
        let prompt = build_protocol_prompt(&request, store.get("psoriasis"));
        assert!(prompt.contains("Primary Endpoints: PASI 75 at Week 12"));
    }

    #[test]
    fn test_unknown_disease_keeps_empty_endpoints_line() {
        let store = TemplateStore::builtin();
        let request = ProtocolRequest::new("unknown-disease", StudyPhase::Phase1, 30, 8);
        let prompt = build_protocol_prompt(&request, store.get(&request.disease_type));

        assert!(prompt.contains("\nPrimary Endpoints: \n"));
        assert!(!prompt.contains("Baseline Inclusion Criteria:"));
        assert!(!prompt.contains("Additional Criteria:"));
    }

    #[test]
    fn test_additional_criteria_render_in_caller_order() {
        let template = Template::default();
        let request = psoriasis_request()
            .with_criterion("prior_biologics", false)
            .with_criterion("region", "EU")
            .with_criterion("age_range", json!([18, 65]));
        let prompt = build_protocol_prompt(&request, &template);

        assert!(prompt.contains(
            "Additional Criteria:\n- prior_biologics: false\n- region: EU\n- age_range: [18,65]"
        ));
    }

    #[test]
    fn test_only_criteria_segment_changes() {
        let template = TemplateStore::builtin().get("psoriasis").clone();
        let base = build_protocol_prompt(&psoriasis_request(), &template);
        let with_criteria = build_protocol_prompt(
            &psoriasis_request().with_criterion("region", "EU"),
            &template,
        );

        let inserted = "Additional Criteria:\n- region: EU\n\n";
        assert_eq!(with_criteria.replacen(inserted, "", 1), base);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let template = TemplateStore::builtin().get("psoriasis").clone();
        let request = psoriasis_request().with_criterion("region", "EU");
        assert_eq!(
            build_protocol_prompt(&request, &template),
            build_protocol_prompt(&request.clone(), &template)
        );
    }
}

use super::args::GenerateArgs;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use trialscribe_core::{ClinicalTrialAssistant, ProtocolRequest, StudyPhase};

/// Handle the generate command
pub async fn handle_generate_command(
    assistant: &ClinicalTrialAssistant,
    args: GenerateArgs,
) -> Result<()> {
    let request = build_request(&args)?;

    let protocol = assistant
        .generate_protocol(&request)
        .await
        .context("Protocol generation failed")?;

    let rendered = serde_json::to_string_pretty(&protocol)?;
    if let Some(output) = &args.output {
        fs::write(output, &rendered)
            .with_context(|| format!("Failed to write protocol to {}", output.display()))?;
        tracing::info!(path = %output.display(), "protocol saved");
    }
    println!("{rendered}");

    if let Some(question) = args.ask.as_deref() {
        let answer = assistant
            .answer_query(question, Some(&protocol))
            .await
            .context("Query failed")?;
        println!();
        println!("{answer}");
    }

    Ok(())
}

fn build_request(args: &GenerateArgs) -> Result<ProtocolRequest> {
    let phase = StudyPhase::try_from(args.phase)?;
    let mut request = ProtocolRequest::new(&args.disease, phase, args.population, args.duration);

    if !args.endpoints.is_empty() {
        request = request.with_endpoints(args.endpoints.iter().cloned());
    }

    for (key, raw) in &args.criteria {
        request = request.with_criterion(key.clone(), parse_value(raw));
    }

    Ok(request)
}

/// JSON scalars and arrays stay typed; anything else is a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> GenerateArgs {
        GenerateArgs {
            disease: "psoriasis".to_string(),
            phase: 3,
            population: 400,
            duration: 52,
            endpoints: vec![],
            criteria: vec![
                ("washout_weeks".to_string(), "12".to_string()),
                ("region".to_string(), "EU".to_string()),
                ("prior_biologics".to_string(), "false".to_string()),
            ],
            ask: None,
            output: None,
        }
    }

    #[test]
    fn test_build_request_from_args() {
        let request = build_request(&args()).unwrap();
        assert_eq!(request.phase, StudyPhase::Phase3);
        assert!(request.endpoints.is_none());

        let criteria = request.additional_criteria.unwrap();
        let values: Vec<&Value> = criteria.values().collect();
        assert_eq!(values, vec![&json!(12), &json!("EU"), &json!(false)]);
    }

    #[test]
    fn test_endpoints_are_forwarded() {
        let mut args = args();
        args.endpoints = vec!["PASI 90 at Week 16".to_string()];
        let request = build_request(&args).unwrap();
        assert_eq!(request.endpoints, Some(vec!["PASI 90 at Week 16".to_string()]));
    }
}

use crate::config::constants::prompts::{DEFAULT_SYSTEM_CONTEXT, QUERY_CONTEXT_INTRO};
use crate::protocol::Protocol;

/// System context for a follow-up question, optionally grounded in a protocol
pub fn build_query_context(protocol_context: Option<&Protocol>) -> String {
    match protocol_context {
        Some(protocol) => format!(
            "{DEFAULT_SYSTEM_CONTEXT}\n\n{QUERY_CONTEXT_INTRO}\n\nProtocol:\n{}",
            protocol.to_context_string()
        ),
        None => DEFAULT_SYSTEM_CONTEXT.to_string(),
    }
}

/// Normalize whitespace in a query answer
///
/// Line endings become `\n`, trailing whitespace is removed from each line,
/// runs of blank lines collapse to one, and the result is trimmed.
pub fn format_query_response(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in normalized.lines() {
        let line = line.trim_end();
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(line);
        previous_blank = blank;
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolSection;

    #[test]
    fn test_context_without_protocol_is_default_persona() {
        assert_eq!(build_query_context(None), DEFAULT_SYSTEM_CONTEXT);
    }

    #[test]
    fn test_context_embeds_protocol_json() {
        let protocol: Protocol = serde_json::from_value(serde_json::json!({
            "overview": "Phase 2 psoriasis study",
            "objectives": "",
            "endpoints": "PASI 75 at Week 12",
            "inclusion": "",
            "exclusion": "",
            "procedures": "",
            "safety": ""
        }))
        .unwrap();

        let context = build_query_context(Some(&protocol));
        assert!(context.starts_with(DEFAULT_SYSTEM_CONTEXT));
        assert!(context.contains(QUERY_CONTEXT_INTRO));
        assert!(context.contains("\"endpoints\": \"PASI 75 at Week 12\""));
        assert_eq!(protocol.get(ProtocolSection::Overview), "Phase 2 psoriasis study");
    }

    #[test]
    fn test_format_query_response_normalizes_whitespace() {
        let raw = "\r\n  Washout is 4 weeks.  \r\n\r\n\r\n\n- Topicals: 2 weeks\t\n\n";
        assert_eq!(
            format_query_response(raw),
            "Washout is 4 weeks.\n\n- Topicals: 2 weeks"
        );
    }

    #[test]
    fn test_format_query_response_keeps_inner_spacing() {
        assert_eq!(format_query_response("a  b\n  indented"), "a  b\n  indented");
    }
}

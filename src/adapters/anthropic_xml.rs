//! Anthropic XML function-calling adapter.
//!
//! Functions are called with XML tags:
//!
//! ```text
//! <function_calls>
//! <invoke name="function_name">
//! <parameter name="param_name">param_value</parameter>
//! </invoke>
//! </function_calls>
//! ```
//!
//! Parsing is pattern based, not a full XML parser: parameter values are
//! taken verbatim and may not contain `<`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

use super::adapter::{
    decode_embedded_value, expect_envelope, expect_text, stringify_value, ProtocolAdapter,
};
use crate::error::{Error, Result};
use crate::protocol::{Envelope, WireMessage, ANTHROPIC_XML_PROTOCOL, CANONICAL_PROTOCOL};

const ADAPTER_NAME: &str = "anthropic-xml-adapter";
const ADAPTER_VERSION: &str = "1.0.0";

fn invoke_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<invoke name="([^"]+)">"#).expect("invoke pattern is valid"))
}

fn parameter_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<parameter name="([^"]+)">([^<]+)</parameter>"#)
            .expect("parameter pattern is valid")
    })
}

fn results_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<function_results>\s*<([^>]+)>(.*)</([^>]+)>\s*</function_results>")
            .expect("results pattern is valid")
    })
}

/// A parsed `<function_calls>` block.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub parameters: Map<String, Value>,
}

/// A parsed `<function_results>` block.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult {
    pub name: String,
    pub content: Value,
}

/// A tool definition to advertise in Anthropic's `<function>` syntax.
///
/// Each entry of `parameters` is a property schema; entries carrying
/// `"required": true` are listed as required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ToolDefinition {
    /// Names of the parameters flagged as required, in declaration order.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|(_, schema)| schema.get("required").and_then(Value::as_bool) == Some(true))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Adapter between canonical envelopes and Anthropic XML function calls.
#[derive(Debug, Clone, Default)]
pub struct AnthropicXmlAdapter {
    strict: bool,
}

impl AnthropicXmlAdapter {
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Reject JSON-looking parameter values that fail to parse instead of
    /// keeping them as text.
    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Convert a canonical envelope to an Anthropic XML function call.
    ///
    /// Names and values are written verbatim. A name containing `"` or a
    /// value containing `<` does not survive `from_xml`.
    pub fn to_xml(&self, envelope: &Envelope) -> String {
        let mut xml = String::from("<function_calls>\n");
        xml.push_str(&format!("<invoke name=\"{}\">\n", envelope.kind()));

        for (key, value) in envelope.content() {
            xml.push_str(&format!(
                "<parameter name=\"{}\">{}</parameter>\n",
                key,
                stringify_value(value)
            ));
        }

        xml.push_str("</invoke>\n");
        xml.push_str("</function_calls>");
        xml
    }

    /// Convert an Anthropic XML function call to a canonical envelope.
    pub fn from_xml(&self, xml: &str) -> Result<Envelope> {
        let call = self.parse_function_call(xml)?;

        Envelope::builder(call.name, ADAPTER_NAME)
            .content(call.parameters)
            .build()
    }

    /// Extract the function name and parameters of a function call.
    pub fn parse_function_call(&self, xml: &str) -> Result<FunctionCall> {
        let name = invoke_pattern()
            .captures(xml)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::malformed(ANTHROPIC_XML_PROTOCOL, "missing function name", xml))?;

        let mut parameters = Map::new();
        for caps in parameter_pattern().captures_iter(xml) {
            let key = &caps[1];
            let raw = &caps[2];
            parameters.insert(
                key.to_string(),
                decode_embedded_value(ANTHROPIC_XML_PROTOCOL, raw, self.strict)?,
            );
        }

        Ok(FunctionCall { name, parameters })
    }

    /// Create an Anthropic XML function call response.
    pub fn create_function_call_response(&self, function_name: &str, content: &Value) -> String {
        format!(
            "<function_results>\n<{name}>{content}</{name}>\n</function_results>",
            name = function_name,
            content = stringify_value(content)
        )
    }

    /// Parse an Anthropic XML function call response.
    pub fn parse_function_call_response(&self, xml: &str) -> Result<FunctionResult> {
        let caps = results_pattern()
            .captures(xml)
            .ok_or_else(|| Error::malformed(ANTHROPIC_XML_PROTOCOL, "invalid function results", xml))?;

        let name = &caps[1];
        if name != &caps[3] {
            return Err(Error::malformed(
                ANTHROPIC_XML_PROTOCOL,
                format!("result tag <{}> closed by </{}>", name, &caps[3]),
                xml,
            ));
        }

        Ok(FunctionResult {
            name: name.to_string(),
            content: decode_embedded_value(ANTHROPIC_XML_PROTOCOL, &caps[2], self.strict)?,
        })
    }

    /// Render one tool definition as `<function>{json}</function>`.
    pub fn tool_definition_to_xml(&self, tool: &ToolDefinition) -> Result<String> {
        let blob = json!({
            "description": tool.description,
            "name": tool.name,
            "parameters": {
                "properties": tool.parameters,
                "required": tool.required_parameters(),
                "type": "object",
            },
        });

        Ok(format!("<function>{}</function>", serde_json::to_string(&blob)?))
    }

    /// Render several tool definitions inside a `<functions>` block.
    pub fn tool_definitions_to_xml(&self, tools: &[ToolDefinition]) -> Result<String> {
        let functions = tools
            .iter()
            .map(|tool| self.tool_definition_to_xml(tool))
            .collect::<Result<Vec<_>>>()?;

        Ok(format!("<functions>\n{}\n</functions>", functions.join("\n")))
    }
}

impl ProtocolAdapter for AnthropicXmlAdapter {
    fn name(&self) -> &str {
        ADAPTER_NAME
    }

    fn version(&self) -> &str {
        ADAPTER_VERSION
    }

    fn native_protocol(&self) -> &str {
        ANTHROPIC_XML_PROTOCOL
    }

    fn adapt_message(&self, message: WireMessage, target_protocol: &str) -> Result<WireMessage> {
        match target_protocol {
            ANTHROPIC_XML_PROTOCOL => {
                let envelope = expect_envelope(ANTHROPIC_XML_PROTOCOL, message)?;
                Ok(WireMessage::Text(self.to_xml(&envelope)))
            }
            CANONICAL_PROTOCOL => {
                let xml = expect_text(ANTHROPIC_XML_PROTOCOL, message)?;
                Ok(WireMessage::Envelope(self.from_xml(&xml)?))
            }
            other => Err(Error::UnsupportedProtocol(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Priority;

    fn search_envelope() -> Envelope {
        Envelope::builder("search", "planner")
            .param("query", "cats")
            .param("limit", 5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_encode_search_call() {
        let xml = AnthropicXmlAdapter::new().to_xml(&search_envelope());

        assert!(xml.contains("<invoke name=\"search\">"));
        assert!(xml.contains("<parameter name=\"query\">cats</parameter>"));
        assert!(xml.contains("<parameter name=\"limit\">5</parameter>"));
        assert_eq!(
            xml,
            "<function_calls>\n<invoke name=\"search\">\n\
             <parameter name=\"query\">cats</parameter>\n\
             <parameter name=\"limit\">5</parameter>\n\
             </invoke>\n</function_calls>"
        );
    }

    #[test]
    fn test_encode_composites_as_json() {
        let envelope = Envelope::builder("bulk", "planner")
            .param("ids", json!([1, 2, 3]))
            .param("filter", json!({"kind": "cat"}))
            .build()
            .unwrap();
        let xml = AnthropicXmlAdapter::new().to_xml(&envelope);

        assert!(xml.contains("<parameter name=\"ids\">[1,2,3]</parameter>"));
        assert!(xml.contains("<parameter name=\"filter\">{\"kind\":\"cat\"}</parameter>"));
    }

    #[test]
    fn test_decode_lookup_call() {
        let xml = r#"<function_calls><invoke name="lookup"><parameter name="ids">[1,2,3]</parameter></invoke></function_calls>"#;
        let envelope = AnthropicXmlAdapter::new().from_xml(xml).unwrap();

        assert_eq!(envelope.kind(), "lookup");
        assert_eq!(envelope.content()["ids"], json!([1, 2, 3]));
        assert_eq!(envelope.version(), "2.0");
        assert_eq!(envelope.priority(), Priority::Medium);
        assert_eq!(envelope.source(), "anthropic-xml-adapter");
        assert!(envelope.target().is_none());
        assert!(envelope.metadata().timeout().is_none());
        assert!(envelope.metadata().retries().is_none());
    }

    #[test]
    fn test_decode_keeps_parameter_order() {
        let xml = "<function_calls>\n<invoke name=\"f\">\n\
                   <parameter name=\"b\">1</parameter>\n\
                   <parameter name=\"a\">2</parameter>\n\
                   <parameter name=\"c\">3</parameter>\n\
                   </invoke>\n</function_calls>";
        let envelope = AnthropicXmlAdapter::new().from_xml(xml).unwrap();
        let keys: Vec<&str> = envelope.content().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_decode_missing_invoke_is_malformed() {
        let err = AnthropicXmlAdapter::new()
            .from_xml("<function_calls></function_calls>")
            .unwrap_err();
        match err {
            Error::MalformedProtocol { protocol, snippet, .. } => {
                assert_eq!(protocol, ANTHROPIC_XML_PROTOCOL);
                assert_eq!(snippet, "<function_calls></function_calls>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_invalid_embedded_json_is_kept() {
        let xml = r#"<invoke name="f"><parameter name="p">{invalid json</parameter></invoke>"#;
        let envelope = AnthropicXmlAdapter::new().from_xml(xml).unwrap();
        assert_eq!(envelope.content()["p"], json!("{invalid json"));

        let xml = r#"<invoke name="f"><parameter name="p">{invalid json}</parameter></invoke>"#;
        let envelope = AnthropicXmlAdapter::new().from_xml(xml).unwrap();
        assert_eq!(envelope.content()["p"], json!("{invalid json}"));
    }

    #[test]
    fn test_strict_mode_rejects_invalid_embedded_json() {
        let xml = r#"<invoke name="f"><parameter name="p">{invalid json}</parameter></invoke>"#;
        let err = AnthropicXmlAdapter::with_strict(true).from_xml(xml).unwrap_err();
        assert!(matches!(err, Error::MalformedProtocol { .. }));
    }

    #[test]
    fn test_round_trip_string_parameters() {
        let adapter = AnthropicXmlAdapter::new();
        let sent = Envelope::builder("search", ADAPTER_NAME)
            .param("query", "cats")
            .param("sort", "newest")
            .param("tags", json!(["a", "b"]))
            .build()
            .unwrap();

        let decoded = adapter.from_xml(&adapter.to_xml(&sent)).unwrap();
        assert!(decoded.same_payload(&sent));
        assert_ne!(decoded.id(), sent.id());
    }

    #[test]
    fn test_adapt_message_directions() {
        let adapter = AnthropicXmlAdapter::new();

        let xml = adapter
            .adapt_message(WireMessage::Envelope(search_envelope()), ANTHROPIC_XML_PROTOCOL)
            .unwrap();
        assert!(xml.as_text().unwrap().starts_with("<function_calls>"));

        let back = adapter.adapt_message(xml, CANONICAL_PROTOCOL).unwrap();
        assert_eq!(back.as_envelope().unwrap().kind(), "search");

        let err = adapter
            .adapt_message(WireMessage::Envelope(search_envelope()), "google-a2a-v1.0")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProtocol(p) if p == "google-a2a-v1.0"));
    }

    #[test]
    fn test_adapt_message_wrong_input_form() {
        let adapter = AnthropicXmlAdapter::new();
        let err = adapter
            .adapt_message(WireMessage::Text("<x/>".to_string()), ANTHROPIC_XML_PROTOCOL)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedProtocol { .. }));
    }

    #[test]
    fn test_can_handle() {
        let adapter = AnthropicXmlAdapter::new();
        assert!(adapter.can_handle("a2a-v2.0"));
        assert!(adapter.can_handle("anthropic-xml-v1.0"));
        assert!(!adapter.can_handle("anthropic-xml-v2.0"));
    }

    #[test]
    fn test_function_call_response() {
        let adapter = AnthropicXmlAdapter::new();
        assert_eq!(
            adapter.create_function_call_response("search", &json!({"count": 3})),
            "<function_results>\n<search>{\"count\":3}</search>\n</function_results>"
        );
        assert_eq!(
            adapter.create_function_call_response("echo", &json!("hi")),
            "<function_results>\n<echo>hi</echo>\n</function_results>"
        );
    }

    #[test]
    fn test_parse_function_call_response() {
        let adapter = AnthropicXmlAdapter::new();

        let parsed = adapter
            .parse_function_call_response("<function_results>\n<search>{\"count\":3}</search>\n</function_results>")
            .unwrap();
        assert_eq!(parsed.name, "search");
        assert_eq!(parsed.content, json!({"count": 3}));

        let text = adapter
            .parse_function_call_response("<function_results><echo>line one\nline two</echo></function_results>")
            .unwrap();
        assert_eq!(text.content, json!("line one\nline two"));

        let lenient = adapter
            .parse_function_call_response("<function_results><f>[1,2</f></function_results>")
            .unwrap();
        assert_eq!(lenient.content, json!("[1,2"));
    }

    #[test]
    fn test_parse_function_call_response_rejects_mismatch() {
        let adapter = AnthropicXmlAdapter::new();
        assert!(adapter
            .parse_function_call_response("<function_results><a>1</b></function_results>")
            .is_err());
        assert!(adapter.parse_function_call_response("<results/>").is_err());
    }

    #[test]
    fn test_tool_definition_to_xml() {
        let tool: ToolDefinition = serde_json::from_value(json!({
            "name": "search",
            "description": "Search the web",
            "parameters": {
                "query": {"type": "string", "required": true},
                "limit": {"type": "integer", "required": false},
                "lang": {"type": "string", "required": true}
            }
        }))
        .unwrap();

        assert_eq!(tool.required_parameters(), vec!["query", "lang"]);

        let xml = AnthropicXmlAdapter::new().tool_definition_to_xml(&tool).unwrap();
        assert!(xml.starts_with("<function>{\"description\":\"Search the web\",\"name\":\"search\","));
        assert!(xml.ends_with("\"required\":[\"query\",\"lang\"],\"type\":\"object\"}}</function>"));

        let inner = xml.trim_start_matches("<function>").trim_end_matches("</function>");
        let blob: Value = serde_json::from_str(inner).unwrap();
        assert_eq!(blob["parameters"]["properties"]["limit"]["type"], "integer");
    }

    #[test]
    fn test_tool_definitions_to_xml() {
        let tools = vec![
            ToolDefinition {
                name: "a".to_string(),
                description: "first".to_string(),
                parameters: Map::new(),
            },
            ToolDefinition {
                name: "b".to_string(),
                description: "second".to_string(),
                parameters: Map::new(),
            },
        ];
        let xml = AnthropicXmlAdapter::new().tool_definitions_to_xml(&tools).unwrap();

        assert!(xml.starts_with("<functions>\n<function>"));
        assert!(xml.ends_with("</function>\n</functions>"));
        assert_eq!(xml.matches("<function>").count(), 2);
    }
}

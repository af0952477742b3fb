//! System prompt construction for the reasoning loop.
//!
//! The fixed instruction template mandates the THOUGHT/ACTION/ANSWER
//! protocol; the currently healthy tools are interpolated as one
//! `name(param: type, …): description` line each. Exhausted tools are
//! already filtered out by the registry, so the model is never invited to
//! retry a broken tool.

use vesper_core::tool::ToolDescriptor;

/// Build the system prompt for one loop iteration.
///
/// An optional caller-supplied prefix (persona, extra context) is placed
/// ahead of the instruction template.
pub fn build_system_prompt(tools: &[ToolDescriptor], prefix: Option<&str>) -> String {
    let mut prompt = String::with_capacity(1024);

    if let Some(prefix) = prefix {
        let prefix = prefix.trim();
        if !prefix.is_empty() {
            prompt.push_str(prefix);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str(
        "You are a capable on-device assistant. You can use tools to act on \
         the user's device and answer questions.\n\n",
    );

    if tools.is_empty() {
        prompt.push_str("No tools are currently available.\n");
    } else {
        prompt.push_str("Available tools:\n");
        for tool in tools {
            prompt.push_str("- ");
            prompt.push_str(&tool.prompt_line());
            prompt.push('\n');
        }
    }

    prompt.push_str(
        "\nOn every turn, respond with a THOUGHT line followed by exactly ONE of:\n\
         ACTION: tool_name {\"param\": \"value\"}\n\
         ANSWER: <your final answer to the user>\n\n\
         Rules:\n\
         - Emit exactly one ACTION or one ANSWER per turn, never both.\n\
         - ACTION parameters must be a single-line JSON object.\n\
         - After an ACTION you will receive an OBSERVATION with the tool's result.\n\
         - When no tool is needed, answer directly with ANSWER.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.into(),
            description: format!("The {name} tool"),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "arg": { "type": "string" } },
                "required": ["arg"]
            }),
            requires_network: false,
        }
    }

    #[test]
    fn lists_each_tool_once() {
        let prompt = build_system_prompt(&[descriptor("show_toast"), descriptor("open_app")], None);
        assert!(prompt.contains("- show_toast(arg: string): The show_toast tool"));
        assert!(prompt.contains("- open_app(arg: string): The open_app tool"));
        assert!(prompt.contains("ACTION: tool_name"));
        assert!(prompt.contains("ANSWER:"));
    }

    #[test]
    fn empty_tool_list_is_stated() {
        let prompt = build_system_prompt(&[], None);
        assert!(prompt.contains("No tools are currently available."));
    }

    #[test]
    fn prefix_goes_first() {
        let prompt = build_system_prompt(&[], Some("Speak like a pirate."));
        assert!(prompt.starts_with("Speak like a pirate."));
    }
}

use fsnodes_core::{
    InputSchema, InputSpec, Node, NodeContext, NodeError, NodeInputs, NodeMetadata, NodeOutput,
    OutputKind, OutputSpec,
};

use crate::webhook::{webhook_payload, WebhookClient};

/// Posts a single named property to an arbitrary URL.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebhookNode;

impl Node for WebhookNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "webhook_sender",
            display_name: "[FS] Webhook",
            category: "Custom/Webhook",
            output: OutputSpec {
                name: "status",
                kind: OutputKind::String,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::string("webhook_url").with_default(""))
            .required(InputSpec::string("property_name").with_default(""))
            .required(InputSpec::string("property_value").multiline().with_default(""))
            .optional(InputSpec::string("identifier").with_default(""))
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let url = inputs.text("webhook_url")?.trim();
        let payload = webhook_payload(
            inputs.text("property_name")?,
            inputs.text("property_value")?,
            inputs.opt_text("identifier"),
        );

        let result = WebhookClient::new(&ctx.config().webhook)
            .and_then(|client| client.post(url, &payload));

        match result {
            Ok(status) => {
                let message = format!("Success: {}", status.as_u16());
                ctx.info(message.clone());
                Ok(NodeOutput::Text(message))
            }
            Err(err) => {
                let message = format!("Error: {}", err);
                ctx.error(message.clone());
                Ok(NodeOutput::Text(message))
            }
        }
    }
}

use fsnodes_core::{
    is_skippable_prompt, ChatRequest, InputSchema, InputSpec, Node, NodeContext, NodeError,
    NodeInputs, NodeMetadata, NodeOutput, OutputKind, OutputSpec, ResponseFormat,
};

use super::openai::token_budget;
use super::run_chat;

const BRAND_VOICE_MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo", "gpt-4o"];

pub const BRAND_VOICES: &[&str] = &[
    "Cheerful",
    "Professional",
    "Friendly",
    "Inquisitive",
    "Sarcastic",
    "Formal",
    "Casual",
    "Direct",
    "Informative",
    "Inspirational",
    "Persuasive",
    "Technical",
    "Humorous",
    "Empathetic",
    "Caring",
    "Confident",
    "Assertive",
    "Respectful",
    "Authoritative",
    "Enthusiastic",
    "Energetic",
    "Sincere",
    "Curious",
    "Helpful",
    "Supportive",
    "Playful",
    "Imaginative",
    "Creative",
    "Bold",
    "Daring",
    "Adventurous",
    "Optimistic",
    "Motivational",
    "Encouraging",
    "Inspiring",
    "Challenging",
    "Reassuring",
    "Comforting",
    "Relatable",
    "Approachable",
    "Warm",
    "Welcoming",
    "Inviting",
    "Engaging",
    "Captivating",
    "Compelling",
    "Thoughtful",
    "Considerate",
    "Kind",
    "Gentle",
    "Patient",
    "Understanding",
    "Tolerant",
    "Accepting",
    "Resilient",
    "Persistent",
    "Determined",
    "Focused",
    "Driven",
    "Ambitious",
    "Passionate",
    "Dedicated",
    "Devoted",
    "Loyal",
    "Committed",
    "Trustworthy",
    "Honest",
    "Transparent",
    "Authentic",
    "Genuine",
];

const REWRITE_INSTRUCTION: &str = "You are a highly skilled language model specialized in adjusting tones and voices of content. Your task is to reformat and rewrite the provided text in a clear, coherent, and engaging way that aligns with the specified brand voice. Ensure that the restructured text stays true to the original message while reflecting the desired tone.

Brand Voice: {brand_voice}

Guidelines:
- Respect the structure and key points of the original text.
- Use vocabulary, phrasing, and sentence style that align with the chosen voice.
- Make the tone consistent throughout the response.

Reformat the following text:";

pub(crate) fn rewrite_instruction(brand_voice: &str) -> String {
    REWRITE_INSTRUCTION.replace("{brand_voice}", brand_voice)
}

/// Rewrites the prompt in one of the fixed brand voices.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrandVoiceNode;

impl Node for BrandVoiceNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "openai_brand_voice_reformatter",
            display_name: "[FS] OpenAI Brand Voice Reformatter",
            category: "llm",
            output: OutputSpec {
                name: "response",
                kind: OutputKind::String,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::choice("model", BRAND_VOICE_MODELS))
            .required(InputSpec::choice("brand_voice", BRAND_VOICES))
            .required(InputSpec::float("temperature", 1.0, 0.0, 2.0, 0.01))
            .required(InputSpec::int("max_completion_tokens", 100, 0, 4000))
            .optional(InputSpec::string("prompt").multiline())
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let prompt = inputs.opt_text("prompt").unwrap_or_default();
        if is_skippable_prompt(prompt) {
            return Ok(NodeOutput::Empty);
        }

        let request = ChatRequest {
            response_format: ResponseFormat::Text,
            temperature: inputs.float("temperature")?,
            max_completion_tokens: token_budget(inputs)?,
            ..ChatRequest::new(
                inputs.text("model")?,
                rewrite_instruction(inputs.text("brand_voice")?),
                prompt,
            )
        };

        Ok(run_chat(ctx, &request))
    }
}

//! OpenAI chat-completions model invoker.

use super::{ModelInvoker, ModelResponse};
use crate::config::{ModelSettings, Prompts};
use crate::conversation::{Conversation, Message, ToolCallRequest};
use crate::error::{Result, SwellError};
use crate::openai::create_client_with_timeout;
use crate::tools::ToolDeclaration;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Delay before the first retry; doubled on each further attempt.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Model invoker backed by the OpenAI chat completions API.
pub struct OpenAIInvoker {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_retries: u32,
    system_instruction: String,
}

impl OpenAIInvoker {
    /// Create an invoker from configuration.
    pub fn from_settings(settings: &ModelSettings, prompts: &Prompts) -> Result<Self> {
        let client = create_client_with_timeout(
            Duration::from_secs(settings.timeout_secs),
            settings.api_base.as_deref(),
        )?;

        Ok(Self {
            client,
            model: settings.name.clone(),
            temperature: settings.temperature,
            max_retries: settings.max_retries,
            system_instruction: prompts.system_instruction(),
        })
    }

    /// Replace the system instruction.
    pub fn with_system_instruction(mut self, instruction: String) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Set retries for failed model calls.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    fn build_request(
        &self,
        conversation: &Conversation,
        declarations: &[ToolDeclaration],
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(to_request_message(&Message::system(
            self.system_instruction.clone(),
        ))?);
        for message in conversation {
            messages.push(to_request_message(message)?);
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !declarations.is_empty() {
            args.tools(tool_definitions(declarations));
        }

        args.build().map_err(invocation_error)
    }
}

#[async_trait]
impl ModelInvoker for OpenAIInvoker {
    #[instrument(skip_all, fields(model = %self.model, messages = conversation.len()))]
    async fn invoke(
        &self,
        conversation: &Conversation,
        declarations: &[ToolDeclaration],
    ) -> Result<ModelResponse> {
        let request = self.build_request(conversation, declarations)?;

        let mut attempt = 0;
        let response = loop {
            match self.client.chat().create(request.clone()).await {
                Ok(response) => break response,
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt.min(6));
                    attempt += 1;
                    warn!(
                        "Model call failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(invocation_error(e)),
            }
        };

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SwellError::ModelInvocation("No response from model".to_string()))?;

        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(from_tool_call)
            .collect();

        debug!("Model returned {} tool call(s)", tool_calls.len());

        Ok(ModelResponse::from_parts(choice.message.content, tool_calls))
    }
}

/// Failures worth another attempt: timeouts, refused connections and server
/// side errors. Rate limits are already retried inside the client.
fn is_transient(error: &OpenAIError) -> bool {
    match error {
        OpenAIError::Reqwest(e) => e.is_timeout() || e.is_connect(),
        OpenAIError::ApiError(api) => api.r#type.as_deref() == Some("server_error"),
        _ => false,
    }
}

fn invocation_error(e: impl std::fmt::Display) -> SwellError {
    SwellError::ModelInvocation(e.to_string())
}

/// Convert a transcript message into the OpenAI request format.
fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let converted: ChatCompletionRequestMessage = match message {
        Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(invocation_error)?
            .into(),
        Message::Human { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(invocation_error)?
            .into(),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(text) = content {
                args.content(text.clone());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(tool_calls.iter().map(to_tool_call).collect::<Vec<_>>());
            }
            args.build().map_err(invocation_error)?.into()
        }
        Message::Tool {
            tool_call_id,
            content,
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(tool_call_id.clone())
            .content(content.clone())
            .build()
            .map_err(invocation_error)?
            .into(),
    };
    Ok(converted)
}

fn to_tool_call(request: &ToolCallRequest) -> ChatCompletionMessageToolCall {
    // Arguments that failed to parse are kept as the raw string the model sent.
    let arguments = match &request.arguments {
        serde_json::Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };

    ChatCompletionMessageToolCall {
        id: request.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: request.name.clone(),
            arguments,
        },
    }
}

fn from_tool_call(call: ChatCompletionMessageToolCall) -> ToolCallRequest {
    let arguments = serde_json::from_str(&call.function.arguments)
        .unwrap_or(serde_json::Value::String(call.function.arguments));
    ToolCallRequest {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}

/// Get OpenAI function/tool definitions for the declared tools.
pub fn tool_definitions(declarations: &[ToolDeclaration]) -> Vec<ChatCompletionTool> {
    declarations
        .iter()
        .map(|d| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: d.name.clone(),
                description: Some(d.description.clone()),
                parameters: Some(d.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn declaration() -> ToolDeclaration {
        ToolDeclaration {
            name: "get_marine_forecast".to_string(),
            description: "Wave conditions at a buoy".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {"buoy_id": {"type": "string"}},
                "required": ["buoy_id"]
            }),
        }
    }

    #[test]
    fn test_tool_call_arguments_parse() {
        let call = ChatCompletionMessageToolCall {
            id: "call_1".to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "get_marine_forecast".to_string(),
                arguments: r#"{"buoy_id": "46214"}"#.to_string(),
            },
        };

        let request = from_tool_call(call);
        assert_eq!(request.id, "call_1");
        assert_eq!(request.arguments, json!({"buoy_id": "46214"}));
        assert_eq!(to_tool_call(&request).function.arguments, r#"{"buoy_id":"46214"}"#);
    }

    #[test]
    fn test_invalid_arguments_kept_raw() {
        let call = ChatCompletionMessageToolCall {
            id: "call_1".to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "get_marine_forecast".to_string(),
                arguments: "{buoy_id:".to_string(),
            },
        };

        let request = from_tool_call(call);
        assert_eq!(request.arguments, json!("{buoy_id:"));
        assert_eq!(to_tool_call(&request).function.arguments, "{buoy_id:");
    }

    #[test]
    fn test_request_prepends_system_instruction() {
        let invoker = OpenAIInvoker::from_settings(&ModelSettings::default(), &Prompts::default())
            .unwrap()
            .with_system_instruction("You read buoys.".to_string());

        let mut conversation = Conversation::from_question("Waves at Mavericks?");
        conversation.push(Message::assistant_tool_calls(vec![ToolCallRequest::new(
            "call_1",
            "get_marine_forecast",
            json!({"buoy_id": "46214"}),
        )]));
        conversation.push(Message::tool(
            "call_1",
            "The waves are 3 feet with period of 10 seconds.",
        ));

        let request = invoker
            .build_request(&conversation, &[declaration()])
            .unwrap();

        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.messages.len(), 4);
        assert!(matches!(
            request.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            request.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            request.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert!(matches!(
            request.messages[3],
            ChatCompletionRequestMessage::Tool(_)
        ));
        assert_eq!(request.tools.map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions(&[declaration()]);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "get_marine_forecast");
        assert_eq!(
            tools[0].function.parameters.as_ref().unwrap()["required"],
            json!(["buoy_id"])
        );
    }

    fn api_error(kind: &str) -> OpenAIError {
        let api: ApiError = serde_json::from_value(json!({
            "message": "failure",
            "type": kind,
            "param": null,
            "code": null
        }))
        .unwrap();
        OpenAIError::ApiError(api)
    }

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(is_transient(&api_error("server_error")));
        assert!(!is_transient(&api_error("invalid_request_error")));
        assert!(!is_transient(&OpenAIError::InvalidArgument("bad".to_string())));
    }

    #[tokio::test]
    async fn test_rejected_key_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({
                            "error": {
                                "message": "Incorrect API key provided",
                                "type": "invalid_request_error",
                                "param": null,
                                "code": "invalid_api_key"
                            }
                        })),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let settings = ModelSettings {
            api_base: Some(format!("http://{}", addr)),
            max_retries: 2,
            ..ModelSettings::default()
        };
        let invoker = OpenAIInvoker::from_settings(&settings, &Prompts::default()).unwrap();

        let result = invoker
            .invoke(&Conversation::from_question("Waves at Mavericks?"), &[declaration()])
            .await;
        assert!(matches!(result, Err(SwellError::ModelInvocation(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

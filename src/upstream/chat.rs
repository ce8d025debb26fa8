use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::ApiError, upstream::send_json};

const SERVICE: &str = "chat";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: String::from("system"),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    model: Option<String>,
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    message: ChatMessage,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

/// OpenAI compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct OpenAi {
    client: Client,
    endpoint: String,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAi {
    pub fn new(client: Client, endpoint: &str, model: &str, system_prompt: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            system_prompt,
        }
    }

    pub async fn complete(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatReply, ApiError> {
        if messages.is_empty() {
            return Err(ApiError::BadRequest(String::from("no messages to send")));
        }

        let messages = match &self.system_prompt {
            Some(prompt) => std::iter::once(ChatMessage::system(prompt))
                .chain(messages)
                .collect(),
            None => messages,
        };
        let body = CompletionRequest {
            model: &self.model,
            messages,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        info!("{} ({} messages)", url, body.messages.len());

        let request = self.client.post(url).bearer_auth(api_key).json(&body);
        let response: CompletionResponse = send_json(SERVICE, request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse {
                service: SERVICE,
                reason: String::from("no choices in completion"),
            })?;

        Ok(ChatReply {
            reply: choice.message.content,
            model: response.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

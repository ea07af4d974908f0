//! Chat sessions and the retrieve-then-complete round trip.
//!
//! A session is an in-memory list of turns. Answering a question retrieves
//! context from the index, builds an OpenAI-style message list around it,
//! asks the completion service, and records both sides of the exchange.

use serde_json::{Value, json};
use uuid::Uuid;

use crate::core::completion::{CompletionClient, TokenUsage};
use crate::core::config::Config;
use crate::core::error::GatewayError;
use crate::core::index::{IndexClient, SourceNode};
use crate::core::text;

/// Turns beyond this many stay in the session but are not sent upstream.
pub const MAX_HISTORY_TURNS: usize = 20;

const CONTEXT_HEADER: &str = "Context information from the indexed documents is below.";
const CONTEXT_FOOTER: &str = "Given the context information and not prior knowledge, answer \
    the question. If the context does not contain the answer, say so instead of guessing.";
const NO_CONTEXT_PROMPT: &str = "No relevant passages were found in the indexed documents for \
    this question. Say that the documents do not cover it; do not answer from prior knowledge.";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// An in-memory conversation.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        ChatSession {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    /// Stable id for this session, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(ChatTurn {
            role,
            text: text.into(),
        });
    }

    /// Drop every turn; the session id stays.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully answered question.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceNode>,
    pub usage: Option<TokenUsage>,
}

/// Ties the two clients together: retrieve context, then complete.
pub struct Engine {
    index: IndexClient,
    completion: CompletionClient,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Engine {
            index: IndexClient::new(config),
            completion: CompletionClient::new(config),
        }
    }

    /// Answer a question within a session. The user turn is recorded first
    /// and stays in the session even when a request fails.
    pub async fn ask(
        &self,
        session: &mut ChatSession,
        question: &str,
    ) -> Result<Answer, GatewayError> {
        session.push(Role::User, question);
        let sources = self.index.retrieve(question).await?;
        log::debug!("session {}: {} source nodes", session.id(), sources.len());

        let turns = session.turns();
        // Everything before the turn just pushed is prior history.
        let history = &turns[..turns.len() - 1];
        let messages = build_messages(question, &sources, history);

        let completion = self.completion.complete(&messages).await?;
        let answer_text = text::clean(&completion.text);
        session.push(Role::Assistant, answer_text.clone());
        if let Some(usage) = &completion.usage {
            log::debug!(
                "session {}: {} prompt + {} completion tokens",
                session.id(),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }
        Ok(Answer {
            text: answer_text,
            sources,
            usage: completion.usage,
        })
    }
}

/// Build the OpenAI-style message list: a system prompt carrying the
/// retrieved context, recent history, then the question itself.
fn build_messages(question: &str, sources: &[SourceNode], history: &[ChatTurn]) -> Vec<Value> {
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut messages = Vec::with_capacity(history.len() - skip + 2);
    messages.push(json!({ "role": "system", "content": system_prompt(sources) }));
    for turn in &history[skip..] {
        messages.push(json!({ "role": turn.role.as_str(), "content": turn.text }));
    }
    messages.push(json!({ "role": "user", "content": question }));
    messages
}

fn system_prompt(sources: &[SourceNode]) -> String {
    if sources.is_empty() {
        return NO_CONTEXT_PROMPT.to_string();
    }
    let context = sources
        .iter()
        .map(|s| format!("[{}]\n{}", s.file_name, s.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{}\n---------------------\n{}\n---------------------\n{}",
        CONTEXT_HEADER, context, CONTEXT_FOOTER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{self, Config};
    use crate::core::error::Service;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(file_name: &str, text: &str) -> SourceNode {
        SourceNode {
            file_name: file_name.to_string(),
            text: text.to_string(),
            score: Some(0.5),
        }
    }

    #[test]
    fn session_records_turns_in_order() {
        let mut session = ChatSession::new();
        session.push(Role::User, "first question");
        session.push(Role::Assistant, "first answer");
        session.push(Role::User, "second question");

        let turns = session.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text, "first question");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[2].text, "second question");
    }

    #[test]
    fn clear_empties_turns_but_keeps_the_id() {
        let mut session = ChatSession::new();
        let id = session.id();
        session.push(Role::User, "anything");
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.id(), id);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(ChatSession::new().id(), ChatSession::new().id());
    }

    #[test]
    fn build_messages_embeds_context_in_the_system_prompt() {
        let sources = vec![
            source("lpg_report.pdf", "Propane prices rose in July."),
            source("butane.pdf", "Butane followed."),
        ];
        let messages = build_messages("What happened?", &sources, &[]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains("lpg_report.pdf"));
        assert!(system.contains("Propane prices rose in July."));
        assert!(system.contains("butane.pdf"));
        assert!(system.contains("not prior knowledge"));
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "What happened?");
    }

    #[test]
    fn build_messages_without_sources_forbids_guessing() {
        let messages = build_messages("Anything?", &[], &[]);
        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains("No relevant passages"));
    }

    #[test]
    fn build_messages_keeps_history_between_prompt_and_question() {
        let history = vec![
            ChatTurn {
                role: Role::User,
                text: "earlier question".to_string(),
            },
            ChatTurn {
                role: Role::Assistant,
                text: "earlier answer".to_string(),
            },
        ];
        let messages = build_messages("follow-up", &[], &history);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "earlier question");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "follow-up");
    }

    #[test]
    fn build_messages_caps_history_at_the_limit() {
        let history: Vec<ChatTurn> = (0..50)
            .map(|i| ChatTurn {
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                text: format!("turn {}", i),
            })
            .collect();
        let messages = build_messages("latest", &[], &history);
        // system + capped history + question
        assert_eq!(messages.len(), MAX_HISTORY_TURNS + 2);
        assert_eq!(messages[1]["content"], "turn 30");
        assert_eq!(messages[MAX_HISTORY_TURNS]["content"], "turn 49");
    }

    fn test_config(llama_base: &str, ollama_base: &str) -> Config {
        let env: HashMap<String, String> = [
            (config::ENV_LLAMA_API_KEY, "llx-test-key-123456"),
            (config::ENV_LLAMA_ORG_ID, "org-test"),
            (config::ENV_OLLAMA_API_KEY, "oll-test-key-123456"),
            (config::ENV_LLAMA_BASE_URL, llama_base),
            (config::ENV_OLLAMA_BASE_URL, ollama_base),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Config::from_lookup(|key| env.get(key).cloned()).unwrap()
    }

    async fn mount_retrieve(server: &MockServer) {
        let body = json!({
            "retrieval_nodes": [{
                "node": {
                    "text": "Propane prices rose in July.",
                    "metadata": { "file_name": "lpg_report.pdf" }
                },
                "score": 0.9
            }]
        });
        Mock::given(method("POST"))
            .and(path(format!(
                "/pipelines/{}/retrieve",
                config::DEFAULT_PIPELINE_ID
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn completion_body(content: &str) -> Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    #[tokio::test]
    async fn ask_retrieves_completes_and_records_both_turns() {
        let index_server = MockServer::start().await;
        let ollama_server = MockServer::start().await;
        mount_retrieve(&index_server).await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("**Prices**  rose.")),
            )
            .expect(1)
            .mount(&ollama_server)
            .await;

        let engine = Engine::new(&test_config(&index_server.uri(), &ollama_server.uri()));
        let mut session = ChatSession::new();
        let answer = engine.ask(&mut session, "What about propane?").await.unwrap();

        // The answer is cleaned before it is returned or recorded.
        assert_eq!(answer.text, "Prices rose.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].file_name, "lpg_report.pdf");
        assert_eq!(answer.usage.unwrap().total_tokens, 15);

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text, "What about propane?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text, "Prices rose.");

        // The upstream request framed the retrieved context as a system prompt.
        let requests = ollama_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert!(
            messages[0]["content"]
                .as_str()
                .unwrap()
                .contains("Propane prices rose in July.")
        );
        assert_eq!(messages[1]["content"], "What about propane?");
    }

    #[tokio::test]
    async fn ask_sends_prior_turns_as_history() {
        let index_server = MockServer::start().await;
        let ollama_server = MockServer::start().await;
        mount_retrieve(&index_server).await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Steady.")))
            .mount(&ollama_server)
            .await;

        let engine = Engine::new(&test_config(&index_server.uri(), &ollama_server.uri()));
        let mut session = ChatSession::new();
        session.push(Role::User, "earlier question");
        session.push(Role::Assistant, "earlier answer");

        engine.ask(&mut session, "and butane?").await.unwrap();

        let requests = ollama_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["content"], "earlier question");
        assert_eq!(messages[2]["content"], "earlier answer");
        assert_eq!(messages[3]["content"], "and butane?");
    }

    #[tokio::test]
    async fn failed_retrieval_keeps_the_user_turn() {
        let index_server = MockServer::start().await;
        let ollama_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!(
                "/pipelines/{}/retrieve",
                config::DEFAULT_PIPELINE_ID
            )))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&index_server)
            .await;

        let engine = Engine::new(&test_config(&index_server.uri(), &ollama_server.uri()));
        let mut session = ChatSession::new();
        let err = engine.ask(&mut session, "anything").await.unwrap_err();

        match err {
            GatewayError::Upstream {
                service, status, ..
            } => {
                assert_eq!(service, Service::Index);
                assert_eq!(status, 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::User);
        // The completion service was never asked.
        assert!(ollama_server.received_requests().await.unwrap().is_empty());
    }
}

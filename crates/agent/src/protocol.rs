//! The response protocol: how one agent answers the office chat.
//!
//! Every inbound message not authored by the agent runs one pass:
//!
//! 1. **Record** `"<sender>: <content>"` and a fresh tools description
//! 2. **Complete** the whole transcript with the model; record the output
//! 3. **Extract** at most one tool call from the output
//! 4. **Dispatch** it: `no_response` and `ask_office` end the pass silently,
//!    any other tool becomes a summary reply
//! 5. **Publish** the reply (or the raw output when there was no tool call)
//!
//! The transcript only grows. Its lock is held for steps 1 and 2 and released
//! before dispatch, so deliveries re-entering this agent through the bus
//! never wait on it.

use async_trait::async_trait;
use officechat_config::{AgentProfile, AppConfig};
use officechat_core::error::{BusError, Error, ToolError};
use officechat_core::message::{ChatMessage, Transcript, TranscriptEntry, preview};
use officechat_core::provider::{Provider, ProviderRequest};
use officechat_core::tool::{ToolInvocation, ToolOutcome, ToolSet};
use officechat_office::{OfficeChat, Subscriber};
use officechat_tools::{NO_RESPONSE, NoResponseTool};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use crate::ask_office::{ASK_OFFICE, AskOfficeTool};
use crate::parse::extract_tool_call;
use crate::prompt;
use crate::stream_event::AgentStreamEvent;

/// Sender used for direct questions that bypass the bus.
pub const DIRECT_SENDER: &str = "User";

/// Returned by [`Agent::ask`] when the agent chose silence.
pub const NO_RESPONSE_TEXT: &str = "No response";

/// Model settings for one agent.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
}

/// What a pass decided to say.
enum Decision {
    Silent,
    Reply(String),
}

/// One office participant.
pub struct Agent {
    name: String,
    role: String,
    settings: ModelSettings,
    provider: Arc<dyn Provider>,
    tools: ToolSet,
    transcript: Mutex<Transcript>,
    office: Weak<OfficeChat>,
}

impl Agent {
    /// Create an agent.
    ///
    /// `role_tools` come first in the tools description; `ask_office` and
    /// `no_response` are always appended.
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
        settings: ModelSettings,
        provider: Arc<dyn Provider>,
        role_tools: ToolSet,
        office: &Arc<OfficeChat>,
    ) -> Self {
        let name = name.into();
        let office = Arc::downgrade(office);
        let tools = role_tools
            .with(Arc::new(AskOfficeTool::new(office.clone(), name.clone())))
            .with(Arc::new(NoResponseTool));

        info!(agent = %name, model = %settings.model, tools = tools.len(), "Agent initialized");

        Self {
            name,
            role: role.into(),
            settings,
            provider,
            tools,
            transcript: Mutex::new(Transcript::with_system_prompt(system_prompt)),
            office,
        }
    }

    /// Build an agent from a roster entry, with the tools its profile asks for.
    pub fn from_profile(
        profile: &AgentProfile,
        config: &AppConfig,
        model: impl Into<String>,
        provider: Arc<dyn Provider>,
        office: &Arc<OfficeChat>,
    ) -> Result<Self, ToolError> {
        let role_tools = officechat_tools::role_tools(profile, config)?;
        Ok(Self::new(
            profile.name.clone(),
            profile.role.clone(),
            prompt::system_prompt(profile),
            ModelSettings {
                model: model.into(),
                temperature: config.temperature,
            },
            provider,
            role_tools,
            office,
        ))
    }

    /// Subscribe this agent to its office chat.
    pub async fn attach(self: Arc<Self>) -> Result<Arc<Self>, Error> {
        let office = self.office.upgrade().ok_or(BusError::Closed)?;
        office.subscribe(self.clone()).await;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// A copy of the transcript so far.
    pub async fn transcript(&self) -> Transcript {
        self.transcript.lock().await.clone()
    }

    /// Run one pass for a bus message and publish the reply, if any.
    ///
    /// Messages from the agent itself are ignored before any model call.
    /// Returns the published reply.
    pub async fn handle(&self, message: &ChatMessage) -> Result<Option<String>, Error> {
        if message.sender == self.name {
            debug!(agent = %self.name, "Skipping message from self");
            return Ok(None);
        }

        match self.respond(message).await {
            Ok(Decision::Reply(reply)) => {
                self.publish(&reply).await?;
                Ok(Some(reply))
            }
            Ok(Decision::Silent) => {
                debug!(agent = %self.name, "No response generated");
                Ok(None)
            }
            Err(e) => {
                error!(agent = %self.name, error = %e, "Error handling chat message");
                Err(e)
            }
        }
    }

    /// Ask the agent directly, bypassing the bus.
    pub async fn ask(&self, question: &str) -> Result<String, Error> {
        info!(agent = %self.name, question = %preview(question), "Direct question");
        let message = ChatMessage::new(DIRECT_SENDER, question);
        match self.respond(&message).await? {
            Decision::Reply(reply) => Ok(reply),
            Decision::Silent => Ok(NO_RESPONSE_TEXT.to_string()),
        }
    }

    /// Streaming variant of [`Agent::handle`].
    ///
    /// Model fragments arrive as `Chunk` events while they are produced.
    /// The final reply is published once the pass is complete.
    pub fn handle_streaming(self: &Arc<Self>, message: ChatMessage) -> mpsc::Receiver<AgentStreamEvent> {
        let (tx, rx) = mpsc::channel(128);
        if message.sender == self.name {
            debug!(agent = %self.name, "Skipping message from self");
            let _ = tx.try_send(AgentStreamEvent::Done { reply: None });
            return rx;
        }

        let agent = Arc::clone(self);
        tokio::spawn(async move {
            agent.run_streaming(message, tx, true).await;
        });
        rx
    }

    /// Streaming variant of [`Agent::ask`]; nothing is published.
    pub fn ask_streaming(self: &Arc<Self>, question: &str) -> mpsc::Receiver<AgentStreamEvent> {
        info!(agent = %self.name, question = %preview(question), "Direct streaming question");
        let (tx, rx) = mpsc::channel(128);
        let agent = Arc::clone(self);
        let message = ChatMessage::new(DIRECT_SENDER, question);
        tokio::spawn(async move {
            agent.run_streaming(message, tx, false).await;
        });
        rx
    }

    /// Steps 1 and 2: record the inbound message and tools, then return the request.
    fn record_inbound(&self, transcript: &mut Transcript, message: &ChatMessage) -> ProviderRequest {
        transcript.push(TranscriptEntry::user(format!(
            "{}: {}",
            message.sender, message.content
        )));
        transcript.push(TranscriptEntry::user(prompt::tools_prompt(
            &self.tools.definitions(),
        )));
        ProviderRequest {
            model: self.settings.model.clone(),
            messages: transcript.entries().to_vec(),
            temperature: self.settings.temperature,
        }
    }

    async fn respond(&self, message: &ChatMessage) -> Result<Decision, Error> {
        debug!(agent = %self.name, sender = %message.sender, "Processing message");

        let output = {
            let mut transcript = self.transcript.lock().await;
            let request = self.record_inbound(&mut transcript, message);
            debug!(agent = %self.name, model = %self.settings.model, "Calling model");
            let output = self.provider.complete(request).await.map_err(|e| {
                error!(agent = %self.name, error = %e, "Error calling model");
                e
            })?;
            transcript.push(TranscriptEntry::assistant(output.clone()));
            output
        };
        debug!(agent = %self.name, output = %preview(&output), "Model response received");

        match self.known_invocation(&output) {
            None if output.is_empty() => Ok(Decision::Silent),
            None => Ok(Decision::Reply(output)),
            Some(invocation) => {
                let outcome = self.dispatch(&invocation).await?;
                Ok(self.summarize(outcome))
            }
        }
    }

    /// Step 3: a tool call naming one of this agent's tools, if any.
    ///
    /// Unknown tool names fall back to a plain-text reply.
    fn known_invocation(&self, output: &str) -> Option<ToolInvocation> {
        let Some(invocation) = extract_tool_call(output) else {
            debug!(agent = %self.name, "No tool call found, returning raw response");
            return None;
        };
        if self.tools.get(&invocation.tool).is_none() {
            warn!(agent = %self.name, tool = %invocation.tool, "Tool not found");
            return None;
        }
        info!(agent = %self.name, tool = %invocation.tool, "Tool call extracted");
        Some(invocation)
    }

    async fn dispatch(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ToolError> {
        self.tools.execute(invocation).await
    }

    /// Step 4: silence for `no_response` and `ask_office`, a summary otherwise.
    fn summarize(&self, outcome: ToolOutcome) -> Decision {
        match outcome.tool_name.as_str() {
            NO_RESPONSE => {
                info!(agent = %self.name, "Using no_response tool, not responding to chat");
                Decision::Silent
            }
            ASK_OFFICE => {
                info!(agent = %self.name, "Using ask_office tool, message already posted");
                Decision::Silent
            }
            name => {
                let rendered = serde_json::to_string_pretty(&outcome)
                    .unwrap_or_else(|_| outcome.result.to_string());
                Decision::Reply(format!("I used the {name} tool and got: {rendered}"))
            }
        }
    }

    async fn publish(&self, reply: &str) -> Result<(), Error> {
        let office = self.office.upgrade().ok_or(BusError::Closed)?;
        debug!(agent = %self.name, reply = %preview(reply), "Posting response to office chat");
        office.post(reply, self.name.as_str()).await?;
        Ok(())
    }

    async fn run_streaming(
        self: Arc<Self>,
        message: ChatMessage,
        tx: mpsc::Sender<AgentStreamEvent>,
        publish: bool,
    ) {
        let fail = |message: String| AgentStreamEvent::Error { message };

        // Steps 1 and 2, re-emitting every fragment as it arrives.
        let output = {
            let mut transcript = self.transcript.lock().await;
            let request = self.record_inbound(&mut transcript, &message);

            let mut fragments = match self.provider.stream(request).await {
                Ok(rx) => rx,
                Err(e) => {
                    error!(agent = %self.name, error = %e, "Error during streaming");
                    let _ = tx.send(fail(Error::from(e).to_string())).await;
                    return;
                }
            };

            let mut buffer = String::new();
            while let Some(fragment) = fragments.recv().await {
                match fragment {
                    Ok(text) => {
                        buffer.push_str(&text);
                        // A caller that went away still gets its pass recorded.
                        let _ = tx.send(AgentStreamEvent::Chunk { content: text }).await;
                    }
                    Err(e) => {
                        error!(agent = %self.name, error = %e, "Error during streaming");
                        // What did arrive is what the model said.
                        transcript.push(TranscriptEntry::assistant(buffer));
                        let _ = tx
                            .send(AgentStreamEvent::Chunk {
                                content: format!("\n\nError during streaming: {e}"),
                            })
                            .await;
                        let _ = tx.send(fail(Error::from(e).to_string())).await;
                        return;
                    }
                }
            }
            transcript.push(TranscriptEntry::assistant(buffer.clone()));
            buffer
        };
        debug!(agent = %self.name, output = %preview(&output), "Full response received");

        // Steps 3 and 4. Raw output was already streamed; a tool summary was not.
        let reply = match self.known_invocation(&output) {
            None => (!output.is_empty()).then_some(output),
            Some(invocation) => {
                let _ = tx
                    .send(AgentStreamEvent::ToolCall {
                        name: invocation.tool.clone(),
                        input: serde_json::Value::Object(invocation.parameters.clone()),
                    })
                    .await;

                let outcome = match self.dispatch(&invocation).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let _ = tx
                            .send(AgentStreamEvent::Chunk {
                                content: format!(
                                    "\n\nError executing tool {}: {e}",
                                    invocation.tool
                                ),
                            })
                            .await;
                        let _ = tx.send(fail(Error::from(e).to_string())).await;
                        return;
                    }
                };

                let _ = tx
                    .send(AgentStreamEvent::ToolResult {
                        name: outcome.tool_name.clone(),
                        output: outcome.result.clone(),
                    })
                    .await;

                match self.summarize(outcome) {
                    Decision::Silent => None,
                    Decision::Reply(summary) => {
                        let _ = tx
                            .send(AgentStreamEvent::Chunk {
                                content: format!("\n\n{summary}"),
                            })
                            .await;
                        Some(summary)
                    }
                }
            }
        };

        // Step 5.
        if publish {
            if let Some(text) = &reply {
                if let Err(e) = self.publish(text).await {
                    error!(agent = %self.name, error = %e, "Error publishing streamed reply");
                    let _ = tx.send(fail(e.to_string())).await;
                    return;
                }
            }
        }

        let _ = tx.send(AgentStreamEvent::Done { reply }).await;
    }
}

#[async_trait]
impl Subscriber for Agent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_message(&self, message: &ChatMessage) -> officechat_core::Result<()> {
        self.handle(message).await.map(|_| ())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.settings.model)
            .field("tools", &self.tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{BrokenTool, LookupTool, ScriptedProvider, Turn, fragments_of};
    use officechat_core::error::ProviderError;
    use officechat_core::message::Role;

    const SILENT: &str = r#"{"tool":"no_response","parameters":{}}"#;

    fn settings() -> ModelSettings {
        ModelSettings {
            model: "llama3".into(),
            temperature: 0.7,
        }
    }

    async fn attached(
        name: &str,
        provider: Arc<ScriptedProvider>,
        role_tools: ToolSet,
        office: &Arc<OfficeChat>,
    ) -> Arc<Agent> {
        let agent = Agent::new(name, "Sales", format!("You are {name}."), settings(), provider, role_tools, office);
        Arc::new(agent).attach().await.unwrap()
    }

    async fn drain(mut rx: mpsc::Receiver<AgentStreamEvent>) -> Vec<AgentStreamEvent> {
        let mut events = vec![];
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn chunk_text(events: &[AgentStreamEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                AgentStreamEvent::Chunk { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn no_response_publishes_nothing() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[SILENT]));
        let agent = attached("Roger", provider.clone(), ToolSet::new(), &office).await;

        office.post("hello", "User").await.unwrap();

        assert_eq!(office.history(None).await.len(), 1);
        let transcript = agent.transcript().await;
        // system prompt + inbound + tools description + completion
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.entries()[1].content, "User: hello");
        assert!(transcript.entries()[2].content.starts_with("You have access to the following tools:"));
        assert_eq!(transcript.entries()[3].role, Role::Assistant);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn own_messages_are_ignored_before_the_model() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let agent = attached("Roger", provider.clone(), ToolSet::new(), &office).await;

        let reply = agent.handle(&ChatMessage::new("Roger", "talking to myself")).await.unwrap();
        assert!(reply.is_none());
        office.post("echo", "Roger").await.unwrap();

        assert_eq!(provider.call_count(), 0);
        assert_eq!(agent.transcript().await.len(), 1);
    }

    #[tokio::test]
    async fn plain_text_is_published_verbatim() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&["Our pipeline is healthy."]));
        attached("Roger", provider, ToolSet::new(), &office).await;

        office.post("How is Q3 looking?", "User").await.unwrap();

        let history = office.history(None).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].sender, "Roger");
        assert_eq!(history[1].content, "Our pipeline is healthy.");
    }

    #[tokio::test]
    async fn embedded_tool_call_becomes_summary_reply() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[
            r#"Let me check. {"tool":"lookup","parameters":{"region":"EMEA"},"reasoning":"need numbers"} One moment."#,
        ]));
        let tools = ToolSet::new().with(Arc::new(LookupTool));
        attached("Roger", provider, tools, &office).await;

        office.post("How many deals in EMEA?", "User").await.unwrap();

        let history = office.history(None).await;
        assert_eq!(history.len(), 2);
        let expected = format!(
            "I used the lookup tool and got: {}",
            serde_json::to_string_pretty(&ToolOutcome {
                tool_name: "lookup".into(),
                result: serde_json::json!({"deals": 3, "region": "EMEA"}),
            })
            .unwrap()
        );
        assert_eq!(history[1].content, expected);
    }

    #[tokio::test]
    async fn unknown_tool_falls_back_to_raw_output() {
        let office = Arc::new(OfficeChat::new());
        let raw = r#"{"tool":"teleport","parameters":{"to":"Mars"}}"#;
        let provider = Arc::new(ScriptedProvider::texts(&[raw]));
        attached("Roger", provider, ToolSet::new(), &office).await;

        office.post("hi", "User").await.unwrap();

        let history = office.history(None).await;
        assert_eq!(history[1].content, raw);
    }

    #[tokio::test]
    async fn ask_office_posts_once_under_own_name() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[
            r#"{"tool":"ask_office","parameters":{"message":"Marketing, any launch dates?"}}"#,
        ]));
        let agent = attached("Roger", provider.clone(), ToolSet::new(), &office).await;

        office.post("Plan the Q4 push", "User").await.unwrap();

        let history: Vec<(String, String)> = office
            .history(None)
            .await
            .into_iter()
            .map(|m| (m.sender, m.content))
            .collect();
        assert_eq!(
            history,
            vec![
                ("User".to_string(), "Plan the Q4 push".to_string()),
                ("Roger".to_string(), "Marketing, any launch dates?".to_string()),
            ]
        );
        // The broadcast reached Roger too, and was filtered.
        assert_eq!(provider.call_count(), 1);
        assert_eq!(agent.transcript().await.len(), 4);
    }

    #[tokio::test]
    async fn tool_failure_propagates_and_publishes_nothing() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[r#"{"tool":"crm_lookup","parameters":{}}"#]));
        let tools = ToolSet::new().with(Arc::new(BrokenTool));
        attached("Roger", provider, tools, &office).await;

        let err = office.post("Check the CRM", "User").await.unwrap_err();
        match err {
            BusError::HandlerFailed { subscriber, reason } => {
                assert_eq!(subscriber, "Roger");
                assert!(reason.contains("CRM is down"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(office.history(None).await.len(), 1);
    }

    #[tokio::test]
    async fn backend_failure_is_distinguishable() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Turn::Fail(ProviderError::Unavailable(
            "connection refused".into(),
        ))]));
        let agent = Agent::new("Roger", "Sales", "You are Roger.", settings(), provider, ToolSet::new(), &office);

        let err = agent.ask("hello?").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_output_is_silence() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[""]));
        attached("Roger", provider, ToolSet::new(), &office).await;
        office.post("hi", "User").await.unwrap();
        assert_eq!(office.history(None).await.len(), 1);
    }

    #[tokio::test]
    async fn ask_bypasses_the_bus() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&["Discount 10%.", SILENT]));
        let agent = Agent::new("Roger", "Sales", "You are Roger.", settings(), provider, ToolSet::new(), &office);

        assert_eq!(agent.ask("Pricing advice?").await.unwrap(), "Discount 10%.");
        assert_eq!(agent.ask("Kubernetes?").await.unwrap(), NO_RESPONSE_TEXT);
        assert!(office.is_empty().await);
        assert_eq!(agent.transcript().await.entries()[1].content, "User: Pricing advice?");
    }

    #[tokio::test]
    async fn tools_description_is_sent_every_turn() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[SILENT, SILENT]));
        let agent = Agent::new(
            "Roger",
            "Sales",
            "You are Roger.",
            settings(),
            provider.clone(),
            ToolSet::new().with(Arc::new(LookupTool)),
            &office,
        );

        agent.ask("one").await.unwrap();
        agent.ask("two").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[1].messages.len(), 6);
        let tools_entry = &requests[1].messages[4].content;
        assert!(tools_entry.contains("Tool: lookup"));
        assert!(tools_entry.contains("Tool: ask_office"));
        assert!(tools_entry.contains("Tool: no_response"));
        assert_eq!(requests[1].model, "llama3");
    }

    #[tokio::test]
    async fn common_tools_come_last() {
        let office = Arc::new(OfficeChat::new());
        let agent = Agent::new(
            "Roger",
            "Sales",
            "You are Roger.",
            settings(),
            Arc::new(ScriptedProvider::texts(&[])),
            ToolSet::new().with(Arc::new(LookupTool)),
            &office,
        );
        assert_eq!(agent.tools().names(), vec!["lookup", "ask_office", "no_response"]);
    }

    #[tokio::test]
    async fn agents_converse_until_silence() {
        let office = Arc::new(OfficeChat::new());
        let roger = Arc::new(ScriptedProvider::texts(&["Sales can help."]));
        let peter = Arc::new(ScriptedProvider::texts(&[SILENT, SILENT]));
        attached("Roger", roger.clone(), ToolSet::new(), &office).await;
        attached("Peter", peter.clone(), ToolSet::new(), &office).await;

        office.post("Who handles renewals?", "User").await.unwrap();

        let senders: Vec<String> = office.history(None).await.into_iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec!["User", "Roger"]);
        assert_eq!(roger.call_count(), 1);
        // Peter saw the question and Roger's answer.
        assert_eq!(peter.call_count(), 2);
    }

    #[tokio::test]
    async fn ask_streaming_emits_fragments_then_done() {
        let office = Arc::new(OfficeChat::new());
        let text = "Focus on enterprise accounts this quarter.";
        let provider = Arc::new(ScriptedProvider::texts(&[text]));
        let agent = Arc::new(Agent::new("Roger", "Sales", "p", settings(), provider, ToolSet::new(), &office));

        let events = drain(agent.ask_streaming("Strategy?")).await;

        let chunks: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                AgentStreamEvent::Chunk { content } => Some(content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(chunks, fragments_of(text));
        assert_eq!(events.last(), Some(&AgentStreamEvent::Done { reply: Some(text.to_string()) }));
        assert!(office.is_empty().await);
        assert_eq!(agent.transcript().await.last().unwrap().content, text);
    }

    #[tokio::test]
    async fn handle_streaming_publishes_final_reply() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&["Streaming hello."]));
        let agent = Arc::new(Agent::new("Roger", "Sales", "p", settings(), provider, ToolSet::new(), &office));

        let events = drain(agent.handle_streaming(ChatMessage::new("User", "hi"))).await;
        assert!(matches!(events.last(), Some(AgentStreamEvent::Done { reply: Some(_) })));

        let history = office.history(None).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, "Roger");
        assert_eq!(history[0].content, "Streaming hello.");
    }

    #[tokio::test]
    async fn handle_streaming_ignores_self() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let agent = Arc::new(Agent::new("Roger", "Sales", "p", settings(), provider, ToolSet::new(), &office));
        let events = drain(agent.handle_streaming(ChatMessage::new("Roger", "mine"))).await;
        assert_eq!(events, vec![AgentStreamEvent::Done { reply: None }]);
    }

    #[tokio::test]
    async fn streaming_tool_summary_follows_raw_fragments() {
        let office = Arc::new(OfficeChat::new());
        let raw = r#"{"tool":"lookup","parameters":{}}"#;
        let provider = Arc::new(ScriptedProvider::texts(&[raw]));
        let agent = Arc::new(Agent::new(
            "Roger",
            "Sales",
            "p",
            settings(),
            provider,
            ToolSet::new().with(Arc::new(LookupTool)),
            &office,
        ));

        let events = drain(agent.ask_streaming("deals?")).await;

        let text = chunk_text(&events);
        assert!(text.starts_with(raw));
        assert!(text.contains("\n\nI used the lookup tool and got: {"));
        assert!(events.iter().any(|e| matches!(e, AgentStreamEvent::ToolCall { name, .. } if name == "lookup")));
        assert!(events.iter().any(|e| matches!(e, AgentStreamEvent::ToolResult { output, .. } if output["deals"] == 3)));
        match events.last() {
            Some(AgentStreamEvent::Done { reply: Some(reply) }) => {
                assert!(reply.starts_with("I used the lookup tool"));
            }
            other => panic!("expected Done with reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn streaming_silence_has_no_reply() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[SILENT]));
        let agent = Arc::new(Agent::new("Roger", "Sales", "p", settings(), provider, ToolSet::new(), &office));

        let events = drain(agent.handle_streaming(ChatMessage::new("User", "k8s?"))).await;
        assert_eq!(events.last(), Some(&AgentStreamEvent::Done { reply: None }));
        assert!(office.is_empty().await);
    }

    #[tokio::test]
    async fn streaming_tool_failure_is_visible_then_terminal() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::texts(&[r#"{"tool":"crm_lookup","parameters":{}}"#]));
        let agent = Arc::new(Agent::new(
            "Roger",
            "Sales",
            "p",
            settings(),
            provider,
            ToolSet::new().with(Arc::new(BrokenTool)),
            &office,
        ));

        let events = drain(agent.handle_streaming(ChatMessage::new("User", "CRM?"))).await;

        assert!(chunk_text(&events).contains("\n\nError executing tool crm_lookup:"));
        match events.last() {
            Some(AgentStreamEvent::Error { message }) => assert!(message.contains("CRM is down")),
            other => panic!("expected Error, got {other:?}"),
        }
        assert!(office.is_empty().await);
    }

    #[tokio::test]
    async fn broken_stream_ends_with_error() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Turn::Broken("partial answ".into())]));
        let agent = Arc::new(Agent::new("Roger", "Sales", "p", settings(), provider, ToolSet::new(), &office));

        let events = drain(agent.ask_streaming("?")).await;
        assert!(chunk_text(&events).starts_with("partial answ"));
        assert!(matches!(events.last(), Some(AgentStreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn broken_stream_keeps_partial_answer_in_transcript() {
        let office = Arc::new(OfficeChat::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Turn::Broken("partial answ".into())]));
        let agent = Arc::new(Agent::new("Roger", "Sales", "p", settings(), provider, ToolSet::new(), &office));

        drain(agent.ask_streaming("?")).await;

        let transcript = agent.transcript().await;
        // system prompt, question, tools prompt, partial answer
        assert_eq!(transcript.len(), 4);
        let last = transcript.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "partial answ");
        assert!(office.history(None).await.is_empty());
    }

    #[tokio::test]
    async fn from_profile_uses_persona_and_role_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            notes_dir: tmp.path().to_path_buf(),
            serpapi_api_key: None,
            ..AppConfig::default()
        };
        let profile = officechat_config::default_roster().remove(0);
        let office = Arc::new(OfficeChat::new());

        let agent = Agent::from_profile(
            &profile,
            &config,
            "llama3",
            Arc::new(ScriptedProvider::texts(&[])),
            &office,
        )
        .unwrap();

        assert_eq!(agent.name(), "Roger");
        assert_eq!(agent.role(), "Sales");
        assert_eq!(agent.model(), "llama3");
        assert_eq!(
            agent.tools().names(),
            vec!["notepad_write", "notepad_read", "ask_office", "no_response"]
        );
        let transcript = agent.transcript().await;
        assert_eq!(transcript.entries()[0].role, Role::System);
        assert!(transcript.entries()[0].content.starts_with("You are Roger"));
    }

    #[tokio::test]
    async fn attach_after_office_dropped_fails() {
        let office = Arc::new(OfficeChat::new());
        let agent = Arc::new(Agent::new(
            "Roger",
            "Sales",
            "p",
            settings(),
            Arc::new(ScriptedProvider::texts(&[])),
            ToolSet::new(),
            &office,
        ));
        drop(office);
        assert!(matches!(agent.attach().await, Err(Error::Bus(BusError::Closed))));
    }
}

//! Produces the next persona turn of a dialogue.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chat::{ChatMessage, ChatProvider, SamplingParams};
use crate::persona::{Persona, PersonaId, PersonaRegistry};
use crate::topic::TopicValidator;

use super::{tail, DialogueError, DialogueSettings, Speaker, Turn, TurnSource};

/// Text used when the model returns nothing usable.
pub fn fallback_text(topic: &str) -> String {
    format!(
        "I apologize, but I'm having difficulty generating a response about \"{topic}\". Could you rephrase or provide more context?"
    )
}

/// Whether `text` is as long as the sampling limit allows, in characters.
fn reached_length_cap(text: &str, sampling: &SamplingParams) -> bool {
    text.chars().count() >= sampling.max_tokens as usize
}

/// Builds the messages sent to the model for `persona`'s turn.
///
/// Turns by the user become assistant messages and every other speaker,
/// personas included, becomes a user message.
pub fn build_context(persona: &Persona, topic: &str, turns: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 2);
    messages.push(ChatMessage::system().content(&persona.system_prompt).build());
    messages.push(
        ChatMessage::system()
            .content(format!(
                "The current discussion topic is: {topic}. Engage with this subject matter using your unique intellectual approach, but keep your response conversational and concise."
            ))
            .build(),
    );
    for turn in turns {
        let message = match turn.speaker() {
            Speaker::User => ChatMessage::assistant(),
            _ => ChatMessage::user(),
        };
        messages.push(message.content(turn.text()).build());
    }
    messages
}

/// Stateless dialogue orchestrator.
///
/// Everything it needs is injected at construction, so tests can substitute
/// the completion provider.
pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    personas: PersonaRegistry,
    topics: TopicValidator,
    sampling: SamplingParams,
    settings: DialogueSettings,
}

impl Orchestrator {
    pub fn builder(provider: Arc<dyn ChatProvider>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(provider)
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    pub fn topics(&self) -> &TopicValidator {
        &self.topics
    }

    pub fn settings(&self) -> DialogueSettings {
        self.settings
    }

    /// Produces the next turn for `topic` given the most recent turns.
    ///
    /// Only the last `window_size` turns are considered. An empty window is
    /// seeded with a system turn introducing the topic.
    pub async fn next_turn(&self, topic: &str, window: &[Turn]) -> Result<Turn, DialogueError> {
        let topic = self.topics.validate(topic)?;
        let window = tail(window, self.settings.window_size);
        let persona_id = PersonaId::successor_of(window.last().map(Turn::speaker));

        let seed;
        let window = if window.is_empty() {
            seed = [Turn::seed(&topic)];
            &seed[..]
        } else {
            window
        };

        let persona = self.personas.get(persona_id);
        log::info!(
            "dialogue turn: topic={topic:?} persona={persona_id} model={} window={} last_sender={:?}",
            persona.model_id,
            window.len(),
            window
                .last()
                .map(|t| t.speaker().label(&self.personas))
                .unwrap_or_default(),
        );

        let context = tail(window, self.settings.context_size);
        let messages = build_context(persona, &topic, context);
        let response = self
            .provider
            .chat(&persona.model_id, &messages, &self.sampling)
            .await
            .map_err(|err| {
                log::warn!("completion failed for {}: {err}", persona.model_id);
                DialogueError::from(err)
            })?;

        let text = response
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback_text(&topic));
        log::debug!(
            "response from {}: {} chars, truncated={}, usage={:?}",
            persona.model_id,
            text.chars().count(),
            reached_length_cap(&text, &self.sampling),
            response.usage(),
        );

        Ok(Turn::new(
            Turn::next_sequence(window),
            Speaker::Persona(persona_id),
            text,
        ))
    }
}

#[async_trait]
impl TurnSource for Orchestrator {
    async fn next_turn(&self, topic: &str, window: &[Turn]) -> Result<Turn, DialogueError> {
        Orchestrator::next_turn(self, topic, window).await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &"<dyn ChatProvider>")
            .field("personas", &self.personas)
            .field("sampling", &self.sampling)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    provider: Arc<dyn ChatProvider>,
    personas: PersonaRegistry,
    topics: TopicValidator,
    sampling: SamplingParams,
    settings: DialogueSettings,
}

impl OrchestratorBuilder {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            personas: PersonaRegistry::default(),
            topics: TopicValidator::default(),
            sampling: SamplingParams::default(),
            settings: DialogueSettings::default(),
        }
    }

    pub fn personas(mut self, personas: PersonaRegistry) -> Self {
        self.personas = personas;
        self
    }

    pub fn topics(mut self, topics: TopicValidator) -> Self {
        self.topics = topics;
        self
    }

    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn settings(mut self, settings: DialogueSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            provider: self.provider,
            personas: self.personas,
            topics: self.topics,
            sampling: self.sampling,
            settings: self.settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::chat::{ChatResponse, ChatRole};
    use crate::error::LLMError;
    use crate::topic::TopicError;

    #[derive(Debug)]
    struct FakeResponse(Option<String>);

    impl std::fmt::Display for FakeResponse {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    impl ChatResponse for FakeResponse {
        fn text(&self) -> Option<String> {
            self.0.clone()
        }
    }

    type Reply = Box<dyn Fn() -> Result<Option<String>, LLMError> + Send + Sync>;

    struct ScriptedProvider {
        reply: Reply,
        calls: Mutex<Vec<(String, Vec<ChatMessage>, SamplingParams)>>,
    }

    impl ScriptedProvider {
        fn new(reply: impl Fn() -> Result<Option<String>, LLMError> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                reply: Box::new(reply),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn text(text: &str) -> Arc<Self> {
            let text = text.to_string();
            Self::new(move || Ok(Some(text.clone())))
        }

        fn calls(&self) -> Vec<(String, Vec<ChatMessage>, SamplingParams)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat(
            &self,
            model: &str,
            messages: &[ChatMessage],
            sampling: &SamplingParams,
        ) -> Result<Box<dyn ChatResponse>, LLMError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), messages.to_vec(), sampling.clone()));
            (self.reply)().map(|text| Box::new(FakeResponse(text)) as Box<dyn ChatResponse>)
        }
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
        Orchestrator::builder(provider).build()
    }

    fn turn(sequence: u64, speaker: Speaker, text: &str) -> Turn {
        Turn::new(sequence, speaker, text)
    }

    #[tokio::test]
    async fn empty_window_opens_with_the_first_persona() {
        let provider = ScriptedProvider::text("Mars first.");
        let orchestrator = orchestrator(provider.clone());

        let produced = orchestrator.next_turn("Space Exploration", &[]).await.unwrap();

        assert_eq!(produced.speaker(), &Speaker::Persona(PersonaId::Contrarian));
        assert_eq!(
            produced.speaker().label(orchestrator.personas()),
            "Llama 3.3 70B"
        );
        assert_eq!(produced.text(), "Mars first.");
        assert_eq!(produced.sequence(), 1);

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let (model, messages, sampling) = &calls[0];
        assert_eq!(model, "llama-3.3-70b-versatile");
        assert_eq!(sampling, &SamplingParams::default());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, ChatRole::User);
        assert_eq!(messages[2].content, "Let's discuss: Space Exploration");
    }

    #[tokio::test]
    async fn rotation_follows_the_last_speaker() {
        let cases = [
            (Speaker::Persona(PersonaId::Contrarian), PersonaId::Analyst),
            (Speaker::Persona(PersonaId::Analyst), PersonaId::Creative),
            (Speaker::Persona(PersonaId::Creative), PersonaId::Contrarian),
            (Speaker::System, PersonaId::Contrarian),
            (Speaker::Other("GPT".into()), PersonaId::Contrarian),
        ];
        for (last, expected) in cases {
            let provider = ScriptedProvider::text("ok");
            let orchestrator = orchestrator(provider.clone());
            let window = [turn(0, Speaker::System, "Let's discuss: AI"), turn(1, last, "hi")];

            let produced = orchestrator.next_turn("AI Safety", &window).await.unwrap();

            assert_eq!(produced.speaker().persona(), Some(expected));
            assert_eq!(provider.calls()[0].0, orchestrator.personas().get(expected).model_id);
        }
    }

    #[tokio::test]
    async fn user_intervention_restarts_rotation() {
        let orchestrator = orchestrator(ScriptedProvider::text("ok"));
        let window = [
            turn(3, Speaker::Persona(PersonaId::Contrarian), "a"),
            turn(4, Speaker::Persona(PersonaId::Analyst), "b"),
            turn(5, Speaker::User, "what about cost"),
        ];

        let produced = orchestrator.next_turn("Space Exploration", &window).await.unwrap();

        // Analyst spoke before the user, yet the cycle starts over.
        assert_eq!(produced.speaker().persona(), Some(PersonaId::Contrarian));
        assert_eq!(produced.sequence(), 6);
    }

    #[tokio::test]
    async fn context_uses_last_four_turns_with_user_as_assistant() {
        let provider = ScriptedProvider::text("ok");
        let orchestrator = orchestrator(provider.clone());
        let window: Vec<Turn> = vec![
            turn(0, Speaker::System, "t0"),
            turn(1, Speaker::Persona(PersonaId::Contrarian), "t1"),
            turn(2, Speaker::Persona(PersonaId::Analyst), "t2"),
            turn(3, Speaker::User, "t3"),
            turn(4, Speaker::Persona(PersonaId::Contrarian), "t4"),
            turn(5, Speaker::Persona(PersonaId::Analyst), "t5"),
        ];

        orchestrator.next_turn("Quantum Computing", &window).await.unwrap();

        let (model, messages, _) = &provider.calls()[0];
        assert_eq!(model, "mixtral-8x7b-32768");
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(
            messages[0].content,
            orchestrator.personas().get(PersonaId::Creative).system_prompt
        );
        assert_eq!(messages[1].role, ChatRole::System);
        assert!(messages[1].content.contains("Quantum Computing"));
        let history: Vec<(ChatRole, &str)> = messages[2..]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            history,
            vec![
                (ChatRole::User, "t2"),
                (ChatRole::Assistant, "t3"),
                (ChatRole::User, "t4"),
                (ChatRole::User, "t5"),
            ]
        );
    }

    #[tokio::test]
    async fn oversized_window_is_trimmed_before_selection() {
        let orchestrator = orchestrator(ScriptedProvider::text("ok"));
        let window: Vec<Turn> = (0..9)
            .map(|i| turn(i, Speaker::Persona(PersonaId::Contrarian), "x"))
            .collect();
        let produced = orchestrator.next_turn("Climate Change Solutions", &window).await.unwrap();
        assert_eq!(produced.sequence(), 9);
        assert_eq!(produced.speaker().persona(), Some(PersonaId::Analyst));
    }

    #[tokio::test]
    async fn largest_sequence_does_not_overflow() {
        let orchestrator = orchestrator(ScriptedProvider::text("Still here."));
        let window = [Turn::new(u64::MAX, Speaker::User, "one more")];
        let produced = orchestrator.next_turn("Space Exploration", &window).await.unwrap();
        assert_eq!(produced.sequence(), u64::MAX);
        assert_eq!(produced.speaker(), &Speaker::Persona(PersonaId::Contrarian));
    }

    #[test]
    fn length_cap_counts_characters() {
        let sampling = SamplingParams::default();
        assert!(!reached_length_cap("short answer", &sampling));
        assert!(reached_length_cap(&"é".repeat(200), &sampling));
        assert!(!reached_length_cap(&"é".repeat(199), &sampling));
    }

    #[tokio::test]
    async fn response_text_is_trimmed() {
        let orchestrator = orchestrator(ScriptedProvider::text("  \n Bold claim.  "));
        let produced = orchestrator.next_turn("The Future of AI", &[]).await.unwrap();
        assert_eq!(produced.text(), "Bold claim.");
    }

    #[tokio::test]
    async fn empty_completion_falls_back_to_apology() {
        for reply in [None, Some(String::new()), Some("   ".to_string())] {
            let provider = ScriptedProvider::new(move || Ok(reply.clone()));
            let produced = orchestrator(provider)
                .next_turn("  Space Exploration ", &[])
                .await
                .unwrap();
            assert_eq!(produced.text(), fallback_text("Space Exploration"));
            assert!(produced.text().contains("\"Space Exploration\""));
        }
    }

    #[tokio::test]
    async fn invalid_topic_fails_before_calling_out() {
        let provider = ScriptedProvider::text("unused");
        let orchestrator = orchestrator(provider.clone());

        let err = orchestrator.next_turn("Why?", &[]).await.unwrap_err();
        assert!(matches!(err, DialogueError::InvalidTopic(TopicError::Content(_))));

        let err = orchestrator.next_turn("ok", &[]).await.unwrap_err();
        assert!(matches!(err, DialogueError::InvalidTopic(TopicError::Length { .. })));

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_passes_through_without_retry() {
        let provider = ScriptedProvider::new(|| {
            Err(LLMError::ProviderError {
                status: 429,
                message: "Rate limit reached".into(),
            })
        });
        let orchestrator = orchestrator(provider.clone());

        let started = std::time::Instant::now();
        let err = orchestrator.next_turn("The Future of AI", &[]).await.unwrap_err();

        assert_eq!(
            err,
            DialogueError::Upstream {
                status: Some(429),
                message: "Rate limit reached".into()
            }
        );
        assert_eq!(provider.calls().len(), 1);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn unexpected_provider_faults_are_internal() {
        let provider = ScriptedProvider::new(|| Err(LLMError::Generic("bad state".into())));
        let err = orchestrator(provider)
            .next_turn("The Future of AI", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DialogueError::Internal(_)));
    }

    #[tokio::test]
    async fn same_inputs_select_the_same_persona() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = counter.clone();
        let provider = ScriptedProvider::new(move || {
            let n = seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Some(format!("take {n}")))
        });
        let orchestrator = orchestrator(provider);
        let window = [turn(1, Speaker::Persona(PersonaId::Analyst), "hmm")];

        let first = orchestrator.next_turn("Space Exploration", &window).await.unwrap();
        let second = orchestrator.next_turn("Space Exploration", &window).await.unwrap();

        assert_ne!(first.text(), second.text());
        assert_eq!(first.speaker(), second.speaker());
    }

    #[tokio::test]
    async fn custom_sampling_and_settings_are_used() {
        let provider = ScriptedProvider::text("ok");
        let sampling = SamplingParams {
            max_tokens: 64,
            temperature: 0.2,
            top_p: 0.9,
        };
        let orchestrator = Orchestrator::builder(provider.clone())
            .sampling(sampling.clone())
            .settings(DialogueSettings {
                window_size: 3,
                context_size: 1,
            })
            .build();
        let window: Vec<Turn> = (0..4).map(|i| turn(i, Speaker::System, "x")).collect();

        orchestrator.next_turn("Sustainable Development", &window).await.unwrap();

        let (_, messages, used) = &provider.calls()[0];
        assert_eq!(used, &sampling);
        assert_eq!(messages.len(), 3);
    }
}

//! Abilities, slots and the registry the engine resolves them through.
//!
//! A [`Slot`] is a capability set: only `query` is mandatory, every other
//! callback has a default. [`SlotDefinition`] builds one from closures so
//! integrators pick behavior per slot at construction time.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::ValidationError;

use super::errors::DialogueError;
use super::requests::{CompletionOutcome, FillOutcome};
use super::state::ConversationState;
use super::values::{NlpResult, SlotId, SlotRecord, SlotStatus, ValidateResult, DEFAULT_SLOT_ORDER};

/// Read-only view handed to slot and ability callbacks.
#[derive(Clone, Copy)]
pub struct SlotContext<'a> {
    ability_name: &'a str,
    state: &'a ConversationState,
}

impl<'a> SlotContext<'a> {
    pub fn new(ability_name: &'a str, state: &'a ConversationState) -> Self {
        Self {
            ability_name,
            state,
        }
    }

    pub fn ability_name(&self) -> &'a str {
        self.ability_name
    }

    pub fn state(&self) -> &'a ConversationState {
        self.state
    }

    /// This turn's NLU result.
    pub fn message(&self) -> Option<&'a NlpResult> {
        self.state.message_data()
    }

    /// Value of a sibling slot in the same ability.
    pub fn slot_value(&self, slot_name: &str) -> Option<&'a str> {
        self.state
            .slot_value(&SlotId::new(self.ability_name, slot_name))
    }

    pub fn slot_record(&self, slot_name: &str) -> Option<&'a SlotRecord> {
        self.state
            .slot_record(&SlotId::new(self.ability_name, slot_name))
    }

    pub fn slot_status(&self, slot_name: &str) -> SlotStatus {
        self.state
            .slot_status(&SlotId::new(self.ability_name, slot_name))
    }
}

/// One unit of information to collect within an ability.
#[async_trait]
pub trait Slot: Send + Sync {
    fn name(&self) -> &str;

    /// Lower values are prompted first.
    fn order(&self) -> u32 {
        DEFAULT_SLOT_ORDER
    }

    /// Whether the slot is enabled before any status was recorded for it.
    fn default_is_enabled(&self) -> bool {
        true
    }

    /// Produces the prompt text.
    async fn query(&self, ctx: &SlotContext<'_>) -> Result<String, DialogueError>;

    async fn validate(
        &self,
        _value: &str,
        _ctx: &SlotContext<'_>,
    ) -> Result<ValidateResult, DialogueError> {
        Ok(ValidateResult::valid())
    }

    /// Produces a re-prompt. `turn_count` starts at 1 for the first retry.
    async fn retry(
        &self,
        _value: &str,
        _ctx: &SlotContext<'_>,
        _turn_count: u32,
    ) -> Result<Option<String>, DialogueError> {
        Ok(None)
    }

    async fn on_fill(
        &self,
        _value: &str,
        _ctx: &SlotContext<'_>,
    ) -> Result<FillOutcome, DialogueError> {
        Ok(FillOutcome::none())
    }
}

/// Runs when every enabled slot of an ability is filled.
#[async_trait]
pub trait AbilityCompletion: Send + Sync {
    async fn on_complete(&self, ctx: &SlotContext<'_>) -> Result<CompletionOutcome, DialogueError>;
}

type QueryFn = Box<dyn Fn(&SlotContext<'_>) -> String + Send + Sync>;
type ValidateFn = Box<dyn Fn(&str, &SlotContext<'_>) -> ValidateResult + Send + Sync>;
type RetryFn = Box<dyn Fn(&str, &SlotContext<'_>, u32) -> String + Send + Sync>;
type OnFillFn = Box<dyn Fn(&str, &SlotContext<'_>) -> FillOutcome + Send + Sync>;
type CompleteFn = Box<dyn Fn(&SlotContext<'_>) -> CompletionOutcome + Send + Sync>;

/// Closure-backed [`Slot`].
pub struct SlotDefinition {
    name: String,
    order: u32,
    default_is_enabled: bool,
    query: QueryFn,
    validate: Option<ValidateFn>,
    retry: Option<RetryFn>,
    on_fill: Option<OnFillFn>,
}

impl SlotDefinition {
    pub fn new<Q>(name: impl Into<String>, query: Q) -> Self
    where
        Q: Fn(&SlotContext<'_>) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            order: DEFAULT_SLOT_ORDER,
            default_is_enabled: true,
            query: Box::new(query),
            validate: None,
            retry: None,
            on_fill: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.default_is_enabled = false;
        self
    }

    pub fn with_validate<V>(mut self, validate: V) -> Self
    where
        V: Fn(&str, &SlotContext<'_>) -> ValidateResult + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }

    pub fn with_retry<R>(mut self, retry: R) -> Self
    where
        R: Fn(&str, &SlotContext<'_>, u32) -> String + Send + Sync + 'static,
    {
        self.retry = Some(Box::new(retry));
        self
    }

    pub fn with_on_fill<F>(mut self, on_fill: F) -> Self
    where
        F: Fn(&str, &SlotContext<'_>) -> FillOutcome + Send + Sync + 'static,
    {
        self.on_fill = Some(Box::new(on_fill));
        self
    }
}

impl fmt::Debug for SlotDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDefinition")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("default_is_enabled", &self.default_is_enabled)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Slot for SlotDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn default_is_enabled(&self) -> bool {
        self.default_is_enabled
    }

    async fn query(&self, ctx: &SlotContext<'_>) -> Result<String, DialogueError> {
        Ok((self.query)(ctx))
    }

    async fn validate(
        &self,
        value: &str,
        ctx: &SlotContext<'_>,
    ) -> Result<ValidateResult, DialogueError> {
        Ok(match &self.validate {
            Some(validate) => validate(value, ctx),
            None => ValidateResult::valid(),
        })
    }

    async fn retry(
        &self,
        value: &str,
        ctx: &SlotContext<'_>,
        turn_count: u32,
    ) -> Result<Option<String>, DialogueError> {
        Ok(self.retry.as_ref().map(|retry| retry(value, ctx, turn_count)))
    }

    async fn on_fill(&self, value: &str, ctx: &SlotContext<'_>) -> Result<FillOutcome, DialogueError> {
        Ok(match &self.on_fill {
            Some(on_fill) => on_fill(value, ctx),
            None => FillOutcome::none(),
        })
    }
}

/// Closure-backed [`AbilityCompletion`].
pub struct CompletionFn(CompleteFn);

impl CompletionFn {
    pub fn new<C>(complete: C) -> Self
    where
        C: Fn(&SlotContext<'_>) -> CompletionOutcome + Send + Sync + 'static,
    {
        Self(Box::new(complete))
    }
}

#[async_trait]
impl AbilityCompletion for CompletionFn {
    async fn on_complete(&self, ctx: &SlotContext<'_>) -> Result<CompletionOutcome, DialogueError> {
        Ok((self.0)(ctx))
    }
}

/// A named task composed of slots and a completion action.
#[derive(Clone)]
pub struct Ability {
    name: String,
    slots: Vec<Arc<dyn Slot>>,
    on_complete: Option<Arc<dyn AbilityCompletion>>,
}

impl Ability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            on_complete: None,
        }
    }

    pub fn with_slot(mut self, slot: impl Slot + 'static) -> Self {
        self.slots.push(Arc::new(slot));
        self
    }

    pub fn with_shared_slot(mut self, slot: Arc<dyn Slot>) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn on_complete(mut self, completion: impl AbilityCompletion + 'static) -> Self {
        self.on_complete = Some(Arc::new(completion));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[Arc<dyn Slot>] {
        &self.slots
    }

    pub fn slot(&self, slot_name: &str) -> Option<&Arc<dyn Slot>> {
        self.slots.iter().find(|s| s.name() == slot_name)
    }

    pub fn completion(&self) -> Option<&Arc<dyn AbilityCompletion>> {
        self.on_complete.as_ref()
    }

    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }
}

impl fmt::Debug for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ability")
            .field("name", &self.name)
            .field(
                "slots",
                &self.slots.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Static, read-only list of abilities supplied at startup.
#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    abilities: Vec<Ability>,
}

impl AbilityRegistry {
    /// Builds a registry, rejecting empty or duplicate names.
    pub fn new(abilities: Vec<Ability>) -> Result<Self, ValidationError> {
        let mut ability_names = HashSet::new();
        for ability in &abilities {
            if ability.name.trim().is_empty() {
                return Err(ValidationError::empty_field("ability_name"));
            }
            if !ability_names.insert(ability.name.as_str()) {
                return Err(ValidationError::duplicate("ability", &ability.name));
            }
            let mut slot_names = HashSet::new();
            for slot in &ability.slots {
                if slot.name().trim().is_empty() {
                    return Err(ValidationError::empty_field("slot_name"));
                }
                if !slot_names.insert(slot.name()) {
                    return Err(ValidationError::duplicate(
                        "slot",
                        format!("{}.{}", ability.name, slot.name()),
                    ));
                }
            }
        }
        Ok(Self { abilities })
    }

    pub fn get(&self, ability_name: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.name == ability_name)
    }

    pub fn find_slot(&self, slot: &SlotId) -> Option<&Arc<dyn Slot>> {
        self.get(&slot.ability_name)
            .and_then(|ability| ability.slot(&slot.slot_name))
    }

    pub fn contains_slot(&self, slot: &SlotId) -> bool {
        self.find_slot(slot).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.iter()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin_slot() -> SlotDefinition {
        SlotDefinition::new("origin", |_| "Where are you flying from?".to_string()).with_order(1)
    }

    fn book_flight() -> Ability {
        Ability::new("book_flight")
            .with_slot(origin_slot())
            .with_slot(SlotDefinition::new("destination", |_| "Where to?".to_string()))
    }

    mod registry {
        use super::*;

        #[test]
        fn resolves_slots_by_id() {
            let registry = AbilityRegistry::new(vec![book_flight()]).unwrap();
            assert!(registry.contains_slot(&SlotId::new("book_flight", "origin")));
            assert!(!registry.contains_slot(&SlotId::new("book_flight", "seat")));
            assert!(!registry.contains_slot(&SlotId::new("order_pizza", "origin")));
        }

        #[test]
        fn rejects_duplicate_ability_names() {
            let err = AbilityRegistry::new(vec![book_flight(), book_flight()]).unwrap_err();
            assert_eq!(err, ValidationError::duplicate("ability", "book_flight"));
        }

        #[test]
        fn rejects_duplicate_slot_names() {
            let ability = Ability::new("a")
                .with_slot(SlotDefinition::new("x", |_| String::new()))
                .with_slot(SlotDefinition::new("x", |_| String::new()));
            assert!(AbilityRegistry::new(vec![ability]).is_err());
        }

        #[test]
        fn rejects_blank_names() {
            assert!(AbilityRegistry::new(vec![Ability::new("  ")]).is_err());
        }

        #[test]
        fn preserves_declaration_order() {
            let registry = AbilityRegistry::new(vec![book_flight()]).unwrap();
            let names: Vec<_> = registry
                .get("book_flight")
                .unwrap()
                .slots()
                .iter()
                .map(|s| s.name().to_string())
                .collect();
            assert_eq!(names, vec!["origin", "destination"]);
        }
    }

    mod slot_defaults {
        use super::*;

        #[tokio::test]
        async fn missing_callbacks_fall_back_to_defaults() {
            let slot = SlotDefinition::new("destination", |_| "Where to?".to_string());
            let state = ConversationState::new();
            let ctx = SlotContext::new("book_flight", &state);

            assert_eq!(slot.order(), DEFAULT_SLOT_ORDER);
            assert!(slot.default_is_enabled());
            assert!(slot.validate("anything", &ctx).await.unwrap().is_valid);
            assert_eq!(slot.retry("anything", &ctx, 1).await.unwrap(), None);
            assert_eq!(slot.on_fill("anything", &ctx).await.unwrap(), FillOutcome::none());
        }

        #[tokio::test]
        async fn configured_callbacks_are_used() {
            let slot = origin_slot()
                .with_validate(|v, _| {
                    if v.is_empty() {
                        ValidateResult::invalid_because("Please name a city")
                    } else {
                        ValidateResult::valid()
                    }
                })
                .with_retry(|_, _, n| format!("Try again ({})", n));
            let state = ConversationState::new();
            let ctx = SlotContext::new("book_flight", &state);

            assert_eq!(slot.query(&ctx).await.unwrap(), "Where are you flying from?");
            let result = slot.validate("", &ctx).await.unwrap();
            assert!(!result.is_valid);
            assert_eq!(result.reason.as_deref(), Some("Please name a city"));
            assert_eq!(
                slot.retry("", &ctx, 2).await.unwrap().as_deref(),
                Some("Try again (2)")
            );
        }
    }

    #[tokio::test]
    async fn completion_fn_sees_slot_values() {
        let completion = CompletionFn::new(|ctx| {
            CompletionOutcome::message(format!(
                "Booked from {}",
                ctx.slot_value("origin").unwrap_or("?")
            ))
        });
        let state = ConversationState::new();
        let ctx = SlotContext::new("book_flight", &state);
        let outcome = completion.on_complete(&ctx).await.unwrap();
        assert_eq!(outcome.messages, vec!["Booked from ?".to_string()]);
    }
}

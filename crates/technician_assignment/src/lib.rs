use std::sync::Arc;

use scheduling_environment::store::SchedulingStore;

pub mod availability;
pub mod config;
pub mod conflict;
pub mod error;
pub mod selector;
pub mod skill_matcher;
pub mod ticket_workflow;

use crate::availability::AvailabilityEngine;
use crate::config::EngineConfig;
use crate::conflict::ConflictDetector;
use crate::error::Result;
use crate::selector::AssignmentSelector;
use crate::skill_matcher::SkillMatcher;
use crate::ticket_workflow::TicketWorkflow;

/// Entry point bundling a shared store with the engine configuration.
///
/// The engine is cheap to clone and can be handed to any number of threads.
#[derive(Clone, Debug)]
pub struct SchedulingEngine
{
    store: Arc<SchedulingStore>,
    config: EngineConfig,
}

impl SchedulingEngine
{
    pub fn new(store: Arc<SchedulingStore>, config: EngineConfig) -> Result<Self>
    {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &SchedulingStore
    {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig
    {
        &self.config
    }

    pub fn conflicts(&self) -> ConflictDetector<'_>
    {
        ConflictDetector::new(&self.store)
    }

    pub fn availability(&self) -> AvailabilityEngine<'_>
    {
        AvailabilityEngine::new(&self.store)
    }

    pub fn skills(&self) -> SkillMatcher<'_>
    {
        SkillMatcher::new(&self.store)
    }

    pub fn selector(&self) -> AssignmentSelector<'_>
    {
        AssignmentSelector::new(&self.store, &self.config)
    }

    pub fn tickets(&self) -> TicketWorkflow<'_>
    {
        TicketWorkflow::new(&self.store)
    }
}

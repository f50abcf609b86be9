//! Named locomotor templates with override stacks.
//!
//! Each name maps to a base template plus a stack of overrides. Lookups
//! always see the newest override. The base lives outside the stack, so
//! it cannot be popped.
//!
//! Definition parsing is not done here; collaborators hand over
//! ready-built templates.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    locomotor::LocomotorTemplate,
    rng::SubsystemRng,
    subsystem::{FrameInfo, SimSubsystem},
};
use std::{collections::BTreeMap, rc::Rc};

pub const TEMPLATE_STORE_NAME: &str = "locomotor_store";

#[derive(Debug, Clone)]
struct TemplateStack {
    base:      Rc<LocomotorTemplate>,
    overrides: Vec<Rc<LocomotorTemplate>>,
}

impl TemplateStack {
    fn top(&self) -> &Rc<LocomotorTemplate> {
        self.overrides.last().unwrap_or(&self.base)
    }
}

#[derive(Debug, Clone)]
pub struct LocomotorStore {
    name:      String,
    templates: BTreeMap<String, TemplateStack>,
}

impl LocomotorStore {
    pub fn new() -> Self {
        Self {
            name: TEMPLATE_STORE_NAME.to_string(),
            templates: BTreeMap::new(),
        }
    }

    /// Install `template` as the base for its name. Replacing an existing
    /// base discards that name's overrides.
    pub fn register_template(&mut self, mut template: LocomotorTemplate) -> Rc<LocomotorTemplate> {
        template.sanitize();
        let key = template.name.clone();
        let base = Rc::new(template);
        let stack = TemplateStack { base: base.clone(), overrides: Vec::new() };
        if let Some(old) = self.templates.insert(key.clone(), stack) {
            log::warn!(
                "templates: '{key}' re-registered; {} override(s) dropped",
                old.overrides.len()
            );
        }
        base
    }

    /// Copy the current top of `name`, apply `modify`, and push the
    /// result. `None` if `name` is unknown.
    pub fn push_override<F>(&mut self, name: &str, modify: F) -> Option<Rc<LocomotorTemplate>>
    where
        F: FnOnce(&mut LocomotorTemplate),
    {
        let Some(stack) = self.templates.get_mut(name) else {
            log::warn!("templates: override for unknown template '{name}' ignored");
            return None;
        };
        let mut next = LocomotorTemplate::clone(stack.top());
        modify(&mut next);
        next.name = name.to_string();
        next.sanitize();
        let next = Rc::new(next);
        stack.overrides.push(next.clone());
        Some(next)
    }

    /// Drop the newest override of `name`. The base is never removed.
    pub fn pop_override(&mut self, name: &str) -> bool {
        self.templates
            .get_mut(name)
            .and_then(|stack| stack.overrides.pop())
            .is_some()
    }

    /// The effective template for `name`.
    pub fn find_template(&self, name: &str) -> Option<Rc<LocomotorTemplate>> {
        self.templates.get(name).map(|stack| stack.top().clone())
    }

    pub fn require_template(&self, name: &str) -> SimResult<Rc<LocomotorTemplate>> {
        self.find_template(name)
            .ok_or_else(|| SimError::UnknownTemplate { name: name.to_string() })
    }

    /// The unmodified base for `name`.
    pub fn base_template(&self, name: &str) -> Option<Rc<LocomotorTemplate>> {
        self.templates.get(name).map(|stack| stack.base.clone())
    }

    pub fn override_depth(&self, name: &str) -> usize {
        self.templates.get(name).map_or(0, |stack| stack.overrides.len())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl Default for LocomotorStore {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for LocomotorStore {
    fn name(&self) -> &str { &self.name }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Expects an empty store. A populated one is reported, cleared,
    /// and initialized anyway.
    fn init(&mut self) -> SimResult<()> {
        if !self.templates.is_empty() {
            log::error!(
                "templates: init() on a store holding {} template(s); clearing",
                self.templates.len()
            );
            self.templates.clear();
        }
        Ok(())
    }

    /// Overrides are per-game; bases survive.
    fn reset(&mut self) {
        for stack in self.templates.values_mut() {
            stack.overrides.clear();
        }
    }

    fn update(
        &mut self,
        _frame: FrameInfo,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

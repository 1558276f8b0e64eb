//! Read-only lookup of tool definitions by qualified name.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use gateway_primitives::BackendId;
use tracing::warn;

use crate::definition::{ToolDefinition, ToolDescriptor};
use crate::error::{RegistryError, RegistryResult};
use crate::loader::{ApiSpecification, LoadedSpec};
use crate::naming;
use crate::report::{LoadReport, LoadWarning, LoadedSpecSummary};

/// Immutable table of tool definitions.
#[derive(Clone, Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDefinition>>,
    order: Vec<String>,
    specs: Vec<Arc<ApiSpecification>>,
}

impl ToolRegistry {
    /// Builds a registry from explicit definitions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if two definitions share a
    /// name.
    pub fn new(
        specs: Vec<Arc<ApiSpecification>>,
        tools: impl IntoIterator<Item = ToolDefinition>,
    ) -> RegistryResult<Self> {
        let mut registry = Self {
            specs,
            ..Self::default()
        };
        for tool in tools {
            let name = tool.name().to_owned();
            if registry.tools.contains_key(&name) {
                return Err(RegistryError::DuplicateTool { name });
            }
            registry.order.push(name.clone());
            registry.tools.insert(name, Arc::new(tool));
        }
        Ok(registry)
    }

    /// Builds a registry from loaded specs, renaming colliding tools and
    /// recording the outcome in `report`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] only if disambiguation failed
    /// to produce unique names.
    pub fn from_loaded(loaded: Vec<LoadedSpec>, report: &mut LoadReport) -> RegistryResult<Self> {
        let mut taken = HashSet::new();
        let mut specs = Vec::with_capacity(loaded.len());
        let mut tools = Vec::new();

        for LoadedSpec {
            spec,
            tools: spec_tools,
            warnings,
        } in loaded
        {
            report.warnings.extend(warnings);
            report.loaded.push(LoadedSpecSummary {
                name: spec.name().to_owned(),
                tool_count: spec_tools.len(),
                source: spec.source().map(ToOwned::to_owned),
            });

            for mut tool in spec_tools {
                let unique = naming::disambiguate(tool.name(), &taken);
                if unique != tool.name() {
                    let warning = LoadWarning::RenamedTool {
                        spec: spec.name().to_owned(),
                        original: tool.name().to_owned(),
                        renamed: unique.clone(),
                    };
                    warn!(%warning, "tool name collision");
                    report.warnings.push(warning);
                    tool.rename(unique.clone());
                }
                taken.insert(unique);
                tools.push(tool);
            }
            specs.push(spec);
        }

        Self::new(specs, tools)
    }

    /// Looks up a tool by qualified name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).cloned()
    }

    /// Returns `true` if a tool with `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tool names in load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Tools in load order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|tool| &**tool))
    }

    /// Loaded specifications.
    #[must_use]
    pub fn specs(&self) -> &[Arc<ApiSpecification>] {
        &self.specs
    }

    /// Distinct backends owning at least one spec.
    #[must_use]
    pub fn backends(&self) -> Vec<BackendId> {
        let mut backends: Vec<BackendId> = Vec::new();
        for spec in &self.specs {
            if !backends.contains(spec.backend()) {
                backends.push(spec.backend().clone());
            }
        }
        backends
    }

    /// Planner-facing descriptors in load order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.iter().map(ToolDefinition::descriptor).collect()
    }
}

/// Swappable handle to the current registry.
///
/// Readers take a snapshot and keep using it for the duration of a call, so
/// a reload never changes a definition under an in-flight request.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<ToolRegistry>>,
}

impl SharedRegistry {
    /// Wraps an initial registry.
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// Returns the current registry.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Installs a new registry and returns the previous one.
    pub fn replace(&self, registry: ToolRegistry) -> Arc<ToolRegistry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }
}

//! Build-time validation of service registrations.
//!
//! Resolution errors surface per request at dispatch time. Validation finds
//! the same configuration mistakes up front, so a host can refuse to start
//! instead of answering every request with a 500.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};
use crate::key::{key_of, Key};
use crate::registration::Registration;

/// Result of validating a service collection.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors that make dispatch fail for every request
    pub errors: Vec<ValidationError>,
    /// Warnings about potentially problematic configurations
    pub warnings: Vec<ValidationWarning>,
}

/// A configuration error that makes dispatch fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A constructor dependency or handler parameter is not registered
    #[error("Service '{service}' depends on unregistered interface '{dependency}'")]
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// Constructor dependencies form a cycle
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<&'static str> },
}

/// A validation warning about a configuration that works but may surprise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// More than one registration for an interface; the first one is resolved
    /// and every one of them is still dispatched
    DuplicateRegistration {
        interface: &'static str,
        implementations: Vec<&'static str>,
    },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::DuplicateRegistration {
                interface,
                implementations,
            } => write!(
                f,
                "Interface '{}' has multiple registrations: {} (first one is resolved)",
                interface,
                implementations.join(", ")
            ),
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }
}

pub(crate) fn validate(registrations: &[Registration]) -> ValidationResult {
    let mut result = ValidationResult::default();

    // First registration per key, the one resolution uses
    let mut first: HashMap<Key, &Registration> = HashMap::new();
    let mut implementations: Vec<(Key, Vec<&'static str>)> = Vec::new();
    for registration in registrations {
        first.entry(registration.key).or_insert(registration);
        match implementations
            .iter_mut()
            .find(|(key, _)| *key == registration.key)
        {
            Some((_, names)) => names.push(registration.impl_name),
            None => implementations.push((registration.key, vec![registration.impl_name])),
        }
    }

    let transport = [key_of::<HttpRequest>(), key_of::<HttpResponse>()];
    let satisfied = |key: &Key| transport.contains(key) || first.contains_key(key);

    for registration in registrations {
        let mut reported = HashSet::new();
        for key in registration
            .dependencies
            .iter()
            .chain(registration.parameters.iter())
        {
            if !satisfied(key) && reported.insert(*key) {
                result.errors.push(ValidationError::MissingDependency {
                    service: registration.impl_name,
                    dependency: key.display_name(),
                });
            }
        }
    }

    for cycle in detect_cycles(registrations, &first) {
        result
            .errors
            .push(ValidationError::CircularDependency { cycle });
    }

    for (key, names) in implementations {
        if names.len() > 1 {
            result
                .warnings
                .push(ValidationWarning::DuplicateRegistration {
                    interface: key.display_name(),
                    implementations: names,
                });
        }
    }

    result
}

/// Detects constructor cycles using DFS over the registrations resolution
/// would actually pick.
fn detect_cycles(
    registrations: &[Registration],
    first: &HashMap<Key, &Registration>,
) -> Vec<Vec<&'static str>> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    let mut cycles = Vec::new();

    for registration in registrations {
        if !visited.contains(&registration.key) {
            dfs_cycles(registration.key, first, &mut visited, &mut path, &mut cycles);
        }
    }

    cycles
}

fn dfs_cycles(
    current: Key,
    first: &HashMap<Key, &Registration>,
    visited: &mut HashSet<Key>,
    path: &mut Vec<Key>,
    cycles: &mut Vec<Vec<&'static str>>,
) {
    if let Some(cycle_start) = path.iter().position(|&key| key == current) {
        let cycle = path[cycle_start..]
            .iter()
            .chain(std::iter::once(&current))
            .map(|key| key.display_name())
            .collect();
        cycles.push(cycle);
        return;
    }

    if visited.contains(&current) {
        return;
    }

    visited.insert(current);
    path.push(current);

    if let Some(registration) = first.get(&current) {
        for &dependency in &registration.dependencies {
            dfs_cycles(dependency, first, visited, path, cycles);
        }
    }

    path.pop();
}

//! Type resolution against the tool taxonomy.
//!
//! Qualified tokens (`bpmn.*`, `uml.*`) are kept verbatim. Anything else must
//! be an exact ArchiMate palette name, or it becomes [`UNKNOWN_TYPE`] with a
//! layer guessed from keywords in the token.

use crate::model::{Layer, UNKNOWN_TYPE};

/// ArchiMate element palette.
pub const ARCHIMATE_ELEMENTS: &[(&str, Layer)] = &[
    ("Resource", Layer::Strategy),
    ("Capability", Layer::Strategy),
    ("ValueStream", Layer::Strategy),
    ("CourseOfAction", Layer::Strategy),
    ("BusinessActor", Layer::Business),
    ("BusinessRole", Layer::Business),
    ("BusinessCollaboration", Layer::Business),
    ("BusinessInterface", Layer::Business),
    ("BusinessProcess", Layer::Business),
    ("BusinessFunction", Layer::Business),
    ("BusinessInteraction", Layer::Business),
    ("BusinessEvent", Layer::Business),
    ("BusinessService", Layer::Business),
    ("BusinessObject", Layer::Business),
    ("Contract", Layer::Business),
    ("Representation", Layer::Business),
    ("Product", Layer::Business),
    ("ApplicationComponent", Layer::Application),
    ("ApplicationCollaboration", Layer::Application),
    ("ApplicationInterface", Layer::Application),
    ("ApplicationFunction", Layer::Application),
    ("ApplicationInteraction", Layer::Application),
    ("ApplicationProcess", Layer::Application),
    ("ApplicationEvent", Layer::Application),
    ("ApplicationService", Layer::Application),
    ("DataObject", Layer::Application),
    ("Node", Layer::Technology),
    ("Device", Layer::Technology),
    ("SystemSoftware", Layer::Technology),
    ("TechnologyCollaboration", Layer::Technology),
    ("TechnologyInterface", Layer::Technology),
    ("Path", Layer::Technology),
    ("CommunicationNetwork", Layer::Technology),
    ("TechnologyFunction", Layer::Technology),
    ("TechnologyProcess", Layer::Technology),
    ("TechnologyInteraction", Layer::Technology),
    ("TechnologyEvent", Layer::Technology),
    ("TechnologyService", Layer::Technology),
    ("Artifact", Layer::Technology),
    ("Equipment", Layer::Physical),
    ("Facility", Layer::Physical),
    ("DistributionNetwork", Layer::Physical),
    ("Material", Layer::Physical),
    ("Stakeholder", Layer::Motivation),
    ("Driver", Layer::Motivation),
    ("Assessment", Layer::Motivation),
    ("Goal", Layer::Motivation),
    ("Outcome", Layer::Motivation),
    ("Principle", Layer::Motivation),
    ("Requirement", Layer::Motivation),
    ("Constraint", Layer::Motivation),
    ("Meaning", Layer::Motivation),
    ("Value", Layer::Motivation),
    ("WorkPackage", Layer::ImplementationMigration),
    ("Deliverable", Layer::ImplementationMigration),
    ("ImplementationEvent", Layer::ImplementationMigration),
    ("Plateau", Layer::ImplementationMigration),
    ("Gap", Layer::ImplementationMigration),
    ("Location", Layer::Other),
    ("Grouping", Layer::Other),
    ("Junction", Layer::Other),
];

/// ArchiMate relationship palette.
pub const ARCHIMATE_RELATIONSHIPS: &[&str] = &[
    "Composition",
    "Aggregation",
    "Assignment",
    "Realization",
    "Serving",
    "Access",
    "Influence",
    "Triggering",
    "Flow",
    "Specialization",
    "Association",
];

/// Viewpoint ids a view may carry.
pub const VIEWPOINTS: &[&str] = &[
    "layered",
    "application_cooperation",
    "application_usage",
    "business_process_cooperation",
    "capability_map",
    "goal_realization",
    "implementation_deployment",
    "implementation_migration",
    "information_structure",
    "migration",
    "motivation",
    "organization",
    "outcome_realization",
    "physical",
    "product",
    "project",
    "requirements_realization",
    "resource_map",
    "service_realization",
    "stakeholder",
    "strategy",
    "technology",
    "technology_usage",
    "value_stream",
];

/// Viewpoint used when nothing matches.
pub const DEFAULT_VIEWPOINT: &str = "layered";

const VIEWPOINT_KEYWORDS: &[(&str, &str)] = &[
    ("process", "business_process_cooperation"),
    ("bpmn", "business_process_cooperation"),
    ("capabilit", "capability_map"),
    ("strateg", "strategy"),
    ("motivation", "motivation"),
    ("goal", "goal_realization"),
    ("requirement", "requirements_realization"),
    ("stakeholder", "stakeholder"),
    ("organi", "organization"),
    ("information", "information_structure"),
    ("data", "information_structure"),
    ("class", "information_structure"),
    ("application", "application_cooperation"),
    ("component", "application_cooperation"),
    ("deployment", "implementation_deployment"),
    ("infrastructure", "technology"),
    ("technolog", "technology"),
    ("physical", "physical"),
    ("migration", "implementation_migration"),
    ("project", "project"),
    ("product", "product"),
];

const LAYER_KEYWORDS: &[(&str, Layer)] = &[
    ("valuestream", Layer::Strategy),
    ("capabilit", Layer::Strategy),
    ("courseofaction", Layer::Strategy),
    ("strateg", Layer::Strategy),
    ("business", Layer::Business),
    ("contract", Layer::Business),
    ("product", Layer::Business),
    ("application", Layer::Application),
    ("dataobject", Layer::Application),
    ("software", Layer::Technology),
    ("technolog", Layer::Technology),
    ("infrastructure", Layer::Technology),
    ("device", Layer::Technology),
    ("node", Layer::Technology),
    ("network", Layer::Technology),
    ("artifact", Layer::Technology),
    ("equipment", Layer::Physical),
    ("facility", Layer::Physical),
    ("material", Layer::Physical),
    ("physical", Layer::Physical),
    ("stakeholder", Layer::Motivation),
    ("driver", Layer::Motivation),
    ("assessment", Layer::Motivation),
    ("goal", Layer::Motivation),
    ("outcome", Layer::Motivation),
    ("principle", Layer::Motivation),
    ("requirement", Layer::Motivation),
    ("constraint", Layer::Motivation),
    ("workpackage", Layer::ImplementationMigration),
    ("deliverable", Layer::ImplementationMigration),
    ("plateau", Layer::ImplementationMigration),
    ("implementation", Layer::ImplementationMigration),
    ("migration", Layer::ImplementationMigration),
];

/// The outcome of resolving a type token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedType {
    /// A palette name.
    ArchiMate { name: &'static str, layer: Layer },
    /// A `bpmn.*` token, kept verbatim.
    Bpmn(String),
    /// A `uml.*` token, kept verbatim.
    Uml(String),
    /// Nothing recognized the token; `token` is the source token untrimmed.
    Unknown { token: String, layer: Layer },
}

impl ResolvedType {
    /// The type name stored on the domain object.
    pub fn type_name(&self) -> &str {
        match self {
            Self::ArchiMate { name, .. } => *name,
            Self::Bpmn(token) | Self::Uml(token) => token.as_str(),
            Self::Unknown { .. } => UNKNOWN_TYPE,
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Self::ArchiMate { layer, .. } | Self::Unknown { layer, .. } => *layer,
            Self::Bpmn(_) => Layer::Business,
            Self::Uml(_) => Layer::Other,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

fn qualified(token: &str) -> Option<ResolvedType> {
    if token.len() > "bpmn.".len() && token.starts_with("bpmn.") {
        return Some(ResolvedType::Bpmn(token.to_string()));
    }
    if token.len() > "uml.".len() && token.starts_with("uml.") {
        return Some(ResolvedType::Uml(token.to_string()));
    }
    None
}

/// Resolve an element type token.
pub fn resolve_element_type(raw: &str) -> ResolvedType {
    let token = raw.trim();
    if let Some(resolved) = qualified(token) {
        return resolved;
    }
    match ARCHIMATE_ELEMENTS.iter().find(|(name, _)| *name == token) {
        Some((name, layer)) => ResolvedType::ArchiMate {
            name: *name,
            layer: *layer,
        },
        None => ResolvedType::Unknown {
            token: raw.to_string(),
            layer: guess_layer(token),
        },
    }
}

/// Resolve a relationship type token.
pub fn resolve_relationship_type(raw: &str) -> ResolvedType {
    let token = raw.trim();
    if let Some(resolved) = qualified(token) {
        return resolved;
    }
    match ARCHIMATE_RELATIONSHIPS.iter().find(|name| **name == token) {
        Some(name) => ResolvedType::ArchiMate {
            name: *name,
            layer: Layer::Other,
        },
        None => ResolvedType::Unknown {
            token: raw.to_string(),
            layer: Layer::Other,
        },
    }
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Guess a layer from keywords in a type token.
pub fn guess_layer(token: &str) -> Layer {
    let squashed = squash(token);
    LAYER_KEYWORDS
        .iter()
        .find(|(keyword, _)| squashed.contains(keyword))
        .map(|(_, layer)| *layer)
        .unwrap_or_default()
}

/// Map a free-form viewpoint string to a viewpoint id.
pub fn resolve_viewpoint(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_VIEWPOINT;
    };
    let squashed = squash(raw);
    if let Some(exact) = VIEWPOINTS.iter().find(|id| squash(id) == squashed) {
        return *exact;
    }
    VIEWPOINT_KEYWORDS
        .iter()
        .find(|(keyword, _)| squashed.contains(keyword))
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_VIEWPOINT)
}

//! Core types for the theme aggregation pipeline

use crate::graph::{AttrKey, SemanticNode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of semantic entity types recognized by the engine.
///
/// Type strings arriving from a kernel must parse into this enumeration;
/// anything else is a data-integrity violation, never a soft default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Organization,
    Geo,
    Date,
    Money,
    Event,
    Product,
    Abstract,
}

impl EntityType {
    /// Canonical attribute spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "Person",
            EntityType::Organization => "Organization",
            EntityType::Geo => "Geo",
            EntityType::Date => "Date",
            EntityType::Money => "Money",
            EntityType::Event => "Event",
            EntityType::Product => "Product",
            EntityType::Abstract => "Abstract",
        }
    }
}

impl FromStr for EntityType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Person" => Ok(EntityType::Person),
            "Organization" => Ok(EntityType::Organization),
            "Geo" => Ok(EntityType::Geo),
            "Date" => Ok(EntityType::Date),
            "Money" => Ok(EntityType::Money),
            "Event" => Ok(EntityType::Event),
            "Product" => Ok(EntityType::Product),
            "Abstract" => Ok(EntityType::Abstract),
            _ => Err(AnalysisError::UnknownEntityType { raw: s.to_string() }),
        }
    }
}

/// Syntactic role of an entity mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRole {
    Adj,
    Subj,
    Obj,
    Other,
}

impl EntityRole {
    /// Parse a role token; unrecognized or absent tokens yield `None`.
    ///
    /// Unlike entity types, an unknown role is not an error: the mention
    /// still joins its group but counts in no frequency bucket.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "Adj" => Some(EntityRole::Adj),
            "Subj" => Some(EntityRole::Subj),
            "Obj" => Some(EntityRole::Obj),
            "Other" => Some(EntityRole::Other),
            _ => None,
        }
    }
}

/// Projection of an `Entity` node used during grouping
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMention {
    /// Display name: `FullName` if non-empty, else `Value`
    pub name: String,
    /// Parsed semantic type
    pub entity_type: EntityType,
    /// Recognized role, if any
    pub role: Option<EntityRole>,
}

impl EntityMention {
    /// Project an entity node into a mention.
    ///
    /// Fails fatally when the `Type` attribute is missing or does not
    /// parse into [`EntityType`].
    pub fn from_node(node: &SemanticNode) -> Result<Self, AnalysisError> {
        let raw_type = node.attr(AttrKey::Type).unwrap_or("");
        let entity_type = raw_type.parse::<EntityType>()?;
        let name = node.display_name().unwrap_or("").to_string();
        let role = node.attr(AttrKey::Role).and_then(EntityRole::parse_token);
        Ok(Self {
            name,
            entity_type,
            role,
        })
    }
}

/// A deduplicated, role-frequency-annotated canonical entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// 0-based identifier in first-seen group order
    pub id: usize,
    /// Display name of the first mention in the group
    pub name: String,
    /// Pre-normalization name; populated only on the semantic-network path
    pub original_name: Option<String>,
    /// Semantic type shared by all mentions in the group
    pub entity_type: EntityType,
    /// Mentions seen in the adjective role
    pub freq_adj: u32,
    /// Mentions seen in the subject role
    pub freq_subj: u32,
    /// Mentions seen in the object role
    pub freq_obj: u32,
    /// Mentions seen in an explicit other role
    pub freq_other: u32,
}

impl Theme {
    /// Create a theme with zeroed counters
    pub fn new(id: usize, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id,
            name: name.into(),
            original_name: None,
            entity_type,
            freq_adj: 0,
            freq_subj: 0,
            freq_obj: 0,
            freq_other: 0,
        }
    }

    /// Count one mention with the given recognized role
    pub fn count_role(&mut self, role: Option<EntityRole>) {
        match role {
            Some(EntityRole::Adj) => self.freq_adj += 1,
            Some(EntityRole::Subj) => self.freq_subj += 1,
            Some(EntityRole::Obj) => self.freq_obj += 1,
            Some(EntityRole::Other) => self.freq_other += 1,
            None => {}
        }
    }

    /// Sum of all role counters
    pub fn total_role_freq(&self) -> u32 {
        self.freq_adj + self.freq_subj + self.freq_obj + self.freq_other
    }
}

/// A directed, typed relation between two themes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// `Theme::id` of the source theme within the same result
    pub source_theme_id: usize,
    /// `Theme::id` of the destination theme within the same result
    pub dest_theme_id: usize,
    /// Relation type
    pub link_type: String,
    /// Occurrence count
    pub freq: u32,
}

/// Bitmask of the result components a caller wants computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Options(pub u8);

impl Options {
    pub const NONE: Options = Options(0);
    /// Canonical textual form of the graph
    pub const RDF: Options = Options(1);
    /// Deduplicated theme list
    pub const THEME_LIST: Options = Options(2);
    /// Kernel-built semantic network; only meaningful with `THEME_LIST`
    pub const SEM_NET: Options = Options(4);
    /// Tonality marking secondary analysis
    pub const TONALITY: Options = Options(8);
    /// Opinion mining with tonality; outranks plain `TONALITY`
    pub const OPINION_MINING_WITH_TONALITY: Options = Options(16);
    /// Everything except secondary analyses
    pub const ALL: Options = Options(1 | 2 | 4);

    /// Whether every bit of `other` is set
    pub fn has(&self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: Options) {
        self.0 |= other.0;
    }

    /// Whether no bits are set
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Options {
    type Output = Options;

    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

/// One scored object from a tonality marking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonalityObject {
    /// Normalized object name
    pub name: String,
    /// Positive score, when present
    pub positive: Option<f64>,
    /// Negative score, when present
    pub negative: Option<f64>,
}

/// Output of an external tonality marking analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TonalityResult {
    pub objects: Vec<TonalityObject>,
}

/// One extracted opinion from an opinion mining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    /// Object the opinion is about
    pub object: String,
    /// Positive score, when present
    pub positive: Option<f64>,
    /// Negative score, when present
    pub negative: Option<f64>,
    /// Supporting quote from the source text
    pub quote: Option<String>,
}

/// Output of an external opinion mining analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpinionMiningResult {
    pub opinions: Vec<Opinion>,
}

/// Output of whichever secondary analysis ran for the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis", content = "result")]
pub enum SecondaryResult {
    Tonality(TonalityResult),
    OpinionMining(OpinionMiningResult),
}

/// The assembled per-request result.
///
/// Every field is populated only when its option bit was requested;
/// `None` means "not requested", never "requested but empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Canonical textual form of the graph
    pub rdf: Option<String>,
    /// Deduplicated themes
    pub themes: Option<Vec<Theme>>,
    /// Typed relations between themes; semantic-network path only
    pub links: Option<Vec<Link>>,
    /// Secondary analysis output
    pub secondary: Option<SecondaryResult>,
}

/// Errors raised by the aggregation pipeline
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// A kernel emitted a semantic type outside the closed enumeration
    #[error("unknown semantic type [{raw}]")]
    UnknownEntityType { raw: String },
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SCHEMA_VERSION: &str = "1.1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_sq(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// Subjects

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Gay,
    Lesbian,
    TransgenderMale,
    TransgenderFemale,
    Nonbinary,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Illness {
    #[default]
    None,
    PsychologicalOrPhysicalProblem,
    AlcoholOrDrugAbuse,
    SuspectedAbuse,
    InRecovery,
    SeriousMentalOrPhysicalProblem,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeSpan {
    #[serde(default)]
    pub birth: Option<String>,
    #[serde(default)]
    pub death: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraInfo {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub short_note: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonAttribute {
    pub gender: Gender,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "isIP")]
    pub is_ip: bool,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default)]
    pub life_span: LifeSpan,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub illness: Illness,
    #[serde(default)]
    pub extra_info: ExtraInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalAttribute {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_dead: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetusStatus {
    Miscarriage,
    Abortion,
    #[default]
    Pregnancy,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetusAttribute {
    #[serde(default)]
    pub status: FetusStatus,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectEntity {
    Person {
        attribute: PersonAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
    Animal {
        attribute: AnimalAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
    Fetus {
        attribute: FetusAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
}

impl SubjectEntity {
    pub fn person(attribute: PersonAttribute) -> Self {
        SubjectEntity::Person { attribute, memo: None }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            SubjectEntity::Person { memo, .. }
            | SubjectEntity::Animal { memo, .. }
            | SubjectEntity::Fetus { memo, .. } => memo.as_deref(),
        }
    }

    pub fn set_memo(&mut self, value: Option<String>) {
        match self {
            SubjectEntity::Person { memo, .. }
            | SubjectEntity::Animal { memo, .. }
            | SubjectEntity::Fetus { memo, .. } => *memo = value,
        }
    }

    pub fn as_person(&self) -> Option<&PersonAttribute> {
        match self {
            SubjectEntity::Person { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    pub fn is_person(&self) -> bool {
        matches!(self, SubjectEntity::Person { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeSize {
    Small,
    #[default]
    Default,
    Large,
}

impl NodeSize {
    /// Hit radius in canvas units.
    pub fn radius(self) -> f64 {
        match self {
            NodeSize::Small => 15.0,
            NodeSize::Default => 20.0,
            NodeSize::Large => 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectStyle {
    pub size: NodeSize,
    pub bg_color: String,
    pub text_color: String,
}

impl Default for SubjectStyle {
    fn default() -> Self {
        SubjectStyle {
            size: NodeSize::Default,
            bg_color: "#FFFFFF".to_string(),
            text_color: "#000000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectLayout {
    pub center: Point,
    #[serde(default)]
    pub style: SubjectStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub entity: SubjectEntity,
    pub layout: SubjectLayout,
}

impl Subject {
    pub fn new(entity: SubjectEntity, center: Point) -> Self {
        Subject {
            id: new_id(),
            entity,
            layout: SubjectLayout { center, style: SubjectStyle::default() },
        }
    }
}

// Connections

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationStatus {
    #[default]
    Connected,
    Close,
    Fused,
    Distant,
    Hostile,
    Cutoff,
    CloseHostile,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfluenceStatus {
    PhysicalAbuse,
    EmotionalAbuse,
    SexualAbuse,
    #[default]
    FocusedOn,
    FocusedOnNegatively,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerStatus {
    #[default]
    Married,
    Separated,
    Divorced,
    Remarried,
    Cohabiting,
    SecretAffair,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParentChildStatus {
    #[default]
    Biological,
    Adopted,
    Foster,
    Twins,
    IdenticalTwins,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDetail {
    #[serde(default)]
    pub married_date: Option<String>,
    #[serde(default)]
    pub divorced_date: Option<String>,
    #[serde(default)]
    pub reunited_date: Option<String>,
    #[serde(default)]
    pub relationship_start_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAttribute {
    #[serde(default)]
    pub status: RelationStatus,
    pub subjects: [String; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceAttribute {
    #[serde(default)]
    pub status: InfluenceStatus,
    pub start_ref: String,
    pub end_ref: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerAttribute {
    #[serde(default)]
    pub status: PartnerStatus,
    pub subjects: [String; 2],
    #[serde(default)]
    pub detail: PartnerDetail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentChildAttribute {
    #[serde(default)]
    pub status: ParentChildStatus,
    /// Subject id, or the id of a partner connection for "child of this couple".
    pub parent_ref: String,
    pub child_refs: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAttribute {
    pub member_ids: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionKind {
    Relation,
    Influence,
    Partner,
    ParentChild,
    Group,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionEntity {
    Relation {
        attribute: RelationAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
    Influence {
        attribute: InfluenceAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
    Partner {
        attribute: PartnerAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
    ParentChild {
        attribute: ParentChildAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
    Group {
        attribute: GroupAttribute,
        #[serde(default)]
        memo: Option<String>,
    },
}

impl ConnectionEntity {
    pub fn kind(&self) -> ConnectionKind {
        match self {
            ConnectionEntity::Relation { .. } => ConnectionKind::Relation,
            ConnectionEntity::Influence { .. } => ConnectionKind::Influence,
            ConnectionEntity::Partner { .. } => ConnectionKind::Partner,
            ConnectionEntity::ParentChild { .. } => ConnectionKind::ParentChild,
            ConnectionEntity::Group { .. } => ConnectionKind::Group,
        }
    }

    /// Every id this connection points at, in attribute order.
    pub fn referenced_ids(&self) -> Vec<&str> {
        match self {
            ConnectionEntity::Relation { attribute, .. } => {
                attribute.subjects.iter().map(String::as_str).collect()
            }
            ConnectionEntity::Partner { attribute, .. } => {
                attribute.subjects.iter().map(String::as_str).collect()
            }
            ConnectionEntity::Influence { attribute, .. } => {
                vec![attribute.start_ref.as_str(), attribute.end_ref.as_str()]
            }
            ConnectionEntity::ParentChild { attribute, .. } => {
                let mut ids = Vec::with_capacity(1 + attribute.child_refs.len());
                ids.push(attribute.parent_ref.as_str());
                ids.extend(attribute.child_refs.iter().map(String::as_str));
                ids
            }
            ConnectionEntity::Group { attribute, .. } => {
                attribute.member_ids.iter().map(String::as_str).collect()
            }
        }
    }

    pub fn parent_ref(&self) -> Option<&str> {
        match self {
            ConnectionEntity::ParentChild { attribute, .. } => Some(attribute.parent_ref.as_str()),
            _ => None,
        }
    }

    pub fn partner_subjects(&self) -> Option<&[String; 2]> {
        match self {
            ConnectionEntity::Partner { attribute, .. } => Some(&attribute.subjects),
            _ => None,
        }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            ConnectionEntity::Relation { memo, .. }
            | ConnectionEntity::Influence { memo, .. }
            | ConnectionEntity::Partner { memo, .. }
            | ConnectionEntity::ParentChild { memo, .. }
            | ConnectionEntity::Group { memo, .. } => memo.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeWidth {
    Thin,
    #[default]
    Default,
    Thick,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionLayout {
    pub stroke_width: StrokeWidth,
    pub stroke_color: String,
    pub text_color: String,
}

impl Default for ConnectionLayout {
    fn default() -> Self {
        ConnectionLayout {
            stroke_width: StrokeWidth::Default,
            stroke_color: "#000000".to_string(),
            text_color: "#000000".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub entity: ConnectionEntity,
    #[serde(default)]
    pub layout: ConnectionLayout,
}

impl Connection {
    pub fn new(entity: ConnectionEntity) -> Self {
        Connection { id: new_id(), entity, layout: ConnectionLayout::default() }
    }
}

// Annotations

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationStyle {
    pub size: NodeSize,
    pub bg_color: String,
    pub text_color: String,
    pub border_style: BorderStyle,
    pub border_color: String,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        AnnotationStyle {
            size: NodeSize::Default,
            bg_color: "#FFFFFF".to_string(),
            text_color: "#000000".to_string(),
            border_style: BorderStyle::Solid,
            border_color: "#000000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationLayout {
    pub center: Point,
    #[serde(default)]
    pub style: AnnotationStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub text: String,
    pub layout: AnnotationLayout,
}

impl Annotation {
    pub fn new(text: impl Into<String>, center: Point) -> Self {
        Annotation {
            id: new_id(),
            text: text.into(),
            layout: AnnotationLayout { center, style: AnnotationStyle::default() },
        }
    }
}

// Genogram aggregate

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewpoint {
    pub center: Point,
    pub zoom: f64,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Viewpoint { center: Point::default(), zoom: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Visibility {
    pub name: bool,
    pub age: bool,
    pub birth_date: bool,
    pub death_date: bool,
    pub extra_info: bool,
    pub illness: bool,
    pub relation_line: bool,
    pub group_line: bool,
    pub grid: bool,
    pub memo: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility {
            name: true,
            age: true,
            birth_date: true,
            death_date: true,
            extra_info: true,
            illness: true,
            relation_line: true,
            group_line: true,
            grid: false,
            memo: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenogramView {
    #[serde(default)]
    pub viewpoint: Viewpoint,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Genogram {
    pub id: String,
    pub version: String,
    pub metadata: Metadata,
    pub subjects: HashMap<String, Subject>,
    pub connections: HashMap<String, Connection>,
    pub annotations: HashMap<String, Annotation>,
    pub view: GenogramView,
}

impl Genogram {
    pub fn new(title: impl Into<String>, timestamp: String) -> Self {
        Genogram {
            id: new_id(),
            version: SCHEMA_VERSION.to_string(),
            metadata: Metadata {
                title: title.into(),
                client_id: None,
                author_id: None,
                created_at: timestamp.clone(),
                updated_at: timestamp,
            },
            subjects: HashMap::new(),
            connections: HashMap::new(),
            annotations: HashMap::new(),
            view: GenogramView::default(),
        }
    }

    /// True if `id` names a subject or a connection.
    pub fn contains_ref(&self, id: &str) -> bool {
        self.subjects.contains_key(id) || self.connections.contains_key(id)
    }

    /// Follows a parent-child `parent_ref` to the subjects it denotes: the
    /// subject itself, or both partners when the ref names a partner connection.
    pub fn resolve_parents(&self, parent_ref: &str) -> Vec<&str> {
        if let Some((id, _)) = self.subjects.get_key_value(parent_ref) {
            return vec![id.as_str()];
        }
        match self.connections.get(parent_ref).and_then(|c| c.entity.partner_subjects()) {
            Some(pair) => pair.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

//! Statement catalog: marker code → statement template.
//!
//! The standard catalog lays stickers out left to right: every flow statement
//! has an incoming socket one diameter to its left and an outgoing plug one
//! diameter to its right, so two stickers placed two diameters apart on the
//! same row connect. Parameter stickers sit two diameters below the statement
//! they configure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tangle_types::{Marker, NativeAction};

use crate::connector::{Connector, ConnectorTemplate, Direction};
use crate::error::{GraphError, GraphResult};
use crate::statement::{ParamValue, Statement, StatementId, StatementKind};

/// Marker codes of the standard sticker sheet.
pub mod codes {
    pub const BEGIN: u32 = 31;
    pub const WALK: u32 = 47;
    pub const RUN: u32 = 55;
    pub const JUMP: u32 = 59;
    pub const SPIN: u32 = 61;
    pub const WIGGLE: u32 = 79;
    pub const SLEEP: u32 = 87;
    pub const YAWN: u32 = 91;
    pub const STAND: u32 = 93;
    pub const END: u32 = 103;
    pub const DANCE: u32 = 107;
    pub const WAIT: u32 = 109;
    pub const BEGIN_REPEAT: u32 = 115;
    pub const END_REPEAT: u32 = 117;
    pub const TAP_SENSOR: u32 = 121;
    pub const FOREVER: u32 = 143;
    /// Count stickers `2` through `10`, in order.
    pub const COUNTS: [u32; 9] = [151, 155, 157, 167, 171, 173, 179, 181, 185];
}

/// Connector names used by the standard catalog.
pub mod names {
    pub const PREV: &str = "prev";
    pub const NEXT: &str = "next";
    pub const PARAM: &str = "param";
    pub const VALUE: &str = "value";
}

const ZONE_RADIUS: f32 = 0.5;

/// Everything needed to instantiate a statement from a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTemplate {
    pub code: u32,
    pub name: String,
    #[serde(flatten)]
    pub kind: StatementKind,
    pub connectors: Vec<ConnectorTemplate>,
}

impl StatementTemplate {
    /// Build a fresh statement for `marker` with unresolved connectors.
    pub fn instantiate(&self, id: StatementId, marker: Marker) -> Statement {
        let connectors = self
            .connectors
            .iter()
            .map(|connector| Connector::from_template(connector, &marker))
            .collect::<Vec<_>>();
        Statement::new(id, self.kind, self.name.clone(), marker, connectors)
    }

    fn validate(&self) -> GraphResult<()> {
        let invalid = |reason: &str| GraphError::InvalidTemplate {
            code: self.code,
            reason: reason.to_string(),
        };
        if self.connectors.is_empty() {
            return Err(invalid("a statement needs at least one connector"));
        }
        if self
            .connectors
            .iter()
            .any(|c| !(c.radius.is_finite() && c.radius > 0.0))
        {
            return Err(invalid("connector radius must be positive"));
        }
        if self.kind.is_parameter() {
            if !self
                .connectors
                .iter()
                .any(|c| c.direction == Direction::Incoming)
            {
                return Err(invalid("a parameter needs an incoming socket"));
            }
            if self.connectors.iter().any(|c| c.direction.is_plug()) {
                return Err(invalid("a parameter is a leaf and cannot have plugs"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    templates: Vec<StatementTemplate>,
}

/// Lookup table from marker code to statement template.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: BTreeMap<u32, StatementTemplate>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, rejecting duplicates and malformed entries.
    pub fn insert(&mut self, template: StatementTemplate) -> GraphResult<()> {
        template.validate()?;
        if self.templates.contains_key(&template.code) {
            return Err(GraphError::DuplicateCode(template.code));
        }
        self.templates.insert(template.code, template);
        Ok(())
    }

    pub fn get(&self, code: u32) -> Option<&StatementTemplate> {
        self.templates.get(&code)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> impl Iterator<Item = &StatementTemplate> {
        self.templates.values()
    }

    /// Load a catalog from `{"templates": [...]}` JSON.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for template in file.templates {
            catalog.insert(template)?;
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> GraphResult<String> {
        let file = CatalogFile {
            templates: self.templates.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// The standard sticker sheet.
    pub fn standard() -> Self {
        let mut templates = vec![
            template(codes::BEGIN, "Begin", StatementKind::Start, &[next()]),
            template(codes::WAIT, "Wait", StatementKind::Wait, &flow_with_param()),
            template(
                codes::BEGIN_REPEAT,
                "Begin Repeat",
                StatementKind::LoopBegin,
                &flow_with_param(),
            ),
            template(codes::END_REPEAT, "End Repeat", StatementKind::LoopEnd, &flow()),
            parameter(codes::TAP_SENSOR, "Tap Sensor", ParamValue::Tap),
            parameter(codes::FOREVER, "Forever", ParamValue::Forever),
        ];

        let actions = [
            (codes::WALK, "Walk", NativeAction::Walk),
            (codes::RUN, "Run", NativeAction::Run),
            (codes::JUMP, "Jump", NativeAction::Jump),
            (codes::SPIN, "Spin", NativeAction::Spin),
            (codes::WIGGLE, "Wiggle", NativeAction::Wiggle),
            (codes::SLEEP, "Sleep", NativeAction::Sleep),
            (codes::YAWN, "Yawn", NativeAction::Yawn),
            (codes::STAND, "Stand", NativeAction::Stand),
            (codes::END, "End", NativeAction::End),
            (codes::DANCE, "Dance", NativeAction::Dance),
        ];
        for (code, name, action) in actions {
            templates.push(template(code, name, StatementKind::Action { action }, &flow()));
        }

        for (n, code) in (2u32..).zip(codes::COUNTS) {
            templates.push(parameter(code, &n.to_string(), ParamValue::Count(n)));
        }

        Self {
            templates: templates.into_iter().map(|t| (t.code, t)).collect(),
        }
    }
}

fn template(code: u32, name: &str, kind: StatementKind, connectors: &[ConnectorTemplate]) -> StatementTemplate {
    StatementTemplate {
        code,
        name: name.to_string(),
        kind,
        connectors: connectors.to_vec(),
    }
}

fn parameter(code: u32, name: &str, value: ParamValue) -> StatementTemplate {
    template(
        code,
        name,
        StatementKind::Parameter { value },
        &[ConnectorTemplate::new(names::VALUE, Direction::Incoming, 0.0, -1.0, ZONE_RADIUS)],
    )
}

fn prev() -> ConnectorTemplate {
    ConnectorTemplate::new(names::PREV, Direction::Incoming, -1.0, 0.0, ZONE_RADIUS)
}

fn next() -> ConnectorTemplate {
    ConnectorTemplate::new(names::NEXT, Direction::Outgoing, 1.0, 0.0, ZONE_RADIUS)
}

fn flow() -> [ConnectorTemplate; 2] {
    [prev(), next()]
}

fn flow_with_param() -> [ConnectorTemplate; 3] {
    [
        prev(),
        next(),
        ConnectorTemplate::new(names::PARAM, Direction::Parameter, 0.0, 1.0, ZONE_RADIUS),
    ]
}

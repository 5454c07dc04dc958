//! Connector catalogs.
//!
//! Each diagram variant offers its own set of connector tools and may derive
//! layout from its connectors. A [`ConnectorCatalog`] is chosen once per
//! diagram load with [`catalog_for`] and consulted by the interaction layer
//! whenever a connector is created or retyped.

use log::debug;

use easel_core::{
    connection::{LIFELINE_HEADER_HEIGHT, LIFELINE_POINT_SPACING},
    geometry::{Bounds, Size},
    identifier::{ConnectorId, ConnectorTypeId, PointId, ShapeId},
    kind::{DiagramVariant, PointLayout},
    routing::ConnectorStyle,
};

use crate::{
    command::Command,
    model::{Connector, DiagramModel, LineKind, MarkerKind},
};

/// A connector type offered by a catalog, with the defaults it applies.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorTool {
    id: ConnectorTypeId,
    label: &'static str,
    style: ConnectorStyle,
    start_marker: MarkerKind,
    end_marker: MarkerKind,
    line: LineKind,
}

impl ConnectorTool {
    fn new(
        id: &str,
        label: &'static str,
        style: ConnectorStyle,
        (start_marker, end_marker): (MarkerKind, MarkerKind),
        line: LineKind,
    ) -> Self {
        Self {
            id: ConnectorTypeId::new(id),
            label,
            style,
            start_marker,
            end_marker,
            line,
        }
    }

    pub fn id(&self) -> ConnectorTypeId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn style(&self) -> ConnectorStyle {
        self.style
    }

    pub fn start_marker(&self) -> MarkerKind {
        self.start_marker
    }

    pub fn end_marker(&self) -> MarkerKind {
        self.end_marker
    }

    pub fn line(&self) -> LineKind {
        self.line
    }

    /// Builds a new connector of this type.
    pub fn build(&self, id: ConnectorId, source: ShapeId, target: ShapeId) -> Connector {
        Connector::new(id, source, target, self.id)
            .with_style(self.style)
            .with_markers(self.start_marker, self.end_marker)
            .with_line(self.line)
    }

    /// Returns a copy of `connector` retyped to this tool.
    pub fn retype(&self, connector: &Connector) -> Connector {
        let mut retyped = connector.clone();
        retyped.set_type(
            self.id,
            self.style,
            (self.start_marker, self.end_marker),
            self.line,
        );
        retyped
    }
}

/// Per-variant connector behaviour.
pub trait ConnectorCatalog {
    /// The variant this catalog serves.
    fn variant(&self) -> DiagramVariant;

    /// Tools offered, in menu order. Never empty.
    fn tools(&self) -> &[ConnectorTool];

    /// Tool used for newly drawn connectors.
    fn default_tool(&self) -> &ConnectorTool {
        &self.tools()[0]
    }

    fn tool(&self, id: ConnectorTypeId) -> Option<&ConnectorTool> {
        self.tools().iter().find(|tool| tool.id == id)
    }

    /// Whether a connector may start and end on the same shape.
    fn allows_self_connection(&self) -> bool {
        false
    }

    /// Returns shape updates that bring derived layout in line with the
    /// model's connectors. Empty for variants without derived layout.
    fn refresh_layout(&self, _model: &DiagramModel) -> Vec<Command> {
        Vec::new()
    }
}

/// Returns the catalog for a diagram variant.
pub fn catalog_for(variant: DiagramVariant) -> Box<dyn ConnectorCatalog> {
    match variant {
        DiagramVariant::Bpmn => Box::new(BpmnCatalog::new()),
        DiagramVariant::Class => Box::new(ClassCatalog::new()),
        DiagramVariant::Sequence => Box::new(SequenceCatalog::new()),
        DiagramVariant::Dataflow => Box::new(DataflowCatalog::new()),
    }
}

/// Builds the command that switches `connector` to `connector_type`.
///
/// The result is a batch holding the connector update and, when the catalog
/// derives layout, a nested "Refresh layout" batch, so one undo reverts both.
/// Returns `None` if the connector or tool is unknown or the type is unchanged.
pub fn change_connector_type(
    catalog: &dyn ConnectorCatalog,
    model: &DiagramModel,
    connector: ConnectorId,
    connector_type: ConnectorTypeId,
) -> Option<Command> {
    let before = model.connector(connector)?;
    let Some(tool) = catalog.tool(connector_type) else {
        debug!(
            connector:% = connector,
            connector_type:% = connector_type;
            "Unknown connector type"
        );
        return None;
    };
    let update = Command::update_connector(before.clone(), tool.retype(before))?;

    let mut scratch = model.clone();
    update.apply(&mut scratch).ok()?;
    let refresh = catalog.refresh_layout(&scratch);

    let mut commands = vec![update];
    if !refresh.is_empty() {
        commands.push(Command::batch("Refresh layout", refresh));
    }
    Some(Command::batch("Change connector type", commands))
}

/// BPMN process diagrams.
#[derive(Debug)]
pub struct BpmnCatalog {
    tools: Vec<ConnectorTool>,
}

impl BpmnCatalog {
    pub fn new() -> Self {
        Self {
            tools: vec![
                ConnectorTool::new(
                    "sequence_flow",
                    "Sequence flow",
                    ConnectorStyle::Orthogonal,
                    (MarkerKind::None, MarkerKind::Arrow),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "message_flow",
                    "Message flow",
                    ConnectorStyle::Orthogonal,
                    (MarkerKind::Circle, MarkerKind::OpenArrow),
                    LineKind::Dashed,
                ),
                ConnectorTool::new(
                    "association",
                    "Association",
                    ConnectorStyle::Straight,
                    (MarkerKind::None, MarkerKind::None),
                    LineKind::Dashed,
                ),
            ],
        }
    }
}

impl Default for BpmnCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorCatalog for BpmnCatalog {
    fn variant(&self) -> DiagramVariant {
        DiagramVariant::Bpmn
    }

    fn tools(&self) -> &[ConnectorTool] {
        &self.tools
    }
}

/// UML class diagrams.
#[derive(Debug)]
pub struct ClassCatalog {
    tools: Vec<ConnectorTool>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self {
            tools: vec![
                ConnectorTool::new(
                    "association",
                    "Association",
                    ConnectorStyle::Straight,
                    (MarkerKind::None, MarkerKind::OpenArrow),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "inheritance",
                    "Inheritance",
                    ConnectorStyle::Orthogonal,
                    (MarkerKind::None, MarkerKind::Triangle),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "realization",
                    "Realization",
                    ConnectorStyle::Orthogonal,
                    (MarkerKind::None, MarkerKind::Triangle),
                    LineKind::Dashed,
                ),
                ConnectorTool::new(
                    "dependency",
                    "Dependency",
                    ConnectorStyle::Straight,
                    (MarkerKind::None, MarkerKind::OpenArrow),
                    LineKind::Dashed,
                ),
                ConnectorTool::new(
                    "aggregation",
                    "Aggregation",
                    ConnectorStyle::Straight,
                    (MarkerKind::Diamond, MarkerKind::None),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "composition",
                    "Composition",
                    ConnectorStyle::Straight,
                    (MarkerKind::FilledDiamond, MarkerKind::None),
                    LineKind::Solid,
                ),
            ],
        }
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorCatalog for ClassCatalog {
    fn variant(&self) -> DiagramVariant {
        DiagramVariant::Class
    }

    fn tools(&self) -> &[ConnectorTool] {
        &self.tools
    }
}

/// Sequence diagrams.
///
/// Messages attach to lifeline rows, so the catalog keeps every lifeline
/// aligned on a shared top edge and tall enough for its lowest message.
#[derive(Debug)]
pub struct SequenceCatalog {
    tools: Vec<ConnectorTool>,
}

impl SequenceCatalog {
    pub fn new() -> Self {
        Self {
            tools: vec![
                ConnectorTool::new(
                    "sync_message",
                    "Synchronous message",
                    ConnectorStyle::Straight,
                    (MarkerKind::None, MarkerKind::Arrow),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "async_message",
                    "Asynchronous message",
                    ConnectorStyle::Straight,
                    (MarkerKind::None, MarkerKind::OpenArrow),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "reply",
                    "Reply",
                    ConnectorStyle::Straight,
                    (MarkerKind::None, MarkerKind::OpenArrow),
                    LineKind::Dashed,
                ),
            ],
        }
    }
}

impl Default for SequenceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorCatalog for SequenceCatalog {
    fn variant(&self) -> DiagramVariant {
        DiagramVariant::Sequence
    }

    fn tools(&self) -> &[ConnectorTool] {
        &self.tools
    }

    fn allows_self_connection(&self) -> bool {
        true
    }

    fn refresh_layout(&self, model: &DiagramModel) -> Vec<Command> {
        let lifelines: Vec<_> = model
            .shapes()
            .filter(|shape| shape.kind().point_layout() == PointLayout::Lifeline)
            .collect();
        let Some(top) = lifelines
            .iter()
            .map(|shape| shape.position().y())
            .min_by(f32::total_cmp)
        else {
            return Vec::new();
        };

        let mut required = lifelines
            .iter()
            .map(|shape| shape.size().height())
            .fold(LIFELINE_HEADER_HEIGHT, f32::max);
        for connector in model.connectors() {
            for point in [connector.source_point(), connector.target_point()]
                .into_iter()
                .flatten()
            {
                if let Some(row) = lifeline_row(point) {
                    let height =
                        LIFELINE_HEADER_HEIGHT + LIFELINE_POINT_SPACING * (row + 2) as f32;
                    required = required.max(height);
                }
            }
        }

        lifelines
            .into_iter()
            .filter_map(|shape| {
                let mut after = shape.clone();
                after.set_bounds(Bounds::new_from_top_left(
                    shape.position().with_y(top),
                    Size::new(shape.size().width(), required),
                ));
                Command::update_shape(shape.clone(), after)
            })
            .collect()
    }
}

/// Parses the row of a lifeline message point (`left-N` / `right-N`).
fn lifeline_row(point: PointId) -> Option<usize> {
    let name = point.to_string();
    let row = name
        .strip_prefix("left-")
        .or_else(|| name.strip_prefix("right-"))?;
    row.parse().ok()
}

/// Data flow diagrams.
#[derive(Debug)]
pub struct DataflowCatalog {
    tools: Vec<ConnectorTool>,
}

impl DataflowCatalog {
    pub fn new() -> Self {
        Self {
            tools: vec![
                ConnectorTool::new(
                    "data_flow",
                    "Data flow",
                    ConnectorStyle::Curved,
                    (MarkerKind::None, MarkerKind::Arrow),
                    LineKind::Solid,
                ),
                ConnectorTool::new(
                    "bidirectional_flow",
                    "Bidirectional flow",
                    ConnectorStyle::Curved,
                    (MarkerKind::Arrow, MarkerKind::Arrow),
                    LineKind::Solid,
                ),
            ],
        }
    }
}

impl Default for DataflowCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorCatalog for DataflowCatalog {
    fn variant(&self) -> DiagramVariant {
        DiagramVariant::Dataflow
    }

    fn tools(&self) -> &[ConnectorTool] {
        &self.tools
    }
}

//! End-to-end scenarios driving a workspace through input events.

use easel::{
    Command, CommandError, EaselError, Workspace,
    config::EditorConfig,
    geometry::{Point, Size},
    identifier::{ConnectorId, ConnectorTypeId, DiagramId, PointId, ShapeId},
    interaction::{InputEvent, Key, Modifiers, PointerButton, context::Selectable, gesture::Gesture},
    kind::{DiagramVariant, ShapeKind},
    model::{Connector, DiagramModel, Shape},
    store::MemoryStore,
};

fn shape(id: &str, kind: ShapeKind, x: f32, y: f32, w: f32, h: f32) -> Shape {
    Shape::new(ShapeId::new(id), kind, Point::new(x, y), Size::new(w, h))
}

fn open(model: DiagramModel) -> (Workspace<MemoryStore>, DiagramId) {
    let diagram = DiagramId::new("diagram");
    let mut store = MemoryStore::new();
    store.insert(diagram, model);
    let mut workspace = Workspace::new(store, EditorConfig::default());
    workspace.open(diagram).expect("diagram opens");
    (workspace, diagram)
}

fn two_tasks() -> DiagramModel {
    DiagramModel::from_parent_links(
        DiagramVariant::Bpmn,
        vec![
            shape("A", ShapeKind::Task, 0.0, 0.0, 100.0, 60.0),
            shape("B", ShapeKind::Task, 200.0, 0.0, 100.0, 60.0),
        ],
        vec![],
    )
}

fn down(position: Point) -> InputEvent {
    InputEvent::PointerDown {
        position,
        button: PointerButton::Primary,
        modifiers: Modifiers::NONE,
    }
}

fn up(position: Point) -> InputEvent {
    InputEvent::PointerUp {
        position,
        button: PointerButton::Primary,
    }
}

fn drive(workspace: &mut Workspace<MemoryStore>, diagram: DiagramId, events: &[InputEvent]) {
    for event in events {
        workspace.dispatch(diagram, event).expect("event handled");
    }
}

fn draw_a_to_b(workspace: &mut Workspace<MemoryStore>, diagram: DiagramId) {
    drive(
        workspace,
        diagram,
        &[
            down(Point::new(100.0, 30.0)),
            InputEvent::PointerMove {
                position: Point::new(198.0, 30.0),
            },
            up(Point::new(198.0, 30.0)),
        ],
    );
}

#[test]
fn test_drawn_connector_routes_between_points() {
    let (mut workspace, diagram) = open(two_tasks());
    draw_a_to_b(&mut workspace, diagram);

    let scene = workspace.scene(diagram).unwrap();
    assert_eq!(scene.connectors().len(), 1);
    assert_eq!(scene.connectors()[0].path.path_data(), "M 100 30 L 200 30");
    assert_eq!(workspace.store().persisted_count(), 1);
}

#[test]
fn test_escape_while_drawing_leaves_model_unchanged() {
    let (mut workspace, diagram) = open(two_tasks());
    drive(
        &mut workspace,
        diagram,
        &[
            down(Point::new(100.0, 30.0)),
            InputEvent::PointerMove {
                position: Point::new(150.0, 100.0),
            },
        ],
    );
    assert!(workspace.scene(diagram).unwrap().preview().is_some());

    drive(
        &mut workspace,
        diagram,
        &[InputEvent::KeyDown {
            key: Key::Escape,
            modifiers: Modifiers::NONE,
        }],
    );
    let canvas = workspace.canvas(diagram).unwrap();
    assert!(canvas.interaction().gesture().is_idle());
    assert_eq!(canvas.model().connector_count(), 0);
    assert!(workspace.scene(diagram).unwrap().preview().is_none());
    assert!(!workspace.can_undo(diagram));
}

#[test]
fn test_undo_redo_created_connector() {
    let (mut workspace, diagram) = open(two_tasks());
    let before = workspace.canvas(diagram).unwrap().model().clone();
    draw_a_to_b(&mut workspace, diagram);
    let after = workspace.canvas(diagram).unwrap().model().clone();
    assert_eq!(workspace.undo_label(diagram).as_deref(), Some("Create connector"));

    assert!(workspace.undo(diagram).unwrap());
    assert_eq!(workspace.canvas(diagram).unwrap().model(), &before);
    assert!(workspace.can_redo(diagram));

    assert!(workspace.redo(diagram).unwrap());
    assert_eq!(workspace.canvas(diagram).unwrap().model(), &after);
    assert!(!workspace.redo(diagram).unwrap());
}

#[test]
fn test_connector_omitted_when_source_shape_missing() {
    let model = DiagramModel::from_parent_links(
        DiagramVariant::Bpmn,
        vec![shape("B", ShapeKind::Task, 200.0, 0.0, 100.0, 60.0)],
        vec![
            Connector::new(
                ConnectorId::new("orphan"),
                ShapeId::new("A"),
                ShapeId::new("B"),
                ConnectorTypeId::new("sequence_flow"),
            )
            .with_points(PointId::new("right"), PointId::new("left")),
        ],
    );
    let (workspace, diagram) = open(model);
    let scene = workspace.scene(diagram).unwrap();
    assert_eq!(scene.shapes().len(), 1);
    assert!(scene.connectors().is_empty());
}

#[test]
fn test_drag_moves_container_with_children() {
    let model = DiagramModel::from_parent_links(
        DiagramVariant::Bpmn,
        vec![
            shape("task", ShapeKind::Task, 40.0, 40.0, 100.0, 60.0)
                .with_parent(ShapeId::new("pool")),
            shape("pool", ShapeKind::Pool, 0.0, 0.0, 400.0, 200.0),
        ],
        vec![],
    );
    let (mut workspace, diagram) = open(model);
    drive(
        &mut workspace,
        diagram,
        &[
            down(Point::new(300.0, 150.0)),
            InputEvent::PointerMove {
                position: Point::new(350.0, 160.0),
            },
        ],
    );

    // The preview moves both shapes before anything is committed.
    let scene = workspace.scene(diagram).unwrap();
    let task = scene.shape(ShapeId::new("task")).unwrap();
    assert_eq!(task.bounds.min_point(), Point::new(90.0, 50.0));
    assert_eq!(
        workspace.canvas(diagram).unwrap().model().shape(ShapeId::new("task")).unwrap().position(),
        Point::new(40.0, 40.0)
    );

    drive(&mut workspace, diagram, &[up(Point::new(350.0, 160.0))]);
    let model = workspace.canvas(diagram).unwrap().model();
    assert_eq!(model.shape(ShapeId::new("pool")).unwrap().position(), Point::new(50.0, 10.0));
    assert_eq!(model.shape(ShapeId::new("task")).unwrap().position(), Point::new(90.0, 50.0));
    assert_eq!(workspace.undo_label(diagram).as_deref(), Some("Move selection"));

    // Parent is painted before the child regardless of model order.
    let order: Vec<_> = workspace
        .scene(diagram)
        .unwrap()
        .shapes()
        .iter()
        .map(|shape| shape.id.to_string())
        .collect();
    assert_eq!(order, vec!["pool", "task"]);
}

#[test]
fn test_delete_selection_undone_in_one_step() {
    let model = DiagramModel::from_parent_links(
        DiagramVariant::Bpmn,
        vec![
            shape("pool", ShapeKind::Pool, 0.0, 0.0, 300.0, 200.0),
            shape("task", ShapeKind::Task, 20.0, 20.0, 100.0, 60.0)
                .with_parent(ShapeId::new("pool")),
            shape("out", ShapeKind::Task, 400.0, 20.0, 100.0, 60.0),
        ],
        vec![Connector::new(
            ConnectorId::new("flow"),
            ShapeId::new("task"),
            ShapeId::new("out"),
            ConnectorTypeId::new("sequence_flow"),
        )],
    );
    let (mut workspace, diagram) = open(model.clone());
    drive(
        &mut workspace,
        diagram,
        &[
            down(Point::new(250.0, 150.0)),
            up(Point::new(250.0, 150.0)),
            InputEvent::KeyDown {
                key: Key::Delete,
                modifiers: Modifiers::NONE,
            },
        ],
    );
    let canvas = workspace.canvas(diagram).unwrap();
    assert_eq!(canvas.model().shape_count(), 1);
    assert_eq!(canvas.model().connector_count(), 0);
    assert!(canvas.interaction().context().selection().is_empty());

    assert!(workspace.undo(diagram).unwrap());
    assert_eq!(workspace.canvas(diagram).unwrap().model(), &model);
    assert!(!workspace.can_undo(diagram));
}

#[test]
fn test_sequence_retype_undoes_layout_refresh() {
    let model = DiagramModel::from_parent_links(
        DiagramVariant::Sequence,
        vec![
            shape("a", ShapeKind::Lifeline, 0.0, 0.0, 100.0, 100.0),
            shape("b", ShapeKind::Lifeline, 200.0, 20.0, 100.0, 100.0),
        ],
        vec![
            Connector::new(
                ConnectorId::new("m"),
                ShapeId::new("a"),
                ShapeId::new("b"),
                ConnectorTypeId::new("sync_message"),
            )
            .with_points(PointId::new("right-0"), PointId::new("left-0")),
        ],
    );
    let (mut workspace, diagram) = open(model.clone());
    drive(
        &mut workspace,
        diagram,
        &[
            InputEvent::PointerDown {
                position: Point::new(150.0, 70.0),
                button: PointerButton::Secondary,
                modifiers: Modifiers::NONE,
            },
            InputEvent::MenuSelect(ConnectorTypeId::new("reply")),
        ],
    );

    let changed = workspace.canvas(diagram).unwrap().model();
    assert_eq!(changed.connector(ConnectorId::new("m")).unwrap().connector_type(), "reply");
    assert_eq!(changed.shape(ShapeId::new("b")).unwrap().position().y(), 0.0);
    assert_eq!(workspace.undo_label(diagram).as_deref(), Some("Change connector type"));

    assert!(workspace.undo(diagram).unwrap());
    assert_eq!(workspace.canvas(diagram).unwrap().model(), &model);
    assert!(!workspace.can_undo(diagram));
}

#[test]
fn test_failed_persist_rolls_back() {
    let (mut workspace, diagram) = open(two_tasks());
    let before = workspace.canvas(diagram).unwrap().model().clone();
    workspace.store_mut().fail_next_persist("connection reset");

    drive(
        &mut workspace,
        diagram,
        &[
            down(Point::new(100.0, 30.0)),
            InputEvent::PointerMove {
                position: Point::new(200.0, 30.0),
            },
        ],
    );
    let err = workspace.dispatch(diagram, &up(Point::new(200.0, 30.0))).unwrap_err();
    assert!(matches!(err, EaselError::Command(CommandError::Persist { .. })));

    assert_eq!(workspace.canvas(diagram).unwrap().model(), &before);
    assert!(!workspace.can_undo(diagram));
    assert!(!workspace.can_redo(diagram));
    assert!(workspace.canvas(diagram).unwrap().interaction().gesture().is_idle());

    // The next attempt goes through.
    let created = Command::create_connector(
        &before,
        Connector::new(
            ConnectorId::new("retry"),
            ShapeId::new("A"),
            ShapeId::new("B"),
            ConnectorTypeId::new("sequence_flow"),
        ),
    );
    workspace.execute(diagram, created).unwrap();
    assert!(workspace.can_undo(diagram));
}

#[test]
fn test_label_edit_and_selection_visible_in_scene() {
    let (mut workspace, diagram) = open(two_tasks());
    drive(
        &mut workspace,
        diagram,
        &[
            InputEvent::DoubleClick {
                position: Point::new(50.0, 20.0),
            },
            InputEvent::TextInput("Check stock".to_string()),
        ],
    );
    assert!(matches!(
        workspace.canvas(diagram).unwrap().interaction().gesture(),
        Gesture::EditingLabel(_)
    ));
    let scene = workspace.scene(diagram).unwrap();
    assert_eq!(scene.shape(ShapeId::new("A")).unwrap().label.as_deref(), Some("Check stock"));

    drive(&mut workspace, diagram, &[InputEvent::Blur]);
    let model = workspace.canvas(diagram).unwrap().model();
    assert_eq!(model.shape(ShapeId::new("A")).unwrap().label(), Some("Check stock"));

    drive(
        &mut workspace,
        diagram,
        &[down(Point::new(250.0, 20.0)), up(Point::new(250.0, 20.0))],
    );
    let canvas = workspace.canvas(diagram).unwrap();
    assert!(canvas.interaction().context().is_selected(Selectable::Shape(ShapeId::new("B"))));
    assert!(workspace.scene(diagram).unwrap().shape(ShapeId::new("B")).unwrap().selected);
}

#[test]
fn test_export_svg_writes_file() {
    let (mut workspace, diagram) = open(two_tasks());
    draw_a_to_b(&mut workspace, diagram);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.svg");
    workspace.export_svg(diagram, &path).unwrap();

    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("M 100 30 L 200 30"));
}

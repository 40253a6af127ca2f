// Integration tests for the command core: undo/redo over random edits
// and the bounded history

use blocks_sketch::{
    BlockGraph, BlockId, BlockKind, CommandArgs, CommandManager, CommandOutput, EditorConfig,
    EditorState, MemoryTransport, Point,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn create_state(max_operations: usize) -> EditorState {
    let config = EditorConfig {
        max_operations,
        ..EditorConfig::default()
    };
    EditorState::new(&config, Arc::new(MemoryTransport::new()))
}

fn create(manager: &mut CommandManager, state: &mut EditorState, kind: BlockKind, x: f64) -> BlockId {
    let args = CommandArgs::new()
        .with_kind(kind)
        .with_point(Point::new(x, 0.0));
    match manager.execute_command("CREATE_BLOCK", args, state).wait() {
        Ok(CommandOutput::Created(id)) => id,
        other => panic!("unexpected output {:?}", other),
    }
}

fn undo(manager: &mut CommandManager, state: &mut EditorState) -> CommandOutput {
    manager
        .execute_command("UNDO", CommandArgs::new(), state)
        .wait()
        .unwrap()
}

fn redo(manager: &mut CommandManager, state: &mut EditorState) -> CommandOutput {
    manager
        .execute_command("REDO", CommandArgs::new(), state)
        .wait()
        .unwrap()
}

fn pick(rng: &mut StdRng, graph: &BlockGraph) -> Option<BlockId> {
    let ids = graph.ids();
    if ids.is_empty() {
        None
    } else {
        Some(ids[rng.gen_range(0..ids.len())])
    }
}

/// A random editing command against the current graph
fn random_command(rng: &mut StdRng, graph: &BlockGraph) -> (&'static str, CommandArgs) {
    let point = Point::new(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
    let roll = if graph.len() < 2 { 0 } else { rng.gen_range(0..10) };

    match (roll, pick(rng, graph), pick(rng, graph)) {
        (1, Some(id), _) => ("DELETE_BLOCK", CommandArgs::new().with_block(id)),
        (2 | 3, Some(id), _) => (
            "MOVE_BLOCK",
            CommandArgs::new().with_block(id).with_point(point),
        ),
        (4, Some(id), _) => (
            "INCREMENT_NUMBER",
            CommandArgs::new()
                .with_block(id)
                .with_text("level")
                .with_number(rng.gen_range(-1.0..1.0)),
        ),
        (5..=7, Some(a), Some(b)) => (
            "CONNECT_BLOCKS",
            CommandArgs::new().with_block(a).with_block(b),
        ),
        (8, Some(a), Some(b)) => (
            "DISCONNECT_BLOCKS",
            CommandArgs::new().with_block(a).with_block(b),
        ),
        _ => {
            let kind = BlockKind::ALL[rng.gen_range(0..BlockKind::ALL.len())];
            (
                "CREATE_BLOCK",
                CommandArgs::new().with_kind(kind).with_point(point),
            )
        }
    }
}

#[test]
fn test_random_edits_undo_and_redo_exactly() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut manager = CommandManager::with_default_handlers();
        let mut state = create_state(1000);
        let mut recorded: Vec<(BlockGraph, BlockGraph)> = Vec::new();

        for _ in 0..150 {
            let (name, args) = random_command(&mut rng, &state.graph);
            let before = state.graph.clone();
            let count = state.history.undo_count();

            let _ = manager.execute_command(name, args, &mut state).wait();

            if state.history.undo_count() > count {
                recorded.push((before, state.graph.clone()));
            } else {
                // Rejected or no-op commands leave the graph untouched
                assert_eq!(state.graph, before, "seed {} {}", seed, name);
            }
            state.graph.validate().unwrap();
        }

        for (before, _) in recorded.iter().rev() {
            assert!(matches!(undo(&mut manager, &mut state), CommandOutput::Undone(_)));
            assert_eq!(state.graph, *before, "seed {}", seed);
        }
        assert!(matches!(
            undo(&mut manager, &mut state),
            CommandOutput::NothingToUndo
        ));

        for (_, after) in &recorded {
            assert!(matches!(redo(&mut manager, &mut state), CommandOutput::Redone(_)));
            assert_eq!(state.graph, *after, "seed {}", seed);
        }
        assert!(matches!(
            redo(&mut manager, &mut state),
            CommandOutput::NothingToRedo
        ));
    }
}

#[test]
fn test_history_capped_at_three() {
    let mut manager = CommandManager::with_default_handlers();
    let mut state = create_state(3);

    create(&mut manager, &mut state, BlockKind::ToneSource, 0.0);
    let before_b = state.graph.clone();
    create(&mut manager, &mut state, BlockKind::Delay, 1.0);
    let after_b = state.graph.clone();
    create(&mut manager, &mut state, BlockKind::Reverb, 2.0);
    create(&mut manager, &mut state, BlockKind::Lfo, 3.0);

    assert_eq!(
        state.history.history(),
        vec!["Create delay block", "Create reverb block", "Create lfo block"]
    );

    for _ in 0..3 {
        undo(&mut manager, &mut state);
    }
    assert_eq!(state.graph, before_b);
    assert!(matches!(
        undo(&mut manager, &mut state),
        CommandOutput::NothingToUndo
    ));

    redo(&mut manager, &mut state);
    assert_eq!(state.graph, after_b);
}

#[test]
fn test_new_command_discards_redo() {
    let mut manager = CommandManager::with_default_handlers();
    let mut state = create_state(100);

    let a = create(&mut manager, &mut state, BlockKind::Noise, 0.0);
    let args = CommandArgs::new()
        .with_block(a)
        .with_point(Point::new(40.0, 40.0));
    manager
        .execute_command("MOVE_BLOCK", args, &mut state)
        .wait()
        .unwrap();
    undo(&mut manager, &mut state);
    assert!(state.history.can_redo());

    create(&mut manager, &mut state, BlockKind::Delay, 1.0);
    assert!(!state.history.can_redo());
    assert!(matches!(
        redo(&mut manager, &mut state),
        CommandOutput::NothingToRedo
    ));
    assert_eq!(
        state.graph.block(a).unwrap().position(),
        Point::new(0.0, 0.0)
    );
}

#[test]
fn test_delete_with_modulation_round_trip() {
    let mut manager = CommandManager::with_default_handlers();
    let mut state = create_state(100);

    let tone = create(&mut manager, &mut state, BlockKind::ToneSource, 0.0);
    let filter = create(&mut manager, &mut state, BlockKind::Filter, 1.0);
    let lfo = create(&mut manager, &mut state, BlockKind::Lfo, 2.0);
    for (a, b) in [(lfo, filter), (tone, lfo)] {
        manager
            .execute_command(
                "CONNECT_BLOCKS",
                CommandArgs::new().with_block(a).with_block(b),
                &mut state,
            )
            .wait()
            .unwrap();
    }
    assert!(state.graph.block(filter).unwrap().sources().contains(&tone));
    let linked = state.graph.clone();

    manager
        .execute_command("DELETE_BLOCK", CommandArgs::new().with_block(lfo), &mut state)
        .wait()
        .unwrap();
    // Modulation gone, so is the link it created
    assert!(state.graph.block(tone).unwrap().modifiers().is_empty());
    assert!(!state.graph.block(filter).unwrap().sources().contains(&tone));

    undo(&mut manager, &mut state);
    assert_eq!(state.graph, linked);
}

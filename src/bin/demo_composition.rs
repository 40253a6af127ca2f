// Quick demonstration of the command core and composition persistence
// Run with: cargo run --bin demo_composition

use blocks_sketch::{
    App, BlockKind, CommandArgs, CommandOutput, EditorConfig, FileTransport, Point,
};
use std::sync::Arc;

fn create(app: &mut App, kind: BlockKind, x: f64, y: f64) -> Result<blocks_sketch::BlockId, Box<dyn std::error::Error>> {
    let args = CommandArgs::new().with_kind(kind).with_point(Point::new(x, y));
    match app.execute("CREATE_BLOCK", args).wait()? {
        CommandOutput::Created(id) => Ok(id),
        other => Err(format!("unexpected output: {:?}", other).into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎛️  Blocks Sketch - Command Core Demo");
    println!("=====================================");

    let storage_dir = std::env::temp_dir().join("blocks_sketch_demo");
    let config = EditorConfig {
        max_operations: 3,
        ..EditorConfig::default()
    };
    let mut app = App::new(config, Arc::new(FileTransport::new(&storage_dir)))?;

    // Build a small patch: one tone feeding two effects, an LFO driving the filter
    let tone = create(&mut app, BlockKind::ToneSource, 100.0, 100.0)?;
    let delay = create(&mut app, BlockKind::Delay, 300.0, 60.0)?;
    let filter = create(&mut app, BlockKind::Filter, 300.0, 160.0)?;
    let lfo = create(&mut app, BlockKind::Lfo, 500.0, 160.0)?;

    for (a, b) in [(tone, delay), (lfo, filter), (tone, lfo)] {
        app.execute("CONNECT_BLOCKS", CommandArgs::new().with_block(a).with_block(b))
            .wait()?;
    }

    println!("✅ Built composition:");
    println!("   - Blocks: {}", app.graph().len());
    println!("   - Sources: {}", app.sources().len());
    println!("   - Effects: {}", app.effects().len());
    println!(
        "   - Tone feeds: {:?}",
        app.graph().block(tone)?.effects().len()
    );
    println!("   - History: {:?}", app.state().history.history());

    // History is capped at 3 operations
    println!("\n↩️  Undoing everything the history still holds:");
    loop {
        match app.execute("UNDO", CommandArgs::new()).wait()? {
            CommandOutput::Undone(description) => println!("   - Undid: {}", description),
            _ => break,
        }
    }
    println!("   - Tone feeds after undo: {}", app.graph().block(tone)?.effects().len());

    if let CommandOutput::Redone(description) = app.execute("REDO", CommandArgs::new()).wait()? {
        println!("   - Redid: {}", description);
    }

    // Save, then reload into a fresh editor
    app.save_as(Some("demo"));
    app.wait_pending();
    let saved_json = app.serialize()?;
    println!("\n💾 Saved composition to: {}", storage_dir.display());
    println!("   - Payload: {} bytes", saved_json.len());

    let mut reloaded = App::new(
        EditorConfig::default(),
        Arc::new(FileTransport::new(&storage_dir)),
    )?;
    reloaded.load_composition(Some("demo"));
    reloaded.wait_pending();

    println!("\n📂 Reloaded composition:");
    println!("   - Blocks: {}", reloaded.graph().len());
    assert!(reloaded.graph().same_topology(app.graph()));
    println!("   - Topology matches ✅");

    for notification in reloaded.notifications() {
        println!("   - {}", notification);
    }

    // A missing composition is reported and the open one stays
    reloaded.load_composition(Some("does-not-exist"));
    reloaded.wait_pending();
    println!(
        "\n⚠️  Loading a missing composition keeps the {} open blocks",
        reloaded.graph().len()
    );
    if let Some(notification) = reloaded.notifications().back() {
        println!("   - {}", notification);
    }

    std::fs::remove_dir_all(&storage_dir)?;
    println!("\n🧹 Cleaned up demo files");

    Ok(())
}

// Collaborator traits - rendering and live signal routing
//
// Implemented outside the core (canvas, audio graph); the core only calls
// through them.

use crate::blocks::types::Block;
use crate::persistence::ViewState;

/// Draws blocks on the canvas
pub trait Renderer {
    /// Called once for a block the first time it is drawn
    fn init(&mut self, block: &Block, view: &ViewState);

    /// Called for every block on every frame, in Blocks collection order
    fn draw(&mut self, block: &Block, view: &ViewState);
}

/// Live audio connections between sources and effects
pub trait SignalRouter {
    /// Drop every live connection out of `source`
    fn disconnect_all(&mut self, source: &Block);

    /// Route `source` into `effect`
    fn connect(&mut self, source: &Block, effect: &Block);
}

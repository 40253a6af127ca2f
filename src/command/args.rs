// Command arguments - positional, typed values passed to ExecuteCommand

use crate::blocks::types::{BlockId, BlockKind, Point};
use crate::command::trait_def::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    Kind(BlockKind),
    Point(Point),
    Block(BlockId),
    Number(f64),
    Text(String),
}

impl CommandArg {
    fn type_name(&self) -> &'static str {
        match self {
            CommandArg::Kind(_) => "block kind",
            CommandArg::Point(_) => "point",
            CommandArg::Block(_) => "block id",
            CommandArg::Number(_) => "number",
            CommandArg::Text(_) => "text",
        }
    }
}

/// Ordered argument list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    args: Vec<CommandArg>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: BlockKind) -> Self {
        self.args.push(CommandArg::Kind(kind));
        self
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.args.push(CommandArg::Point(point));
        self
    }

    pub fn with_block(mut self, id: BlockId) -> Self {
        self.args.push(CommandArg::Block(id));
        self
    }

    pub fn with_number(mut self, value: f64) -> Self {
        self.args.push(CommandArg::Number(value));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.args.push(CommandArg::Text(text.into()));
        self
    }

    pub fn push(&mut self, arg: CommandArg) {
        self.args.push(arg);
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CommandArg> {
        self.args.get(index)
    }

    pub fn kind_at(&self, index: usize) -> CommandResult<BlockKind> {
        match self.required(index, "block kind")? {
            CommandArg::Kind(kind) => Ok(*kind),
            other => Err(mismatch(index, "block kind", other)),
        }
    }

    pub fn point_at(&self, index: usize) -> CommandResult<Point> {
        match self.required(index, "point")? {
            CommandArg::Point(point) if point.is_finite() => Ok(*point),
            CommandArg::Point(_) => Err(non_finite(index, "point")),
            other => Err(mismatch(index, "point", other)),
        }
    }

    pub fn block_at(&self, index: usize) -> CommandResult<BlockId> {
        match self.required(index, "block id")? {
            CommandArg::Block(id) => Ok(*id),
            other => Err(mismatch(index, "block id", other)),
        }
    }

    pub fn number_at(&self, index: usize) -> CommandResult<f64> {
        match self.required(index, "number")? {
            CommandArg::Number(value) if value.is_finite() => Ok(*value),
            CommandArg::Number(_) => Err(non_finite(index, "number")),
            other => Err(mismatch(index, "number", other)),
        }
    }

    pub fn text_at(&self, index: usize) -> CommandResult<&str> {
        match self.required(index, "text")? {
            CommandArg::Text(text) => Ok(text),
            other => Err(mismatch(index, "text", other)),
        }
    }

    /// Text argument that may be left out
    pub fn optional_text_at(&self, index: usize) -> CommandResult<Option<&str>> {
        match self.args.get(index) {
            None => Ok(None),
            Some(CommandArg::Text(text)) => Ok(Some(text)),
            Some(other) => Err(mismatch(index, "text", other)),
        }
    }

    fn required(&self, index: usize, expected: &str) -> CommandResult<&CommandArg> {
        self.args.get(index).ok_or_else(|| {
            CommandError::InvalidArguments(format!("missing {} at position {}", expected, index))
        })
    }
}

impl From<Vec<CommandArg>> for CommandArgs {
    fn from(args: Vec<CommandArg>) -> Self {
        Self { args }
    }
}

fn non_finite(index: usize, expected: &str) -> CommandError {
    CommandError::InvalidArguments(format!("non-finite {} at position {}", expected, index))
}

fn mismatch(index: usize, expected: &str, found: &CommandArg) -> CommandError {
    CommandError::InvalidArguments(format!(
        "expected {} at position {}, found {}",
        expected,
        index,
        found.type_name()
    ))
}

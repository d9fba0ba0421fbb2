//! # Script Graph Model
//!
//! Blocks, connections, scripts, contexts and extensions as supplied by the
//! store. The compiler treats all of these as read-only input.

use serde::{Deserialize, Serialize};

/// Identifier of a block inside one script.
pub type LocalId = i32;

/// Store-level identifier of a script.
pub type ScriptId = i64;

/// One node of a call-handling script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub local_id: LocalId,
    /// Priority label, also the target of `Goto` jumps
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub kind: BlockKind,
}

/// Every block kind the editor can produce.
///
/// Rendering lives in `codegen::blocks`; matches over this enum are
/// exhaustive so a new kind has to be handled at each dispatch site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockKind {
    Start,
    Answer,
    Playback {
        file: String,
    },
    Background {
        file: String,
    },
    Wait {
        seconds: u32,
    },
    SetVariable {
        name: String,
        value: String,
    },
    Dial {
        destination: String,
        #[serde(default)]
        timeout: Option<u32>,
    },
    Queue {
        name: String,
    },
    /// Arbitrary dialplan application
    Custom {
        application: String,
        #[serde(default)]
        arguments: String,
    },
    /// Branches on the value of a dialplan expression
    Switch {
        expression: String,
    },
    /// Branches on the current time; case values are `GotoIfTime` specs
    TimeSwitch,
    /// Runs a FastAGI script and branches on `${AGI_RESULT}`
    AgiSwitch {
        script: String,
    },
    Case {
        value: String,
    },
    FalseCase,
}

impl Block {
    pub fn new(local_id: LocalId, label: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            local_id,
            label: label.into(),
            kind,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, BlockKind::Start)
    }

    /// Outgoing connections branch into case targets plus one default.
    pub fn is_switcher(&self) -> bool {
        match self.kind {
            BlockKind::Switch { .. } | BlockKind::TimeSwitch | BlockKind::AgiSwitch { .. } => true,
            BlockKind::Start
            | BlockKind::Answer
            | BlockKind::Playback { .. }
            | BlockKind::Background { .. }
            | BlockKind::Wait { .. }
            | BlockKind::SetVariable { .. }
            | BlockKind::Dial { .. }
            | BlockKind::Queue { .. }
            | BlockKind::Custom { .. }
            | BlockKind::Case { .. }
            | BlockKind::FalseCase => false,
        }
    }

    /// Needs the FastAGI host address to render.
    pub fn is_host_dependent(&self) -> bool {
        matches!(self.kind, BlockKind::AgiSwitch { .. })
    }

    pub fn is_case(&self) -> bool {
        matches!(self.kind, BlockKind::Case { .. })
    }

    pub fn is_false_case(&self) -> bool {
        matches!(self.kind, BlockKind::FalseCase)
    }
}

/// Directed edge between two blocks of the same script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source_local_id: LocalId,
    pub target_local_id: LocalId,
}

impl Connection {
    pub fn new(source_local_id: LocalId, target_local_id: LocalId) -> Self {
        Self {
            source_local_id,
            target_local_id,
        }
    }
}

/// A block graph. Connection order is significant: it decides successor
/// lookup and case ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub id: ScriptId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Script {
    pub fn new(id: ScriptId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Builder form of [`add_block`](Self::add_block)
    pub fn with_block(mut self, local_id: LocalId, label: &str, kind: BlockKind) -> Self {
        self.add_block(Block::new(local_id, label, kind));
        self
    }

    /// Builder form of [`add_connection`](Self::add_connection)
    pub fn with_connection(mut self, source: LocalId, target: LocalId) -> Self {
        self.add_connection(Connection::new(source, target));
        self
    }

    /// The first block of kind `Start`.
    pub fn start_block(&self) -> Option<&Block> {
        self.blocks.iter().find(|block| block.is_start())
    }

    pub fn block(&self, local_id: LocalId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.local_id == local_id)
    }

    /// Connections leaving `local_id`, in connection-list order.
    pub fn outgoing(&self, local_id: LocalId) -> impl Iterator<Item = &Connection> + '_ {
        self.connections
            .iter()
            .filter(move |connection| connection.source_local_id == local_id)
    }
}

/// One `[context]` section of the dialplan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensions: Vec::new(),
        }
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }
}

/// Named entry point of a context, optionally bound to a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default)]
    pub script_id: Option<ScriptId>,
    /// Filled in from the store before assembly
    #[serde(skip)]
    pub script: Option<Script>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script_id: None,
            script: None,
        }
    }

    pub fn with_script_id(mut self, script_id: ScriptId) -> Self {
        self.script_id = Some(script_id);
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script_id = Some(script.id);
        self.script = Some(script);
        self
    }
}

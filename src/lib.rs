//! # Dialplan Graph Compiler
//!
//! Compiles visually-authored call-handling scripts into Asterisk dialplan
//! text.
//!
//! A script is a graph of typed blocks joined by connections. The compiler
//! walks it from the `Start` block and emits one `same = n,...` line per
//! block:
//! - Linear chains are emitted in order and end with `Hangup()`
//! - A connection back to an emitted block becomes `Goto(<label>)`
//! - Switch blocks emit one conditional jump per case, then fall through into
//!   their default branch; the case branches follow
//!
//! ## Quick Start
//!
//! ```rust
//! use dialgraph::{InMemoryStore, StaticConfiguration, Translator};
//! use dialgraph::{BlockKind, Context, Extension, Script};
//!
//! let script = Script::new(1, "welcome")
//!     .with_block(1, "s", BlockKind::Start)
//!     .with_block(2, "answer", BlockKind::Answer)
//!     .with_connection(1, 2);
//!
//! let store = InMemoryStore::new()
//!     .with_script(script)
//!     .with_context(
//!         Context::new("incoming").with_extension(Extension::new("100").with_script_id(1)),
//!     );
//!
//! let translator = Translator::new(store, StaticConfiguration::default());
//! let dialplan = translator.translate_dialplan();
//! assert!(dialplan.starts_with("[incoming]\nexten = 100,1,NoOp()\n"));
//! ```
//!
//! ## Architecture
//!
//! 1. **Loading** - Contexts and scripts come from a [`DialplanStore`]
//! 2. **Branch compilation** - Each extension script is walked by [`ScriptCodeGenerator`]
//! 3. **Assembly** - Context headers and extension bodies are concatenated
//! 4. **Caching** - The assembled text replaces the [`CompiledCache`] contents;
//!    a failed refresh serves the previous text behind a warning

pub mod cache;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

// Re-export the main compilation API
pub use compiler::{
    compile_contexts,
    compile_script,
    CompileContext,
    Translator,
    CACHE_WARNING,
    TOOL_NAME,
};

pub use cache::CompiledCache;
pub use codegen::{assemble_contexts, ScriptCodeGenerator};
pub use config::{ConfigurationProvider, StaticConfiguration};
pub use error::{DialplanError, Result, StoreError};
pub use model::{Block, BlockKind, Connection, Context, Extension, LocalId, Script, ScriptId};
pub use store::{DialplanStore, InMemoryStore};

//! # Dialplan Compiler
//!
//! Main entry points for compiling script graphs to dialplan text.

use crate::cache::CompiledCache;
use crate::codegen::{assemble_contexts, ScriptCodeGenerator};
use crate::config::ConfigurationProvider;
use crate::error::{DialplanError, Result};
use crate::model::{Context, Script, ScriptId};
use crate::store::DialplanStore;
use chrono::{DateTime, Local};
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

/// Name written into the dialplan footer
pub const TOOL_NAME: &str = "Dialgraph";

/// Prefix of a dialplan served from the cache after a failed refresh
pub const CACHE_WARNING: &str = "; WARNING! Could not load dialplan. The cache is used.\n\n";

/// Values fixed for one top-level compilation.
///
/// Passed explicitly down to block rendering so concurrent compilations
/// with different hosts never share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileContext {
    pub fast_agi_host: String,
}

impl CompileContext {
    pub fn new(fast_agi_host: impl Into<String>) -> Self {
        Self {
            fast_agi_host: fast_agi_host.into(),
        }
    }
}

/// Compile a single script to its extension body
///
/// # Arguments
///
/// * `script` - The script graph to compile
/// * `context` - Per-compilation values such as the FastAGI host
///
/// # Returns
///
/// * `Ok(String)` - Dialplan lines for every block reachable from `Start`
/// * `Err(DialplanError)` - A structural error if the graph cannot be walked
///
/// # Examples
///
/// ```rust
/// use dialgraph::{compile_script, BlockKind, CompileContext, Script};
///
/// let script = Script::new(1, "hello")
///     .with_block(1, "s", BlockKind::Start)
///     .with_block(2, "answer", BlockKind::Answer)
///     .with_connection(1, 2);
///
/// let body = compile_script(&script, &CompileContext::new("127.0.0.1")).unwrap();
/// assert!(body.ends_with("\tsame = n,Hangup()\n"));
/// ```
pub fn compile_script(script: &Script, context: &CompileContext) -> Result<String> {
    tracing::debug!(
        "[DIALGRAPH] Compiling script {} '{}' ({} blocks, {} connections)",
        script.id,
        script.name,
        script.blocks.len(),
        script.connections.len()
    );
    ScriptCodeGenerator::new(script, context).generate()
}

/// Compile contexts whose extension scripts are already attached
///
/// All-or-nothing: the first failing extension aborts the whole output.
pub fn compile_contexts(contexts: &[Context], context: &CompileContext) -> Result<String> {
    tracing::info!("[DIALGRAPH] Assembling {} contexts", contexts.len());
    let code = assemble_contexts(contexts, context)?;
    tracing::info!("[DIALGRAPH] Assembly complete ({} bytes)", code.len());
    Ok(code)
}

/// Compilation service over a store and a configuration provider.
///
/// Keeps the last good dialplan so a failed refresh can still be served.
pub struct Translator<S, C> {
    store: S,
    config: C,
    cache: CompiledCache,
}

impl<S: DialplanStore, C: ConfigurationProvider> Translator<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self {
            store,
            config,
            cache: CompiledCache::new(),
        }
    }

    /// Share an existing cache (builder pattern)
    pub fn with_cache(mut self, cache: CompiledCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &CompiledCache {
        &self.cache
    }

    /// Last successfully assembled dialplan, without footer
    pub fn cached(&self) -> Arc<str> {
        self.cache.get()
    }

    /// Load and compile one script.
    ///
    /// Errors are returned to the caller as-is; the cache is not involved.
    pub fn translate_script(&self, id: ScriptId) -> Result<String> {
        let context = CompileContext::new(self.config.fast_agi_host());
        let script = self.load_script(id)?;
        compile_script(&script, &context)
    }

    /// Compile the full dialplan.
    ///
    /// Never fails: if the refresh fails the cached dialplan is returned
    /// behind a warning comment. The footer is appended in both cases.
    pub fn translate_dialplan(&self) -> String {
        let started = Instant::now();
        let context = CompileContext::new(self.config.fast_agi_host());
        let mut result = String::new();

        match self.refresh(&context) {
            Ok(code) => result.push_str(&code),
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    "[DIALGRAPH] Could not load dialplan: {}",
                    error_chain(&e)
                );
                if self.cache.is_empty() {
                    tracing::warn!("[DIALGRAPH] Cache is empty, serving warning only");
                }
                result.push_str(CACHE_WARNING);
                result.push_str(&self.cache.get());
            }
        }

        result.push_str(&summary_footer(started.elapsed().as_millis(), Local::now()));
        result
    }

    /// Rebuild the dialplan and swap it into the cache.
    ///
    /// Returns the text this call assembled; the cache may already hold a
    /// newer refresh by the time the caller reads it.
    fn refresh(&self, context: &CompileContext) -> Result<Arc<str>> {
        let mut contexts = self
            .store
            .load_contexts()
            .map_err(DialplanError::ContextLoad)?;

        for dialplan_context in &mut contexts {
            for extension in &mut dialplan_context.extensions {
                if let Some(script_id) = extension.script_id {
                    extension.script = Some(self.load_script(script_id)?);
                }
            }
        }

        let code: Arc<str> = compile_contexts(&contexts, context)?.into();
        self.cache.set(code.clone());
        Ok(code)
    }

    fn load_script(&self, id: ScriptId) -> Result<Script> {
        self.store
            .load_script(id)
            .map_err(|source| DialplanError::ScriptLoad { id, source })
    }
}

/// Error message followed by each of its sources, `: `-separated
fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// `; Generated by ... in Nms` plus a timestamp line
fn summary_footer(elapsed_ms: u128, now: DateTime<Local>) -> String {
    format!(
        "\n; Generated by {} in {}ms\n; {}\n",
        TOOL_NAME,
        elapsed_ms,
        now.format("%Y.%m.%d %H:%M:%S%.3f")
    )
}
